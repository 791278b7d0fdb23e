//! # apkrename
//!
//! Command-line tool that assembles an Android build variant and copies the
//! resulting artifact to a versioned name.
//!
//! ## Overview
//!
//! `apkrename` is the task-graph wiring around [`apkrename_core`]. For a
//! variant it:
//!
//! 1. **Assembles** - Runs `./gradlew assemble<Variant>` (or `bundle<Variant>` for AABs)
//! 2. **Renames** - Copies `app-<variant>.apk` to `<app>-<version>-<variant>.apk`
//!    in the same directory, strictly after assembly succeeded
//!
//! ## Quick Start
//!
//! ```bash
//! # Write a starter config next to pubspec.yaml
//! apkrename init --app-name poke-discoverer
//!
//! # Build and rename the release APK
//! apkrename rename --variant release
//!
//! # Rename outputs produced earlier by `flutter build apk --debug`
//! apkrename rename --variant debug --skip-assemble
//!
//! # Show where the artifact would go
//! apkrename describe --variant release --json
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rename` | Assemble a variant and copy its artifact to the versioned name |
//! | `describe` | Print the resolved source/target paths and build values |
//! | `init` | Write a starter `apkrename.toml` |
//!
//! ## Version and Name Resolution
//!
//! The version name comes from `--version-name`, then `android.version_name`
//! in `apkrename.toml`, then the `version:` field of `pubspec.yaml`
//! (`1.2.0+3` gives `1.2.0`). The application name comes from `--app-name`,
//! then `app.name`, then the pubspec package name with `_` replaced by `-`.
//!
//! ## Signing
//!
//! Release signing credentials are read from `KEYSTORE_PASSWORD`,
//! `KEY_ALIAS` and `KEY_PASSWORD` (a `.env.local` in the project directory is
//! loaded first), falling back to the `[signing]` section of the config and
//! then to built-in defaults. They are passed to Gradle explicitly.
//!
//! ## CLI Flags
//!
//! Global flags available on all commands:
//!
//! - **`--dry-run`** - Preview what would be done without making changes
//! - **`--verbose` / `-v`** - Enable debug logging and Gradle `--info`
//! - **`--config`** - Use a specific config file instead of discovering one
//!
//! ## Modules
//!
//! - [`config`] - Configuration file support for `apkrename.toml`

use anyhow::{Context, Result, anyhow, bail};
use apkrename_core::{
    AndroidBuildConfig, ArtifactDescriptor, ArtifactKind, AssemblyStep, BuildVariant,
    GradleAssembler, PrebuiltArtifacts, PubspecVersion, RenameOutcome, RenameTask, VersionName,
    read_pubspec,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use config::{ApkRenameConfig, CONFIG_FILE_NAME, ConfigResolver};

pub mod config;

/// Copies Android build artifacts to `<app>-<version>-<variant>` names.
#[derive(Parser, Debug)]
#[command(name = "apkrename", author, version, about = "Versioned names for Android build artifacts", long_about = None)]
struct Cli {
    /// Print what would be done without actually doing it
    #[arg(long, global = true)]
    dry_run: bool,

    /// Print verbose output including Gradle's
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Path to apkrename.toml (default: discovered from the project directory upward)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assemble a variant, then copy its artifact to the versioned name.
    Rename {
        #[command(flatten)]
        target: TargetArgs,
        #[arg(long, help = "Use existing build outputs instead of running Gradle")]
        skip_assemble: bool,
        #[arg(long, help = "Print the outcome as JSON")]
        json: bool,
    },
    /// Print the resolved artifact paths and build configuration.
    Describe {
        #[command(flatten)]
        target: TargetArgs,
        #[arg(long, help = "Print as JSON")]
        json: bool,
    },
    /// Scaffold a starter config file.
    Init {
        #[arg(long, default_value = CONFIG_FILE_NAME)]
        output: PathBuf,
        #[arg(long, help = "Application name (default: derived from pubspec.yaml)")]
        app_name: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
struct TargetArgs {
    #[arg(long, value_enum)]
    variant: VariantArg,
    #[arg(long, value_enum, default_value_t = KindArg::Apk)]
    kind: KindArg,
    #[arg(long, help = "Flutter project directory containing pubspec.yaml and android/ (default: config dir or cwd)")]
    project_dir: Option<PathBuf>,
    #[arg(long, help = "Build directory of the app module (default: <android>/app/build)")]
    build_dir: Option<PathBuf>,
    #[arg(long, help = "Application name embedded in the artifact name")]
    app_name: Option<String>,
    #[arg(long, help = "Version name embedded in the artifact name")]
    version_name: Option<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
#[clap(rename_all = "lowercase")]
enum VariantArg {
    Debug,
    Release,
}

impl From<VariantArg> for BuildVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Debug => BuildVariant::Debug,
            VariantArg::Release => BuildVariant::Release,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
#[clap(rename_all = "lowercase")]
enum KindArg {
    /// Installable APK (assemble<Variant>)
    Apk,
    /// Android App Bundle (bundle<Variant>)
    Aab,
}

impl From<KindArg> for ArtifactKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Apk => ArtifactKind::Apk,
            KindArg::Aab => ArtifactKind::Aab,
        }
    }
}

/// Everything resolved for one variant before anything runs.
#[derive(Debug, Serialize)]
struct RenamePlan {
    project_dir: PathBuf,
    android_dir: PathBuf,
    config_file: Option<PathBuf>,
    assembly_task: String,
    build: AndroidBuildConfig,
    descriptor: ArtifactDescriptor,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cwd = env::current_dir().context("resolving current directory")?;
    let explicit_config = cli.config.as_ref().map(|path| cwd.join(path));

    match cli.command {
        Command::Rename {
            target,
            skip_assemble,
            json,
        } => {
            let start_dir = start_dir(&target, &cwd);
            load_dotenv(&start_dir);
            let resolver = ConfigResolver::load(explicit_config.as_deref(), &start_dir)?;
            let plan = resolve_plan(&target, &resolver, &cwd)?;
            let outcome = cmd_rename(&plan, &resolver, skip_assemble, cli.dry_run, cli.verbose)?;
            if let Some(outcome) = outcome {
                print_outcome(&outcome, json)?;
            }
        }
        Command::Describe { target, json } => {
            let start_dir = start_dir(&target, &cwd);
            let resolver = ConfigResolver::load(explicit_config.as_deref(), &start_dir)?;
            let plan = resolve_plan(&target, &resolver, &cwd)?;
            print_plan(&plan, json)?;
        }
        Command::Init { output, app_name } => {
            let app_name = match app_name {
                Some(name) => name,
                None => app_name_from_pubspec(&cwd.join("pubspec.yaml"))?,
            };
            if cli.dry_run {
                println!("[dry-run] would write starter config to {:?}", output);
                return Ok(());
            }
            write_config_template(&output, &app_name)?;
            println!("Wrote starter config to {:?}", output);
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .try_init();
}

fn start_dir(target: &TargetArgs, cwd: &Path) -> PathBuf {
    match &target.project_dir {
        Some(dir) => cwd.join(dir),
        None => cwd.to_path_buf(),
    }
}

/// Loads `.env.local` from the project directory. Existing variables win.
fn load_dotenv(project_dir: &Path) {
    let path = project_dir.join(".env.local");
    if path.is_file() {
        match dotenvy::from_path(&path) {
            Ok(()) => log::debug!("loaded environment from {}", path.display()),
            Err(e) => log::warn!("ignoring {}: {}", path.display(), e),
        }
    }
}

fn resolve_plan(target: &TargetArgs, resolver: &ConfigResolver, cwd: &Path) -> Result<RenamePlan> {
    let variant = BuildVariant::from(target.variant);
    let kind = ArtifactKind::from(target.kind);

    let project_dir = match (&target.project_dir, resolver.config_dir()) {
        (Some(dir), _) => cwd.join(dir),
        (None, Some(dir)) => dir.to_path_buf(),
        (None, None) => cwd.to_path_buf(),
    };
    let android_dir = resolver
        .android_project_dir()
        .unwrap_or_else(|| project_dir.join("android"));
    let build_dir = match &target.build_dir {
        Some(dir) => cwd.join(dir),
        None => resolver
            .android_build_dir()
            .unwrap_or_else(|| android_dir.join("app").join("build")),
    };

    let pubspec_path = resolver
        .pubspec()
        .unwrap_or_else(|| project_dir.join("pubspec.yaml"));
    let pubspec = load_pubspec(&pubspec_path)?;

    let from_cli = AndroidBuildConfig {
        version_name: target.version_name.clone(),
        ..AndroidBuildConfig::default()
    };
    let from_pubspec = pubspec
        .as_ref()
        .map(|p| AndroidBuildConfig {
            version_name: Some(p.version_name.clone()),
            version_code: p.version_code,
            ..AndroidBuildConfig::default()
        })
        .unwrap_or_default();
    let build = from_cli.or(resolver.android_build()).or(from_pubspec);

    let raw_version = build.version_name.clone().ok_or_else(|| {
        anyhow!(
            "no version name found; pass --version-name, set android.version_name in {}, or add `version:` to {}",
            CONFIG_FILE_NAME,
            pubspec_path.display()
        )
    })?;
    let version_name = VersionName::parse(raw_version)?;

    let app_name = resolver
        .resolve(target.app_name.clone(), |c| c.app.name.clone())
        .or_else(|| {
            pubspec
                .as_ref()
                .and_then(|p| p.package_name.as_deref())
                .map(|name| name.replace('_', "-"))
        })
        .ok_or_else(|| {
            anyhow!(
                "no application name found; pass --app-name or set app.name in {}",
                CONFIG_FILE_NAME
            )
        })?;

    let descriptor = ArtifactDescriptor::new(app_name, version_name, variant, kind, &build_dir)?;

    Ok(RenamePlan {
        project_dir,
        android_dir,
        config_file: resolver.config_path.clone(),
        assembly_task: kind.task_name(variant),
        build,
        descriptor,
    })
}

fn load_pubspec(path: &Path) -> Result<Option<PubspecVersion>> {
    if !path.is_file() {
        log::debug!("no pubspec at {}", path.display());
        return Ok(None);
    }
    let pubspec = read_pubspec(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(Some(pubspec))
}

/// Runs assembly then the rename. Returns `None` for a dry run.
fn cmd_rename(
    plan: &RenamePlan,
    resolver: &ConfigResolver,
    skip_assemble: bool,
    dry_run: bool,
    verbose: bool,
) -> Result<Option<RenameOutcome>> {
    let descriptor = &plan.descriptor;

    let step: Box<dyn AssemblyStep> = if skip_assemble {
        Box::new(PrebuiltArtifacts)
    } else {
        let signing = resolver.signing(|key| env::var(key).ok())?;
        log::debug!("signing config: {:?}", signing);
        Box::new(
            GradleAssembler::new(&plan.android_dir)
                .signing(signing)
                .verbose(verbose)
                .dry_run(dry_run),
        )
    };

    if dry_run {
        step.assemble(descriptor.variant(), descriptor.kind())?;
        println!(
            "[dry-run] would copy {} -> {}",
            descriptor.source_path().display(),
            descriptor.target_path().display()
        );
        return Ok(None);
    }

    let mut task = RenameTask::new(descriptor.clone());
    let outcome = task
        .run_after(step.as_ref())
        .with_context(|| format!("renaming {} artifact", descriptor.variant()))?;
    Ok(Some(outcome))
}

fn print_outcome(outcome: &RenameOutcome, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(outcome).context("serializing rename outcome")?
        );
    } else {
        println!(
            "Renamed {} -> {}",
            outcome.source.display(),
            outcome.target.display()
        );
        println!("  {} bytes, sha256 {}", outcome.bytes, outcome.sha256);
    }
    Ok(())
}

fn print_plan(plan: &RenamePlan, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(plan).context("serializing rename plan")?
        );
        return Ok(());
    }

    let d = &plan.descriptor;
    println!("Variant:        {} ({})", d.variant(), d.kind());
    println!("Application:    {}", d.application_name());
    println!("Version name:   {}", d.version_name());
    if let Some(code) = plan.build.version_code {
        println!("Version code:   {}", code);
    }
    println!("Assembly task:  {}", plan.assembly_task);
    println!("Android dir:    {}", plan.android_dir.display());
    println!("Source:         {}", d.source_path().display());
    println!("Target:         {}", d.target_path().display());
    match &plan.config_file {
        Some(path) => println!("Config:         {}", path.display()),
        None => println!("Config:         (none)"),
    }
    Ok(())
}

fn app_name_from_pubspec(pubspec_path: &Path) -> Result<String> {
    match load_pubspec(pubspec_path)? {
        Some(PubspecVersion {
            package_name: Some(name),
            ..
        }) => Ok(name.replace('_', "-")),
        _ => bail!(
            "cannot derive an application name from {}; pass --app-name",
            pubspec_path.display()
        ),
    }
}

fn write_config_template(path: &Path, app_name: &str) -> Result<()> {
    ensure_can_write(path)?;
    let contents = ApkRenameConfig::generate_starter_toml(app_name);
    fs::write(path, contents).with_context(|| format!("writing file {:?}", path))
}

fn ensure_can_write(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("refusing to overwrite existing file: {:?}", path);
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating parent directory {:?}", parent))?;
    }
    Ok(())
}
