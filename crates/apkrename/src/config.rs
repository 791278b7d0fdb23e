//! Configuration file support for apkrename.
//!
//! This module provides support for `apkrename.toml` configuration files that
//! persist project settings so they don't have to be passed as CLI flags.
//!
//! ## Configuration File Location
//!
//! The configuration file is searched for in the following order:
//! 1. Current working directory (`./apkrename.toml`)
//! 2. Parent directories (up to the repository root or filesystem root)
//!
//! Relative paths inside the file are resolved against the directory that
//! contains it.
//!
//! ## Example Configuration
//!
//! ```toml
//! [app]
//! name = "poke-discoverer"
//! pubspec = "pubspec.yaml"
//!
//! [android]
//! project_dir = "android"
//! application_id = "io.github.example.pokediscoverer"
//! min_sdk = 21
//!
//! [signing]
//! store_file = "release.keystore"
//! key_alias = "release"
//! store_password = "${KEYSTORE_PASSWORD}"
//! key_password = "${KEY_PASSWORD}"
//! ```

use anyhow::{Context, Result};
use apkrename_core::config::{KEY_ALIAS_VAR, KEY_PASSWORD_VAR, KEYSTORE_PASSWORD_VAR};
use apkrename_core::{AndroidBuildConfig, SigningConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The default configuration file name.
pub const CONFIG_FILE_NAME: &str = "apkrename.toml";

/// Root configuration structure for `apkrename.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApkRenameConfig {
    /// Application identity used in artifact names.
    pub app: AppConfig,

    /// Android project layout and `defaultConfig` values.
    pub android: AndroidSection,

    /// Release signing configuration.
    pub signing: SigningSection,
}

/// Application-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Name embedded in renamed artifacts (e.g., "poke-discoverer").
    ///
    /// If not specified, the pubspec package name is used with underscores
    /// replaced by hyphens.
    pub name: Option<String>,

    /// Path to the Flutter `pubspec.yaml`.
    ///
    /// Defaults to `pubspec.yaml` in the project directory.
    pub pubspec: Option<PathBuf>,
}

/// Android project configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AndroidSection {
    /// Directory containing the Gradle wrapper. Defaults to `android`.
    pub project_dir: Option<PathBuf>,

    /// Build directory of the app module. Defaults to `<project_dir>/app/build`.
    pub build_dir: Option<PathBuf>,

    /// `defaultConfig` values; `version_name` here overrides the pubspec.
    #[serde(flatten)]
    pub build: AndroidBuildConfig,
}

/// Signing section as written in the file.
///
/// Every field is optional so that environment variables and built-in
/// defaults can fill the gaps. Values of the form `${VAR}` are expanded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningSection {
    pub store_file: Option<PathBuf>,
    pub store_password: Option<String>,
    pub key_alias: Option<String>,
    pub key_password: Option<String>,
}

impl ApkRenameConfig {
    /// Loads configuration from the specified file path.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: ApkRenameConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Attempts to find and load configuration starting from the specified directory.
    ///
    /// # Returns
    ///
    /// * `Ok(Some((config, path)))` - Found and loaded configuration with its path
    /// * `Ok(None)` - No configuration file found
    /// * `Err` - If a config file was found but couldn't be parsed
    pub fn discover_from(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);

            if config_path.is_file() {
                let config = Self::load_from_file(&config_path)?;
                return Ok(Some((config, config_path)));
            }

            // Stop at repository root or filesystem root
            if current.join(".git").exists() || !current.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// Generates a starter configuration file as a formatted TOML string.
    pub fn generate_starter_toml(app_name: &str) -> String {
        format!(
            r#"# apkrename configuration file
# Copies the assembled APK/AAB to <name>-<version>-<variant>.<ext>.
# CLI flags override these settings when provided.

[app]
# Name embedded in renamed artifacts
name = "{app_name}"

# Flutter pubspec providing the version (default: pubspec.yaml)
# pubspec = "pubspec.yaml"

[android]
# Directory containing gradlew (default: android)
project_dir = "android"

# Build directory of the app module (default: <project_dir>/app/build)
# build_dir = "android/app/build"

# Overrides the version read from pubspec.yaml
# version_name = "1.0.0"

[signing]
# Keystore path, relative to the app module (default: release.keystore)
store_file = "release.keystore"

# Key alias (default: release, or $KEY_ALIAS)
key_alias = "release"

# Passwords are best left to the environment; ${{VAR}} is expanded
store_password = "${{KEYSTORE_PASSWORD}}"
key_password = "${{KEY_PASSWORD}}"
"#,
            app_name = app_name,
        )
    }
}

/// Configuration resolver that merges config file values with CLI arguments.
///
/// CLI arguments always take precedence over config file values.
#[derive(Debug, Default)]
pub struct ConfigResolver {
    /// Loaded configuration, if any.
    pub config: Option<ApkRenameConfig>,

    /// Path to the loaded config file, if any.
    pub config_path: Option<PathBuf>,
}

impl ConfigResolver {
    /// Loads the config at `explicit`, or discovers one from `start_dir`.
    pub fn load(explicit: Option<&Path>, start_dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            let config = ApkRenameConfig::load_from_file(path)?;
            return Ok(Self {
                config: Some(config),
                config_path: Some(path.to_path_buf()),
            });
        }

        match ApkRenameConfig::discover_from(start_dir)? {
            Some((config, path)) => Ok(Self {
                config: Some(config),
                config_path: Some(path),
            }),
            None => Ok(Self::default()),
        }
    }

    /// Directory containing the loaded config file.
    pub fn config_dir(&self) -> Option<&Path> {
        self.config_path.as_deref().and_then(Path::parent)
    }

    /// Resolves a path from the config file against the config file's directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        match self.config_dir() {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    pub fn pubspec(&self) -> Option<PathBuf> {
        self.config
            .as_ref()
            .and_then(|c| c.app.pubspec.as_deref())
            .map(|p| self.resolve_path(p))
    }

    pub fn android_project_dir(&self) -> Option<PathBuf> {
        self.config
            .as_ref()
            .and_then(|c| c.android.project_dir.as_deref())
            .map(|p| self.resolve_path(p))
    }

    pub fn android_build_dir(&self) -> Option<PathBuf> {
        self.config
            .as_ref()
            .and_then(|c| c.android.build_dir.as_deref())
            .map(|p| self.resolve_path(p))
    }

    /// Returns the `defaultConfig` values from the file.
    pub fn android_build(&self) -> AndroidBuildConfig {
        self.config
            .as_ref()
            .map(|c| c.android.build.clone())
            .unwrap_or_default()
    }

    /// Resolves signing credentials: environment, then config file, then defaults.
    ///
    /// `lookup` reads one environment variable; empty values count as unset.
    pub fn signing<F>(&self, lookup: F) -> Result<SigningConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let section = self
            .config
            .as_ref()
            .map(|c| c.signing.clone())
            .unwrap_or_default();
        let expand = |raw: Option<String>| -> Result<Option<String>> {
            match raw {
                Some(raw) => expand_env_var(&raw, &lookup),
                None => Ok(None),
            }
        };

        let defaults = SigningConfig::default();
        Ok(SigningConfig {
            store_file: section.store_file.unwrap_or(defaults.store_file),
            store_password: match lookup(KEYSTORE_PASSWORD_VAR) {
                Some(v) => Some(v),
                None => expand(section.store_password)?,
            },
            key_alias: match lookup(KEY_ALIAS_VAR) {
                Some(v) => v,
                None => expand(section.key_alias)?.unwrap_or(defaults.key_alias),
            },
            key_password: match lookup(KEY_PASSWORD_VAR) {
                Some(v) => Some(v),
                None => expand(section.key_password)?,
            },
        })
    }

    /// Resolves a CLI value, using config as fallback.
    pub fn resolve<T, F>(&self, cli_value: Option<T>, config_getter: F) -> Option<T>
    where
        F: FnOnce(&ApkRenameConfig) -> Option<T>,
    {
        cli_value.or_else(|| self.config.as_ref().and_then(config_getter))
    }
}

/// Expands a `${VAR}` reference. A reference to an unset variable resolves
/// to `None`; any other value is returned as-is.
fn expand_env_var<F>(raw: &str, lookup: &F) -> Result<Option<String>>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(stripped) = raw.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        if stripped.is_empty() {
            anyhow::bail!("empty environment reference {:?} in signing config", raw);
        }
        return Ok(lookup(stripped));
    }
    Ok(Some(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);

        let toml_content = r#"
[app]
name = "poke-discoverer"

[android]
project_dir = "mobile/android"
application_id = "io.github.example.pokediscoverer"
min_sdk = 21
target_sdk = 34
version_name = "1.2.0"

[signing]
key_alias = "upload"
"#;
        std::fs::write(&config_path, toml_content).unwrap();

        let config = ApkRenameConfig::load_from_file(&config_path).unwrap();

        assert_eq!(config.app.name.as_deref(), Some("poke-discoverer"));
        assert_eq!(
            config.android.project_dir,
            Some(PathBuf::from("mobile/android"))
        );
        assert_eq!(config.android.build.min_sdk, Some(21));
        assert_eq!(config.android.build.target_sdk, Some(34));
        assert_eq!(config.android.build.version_name.as_deref(), Some("1.2.0"));
        assert_eq!(
            config.android.build.application_id.as_deref(),
            Some("io.github.example.pokediscoverer")
        );
        assert_eq!(config.signing.key_alias.as_deref(), Some("upload"));
    }

    #[test]
    fn test_discover_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, "[app]\nname = \"discovered\"\n").unwrap();
        let nested = temp_dir.path().join("android/app");
        std::fs::create_dir_all(&nested).unwrap();

        let (config, path) = ApkRenameConfig::discover_from(&nested).unwrap().unwrap();
        assert_eq!(config.app.name.as_deref(), Some("discovered"));
        assert_eq!(path, config_path);
    }

    #[test]
    fn test_discover_no_config() {
        let temp_dir = TempDir::new().unwrap();
        // Create a .git directory to stop the search
        std::fs::create_dir(temp_dir.path().join(".git")).unwrap();

        let result = ApkRenameConfig::discover_from(temp_dir.path()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_starter_toml_parses() {
        let toml = ApkRenameConfig::generate_starter_toml("poke-discoverer");
        assert!(toml.contains("name = \"poke-discoverer\""));
        assert!(toml.contains("store_password = \"${KEYSTORE_PASSWORD}\""));

        let config: ApkRenameConfig = toml::from_str(&toml).unwrap();
        assert_eq!(config.app.name.as_deref(), Some("poke-discoverer"));
        assert_eq!(config.android.project_dir, Some(PathBuf::from("android")));
    }

    #[test]
    fn test_paths_resolve_against_config_dir() {
        let resolver = ConfigResolver {
            config: Some(ApkRenameConfig {
                android: AndroidSection {
                    project_dir: Some(PathBuf::from("android")),
                    ..AndroidSection::default()
                },
                ..ApkRenameConfig::default()
            }),
            config_path: Some(PathBuf::from("/work/app/apkrename.toml")),
        };
        assert_eq!(
            resolver.android_project_dir(),
            Some(PathBuf::from("/work/app/android"))
        );
    }

    #[test]
    fn test_cli_value_takes_precedence() {
        let resolver = ConfigResolver {
            config: Some(ApkRenameConfig {
                app: AppConfig {
                    name: Some("from-config".to_string()),
                    pubspec: None,
                },
                ..ApkRenameConfig::default()
            }),
            config_path: None,
        };
        let name = resolver.resolve(Some("from-cli".to_string()), |c| c.app.name.clone());
        assert_eq!(name.as_deref(), Some("from-cli"));
        let name = resolver.resolve(None, |c| c.app.name.clone());
        assert_eq!(name.as_deref(), Some("from-config"));
    }

    #[test]
    fn test_signing_defaults_without_env_or_config() {
        let resolver = ConfigResolver::default();
        let signing = resolver.signing(env(&[])).unwrap();
        assert_eq!(signing, SigningConfig::default());
    }

    #[test]
    fn test_signing_env_overrides_config() {
        let resolver = ConfigResolver {
            config: Some(ApkRenameConfig {
                signing: SigningSection {
                    key_alias: Some("from-config".to_string()),
                    store_password: Some("config-store".to_string()),
                    ..SigningSection::default()
                },
                ..ApkRenameConfig::default()
            }),
            config_path: None,
        };
        let signing = resolver
            .signing(env(&[("KEY_ALIAS", "from-env"), ("KEY_PASSWORD", "env-key")]))
            .unwrap();
        assert_eq!(signing.key_alias, "from-env");
        assert_eq!(signing.store_password.as_deref(), Some("config-store"));
        assert_eq!(signing.key_password.as_deref(), Some("env-key"));
    }

    #[test]
    fn test_signing_expands_references() {
        let resolver = ConfigResolver {
            config: Some(ApkRenameConfig {
                signing: SigningSection {
                    store_password: Some("${CI_STORE_PASS}".to_string()),
                    key_password: Some("${UNSET_VAR}".to_string()),
                    ..SigningSection::default()
                },
                ..ApkRenameConfig::default()
            }),
            config_path: None,
        };
        let signing = resolver.signing(env(&[("CI_STORE_PASS", "s3cret")])).unwrap();
        assert_eq!(signing.store_password.as_deref(), Some("s3cret"));
        assert_eq!(signing.key_password, None);
    }

    #[test]
    fn test_empty_env_value_counts_as_unset() {
        let resolver = ConfigResolver::default();
        let signing = resolver.signing(env(&[("KEY_ALIAS", "")])).unwrap();
        assert_eq!(signing.key_alias, "release");
    }
}
