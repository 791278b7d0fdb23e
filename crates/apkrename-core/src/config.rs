//! Build and signing configuration passed into the assembly step.
//!
//! These are plain values. Nothing in this crate reads the process
//! environment; the CLI resolves environment variables, config files and
//! flags into these types and hands them over.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Keystore file used when none is configured, relative to the app module.
pub const DEFAULT_STORE_FILE: &str = "release.keystore";

/// Key alias used when none is configured.
pub const DEFAULT_KEY_ALIAS: &str = "release";

/// Environment variable names the Gradle signing config reads.
pub const KEYSTORE_PASSWORD_VAR: &str = "KEYSTORE_PASSWORD";
pub const KEY_ALIAS_VAR: &str = "KEY_ALIAS";
pub const KEY_PASSWORD_VAR: &str = "KEY_PASSWORD";

/// Android `defaultConfig` values, treated as opaque by the renamer.
///
/// Only `version_name` feeds the artifact name; the rest is reported by
/// `describe` and kept so a single file describes the whole build.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AndroidBuildConfig {
    /// Application ID, e.g. `io.github.example.app`.
    pub application_id: Option<String>,
    /// Kotlin/Java namespace of the app module.
    pub namespace: Option<String>,
    pub compile_sdk: Option<u32>,
    pub min_sdk: Option<u32>,
    pub target_sdk: Option<u32>,
    pub version_code: Option<u32>,
    pub version_name: Option<String>,
    pub ndk_version: Option<String>,
}

impl AndroidBuildConfig {
    /// Fills unset fields from `fallback`.
    pub fn or(self, fallback: AndroidBuildConfig) -> AndroidBuildConfig {
        AndroidBuildConfig {
            application_id: self.application_id.or(fallback.application_id),
            namespace: self.namespace.or(fallback.namespace),
            compile_sdk: self.compile_sdk.or(fallback.compile_sdk),
            min_sdk: self.min_sdk.or(fallback.min_sdk),
            target_sdk: self.target_sdk.or(fallback.target_sdk),
            version_code: self.version_code.or(fallback.version_code),
            version_name: self.version_name.or(fallback.version_name),
            ndk_version: self.ndk_version.or(fallback.ndk_version),
        }
    }
}

/// Release signing credentials.
///
/// Fallbacks: `store_file` is [`DEFAULT_STORE_FILE`] and `key_alias` is
/// [`DEFAULT_KEY_ALIAS`]. Passwords have no default and stay `None` when
/// unset. `Debug` output never shows password values.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    pub store_file: PathBuf,
    pub store_password: Option<String>,
    pub key_alias: String,
    pub key_password: Option<String>,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            store_file: PathBuf::from(DEFAULT_STORE_FILE),
            store_password: None,
            key_alias: DEFAULT_KEY_ALIAS.to_string(),
            key_password: None,
        }
    }
}

impl SigningConfig {
    /// Whether both passwords are present.
    pub fn is_complete(&self) -> bool {
        self.store_password.as_deref().is_some_and(|p| !p.is_empty())
            && self.key_password.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Variables to set on the Gradle process so its signing config picks them up.
    ///
    /// Unset passwords are omitted rather than passed as empty strings.
    pub fn gradle_env(&self) -> Vec<(&'static str, String)> {
        let mut vars = vec![(KEY_ALIAS_VAR, self.key_alias.clone())];
        if let Some(password) = &self.store_password {
            vars.push((KEYSTORE_PASSWORD_VAR, password.clone()));
        }
        if let Some(password) = &self.key_password {
            vars.push((KEY_PASSWORD_VAR, password.clone()));
        }
        vars
    }
}

impl fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(value: &Option<String>) -> &'static str {
            match value {
                Some(_) => "<redacted>",
                None => "<unset>",
            }
        }
        f.debug_struct("SigningConfig")
            .field("store_file", &self.store_file)
            .field("store_password", &redact(&self.store_password))
            .field("key_alias", &self.key_alias)
            .field("key_password", &redact(&self.key_password))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_defaults() {
        let signing = SigningConfig::default();
        assert_eq!(signing.store_file, PathBuf::from("release.keystore"));
        assert_eq!(signing.key_alias, "release");
        assert!(!signing.is_complete());
    }

    #[test]
    fn test_debug_redacts_passwords() {
        let signing = SigningConfig {
            store_password: Some("hunter2".to_string()),
            key_password: Some("swordfish".to_string()),
            ..SigningConfig::default()
        };
        let shown = format!("{:?}", signing);
        assert!(!shown.contains("hunter2"));
        assert!(!shown.contains("swordfish"));
        assert!(shown.contains("<redacted>"));
        assert!(signing.is_complete());
    }

    #[test]
    fn test_gradle_env_omits_unset_passwords() {
        let signing = SigningConfig {
            store_password: Some("store".to_string()),
            ..SigningConfig::default()
        };
        let vars = signing.gradle_env();
        assert!(vars.contains(&(KEY_ALIAS_VAR, "release".to_string())));
        assert!(vars.contains(&(KEYSTORE_PASSWORD_VAR, "store".to_string())));
        assert!(!vars.iter().any(|(k, _)| *k == KEY_PASSWORD_VAR));
    }

    #[test]
    fn test_empty_password_is_incomplete() {
        let signing = SigningConfig {
            store_password: Some(String::new()),
            key_password: Some("key".to_string()),
            ..SigningConfig::default()
        };
        assert!(!signing.is_complete());
    }

    #[test]
    fn test_build_config_fallback() {
        let cli = AndroidBuildConfig {
            version_name: Some("2.0.0".to_string()),
            ..AndroidBuildConfig::default()
        };
        let pubspec = AndroidBuildConfig {
            version_name: Some("1.0.0".to_string()),
            version_code: Some(4),
            ..AndroidBuildConfig::default()
        };
        let merged = cli.or(pubspec);
        assert_eq!(merged.version_name.as_deref(), Some("2.0.0"));
        assert_eq!(merged.version_code, Some(4));
    }
}
