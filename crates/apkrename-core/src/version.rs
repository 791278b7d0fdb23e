//! Validation of the name components embedded in artifact file names.
//!
//! Both the application name and the version name end up inside a file name,
//! so they are checked before any path is built from them. A component is
//! rejected when it is empty, contains a path separator or a character that
//! is reserved on common file systems, contains whitespace or control
//! characters, or is a relative path segment such as `..`.

use crate::types::RenameError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Longest component accepted in a file name.
pub const MAX_COMPONENT_LEN: usize = 128;

const RESERVED_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Checks that `value` can be embedded in a single file name.
///
/// Returns a human-readable reason on failure.
pub fn check_file_name_component(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err("must not be empty".to_string());
    }
    if value.len() > MAX_COMPONENT_LEN {
        return Err(format!("must be at most {} bytes", MAX_COMPONENT_LEN));
    }
    if value == "." || value == ".." {
        return Err("must not be a relative path segment".to_string());
    }
    if let Some(c) = value.chars().find(|c| RESERVED_CHARS.contains(c)) {
        return Err(format!("contains reserved character {:?}", c));
    }
    if value.chars().any(char::is_control) {
        return Err("contains control characters".to_string());
    }
    if value.chars().any(char::is_whitespace) {
        return Err("contains whitespace".to_string());
    }
    Ok(())
}

/// A version name that is safe to embed in a file name.
///
/// ```
/// use apkrename_core::VersionName;
///
/// let version = VersionName::parse("1.2.0").unwrap();
/// assert_eq!(version.as_str(), "1.2.0");
/// assert!(VersionName::parse("../1.2.0").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionName(String);

impl VersionName {
    /// Validates `raw` and wraps it.
    pub fn parse(raw: impl Into<String>) -> Result<Self, RenameError> {
        let raw = raw.into();
        match check_file_name_component(&raw) {
            Ok(()) => Ok(Self(raw)),
            Err(reason) => Err(RenameError::InvalidVersion(raw, reason)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for VersionName {
    type Error = RenameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<VersionName> for String {
    fn from(value: VersionName) -> Self {
        value.0
    }
}

/// Version fields read from a Flutter `pubspec.yaml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubspecVersion {
    /// Package name declared by the pubspec, if any.
    pub package_name: Option<String>,
    /// Part of `version:` before the `+`, used as Android `versionName`.
    pub version_name: String,
    /// Build number after the `+`, used as Android `versionCode`.
    pub version_code: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct Pubspec {
    name: Option<String>,
    version: Option<serde_yaml::Value>,
}

/// Splits a Flutter version string (`1.2.0+3`) into name and build number.
///
/// ```
/// use apkrename_core::version::split_flutter_version;
///
/// assert_eq!(split_flutter_version("1.2.0+3").unwrap(), ("1.2.0".to_string(), Some(3)));
/// assert_eq!(split_flutter_version("1.2.0").unwrap(), ("1.2.0".to_string(), None));
/// ```
pub fn split_flutter_version(raw: &str) -> Result<(String, Option<u32>), RenameError> {
    let raw = raw.trim();
    let (name, code) = match raw.split_once('+') {
        Some((name, code)) => {
            let code = code.trim().parse::<u32>().map_err(|_| {
                RenameError::Config(format!(
                    "build number in pubspec version '{}' is not a non-negative integer",
                    raw
                ))
            })?;
            (name.trim(), Some(code))
        }
        None => (raw, None),
    };
    if name.is_empty() {
        return Err(RenameError::Config(format!(
            "pubspec version '{}' has an empty version name",
            raw
        )));
    }
    Ok((name.to_string(), code))
}

/// Parses the contents of a `pubspec.yaml` and extracts its version.
pub fn parse_pubspec(contents: &str) -> Result<PubspecVersion, RenameError> {
    let pubspec: Pubspec = serde_yaml::from_str(contents)
        .map_err(|e| RenameError::Config(format!("failed to parse pubspec.yaml: {}", e)))?;

    // YAML reads `version: 1.2` as a float; keep whatever the author wrote.
    let raw = match pubspec.version {
        Some(serde_yaml::Value::String(s)) => s,
        Some(serde_yaml::Value::Number(n)) => n.to_string(),
        Some(other) => {
            return Err(RenameError::Config(format!(
                "pubspec.yaml version has unexpected type: {:?}",
                other
            )));
        }
        None => {
            return Err(RenameError::Config(
                "pubspec.yaml has no version field".to_string(),
            ));
        }
    };

    let (version_name, version_code) = split_flutter_version(&raw)?;
    Ok(PubspecVersion {
        package_name: pubspec.name,
        version_name,
        version_code,
    })
}

/// Reads and parses a `pubspec.yaml` file.
pub fn read_pubspec(path: &Path) -> Result<PubspecVersion, RenameError> {
    let contents = std::fs::read_to_string(path).map_err(|e| RenameError::io(path, e))?;
    parse_pubspec(&contents)
}
