//! Rebrand configuration: the old/new identifier pairs.
//!
//! Built once from defaults, an optional JSON file, and CLI flags (in that
//! order of precedence), then validated and treated as read-only.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::io;
use crate::rules::NATIVE_LIBRARY;

pub const DEFAULT_OLD_PACKAGE: &str = "com.carriez.flutter_hbb";
pub const DEFAULT_NEW_PACKAGE: &str = "com.celonis.work";
pub const DEFAULT_OLD_APP_NAME: &str = "RustDesk";
pub const DEFAULT_NEW_APP_NAME: &str = "ToddDesk";
pub const DEFAULT_OLD_SCHEME: &str = "rustdesk";
pub const DEFAULT_NEW_SCHEME: &str = "todddesk";
pub const DEFAULT_OLD_SERVICE: &str = "InputService";
pub const DEFAULT_NEW_SERVICE: &str = "ToddService";
pub const DEFAULT_ACCESSIBILITY_DESC: &str = "Made by Todd";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatchConfig {
    pub old_package: String,
    pub new_package: String,
    pub old_app_name: String,
    pub new_app_name: String,
    pub old_scheme: String,
    pub new_scheme: String,
    pub old_service: String,
    pub new_service: String,
    pub accessibility_desc: String,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            old_package: DEFAULT_OLD_PACKAGE.to_string(),
            new_package: DEFAULT_NEW_PACKAGE.to_string(),
            old_app_name: DEFAULT_OLD_APP_NAME.to_string(),
            new_app_name: DEFAULT_NEW_APP_NAME.to_string(),
            old_scheme: DEFAULT_OLD_SCHEME.to_string(),
            new_scheme: DEFAULT_NEW_SCHEME.to_string(),
            old_service: DEFAULT_OLD_SERVICE.to_string(),
            new_service: DEFAULT_NEW_SERVICE.to_string(),
            accessibility_desc: DEFAULT_ACCESSIBILITY_DESC.to_string(),
        }
    }
}

/// Per-field overrides, typically from explicit CLI flags.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub old_package: Option<String>,
    pub new_package: Option<String>,
    pub old_app_name: Option<String>,
    pub new_app_name: Option<String>,
    pub old_scheme: Option<String>,
    pub new_scheme: Option<String>,
    pub old_service: Option<String>,
    pub new_service: Option<String>,
    pub accessibility_desc: Option<String>,
}

impl PatchConfig {
    /// Load a config file. Missing keys fall back to the defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = io::read_text(path)?;
        Self::from_json_str(&content, &path.display().to_string())
    }

    pub fn from_json_str(content: &str, source: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| Error::config_invalid_json(source, e))
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        let ConfigOverrides {
            old_package,
            new_package,
            old_app_name,
            new_app_name,
            old_scheme,
            new_scheme,
            old_service,
            new_service,
            accessibility_desc,
        } = overrides;

        let pairs = [
            (&mut self.old_package, old_package),
            (&mut self.new_package, new_package),
            (&mut self.old_app_name, old_app_name),
            (&mut self.new_app_name, new_app_name),
            (&mut self.old_scheme, old_scheme),
            (&mut self.new_scheme, new_scheme),
            (&mut self.old_service, old_service),
            (&mut self.new_service, new_service),
            (&mut self.accessibility_desc, accessibility_desc),
        ];
        for (field, value) in pairs {
            if let Some(value) = value {
                *field = value;
            }
        }
        self
    }

    /// Reject values that would make the rule set or the validator meaningless.
    pub fn validate(&self) -> Result<()> {
        validate_package("old_package", &self.old_package)?;
        validate_package("new_package", &self.new_package)?;
        if self.old_package == self.new_package {
            return Err(Error::validation_invalid_argument(
                "new_package",
                "must differ from --old-package",
                Some(self.new_package.clone()),
            ));
        }

        require_non_empty("old_app_name", &self.old_app_name)?;
        require_non_empty("new_app_name", &self.new_app_name)?;

        validate_scheme("old_scheme", &self.old_scheme)?;
        validate_scheme("new_scheme", &self.new_scheme)?;
        if self.new_scheme == NATIVE_LIBRARY {
            return Err(Error::validation_invalid_argument(
                "new_scheme",
                format!(
                    "must differ from the native library name '{}'",
                    NATIVE_LIBRARY
                ),
                Some(self.new_scheme.clone()),
            ));
        }

        validate_identifier("old_service", &self.old_service)?;
        validate_identifier("new_service", &self.new_service)?;

        Ok(())
    }

    /// Path segments of a package identifier, e.g. `com.example.app` -> `["com", "example", "app"]`.
    pub fn package_segments(package: &str) -> impl Iterator<Item = &str> {
        package.split('.')
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation_invalid_argument(
            field,
            "must not be empty",
            None,
        ));
    }
    Ok(())
}

fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn validate_identifier(field: &str, value: &str) -> Result<()> {
    require_non_empty(field, value)?;
    if !is_identifier(value) {
        return Err(Error::validation_invalid_argument(
            field,
            "must be a class identifier ([A-Za-z_][A-Za-z0-9_]*)",
            Some(value.to_string()),
        ));
    }
    Ok(())
}

fn validate_package(field: &str, value: &str) -> Result<()> {
    require_non_empty(field, value)?;
    let segments: Vec<&str> = PatchConfig::package_segments(value).collect();
    if segments.len() < 2 || !segments.iter().all(|s| is_identifier(s)) {
        return Err(Error::validation_invalid_argument(
            field,
            "must be a dot-separated package identifier like com.example.app",
            Some(value.to_string()),
        ));
    }
    Ok(())
}

fn validate_scheme(field: &str, value: &str) -> Result<()> {
    require_non_empty(field, value)?;
    let starts_with_letter = value.starts_with(|c: char| c.is_ascii_lowercase());
    let valid_chars = value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '+' | '.' | '-'));
    if !starts_with_letter || !valid_chars {
        return Err(Error::validation_invalid_argument(
            field,
            "must be a lowercase URI scheme ([a-z][a-z0-9+.-]*)",
            Some(value.to_string()),
        ));
    }
    Ok(())
}
