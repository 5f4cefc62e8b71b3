//! Configuration for a template set

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::tags::TagBoundaries;

/// Environment variable holding the process-wide default template folder
pub const FOLDER_ENV_VAR: &str = "TEMPLATESET_FOLDER";

/// Errors that can occur when loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read template set config: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse template set config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// What a failed lookup returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailMode {
    /// Return an inline placeholder describing the failure
    #[default]
    #[serde(alias = "pretty")]
    Verbose,
    /// Return nothing, so callers can tell "missing" from "present"
    Silent,
}

/// Configuration options for a template set
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TemplateSetConfig {
    /// Folder holding the template files
    pub base_dir: Option<PathBuf>,

    /// Folder used when `base_dir` is unset
    pub fallback_dir: Option<PathBuf>,

    /// Extension appended to template stubs, without the dot
    pub default_extension: String,

    /// Minutes a parsed fragment stays fresh (0 keeps only the 5s floor)
    pub refresh_minutes: u64,

    /// Markers handed to every composition the set produces
    pub tag_boundaries: TagBoundaries,

    /// Placeholder or nothing on failed lookups
    pub fail_mode: FailMode,
}

impl Default for TemplateSetConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            fallback_dir: None,
            default_extension: "html".to_string(),
            refresh_minutes: 15,
            tag_boundaries: TagBoundaries::default(),
            fail_mode: FailMode::Verbose,
        }
    }
}

impl TemplateSetConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, with the fallback folder taken from `TEMPLATESET_FOLDER`
    pub fn from_env() -> Self {
        let fallback_dir = std::env::var_os(FOLDER_ENV_VAR)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);
        Self {
            fallback_dir,
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Set the template folder
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Set the folder used when no base folder is configured
    pub fn with_fallback_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fallback_dir = Some(dir.into());
        self
    }

    /// Set the default file extension
    pub fn with_default_extension(mut self, extension: impl Into<String>) -> Self {
        self.default_extension = extension.into();
        self
    }

    /// Set the refresh interval in minutes
    pub fn with_refresh_minutes(mut self, minutes: u64) -> Self {
        self.refresh_minutes = minutes;
        self
    }

    /// Set the tag boundary markers
    pub fn with_tag_boundaries(mut self, tags: TagBoundaries) -> Self {
        self.tag_boundaries = tags;
        self
    }

    /// Set the failure mode
    pub fn with_fail_mode(mut self, mode: FailMode) -> Self {
        self.fail_mode = mode;
        self
    }

    /// The folder templates are read from
    pub fn resolved_base_dir(&self) -> PathBuf {
        self.base_dir
            .clone()
            .or_else(|| self.fallback_dir.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TemplateSetConfig::default();
        assert_eq!(config.base_dir, None);
        assert_eq!(config.default_extension, "html");
        assert_eq!(config.refresh_minutes, 15);
        assert_eq!(config.tag_boundaries, TagBoundaries::default());
        assert_eq!(config.fail_mode, FailMode::Verbose);
    }

    #[test]
    fn test_builder_pattern() {
        let config = TemplateSetConfig::new()
            .with_base_dir("/srv/templates")
            .with_default_extension("xml")
            .with_refresh_minutes(0)
            .with_tag_boundaries(TagBoundaries::new("{$", "}"))
            .with_fail_mode(FailMode::Silent);

        assert_eq!(config.base_dir, Some(PathBuf::from("/srv/templates")));
        assert_eq!(config.default_extension, "xml");
        assert_eq!(config.refresh_minutes, 0);
        assert_eq!(config.tag_boundaries.start, "{$");
        assert_eq!(config.fail_mode, FailMode::Silent);
    }

    #[test]
    fn test_base_dir_falls_back() {
        let config = TemplateSetConfig::new().with_fallback_dir("/fallback");
        assert_eq!(config.resolved_base_dir(), PathBuf::from("/fallback"));

        let config = config.with_base_dir("/primary");
        assert_eq!(config.resolved_base_dir(), PathBuf::from("/primary"));

        assert_eq!(TemplateSetConfig::new().resolved_base_dir(), PathBuf::new());
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
base_dir = "themes/default"
default_extension = "xml"
refresh_minutes = 1
fail_mode = "silent"

[tag_boundaries]
start = "{$"
"#;
        let config = TemplateSetConfig::from_toml_str(toml_str).expect("Should parse");
        assert_eq!(config.base_dir, Some(PathBuf::from("themes/default")));
        assert_eq!(config.default_extension, "xml");
        assert_eq!(config.refresh_minutes, 1);
        assert_eq!(config.fail_mode, FailMode::Silent);
        assert_eq!(config.tag_boundaries, TagBoundaries::new("{$", "}"));
    }

    #[test]
    fn test_parse_pretty_alias_and_defaults() {
        let config = TemplateSetConfig::from_toml_str(r#"fail_mode = "pretty""#)
            .expect("Should parse");
        assert_eq!(config.fail_mode, FailMode::Verbose);
        assert_eq!(config.default_extension, "html");
    }

    #[test]
    fn test_invalid_toml_error() {
        let result = TemplateSetConfig::from_toml_str("refresh_minutes = \"soon\"");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_missing_file_error() {
        let result = TemplateSetConfig::from_file(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }
}
