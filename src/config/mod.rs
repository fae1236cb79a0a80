//! Configuration for `livetmpl.toml`.
//!
//! # Example
//!
//! ```toml
//! [templates]
//! root = "templates"    # Relative to the config file directory
//! extension = "tmpl"    # Exact match, leading dot optional
//!
//! [log]
//! verbose = false       # Show debug output
//! ```
//!
//! A missing config file is not an error: every field has a default.

mod error;

pub use error::ConfigError;

use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::scan::normalize_extension;

pub const DEFAULT_CONFIG_FILE: &str = "livetmpl.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing livetmpl.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory relative paths are resolved against (internal use only)
    #[serde(skip)]
    pub base_dir: PathBuf,

    pub templates: TemplatesConfig,

    pub log: LogConfig,
}

/// `[templates]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Template root directory.
    pub root: PathBuf,

    /// File extension of template sources.
    pub extension: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("templates"),
            extension: "tmpl".to_string(),
        }
    }
}

/// `[log]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub verbose: bool,
}

impl Config {
    /// Load configuration from `path`, falling back to defaults if the file
    /// does not exist. Relative paths resolve against the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut config = if path.exists() {
            Self::from_path(path)?
        } else {
            crate::debug!("config"; "{} not found, using defaults", path.display());
            Self::default()
        };

        config.base_dir = base_dir;
        config.validate()?;
        Ok(config)
    }

    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        crate::log!("warning"; "ignoring unknown fields in {}: {}", display_path, fields.join(", "));
    }

    /// Apply command line overrides on top of the file values.
    pub fn apply_overrides(
        &mut self,
        root: Option<PathBuf>,
        extension: Option<String>,
        verbose: bool,
    ) -> Result<(), ConfigError> {
        if let Some(root) = root {
            // CLI paths are relative to the working directory, not the config file
            self.templates.root = std::env::current_dir()
                .map(|cwd| cwd.join(&root))
                .unwrap_or(root);
        }
        if let Some(extension) = extension {
            self.templates.extension = extension;
        }
        self.log.verbose |= verbose;
        self.validate()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.templates.root.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "[templates] root must not be empty".to_string(),
            ));
        }

        let extension = normalize_extension(&self.templates.extension);
        if extension.contains(['/', '\\', '.']) || extension.contains(char::is_whitespace) {
            return Err(ConfigError::Validation(format!(
                "[templates] extension `{}` must be a single extension like `tmpl`",
                self.templates.extension
            )));
        }

        Ok(())
    }

    /// Template root resolved against the config directory.
    pub fn root_dir(&self) -> PathBuf {
        self.base_dir.join(&self.templates.root)
    }

    pub fn extension(&self) -> &str {
        &self.templates.extension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(content: &str) -> Config {
        let (parsed, ignored) = Config::parse_with_ignored(content).unwrap();
        assert!(ignored.is_empty(), "test config has unknown fields: {ignored:?}");
        parsed
    }

    #[test]
    fn test_defaults() {
        let config = parse("");
        assert_eq!(config.templates.root, PathBuf::from("templates"));
        assert_eq!(config.templates.extension, "tmpl");
        assert!(!config.log.verbose);
    }

    #[test]
    fn test_sections() {
        let config = parse("[templates]\nroot = \"views\"\nextension = \".html\"\n[log]\nverbose = true");
        assert_eq!(config.templates.root, PathBuf::from("views"));
        assert_eq!(config.extension(), ".html");
        assert!(config.log.verbose);
    }

    #[test]
    fn test_unknown_fields_collected() {
        let (_, ignored) = Config::parse_with_ignored("[templates]\nrooot = \"x\"").unwrap();
        assert_eq!(ignored, ["templates.rooot"]);
    }

    #[test]
    fn test_load_resolves_root_against_config_dir() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "[templates]\nroot = \"views\"").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.root_dir(), temp.path().join("views"));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(&temp.path().join("absent.toml")).unwrap();
        assert_eq!(config.root_dir(), temp.path().join("templates"));
    }

    #[test]
    fn test_load_rejects_bad_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "[templates]\nextension = \"tar.gz\"").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "[templates\nroot = 1").unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = parse("");
        config
            .apply_overrides(Some(PathBuf::from("/abs/views")), Some("j2".into()), true)
            .unwrap();

        assert_eq!(config.templates.root, PathBuf::from("/abs/views"));
        assert_eq!(config.root_dir(), PathBuf::from("/abs/views"));
        assert_eq!(config.extension(), "j2");
        assert!(config.log.verbose);
    }
}
