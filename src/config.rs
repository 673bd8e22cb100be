//! Configuration: an optional TOML file plus the resolved run options.
//!
//! The file lives in the OS-standard config directory:
//! - Windows: %APPDATA%\playlist-forge\config.toml
//! - macOS: ~/Library/Application Support/playlist-forge/config.toml
//! - Linux: ~/.config/playlist-forge/config.toml
//!
//! It only supplies defaults. Command-line flags are OR-ed on top, and the
//! result is an [`Options`] value that the pipeline reads and never changes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::report::ListView;
use crate::resolver::USER_AGENT;

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileConfig {
    /// Defaults for the boolean run flags
    pub defaults: DefaultsConfig,

    /// Network probe settings
    pub network: NetworkConfig,
}

/// Run flags that can be switched on permanently.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DefaultsConfig {
    pub tolerant: bool,
    pub drop_duplicates: bool,
    pub drop_unfound: bool,
    pub minimal: bool,
    pub verify_network: bool,
    pub read_tags: bool,
    pub quiet: bool,
}

/// Network probe settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Seconds before a probe counts as failed
    pub timeout_secs: u64,

    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl NetworkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("playlist-forge"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Read and parse one config file.
pub fn load_from(path: &std::path::Path) -> std::result::Result<FileConfig, ConfigError> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
}

/// Load configuration from disk
///
/// Returns the defaults if the file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail: a broken config file never stops a run.
pub fn load() -> FileConfig {
    let Some(path) = config_path() else {
        tracing::warn!(target: "config", "Could not determine config directory, using defaults");
        return FileConfig::default();
    };

    if !path.exists() {
        tracing::debug!(target: "config", "No config file found at {:?}, using defaults", path);
        return FileConfig::default();
    }

    match load_from(&path) {
        Ok(config) => {
            tracing::info!(target: "config", "Loaded config from {:?}", path);
            config
        }
        Err(e) => {
            tracing::warn!(target: "config", "{}; using default configuration", e);
            FileConfig::default()
        }
    }
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Failed to parse config file {0}: {1}")]
    Parse(PathBuf, toml::de::Error),
}

// ============================================================================
// Run Options
// ============================================================================

/// How local targets are rewritten when the output is written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PathMode {
    /// Leave targets as they were read
    #[default]
    Unchanged,
    /// Absolute paths
    Absolute,
    /// `file://` URIs of the absolute paths
    FileUri,
    /// Relative to the output playlist's directory
    RelativeToOutput,
    /// Relative to a fixed base directory
    RelativeToBase(PathBuf),
}

impl PathMode {
    /// Combine the individual transform switches into one mode.
    ///
    /// A file URI is an absolute path too, so asking for both gives a URI.
    /// Any absolute form together with any relative form is rejected.
    pub fn from_flags(
        absolute: bool,
        file_uri: bool,
        relative_to_output: bool,
        base: Option<PathBuf>,
    ) -> Result<Self> {
        let wants_absolute = absolute || file_uri;
        let wants_relative = relative_to_output || base.is_some();
        if wants_absolute && wants_relative {
            return Err(Error::config(
                "Cannot combine absolute and relative path transforms",
            ));
        }

        Ok(match (file_uri, absolute, relative_to_output, base) {
            (true, _, _, _) => PathMode::FileUri,
            (_, true, _, _) => PathMode::Absolute,
            (_, _, true, _) => PathMode::RelativeToOutput,
            (_, _, _, Some(base)) => PathMode::RelativeToBase(base),
            _ => PathMode::Unchanged,
        })
    }

    pub fn is_relative(&self) -> bool {
        matches!(self, PathMode::RelativeToOutput | PathMode::RelativeToBase(_))
    }
}

/// One per-entry edit, applied in the order given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryEdit {
    /// `N:KEY=value`
    Change(String),
    /// A track number, or a target to match
    Remove(String),
}

/// Everything one run needs to know.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Input playlists, in merge order
    pub inputs: Vec<PathBuf>,
    /// Output playlist; without one nothing is mutated or written
    pub output: Option<PathBuf>,
    /// Directory prepended to relative local targets of the inputs
    pub prepend: Option<PathBuf>,
    pub path_mode: PathMode,

    pub title: Option<String>,
    pub image: Option<String>,
    /// `N:target` inserts before track N, a bare target appends
    pub inserts: Vec<String>,
    pub edits: Vec<EntryEdit>,

    pub drop_duplicates: bool,
    pub drop_unfound: bool,
    pub shuffle: bool,
    pub minimal: bool,
    pub read_tags: bool,
    pub verify_network: bool,
    pub network: NetworkConfig,

    pub tolerant: bool,
    pub quiet: bool,
    /// Print the summary instead of writing the output
    pub preview: bool,
    /// Print a listing instead of the summary
    pub listing: Option<ListView>,
}

impl Options {
    /// Start from the config file's defaults.
    pub fn from_config(config: &FileConfig) -> Self {
        let defaults = &config.defaults;
        Self {
            tolerant: defaults.tolerant,
            drop_duplicates: defaults.drop_duplicates,
            drop_unfound: defaults.drop_unfound,
            minimal: defaults.minimal,
            verify_network: defaults.verify_network,
            read_tags: defaults.read_tags,
            quiet: defaults.quiet,
            network: config.network.clone(),
            ..Default::default()
        }
    }

    /// Reject contradictory options before any I/O.
    pub fn validate(&self) -> Result<()> {
        let Some(output) = &self.output else {
            if self.preview {
                return Err(Error::config("Preview requires an out playlist (-o)"));
            }
            return Ok(());
        };

        if output.exists() && !self.quiet && !self.preview {
            return Err(Error::OutputExists(output.clone()));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = FileConfig::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[defaults]"));
        assert!(toml.contains("[network]"));
        assert!(toml.contains("timeout_secs = 10"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
[defaults]
drop_duplicates = true
"#;
        let config: FileConfig = toml::from_str(toml).unwrap();
        assert!(config.defaults.drop_duplicates);
        assert!(!config.defaults.tolerant);
        assert_eq!(config.network.timeout_secs, 10);
    }

    #[test]
    fn test_load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[defaults\n").unwrap();
        assert!(matches!(load_from(&path), Err(ConfigError::Parse(..))));
        assert!(matches!(
            load_from(&dir.path().join("missing.toml")),
            Err(ConfigError::Read(..))
        ));
    }

    #[test]
    fn test_options_start_from_file_defaults() {
        let mut config = FileConfig::default();
        config.defaults.quiet = true;
        config.network.timeout_secs = 3;

        let options = Options::from_config(&config);
        assert!(options.quiet);
        assert_eq!(options.network.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_path_mode_conflicts() {
        let base = Some(PathBuf::from("/music"));
        assert!(PathMode::from_flags(true, false, false, base.clone()).is_err());
        assert!(PathMode::from_flags(false, true, true, None).is_err());
        assert!(PathMode::from_flags(true, false, true, None).is_err());

        assert_eq!(PathMode::from_flags(true, true, false, None).unwrap(), PathMode::FileUri);
        assert_eq!(
            PathMode::from_flags(false, false, false, base).unwrap(),
            PathMode::RelativeToBase(PathBuf::from("/music"))
        );
        assert_eq!(PathMode::from_flags(false, false, false, None).unwrap(), PathMode::Unchanged);
    }

    #[test]
    fn test_validate_preview_needs_output() {
        let options = Options {
            preview: true,
            ..Default::default()
        };
        assert!(matches!(options.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.m3u");
        std::fs::write(&output, "").unwrap();

        let mut options = Options {
            output: Some(output),
            ..Default::default()
        };
        assert!(matches!(options.validate(), Err(Error::OutputExists(_))));

        options.quiet = true;
        assert!(options.validate().is_ok());

        options.quiet = false;
        options.preview = true;
        assert!(options.validate().is_ok());
    }
}
