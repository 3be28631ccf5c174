//! Configuration management and validation.
//!
//! Provides the deployment-specific parameters for a bridge run: where the
//! ReDBox storage tree lives, how handle URLs for each system are shaped,
//! which DSpace collection receives the batch, and how the external DSpace
//! command-line tools are invoked.

use crate::constants::{DEFAULT_IDENTIFIER_COLUMN, DEFAULT_NOTE_KEYWORD};
use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Global configuration for a bridge run
///
/// All fields have deployment-neutral defaults; a JSON config file and CLI
/// arguments layer on top.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the ReDBox object storage tree walked during discovery
    pub storage_root: PathBuf,

    /// Keyword searched for in the Notes tab (case-insensitive, whole word)
    pub note_keyword: String,

    /// Handle.net host part, with trailing slash
    pub handle_host: String,

    /// Handle prefix assigned to ReDBox, without trailing slash
    pub redbox_handle_prefix: String,

    /// Handle prefix assigned to DSpace, without trailing slash
    pub dspace_handle_prefix: String,

    /// Handle of the DSpace collection receiving the batch
    pub collection_handle: String,

    /// Name of the multi-valued CSV column carrying both systems' handles
    pub identifier_column: String,

    /// DSpace launcher binary, absolute path or on `$PATH`
    pub dspace_command: String,

    /// E-person email passed to `metadata-import -e`
    pub import_user_email: String,

    /// Answer piped into the `metadata-import` confirmation prompt;
    /// `false` answers "n", leaving the import a reviewable dry run
    pub import_confirm: bool,

    /// Permit silently overwriting existing output CSV files
    pub force_overwrite: bool,

    /// Directory receiving the external command log files
    pub log_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::new(),
            note_keyword: DEFAULT_NOTE_KEYWORD.to_string(),
            handle_host: "hdl.handle.net/".to_string(),
            redbox_handle_prefix: "0000".to_string(),
            dspace_handle_prefix: "123456789".to_string(),
            collection_handle: "123456789/999000".to_string(),
            identifier_column: DEFAULT_IDENTIFIER_COLUMN.to_string(),
            dspace_command: "dspace".to_string(),
            import_user_email: "dspaceuser@example.com".to_string(),
            import_confirm: false,
            force_overwrite: false,
            log_dir: PathBuf::from("log"),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("failed to read config file {}", path.display()), e))?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| {
            Error::configuration(format!("invalid config file {}: {}", path.display(), e))
        })?;
        Ok(config)
    }

    /// Default per-user config file location
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("redbox-bridge").join("config.json"))
    }

    /// Load configuration layered from an explicit file, the default file
    /// location, or built-in defaults, in that order of preference
    pub fn load_layered(config_file: Option<&Path>) -> Result<Self> {
        if let Some(path) = config_file {
            debug!("using config file: {}", path.display());
            return Self::load(path);
        }
        if let Some(default_path) = Self::default_config_path()
            && default_path.exists()
        {
            debug!("using default config file: {}", default_path.display());
            return Self::load(&default_path);
        }
        debug!("no config file found, using built-in defaults");
        Ok(Self::default())
    }

    /// Validate configuration for consistency
    pub fn validate(&self) -> Result<()> {
        if self.handle_host.is_empty() {
            return Err(Error::configuration("handle host must not be empty"));
        }
        if self.redbox_handle_prefix.is_empty() || self.dspace_handle_prefix.is_empty() {
            return Err(Error::configuration("handle prefixes must not be empty"));
        }
        if self.collection_handle.is_empty() {
            return Err(Error::configuration("collection handle must not be empty"));
        }
        if self.identifier_column.is_empty() {
            return Err(Error::configuration("identifier column must not be empty"));
        }
        if self.note_keyword.trim().is_empty() {
            return Err(Error::configuration("note keyword must not be empty"));
        }
        Ok(())
    }

    /// Regex matching an identifier URI minted by ReDBox
    pub fn redbox_handle_regex(&self) -> Result<Regex> {
        self.handle_regex(&self.redbox_handle_prefix)
    }

    /// Regex matching an identifier URI minted by DSpace
    pub fn dspace_handle_regex(&self) -> Result<Regex> {
        self.handle_regex(&self.dspace_handle_prefix)
    }

    fn handle_regex(&self, prefix: &str) -> Result<Regex> {
        let pattern = format!(
            "{}({}/.*)$",
            regex::escape(&self.handle_host),
            regex::escape(prefix)
        );
        Regex::new(&pattern)
            .map_err(|e| Error::configuration(format!("invalid handle pattern '{pattern}': {e}")))
    }

    /// Log file paths for the export operation (stdout, stderr)
    pub fn export_logs(&self) -> (PathBuf, PathBuf) {
        (
            self.log_dir.join("dspace_export.log"),
            self.log_dir.join("dspace_export.err"),
        )
    }

    /// Log file paths for the import operation (stdout, stderr)
    pub fn import_logs(&self) -> (PathBuf, PathBuf) {
        (
            self.log_dir.join("dspace_import.log"),
            self.log_dir.join("dspace_import.err"),
        )
    }

    /// Create configuration with a custom storage root
    pub fn with_storage_root(mut self, storage_root: PathBuf) -> Self {
        self.storage_root = storage_root;
        self
    }

    /// Create configuration with a custom collection handle
    pub fn with_collection_handle(mut self, handle: impl Into<String>) -> Self {
        self.collection_handle = handle.into();
        self
    }

    /// Enable overwriting of existing output files
    pub fn with_force_overwrite(mut self) -> Self {
        self.force_overwrite = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_handle_regexes_distinguish_systems() {
        let config = Config::default();
        let redbox = config.redbox_handle_regex().unwrap();
        let dspace = config.dspace_handle_regex().unwrap();

        assert!(redbox.is_match("http://hdl.handle.net/0000/42"));
        assert!(!redbox.is_match("http://hdl.handle.net/123456789/42"));
        assert!(dspace.is_match("http://hdl.handle.net/123456789/42"));
        assert!(!dspace.is_match("http://hdl.handle.net/0000/42"));
        // A DOI resolver URL matches neither scheme
        assert!(!redbox.is_match("http://dx.doi.org/10.4226/86/1"));
        assert!(!dspace.is_match("http://dx.doi.org/10.4226/86/1"));
    }

    #[test]
    fn test_validate_rejects_empty_fields() {
        let mut config = Config::default();
        config.collection_handle = String::new();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.redbox_handle_prefix = String::new();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.note_keyword = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_json_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"collection_handle": "123456789/777", "import_confirm": true}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.collection_handle, "123456789/777");
        assert!(config.import_confirm);
        // Unspecified fields fall back to defaults
        assert_eq!(config.note_keyword, "dspace");
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_builder_helpers() {
        let config = Config::default()
            .with_storage_root(PathBuf::from("/srv/redbox/storage"))
            .with_collection_handle("123456789/555")
            .with_force_overwrite();
        assert_eq!(config.storage_root, PathBuf::from("/srv/redbox/storage"));
        assert_eq!(config.collection_handle, "123456789/555");
        assert!(config.force_overwrite);
    }
}
