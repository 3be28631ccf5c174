//! ReDBox to DSpace metadata bridge
//!
//! A Rust library for moving research-dataset metadata out of a ReDBox
//! storage tree and into a DSpace collection via Batch Metadata Editing
//! Tool (BMET) CSV files.
//!
//! This library provides tools for:
//! - Discovering published dataset records in ReDBox object storage
//! - Reconstructing repeated metadata groups from flat, index-numbered keys
//! - Crosswalking record metadata into the fixed BMET CSV column schema
//! - Reconciling a ReDBox extract against a DSpace collection export into
//!   one update/insert import batch
//! - Driving the DSpace `metadata-export` / `metadata-import` tools

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod crosswalk;
        pub mod discovery;
        pub mod dspace_bridge;
        pub mod indexed_group;
        pub mod record_builder;
        pub mod reconciler;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{DatasetRecord, MetadataDocument, ObjectSidecar};
pub use config::Config;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for ReDBox/DSpace bridge operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV parsing or rendering error
    #[error("CSV error in '{file}': {message}")]
    Csv {
        file: String,
        message: String,
        #[source]
        source: Option<csv::Error>,
    },

    /// Package document could not be parsed
    #[error("document format error in '{file}': {message}")]
    DocumentFormat { file: String, message: String },

    /// Configuration error
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// File not found
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// Directory traversal error
    #[error("directory traversal error: {message}")]
    DirectoryTraversal {
        message: String,
        #[source]
        source: walkdir::Error,
    },

    /// Output file already exists and overwriting is not permitted
    #[error("output file already exists (pass --force to overwrite): {path}")]
    OutputExists { path: String },

    /// External DSpace command exited non-zero
    #[error("external command failed with exit status {code}: {command} (inspect {log})")]
    ExternalCommand {
        command: String,
        code: i32,
        log: String,
    },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a CSV error with context
    pub fn csv(
        file: impl Into<String>,
        message: impl Into<String>,
        source: Option<csv::Error>,
    ) -> Self {
        Self::Csv {
            file: file.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a document format error
    pub fn document_format(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DocumentFormat {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a directory traversal error
    pub fn directory_traversal(message: impl Into<String>, source: walkdir::Error) -> Self {
        Self::DirectoryTraversal {
            message: message.into(),
            source,
        }
    }

    /// Create an output-exists error
    pub fn output_exists(path: impl Into<String>) -> Self {
        Self::OutputExists { path: path.into() }
    }

    /// Create an external command failure carrying the child's exit code
    pub fn external_command(
        command: impl Into<String>,
        code: i32,
        log: impl Into<String>,
    ) -> Self {
        Self::ExternalCommand {
            command: command.into(),
            code,
            log: log.into(),
        }
    }

    /// Exit code this error should terminate the process with
    ///
    /// External command failures propagate the child's own exit code so that
    /// wrapper scripts see the same status the DSpace tool reported.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ExternalCommand { code, .. } => *code,
            _ => 1,
        }
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Self::Csv {
            file: "unknown".to_string(),
            message: "CSV processing failed".to_string(),
            source: Some(error),
        }
    }
}

impl From<walkdir::Error> for Error {
    fn from(error: walkdir::Error) -> Self {
        Self::DirectoryTraversal {
            message: "directory traversal failed".to_string(),
            source: error,
        }
    }
}
