//! Command-line argument definitions for the ReDBox/DSpace bridge
//!
//! Defines the CLI interface using the clap derive API. Two subcommands
//! mirror the two pipeline stages: `extract` crosswalks ReDBox records into
//! a BMET CSV, `reconcile` merges that extract with a DSpace export into an
//! import batch.

use crate::{Error, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the ReDBox/DSpace metadata bridge
#[derive(Debug, Clone, Parser)]
#[command(
    name = "redbox-bridge",
    version,
    about = "Crosswalk ReDBox dataset metadata into DSpace BMET CSV batches",
    long_about = "Extracts research-dataset records from a ReDBox storage tree, crosswalks \
                  them into DSpace Batch Metadata Editing Tool (BMET) CSV format, and \
                  reconciles the extract against a DSpace collection export to produce a \
                  single update/insert import batch."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands for the bridge
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Extract ReDBox dataset records into a BMET CSV crosswalk
    Extract(ExtractArgs),
    /// Merge a ReDBox extract with a DSpace export into an import batch
    Reconcile(ReconcileArgs),
}

/// Arguments for the extract command
#[derive(Debug, Clone, Parser)]
pub struct ExtractArgs {
    /// Root of the ReDBox object storage tree
    ///
    /// Walked recursively for TF-OBJ-META object files. If not specified,
    /// the configured storage root is used.
    #[arg(
        short = 's',
        long = "storage",
        value_name = "PATH",
        help = "Root of the ReDBox object storage tree"
    )]
    pub storage_root: Option<PathBuf>,

    /// Output file for the crosswalk CSV
    ///
    /// If not specified, the CSV is written to stdout.
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help = "Output file for the crosswalk CSV (default: stdout)"
    )]
    pub output: Option<PathBuf>,

    /// Notes-tab keyword marking records for transfer
    ///
    /// Matched case-insensitively as a whole word. Defaults to the
    /// configured keyword ("dspace").
    #[arg(
        long = "keyword",
        value_name = "WORD",
        help = "Notes-tab keyword marking records for transfer"
    )]
    pub keyword: Option<String>,

    /// Path to configuration file
    ///
    /// JSON configuration for deployment-specific settings. If not
    /// specified, looks for the per-user default config file.
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Path to configuration file (JSON format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Force overwrite of an existing output file
    #[arg(long = "force", help = "Force overwrite of an existing output file")]
    pub force_overwrite: bool,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

/// Arguments for the reconcile command
#[derive(Debug, Clone, Parser)]
pub struct ReconcileArgs {
    /// ReDBox crosswalk CSV produced by the extract command
    #[arg(
        long = "source-csv",
        value_name = "FILE",
        help = "ReDBox crosswalk CSV produced by the extract command"
    )]
    pub source_csv: PathBuf,

    /// DSpace collection export CSV
    ///
    /// With --export this file is created by running the DSpace
    /// metadata-export tool first; otherwise it must already exist.
    #[arg(
        long = "archive-csv",
        value_name = "FILE",
        default_value = "dspace_export.csv",
        help = "DSpace collection export CSV"
    )]
    pub archive_csv: PathBuf,

    /// Output file for the merged import batch
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help = "Output file for the merged import batch"
    )]
    pub output: PathBuf,

    /// DSpace collection handle receiving the batch
    #[arg(
        long = "collection",
        value_name = "HANDLE",
        help = "DSpace collection handle receiving the batch"
    )]
    pub collection: Option<String>,

    /// Run the DSpace metadata-export tool to produce the archive CSV
    #[arg(
        long = "export",
        help = "Run the DSpace metadata-export tool before merging"
    )]
    pub run_export: bool,

    /// Run the DSpace metadata-import tool on the merged batch
    #[arg(
        long = "import",
        help = "Run the DSpace metadata-import tool after merging"
    )]
    pub run_import: bool,

    /// Path to configuration file
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Path to configuration file (JSON format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(long = "force", help = "Force overwrite of existing output files")]
    pub force_overwrite: bool,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

impl Args {
    /// Get the command if one was specified
    pub fn get_command(&self) -> Commands {
        self.command
            .clone()
            .expect("Command should be present when get_command() is called")
    }
}

impl ExtractArgs {
    /// Validate the extract command arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if let Some(storage_root) = &self.storage_root {
            if !storage_root.exists() {
                return Err(Error::configuration(format!(
                    "Storage root does not exist: {}",
                    storage_root.display()
                )));
            }
            if !storage_root.is_dir() {
                return Err(Error::configuration(format!(
                    "Storage root is not a directory: {}",
                    storage_root.display()
                )));
            }
        }

        if let Some(keyword) = &self.keyword
            && keyword.trim().is_empty()
        {
            return Err(Error::configuration("Keyword must not be empty"));
        }

        if let Some(config_file) = &self.config_file
            && !config_file.exists()
        {
            return Err(Error::configuration(format!(
                "Config file does not exist: {}",
                config_file.display()
            )));
        }

        Ok(())
    }

    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        log_level(self.verbose, self.quiet)
    }

    /// Check if a progress bar should be shown (not in quiet mode, and not
    /// when the CSV itself goes to stdout)
    pub fn show_progress(&self) -> bool {
        !self.quiet && self.output.is_some()
    }
}

impl ReconcileArgs {
    /// Validate the reconcile command arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if !self.source_csv.exists() {
            return Err(Error::configuration(format!(
                "Source CSV does not exist: {}",
                self.source_csv.display()
            )));
        }

        // Without --export the archive CSV must already be on disk.
        if !self.run_export && !self.archive_csv.exists() {
            return Err(Error::configuration(format!(
                "Archive CSV does not exist (did you mean --export?): {}",
                self.archive_csv.display()
            )));
        }

        if let Some(collection) = &self.collection
            && collection.trim().is_empty()
        {
            return Err(Error::configuration("Collection handle must not be empty"));
        }

        if let Some(config_file) = &self.config_file
            && !config_file.exists()
        {
            return Err(Error::configuration(format!(
                "Config file does not exist: {}",
                config_file.display()
            )));
        }

        Ok(())
    }

    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        log_level(self.verbose, self.quiet)
    }
}

fn log_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

impl Default for ExtractArgs {
    fn default() -> Self {
        Self {
            storage_root: None,
            output: None,
            keyword: None,
            config_file: None,
            force_overwrite: false,
            verbose: 0,
            quiet: false,
        }
    }
}
