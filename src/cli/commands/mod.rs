//! Command implementations for the bridge CLI
//!
//! Contains the command execution logic, logging setup and progress
//! reporting for the CLI interface. Each command is implemented in its own
//! module.

pub mod extract;
pub mod reconcile;
pub mod shared;

pub use shared::RunStats;

use crate::Result;
use crate::cli::args::{Args, Commands};

/// Main command runner for the bridge
///
/// Dispatches to the appropriate subcommand handler based on CLI args:
/// - `extract`: ReDBox discovery, record building and BMET crosswalk
/// - `reconcile`: DSpace export merge into an update/insert batch
pub fn run(args: Args) -> Result<RunStats> {
    match args.get_command() {
        Commands::Extract(extract_args) => extract::run_extract(extract_args),
        Commands::Reconcile(reconcile_args) => reconcile::run_reconcile(reconcile_args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_stats_re_export() {
        let stats = RunStats::default();
        assert_eq!(stats.records_discovered, 0);
        assert_eq!(stats.records_written, 0);
    }
}
