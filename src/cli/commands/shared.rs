//! Shared components for CLI commands
//!
//! Common statistics, logging setup and progress reporting used by both
//! command implementations.

use crate::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

/// Run statistics for reporting across both commands
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Number of records selected by discovery
    pub records_discovered: usize,
    /// Number of rows written to the output CSV
    pub records_written: usize,
    /// Number of rows marked for insertion
    pub inserts: usize,
    /// Number of rows carrying an existing DSpace item id
    pub updates: usize,
    /// Total run time
    pub elapsed: std::time::Duration,
}

/// Set up structured logging to stderr
///
/// Stdout stays reserved for CSV output, so all diagnostics go to stderr.
pub fn setup_logging(log_level: &str, quiet: bool) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("redbox_bridge={log_level}")));

    if quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("logging initialized at level: {}", log_level);
    Ok(())
}

/// Create a styled progress bar for record processing
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb.set_message(message.to_string());
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_stats_default() {
        let stats = RunStats::default();
        assert_eq!(stats.records_discovered, 0);
        assert_eq!(stats.inserts, 0);
        assert_eq!(stats.updates, 0);
        assert_eq!(stats.elapsed, std::time::Duration::ZERO);
    }

    #[test]
    fn test_create_progress_bar() {
        let pb = create_progress_bar(10, "building records");
        assert_eq!(pb.length(), Some(10));
        pb.finish_and_clear();
    }
}
