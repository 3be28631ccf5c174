//! Reconcile command implementation
//!
//! Orchestrates the second pipeline stage: optionally export the DSpace
//! collection, merge the ReDBox extract against it into one update/insert
//! batch, and optionally hand the batch to the DSpace import tool.

use super::shared::{RunStats, setup_logging};
use crate::app::services::dspace_bridge::{DspaceBridge, ensure_overwritable};
use crate::app::services::reconciler::{BatchReconciler, BmetExtract};
use crate::cli::args::ReconcileArgs;
use crate::config::Config;
use crate::{Error, Result};
use std::time::Instant;
use tracing::{debug, info};

/// Reconcile command runner
///
/// 1. Set up logging and layered configuration
/// 2. Optionally run DSpace `metadata-export` to refresh the archive CSV
/// 3. Merge the source extract against the archive extract
/// 4. Write the batch, optionally running DSpace `metadata-import` on it
pub fn run_reconcile(args: ReconcileArgs) -> Result<RunStats> {
    let start_time = Instant::now();

    setup_logging(args.get_log_level(), args.quiet)?;
    info!("starting DSpace batch reconciliation");
    debug!("command line arguments: {:?}", args);

    args.validate()?;

    let mut config = Config::load_layered(args.config_file.as_deref())?;
    if let Some(collection) = &args.collection {
        config.collection_handle = collection.clone();
    }
    if args.force_overwrite {
        config.force_overwrite = true;
    }
    config.validate()?;

    let bridge = DspaceBridge::new(&config);

    if args.run_export {
        ensure_overwritable(&args.archive_csv, config.force_overwrite)?;
        info!(
            "exporting collection {} to {}",
            config.collection_handle,
            args.archive_csv.display()
        );
        bridge.export_collection(&args.archive_csv)?;
    }

    let source = BmetExtract::from_path(&args.source_csv)?;
    let archive = BmetExtract::from_path(&args.archive_csv)?;
    info!(
        "merging {} source rows against {} archive rows",
        source.rows().len(),
        archive.rows().len()
    );

    let reconciler = BatchReconciler::new(&config)?;
    let index = reconciler.build_index(&archive);
    let partition = reconciler.partition(&source, &index);
    info!(
        "{} new records, {} updates",
        partition.new_ids.len(),
        partition.update_ids.len()
    );

    let batch = reconciler.reconcile(&source, &archive)?;

    ensure_overwritable(&args.output, config.force_overwrite)?;
    std::fs::write(&args.output, &batch).map_err(|e| {
        Error::io(format!("failed to write batch CSV {}", args.output.display()), e)
    })?;
    info!("wrote import batch to {}", args.output.display());

    if args.run_import {
        info!("importing batch as {}", config.import_user_email);
        bridge.import_batch(&args.output)?;
    }

    Ok(RunStats {
        records_written: source.rows().len(),
        inserts: partition.new_ids.len(),
        updates: partition.update_ids.len(),
        elapsed: start_time.elapsed(),
        ..Default::default()
    })
}
