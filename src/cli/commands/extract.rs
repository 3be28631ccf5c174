//! Extract command implementation
//!
//! Orchestrates the first pipeline stage: discover transfer-marked dataset
//! records under the ReDBox storage root, build a normalized record for
//! each, and render the BMET crosswalk CSV to stdout or a file.

use super::shared::{RunStats, create_progress_bar, setup_logging};
use crate::app::services::crosswalk::render_bmet_csv;
use crate::app::services::discovery::RecordDiscovery;
use crate::app::services::dspace_bridge::ensure_overwritable;
use crate::app::services::record_builder::RecordBuilder;
use crate::cli::args::ExtractArgs;
use crate::config::Config;
use crate::{Error, Result};
use std::time::Instant;
use tracing::{debug, info};

/// Extract command runner
///
/// 1. Set up logging and layered configuration
/// 2. Discover records passing all selection predicates
/// 3. Build one normalized record per selected object
/// 4. Render and write the crosswalk CSV
pub fn run_extract(args: ExtractArgs) -> Result<RunStats> {
    let start_time = Instant::now();

    setup_logging(args.get_log_level(), args.quiet)?;
    info!("starting ReDBox dataset extract");
    debug!("command line arguments: {:?}", args);

    args.validate()?;

    let mut config = Config::load_layered(args.config_file.as_deref())?;
    if let Some(storage_root) = &args.storage_root {
        config.storage_root = storage_root.clone();
    }
    if let Some(keyword) = &args.keyword {
        config.note_keyword = keyword.clone();
    }
    if args.force_overwrite {
        config.force_overwrite = true;
    }
    config.validate()?;

    if config.storage_root.as_os_str().is_empty() {
        return Err(Error::configuration(
            "no storage root configured; pass --storage or set storage_root in the config file",
        ));
    }

    let discovery = RecordDiscovery::new(config.storage_root.clone(), &config.note_keyword)?;
    let selected = discovery.discover()?;
    info!("{} records selected for crosswalk", selected.len());

    let builder = RecordBuilder::new()?;
    let progress = args
        .show_progress()
        .then(|| create_progress_bar(selected.len() as u64, "building records"));

    let mut records = Vec::with_capacity(selected.len());
    for paths in &selected {
        records.push(builder.build(&paths.object, &paths.package)?);
        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let csv_text = render_bmet_csv(&records)?;

    match &args.output {
        Some(path) => {
            ensure_overwritable(path, config.force_overwrite)?;
            std::fs::write(path, &csv_text).map_err(|e| {
                Error::io(format!("failed to write crosswalk CSV {}", path.display()), e)
            })?;
            info!("wrote {} records to {}", records.len(), path.display());
        }
        None => {
            print!("{csv_text}");
        }
    }

    Ok(RunStats {
        records_discovered: selected.len(),
        records_written: records.len(),
        elapsed: start_time.elapsed(),
        ..Default::default()
    })
}
