//! Batch reconciliation of a ReDBox extract against a DSpace export
//!
//! Matches rows across the two independently-produced BMET extracts by the
//! ReDBox handle packed inside the multi-valued identifier column, then
//! emits one merged batch: rows unknown to DSpace get the `+` insert
//! marker, known rows get DSpace's item id, and the identifier cell gains
//! the DSpace handle when DSpace has one the row doesn't carry yet.

use crate::config::Config;
use crate::constants::{COLLECTION_COLUMN, ID_COLUMN, INSERT_MARKER, VALUE_DELIMITER};
use crate::{Error, Result};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// One parsed BMET CSV file: header order plus row cells
#[derive(Debug, Clone, Default)]
pub struct BmetExtract {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl BmetExtract {
    /// Parse a BMET CSV file
    pub fn from_path(path: &Path) -> Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| {
                Error::csv(path.display().to_string(), "failed to open extract", Some(e))
            })?;
        Self::from_csv_reader(reader, &path.display().to_string())
    }

    /// Parse BMET CSV text
    pub fn from_str(raw: &str) -> Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(raw.as_bytes());
        Self::from_csv_reader(reader, "<string>")
    }

    fn from_csv_reader<R: std::io::Read>(mut reader: csv::Reader<R>, origin: &str) -> Result<Self> {
        let headers = reader
            .headers()
            .map_err(|e| Error::csv(origin, "failed to read header", Some(e)))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record =
                result.map_err(|e| Error::csv(origin, "failed to read row", Some(e)))?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Self { headers, rows })
    }

    /// Column labels in file order
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows in file order
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Position of a column by label
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == label)
    }

    /// Cell of a row by column label, empty when the column or cell is absent
    pub fn cell<'a>(&self, row: &'a [String], label: &str) -> &'a str {
        self.column_index(label)
            .and_then(|index| row.get(index))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Lookup tables derived from the DSpace extract, keyed by ReDBox handle
#[derive(Debug, Default)]
pub struct ReconciliationIndex {
    item_id_by_source: HashMap<String, String>,
    archive_id_by_source: HashMap<String, String>,
}

impl ReconciliationIndex {
    /// DSpace item id for a ReDBox handle; empty string means the row
    /// exists but has no item id yet
    pub fn item_id(&self, source_id: &str) -> Option<&str> {
        self.item_id_by_source.get(source_id).map(String::as_str)
    }

    /// DSpace handle for a ReDBox handle
    pub fn archive_id(&self, source_id: &str) -> Option<&str> {
        self.archive_id_by_source.get(source_id).map(String::as_str)
    }

    /// Number of indexed source ids
    pub fn len(&self) -> usize {
        self.item_id_by_source.len()
    }

    /// Whether the index holds no source ids
    pub fn is_empty(&self) -> bool {
        self.item_id_by_source.is_empty()
    }
}

/// Informational split of the source extract into new and updated records
#[derive(Debug, Default)]
pub struct BatchPartition {
    pub new_ids: Vec<String>,
    pub update_ids: Vec<String>,
}

/// Merges a ReDBox extract and a DSpace export into one import batch
#[derive(Debug)]
pub struct BatchReconciler {
    source_id_pattern: Regex,
    archive_id_pattern: Regex,
    identifier_column: String,
    collection_handle: String,
}

impl BatchReconciler {
    /// Create a reconciler from deployment configuration
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            source_id_pattern: config.redbox_handle_regex()?,
            archive_id_pattern: config.dspace_handle_regex()?,
            identifier_column: config.identifier_column.clone(),
            collection_handle: config.collection_handle.clone(),
        })
    }

    /// Recover the (ReDBox id, DSpace id) pair packed into an identifier cell
    ///
    /// Each `||`-separated value is tested against both prefix patterns; the
    /// first match per pattern wins and later matches are ignored without
    /// diagnostics, tolerating cells that pack two ids of the same scheme.
    pub fn packed_ids(&self, cell: &str) -> (Option<String>, Option<String>) {
        let mut source_id = None;
        let mut archive_id = None;
        for value in cell.split(VALUE_DELIMITER) {
            if source_id.is_none() && self.source_id_pattern.is_match(value) {
                source_id = Some(value.to_string());
            }
            if archive_id.is_none() && self.archive_id_pattern.is_match(value) {
                archive_id = Some(value.to_string());
            }
        }
        (source_id, archive_id)
    }

    /// Build the reconciliation index from the DSpace extract
    ///
    /// Rows without a recoverable ReDBox handle cannot be matched and are
    /// left out.
    pub fn build_index(&self, archive: &BmetExtract) -> ReconciliationIndex {
        let mut index = ReconciliationIndex::default();
        for row in archive.rows() {
            let cell = archive.cell(row, &self.identifier_column);
            let (source_id, archive_id) = self.packed_ids(cell);
            let Some(source_id) = source_id else {
                continue;
            };
            let item_id = archive.cell(row, ID_COLUMN);
            index
                .item_id_by_source
                .insert(source_id.clone(), item_id.to_string());
            if let Some(archive_id) = archive_id {
                index.archive_id_by_source.insert(source_id, archive_id);
            }
        }
        index
    }

    /// Split source ids into new and updated sets, for diagnostics only
    ///
    /// The split never gates processing; every source row is merged
    /// regardless.
    pub fn partition(&self, source: &BmetExtract, index: &ReconciliationIndex) -> BatchPartition {
        let mut partition = BatchPartition::default();
        for row in source.rows() {
            let cell = source.cell(row, &self.identifier_column);
            let (source_id, _) = self.packed_ids(cell);
            if let Some(source_id) = source_id {
                if index.item_id(&source_id).is_some() {
                    partition.update_ids.push(source_id);
                } else {
                    partition.new_ids.push(source_id);
                }
            }
        }
        debug!(
            "reconcile partition: {} new, {} update",
            partition.new_ids.len(),
            partition.update_ids.len()
        );
        partition
    }

    /// Merge the source extract against the DSpace export into batch CSV text
    ///
    /// Output header is `id`, `collection`, then the source columns in their
    /// original order; rows stay in source-file order (sorting happened when
    /// the extract was rendered).
    pub fn reconcile(&self, source: &BmetExtract, archive: &BmetExtract) -> Result<String> {
        let index = self.build_index(archive);
        debug!("reconciling against {} indexed archive rows", index.len());

        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .from_writer(Vec::new());

        let mut header = vec![ID_COLUMN.to_string(), COLLECTION_COLUMN.to_string()];
        header.extend(source.headers().iter().cloned());
        writer
            .write_record(&header)
            .map_err(|e| Error::csv("<batch>", "failed to write header", Some(e)))?;

        for row in source.rows() {
            let identifier_cell = source.cell(row, &self.identifier_column);
            let (source_id, _) = self.packed_ids(identifier_cell);

            // Update when DSpace already holds an item for this handle,
            // insert otherwise.
            let item_id = source_id
                .as_deref()
                .and_then(|id| index.item_id(id))
                .filter(|id| !id.is_empty());
            let archive_id = source_id.as_deref().and_then(|id| index.archive_id(id));

            let mut out = Vec::with_capacity(row.len() + 2);
            out.push(item_id.unwrap_or(INSERT_MARKER).to_string());
            out.push(self.collection_handle.clone());

            for (position, header) in source.headers().iter().enumerate() {
                let cell = row.get(position).map(String::as_str).unwrap_or("");
                out.push(self.merge_cell(header, cell, archive_id));
            }
            writer
                .write_record(&out)
                .map_err(|e| Error::csv("<batch>", "failed to write row", Some(e)))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| Error::csv("<batch>", e.to_string(), None))?;
        String::from_utf8(bytes).map_err(|e| Error::csv("<batch>", e.to_string(), None))
    }

    /// Copy a cell, appending the DSpace handle to the identifier column
    /// when DSpace has one the cell does not already pack
    ///
    /// A freshly created DSpace item gets its handle added by DSpace itself;
    /// an updated item needs the handle written back into the batch here.
    fn merge_cell(&self, header: &str, cell: &str, archive_id: Option<&str>) -> String {
        if header == self.identifier_column
            && let Some(archive_id) = archive_id
            && !cell.is_empty()
            && !cell.split(VALUE_DELIMITER).any(|value| value == archive_id)
        {
            return format!("{cell}{VALUE_DELIMITER}{archive_id}");
        }
        cell.to_string()
    }
}
