//! BMET CSV rendering of normalized dataset records
//!
//! Renders the fixed column schema as a header plus one row per record,
//! every field quoted, multi-valued cells joined with the `||` delimiter.
//! Records are sorted by handle first so repeated runs over unchanged
//! input diff cleanly.

use crate::app::models::{BMET_SCHEMA, ColumnArity, DatasetRecord, FieldValue, SchemaColumn};
use crate::constants::{MISSING_FIELD_SENTINEL, VALUE_DELIMITER};
use crate::{Error, Result};

/// Render records into BMET CSV text
pub fn render_bmet_csv(records: &[DatasetRecord]) -> Result<String> {
    render_with_schema(records, BMET_SCHEMA)
}

/// Render records against an explicit schema
pub fn render_with_schema(records: &[DatasetRecord], schema: &[SchemaColumn]) -> Result<String> {
    let mut sorted: Vec<&DatasetRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.handle().cmp(b.handle()));

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());

    writer
        .write_record(schema.iter().map(|column| column.label))
        .map_err(|e| Error::csv("<output>", "failed to write header", Some(e)))?;

    for record in sorted {
        let row: Vec<String> = schema
            .iter()
            .map(|column| render_cell(record, column))
            .collect();
        writer
            .write_record(&row)
            .map_err(|e| Error::csv("<output>", "failed to write row", Some(e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::csv("<output>", e.to_string(), None))?;
    String::from_utf8(bytes).map_err(|e| Error::csv("<output>", e.to_string(), None))
}

/// Render one cell according to the column's declared arity
///
/// An absent field is an empty cell. A field stored with the wrong arity is
/// a schema programming error; the sentinel keeps it visible in the batch
/// instead of aborting mid-run.
fn render_cell(record: &DatasetRecord, column: &SchemaColumn) -> String {
    match (column.arity, record.get(column.field)) {
        (ColumnArity::Single, Some(FieldValue::Single(value))) => value.clone(),
        (ColumnArity::Multi, Some(FieldValue::Multi(values))) => values.join(VALUE_DELIMITER),
        (_, None) => String::new(),
        _ => format!("{} {}", MISSING_FIELD_SENTINEL, column.field.name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::DatasetField;

    fn record(handle: &str, title: &str) -> DatasetRecord {
        let mut record = DatasetRecord::new(handle);
        record.set_single(DatasetField::Title, title);
        record.set_multi(DatasetField::IdentifierUris, vec![handle.to_string()]);
        record
    }

    fn parse_rows(csv_text: &str) -> (Vec<String>, Vec<Vec<String>>) {
        let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
        let headers = reader
            .headers()
            .unwrap()
            .iter()
            .map(str::to_string)
            .collect();
        let rows = reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect();
        (headers, rows)
    }

    #[test]
    fn test_header_follows_schema_order() {
        let csv_text = render_bmet_csv(&[]).unwrap();
        let (headers, rows) = parse_rows(&csv_text);

        let expected: Vec<String> = BMET_SCHEMA.iter().map(|c| c.label.to_string()).collect();
        assert_eq!(headers, expected);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_rows_sorted_by_handle() {
        let records = vec![
            record("http://hdl.handle.net/0000/9", "Last"),
            record("http://hdl.handle.net/0000/1", "First"),
            record("http://hdl.handle.net/0000/5", "Middle"),
        ];
        let csv_text = render_bmet_csv(&records).unwrap();
        let (_, rows) = parse_rows(&csv_text);

        let titles: Vec<&str> = rows.iter().map(|row| row[0].as_str()).collect();
        assert_eq!(titles, vec!["First", "Middle", "Last"]);

        // Sort invariant: identifier column is non-decreasing.
        let uris: Vec<&str> = rows.iter().map(|row| row[4].as_str()).collect();
        let mut sorted = uris.clone();
        sorted.sort();
        assert_eq!(uris, sorted);
    }

    #[test]
    fn test_multi_values_join_with_delimiter() {
        let mut r = record("http://hdl.handle.net/0000/1", "T");
        r.set_multi(
            DatasetField::Subjects,
            vec!["Biology".to_string(), "Physics".to_string()],
        );
        let csv_text = render_bmet_csv(&[r]).unwrap();
        let (headers, rows) = parse_rows(&csv_text);

        let subjects_idx = headers
            .iter()
            .position(|h| h == "dc.subject[en_US]")
            .unwrap();
        assert_eq!(rows[0][subjects_idx], "Biology||Physics");
    }

    #[test]
    fn test_absent_fields_render_empty() {
        let csv_text = render_bmet_csv(&[record("http://hdl.handle.net/0000/1", "T")]).unwrap();
        let (headers, rows) = parse_rows(&csv_text);

        let citation_idx = headers
            .iter()
            .position(|h| h == "dc.identifier.citation[en_US]")
            .unwrap();
        assert_eq!(rows[0][citation_idx], "");
    }

    #[test]
    fn test_arity_mismatch_emits_sentinel() {
        let mut r = record("http://hdl.handle.net/0000/1", "T");
        // Subjects declared multi in the schema, stored as scalar here.
        r.set_single(DatasetField::Subjects, "not a list");
        let csv_text = render_bmet_csv(&[r]).unwrap();

        assert!(csv_text.contains("MISSING-FIELD subjects"));
    }

    #[test]
    fn test_every_field_is_quoted() {
        let csv_text = render_bmet_csv(&[record("http://hdl.handle.net/0000/1", "T")]).unwrap();
        for line in csv_text.lines() {
            assert!(line.starts_with('"') && line.ends_with('"'), "{line}");
        }
    }

    #[test]
    fn test_round_trip_preserves_values() {
        let mut r = record("http://hdl.handle.net/0000/1", "A title, with comma");
        r.set_multi(
            DatasetField::Creators,
            vec!["Smith, Jo".to_string(), "Doe, Alex".to_string()],
        );
        let csv_text = render_bmet_csv(&[r]).unwrap();
        let (headers, rows) = parse_rows(&csv_text);

        let title_idx = headers.iter().position(|h| h == "dc.title[en_US]").unwrap();
        let creators_idx = headers
            .iter()
            .position(|h| h == "dc.creator[en_US]")
            .unwrap();
        assert_eq!(rows[0][title_idx], "A title, with comma");
        let creators: Vec<&str> = rows[0][creators_idx].split(VALUE_DELIMITER).collect();
        assert_eq!(creators, vec!["Smith, Jo", "Doe, Alex"]);
    }
}
