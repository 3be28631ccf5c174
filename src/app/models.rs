//! Domain models for the ReDBox/DSpace bridge
//!
//! The ReDBox package document is a flat string-to-string mapping whose keys
//! encode repeated groups positionally (`prefix.N.suffix`). The models here
//! keep that document read-only and typed, pair it with the `key=value`
//! object sidecar, and define the normalized dataset record plus the fixed
//! BMET output schema.

use crate::{Error, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// One record's exported package metadata: an immutable flat mapping from
/// string key to string value
///
/// Parsed from a JSON-compatible file which may contain literal newlines
/// inside quoted string values; those are folded to spaces rather than
/// rejected, since ReDBox writes description fields verbatim.
#[derive(Debug, Clone, Default)]
pub struct MetadataDocument {
    fields: BTreeMap<String, String>,
}

impl MetadataDocument {
    /// Parse a package document from a file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::io(format!("failed to read package file {}", path.display()), e)
        })?;
        Self::parse(&raw, &path.display().to_string())
    }

    /// Parse a package document from a string
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Self::parse(raw, "<string>")
    }

    fn parse(raw: &str, origin: &str) -> Result<Self> {
        let sanitized = fold_control_chars_in_strings(raw);
        let value: serde_json::Value = serde_json::from_str(&sanitized)
            .map_err(|e| Error::document_format(origin, e.to_string()))?;

        let object = value
            .as_object()
            .ok_or_else(|| Error::document_format(origin, "top level is not an object"))?;

        let mut fields = BTreeMap::new();
        for (key, value) in object {
            // Scalars become strings; nested arrays/objects carry no flat
            // keys and are skipped, so lookups against them simply miss.
            match value {
                serde_json::Value::String(s) => {
                    fields.insert(key.clone(), s.clone());
                }
                serde_json::Value::Number(n) => {
                    fields.insert(key.clone(), n.to_string());
                }
                serde_json::Value::Bool(b) => {
                    fields.insert(key.clone(), b.to_string());
                }
                _ => {}
            }
        }
        Ok(Self { fields })
    }

    /// Build a document directly from key/value pairs
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value for a key, or `None` when absent
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Value for a key, treating absence as the empty string
    pub fn value(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    /// All keys in the document
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of flat fields in the document
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the document holds no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Replace literal control characters inside JSON string values with spaces
///
/// ReDBox package files are JSON except that multi-line text fields contain
/// raw newlines, which a conforming parser must reject. Folding them to
/// spaces matches how the records were historically consumed.
fn fold_control_chars_in_strings(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in raw.chars() {
        if in_string {
            if escaped {
                escaped = false;
                out.push(c);
                continue;
            }
            match c {
                '\\' => {
                    escaped = true;
                    out.push(c);
                }
                '"' => {
                    in_string = false;
                    out.push(c);
                }
                '\n' | '\r' | '\t' => out.push(' '),
                _ => out.push(c),
            }
        } else {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
        }
    }
    out
}

/// The single-line `key=value` object sidecar stored next to each package
/// file (`TF-OBJ-META`)
#[derive(Debug, Clone, Default)]
pub struct ObjectSidecar {
    lines: Vec<String>,
}

impl ObjectSidecar {
    /// Read and split a sidecar file into lines
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::io(format!("failed to read sidecar file {}", path.display()), e)
        })?;
        Ok(Self::parse(&raw))
    }

    /// Split raw sidecar text into lines
    pub fn parse(raw: &str) -> Self {
        Self {
            lines: raw.lines().map(str::to_string).collect(),
        }
    }

    /// Look up a field by exact key; the first matching line wins
    ///
    /// Absence is normal for hand-curated metadata and yields `None`, never
    /// an error.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.lines
            .iter()
            .find_map(|line| line.strip_prefix(name).and_then(|rest| rest.strip_prefix('=')))
    }

    /// Look up a field, treating absence as the empty string
    pub fn field_or_empty(&self, name: &str) -> &str {
        self.field(name).unwrap_or("")
    }
}

/// Fixed field names of a normalized dataset record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetField {
    Title,
    Type,
    Created,
    Creators,
    IdentifierUris,
    Citation,
    Rights,
    Funders,
    GrantNumbers,
    Subjects,
    Language,
    Description,
}

impl DatasetField {
    /// Stable name used in diagnostics and the render sentinel
    pub fn name(&self) -> &'static str {
        match self {
            Self::Title => "dc_title",
            Self::Type => "dc_type",
            Self::Created => "dc_created",
            Self::Creators => "dc_creators",
            Self::IdentifierUris => "ident_uris",
            Self::Citation => "citation",
            Self::Rights => "dc_rights",
            Self::Funders => "funders",
            Self::GrantNumbers => "grant_numbers",
            Self::Subjects => "subjects",
            Self::Language => "dc_language",
            Self::Description => "dc_description",
        }
    }
}

/// A field value is either one string or an ordered sequence of strings;
/// the schema declares which arity each output column expects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Single(String),
    Multi(Vec<String>),
}

/// One normalized dataset record, built once per source record and immutable
/// thereafter
#[derive(Debug, Clone, Default)]
pub struct DatasetRecord {
    handle: String,
    fields: HashMap<DatasetField, FieldValue>,
}

impl DatasetRecord {
    /// Create an empty record keyed by its registry handle
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            fields: HashMap::new(),
        }
    }

    /// Registry-assigned handle, used as the deterministic sort key
    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Store a scalar field
    pub fn set_single(&mut self, field: DatasetField, value: impl Into<String>) {
        self.fields.insert(field, FieldValue::Single(value.into()));
    }

    /// Store a sequence field
    pub fn set_multi(&mut self, field: DatasetField, values: Vec<String>) {
        self.fields.insert(field, FieldValue::Multi(values));
    }

    /// Raw field value, if set
    pub fn get(&self, field: DatasetField) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    /// Scalar field value, if set with scalar arity
    pub fn single(&self, field: DatasetField) -> Option<&str> {
        match self.fields.get(&field) {
            Some(FieldValue::Single(v)) => Some(v),
            _ => None,
        }
    }

    /// Sequence field value, if set with sequence arity
    pub fn multi(&self, field: DatasetField) -> Option<&[String]> {
        match self.fields.get(&field) {
            Some(FieldValue::Multi(v)) => Some(v),
            _ => None,
        }
    }
}

/// Declared arity of an output column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnArity {
    Single,
    Multi,
}

/// One output column: arity, source field, and CSV column label
#[derive(Debug, Clone, Copy)]
pub struct SchemaColumn {
    pub arity: ColumnArity,
    pub field: DatasetField,
    pub label: &'static str,
}

impl SchemaColumn {
    const fn single(field: DatasetField, label: &'static str) -> Self {
        Self {
            arity: ColumnArity::Single,
            field,
            label,
        }
    }

    const fn multi(field: DatasetField, label: &'static str) -> Self {
        Self {
            arity: ColumnArity::Multi,
            field,
            label,
        }
    }
}

/// The BMET output schema. Column order here is the output column order.
pub const BMET_SCHEMA: &[SchemaColumn] = &[
    SchemaColumn::single(DatasetField::Title, "dc.title[en_US]"),
    SchemaColumn::single(DatasetField::Type, "dc.type[en_US]"),
    SchemaColumn::single(DatasetField::Created, "dc.date"),
    SchemaColumn::multi(DatasetField::Creators, "dc.creator[en_US]"),
    SchemaColumn::multi(DatasetField::IdentifierUris, "dc.identifier.uri"),
    SchemaColumn::single(DatasetField::Citation, "dc.identifier.citation[en_US]"),
    SchemaColumn::multi(DatasetField::Rights, "dc.rights[en_US]"),
    SchemaColumn::multi(DatasetField::Funders, "dc.description.sponsorship[en_US]"),
    SchemaColumn::multi(DatasetField::GrantNumbers, "dc.relation.grantnumber[en_US]"),
    SchemaColumn::multi(DatasetField::Subjects, "dc.subject[en_US]"),
    SchemaColumn::single(DatasetField::Language, "dc.language[en_US]"),
    SchemaColumn::single(DatasetField::Description, "dc.description[en_US]"),
];
