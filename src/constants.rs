//! Application constants for the ReDBox/DSpace bridge
//!
//! This module contains the fixed filenames, delimiters, metadata key
//! templates and column names used throughout the bridge.

// =============================================================================
// ReDBox storage layout
// =============================================================================

/// Per-record object metadata filename inside ReDBox storage
pub const OBJECT_MARKER_FILENAME: &str = "TF-OBJ-META";

/// Value of `jsonConfigPid` identifying dataset records (as opposed to Data
/// Management Plans or self-submissions)
pub const DATASET_CONFIG_PID: &str = "dataset.json";

/// Sidecar keys looked up in the object metadata file
pub mod sidecar_keys {
    pub const HANDLE: &str = "handle";
    pub const DOI: &str = "andsDoi";
    pub const CONFIG_PID: &str = "jsonConfigPid";
    pub const PACKAGE_PATH: &str = "file.path";
}

/// Keyword searched for (case-insensitive, whole word) in the Notes tab to
/// mark a record for transfer
pub const DEFAULT_NOTE_KEYWORD: &str = "dspace";

// =============================================================================
// BMET CSV conventions
// =============================================================================

/// In a single CSV column, this delimiter separates multiple values
pub const VALUE_DELIMITER: &str = "||";

/// BMET row-key column name
pub const ID_COLUMN: &str = "id";

/// BMET target-collection column name
pub const COLLECTION_COLUMN: &str = "collection";

/// Row-key value instructing the BMET to create a new item
pub const INSERT_MARKER: &str = "+";

/// Default name of the multi-valued column carrying ReDBox and DSpace handles
pub const DEFAULT_IDENTIFIER_COLUMN: &str = "dc.identifier.uri";

/// Emitted in place of a cell whose schema declaration and record value
/// disagree; a misconfigured schema stays debuggable without aborting a batch
pub const MISSING_FIELD_SENTINEL: &str = "MISSING-FIELD";

// =============================================================================
// Identifier composition
// =============================================================================

/// DOI resolver used to turn a bare DOI into an identifier URI
pub const DOI_RESOLVER_PREFIX: &str = "http://dx.doi.org/";

/// Placeholder token in the bibliographic citation template, optionally
/// preceded by spaces which are stripped together with it
pub const CITATION_PLACEHOLDER_PATTERN: &str = r" *\{ID_WILL_BE_HERE\}";

/// Build a resolver URL for a DOI
pub fn doi_resolver_url(doi: &str) -> String {
    format!("{}{}", DOI_RESOLVER_PREFIX, doi)
}

// =============================================================================
// ReDBox metadata key templates
// =============================================================================

/// Flat package-document keys. Repeated groups are encoded positionally as
/// `prefix.N.suffix`; templates below carry a `{}` placeholder for N.
pub mod redbox_keys {
    // Singleton keys
    pub const TITLE: &str = "dc:title";
    pub const TYPE: &str = "dc:type.rdf:PlainLiteral";
    pub const CREATED: &str = "dc:created";
    pub const DESCRIPTION: &str = "dc:description";
    pub const LANGUAGE: &str = "dc:language.skos:prefLabel";
    pub const CITATION: &str = "dc:biblioGraphicCitation.skos:prefLabel";

    // Rights keys, emitted in this order
    pub const ACCESS_RIGHTS: &str = "dc:accessRights.skos:prefLabel";
    pub const RIGHTS_STATEMENT: &str = "dc:accessRights.dc:RightsStatement.skos:prefLabel";
    pub const LICENCE: &str = "dc:license.skos:prefLabel";

    // Indexed-group key templates
    pub const CREATOR_FAMILY: &str = "dc:creator.foaf:Person.{}.foaf:familyName";
    pub const CREATOR_GIVEN: &str = "dc:creator.foaf:Person.{}.foaf:givenName";
    pub const FUNDER: &str = "foaf:fundedBy.foaf:Agent.{}.skos:prefLabel";
    pub const GRANT_NUMBER: &str = "foaf:fundedBy.vivo:Grant.{}.redbox:grantNumber";
    pub const GRANT_LABEL: &str = "foaf:fundedBy.vivo:Grant.{}.skos:prefLabel";
    pub const SUBJECT_FOR: &str = "dc:subject.anzsrc:for.{}.skos:prefLabel";
    pub const SUBJECT_SEO: &str = "dc:subject.anzsrc:seo.{}.skos:prefLabel";
    pub const KEYWORD: &str = "dc:subject.vivo:keyword.{}.rdf:PlainLiteral";
    pub const NOTE: &str = "skos:note.{}.dc:description";
}
