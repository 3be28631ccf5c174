//! Normalized record construction from ReDBox storage files
//!
//! One ReDBox record is described by two files: the `TF-OBJ-META` sidecar
//! (registry handle, DOI, bookkeeping) and the `.tfpackage` document (the
//! curated metadata proper). This module combines both into one
//! [`DatasetRecord`] ready for the BMET crosswalk.

use crate::app::models::{DatasetField, DatasetRecord, MetadataDocument, ObjectSidecar};
use crate::app::services::indexed_group::{collect_indexed, collect_single};
use crate::constants::{CITATION_PLACEHOLDER_PATTERN, doi_resolver_url, redbox_keys, sidecar_keys};
use crate::{Error, Result};
use regex::{NoExpand, Regex};
use std::path::Path;
use tracing::debug;

/// Scalar package keys and the record fields they populate
const SCALAR_FIELDS: &[(DatasetField, &str)] = &[
    (DatasetField::Title, redbox_keys::TITLE),
    (DatasetField::Type, redbox_keys::TYPE),
    (DatasetField::Created, redbox_keys::CREATED),
    (DatasetField::Description, redbox_keys::DESCRIPTION),
    (DatasetField::Language, redbox_keys::LANGUAGE),
];

/// Rights keys, emitted in this fixed order
const RIGHTS_KEYS: &[&str] = &[
    redbox_keys::ACCESS_RIGHTS,
    redbox_keys::RIGHTS_STATEMENT,
    redbox_keys::LICENCE,
];

/// Builds normalized dataset records from sidecar and package files
#[derive(Debug)]
pub struct RecordBuilder {
    citation_placeholder: Regex,
    grant_source_prefix: Regex,
}

impl RecordBuilder {
    /// Create a builder with its composition patterns compiled
    pub fn new() -> Result<Self> {
        let citation_placeholder = Regex::new(CITATION_PLACEHOLDER_PATTERN)
            .map_err(|e| Error::configuration(format!("invalid citation pattern: {e}")))?;
        // Grant labels arrive prefixed with their Mint data source,
        // e.g. "(MIS Projects) 12345 NHMRC Fellowship".
        let grant_source_prefix = Regex::new(r"^\([^)]*\) (.*)$")
            .map_err(|e| Error::configuration(format!("invalid grant pattern: {e}")))?;
        Ok(Self {
            citation_placeholder,
            grant_source_prefix,
        })
    }

    /// Build one record from its two storage files
    ///
    /// An empty path is a configuration fault, not a data condition: the
    /// error propagates to `main` and the run stops before anything
    /// downstream is attempted.
    pub fn build(&self, object_path: &Path, package_path: &Path) -> Result<DatasetRecord> {
        if object_path.as_os_str().is_empty() {
            return Err(Error::configuration("empty path to object sidecar file"));
        }
        if package_path.as_os_str().is_empty() {
            return Err(Error::configuration("empty path to package file"));
        }

        let sidecar = ObjectSidecar::from_file(object_path)?;
        let document = MetadataDocument::from_json_file(package_path)?;
        self.build_from_parts(&sidecar, &document)
    }

    /// Build one record from already-parsed sidecar and package data
    pub fn build_from_parts(
        &self,
        sidecar: &ObjectSidecar,
        document: &MetadataDocument,
    ) -> Result<DatasetRecord> {
        // The handle arrives backslash-escaped (e.g. "http\://...").
        let handle = sidecar
            .field_or_empty(sidecar_keys::HANDLE)
            .replace('\\', "");
        let doi = sidecar
            .field(sidecar_keys::DOI)
            .map(str::trim)
            .filter(|doi| !doi.is_empty())
            .map(str::to_string);
        debug!(handle = %handle, doi = ?doi, "building dataset record");

        let mut record = DatasetRecord::new(handle.clone());

        // Identifier URIs: handle first, DOI resolver URL second.
        let mut ident_uris = Vec::new();
        if !handle.is_empty() {
            ident_uris.push(handle);
        }
        if let Some(doi) = &doi {
            ident_uris.push(doi_resolver_url(doi));
        }
        record.set_multi(DatasetField::IdentifierUris, ident_uris);

        for (field, key) in SCALAR_FIELDS {
            if let Some(value) = document.get(key) {
                record.set_single(*field, value);
            }
        }

        if let Some(citation) = document.get(redbox_keys::CITATION) {
            record.set_single(
                DatasetField::Citation,
                self.resolve_citation(citation, doi.as_deref()),
            );
        }

        record.set_multi(
            DatasetField::Creators,
            collect_indexed(
                document,
                &[redbox_keys::CREATOR_FAMILY, redbox_keys::CREATOR_GIVEN],
                compose_person_name,
            )?,
        );

        let rights = RIGHTS_KEYS
            .iter()
            .map(|key| document.value(key).trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .collect();
        record.set_multi(DatasetField::Rights, rights);

        record.set_multi(
            DatasetField::Funders,
            collect_single(document, redbox_keys::FUNDER)?,
        );

        record.set_multi(
            DatasetField::GrantNumbers,
            collect_indexed(
                document,
                &[redbox_keys::GRANT_NUMBER, redbox_keys::GRANT_LABEL],
                |at_index| self.compose_grant(&at_index[0], &at_index[1]),
            )?,
        );

        // Subjects are FOR codes, then SEO codes, then free-text keywords.
        let mut subjects = collect_single(document, redbox_keys::SUBJECT_FOR)?;
        subjects.extend(collect_single(document, redbox_keys::SUBJECT_SEO)?);
        subjects.extend(collect_single(document, redbox_keys::KEYWORD)?);
        record.set_multi(DatasetField::Subjects, subjects);

        Ok(record)
    }

    /// Resolve the citation template's identifier placeholder
    ///
    /// With a DOI the placeholder becomes the resolver URL with one leading
    /// space; without, placeholder and its preceding spaces disappear.
    fn resolve_citation(&self, template: &str, doi: Option<&str>) -> String {
        let replacement = match doi {
            Some(doi) => format!(" {}", doi_resolver_url(doi)),
            None => String::new(),
        };
        self.citation_placeholder
            .replace_all(template, NoExpand(&replacement))
            .into_owned()
    }

    /// Compose a grant entry from its number and display label
    ///
    /// The label's leading "(data source) " prefix is stripped. Whichever
    /// halves are non-empty decide the shape: `"number: label"`, bare
    /// number, or bare label.
    fn compose_grant(&self, number: &str, label: &str) -> Option<String> {
        if number.is_empty() && label.is_empty() {
            return None;
        }
        let label = match self.grant_source_prefix.captures(label) {
            Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(label),
            None => label,
        };
        Some(if !number.is_empty() && !label.is_empty() {
            format!("{number}: {label}")
        } else if !number.is_empty() {
            number.to_string()
        } else {
            label.to_string()
        })
    }
}

/// Compose a creator name from a (family, given) pair
///
/// Names come from the People tab rather than the citation because curated
/// person records are less typo-prone and exist even when no citation does.
fn compose_person_name(at_index: &[String]) -> Option<String> {
    let (family, given) = (&at_index[0], &at_index[1]);
    if family.is_empty() && given.is_empty() {
        return None;
    }
    Some(if !family.is_empty() && !given.is_empty() {
        format!("{family}, {given}")
    } else if !family.is_empty() {
        family.clone()
    } else {
        given.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> RecordBuilder {
        RecordBuilder::new().unwrap()
    }

    fn document(pairs: &[(&str, &str)]) -> MetadataDocument {
        MetadataDocument::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn test_handle_only_identifiers() {
        // Sidecar handle with no DOI: one identifier URI, nothing else.
        let sidecar = ObjectSidecar::parse("handle=http\\://hdl.handle.net/0000/1");
        let record = builder()
            .build_from_parts(&sidecar, &document(&[]))
            .unwrap();

        assert_eq!(record.handle(), "http://hdl.handle.net/0000/1");
        assert_eq!(
            record.multi(DatasetField::IdentifierUris),
            Some(&["http://hdl.handle.net/0000/1".to_string()][..])
        );
    }

    #[test]
    fn test_doi_appends_resolver_url() {
        let sidecar =
            ObjectSidecar::parse("handle=http\\://hdl.handle.net/0000/1\nandsDoi=10.4226/86/5");
        let record = builder()
            .build_from_parts(&sidecar, &document(&[]))
            .unwrap();

        assert_eq!(
            record.multi(DatasetField::IdentifierUris),
            Some(
                &[
                    "http://hdl.handle.net/0000/1".to_string(),
                    "http://dx.doi.org/10.4226/86/5".to_string(),
                ][..]
            )
        );
    }

    #[test]
    fn test_citation_placeholder_without_doi() {
        let sidecar = ObjectSidecar::parse("handle=http\\://hdl.handle.net/0000/1");
        let doc = document(&[(
            "dc:biblioGraphicCitation.skos:prefLabel",
            "Smith (2017). Data. {ID_WILL_BE_HERE}",
        )]);
        let record = builder().build_from_parts(&sidecar, &doc).unwrap();

        // Placeholder and its leading space both vanish.
        assert_eq!(
            record.single(DatasetField::Citation),
            Some("Smith (2017). Data.")
        );
    }

    #[test]
    fn test_citation_placeholder_with_doi() {
        let sidecar =
            ObjectSidecar::parse("handle=http\\://hdl.handle.net/0000/1\nandsDoi=10.1/abc");
        let doc = document(&[(
            "dc:biblioGraphicCitation.skos:prefLabel",
            "Smith (2017). Data. {ID_WILL_BE_HERE}",
        )]);
        let record = builder().build_from_parts(&sidecar, &doc).unwrap();

        assert_eq!(
            record.single(DatasetField::Citation),
            Some("Smith (2017). Data. http://dx.doi.org/10.1/abc")
        );
    }

    #[test]
    fn test_scalar_fields_copied() {
        let sidecar = ObjectSidecar::parse("handle=http\\://hdl.handle.net/0000/1");
        let doc = document(&[
            ("dc:title", "Reef survey"),
            ("dc:type.rdf:PlainLiteral", "dataset"),
            ("dc:created", "2016-02-01"),
            ("dc:language.skos:prefLabel", "English"),
            ("dc:description", "Sites and counts"),
        ]);
        let record = builder().build_from_parts(&sidecar, &doc).unwrap();

        assert_eq!(record.single(DatasetField::Title), Some("Reef survey"));
        assert_eq!(record.single(DatasetField::Type), Some("dataset"));
        assert_eq!(record.single(DatasetField::Created), Some("2016-02-01"));
        assert_eq!(record.single(DatasetField::Language), Some("English"));
        assert_eq!(
            record.single(DatasetField::Description),
            Some("Sites and counts")
        );
    }

    #[test]
    fn test_creators_skip_empty_pairs() {
        let sidecar = ObjectSidecar::parse("handle=http\\://hdl.handle.net/0000/1");
        let doc = document(&[
            ("dc:creator.foaf:Person.1.foaf:familyName", "Smith"),
            ("dc:creator.foaf:Person.1.foaf:givenName", "Jo"),
            ("dc:creator.foaf:Person.2.foaf:familyName", ""),
            ("dc:creator.foaf:Person.2.foaf:givenName", ""),
            ("dc:creator.foaf:Person.3.foaf:givenName", "Alex"),
        ]);
        let record = builder().build_from_parts(&sidecar, &doc).unwrap();

        assert_eq!(
            record.multi(DatasetField::Creators),
            Some(&["Smith, Jo".to_string(), "Alex".to_string()][..])
        );
    }

    #[test]
    fn test_rights_fixed_order() {
        let sidecar = ObjectSidecar::parse("handle=http\\://hdl.handle.net/0000/1");
        let doc = document(&[
            ("dc:license.skos:prefLabel", "CC-BY 4.0"),
            ("dc:accessRights.skos:prefLabel", "Open"),
        ]);
        let record = builder().build_from_parts(&sidecar, &doc).unwrap();

        // Access rights before licence, statement absent.
        assert_eq!(
            record.multi(DatasetField::Rights),
            Some(&["Open".to_string(), "CC-BY 4.0".to_string()][..])
        );
    }

    #[test]
    fn test_grant_composition_strips_source_prefix() {
        let sidecar = ObjectSidecar::parse("handle=http\\://hdl.handle.net/0000/1");
        let doc = document(&[
            ("foaf:fundedBy.vivo:Grant.1.redbox:grantNumber", "GN99"),
            (
                "foaf:fundedBy.vivo:Grant.1.skos:prefLabel",
                "(MIS Projects) 12345 NHMRC Fellowship",
            ),
            ("foaf:fundedBy.vivo:Grant.2.redbox:grantNumber", "GN100"),
            ("foaf:fundedBy.vivo:Grant.3.skos:prefLabel", "Bare label"),
        ]);
        let record = builder().build_from_parts(&sidecar, &doc).unwrap();

        assert_eq!(
            record.multi(DatasetField::GrantNumbers),
            Some(
                &[
                    "GN99: 12345 NHMRC Fellowship".to_string(),
                    "GN100".to_string(),
                    "Bare label".to_string(),
                ][..]
            )
        );
    }

    #[test]
    fn test_subjects_concatenate_three_groups() {
        let sidecar = ObjectSidecar::parse("handle=http\\://hdl.handle.net/0000/1");
        let doc = document(&[
            ("dc:subject.anzsrc:for.1.skos:prefLabel", "0602 Ecology"),
            ("dc:subject.anzsrc:seo.1.skos:prefLabel", "9608 Flora"),
            ("dc:subject.vivo:keyword.1.rdf:PlainLiteral", "reef"),
            ("dc:subject.vivo:keyword.2.rdf:PlainLiteral", "coral"),
        ]);
        let record = builder().build_from_parts(&sidecar, &doc).unwrap();

        assert_eq!(
            record.multi(DatasetField::Subjects),
            Some(
                &[
                    "0602 Ecology".to_string(),
                    "9608 Flora".to_string(),
                    "reef".to_string(),
                    "coral".to_string(),
                ][..]
            )
        );
    }

    #[test]
    fn test_empty_paths_are_fatal() {
        let result = builder().build(Path::new(""), Path::new("/tmp/pkg.tfpackage"));
        assert!(matches!(result, Err(Error::Configuration { .. })));

        let result = builder().build(Path::new("/tmp/TF-OBJ-META"), Path::new(""));
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }
}
