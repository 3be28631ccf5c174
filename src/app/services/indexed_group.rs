//! Indexed-group extraction from flat metadata keys
//!
//! ReDBox encodes array-of-struct data as flat keys with embedded 1-based
//! integer positions, e.g. `dc:subject.anzsrc:for.1.skos:prefLabel`,
//! `dc:subject.anzsrc:for.3.skos:prefLabel`. This module reconstructs the
//! ordered, possibly-sparse sequences behind those keys with one generic
//! routine: find the maximum index present, then iterate 1..=max and compose
//! a value per index via a pluggable combinator. Every repeated-group field
//! (creators, funders, grants, subject codes, keywords, notes) goes through
//! this routine rather than reimplementing the scan.

use crate::app::models::MetadataDocument;
use crate::{Error, Result};
use regex::Regex;

/// Placeholder token marking the index position in a key template
pub const INDEX_TOKEN: &str = "{}";

/// Build a regex for a key template, with the index placeholder turned into
/// an integer capture group
pub fn index_pattern(template: &str) -> Result<Regex> {
    let escaped = regex::escape(template);
    let token = regex::escape(INDEX_TOKEN);
    let pattern = format!("^{}$", escaped.replacen(&token, r"(\d+)", 1));
    Regex::new(&pattern)
        .map_err(|e| Error::configuration(format!("invalid key template '{template}': {e}")))
}

/// Substitute a concrete index into a key template
pub fn key_at(template: &str, index: usize) -> String {
    template.replacen(INDEX_TOKEN, &index.to_string(), 1)
}

/// Highest index captured by `pattern` over all keys in the document, or 0
/// when no key matches
///
/// The pattern must carry exactly one integer-capturing group.
pub fn max_index(document: &MetadataDocument, pattern: &Regex) -> usize {
    document
        .keys()
        .filter_map(|key| {
            pattern
                .captures(key)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<usize>().ok())
        })
        .max()
        .unwrap_or(0)
}

/// Collect composed values for a group of sibling key templates
///
/// Scans 1..=max (max taken across all templates), hands the trimmed value
/// of each template at that index to `compose`, and keeps whatever it
/// returns. Absent keys read as empty strings; indices where `compose`
/// returns `None` contribute nothing, so sparse input yields dense output
/// in ascending index order.
pub fn collect_indexed<F>(
    document: &MetadataDocument,
    templates: &[&str],
    compose: F,
) -> Result<Vec<String>>
where
    F: Fn(&[String]) -> Option<String>,
{
    let mut highest = 0;
    for template in templates {
        let pattern = index_pattern(template)?;
        highest = highest.max(max_index(document, &pattern));
    }

    let mut values = Vec::new();
    for index in 1..=highest {
        let at_index: Vec<String> = templates
            .iter()
            .map(|template| document.value(&key_at(template, index)).trim().to_string())
            .collect();
        if let Some(value) = compose(&at_index) {
            values.push(value);
        }
    }
    Ok(values)
}

/// Collect the non-empty trimmed values of a single-template group
pub fn collect_single(document: &MetadataDocument, template: &str) -> Result<Vec<String>> {
    collect_indexed(document, &[template], |at_index| {
        let value = &at_index[0];
        (!value.is_empty()).then(|| value.clone())
    })
}
