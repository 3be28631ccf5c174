//! Record discovery in the ReDBox storage tree
//!
//! Walks the storage root looking for `TF-OBJ-META` object files and keeps
//! only the records that are datasets, have a published handle, and carry
//! the target keyword in a Notes field. The predicate chain is a filter,
//! not validation: records failing any predicate are skipped without
//! diagnostics, because incomplete hand-curated metadata is normal.

use crate::app::models::{MetadataDocument, ObjectSidecar};
use crate::app::services::indexed_group::collect_single;
use crate::constants::{DATASET_CONFIG_PID, OBJECT_MARKER_FILENAME, redbox_keys, sidecar_keys};
use crate::{Error, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// The two files describing one selected record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPaths {
    /// `TF-OBJ-META` object sidecar
    pub object: PathBuf,
    /// `.tfpackage` metadata document, sibling of the sidecar
    pub package: PathBuf,
}

/// Discovers transfer-marked dataset records under a storage root
#[derive(Debug)]
pub struct RecordDiscovery {
    storage_root: PathBuf,
    note_keyword: Regex,
}

impl RecordDiscovery {
    /// Create a discovery walker for a storage root and note keyword
    pub fn new(storage_root: PathBuf, keyword: &str) -> Result<Self> {
        // Whole-word, case-insensitive: "DSpace" and "-> dspace!" match,
        // "dspaces" does not.
        let pattern = format!("(?i)(^|[^a-z]){}($|[^a-z])", regex::escape(keyword));
        let note_keyword = Regex::new(&pattern)
            .map_err(|e| Error::configuration(format!("invalid note keyword '{keyword}': {e}")))?;
        Ok(Self {
            storage_root,
            note_keyword,
        })
    }

    /// Walk the storage tree and return the object/package path pairs of
    /// every record passing all selection predicates
    pub fn discover(&self) -> Result<Vec<RecordPaths>> {
        if !self.storage_root.exists() {
            return Err(Error::file_not_found(self.storage_root.display().to_string()));
        }

        let mut selected = Vec::new();
        let mut candidates = 0usize;

        for entry in WalkDir::new(&self.storage_root) {
            let entry = entry?;
            if !entry.file_type().is_file() || entry.file_name() != OBJECT_MARKER_FILENAME {
                continue;
            }
            candidates += 1;

            let object = entry.into_path();
            let sidecar = ObjectSidecar::from_file(&object)?;

            let is_dataset =
                sidecar.field(sidecar_keys::CONFIG_PID) == Some(DATASET_CONFIG_PID);
            let has_handle = sidecar
                .field_or_empty(sidecar_keys::HANDLE)
                .starts_with("http");
            if !is_dataset || !has_handle {
                continue;
            }

            if let Some(package) = self.marked_package(&object, &sidecar)? {
                selected.push(RecordPaths { object, package });
            }
        }

        debug!(
            "discovery: {} of {} candidate objects selected under {}",
            selected.len(),
            candidates,
            self.storage_root.display()
        );
        Ok(selected)
    }

    /// Locate the sibling package file and keep it only when one of its
    /// Notes fields mentions the target keyword
    fn marked_package(
        &self,
        object: &Path,
        sidecar: &ObjectSidecar,
    ) -> Result<Option<PathBuf>> {
        let Some(package_field) = sidecar.field(sidecar_keys::PACKAGE_PATH) else {
            return Ok(None);
        };
        let Some(file_name) = Path::new(package_field).file_name() else {
            return Ok(None);
        };
        let package = object
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(file_name);
        if !package.exists() {
            return Ok(None);
        }

        let document = MetadataDocument::from_json_file(&package)?;
        let notes = collect_single(&document, redbox_keys::NOTE)?;
        let marked = notes.iter().any(|note| self.note_keyword.is_match(note));
        Ok(marked.then_some(package))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Write one record directory with an object sidecar and package file
    fn write_record(root: &Path, name: &str, sidecar: &str, package: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(OBJECT_MARKER_FILENAME), sidecar).unwrap();
        fs::write(dir.join("pkg.tfpackage"), package).unwrap();
    }

    fn dataset_sidecar(handle: &str) -> String {
        format!(
            "jsonConfigPid=dataset.json\nhandle={handle}\nfile.path=/orig/path/pkg.tfpackage\n"
        )
    }

    const MARKED_PACKAGE: &str =
        r#"{"dc:title": "T", "skos:note.1.dc:description": "Load into DSpace please"}"#;
    const UNMARKED_PACKAGE: &str =
        r#"{"dc:title": "T", "skos:note.1.dc:description": "internal only"}"#;

    #[test]
    fn test_discover_selects_marked_datasets() {
        let temp = TempDir::new().unwrap();
        write_record(
            temp.path(),
            "a",
            &dataset_sidecar("http\\://hdl.handle.net/0000/1"),
            MARKED_PACKAGE,
        );
        write_record(
            temp.path(),
            "b",
            &dataset_sidecar("http\\://hdl.handle.net/0000/2"),
            UNMARKED_PACKAGE,
        );

        let discovery =
            RecordDiscovery::new(temp.path().to_path_buf(), "dspace").unwrap();
        let found = discovery.discover().unwrap();

        assert_eq!(found.len(), 1);
        assert!(found[0].object.ends_with("a/TF-OBJ-META"));
        assert!(found[0].package.ends_with("a/pkg.tfpackage"));
    }

    #[test]
    fn test_discover_skips_non_datasets() {
        let temp = TempDir::new().unwrap();
        write_record(
            temp.path(),
            "dmp",
            "jsonConfigPid=dmpt.json\nhandle=http\\://hdl.handle.net/0000/3\nfile.path=/p/pkg.tfpackage\n",
            MARKED_PACKAGE,
        );

        let discovery =
            RecordDiscovery::new(temp.path().to_path_buf(), "dspace").unwrap();
        assert!(discovery.discover().unwrap().is_empty());
    }

    #[test]
    fn test_discover_skips_unassigned_handles() {
        let temp = TempDir::new().unwrap();
        // No URL scheme yet: curation has not assigned a handle.
        write_record(
            temp.path(),
            "draft",
            "jsonConfigPid=dataset.json\nhandle=\nfile.path=/p/pkg.tfpackage\n",
            MARKED_PACKAGE,
        );

        let discovery =
            RecordDiscovery::new(temp.path().to_path_buf(), "dspace").unwrap();
        assert!(discovery.discover().unwrap().is_empty());
    }

    #[test]
    fn test_keyword_match_is_whole_word_case_insensitive() {
        let temp = TempDir::new().unwrap();
        write_record(
            temp.path(),
            "upper",
            &dataset_sidecar("http\\://hdl.handle.net/0000/4"),
            r#"{"skos:note.1.dc:description": "Copy to DSPACE."}"#,
        );
        write_record(
            temp.path(),
            "substring",
            &dataset_sidecar("http\\://hdl.handle.net/0000/5"),
            r#"{"skos:note.1.dc:description": "many dspaces here"}"#,
        );

        let discovery =
            RecordDiscovery::new(temp.path().to_path_buf(), "dspace").unwrap();
        let found = discovery.discover().unwrap();

        assert_eq!(found.len(), 1);
        assert!(found[0].object.ends_with("upper/TF-OBJ-META"));
    }

    #[test]
    fn test_keyword_found_in_later_note() {
        let temp = TempDir::new().unwrap();
        write_record(
            temp.path(),
            "later",
            &dataset_sidecar("http\\://hdl.handle.net/0000/6"),
            r#"{"skos:note.1.dc:description": "first note", "skos:note.3.dc:description": "then dspace"}"#,
        );

        let discovery =
            RecordDiscovery::new(temp.path().to_path_buf(), "dspace").unwrap();
        assert_eq!(discovery.discover().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_package_reference_is_skipped() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("no-pkg");
        fs::create_dir_all(&dir).unwrap();
        // Sidecar passes both predicates but names no package file.
        fs::write(
            dir.join(OBJECT_MARKER_FILENAME),
            "jsonConfigPid=dataset.json\nhandle=http\\://hdl.handle.net/0000/7\n",
        )
        .unwrap();

        let discovery =
            RecordDiscovery::new(temp.path().to_path_buf(), "dspace").unwrap();
        assert!(discovery.discover().unwrap().is_empty());
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let discovery =
            RecordDiscovery::new(PathBuf::from("/nonexistent/storage"), "dspace").unwrap();
        assert!(matches!(
            discovery.discover(),
            Err(Error::FileNotFound { .. })
        ));
    }
}
