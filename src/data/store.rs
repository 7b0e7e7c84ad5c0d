//! File-backed document store.
//!
//! Indexes every file below a root directory by its file name so documents
//! can be requested by name regardless of how the export is nested.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::tree::{parse_document, DecodeError, Node};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document '{0}' not found in data directory")]
    Missing(String),
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode '{name}': {source}")]
    Decode {
        name: String,
        #[source]
        source: DecodeError,
    },
}

/// Name-indexed view of a data directory
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
    documents: HashMap<String, PathBuf>,
}

impl DocumentStore {
    /// Index every file under `root`
    pub fn open(root: &Path) -> Result<Self, DocumentError> {
        let mut documents = HashMap::new();
        Self::index_recursive(root, &mut documents)?;
        info!("Indexed {} documents under {:?}", documents.len(), root);

        Ok(Self {
            root: root.to_path_buf(),
            documents,
        })
    }

    /// Recursively collect file paths (non-async to avoid boxing)
    fn index_recursive(
        dir: &Path,
        documents: &mut HashMap<String, PathBuf>,
    ) -> Result<(), DocumentError> {
        let io_err = |source| DocumentError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut entries = std::fs::read_dir(dir)
            .map_err(io_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(io_err)?;
        entries.sort_by_key(|e| e.path());

        for entry in entries {
            let path = entry.path();
            if path.is_dir() {
                Self::index_recursive(&path, documents)?;
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some(previous) = documents.get(name) {
                warn!("Document '{}' found at {:?} and {:?}, keeping the first", name, previous, path);
                continue;
            }
            debug!("Indexed document {:?}", path);
            documents.insert(name.to_string(), path);
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn contains(&self, name: &str) -> bool {
        self.documents.contains_key(name)
    }

    pub fn path(&self, name: &str) -> Option<&Path> {
        self.documents.get(name).map(PathBuf::as_path)
    }

    /// Read and decode a document by file name
    pub fn read(&self, name: &str) -> Result<Node, DocumentError> {
        let path = self
            .path(name)
            .ok_or_else(|| DocumentError::Missing(name.to_string()))?;
        let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse_document(&content).map_err(|source| DocumentError::Decode {
            name: name.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_nested_documents_are_indexed_by_name() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("Quest.wz");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            nested.join("Act.img.xml"),
            r#"<imgdir name="Act.img"><imgdir name="1000"/></imgdir>"#,
        )
        .unwrap();

        let store = DocumentStore::open(dir.path()).unwrap();
        assert!(store.contains("Act.img.xml"));
        let root = store.read("Act.img.xml").unwrap();
        assert_eq!(root.name(), "Act.img");
        assert!(root.child_by_name("1000").is_ok());
    }

    #[test]
    fn test_missing_and_malformed_documents() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Check.img.xml"), "<imgdir name=\"x\">").unwrap();

        let store = DocumentStore::open(dir.path()).unwrap();
        assert!(matches!(store.read("QuestInfo.img.xml"), Err(DocumentError::Missing(_))));
        assert!(matches!(store.read("Check.img.xml"), Err(DocumentError::Decode { .. })));
    }

    #[test]
    fn test_missing_root_directory() {
        let dir = TempDir::new().unwrap();
        let result = DocumentStore::open(&dir.path().join("absent"));
        assert!(matches!(result, Err(DocumentError::Io { .. })));
    }
}
