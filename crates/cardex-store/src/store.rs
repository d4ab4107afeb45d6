//! Document stores: trait seam plus filesystem and in-memory backends

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::document::{Document, DocumentKind};
use crate::error::StoreError;
use crate::hash::{key_file_name, partition_dir_name};

/// Upsert-by-identity document store.
///
/// Identity is `(kind, partition_key, id)`. Upserting the same identity twice
/// leaves only the last body.
pub trait DocumentStore: Send + Sync {
    fn upsert(&self, doc: &Document) -> Result<(), StoreError>;

    fn get(
        &self,
        kind: DocumentKind,
        partition_key: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError>;
}

/// One JSON file per document.
///
/// Layout: `root/<kind>/<partition-hash>/<id-hash>.json`. Writes go to a
/// unique tmp file in the target directory and are renamed into place.
#[derive(Debug)]
pub struct FsStore {
    root: PathBuf,
    tmp_seq: AtomicU64,
}

impl FsStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;
        Ok(Self {
            root,
            tmp_seq: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a document with this identity is stored at
    pub fn path_for(&self, kind: DocumentKind, partition_key: &str, id: &str) -> PathBuf {
        self.root
            .join(kind.dir_name())
            .join(partition_dir_name(partition_key))
            .join(format!("{}.json", key_file_name(id)))
    }

    /// Number of stored documents of `kind`.
    pub fn count(&self, kind: DocumentKind) -> Result<usize, StoreError> {
        let kind_dir = self.root.join(kind.dir_name());
        let partitions = match fs::read_dir(&kind_dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(StoreError::io(&kind_dir, e)),
        };
        let mut total = 0;
        for entry in partitions {
            let entry = entry.map_err(|e| StoreError::io(&kind_dir, e))?;
            let dir = entry.path();
            if !dir.is_dir() {
                continue;
            }
            for file in fs::read_dir(&dir).map_err(|e| StoreError::io(&dir, e))? {
                let file = file.map_err(|e| StoreError::io(&dir, e))?;
                if file.path().extension().is_some_and(|ext| ext == "json") {
                    total += 1;
                }
            }
        }
        Ok(total)
    }
}

impl DocumentStore for FsStore {
    fn upsert(&self, doc: &Document) -> Result<(), StoreError> {
        let path = self.path_for(doc.kind, &doc.partition_key, &doc.id);
        let Some(dir) = path.parent() else {
            return Err(StoreError::Rejected {
                id: doc.id.clone(),
                message: "document path has no parent".into(),
            });
        };
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

        let bytes = serde_json::to_vec(doc).map_err(|e| StoreError::Serialize {
            id: doc.id.clone(),
            source: e,
        })?;

        // Concurrent writers of the same identity must not share a tmp file
        let seq = self.tmp_seq.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("json.{seq}.tmp"));
        fs::write(&tmp, &bytes).map_err(|e| StoreError::io(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(StoreError::io(&path, e));
        }
        Ok(())
    }

    fn get(
        &self,
        kind: DocumentKind,
        partition_key: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let path = self.path_for(kind, partition_key, id);
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&path, e)),
        };
        let doc: Document = serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Ok(Some(doc))
    }
}

type Key = (DocumentKind, String, String);

/// In-process store, mostly for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<BTreeMap<Key, Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count(&self, kind: DocumentKind) -> usize {
        self.docs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .filter(|(k, _, _)| *k == kind)
            .count()
    }

    /// All documents of `kind`, ordered by partition key then id.
    pub fn documents(&self, kind: DocumentKind) -> Vec<Document> {
        self.docs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|((k, _, _), _)| *k == kind)
            .map(|(_, doc)| doc.clone())
            .collect()
    }
}

impl DocumentStore for MemoryStore {
    fn upsert(&self, doc: &Document) -> Result<(), StoreError> {
        let key = (doc.kind, doc.partition_key.clone(), doc.id.clone());
        self.docs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, doc.clone());
        Ok(())
    }

    fn get(
        &self,
        kind: DocumentKind,
        partition_key: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let key = (kind, partition_key.to_string(), id.to_string());
        Ok(self
            .docs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned())
    }
}
