//! Embedded transactional JSON document store.
//!
//! Documents are JSON objects grouped in named collections and keyed by
//! their `_id` string field. Writes happen inside
//! [`DocumentStore::with_transaction`]: the session works on a private copy
//! of every collection, and the copy replaces the live data only when the
//! closure succeeds. A directory-backed store also writes the committed copy
//! to `documents.json` (temp file plus rename) before publishing it.

use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Name of the key field every document carries.
pub const ID_FIELD: &str = "_id";

const DOCUMENTS_FILE: &str = "documents.json";
const DOCUMENTS_TEMP_FILE: &str = "documents.json.tmp";

type Collection = BTreeMap<String, Value>;
type Collections = BTreeMap<String, Collection>;

/// Errors raised by the document store.
#[derive(Debug, Error)]
pub enum DocumentStoreError {
    /// A document with the same key already exists in the collection.
    #[error("duplicate key '{id}' in collection '{collection}'")]
    DuplicateKey {
        /// Collection name.
        collection: String,
        /// Conflicting key.
        id: String,
    },

    /// An inserted value is not an object with a string `_id` field.
    #[error("document for collection '{0}' must be an object with a string _id")]
    MissingId(String),

    /// A previous writer panicked while holding the store lock.
    #[error("document store lock poisoned")]
    Poisoned,

    /// Reading or writing the backing directory failed.
    #[error("document store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file or a document could not be (de)serialized.
    #[error("document store serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Handle to an embedded document store.
///
/// Cloning the handle shares the underlying store.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    inner: Arc<DocumentStoreInner>,
}

#[derive(Debug)]
struct DocumentStoreInner {
    collections: RwLock<Collections>,
    directory: Option<Dir>,
}

impl DocumentStore {
    /// Creates a store that keeps documents in memory only.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_parts(Collections::new(), None)
    }

    /// Opens a store persisted under `path`, creating the directory when
    /// missing and loading previously committed documents.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Io`] when the directory cannot be
    /// created or read, or [`DocumentStoreError::Json`] when the stored file
    /// is not valid.
    pub fn open(path: &Utf8Path) -> Result<Self, DocumentStoreError> {
        Dir::create_ambient_dir_all(path, ambient_authority())?;
        let directory = Dir::open_ambient_dir(path, ambient_authority())?;
        let collections = match directory.read_to_string(DOCUMENTS_FILE) {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(err) if err.kind() == ErrorKind::NotFound => Collections::new(),
            Err(err) => return Err(err.into()),
        };
        tracing::debug!(%path, collections = collections.len(), "opened document store");
        Ok(Self::from_parts(collections, Some(directory)))
    }

    fn from_parts(collections: Collections, directory: Option<Dir>) -> Self {
        Self {
            inner: Arc::new(DocumentStoreInner {
                collections: RwLock::new(collections),
                directory,
            }),
        }
    }

    /// Returns `true` when committed documents are written to disk.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.inner.directory.is_some()
    }

    /// Returns the document with key `id`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Poisoned`] when the store lock is
    /// poisoned.
    pub fn find_one(&self, collection: &str, id: &str) -> Result<Option<Value>, DocumentStoreError> {
        let collections = self
            .inner
            .collections
            .read()
            .map_err(|_| DocumentStoreError::Poisoned)?;
        Ok(collections
            .get(collection)
            .and_then(|documents| documents.get(id))
            .cloned())
    }

    /// Returns every document of a collection, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Poisoned`] when the store lock is
    /// poisoned.
    pub fn find_all(&self, collection: &str) -> Result<Vec<Value>, DocumentStoreError> {
        let collections = self
            .inner
            .collections
            .read()
            .map_err(|_| DocumentStoreError::Poisoned)?;
        Ok(collections
            .get(collection)
            .map(|documents| documents.values().cloned().collect())
            .unwrap_or_default())
    }

    /// Runs `transaction` against a private copy of the store and publishes
    /// the copy only if it returns `Ok`.
    ///
    /// Writers are serialized; readers wait while a transaction commits.
    ///
    /// # Errors
    ///
    /// Returns the closure's error (after discarding its writes), or a
    /// [`DocumentStoreError`] converted into `E` when locking or persisting
    /// fails.
    pub fn with_transaction<T, E, F>(&self, transaction: F) -> Result<T, E>
    where
        F: FnOnce(&mut DocumentSession) -> Result<T, E>,
        E: From<DocumentStoreError>,
    {
        let mut live = self
            .inner
            .collections
            .write()
            .map_err(|_| DocumentStoreError::Poisoned)?;
        let mut session = DocumentSession {
            collections: live.clone(),
        };

        let value = transaction(&mut session)?;

        if let Some(directory) = &self.inner.directory {
            persist(directory, &session.collections)?;
        }
        *live = session.collections;
        Ok(value)
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

fn persist(directory: &Dir, collections: &Collections) -> Result<(), DocumentStoreError> {
    let contents = serde_json::to_vec(collections)?;
    directory.write(DOCUMENTS_TEMP_FILE, contents)?;
    directory.rename(DOCUMENTS_TEMP_FILE, directory, DOCUMENTS_FILE)?;
    Ok(())
}

/// Write session bound to one document store transaction.
#[derive(Debug)]
pub struct DocumentSession {
    collections: Collections,
}

impl DocumentSession {
    /// Inserts a new document keyed by its `_id` field.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::MissingId`] when the document has no
    /// string `_id`, or [`DocumentStoreError::DuplicateKey`] when the key is
    /// taken.
    pub fn insert_one(&mut self, collection: &str, document: Value) -> Result<(), DocumentStoreError> {
        let id = document
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| DocumentStoreError::MissingId(collection.to_owned()))?;

        let documents = self.collections.entry(collection.to_owned()).or_default();
        if documents.contains_key(&id) {
            return Err(DocumentStoreError::DuplicateKey {
                collection: collection.to_owned(),
                id,
            });
        }
        documents.insert(id, document);
        Ok(())
    }

    /// Overwrites the given top-level fields of the document keyed `id`.
    ///
    /// Returns the number of matched documents (0 or 1). The `_id` field is
    /// never overwritten.
    pub fn update_one(&mut self, collection: &str, id: &str, fields: Map<String, Value>) -> u64 {
        let Some(Value::Object(document)) = self
            .collections
            .get_mut(collection)
            .and_then(|documents| documents.get_mut(id))
        else {
            return 0;
        };
        for (field, value) in fields {
            if field != ID_FIELD {
                document.insert(field, value);
            }
        }
        1
    }

    /// Deletes the document keyed `id`, returning the number removed (0 or
    /// 1).
    pub fn delete_one(&mut self, collection: &str, id: &str) -> u64 {
        let removed = self
            .collections
            .get_mut(collection)
            .and_then(|documents| documents.remove(id));
        u64::from(removed.is_some())
    }
}
