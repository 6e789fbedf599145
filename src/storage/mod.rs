//! Process-wide store of last known documents.
//!
//! The store is created on first access through [`store`] and lives for the
//! rest of the process. Every later call returns the same instance. Documents
//! are keyed by workspace and page (see [`store_key`]) and kept in memory only.

use crate::core::mark::Document;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

static STORE: OnceCell<DocumentStore> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("document store lock poisoned")]
    Poisoned,
}

#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: Mutex<HashMap<String, Document>>,
}

/// Returns the process-wide store, creating it on first use.
pub fn store() -> &'static DocumentStore {
    STORE.get_or_init(DocumentStore::new)
}

pub fn store_key(workspace: &str, page: &str) -> String {
    format!("{workspace}/{page}")
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self, key: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    /// Stores `document` under `key`, returning the document it replaced.
    pub fn save(&self, key: &str, document: Document) -> Result<Option<Document>, StoreError> {
        Ok(self.lock()?.insert(key.to_string(), document))
    }

    pub fn remove(&self, key: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.lock()?.remove(key))
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Document>>, StoreError> {
        self.documents.lock().map_err(|_| StoreError::Poisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_is_a_singleton() {
        let first = store() as *const DocumentStore;
        let second = store() as *const DocumentStore;
        assert_eq!(first, second);
    }

    #[test]
    fn test_save_load_remove() {
        let store = DocumentStore::new();
        let key = store_key("graph", "Page");
        assert_eq!(key, "graph/Page");
        assert_eq!(store.load(&key).unwrap(), None);

        let doc = Document::new("hello", Vec::new());
        assert_eq!(store.save(&key, doc.clone()).unwrap(), None);
        assert_eq!(store.load(&key).unwrap(), Some(doc.clone()));
        assert_eq!(store.len().unwrap(), 1);

        assert_eq!(store.remove(&key).unwrap(), Some(doc));
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_global_store_shared_between_threads() {
        let key = store_key("threads", "shared");
        std::thread::spawn({
            let key = key.clone();
            move || {
                store()
                    .save(&key, Document::new("from thread", Vec::new()))
                    .unwrap();
            }
        })
        .join()
        .unwrap();
        let loaded = store().load(&key).unwrap();
        assert_eq!(loaded.map(|d| d.content), Some("from thread".to_string()));
        store().remove(&key).unwrap();
    }
}
