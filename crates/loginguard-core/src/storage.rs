use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Origin-scoped durable key-value storage.
///
/// Reads and writes are synchronous and atomic per key. There is no
/// multi-key transaction; callers must tolerate one key being written
/// without the other.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Removing a key that does not exist is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-memory store. Clones share the same entries, so two throttles built
/// from clones of one `MemoryStore` behave like two page loads on one origin.
#[derive(Clone, Default, Debug)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Read a stored value as `T`, treating missing, unreadable and malformed
/// values alike as absent.
pub(crate) fn read_parsed<T: std::str::FromStr>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    match store.get(key) {
        Ok(Some(raw)) => {
            let parsed = raw.trim().parse().ok();
            if parsed.is_none() {
                tracing::debug!(key, raw = %raw, "ignoring malformed stored value");
            }
            parsed
        }
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(key, error = %e, "storage read failed; treating as absent");
            None
        }
    }
}
