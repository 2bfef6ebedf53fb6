use thiserror::Error;

use crate::{account::AccountRecord, identity::StorageKey};

pub mod file_store;
pub mod in_memory_store;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O failed for `{key}`: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to encode record `{key}`: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Mapping from storage key to account record.
///
/// Every mutating call persists before it returns, so a record handed to
/// [`AccountStore::set`] is durable once the call succeeds.
pub trait AccountStore {
    fn get(&self, key: &StorageKey) -> Option<&AccountRecord>;

    /// Inserts or replaces the record under `key` and persists it.
    fn set(&mut self, key: StorageKey, record: AccountRecord) -> Result<(), StoreError>;

    /// Removes the record and its persisted artifact.
    fn delete(&mut self, key: &StorageKey) -> Result<Option<AccountRecord>, StoreError>;

    fn iter(&self) -> Box<dyn Iterator<Item = (&StorageKey, &AccountRecord)> + '_>;

    /// Re-persists every record currently held.
    fn flush_all(&mut self) -> Result<(), StoreError>;

    fn len(&self) -> usize {
        self.iter().count()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
