use std::collections::BTreeMap;

use crate::{account::AccountRecord, identity::StorageKey};

use super::{AccountStore, StoreError};

/// Store with no backing medium. Writes succeed immediately and vanish with the process.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: BTreeMap<StorageKey, AccountRecord>,
}

impl AccountStore for InMemoryAccountStore {
    fn get(&self, key: &StorageKey) -> Option<&AccountRecord> {
        self.accounts.get(key)
    }

    fn set(&mut self, key: StorageKey, record: AccountRecord) -> Result<(), StoreError> {
        self.accounts.insert(key, record);
        Ok(())
    }

    fn delete(&mut self, key: &StorageKey) -> Result<Option<AccountRecord>, StoreError> {
        Ok(self.accounts.remove(key))
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (&StorageKey, &AccountRecord)> + '_> {
        Box::new(self.accounts.iter())
    }

    fn flush_all(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}
