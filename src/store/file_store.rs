use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::{account::AccountRecord, identity::StorageKey};

use super::{AccountStore, StoreError};

const EXTENSION: &str = "json";

/// One pretty-printed JSON file per account, named `<storage key>.json`.
pub struct FileAccountStore {
    dir: PathBuf,
    accounts: BTreeMap<StorageKey, AccountRecord>,
}

impl FileAccountStore {
    /// Opens `dir`, creating it if needed, and loads every readable record.
    /// Files that cannot be read or parsed are skipped.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        let entries = fs::read_dir(&dir).map_err(|source| StoreError::Io {
            key: dir.display().to_string(),
            source,
        })?;

        let mut accounts = BTreeMap::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match Self::load(&path) {
                Ok(record) => {
                    accounts.insert(StorageKey::from_raw(stem), record);
                }
                Err(err) => debug!("Skipping {}: {err}", path.display()),
            }
        }

        Ok(Self { dir, accounts })
    }

    fn load(path: &Path) -> anyhow::Result<AccountRecord> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn file_path(&self, key: &StorageKey) -> PathBuf {
        self.dir.join(format!("{key}.{EXTENSION}"))
    }

    fn save(&self, key: &StorageKey, record: &AccountRecord) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            key: key.to_string(),
            source,
        };
        let file = File::create(self.file_path(key)).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, record).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        writer.flush().map_err(io_err)?;
        // the write counts only once it reached the disk
        writer.get_ref().sync_all().map_err(io_err)?;
        debug!("Persisted account {key}");
        Ok(())
    }
}

impl AccountStore for FileAccountStore {
    fn get(&self, key: &StorageKey) -> Option<&AccountRecord> {
        self.accounts.get(key)
    }

    fn set(&mut self, key: StorageKey, record: AccountRecord) -> Result<(), StoreError> {
        self.save(&key, &record)?;
        self.accounts.insert(key, record);
        Ok(())
    }

    fn delete(&mut self, key: &StorageKey) -> Result<Option<AccountRecord>, StoreError> {
        let removed = self.accounts.remove(key);
        match fs::remove_file(self.file_path(key)) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                if removed.is_some() {
                    warn!("Account {key} had no backing file");
                }
            }
            Err(source) => {
                return Err(StoreError::Io {
                    key: key.to_string(),
                    source,
                });
            }
        }
        Ok(removed)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (&StorageKey, &AccountRecord)> + '_> {
        Box::new(self.accounts.iter())
    }

    fn flush_all(&mut self) -> Result<(), StoreError> {
        for (key, record) in &self.accounts {
            self.save(key, record)?;
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.accounts.len()
    }
}
