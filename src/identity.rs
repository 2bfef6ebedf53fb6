use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const STORAGE_KEY_LEN: usize = 20;
const ACCOUNT_NUMBER_LEN: usize = 10;

/// Key under which an account record is persisted and looked up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    /// Derives the key from a holder name. One-way: the name cannot be recovered.
    pub fn for_holder(holder: &str) -> Self {
        Self(digest(holder.as_bytes(), STORAGE_KEY_LEN))
    }

    /// Wraps an already derived key, e.g. a file stem read back from disk.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Account number for one creation event of `holder`.
pub fn account_number(holder: &str, created_at: &DateTime<Utc>) -> String {
    let mut input = holder.as_bytes().to_vec();
    input.extend_from_slice(created_at.to_rfc3339().as_bytes());
    digest(&input, ACCOUNT_NUMBER_LEN)
}

fn digest(input: &[u8], len: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    let mut hex = hex::encode(hasher.finalize());
    hex.truncate(len);
    hex
}
