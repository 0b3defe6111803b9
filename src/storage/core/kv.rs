use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::batch::{CommitOutcome, WriteBatch};
use super::error::StoreResult;

// ============================================================================
// Key-Value Store Contract
// ============================================================================
//
// Backends implement this trait; repositories only ever talk to it.
//
// Cursor contract:
// - A scan request carries `Option<Cursor>`; `None` starts from the beginning.
// - A scan response carries `next: Option<Cursor>`; `None` means no more pages.
// - Cursor contents are backend-specific and opaque to callers.
//
// ============================================================================

/// Opaque pagination token handed out by a backend scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of set members plus the cursor for the following page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPage {
    pub members: Vec<String>,
    pub next: Option<Cursor>,
}

impl ScanPage {
    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a single value. `Ok(None)` if the key does not exist.
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Read many values in one round-trip, positionally aligned with `keys`.
    async fn get_many(&self, keys: &[String]) -> StoreResult<Vec<Option<Vec<u8>>>>;

    /// Apply a batch atomically.
    async fn commit(&self, batch: WriteBatch) -> StoreResult<CommitOutcome>;

    /// Scan up to roughly `count` members of a set.
    ///
    /// `count` is a hint; backends may return fewer or more members.
    async fn scan_set(
        &self,
        set: &str,
        cursor: Option<&Cursor>,
        count: usize,
    ) -> StoreResult<ScanPage>;

    /// Round-trip to the backend to verify it is reachable.
    async fn ping(&self) -> StoreResult<()>;

    /// Human-readable backend name for logs and health output.
    fn backend_name(&self) -> &'static str;
}
