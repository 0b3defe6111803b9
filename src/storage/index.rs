use async_trait::async_trait;
use std::sync::Arc;

use super::core::{Cursor, KeyValueStore, ScanPage, StoreResult, WriteBatch};

// ============================================================================
// Secondary Index - Enumerable set of record keys
// ============================================================================
//
// Index updates are staged into the caller's WriteBatch so they commit
// atomically with the record write they belong to. Scans go straight to
// the backing store.
//
// ============================================================================

#[async_trait]
pub trait KeyIndex: Send + Sync {
    /// Storage key of the index, used as error context.
    fn name(&self) -> &str;

    /// Stage adding `key` to the index.
    fn stage_add(&self, batch: &mut WriteBatch, key: &str);

    /// Stage removing `key` from the index.
    fn stage_remove(&self, batch: &mut WriteBatch, key: &str);

    /// Read one page of indexed keys.
    async fn scan(&self, cursor: Option<&Cursor>, count: usize) -> StoreResult<ScanPage>;
}

/// Index backed by a single unordered set in the key-value store.
pub struct SetIndex {
    store: Arc<dyn KeyValueStore>,
    set_name: String,
}

impl SetIndex {
    pub fn new(store: Arc<dyn KeyValueStore>, set_name: &str) -> Self {
        Self {
            store,
            set_name: set_name.to_string(),
        }
    }
}

#[async_trait]
impl KeyIndex for SetIndex {
    fn name(&self) -> &str {
        &self.set_name
    }

    fn stage_add(&self, batch: &mut WriteBatch, key: &str) {
        batch.set_add(self.set_name.as_str(), key);
    }

    fn stage_remove(&self, batch: &mut WriteBatch, key: &str) {
        batch.set_remove(self.set_name.as_str(), key);
    }

    async fn scan(&self, cursor: Option<&Cursor>, count: usize) -> StoreResult<ScanPage> {
        self.store.scan_set(&self.set_name, cursor, count).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::backends::MemoryStore;
    use crate::storage::core::Mutation;

    #[test]
    fn test_stage_add_and_remove_target_the_index_set() {
        let index = SetIndex::new(Arc::new(MemoryStore::new()), "orders");
        assert_eq!(index.name(), "orders");
        let mut batch = WriteBatch::new();

        index.stage_add(&mut batch, "order:7");
        index.stage_remove(&mut batch, "order:8");

        assert_eq!(
            batch.mutations(),
            &[
                Mutation::SetAdd {
                    set: "orders".to_string(),
                    member: "order:7".to_string()
                },
                Mutation::SetRemove {
                    set: "orders".to_string(),
                    member: "order:8".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_scan_reads_committed_members() {
        let store = Arc::new(MemoryStore::new());
        let index = SetIndex::new(store.clone(), "orders");

        let mut batch = WriteBatch::new();
        index.stage_add(&mut batch, "order:1");
        index.stage_add(&mut batch, "order:2");
        store.commit(batch).await.unwrap();

        let page = index.scan(None, 10).await.unwrap();
        assert_eq!(page.members, vec!["order:1", "order:2"]);
        assert!(page.is_last());
    }
}
