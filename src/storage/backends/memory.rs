use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::ops::Bound;
use tokio::sync::RwLock;

use crate::storage::core::{
    CommitOutcome, Cursor, KeyValueStore, Mutation, Precondition, ScanPage, StoreError,
    StoreResult, WriteBatch,
};

// ============================================================================
// In-Memory Store - HashMap-backed KeyValueStore
// ============================================================================
//
// Used by tests and by `ORDERS_STORE=memory`. A batch is applied under one
// write lock, so every commit is atomic with respect to all other calls.
//
// Set scans walk members in sorted order; the cursor is the last member
// returned, so pages stay consistent even while members are added or
// removed between calls.
//
// ============================================================================

#[derive(Debug, Clone)]
enum Slot {
    Value(Vec<u8>),
    Set(BTreeSet<String>),
}

#[derive(Default)]
pub struct MemoryStore {
    slots: RwLock<HashMap<String, Slot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }

    /// Cardinality of a set, 0 when it does not exist.
    #[cfg(test)]
    pub async fn set_len(&self, set: &str) -> usize {
        match self.slots.read().await.get(set) {
            Some(Slot::Set(members)) => members.len(),
            _ => 0,
        }
    }

    /// Apply mutations to a scratch copy of the touched slots so a type
    /// error halfway through leaves the live map untouched.
    fn stage(
        slots: &HashMap<String, Slot>,
        mutations: &[Mutation],
    ) -> StoreResult<HashMap<String, Option<Slot>>> {
        let mut staged: HashMap<String, Option<Slot>> = HashMap::new();

        for mutation in mutations {
            let target = mutation.target().to_string();
            let slot = staged
                .entry(target.clone())
                .or_insert_with(|| slots.get(&target).cloned());

            match mutation {
                Mutation::Put { value, .. } => {
                    *slot = Some(Slot::Value(value.clone()));
                }
                Mutation::Delete { .. } => {
                    *slot = None;
                }
                Mutation::SetAdd { member, .. } => {
                    match slot.get_or_insert_with(|| Slot::Set(BTreeSet::new())) {
                        Slot::Set(members) => {
                            members.insert(member.clone());
                        }
                        Slot::Value(_) => return Err(StoreError::WrongType { key: target }),
                    }
                }
                Mutation::SetRemove { member, .. } => {
                    let now_empty = match slot.as_mut() {
                        Some(Slot::Set(members)) => {
                            members.remove(member);
                            members.is_empty()
                        }
                        Some(Slot::Value(_)) => return Err(StoreError::WrongType { key: target }),
                        None => false,
                    };
                    if now_empty {
                        *slot = None;
                    }
                }
            }
        }

        Ok(staged)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        match self.slots.read().await.get(key) {
            Some(Slot::Value(value)) => Ok(Some(value.clone())),
            Some(Slot::Set(_)) => Err(StoreError::WrongType {
                key: key.to_string(),
            }),
            None => Ok(None),
        }
    }

    async fn get_many(&self, keys: &[String]) -> StoreResult<Vec<Option<Vec<u8>>>> {
        let slots = self.slots.read().await;

        // Non-value slots read as missing, the same way MGET treats them
        Ok(keys
            .iter()
            .map(|key| match slots.get(key) {
                Some(Slot::Value(value)) => Some(value.clone()),
                _ => None,
            })
            .collect())
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<CommitOutcome> {
        let mut slots = self.slots.write().await;

        let holds = match batch.precondition() {
            Some(Precondition::KeyAbsent(key)) => !slots.contains_key(key),
            Some(Precondition::KeyPresent(key)) => slots.contains_key(key),
            None => true,
        };
        if !holds {
            return Ok(CommitOutcome::PreconditionFailed);
        }

        let staged = Self::stage(&slots, batch.mutations())?;
        for (key, slot) in staged {
            match slot {
                Some(slot) => {
                    slots.insert(key, slot);
                }
                None => {
                    slots.remove(&key);
                }
            }
        }

        Ok(CommitOutcome::Applied)
    }

    async fn scan_set(
        &self,
        set: &str,
        cursor: Option<&Cursor>,
        count: usize,
    ) -> StoreResult<ScanPage> {
        let slots = self.slots.read().await;

        let members = match slots.get(set) {
            Some(Slot::Set(members)) => members,
            Some(Slot::Value(_)) => {
                return Err(StoreError::WrongType {
                    key: set.to_string(),
                })
            }
            None => return Ok(ScanPage::default()),
        };

        let lower = match cursor {
            Some(cursor) => Bound::Excluded(cursor.as_str().to_string()),
            None => Bound::Unbounded,
        };

        let mut remaining = members.range((lower, Bound::Unbounded));
        let page: Vec<String> = remaining.by_ref().take(count.max(1)).cloned().collect();

        let next = match (remaining.next(), page.last()) {
            (Some(_), Some(last)) => Some(Cursor::new(last.clone())),
            _ => None,
        };

        Ok(ScanPage {
            members: page,
            next,
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
