use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::metrics::Metrics;
use crate::storage::{
    CommitOutcome, Cursor, KeyIndex, KeyValueStore, SetIndex, StoreError, StoreResult, WriteBatch,
};

use super::aggregate::Order;
use super::errors::RepositoryError;

// ============================================================================
// Order Repository
// ============================================================================
//
// Stores each order as one JSON record under `order:<id>` and keeps every
// stored key in the `orders` index for enumeration.
//
// Consistency:
// - Insert writes record + index entry in one batch guarded by "key absent".
// - Update rewrites the record in one batch guarded by "key present".
// - Delete removes record + index entry in one batch guarded by "key present".
// A rejected guard applies nothing, so the index always holds exactly the
// stored keys. No locking and no retries happen here; concurrent callers are
// arbitrated by the store.
//
// ============================================================================

pub const ORDERS_INDEX: &str = "orders";
pub const DEFAULT_PAGE_SIZE: usize = 50;

const KEY_PREFIX: &str = "order:";

const OP_INSERT: &str = "insert";
const OP_FIND_BY_ID: &str = "find_by_id";
const OP_UPDATE: &str = "update";
const OP_DELETE: &str = "delete_by_id";
const OP_FIND_ALL: &str = "find_all";

pub type RepositoryResult<T> = Result<T, RepositoryError>;

pub fn order_key(id: u64) -> String {
    format!("{}{}", KEY_PREFIX, id)
}

/// Page request for `find_all`. `cursor: None` starts a new scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindAllPage {
    pub cursor: Option<Cursor>,
    pub size: usize,
}

impl FindAllPage {
    pub fn first(size: usize) -> Self {
        Self { cursor: None, size }
    }

    pub fn after(cursor: Cursor, size: usize) -> Self {
        Self {
            cursor: Some(cursor),
            size,
        }
    }
}

impl Default for FindAllPage {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

/// One page of orders. `cursor: None` means the scan is complete.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindResult {
    pub orders: Vec<Order>,
    pub cursor: Option<Cursor>,
}

pub struct OrderRepository {
    store: Arc<dyn KeyValueStore>,
    index: Arc<dyn KeyIndex>,
    deadline: Option<Duration>,
    metrics: Option<Arc<Metrics>>,
}

impl OrderRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let index = Arc::new(SetIndex::new(store.clone(), ORDERS_INDEX));
        Self {
            store,
            index,
            deadline: None,
            metrics: None,
        }
    }

    /// Replace the default set-backed index.
    #[allow(dead_code)]
    pub fn with_index(mut self, index: Arc<dyn KeyIndex>) -> Self {
        self.index = index;
        self
    }

    /// Bound every store call; an expired call fails with a store error.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Store a new order. Fails with `AlreadyExists` if the id is taken.
    pub async fn insert(&self, order: &Order) -> RepositoryResult<()> {
        let started = Instant::now();
        let result = self.insert_inner(order).await;
        self.observe(OP_INSERT, started, &result);
        result
    }

    pub async fn find_by_id(&self, id: u64) -> RepositoryResult<Order> {
        let started = Instant::now();
        let result = self.find_by_id_inner(id).await;
        self.observe(OP_FIND_BY_ID, started, &result);
        result
    }

    /// Replace an existing order. Fails with `NotFound` rather than creating.
    pub async fn update(&self, order: &Order) -> RepositoryResult<()> {
        let started = Instant::now();
        let result = self.update_inner(order).await;
        self.observe(OP_UPDATE, started, &result);
        result
    }

    pub async fn delete_by_id(&self, id: u64) -> RepositoryResult<()> {
        let started = Instant::now();
        let result = self.delete_by_id_inner(id).await;
        self.observe(OP_DELETE, started, &result);
        result
    }

    /// Fetch one page of orders from the index.
    ///
    /// Enumeration order is unspecified. A record that fails to decode fails
    /// the whole page. A cursor the store did not issue is `InvalidCursor`.
    pub async fn find_all(&self, page: &FindAllPage) -> RepositoryResult<FindResult> {
        let started = Instant::now();
        let result = self.find_all_inner(page).await;
        self.observe(OP_FIND_ALL, started, &result);
        result
    }

    async fn insert_inner(&self, order: &Order) -> RepositoryResult<()> {
        let key = order_key(order.order_id);
        let data = encode(&key, order)?;

        let mut batch = WriteBatch::new().require_absent(key.as_str());
        batch.put(key.as_str(), data);
        self.index.stage_add(&mut batch, &key);

        match self.call(OP_INSERT, &key, self.store.commit(batch)).await? {
            CommitOutcome::Applied => {
                tracing::info!(
                    order_id = order.order_id,
                    key = %key,
                    line_items = order.line_items.len(),
                    "Inserted order"
                );
                Ok(())
            }
            CommitOutcome::PreconditionFailed => {
                tracing::warn!(order_id = order.order_id, key = %key, "Order already exists");
                Err(RepositoryError::AlreadyExists { key })
            }
        }
    }

    async fn find_by_id_inner(&self, id: u64) -> RepositoryResult<Order> {
        let key = order_key(id);

        let value = self.call(OP_FIND_BY_ID, &key, self.store.get(&key)).await?;
        let Some(bytes) = value else {
            tracing::debug!(order_id = id, key = %key, "Order not found");
            return Err(RepositoryError::NotFound { key });
        };

        let order = decode(&key, &bytes)?;
        tracing::debug!(order_id = id, key = %key, "Loaded order");
        Ok(order)
    }

    async fn update_inner(&self, order: &Order) -> RepositoryResult<()> {
        let key = order_key(order.order_id);
        let data = encode(&key, order)?;

        let mut batch = WriteBatch::new().require_present(key.as_str());
        batch.put(key.as_str(), data);

        match self.call(OP_UPDATE, &key, self.store.commit(batch)).await? {
            CommitOutcome::Applied => {
                tracing::info!(order_id = order.order_id, key = %key, "Updated order");
                Ok(())
            }
            CommitOutcome::PreconditionFailed => {
                tracing::warn!(order_id = order.order_id, key = %key, "Update target does not exist");
                Err(RepositoryError::NotFound { key })
            }
        }
    }

    async fn delete_by_id_inner(&self, id: u64) -> RepositoryResult<()> {
        let key = order_key(id);

        let mut batch = WriteBatch::new().require_present(key.as_str());
        batch.delete(key.as_str());
        self.index.stage_remove(&mut batch, &key);

        match self.call(OP_DELETE, &key, self.store.commit(batch)).await? {
            CommitOutcome::Applied => {
                tracing::info!(order_id = id, key = %key, "Deleted order");
                Ok(())
            }
            CommitOutcome::PreconditionFailed => {
                tracing::warn!(order_id = id, key = %key, "Delete target does not exist");
                Err(RepositoryError::NotFound { key })
            }
        }
    }

    async fn find_all_inner(&self, page: &FindAllPage) -> RepositoryResult<FindResult> {
        let index = self.index.name();
        let scan = self
            .call(OP_FIND_ALL, index, self.index.scan(page.cursor.as_ref(), page.size))
            .await
            .map_err(|err| match err {
                RepositoryError::Store {
                    source: StoreError::InvalidCursor(cursor),
                    ..
                } => RepositoryError::InvalidCursor { cursor },
                other => other,
            })?;

        if scan.members.is_empty() {
            return Ok(FindResult {
                orders: Vec::new(),
                cursor: scan.next,
            });
        }

        let values = self
            .call(OP_FIND_ALL, index, self.store.get_many(&scan.members))
            .await?;

        let mut orders = Vec::with_capacity(values.len());
        for (key, value) in scan.members.iter().zip(values) {
            match value {
                Some(bytes) => orders.push(decode(key, &bytes)?),
                // Deleted between the index scan and the fetch
                None => tracing::debug!(key = %key, "Skipping index entry with no record"),
            }
        }

        tracing::debug!(
            count = orders.len(),
            has_more = !scan.is_last(),
            "Loaded order page"
        );

        Ok(FindResult {
            orders,
            cursor: scan.next,
        })
    }

    /// Run one store call under the configured deadline and attach context.
    async fn call<T, F>(&self, operation: &'static str, key: &str, fut: F) -> RepositoryResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        let result = match self.deadline {
            Some(deadline) => match tokio::time::timeout(deadline, fut).await {
                Ok(result) => result,
                Err(_) => Err(StoreError::DeadlineExceeded(deadline)),
            },
            None => fut.await,
        };

        result.map_err(|source| RepositoryError::Store {
            operation,
            key: key.to_string(),
            source,
        })
    }

    fn observe<T>(&self, operation: &str, started: Instant, result: &RepositoryResult<T>) {
        if let Some(metrics) = &self.metrics {
            let outcome = match result {
                Ok(_) => "ok",
                Err(e) => e.kind(),
            };
            metrics.record_repository_op(operation, outcome, started.elapsed());
        }
    }
}

fn encode(key: &str, order: &Order) -> RepositoryResult<Vec<u8>> {
    serde_json::to_vec(order).map_err(|source| RepositoryError::Encoding {
        key: key.to_string(),
        source,
    })
}

fn decode(key: &str, bytes: &[u8]) -> RepositoryResult<Order> {
    serde_json::from_slice(bytes).map_err(|source| RepositoryError::Decoding {
        key: key.to_string(),
        source,
    })
}

// ============================================================================
// Unit Tests
// ============================================================================
