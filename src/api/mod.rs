// ============================================================================
// HTTP API
// ============================================================================
//
// Thin actix-web adapters over OrderRepository. Handlers translate
// repository error kinds into responses and hold no storage logic.
//
// ============================================================================

mod order_handler;
mod routes;

use std::sync::Arc;

use crate::domain::order::OrderRepository;
use crate::metrics::Metrics;
use crate::storage::KeyValueStore;

pub use routes::configure;

/// Shared state handed to every handler through `web::Data`.
pub struct AppState {
    pub repo: OrderRepository,
    pub store: Arc<dyn KeyValueStore>,
    pub metrics: Arc<Metrics>,
    pub page_size: usize,
}
