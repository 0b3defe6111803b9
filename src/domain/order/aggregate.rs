use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::OrderError;
use super::value_objects::{LineItem, OrderStatus};

// ============================================================================
// Order Aggregate
// ============================================================================
//
// Stored and retrieved as one unit: the order together with its line items.
// Line item order is entry order and is preserved verbatim.
//
// Lifecycle timestamps, when present, satisfy
//   created_at <= shipped_at <= completed_at
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    // Identity (also the storage key)
    pub order_id: u64,

    pub customer_id: Uuid,
    pub line_items: Vec<LineItem>,

    // Lifecycle; None means the stage has not been reached
    pub created_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Build a freshly created order stamped with `created_at`.
    pub fn new(
        order_id: u64,
        customer_id: Uuid,
        line_items: Vec<LineItem>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id,
            customer_id,
            line_items,
            created_at: Some(created_at),
            shipped_at: None,
            completed_at: None,
        }
    }

    /// Advance the order to `status`, stamping the matching timestamp.
    pub fn advance(&mut self, status: OrderStatus, at: DateTime<Utc>) -> Result<(), OrderError> {
        match status {
            OrderStatus::Shipped => {
                if self.shipped_at.is_some() {
                    return Err(OrderError::AlreadyShipped);
                }
                self.shipped_at = Some(at);
            }
            OrderStatus::Completed => {
                if self.completed_at.is_some() {
                    return Err(OrderError::AlreadyCompleted);
                }
                if self.shipped_at.is_none() {
                    return Err(OrderError::NotShipped);
                }
                self.completed_at = Some(at);
            }
        }
        Ok(())
    }
}
