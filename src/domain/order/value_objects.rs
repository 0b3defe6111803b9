use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Order Value Objects
// ============================================================================

/// One purchased item on an order. `price` is the unit price in minor
/// currency units, not the line total.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LineItem {
    pub item_id: Uuid,
    pub quantity: u64,
    pub price: u64,
}

/// Lifecycle stage requested through the update endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Shipped,
    Completed,
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_item_serialization() {
        let item = LineItem {
            item_id: Uuid::new_v4(),
            quantity: 3,
            price: 1299,
        };

        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"item_id\""));
        assert!(json.contains("\"quantity\":3"));
        assert!(json.contains("\"price\":1299"));

        let deserialized: LineItem = serde_json::from_str(&json).unwrap();
        assert_eq!(item, deserialized);
    }

    #[test]
    fn test_negative_quantity_is_rejected() {
        let json = format!(
            r#"{{"item_id":"{}","quantity":-1,"price":10}}"#,
            Uuid::new_v4()
        );
        assert!(serde_json::from_str::<LineItem>(&json).is_err());
    }

    #[test]
    fn test_order_status_wire_names() {
        assert_eq!(serde_json::to_string(&OrderStatus::Shipped).unwrap(), "\"shipped\"");
        let status: OrderStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(status, OrderStatus::Completed);
        assert!(serde_json::from_str::<OrderStatus>("\"cancelled\"").is_err());
    }
}
