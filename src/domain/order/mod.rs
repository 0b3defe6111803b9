// ============================================================================
// Order Domain
// ============================================================================
//
// This module contains ALL Order-specific code:
// - Value objects (LineItem, OrderStatus)
// - Aggregate (Order)
// - Errors (OrderError, RepositoryError)
// - Repository (OrderRepository over the key-value store)
//
// ============================================================================

pub mod aggregate;
pub mod errors;
pub mod repository;
pub mod value_objects;

// Re-export for convenience
pub use aggregate::*;
pub use errors::*;
pub use repository::*;
pub use value_objects::*;
