// ============================================================================
// Storage Core - Backend-agnostic abstractions
// ============================================================================

mod batch;
mod error;
mod kv;

pub use batch::*;
pub use error::*;
pub use kv::*;
