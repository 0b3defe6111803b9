// ============================================================================
// Storage Infrastructure
// ============================================================================
//
// Generic key-value persistence used by domain repositories.
// Domain-specific code is in src/domain/
//
// ============================================================================

pub mod backends;
pub mod core;
pub mod index;

pub use self::core::*;
pub use backends::{MemoryStore, RedisStore};
pub use index::{KeyIndex, SetIndex};
