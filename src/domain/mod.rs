// ============================================================================
// Domain Layer
// ============================================================================
//
// Aggregates and their repositories. Storage mechanics live in
// src/storage/ and are reached only through the KeyValueStore trait.
//
// ============================================================================

pub mod order;
