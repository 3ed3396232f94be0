// ============================================================================
// Event Sourcing Infrastructure
// ============================================================================
//
// Generic, reusable journaling infrastructure.
// Domain-specific code is in src/domain/
//
// ============================================================================

mod core;

pub use core::*;
