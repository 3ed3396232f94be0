// ============================================================================
// Actors Module
// ============================================================================
//
// Background work scheduled on the actix system.
//
// Note: Cart and order logic lives in services and command handlers, NOT
//       actors. Actors only drive scheduled maintenance.
//
// ============================================================================

mod cart_sweeper;

pub use cart_sweeper::{CartSweeper, SweepSchedule};
