// ============================================================================
// Order Domain - Business Logic for the Order Aggregate
// ============================================================================
//
// This module contains ALL Order-specific code:
// - Value objects (OrderState, OrderMenu, OrderMenuOption, OptionSelection)
// - Events (CartOpened, MenuAdded, OrderPlaced, etc.)
// - Commands (AddMenu, PlaceOrder, ChangeState, etc.)
// - Errors (OrderError enum)
// - Lifecycle transition table
// - Option selection validation
// - Aggregate (OrderAggregate with business logic)
// - Command Handler (OrderCommandHandler)
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod transitions;
pub mod option_validation;
pub mod aggregate;
pub mod command_handler;

// Re-export for convenience
pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use option_validation::validate_selections;
pub use aggregate::*;
pub use command_handler::*;
