// ============================================================================
// Catalog - users, stores, menus and option categories
// ============================================================================
//
// Owned by other services. The order engine reads it through CatalogLookup
// and never writes to it.
//
// ============================================================================

pub mod model;
pub mod lookup;

pub use model::*;
pub use lookup::*;
