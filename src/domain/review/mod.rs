// Reviews of completed orders. Not journaled: a review is written once and
// never changes.

pub mod model;
pub mod errors;

pub use model::*;
pub use errors::*;
