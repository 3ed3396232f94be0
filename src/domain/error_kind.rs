use serde::Serialize;

/// Coarse error category shared by every domain error, so callers can map
/// failures to responses without matching on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    Validation,
    InvalidRole,
    InvalidState,
    Conflict,
}
