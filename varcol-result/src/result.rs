//! Result type alias for varcol operations.

use crate::error::Error;

/// Result type used across the varcol crates.
pub type Result<T> = std::result::Result<T, Error>;
