use std::fmt;

use thiserror::Error;

/// Unified error type for all varcol operations.
///
/// Errors propagate upward through the call stack using Rust's `?` operator.
/// Internal code matches on specific variants for fine-grained handling; at
/// the ingest boundary errors are typically converted to user-facing
/// messages.
#[derive(Error, Debug)]
pub enum Error {
    /// Arrow library error during columnar materialization.
    ///
    /// Raised while converting a finalized object column into Arrow arrays,
    /// e.g. when a decimal exceeds the representable precision or a batch
    /// schema cannot be assembled.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Invalid user input or API parameter.
    ///
    /// Covers the recoverable rejections of the ingest path: array nesting
    /// depth that disagrees between siblings, scalar types with no common
    /// supertype, coercion failures, duplicate paths, and inconsistent
    /// nested-array sizes. Fix the input and retry; the column rolls back
    /// the offending row or range before returning this.
    #[error("Invalid argument: {0}")]
    InvalidArgumentError(String),

    /// Operation that the object column refuses by contract.
    ///
    /// The dynamic object column must be converted to a rigid tuple layout
    /// before cross-column operations (filter, permute, compare, scatter,
    /// ...) run. Reaching this variant indicates a caller bug, not bad data;
    /// callers treat it as terminal.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Subcolumn sizes disagree with the row counter.
    ///
    /// Detected by consistency checks. Indicates an earlier partial insert
    /// that failed to roll back; callers treat it as terminal.
    #[error("Consistency violation: {0}")]
    ConsistencyViolation(String),

    /// Internal error indicating a bug or unexpected state.
    ///
    /// This should never occur during normal operation; it means an internal
    /// invariant was violated (for example a value reached part storage
    /// without being coerced to the part's type first).
    #[error("An internal operation failed: {0}")]
    Internal(String),
}

impl Error {
    /// Create an [`Error::InvalidArgumentError`] from any displayable value.
    #[inline]
    pub fn invalid_argument<E: fmt::Display>(err: E) -> Self {
        Error::InvalidArgumentError(err.to_string())
    }

    /// Create an [`Error::Unsupported`] for a named operation.
    #[inline]
    pub fn unsupported(op: &str) -> Self {
        Error::Unsupported(format!(
            "{op} cannot run on an object column; convert it to a tuple column first"
        ))
    }
}
