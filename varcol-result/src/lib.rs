//! Error types and result definitions for the varcol crates.
//!
//! This crate provides the unified error type ([`Error`]) and result type
//! alias ([`Result<T>`]) used throughout the varcol workspace. All operations
//! that can fail on user-supplied data return `Result<T>`, where the error
//! variant carries enough context to diagnose what went wrong.
//!
//! # Error Philosophy
//!
//! varcol uses a single error enum ([`Error`]) rather than crate-specific
//! error types. This approach:
//! - Simplifies error handling across crate boundaries
//! - Allows errors to propagate naturally with the `?` operator
//! - Enables structured error matching for programmatic handling
//!
//! Two variants are terminal by contract rather than recoverable:
//! [`Error::Unsupported`] marks an operation the object column refuses until
//! it has been converted to a rigid tuple layout, and
//! [`Error::ConsistencyViolation`] marks internal state that an earlier
//! caller failed to roll back. Both are still surfaced as status values;
//! the library never aborts the process.

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
