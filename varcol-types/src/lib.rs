//! Runtime values and the type lattice backing the dynamic object column.
//!
//! Three pieces live here:
//!
//! - [`DataType`]: the concrete column types, including array and nullable
//!   wrappers, plus the [`least_common_supertype`] lattice oracle that drives
//!   type promotion.
//! - [`Field`]: a runtime-tagged value as produced by a document parser, and
//!   [`FieldInfo`] / [`get_field_info`], the decomposed summary (scalar type,
//!   nullability, array rank) that the column consults before every insert.
//! - [`cast_field`]: value coercion along lattice edges, used when a
//!   subcolumn promotes to a wider part type.
//!
//! Nothing here parses text; the [`json`] module only adapts already-parsed
//! `serde_json` values into [`Field`]s.

pub mod data_type;
pub mod field;
pub mod json;
pub mod supertype;

pub use data_type::DataType;
pub use field::{cast_field, get_field_info, Field, FieldInfo};
pub use json::field_from_json;
pub use supertype::least_common_supertype;
