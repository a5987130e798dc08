//! varcol: a dynamic object column for vectorized analytic ingest.
//!
//! This crate is the single entrypoint for the varcol toolkit. It re-exports
//! the surface of the underlying crates so downstream code sees one namespace
//! for values, types, and the column itself.
//!
//! The shape of the toolkit:
//!
//! - [`varcol_types`](types) holds the runtime [`Field`] values, the
//!   [`DataType`] lattice with its [`least_common_supertype`] oracle, and
//!   value coercion. Documents arrive as `Field`s, typically through the
//!   `serde_json` adapter.
//! - [`varcol_column`](column) holds the [`ObjectColumn`]: a prefix tree of
//!   subcolumns, each a sequence of dense typed parts that promote to wider
//!   types as conflicting values arrive, plus the tuple converter that
//!   materializes a finalized column into an Arrow record batch.
//!
//! Ingest is single-writer and synchronous: one thread populates a column
//! batch document by document, finalizes it, converts it to a rigid tuple,
//! and only then shares it with parallel readers.

pub use varcol_column as column;
pub use varcol_result as result;
pub use varcol_types as types;

pub use varcol_column::{
    require_reorderable, Column, ColumnPath, ColumnPart, ColumnTypeId, ObjectColumn,
    ReorderableColumn, Subcolumn, SubcolumnTree,
};
pub use varcol_column::tuple::{subcolumn_to_arrow, to_record_batch};
pub use varcol_result::{Error, Result};
pub use varcol_types::{
    cast_field, field_from_json, get_field_info, least_common_supertype, DataType, Field,
    FieldInfo,
};
