//! Dynamic object column for vectorized ingest of semi-structured documents.
//!
//! Every document path becomes an independently typed subcolumn arranged in
//! a prefix tree. Each subcolumn is a sequence of dense typed parts: when an
//! incoming value cannot be represented by the current common type, a fresh
//! part is appended under the promoted least common supertype, and
//! finalization later collapses the history into a single dense part per
//! path. The finalized column converts into an Arrow [`RecordBatch`] (one
//! field per path) for the rigid, statically-typed side of the engine.
//!
//! ```
//! use varcol_column::{tuple, ObjectColumn};
//! use varcol_types::Field;
//!
//! let mut column = ObjectColumn::new(true);
//! column.try_insert(Field::object(vec![("a", Field::from(1i64))]))?;
//! column.try_insert(Field::object(vec![("a", Field::from("x"))]))?;
//! column.finalize()?;
//! let batch = tuple::to_record_batch(&column)?;
//! assert_eq!(batch.num_rows(), 2);
//! # Ok::<(), varcol_result::Error>(())
//! ```
//!
//! [`RecordBatch`]: arrow::record_batch::RecordBatch

pub mod column;
pub mod object;
pub mod part;
pub mod path;
pub mod subcolumn;
pub mod tree;
pub mod tuple;

pub use column::{require_reorderable, Column, ColumnTypeId, ReorderableColumn};
pub use object::ObjectColumn;
pub use part::ColumnPart;
pub use path::ColumnPath;
pub use subcolumn::{LeastCommonType, Subcolumn};
pub use tree::SubcolumnTree;
