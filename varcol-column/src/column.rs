//! The polymorphic column surface, split by capability.
//!
//! Every column kind implements the narrow [`Column`] contract. The wide
//! reorder surface lives on [`ReorderableColumn`], which rigid tuple columns
//! implement and the object column deliberately does not: misuse becomes a
//! missing method at compile time, and dynamic callers go through
//! [`require_reorderable`], which turns the gap into an `Unsupported` status.

use varcol_result::{Error, Result};
use varcol_types::Field;

use crate::object::ObjectColumn;

/// Tag distinguishing column kinds under dynamic dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ColumnTypeId {
    Variant,
}

/// The capability set every column kind supports.
pub trait Column {
    fn family_name(&self) -> &'static str;

    fn type_id(&self) -> ColumnTypeId;

    fn size(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    fn byte_size(&self) -> usize;

    fn allocated_bytes(&self) -> usize;

    fn insert_default(&mut self);

    fn pop_back(&mut self, n: usize);

    fn field_at(&self, n: usize) -> Result<Field>;

    fn clone_resized(&self, new_size: usize) -> Box<dyn Column>;

    /// Capability probe for the wide reorder surface. Columns that cannot be
    /// filtered, permuted, compared, or scattered return `None`.
    fn as_reorderable(&self) -> Option<&dyn ReorderableColumn> {
        None
    }
}

/// The wide surface available only on rigid columns: everything that slices,
/// reorders, or compares rows across columns. The object column must be
/// converted to a tuple of fixed columns before any of this runs.
pub trait ReorderableColumn: Column {
    fn filter(&self, mask: &[bool]) -> Result<Box<dyn Column>>;

    fn permute(&self, permutation: &[usize], limit: usize) -> Result<Box<dyn Column>>;

    fn compare_at(&self, n: usize, m: usize, other: &dyn Column) -> Result<std::cmp::Ordering>;

    fn get_permutation(&self, reverse: bool, limit: usize) -> Result<Vec<usize>>;

    fn scatter(&self, num_columns: usize, selector: &[usize]) -> Result<Vec<Box<dyn Column>>>;

    fn replicate(&self, offsets: &[usize]) -> Result<Box<dyn Column>>;

    fn replace_from(&mut self, other: &dyn Column, row: usize, self_row: usize) -> Result<()>;

    fn update_hash(&self, row: usize, state: &mut dyn std::hash::Hasher) -> Result<()>;

    fn serialized_value_at(&self, row: usize) -> Result<Vec<u8>>;

    fn extremes(&self) -> Result<(Field, Field)>;

    fn indices_of_non_default_rows(&self, from: usize, limit: usize) -> Result<Vec<usize>>;

    fn append_by_selector(&self, selector: &[usize]) -> Result<Box<dyn Column>>;
}

/// Resolves the wide surface of a dynamically-typed column, failing with
/// `Unsupported` for kinds that must be converted to a tuple first. Reaching
/// that failure is a caller bug; the error is terminal by contract.
pub fn require_reorderable(column: &dyn Column) -> Result<&dyn ReorderableColumn> {
    column.as_reorderable().ok_or_else(|| {
        Error::Unsupported(format!(
            "{} columns cannot be reordered; convert to a tuple column first",
            column.family_name()
        ))
    })
}

impl Column for ObjectColumn {
    fn family_name(&self) -> &'static str {
        "Variant"
    }

    fn type_id(&self) -> ColumnTypeId {
        ColumnTypeId::Variant
    }

    fn size(&self) -> usize {
        ObjectColumn::size(self)
    }

    fn byte_size(&self) -> usize {
        ObjectColumn::byte_size(self)
    }

    fn allocated_bytes(&self) -> usize {
        ObjectColumn::allocated_bytes(self)
    }

    fn insert_default(&mut self) {
        ObjectColumn::insert_default(self);
    }

    fn pop_back(&mut self, n: usize) {
        ObjectColumn::pop_back(self, n);
    }

    fn field_at(&self, n: usize) -> Result<Field> {
        ObjectColumn::field_at(self, n)
    }

    fn clone_resized(&self, new_size: usize) -> Box<dyn Column> {
        Box::new(ObjectColumn::clone_resized(self, new_size))
    }
}
