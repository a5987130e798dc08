//! Storage for the values observed at one path across all rows.
//!
//! A subcolumn is an ordered list of typed parts. Values are appended to the
//! newest part while they fit its type; a value that does not fit promotes
//! the subcolumn by appending a fresh part under the least common supertype.
//! Older parts stay dense in their own types until [`Subcolumn::finalize`]
//! collapses everything into a single part of the final common type.

use tracing::trace;
use varcol_result::{Error, Result};
use varcol_types::{cast_field, get_field_info, least_common_supertype, DataType, Field, FieldInfo};

use crate::part::ColumnPart;

/// The running least common type of one subcolumn: `Array^d(base)` where the
/// base is a scalar, nullable when the subcolumn is.
#[derive(Debug, Clone)]
pub struct LeastCommonType {
    full: DataType,
    base: DataType,
    num_dimensions: usize,
}

impl LeastCommonType {
    pub fn new(full: DataType) -> Self {
        let base = full.base_type().clone();
        let num_dimensions = full.num_dimensions();
        Self {
            full,
            base,
            num_dimensions,
        }
    }

    pub fn get(&self) -> &DataType {
        &self.full
    }

    pub fn base(&self) -> &DataType {
        &self.base
    }

    pub fn num_dimensions(&self) -> usize {
        self.num_dimensions
    }
}

impl Default for LeastCommonType {
    fn default() -> Self {
        Self::new(DataType::Nothing)
    }
}

/// Ordered list of typed parts plus a symbolic run of leading defaults.
///
/// Until the first non-default insert the subcolumn stores no part at all and
/// only counts defaults; the count is flushed into the first part when that
/// part is created.
#[derive(Debug, Clone)]
pub struct Subcolumn {
    least_common_type: LeastCommonType,
    is_nullable: bool,
    data: Vec<ColumnPart>,
    num_of_defaults_in_prefix: usize,
}

impl Subcolumn {
    pub fn new(is_nullable: bool) -> Self {
        Self {
            least_common_type: LeastCommonType::default(),
            is_nullable,
            data: Vec::new(),
            num_of_defaults_in_prefix: 0,
        }
    }

    /// A subcolumn of `size` rows, all defaults.
    pub fn with_defaults(size: usize, is_nullable: bool) -> Self {
        let mut subcolumn = Self::new(is_nullable);
        subcolumn.num_of_defaults_in_prefix = size;
        subcolumn
    }

    /// Wraps an existing part as a one-part subcolumn.
    pub fn from_part(part: ColumnPart, is_nullable: bool) -> Self {
        Self {
            least_common_type: LeastCommonType::new(part.data_type().clone()),
            is_nullable,
            data: vec![part],
            num_of_defaults_in_prefix: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.num_of_defaults_in_prefix + self.data.iter().map(ColumnPart::len).sum::<usize>()
    }

    pub fn byte_size(&self) -> usize {
        self.data.iter().map(ColumnPart::byte_size).sum()
    }

    pub fn allocated_bytes(&self) -> usize {
        self.data.iter().map(ColumnPart::allocated_bytes).sum()
    }

    pub fn is_nullable(&self) -> bool {
        self.is_nullable
    }

    pub fn least_common_type(&self) -> &LeastCommonType {
        &self.least_common_type
    }

    pub fn num_parts(&self) -> usize {
        self.data.len()
    }

    pub fn defaults_in_prefix(&self) -> usize {
        self.num_of_defaults_in_prefix
    }

    /// True when the subcolumn has collapsed to exactly one part with no
    /// symbolic prefix left.
    pub fn is_finalized(&self) -> bool {
        self.num_of_defaults_in_prefix == 0 && self.data.len() == 1
    }

    /// The single dense part of a finalized subcolumn.
    pub fn finalized_part(&self) -> Option<&ColumnPart> {
        if self.is_finalized() {
            self.data.first()
        } else {
            None
        }
    }

    /// Inserts a value whose scalars may be arbitrary, as long as its array
    /// rank is consistent with the current common type.
    pub fn insert(&mut self, field: Field) -> Result<()> {
        let info = get_field_info(&field)?;
        self.insert_with_info(field, &info)
    }

    pub fn insert_with_info(&mut self, field: Field, info: &FieldInfo) -> Result<()> {
        let mut base_type = info.scalar_type.clone();

        // A bare null (or a scalar that is all nulls) always takes the
        // default path; it adopts whatever type the subcolumn ends up with.
        if base_type.is_nothing() && info.num_dimensions == 0 {
            self.insert_default();
            return Ok(());
        }

        let mut column_dim = self.least_common_type.num_dimensions();
        let mut value_dim = info.num_dimensions;
        if self.least_common_type.get().is_nothing() {
            column_dim = value_dim;
        }
        // Empty or null-only arrays only lower-bound their rank; they adopt
        // the column's rank as long as that does not understate what was
        // actually observed.
        if base_type.is_nothing() && column_dim >= value_dim {
            value_dim = column_dim;
        }
        if value_dim != column_dim {
            return Err(Error::InvalidArgumentError(format!(
                "array rank {value_dim} of inserted value does not match rank {column_dim} of the subcolumn"
            )));
        }

        if self.is_nullable {
            base_type = base_type.wrap_nullable();
        }

        let mut type_changed = false;
        if self.data.is_empty() {
            self.add_new_column_part(DataType::array_of(base_type, value_dim));
        } else if self.least_common_type.base() != &base_type && !base_type.is_nothing() {
            let new_base = least_common_supertype(self.least_common_type.base(), &base_type)?;
            type_changed = true;
            if &new_base != self.least_common_type.base() {
                trace!(
                    from = %self.least_common_type.get(),
                    to = %DataType::array_of(new_base.clone(), value_dim),
                    "promoting subcolumn to a wider part type"
                );
                self.add_new_column_part(DataType::array_of(new_base, value_dim));
            }
        }

        let field = if type_changed || info.need_convert {
            cast_field(&field, self.least_common_type.get())?
        } else {
            field
        };
        self.data
            .last_mut()
            .ok_or_else(|| Error::Internal("insert reached a subcolumn with no part".to_string()))?
            .push(&field)
    }

    /// Appends a fresh empty part of `data_type` and makes it the least
    /// common type. Creating the first part flushes the default prefix.
    fn add_new_column_part(&mut self, data_type: DataType) {
        let mut part = ColumnPart::new(data_type.clone());
        if self.data.is_empty() && self.num_of_defaults_in_prefix > 0 {
            part.push_many_defaults(self.num_of_defaults_in_prefix);
            self.num_of_defaults_in_prefix = 0;
        }
        self.data.push(part);
        self.least_common_type = LeastCommonType::new(data_type);
    }

    pub fn insert_default(&mut self) {
        self.insert_many_defaults(1);
    }

    pub fn insert_many_defaults(&mut self, length: usize) {
        match self.data.last_mut() {
            None => self.num_of_defaults_in_prefix += length,
            Some(part) => part.push_many_defaults(length),
        }
    }

    /// Part-by-part range copy from `src`, promoting this subcolumn to the
    /// least common supertype of both sides first.
    pub fn insert_range_from(&mut self, src: &Subcolumn, start: usize, length: usize) -> Result<()> {
        if start + length > src.size() {
            return Err(Error::InvalidArgumentError(format!(
                "range [{start}, {}) is out of bounds for a subcolumn of {} rows",
                start + length,
                src.size()
            )));
        }

        let mut src_type = src.least_common_type.get().clone();
        if self.is_nullable {
            src_type = src_type.wrap_nullable();
        }
        if self.data.is_empty() {
            if !src_type.is_nothing() {
                self.add_new_column_part(src_type.clone());
            }
        } else if self.least_common_type.get() != &src_type && !src_type.is_nothing() {
            let joined = least_common_supertype(self.least_common_type.get(), &src_type)?;
            if &joined != self.least_common_type.get() {
                self.add_new_column_part(joined);
            }
        }

        let end = start + length;
        if end <= src.num_of_defaults_in_prefix {
            self.insert_many_defaults(length);
            return Ok(());
        }
        if start < src.num_of_defaults_in_prefix {
            self.insert_many_defaults(src.num_of_defaults_in_prefix - start);
        }

        let range_start = start.max(src.num_of_defaults_in_prefix);
        let mut pos = src.num_of_defaults_in_prefix;
        for part in &src.data {
            let part_end = pos + part.len();
            if part_end <= range_start {
                pos = part_end;
                continue;
            }
            if pos >= end {
                break;
            }
            let from = range_start.max(pos) - pos;
            let to = end.min(part_end) - pos;
            self.append_part_range(part, from, to - from)?;
            pos = part_end;
        }
        Ok(())
    }

    fn append_part_range(&mut self, part: &ColumnPart, from: usize, len: usize) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        if self.data.is_empty() {
            // Source rows are all nulls of a Nothing-typed part.
            self.insert_many_defaults(len);
            return Ok(());
        }
        let target_type = self.least_common_type.get().clone();
        let target = self
            .data
            .last_mut()
            .ok_or_else(|| Error::Internal("range copy reached a subcolumn with no part".to_string()))?;
        if target.data_type() == part.data_type() {
            target.extend_from(part, from, len)
        } else {
            for index in from..from + len {
                let field = cast_field(&part.get(index), &target_type)?;
                target.push(&field)?;
            }
            Ok(())
        }
    }

    /// Logically truncates by `n` rows, peeling tail parts and then the
    /// default prefix. Fully drained parts are dropped; the least common
    /// type keeps the full promotion history.
    pub fn pop_back(&mut self, n: usize) {
        debug_assert!(n <= self.size());
        let mut remaining = n;
        let mut num_removed = 0;
        for part in self.data.iter_mut().rev() {
            if remaining == 0 {
                break;
            }
            let len = part.len();
            if remaining < len {
                part.pop(remaining);
                remaining = 0;
            } else {
                num_removed += 1;
                remaining -= len;
            }
        }
        self.data.truncate(self.data.len() - num_removed);
        self.num_of_defaults_in_prefix -= remaining.min(self.num_of_defaults_in_prefix);
    }

    /// The last stored row, or `Null` when the subcolumn is empty or ends in
    /// a symbolic default.
    pub fn get_last_field(&self) -> Field {
        match self.data.last() {
            Some(part) if !part.is_empty() => part.get(part.len() - 1),
            _ => Field::Null,
        }
    }

    /// The row at `index`, reconstructed from whichever part holds it.
    pub fn field_at(&self, index: usize) -> Field {
        debug_assert!(index < self.size());
        if index < self.num_of_defaults_in_prefix {
            return Field::default_for(self.least_common_type.get());
        }
        let mut pos = self.num_of_defaults_in_prefix;
        for part in &self.data {
            if index < pos + part.len() {
                return part.get(index - pos);
            }
            pos += part.len();
        }
        Field::Null
    }

    /// Collapses every part into a single part of the least common type.
    /// Idempotent; errors only on internal coercion bugs.
    pub fn finalize(&mut self) -> Result<()> {
        if self.is_finalized() {
            return Ok(());
        }
        let final_type = self.least_common_type.get().clone();
        let mut merged = ColumnPart::new(final_type.clone());
        merged.push_many_defaults(self.num_of_defaults_in_prefix);
        for part in &self.data {
            if part.data_type() == &final_type {
                merged.extend_from(part, 0, part.len())?;
            } else {
                for index in 0..part.len() {
                    let field = cast_field(&part.get(index), &final_type)
                        .map_err(|e| Error::Internal(format!("finalize coercion failed: {e}")))?;
                    merged.push(&field)?;
                }
            }
        }
        self.data = vec![merged];
        self.num_of_defaults_in_prefix = 0;
        Ok(())
    }

    /// A subcolumn of the same row count with every scalar replaced by the
    /// default of `info.scalar_type`, keeping the array sizes of this one.
    /// Used to materialize sibling nested arrays with matching offsets.
    pub fn recreate_with_default_values(&self, info: &FieldInfo) -> Result<Subcolumn> {
        let mut base = info.scalar_type.clone();
        if self.is_nullable {
            base = base.wrap_nullable();
        }
        let new_type = DataType::array_of(base, self.least_common_type.num_dimensions());

        let mut result = Subcolumn::new(self.is_nullable);
        result.num_of_defaults_in_prefix = self.num_of_defaults_in_prefix;
        if !self.data.is_empty() {
            let mut part = ColumnPart::new(new_type.clone());
            for src_part in &self.data {
                for index in 0..src_part.len() {
                    part.push(&defaults_with_shape(&src_part.get(index), &new_type))?;
                }
            }
            result.data.push(part);
            result.least_common_type = LeastCommonType::new(new_type);
        }
        Ok(result)
    }

    /// Validates the part invariants: strictly ascending part types, the
    /// least common type at or above the newest part, and nullable bases
    /// everywhere when the subcolumn is nullable.
    pub fn check_types(&self) -> Result<()> {
        for pair in self.data.windows(2) {
            let (prev, next) = (pair[0].data_type(), pair[1].data_type());
            if prev == next {
                return Err(Error::Internal(format!(
                    "consecutive parts share the type {prev}"
                )));
            }
            let joined = least_common_supertype(prev, next)?;
            if &joined != next {
                return Err(Error::Internal(format!(
                    "part type {next} is not a supertype of its predecessor {prev}"
                )));
            }
        }
        if let Some(last) = self.data.last() {
            let joined = least_common_supertype(last.data_type(), self.least_common_type.get())?;
            if &joined != self.least_common_type.get() {
                return Err(Error::Internal(format!(
                    "least common type {} is below the newest part type {}",
                    self.least_common_type.get(),
                    last.data_type()
                )));
            }
        }
        if self.is_nullable {
            for part in &self.data {
                let base = part.data_type().base_type();
                if !base.is_nullable() && !matches!(base, DataType::Nothing) {
                    return Err(Error::Internal(format!(
                        "nullable subcolumn holds a part with non-nullable base {base}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Rebuilds `field` with the array structure intact and every scalar leaf
/// replaced by the default of the target's base type.
fn defaults_with_shape(field: &Field, dtype: &DataType) -> Field {
    match (field, dtype) {
        (Field::Array(items), DataType::Array(inner)) => Field::Array(
            items
                .iter()
                .map(|item| defaults_with_shape(item, inner))
                .collect(),
        ),
        (_, dtype) => Field::default_for(dtype),
    }
}
