//! Materializes a finalized object column into a rigid Arrow tuple.
//!
//! Downstream the engine works on fixed columns; this module is the seam
//! that turns one dense part per path into one Arrow array per path and
//! bundles them as a [`RecordBatch`] whose fields are named by dotted paths.

use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanArray, Date32Array, Decimal128Array, Float32Array, Float64Array, Int16Array,
    Int32Array, Int64Array, Int8Array, ListArray, NullArray, StringArray, TimestampSecondArray,
    UInt16Array, UInt32Array, UInt64Array, UInt8Array,
};
use arrow::buffer::OffsetBuffer;
use arrow::datatypes::{Field as ArrowField, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use varcol_result::{Error, Result};
use varcol_types::DataType;

use crate::object::ObjectColumn;
use crate::part::{ColumnPart, PartData};
use crate::subcolumn::Subcolumn;

/// Converts a finalized subcolumn into one dense Arrow array.
pub fn subcolumn_to_arrow(subcolumn: &Subcolumn) -> Result<ArrayRef> {
    let part = subcolumn.finalized_part().ok_or_else(|| {
        Error::InvalidArgumentError(
            "subcolumn must be finalized before Arrow materialization".to_string(),
        )
    })?;
    part_to_arrow(part)
}

/// Converts an entire finalized object column into a record batch with one
/// field per path, in key iteration order.
pub fn to_record_batch(object: &ObjectColumn) -> Result<RecordBatch> {
    if !object.is_finalized() {
        return Err(Error::InvalidArgumentError(
            "object column must be finalized before tuple conversion".to_string(),
        ));
    }
    let leaves = object.subcolumns().leaves();
    if leaves.is_empty() {
        let options = RecordBatchOptions::new().with_row_count(Some(object.size()));
        return RecordBatch::try_new_with_options(Arc::new(Schema::empty()), Vec::new(), &options)
            .map_err(Error::from);
    }
    let mut fields = Vec::with_capacity(leaves.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(leaves.len());
    for (path, subcolumn) in leaves {
        let array = subcolumn_to_arrow(subcolumn)?;
        let nullable = is_arrow_nullable(subcolumn.least_common_type().base());
        fields.push(ArrowField::new(
            path.to_string(),
            array.data_type().clone(),
            nullable,
        ));
        arrays.push(array);
    }
    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).map_err(Error::from)
}

fn is_arrow_nullable(base: &DataType) -> bool {
    base.is_nullable() || base.is_nothing()
}

fn part_to_arrow(part: &ColumnPart) -> Result<ArrayRef> {
    build_array(part.data_type(), part.storage())
}

fn build_array(dtype: &DataType, data: &PartData) -> Result<ArrayRef> {
    match data {
        PartData::Nothing { len } => Ok(Arc::new(NullArray::new(*len))),
        PartData::Bool { values, validity } => {
            Ok(Arc::new(BooleanArray::from(zip_validity(values, validity))))
        }
        PartData::Int { values, validity } => {
            let array: ArrayRef = match dtype.strip_nullable() {
                DataType::Int8 => Arc::new(Int8Array::from(
                    map_validity(values, validity, |v| v as i8),
                )),
                DataType::Int16 => Arc::new(Int16Array::from(
                    map_validity(values, validity, |v| v as i16),
                )),
                DataType::Int32 => Arc::new(Int32Array::from(
                    map_validity(values, validity, |v| v as i32),
                )),
                DataType::Date => Arc::new(Date32Array::from(
                    map_validity(values, validity, |v| v as i32),
                )),
                DataType::DateTime => {
                    Arc::new(TimestampSecondArray::from(zip_validity(values, validity)))
                }
                _ => Arc::new(Int64Array::from(zip_validity(values, validity))),
            };
            Ok(array)
        }
        PartData::UInt { values, validity } => {
            let array: ArrayRef = match dtype.strip_nullable() {
                DataType::UInt8 => Arc::new(UInt8Array::from(
                    map_validity(values, validity, |v| v as u8),
                )),
                DataType::UInt16 => Arc::new(UInt16Array::from(
                    map_validity(values, validity, |v| v as u16),
                )),
                DataType::UInt32 => Arc::new(UInt32Array::from(
                    map_validity(values, validity, |v| v as u32),
                )),
                _ => Arc::new(UInt64Array::from(zip_validity(values, validity))),
            };
            Ok(array)
        }
        PartData::Float { values, validity } => {
            let array: ArrayRef = match dtype.strip_nullable() {
                DataType::Float32 => Arc::new(Float32Array::from(
                    map_validity(values, validity, |v| v as f32),
                )),
                _ => Arc::new(Float64Array::from(zip_validity(values, validity))),
            };
            Ok(array)
        }
        PartData::Decimal { values, validity } => {
            let scale = match dtype.strip_nullable() {
                DataType::Decimal128 { scale } => *scale,
                _ => 0,
            };
            let array = Decimal128Array::from(zip_validity(values, validity))
                .with_precision_and_scale(38, scale as i8)?;
            Ok(Arc::new(array))
        }
        PartData::Utf8 {
            offsets,
            bytes,
            validity,
        } => {
            let strings: Vec<Option<&str>> = (0..offsets.len() - 1)
                .map(|i| {
                    if validity.as_ref().is_some_and(|v| !v[i]) {
                        None
                    } else {
                        std::str::from_utf8(&bytes[offsets[i] as usize..offsets[i + 1] as usize])
                            .ok()
                    }
                })
                .collect();
            Ok(Arc::new(StringArray::from(strings)))
        }
        PartData::List { offsets, values } => {
            let inner = match dtype.strip_nullable() {
                DataType::Array(inner) => inner.as_ref(),
                other => other,
            };
            let child = build_array(inner, values)?;
            let item = Arc::new(ArrowField::new(
                "item",
                child.data_type().clone(),
                is_arrow_nullable(inner.base_type()),
            ));
            let lengths = offsets
                .windows(2)
                .map(|pair| (pair[1] - pair[0]) as usize)
                .collect::<Vec<_>>();
            let list = ListArray::try_new(item, OffsetBuffer::from_lengths(lengths), child, None)?;
            Ok(Arc::new(list))
        }
    }
}

fn zip_validity<T: Copy>(values: &[T], validity: &Option<Vec<bool>>) -> Vec<Option<T>> {
    map_validity(values, validity, |v| v)
}

fn map_validity<T: Copy, U>(
    values: &[T],
    validity: &Option<Vec<bool>>,
    mut convert: impl FnMut(T) -> U,
) -> Vec<Option<U>> {
    values
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            if validity.as_ref().is_some_and(|v| !v[i]) {
                None
            } else {
                Some(convert(value))
            }
        })
        .collect()
}
