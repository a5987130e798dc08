//! Dense typed storage for one part of a subcolumn.
//!
//! A part couples a full logical [`DataType`] with physical buffers. Narrow
//! integer widths share the wide signed/unsigned buffers (the logical type
//! keeps the width; coercion has already range-checked the values), strings
//! are offset+byte encoded, arrays are flattened behind list offsets, and a
//! validity vector is present exactly when the base scalar is nullable.

use std::mem;

use varcol_result::{Error, Result};
use varcol_types::{DataType, Field};

/// One dense, uniformly-typed vector inside a subcolumn.
#[derive(Debug, Clone)]
pub struct ColumnPart {
    data_type: DataType,
    data: PartData,
}

#[derive(Debug, Clone)]
pub(crate) enum PartData {
    /// Storage for `Nothing` columns: every row is null, only a length.
    Nothing { len: usize },
    Bool {
        values: Vec<bool>,
        validity: Option<Vec<bool>>,
    },
    /// Signed integers of any width, plus `Date` and `DateTime`.
    Int {
        values: Vec<i64>,
        validity: Option<Vec<bool>>,
    },
    UInt {
        values: Vec<u64>,
        validity: Option<Vec<bool>>,
    },
    Float {
        values: Vec<f64>,
        validity: Option<Vec<bool>>,
    },
    Decimal {
        values: Vec<i128>,
        validity: Option<Vec<bool>>,
    },
    Utf8 {
        offsets: Vec<u32>,
        bytes: Vec<u8>,
        validity: Option<Vec<bool>>,
    },
    List {
        offsets: Vec<u32>,
        values: Box<PartData>,
    },
}

impl PartData {
    fn new_for(dtype: &DataType) -> PartData {
        let (stripped, nullable) = match dtype {
            DataType::Nullable(inner) => (inner.as_ref(), true),
            other => (other, false),
        };
        let validity = || if nullable { Some(Vec::new()) } else { None };
        match stripped {
            DataType::Nothing => PartData::Nothing { len: 0 },
            DataType::Bool => PartData::Bool {
                values: Vec::new(),
                validity: validity(),
            },
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::Date
            | DataType::DateTime => PartData::Int {
                values: Vec::new(),
                validity: validity(),
            },
            DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
                PartData::UInt {
                    values: Vec::new(),
                    validity: validity(),
                }
            }
            DataType::Float32 | DataType::Float64 => PartData::Float {
                values: Vec::new(),
                validity: validity(),
            },
            DataType::Decimal128 { .. } => PartData::Decimal {
                values: Vec::new(),
                validity: validity(),
            },
            DataType::String => PartData::Utf8 {
                offsets: vec![0],
                bytes: Vec::new(),
                validity: validity(),
            },
            DataType::Array(inner) => PartData::List {
                offsets: vec![0],
                values: Box::new(PartData::new_for(inner)),
            },
            DataType::Nullable(_) => PartData::Nothing { len: 0 },
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            PartData::Nothing { len } => *len,
            PartData::Bool { values, .. } => values.len(),
            PartData::Int { values, .. } => values.len(),
            PartData::UInt { values, .. } => values.len(),
            PartData::Float { values, .. } => values.len(),
            PartData::Decimal { values, .. } => values.len(),
            PartData::Utf8 { offsets, .. } | PartData::List { offsets, .. } => offsets.len() - 1,
        }
    }

    fn push(&mut self, field: &Field) -> Result<()> {
        match self {
            PartData::Nothing { len } => match field {
                Field::Null => {
                    *len += 1;
                    Ok(())
                }
                other => Err(type_error("Nothing", other)),
            },
            PartData::Bool { values, validity } => match field {
                Field::Bool(v) => {
                    values.push(*v);
                    push_valid(validity);
                    Ok(())
                }
                Field::Null => {
                    values.push(false);
                    push_null(validity);
                    Ok(())
                }
                other => Err(type_error("Bool", other)),
            },
            PartData::Int { values, validity } => match field {
                Field::Int64(v) => {
                    values.push(*v);
                    push_valid(validity);
                    Ok(())
                }
                Field::Date(v) => {
                    values.push(*v as i64);
                    push_valid(validity);
                    Ok(())
                }
                Field::DateTime(v) => {
                    values.push(*v);
                    push_valid(validity);
                    Ok(())
                }
                Field::Null => {
                    values.push(0);
                    push_null(validity);
                    Ok(())
                }
                other => Err(type_error("Int", other)),
            },
            PartData::UInt { values, validity } => match field {
                Field::UInt64(v) => {
                    values.push(*v);
                    push_valid(validity);
                    Ok(())
                }
                Field::Null => {
                    values.push(0);
                    push_null(validity);
                    Ok(())
                }
                other => Err(type_error("UInt", other)),
            },
            PartData::Float { values, validity } => match field {
                Field::Float64(v) => {
                    values.push(*v);
                    push_valid(validity);
                    Ok(())
                }
                Field::Null => {
                    values.push(0.0);
                    push_null(validity);
                    Ok(())
                }
                other => Err(type_error("Float", other)),
            },
            PartData::Decimal { values, validity } => match field {
                Field::Decimal128 { value, .. } => {
                    values.push(*value);
                    push_valid(validity);
                    Ok(())
                }
                Field::Null => {
                    values.push(0);
                    push_null(validity);
                    Ok(())
                }
                other => Err(type_error("Decimal", other)),
            },
            PartData::Utf8 {
                offsets,
                bytes,
                validity,
            } => match field {
                Field::String(s) => {
                    bytes.extend_from_slice(s.as_bytes());
                    offsets.push(bytes.len() as u32);
                    push_valid(validity);
                    Ok(())
                }
                Field::Null => {
                    offsets.push(bytes.len() as u32);
                    push_null(validity);
                    Ok(())
                }
                other => Err(type_error("String", other)),
            },
            PartData::List { offsets, values } => match field {
                Field::Array(items) => {
                    for item in items {
                        values.push(item)?;
                    }
                    offsets.push(values.len() as u32);
                    Ok(())
                }
                // A null at array rank stores the default, an empty array.
                Field::Null => {
                    offsets.push(values.len() as u32);
                    Ok(())
                }
                other => Err(type_error("Array", other)),
            },
        }
    }

    fn push_default(&mut self) {
        match self {
            PartData::Nothing { len } => *len += 1,
            PartData::Bool { values, validity } => {
                values.push(false);
                push_default_validity(validity);
            }
            PartData::Int { values, validity } => {
                values.push(0);
                push_default_validity(validity);
            }
            PartData::UInt { values, validity } => {
                values.push(0);
                push_default_validity(validity);
            }
            PartData::Float { values, validity } => {
                values.push(0.0);
                push_default_validity(validity);
            }
            PartData::Decimal { values, validity } => {
                values.push(0);
                push_default_validity(validity);
            }
            PartData::Utf8 {
                offsets,
                bytes,
                validity,
            } => {
                offsets.push(bytes.len() as u32);
                push_default_validity(validity);
            }
            PartData::List { offsets, values } => {
                offsets.push(values.len() as u32);
            }
        }
    }

    fn pop(&mut self, n: usize) {
        match self {
            PartData::Nothing { len } => *len -= n.min(*len),
            PartData::Bool { values, validity } => {
                values.truncate(values.len() - n);
                truncate_validity(validity, n);
            }
            PartData::Int { values, validity } => {
                values.truncate(values.len() - n);
                truncate_validity(validity, n);
            }
            PartData::UInt { values, validity } => {
                values.truncate(values.len() - n);
                truncate_validity(validity, n);
            }
            PartData::Float { values, validity } => {
                values.truncate(values.len() - n);
                truncate_validity(validity, n);
            }
            PartData::Decimal { values, validity } => {
                values.truncate(values.len() - n);
                truncate_validity(validity, n);
            }
            PartData::Utf8 {
                offsets,
                bytes,
                validity,
            } => {
                let new_len = offsets.len() - 1 - n;
                bytes.truncate(offsets[new_len] as usize);
                offsets.truncate(new_len + 1);
                truncate_validity(validity, n);
            }
            PartData::List { offsets, values } => {
                let new_len = offsets.len() - 1 - n;
                let keep = offsets[new_len] as usize;
                let child_len = values.len();
                offsets.truncate(new_len + 1);
                values.pop(child_len - keep);
            }
        }
    }

    fn get(&self, dtype: &DataType, index: usize) -> Field {
        match self {
            PartData::Nothing { .. } => Field::Null,
            PartData::Bool { values, validity } => {
                if is_null_at(validity, index) {
                    Field::Null
                } else {
                    Field::Bool(values[index])
                }
            }
            PartData::Int { values, validity } => {
                if is_null_at(validity, index) {
                    return Field::Null;
                }
                match dtype.strip_nullable() {
                    DataType::Date => Field::Date(values[index] as i32),
                    DataType::DateTime => Field::DateTime(values[index]),
                    _ => Field::Int64(values[index]),
                }
            }
            PartData::UInt { values, validity } => {
                if is_null_at(validity, index) {
                    Field::Null
                } else {
                    Field::UInt64(values[index])
                }
            }
            PartData::Float { values, validity } => {
                if is_null_at(validity, index) {
                    Field::Null
                } else {
                    Field::Float64(values[index])
                }
            }
            PartData::Decimal { values, validity } => {
                if is_null_at(validity, index) {
                    return Field::Null;
                }
                let scale = match dtype.strip_nullable() {
                    DataType::Decimal128 { scale } => *scale,
                    _ => 0,
                };
                Field::Decimal128 {
                    value: values[index],
                    scale,
                }
            }
            PartData::Utf8 {
                offsets,
                bytes,
                validity,
            } => {
                if is_null_at(validity, index) {
                    return Field::Null;
                }
                let range = offsets[index] as usize..offsets[index + 1] as usize;
                Field::String(String::from_utf8_lossy(&bytes[range]).into_owned())
            }
            PartData::List { offsets, values } => {
                let inner = match dtype {
                    DataType::Array(inner) => inner.as_ref(),
                    other => other,
                };
                let items = (offsets[index] as usize..offsets[index + 1] as usize)
                    .map(|i| values.get(inner, i))
                    .collect();
                Field::Array(items)
            }
        }
    }

    fn extend_from(&mut self, other: &PartData, start: usize, len: usize) -> Result<()> {
        match (self, other) {
            (PartData::Nothing { len: this }, PartData::Nothing { .. }) => {
                *this += len;
                Ok(())
            }
            (
                PartData::Bool { values, validity },
                PartData::Bool {
                    values: src,
                    validity: src_validity,
                },
            ) => {
                values.extend_from_slice(&src[start..start + len]);
                extend_validity(validity, src_validity, start, len)
            }
            (
                PartData::Int { values, validity },
                PartData::Int {
                    values: src,
                    validity: src_validity,
                },
            ) => {
                values.extend_from_slice(&src[start..start + len]);
                extend_validity(validity, src_validity, start, len)
            }
            (
                PartData::UInt { values, validity },
                PartData::UInt {
                    values: src,
                    validity: src_validity,
                },
            ) => {
                values.extend_from_slice(&src[start..start + len]);
                extend_validity(validity, src_validity, start, len)
            }
            (
                PartData::Float { values, validity },
                PartData::Float {
                    values: src,
                    validity: src_validity,
                },
            ) => {
                values.extend_from_slice(&src[start..start + len]);
                extend_validity(validity, src_validity, start, len)
            }
            (
                PartData::Decimal { values, validity },
                PartData::Decimal {
                    values: src,
                    validity: src_validity,
                },
            ) => {
                values.extend_from_slice(&src[start..start + len]);
                extend_validity(validity, src_validity, start, len)
            }
            (
                PartData::Utf8 {
                    offsets,
                    bytes,
                    validity,
                },
                PartData::Utf8 {
                    offsets: src_offsets,
                    bytes: src_bytes,
                    validity: src_validity,
                },
            ) => {
                let lo = src_offsets[start];
                let hi = src_offsets[start + len];
                let base = bytes.len() as u32;
                bytes.extend_from_slice(&src_bytes[lo as usize..hi as usize]);
                for offset in &src_offsets[start + 1..=start + len] {
                    offsets.push(offset - lo + base);
                }
                extend_validity(validity, src_validity, start, len)
            }
            (
                PartData::List { offsets, values },
                PartData::List {
                    offsets: src_offsets,
                    values: src_values,
                },
            ) => {
                let lo = src_offsets[start];
                let hi = src_offsets[start + len];
                let base = values.len() as u32;
                for offset in &src_offsets[start + 1..=start + len] {
                    offsets.push(offset - lo + base);
                }
                values.extend_from(src_values, lo as usize, (hi - lo) as usize)
            }
            _ => Err(Error::Internal(
                "part storage layouts diverge for identical types".to_string(),
            )),
        }
    }

    fn byte_size(&self) -> usize {
        match self {
            PartData::Nothing { .. } => 0,
            PartData::Bool { values, validity } => values.len() + validity_bytes(validity),
            PartData::Int { values, validity } => values.len() * 8 + validity_bytes(validity),
            PartData::UInt { values, validity } => values.len() * 8 + validity_bytes(validity),
            PartData::Float { values, validity } => values.len() * 8 + validity_bytes(validity),
            PartData::Decimal { values, validity } => values.len() * 16 + validity_bytes(validity),
            PartData::Utf8 {
                offsets,
                bytes,
                validity,
            } => offsets.len() * 4 + bytes.len() + validity_bytes(validity),
            PartData::List { offsets, values } => offsets.len() * 4 + values.byte_size(),
        }
    }

    fn allocated_bytes(&self) -> usize {
        match self {
            PartData::Nothing { .. } => 0,
            PartData::Bool { values, validity } => {
                values.capacity() + validity_capacity(validity)
            }
            PartData::Int { values, validity } => {
                values.capacity() * 8 + validity_capacity(validity)
            }
            PartData::UInt { values, validity } => {
                values.capacity() * 8 + validity_capacity(validity)
            }
            PartData::Float { values, validity } => {
                values.capacity() * 8 + validity_capacity(validity)
            }
            PartData::Decimal { values, validity } => {
                values.capacity() * 16 + validity_capacity(validity)
            }
            PartData::Utf8 {
                offsets,
                bytes,
                validity,
            } => offsets.capacity() * 4 + bytes.capacity() + validity_capacity(validity),
            PartData::List { offsets, values } => {
                offsets.capacity() * 4 + values.allocated_bytes()
            }
        }
    }
}

fn type_error(storage: &str, field: &Field) -> Error {
    Error::Internal(format!(
        "field {field} reached {storage} storage without coercion"
    ))
}

fn push_valid(validity: &mut Option<Vec<bool>>) {
    if let Some(validity) = validity {
        validity.push(true);
    }
}

fn push_null(validity: &mut Option<Vec<bool>>) {
    if let Some(validity) = validity {
        validity.push(false);
    }
}

fn push_default_validity(validity: &mut Option<Vec<bool>>) {
    // The default of a nullable column is null.
    if let Some(validity) = validity {
        validity.push(false);
    }
}

fn truncate_validity(validity: &mut Option<Vec<bool>>, n: usize) {
    if let Some(validity) = validity {
        validity.truncate(validity.len() - n);
    }
}

fn extend_validity(
    validity: &mut Option<Vec<bool>>,
    src: &Option<Vec<bool>>,
    start: usize,
    len: usize,
) -> Result<()> {
    match (validity, src) {
        (None, None) => Ok(()),
        (Some(validity), Some(src)) => {
            validity.extend_from_slice(&src[start..start + len]);
            Ok(())
        }
        (Some(validity), None) => {
            validity.extend(std::iter::repeat(true).take(len));
            Ok(())
        }
        (None, Some(src)) => {
            if src[start..start + len].iter().all(|valid| *valid) {
                Ok(())
            } else {
                Err(Error::Internal(
                    "null values cannot be copied into a non-nullable part".to_string(),
                ))
            }
        }
    }
}

fn is_null_at(validity: &Option<Vec<bool>>, index: usize) -> bool {
    validity.as_ref().is_some_and(|validity| !validity[index])
}

fn validity_bytes(validity: &Option<Vec<bool>>) -> usize {
    validity.as_ref().map_or(0, |v| v.len())
}

fn validity_capacity(validity: &Option<Vec<bool>>) -> usize {
    validity.as_ref().map_or(0, |v| v.capacity())
}

impl ColumnPart {
    pub fn new(data_type: DataType) -> Self {
        let data = PartData::new_for(&data_type);
        Self { data_type, data }
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a value already coerced to this part's type. A mismatch is an
    /// internal error, not a user-facing one.
    pub fn push(&mut self, field: &Field) -> Result<()> {
        self.data.push(field)
    }

    pub fn push_default(&mut self) {
        self.data.push_default();
    }

    pub fn push_many_defaults(&mut self, n: usize) {
        for _ in 0..n {
            self.data.push_default();
        }
    }

    pub fn pop(&mut self, n: usize) {
        debug_assert!(n <= self.len());
        self.data.pop(n);
    }

    pub fn get(&self, index: usize) -> Field {
        debug_assert!(index < self.len());
        self.data.get(&self.data_type, index)
    }

    /// Appends `len` rows of `other` starting at `start`. Both parts must
    /// have the same data type; callers cast row-by-row otherwise.
    pub fn extend_from(&mut self, other: &ColumnPart, start: usize, len: usize) -> Result<()> {
        debug_assert_eq!(self.data_type, other.data_type);
        self.data.extend_from(&other.data, start, len)
    }

    pub fn byte_size(&self) -> usize {
        self.data.byte_size()
    }

    pub fn allocated_bytes(&self) -> usize {
        mem::size_of::<Self>() + self.data.allocated_bytes()
    }

    pub(crate) fn storage(&self) -> &PartData {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_round_trip() {
        let mut part = ColumnPart::new(DataType::Int64);
        part.push(&Field::Int64(1)).unwrap();
        part.push(&Field::Int64(2)).unwrap();
        part.push_default();
        assert_eq!(part.len(), 3);
        assert_eq!(part.get(0), Field::Int64(1));
        assert_eq!(part.get(2), Field::Int64(0));
        part.pop(2);
        assert_eq!(part.len(), 1);
        assert_eq!(part.get(0), Field::Int64(1));
    }

    #[test]
    fn nullable_defaults_are_null() {
        let mut part = ColumnPart::new(DataType::String.wrap_nullable());
        part.push(&Field::String("x".to_string())).unwrap();
        part.push_default();
        part.push(&Field::Null).unwrap();
        assert_eq!(part.get(0), Field::String("x".to_string()));
        assert_eq!(part.get(1), Field::Null);
        assert_eq!(part.get(2), Field::Null);
    }

    #[test]
    fn nested_lists_round_trip() {
        let dtype = DataType::array_of(DataType::Int64, 2);
        let mut part = ColumnPart::new(dtype);
        let row = Field::Array(vec![
            Field::Array(vec![Field::Int64(1), Field::Int64(2)]),
            Field::Array(vec![Field::Int64(3)]),
        ]);
        part.push(&row).unwrap();
        part.push_default();
        assert_eq!(part.len(), 2);
        assert_eq!(part.get(0), row);
        assert_eq!(part.get(1), Field::Array(Vec::new()));
        part.pop(1);
        assert_eq!(part.get(0), row);
    }

    #[test]
    fn string_range_copy_rebases_offsets() {
        let mut src = ColumnPart::new(DataType::String);
        for s in ["aa", "b", "ccc", "dd"] {
            src.push(&Field::String(s.to_string())).unwrap();
        }
        let mut dst = ColumnPart::new(DataType::String);
        dst.push(&Field::String("zz".to_string())).unwrap();
        dst.extend_from(&src, 1, 2).unwrap();
        assert_eq!(dst.len(), 3);
        assert_eq!(dst.get(1), Field::String("b".to_string()));
        assert_eq!(dst.get(2), Field::String("ccc".to_string()));
    }

    #[test]
    fn list_range_copy_rebases_child() {
        let dtype = DataType::array_of(DataType::Int64, 1);
        let mut src = ColumnPart::new(dtype.clone());
        src.push(&Field::Array(vec![Field::Int64(1)])).unwrap();
        src.push(&Field::Array(vec![Field::Int64(2), Field::Int64(3)]))
            .unwrap();
        src.push(&Field::Array(Vec::new())).unwrap();
        let mut dst = ColumnPart::new(dtype);
        dst.extend_from(&src, 1, 2).unwrap();
        assert_eq!(dst.len(), 2);
        assert_eq!(
            dst.get(0),
            Field::Array(vec![Field::Int64(2), Field::Int64(3)])
        );
        assert_eq!(dst.get(1), Field::Array(Vec::new()));
    }
}
