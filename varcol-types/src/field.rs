//! Runtime-tagged values, their decomposed summaries, and value coercion.

use std::fmt;

use varcol_result::{Error, Result};

use crate::data_type::DataType;
use crate::supertype::least_common_supertype;

/// A runtime-tagged value as produced by a document parser.
///
/// Numeric scalars carry the widest native representation of their class;
/// narrower column widths (`Int8`, `UInt16`, ...) exist only as column types
/// and are range-checked during coercion. `Object` is the document shape
/// accepted by row-level inserts; it never appears below an `Array`.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Null,
    Bool(bool),
    Int64(i64),
    UInt64(u64),
    Float64(f64),
    Decimal128 { value: i128, scale: u8 },
    /// Days since the Unix epoch.
    Date(i32),
    /// Seconds since the Unix epoch.
    DateTime(i64),
    String(String),
    Array(Vec<Field>),
    Object(Vec<(String, Field)>),
}

impl Field {
    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }

    /// The concrete scalar type of this value, `None` for arrays and objects.
    /// `Null` reports [`DataType::Nothing`].
    pub fn scalar_type(&self) -> Option<DataType> {
        match self {
            Field::Null => Some(DataType::Nothing),
            Field::Bool(_) => Some(DataType::Bool),
            Field::Int64(_) => Some(DataType::Int64),
            Field::UInt64(_) => Some(DataType::UInt64),
            Field::Float64(_) => Some(DataType::Float64),
            Field::Decimal128 { scale, .. } => Some(DataType::Decimal128 { scale: *scale }),
            Field::Date(_) => Some(DataType::Date),
            Field::DateTime(_) => Some(DataType::DateTime),
            Field::String(_) => Some(DataType::String),
            Field::Array(_) | Field::Object(_) => None,
        }
    }

    /// The default value of a type: `Null` for nullable types and `Nothing`,
    /// zero/empty for everything else.
    pub fn default_for(dtype: &DataType) -> Field {
        match dtype {
            DataType::Nothing | DataType::Nullable(_) => Field::Null,
            DataType::Bool => Field::Bool(false),
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
                Field::Int64(0)
            }
            DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
                Field::UInt64(0)
            }
            DataType::Float32 | DataType::Float64 => Field::Float64(0.0),
            DataType::Decimal128 { scale } => Field::Decimal128 {
                value: 0,
                scale: *scale,
            },
            DataType::Date => Field::Date(0),
            DataType::DateTime => Field::DateTime(0),
            DataType::String => Field::String(String::new()),
            DataType::Array(_) => Field::Array(Vec::new()),
        }
    }

    /// Convenience constructor for document-shaped fields.
    pub fn object<K: Into<String>>(entries: Vec<(K, Field)>) -> Field {
        Field::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

macro_rules! impl_from_for_field {
    ($variant:ident, $($t:ty),*) => {
        $(
            impl From<$t> for Field {
                fn from(v: $t) -> Self {
                    Field::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_for_field!(Int64, i8, i16, i32, i64);
impl_from_for_field!(UInt64, u8, u16, u32, u64);
impl_from_for_field!(Float64, f32, f64);
impl_from_for_field!(Bool, bool);
impl_from_for_field!(String, String);

impl From<&str> for Field {
    fn from(v: &str) -> Self {
        Field::String(v.to_string())
    }
}

impl From<Vec<Field>> for Field {
    fn from(v: Vec<Field>) -> Self {
        Field::Array(v)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Null => write!(f, "NULL"),
            Field::Bool(v) => write!(f, "{v}"),
            Field::Int64(v) => write!(f, "{v}"),
            Field::UInt64(v) => write!(f, "{v}"),
            Field::Float64(v) => write!(f, "{v}"),
            Field::Decimal128 { value, scale } => {
                write!(f, "{}", decimal_to_string(*value, *scale))
            }
            Field::Date(days) => write!(f, "{}", date_to_string(*days)),
            Field::DateTime(secs) => write!(f, "{}", datetime_to_string(*secs)),
            Field::String(v) => write!(f, "'{v}'"),
            Field::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Field::Object(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Decomposed summary of a [`Field`], consulted before every insert.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    /// Least common scalar type across all leaf scalars; `Nothing` if every
    /// leaf was null.
    pub scalar_type: DataType,
    /// True iff any leaf scalar was `Null`.
    pub have_nulls: bool,
    /// True iff more than one concrete leaf type was seen, so values must be
    /// converted to the common type before dense storage.
    pub need_convert: bool,
    /// Array rank: 0 for a scalar, 1 for an array of scalars, and so on.
    pub num_dimensions: usize,
}

/// Derives the [`FieldInfo`] of a value.
///
/// Fails with `InvalidArgumentError` when array nesting depth disagrees
/// between siblings (`[1, [2]]`), when leaf scalars have no common supertype,
/// or when an object is nested below an array.
pub fn get_field_info(field: &Field) -> Result<FieldInfo> {
    let mut visitor = ScalarVisitor {
        scalar_type: DataType::Nothing,
        have_nulls: false,
        concrete: Vec::new(),
    };
    let num_dimensions = visitor.visit(field)?;
    Ok(FieldInfo {
        scalar_type: visitor.scalar_type,
        have_nulls: visitor.have_nulls,
        need_convert: visitor.concrete.len() > 1,
        num_dimensions,
    })
}

struct ScalarVisitor {
    scalar_type: DataType,
    have_nulls: bool,
    /// Distinct concrete leaf types, in first-seen order. Stays tiny.
    concrete: Vec<DataType>,
}

impl ScalarVisitor {
    fn visit(&mut self, field: &Field) -> Result<usize> {
        match field {
            Field::Null => {
                self.have_nulls = true;
                Ok(0)
            }
            Field::Object(_) => Err(Error::InvalidArgumentError(
                "objects below the document root are not decomposed; flatten the document first"
                    .to_string(),
            )),
            Field::Array(items) => {
                let mut element_dims = None;
                for item in items {
                    let dims = self.visit(item)?;
                    if *element_dims.get_or_insert(dims) != dims {
                        return Err(Error::InvalidArgumentError(format!(
                            "array nesting depth differs between elements of {field}"
                        )));
                    }
                }
                Ok(1 + element_dims.unwrap_or(0))
            }
            scalar => {
                let dtype = scalar.scalar_type().ok_or_else(|| {
                    Error::Internal("non-scalar field variant reached the scalar visitor".to_string())
                })?;
                self.scalar_type = least_common_supertype(&self.scalar_type, &dtype)?;
                if !self.concrete.contains(&dtype) {
                    self.concrete.push(dtype);
                }
                Ok(0)
            }
        }
    }
}

/// Coerces a value along a lattice edge into `to`.
///
/// `Null` passes through unchanged; part storage decides whether it becomes
/// a stored null or the column default. Conversions that would lose meaning
/// (overflow, array into scalar, scalar into date) fail with
/// `InvalidArgumentError`.
pub fn cast_field(field: &Field, to: &DataType) -> Result<Field> {
    if field.is_null() {
        return Ok(Field::Null);
    }
    match to {
        DataType::Nullable(inner) => cast_field(field, inner),
        DataType::Array(inner) => match field {
            Field::Array(items) => items
                .iter()
                .map(|item| cast_field(item, inner))
                .collect::<Result<Vec<_>>>()
                .map(Field::Array),
            _ => Err(cast_error(field, to)),
        },
        DataType::Nothing => Err(cast_error(field, to)),
        DataType::Bool => match field {
            Field::Bool(v) => Ok(Field::Bool(*v)),
            _ => Err(cast_error(field, to)),
        },
        DataType::Int8 => cast_signed(field, to, i8::MIN as i64, i8::MAX as i64),
        DataType::Int16 => cast_signed(field, to, i16::MIN as i64, i16::MAX as i64),
        DataType::Int32 => cast_signed(field, to, i32::MIN as i64, i32::MAX as i64),
        DataType::Int64 => cast_signed(field, to, i64::MIN, i64::MAX),
        DataType::UInt8 => cast_unsigned(field, to, u8::MAX as u64),
        DataType::UInt16 => cast_unsigned(field, to, u16::MAX as u64),
        DataType::UInt32 => cast_unsigned(field, to, u32::MAX as u64),
        DataType::UInt64 => cast_unsigned(field, to, u64::MAX),
        DataType::Float32 => {
            let v = numeric_as_f64(field).ok_or_else(|| cast_error(field, to))?;
            Ok(Field::Float64((v as f32) as f64))
        }
        DataType::Float64 => {
            let v = numeric_as_f64(field).ok_or_else(|| cast_error(field, to))?;
            Ok(Field::Float64(v))
        }
        DataType::Decimal128 { scale } => cast_decimal(field, to, *scale),
        DataType::Date => match field {
            Field::Date(days) => Ok(Field::Date(*days)),
            _ => Err(cast_error(field, to)),
        },
        DataType::DateTime => match field {
            Field::DateTime(secs) => Ok(Field::DateTime(*secs)),
            Field::Date(days) => Ok(Field::DateTime(*days as i64 * 86_400)),
            _ => Err(cast_error(field, to)),
        },
        DataType::String => render_scalar(field)
            .map(Field::String)
            .ok_or_else(|| cast_error(field, to)),
    }
}

fn cast_error(field: &Field, to: &DataType) -> Error {
    Error::InvalidArgumentError(format!("cannot convert field {field} to type {to}"))
}

fn cast_signed(field: &Field, to: &DataType, min: i64, max: i64) -> Result<Field> {
    let v = match field {
        Field::Int64(v) => *v,
        Field::UInt64(v) => i64::try_from(*v).map_err(|_| cast_error(field, to))?,
        Field::Bool(b) => *b as i64,
        _ => return Err(cast_error(field, to)),
    };
    if v < min || v > max {
        return Err(cast_error(field, to));
    }
    Ok(Field::Int64(v))
}

fn cast_unsigned(field: &Field, to: &DataType, max: u64) -> Result<Field> {
    let v = match field {
        Field::UInt64(v) => *v,
        Field::Int64(v) => u64::try_from(*v).map_err(|_| cast_error(field, to))?,
        Field::Bool(b) => *b as u64,
        _ => return Err(cast_error(field, to)),
    };
    if v > max {
        return Err(cast_error(field, to));
    }
    Ok(Field::UInt64(v))
}

fn cast_decimal(field: &Field, to: &DataType, scale: u8) -> Result<Field> {
    let pow = 10i128.checked_pow(scale as u32);
    let value = match field {
        Field::Decimal128 {
            value,
            scale: from_scale,
        } => {
            if *from_scale > scale {
                return Err(cast_error(field, to));
            }
            let factor = 10i128.checked_pow((scale - from_scale) as u32);
            factor.and_then(|f| value.checked_mul(f))
        }
        Field::Int64(v) => pow.and_then(|p| (*v as i128).checked_mul(p)),
        Field::UInt64(v) => pow.and_then(|p| (*v as i128).checked_mul(p)),
        Field::Bool(b) => pow.and_then(|p| (*b as i128).checked_mul(p)),
        _ => return Err(cast_error(field, to)),
    };
    value
        .map(|value| Field::Decimal128 { value, scale })
        .ok_or_else(|| cast_error(field, to))
}

fn numeric_as_f64(field: &Field) -> Option<f64> {
    match field {
        Field::Int64(v) => Some(*v as f64),
        Field::UInt64(v) => Some(*v as f64),
        Field::Float64(v) => Some(*v),
        Field::Bool(b) => Some(*b as u8 as f64),
        Field::Decimal128 { value, scale } => {
            Some(*value as f64 / 10f64.powi(*scale as i32))
        }
        _ => None,
    }
}

fn render_scalar(field: &Field) -> Option<String> {
    match field {
        Field::String(s) => Some(s.clone()),
        Field::Bool(v) => Some(v.to_string()),
        Field::Int64(v) => Some(v.to_string()),
        Field::UInt64(v) => Some(v.to_string()),
        Field::Float64(v) => Some(v.to_string()),
        Field::Decimal128 { value, scale } => Some(decimal_to_string(*value, *scale)),
        Field::Date(days) => Some(date_to_string(*days)),
        Field::DateTime(secs) => Some(datetime_to_string(*secs)),
        Field::Null | Field::Array(_) | Field::Object(_) => None,
    }
}

fn decimal_to_string(value: i128, scale: u8) -> String {
    if scale == 0 {
        return value.to_string();
    }
    let sign = if value < 0 { "-" } else { "" };
    let abs = value.unsigned_abs();
    let pow = 10u128.pow(scale as u32);
    format!(
        "{sign}{}.{:0width$}",
        abs / pow,
        abs % pow,
        width = scale as usize
    )
}

/// Days-since-epoch to proleptic Gregorian (year, month, day).
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = (if z >= 0 { z } else { z - 146_096 }) / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let year = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    (if month <= 2 { year + 1 } else { year }, month, day)
}

fn date_to_string(days: i32) -> String {
    let (year, month, day) = civil_from_days(days as i64);
    format!("{year:04}-{month:02}-{day:02}")
}

fn datetime_to_string(secs: i64) -> String {
    let days = secs.div_euclid(86_400);
    let rem = secs.rem_euclid(86_400);
    let (year, month, day) = civil_from_days(days);
    format!(
        "{year:04}-{month:02}-{day:02} {:02}:{:02}:{:02}",
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60
    )
}
