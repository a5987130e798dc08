//! Concrete column types and their structural helpers.

use std::fmt;

/// A concrete column type.
///
/// `Nullable` wraps scalar types only: for arrays, nullability lives at the
/// base scalar (`Array(Nullable(Int64))`, never `Nullable(Array(..))`). This
/// mirrors how a subcolumn tracks its least common type as
/// `Array^d(base_type)` with an optionally nullable base.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    /// The bottom of the lattice; the type of a column that has only ever
    /// seen nulls or defaults.
    Nothing,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    /// 128-bit decimal with a fixed number of fractional digits.
    Decimal128 { scale: u8 },
    /// Days since the Unix epoch.
    Date,
    /// Seconds since the Unix epoch.
    DateTime,
    String,
    Array(Box<DataType>),
    Nullable(Box<DataType>),
}

impl DataType {
    /// True if the type (ignoring a nullable wrapper) is [`DataType::Nothing`].
    pub fn is_nothing(&self) -> bool {
        matches!(self.strip_nullable(), DataType::Nothing)
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, DataType::Nullable(_))
    }

    /// The type with an outer nullable wrapper removed, if any.
    pub fn strip_nullable(&self) -> &DataType {
        match self {
            DataType::Nullable(inner) => inner,
            other => other,
        }
    }

    /// Wraps the base scalar in `Nullable`. Arrays keep their shape and the
    /// wrapper is pushed down to the element type; already-nullable types are
    /// returned unchanged.
    pub fn wrap_nullable(self) -> DataType {
        match self {
            DataType::Array(inner) => DataType::Array(Box::new(inner.wrap_nullable())),
            DataType::Nullable(inner) => DataType::Nullable(inner),
            other => DataType::Nullable(Box::new(other)),
        }
    }

    /// Number of `Array` wrappers around the base scalar.
    pub fn num_dimensions(&self) -> usize {
        match self {
            DataType::Array(inner) => 1 + inner.num_dimensions(),
            _ => 0,
        }
    }

    /// The innermost non-array type (possibly nullable).
    pub fn base_type(&self) -> &DataType {
        match self {
            DataType::Array(inner) => inner.base_type(),
            other => other,
        }
    }

    /// Builds `Array^dimensions(base)`.
    pub fn array_of(base: DataType, dimensions: usize) -> DataType {
        let mut result = base;
        for _ in 0..dimensions {
            result = DataType::Array(Box::new(result));
        }
        result
    }

    /// True for types that carry no array wrapper.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, DataType::Array(_))
    }

    /// True for integer types of any width and signedness (ignoring a
    /// nullable wrapper).
    pub fn is_integer(&self) -> bool {
        matches!(
            self.strip_nullable(),
            DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
        )
    }

    /// True for integers, floats, and decimals (ignoring a nullable
    /// wrapper).
    pub fn is_numeric(&self) -> bool {
        self.is_integer()
            || matches!(
                self.strip_nullable(),
                DataType::Float32 | DataType::Float64 | DataType::Decimal128 { .. }
            )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Nothing => write!(f, "Nothing"),
            DataType::Bool => write!(f, "Bool"),
            DataType::Int8 => write!(f, "Int8"),
            DataType::Int16 => write!(f, "Int16"),
            DataType::Int32 => write!(f, "Int32"),
            DataType::Int64 => write!(f, "Int64"),
            DataType::UInt8 => write!(f, "UInt8"),
            DataType::UInt16 => write!(f, "UInt16"),
            DataType::UInt32 => write!(f, "UInt32"),
            DataType::UInt64 => write!(f, "UInt64"),
            DataType::Float32 => write!(f, "Float32"),
            DataType::Float64 => write!(f, "Float64"),
            DataType::Decimal128 { scale } => write!(f, "Decimal128({scale})"),
            DataType::Date => write!(f, "Date"),
            DataType::DateTime => write!(f, "DateTime"),
            DataType::String => write!(f, "String"),
            DataType::Array(inner) => write!(f, "Array({inner})"),
            DataType::Nullable(inner) => write!(f, "Nullable({inner})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_nullable_pushes_through_arrays() {
        let t = DataType::array_of(DataType::Int64, 2).wrap_nullable();
        assert_eq!(
            t,
            DataType::Array(Box::new(DataType::Array(Box::new(DataType::Nullable(
                Box::new(DataType::Int64)
            )))))
        );
        assert_eq!(t.num_dimensions(), 2);
        assert_eq!(
            t.base_type(),
            &DataType::Nullable(Box::new(DataType::Int64))
        );
    }

    #[test]
    fn wrap_nullable_is_idempotent() {
        let t = DataType::String.wrap_nullable().wrap_nullable();
        assert_eq!(t, DataType::Nullable(Box::new(DataType::String)));
    }

    #[test]
    fn nothing_detection_sees_through_nullable() {
        assert!(DataType::Nothing.is_nothing());
        assert!(DataType::Nothing.wrap_nullable().is_nothing());
        assert!(!DataType::array_of(DataType::Nothing, 1).is_nothing());
    }
}
