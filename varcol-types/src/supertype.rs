//! The `least_common_supertype` lattice oracle.
//!
//! The join rules intentionally cover only promotions that keep every stored
//! value representable without loss of meaning: integer widths widen, mixed
//! signedness widens into the narrowest signed type that holds both sides,
//! integers spill into floats and decimals, `Date` widens to `DateTime`, and
//! `String` sits at the top of the scalar lattice (any scalar can be
//! rendered). Pairs with no such edge have no join and fail with
//! `InvalidArgumentError`.

use varcol_result::{Error, Result};

use crate::data_type::DataType;

/// Computes the least common supertype of two types, or fails if the lattice
/// has no join for the pair.
pub fn least_common_supertype(a: &DataType, b: &DataType) -> Result<DataType> {
    if a == b {
        return Ok(a.clone());
    }

    match (a, b) {
        (DataType::Nothing, other) | (other, DataType::Nothing) => return Ok(other.clone()),
        _ => {}
    }

    if a.is_nullable() || b.is_nullable() {
        let joined = least_common_supertype(a.strip_nullable(), b.strip_nullable())?;
        return Ok(joined.wrap_nullable());
    }

    match (a, b) {
        (DataType::Array(x), DataType::Array(y)) => {
            Ok(DataType::Array(Box::new(least_common_supertype(x, y)?)))
        }
        (DataType::Array(_), _) | (_, DataType::Array(_)) => Err(no_supertype(a, b)),
        _ => join_scalars(a, b),
    }
}

fn no_supertype(a: &DataType, b: &DataType) -> Error {
    Error::InvalidArgumentError(format!("there is no least common supertype for {a} and {b}"))
}

/// `(signed, bits)` for integer types.
fn integer_class(t: &DataType) -> Option<(bool, u32)> {
    match t {
        DataType::Int8 => Some((true, 8)),
        DataType::Int16 => Some((true, 16)),
        DataType::Int32 => Some((true, 32)),
        DataType::Int64 => Some((true, 64)),
        DataType::UInt8 => Some((false, 8)),
        DataType::UInt16 => Some((false, 16)),
        DataType::UInt32 => Some((false, 32)),
        DataType::UInt64 => Some((false, 64)),
        _ => None,
    }
}

fn signed_with_bits(bits: u32) -> Option<DataType> {
    match bits {
        8 => Some(DataType::Int8),
        16 => Some(DataType::Int16),
        32 => Some(DataType::Int32),
        64 => Some(DataType::Int64),
        _ => None,
    }
}

fn unsigned_with_bits(bits: u32) -> Option<DataType> {
    match bits {
        8 => Some(DataType::UInt8),
        16 => Some(DataType::UInt16),
        32 => Some(DataType::UInt32),
        64 => Some(DataType::UInt64),
        _ => None,
    }
}

fn join_scalars(a: &DataType, b: &DataType) -> Result<DataType> {
    use DataType::*;

    // String tops the scalar lattice; every scalar renders into it.
    if matches!(a, String) || matches!(b, String) {
        return Ok(String);
    }

    // Bool behaves as a one-bit integer against any numeric type.
    match (a, b) {
        (Bool, other) | (other, Bool) if other.is_numeric() => return Ok(other.clone()),
        (Bool, _) | (_, Bool) => return Err(no_supertype(a, b)),
        _ => {}
    }

    match (a, b) {
        (Date, DateTime) | (DateTime, Date) => return Ok(DateTime),
        (Date, _) | (_, Date) | (DateTime, _) | (_, DateTime) => return Err(no_supertype(a, b)),
        _ => {}
    }

    match (a, b) {
        (Decimal128 { scale: s1 }, Decimal128 { scale: s2 }) => {
            return Ok(Decimal128 {
                scale: (*s1).max(*s2),
            });
        }
        (Decimal128 { scale }, other) | (other, Decimal128 { scale }) => {
            if integer_class(other).is_some() {
                return Ok(Decimal128 { scale: *scale });
            }
            if matches!(other, Float32 | Float64) {
                return Ok(Float64);
            }
            return Err(no_supertype(a, b));
        }
        _ => {}
    }

    match (a, b) {
        (Float32, Float64) | (Float64, Float32) => return Ok(Float64),
        (Float32 | Float64, other) | (other, Float32 | Float64) => {
            let Some((_, bits)) = integer_class(other) else {
                return Err(no_supertype(a, b));
            };
            // Small integers fit Float32's mantissa; anything wider needs f64.
            let wants_f32 = bits <= 16 && (matches!(a, Float32) || matches!(b, Float32));
            return Ok(if wants_f32 { Float32 } else { Float64 });
        }
        _ => {}
    }

    let (Some((sa, ba)), Some((sb, bb))) = (integer_class(a), integer_class(b)) else {
        return Err(no_supertype(a, b));
    };
    if sa == sb {
        let bits = ba.max(bb);
        let joined = if sa {
            signed_with_bits(bits)
        } else {
            unsigned_with_bits(bits)
        };
        return joined.ok_or_else(|| no_supertype(a, b));
    }
    // Mixed signedness: the narrowest signed type that holds the unsigned
    // side's full range. UInt64 has no signed container.
    let (signed_bits, unsigned_bits) = if sa { (ba, bb) } else { (bb, ba) };
    signed_with_bits(signed_bits.max(unsigned_bits * 2)).ok_or_else(|| no_supertype(a, b))
}
