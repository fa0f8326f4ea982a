//! In-place arithmetic on stored values.
//!
//! Integer arithmetic wraps modulo the width of the stored sub-type.

use super::value::Value;
use crate::error::CacheError;

/// A numeric sub-type with a matching [`Value`] variant.
pub trait Numeric: Copy + Sized {
    const TYPE_NAME: &'static str;

    fn slot(value: &mut Value) -> Option<&mut Self>;
    fn add(self, rhs: Self) -> Self;
    fn sub(self, rhs: Self) -> Self;
}

macro_rules! integer {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Numeric for $ty {
                const TYPE_NAME: &'static str = stringify!($ty);

                fn slot(value: &mut Value) -> Option<&mut Self> {
                    match value {
                        Value::$variant(v) => Some(v),
                        _ => None,
                    }
                }

                fn add(self, rhs: Self) -> Self {
                    self.wrapping_add(rhs)
                }

                fn sub(self, rhs: Self) -> Self {
                    self.wrapping_sub(rhs)
                }
            }
        )*
    };
}

macro_rules! float {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Numeric for $ty {
                const TYPE_NAME: &'static str = stringify!($ty);

                fn slot(value: &mut Value) -> Option<&mut Self> {
                    match value {
                        Value::$variant(v) => Some(v),
                        _ => None,
                    }
                }

                fn add(self, rhs: Self) -> Self {
                    self + rhs
                }

                fn sub(self, rhs: Self) -> Self {
                    self - rhs
                }
            }
        )*
    };
}

integer! {
    isize => Isize,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    usize => Usize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
}

float! {
    f32 => F32,
    f64 => F64,
}

/// Direction of an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Up,
    Down,
}

/// Apply `n` to a value of exactly type `T`, returning the new value.
pub(crate) fn apply_typed<T: Numeric>(key: &str, value: &mut Value, n: T, step: Step) -> Result<T, CacheError> {
    let slot = T::slot(value).ok_or_else(|| CacheError::TypeMismatch {
        key: key.to_string(),
        expected: T::TYPE_NAME,
    })?;
    *slot = match step {
        Step::Up => slot.add(n),
        Step::Down => slot.sub(n),
    };
    Ok(*slot)
}

/// Apply an `i64` delta to any numeric variant, truncating it to the stored width.
pub(crate) fn apply_integer(key: &str, value: &mut Value, n: i64, step: Step) -> Result<(), CacheError> {
    macro_rules! step {
        ($v:expr, $delta:expr) => {{
            *$v = match step {
                Step::Up => Numeric::add(*$v, $delta),
                Step::Down => Numeric::sub(*$v, $delta),
            };
        }};
    }
    match value {
        Value::Isize(v) => step!(v, n as isize),
        Value::I8(v) => step!(v, n as i8),
        Value::I16(v) => step!(v, n as i16),
        Value::I32(v) => step!(v, n as i32),
        Value::I64(v) => step!(v, n),
        Value::Usize(v) => step!(v, n as usize),
        Value::U8(v) => step!(v, n as u8),
        Value::U16(v) => step!(v, n as u16),
        Value::U32(v) => step!(v, n as u32),
        Value::U64(v) => step!(v, n as u64),
        Value::F32(v) => step!(v, n as f32),
        Value::F64(v) => step!(v, n as f64),
        _ => return Err(CacheError::NotAnInteger(key.to_string())),
    }
    Ok(())
}

/// Apply an `f64` delta to an `F32` or `F64` value.
pub(crate) fn apply_float(key: &str, value: &mut Value, n: f64, step: Step) -> Result<(), CacheError> {
    match value {
        Value::F32(v) => {
            *v = match step {
                Step::Up => *v + n as f32,
                Step::Down => *v - n as f32,
            }
        }
        Value::F64(v) => {
            *v = match step {
                Step::Up => *v + n,
                Step::Down => *v - n,
            }
        }
        _ => return Err(CacheError::NotAFloat(key.to_string())),
    }
    Ok(())
}
