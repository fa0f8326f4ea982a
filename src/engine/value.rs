//! Dynamically typed cache values.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A value stored in the cache.
///
/// Numeric variants map one-to-one onto the typed arithmetic operations.
/// `Opaque` holds any shared Rust value; clones share the same allocation,
/// so a value read back from the cache is the one that was stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Isize(isize),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Usize(usize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    #[serde(skip)]
    Opaque(Opaque),
}

impl Value {
    /// Wrap an arbitrary value. It can be read back with [`Value::downcast_ref`]
    /// but cannot be persisted.
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Value::Opaque(Opaque {
            type_name: std::any::type_name::<T>(),
            inner: Arc::new(value),
        })
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Opaque(o) => o.inner.downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Name of the stored type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Isize(_) => "isize",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::Usize(_) => "usize",
            Value::U8(_) => "u8",
            Value::U16(_) => "u16",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::String(_) => "String",
            Value::Bytes(_) => "Vec<u8>",
            Value::Opaque(o) => o.type_name,
        }
    }
}

/// Shared handle to a value with no serialized form.
#[derive(Clone)]
pub struct Opaque {
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl Opaque {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opaque({})", self.type_name)
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
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
    f32 => F32,
    f64 => F64,
    String => String,
    Vec<u8> => Bytes,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_opaque_clones_share_allocation() {
        let v = Value::opaque(Mutex::new(1_u32));
        let copy = v.clone();
        *v.downcast_ref::<Mutex<u32>>().unwrap().lock().unwrap() += 1;
        assert_eq!(*copy.downcast_ref::<Mutex<u32>>().unwrap().lock().unwrap(), 2);
        assert_eq!(v, copy);
    }

    #[test]
    fn test_opaque_is_not_serializable() {
        let err = serde_json::to_string(&Value::opaque(())).unwrap_err();
        assert!(err.to_string().contains("Opaque"));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::from(3_u8).type_name(), "u8");
        assert_eq!(Value::opaque(5_i32).type_name(), "i32");
    }
}
