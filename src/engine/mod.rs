//! Cache engine subsystem.
//!
//! # Data Flow
//! ```text
//! InstrumentedCache (facade)
//!     → CacheEngine trait (this module)
//!     → MemoryCache (memory.rs)
//!         → DashMap<String, Item> (item.rs, value.rs)
//!         → numeric.rs (in-place arithmetic)
//!         → persistence.rs (JSON snapshots)
//!         → janitor.rs (background expiry sweep)
//! ```
//!
//! # Design Decisions
//! - The facade only depends on the trait; any engine that is `Send + Sync`
//!   can be instrumented
//! - Eviction callbacks run after the entry has left the map, never under a
//!   shard lock, so a callback may call back into the cache
//! - Expired entries stay invisible to reads until a sweep removes them

pub mod item;
pub mod janitor;
pub mod memory;
pub mod numeric;
pub mod persistence;
pub mod value;

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::Result;

pub use item::{Item, Ttl};
pub use memory::MemoryCache;
pub use numeric::Numeric;
pub use value::{Opaque, Value};

/// Callback invoked with the key and value of every evicted entry.
pub type EvictionCallback = Box<dyn Fn(&str, Value) + Send + Sync>;

/// Invokes `$callback!` with the typed arithmetic table, one row per numeric
/// sub-type: `increment method, decrement method, type, increment op, decrement op`.
macro_rules! with_numeric_types {
    ($callback:ident) => {
        $callback! {
            increment_isize, decrement_isize, isize, IncrementIsize, DecrementIsize;
            increment_i8, decrement_i8, i8, IncrementI8, DecrementI8;
            increment_i16, decrement_i16, i16, IncrementI16, DecrementI16;
            increment_i32, decrement_i32, i32, IncrementI32, DecrementI32;
            increment_i64, decrement_i64, i64, IncrementI64, DecrementI64;
            increment_usize, decrement_usize, usize, IncrementUsize, DecrementUsize;
            increment_u8, decrement_u8, u8, IncrementU8, DecrementU8;
            increment_u16, decrement_u16, u16, IncrementU16, DecrementU16;
            increment_u32, decrement_u32, u32, IncrementU32, DecrementU32;
            increment_u64, decrement_u64, u64, IncrementU64, DecrementU64;
            increment_f32, decrement_f32, f32, IncrementF32, DecrementF32;
            increment_f64, decrement_f64, f64, IncrementF64, DecrementF64;
        }
    };
}
pub(crate) use with_numeric_types;

macro_rules! typed_arithmetic_decls {
    ($($inc:ident, $dec:ident, $ty:ty, $inc_op:ident, $dec_op:ident;)*) => {
        $(
            #[doc = concat!("Add `n` to a stored `", stringify!($ty), "`, returning the new value.")]
            fn $inc(&self, key: &str, n: $ty) -> Result<$ty>;
            #[doc = concat!("Subtract `n` from a stored `", stringify!($ty), "`, returning the new value.")]
            fn $dec(&self, key: &str, n: $ty) -> Result<$ty>;
        )*
    };
}

/// Capabilities the instrumented facade consumes.
pub trait CacheEngine: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    /// Like `get`, also returning the expiration (`None` = never).
    fn get_with_expiration(&self, key: &str) -> Option<(Value, Option<SystemTime>)>;

    fn set(&self, key: &str, value: Value, ttl: Ttl);
    /// Set with the engine's default TTL.
    fn set_default(&self, key: &str, value: Value);
    /// Store only if no unexpired entry exists.
    fn add(&self, key: &str, value: Value, ttl: Ttl) -> Result<()>;
    /// Store only if an unexpired entry exists.
    fn replace(&self, key: &str, value: Value, ttl: Ttl) -> Result<()>;
    fn delete(&self, key: &str);
    fn delete_expired(&self);
    fn flush(&self);

    /// Add to any numeric value, truncating `n` to the stored width.
    fn increment(&self, key: &str, n: i64) -> Result<()>;
    /// Add to an `f32` or `f64` value.
    fn increment_float(&self, key: &str, n: f64) -> Result<()>;
    fn decrement(&self, key: &str, n: i64) -> Result<()>;
    fn decrement_float(&self, key: &str, n: f64) -> Result<()>;

    with_numeric_types!(typed_arithmetic_decls);

    /// Number of stored entries, including expired ones not yet swept.
    fn item_count(&self) -> usize;
    /// Snapshot of all unexpired entries.
    fn items(&self) -> HashMap<String, Item>;

    fn save(&self, writer: &mut dyn Write) -> Result<()>;
    fn save_file(&self, path: &Path) -> Result<()>;
    /// Restore entries, keeping any key whose current entry is unexpired.
    fn load(&self, reader: &mut dyn Read) -> Result<()>;
    fn load_file(&self, path: &Path) -> Result<()>;

    fn on_evicted(&self, callback: EvictionCallback);
}

macro_rules! forward_typed_arithmetic {
    ($($inc:ident, $dec:ident, $ty:ty, $inc_op:ident, $dec_op:ident;)*) => {
        $(
            fn $inc(&self, key: &str, n: $ty) -> Result<$ty> {
                (**self).$inc(key, n)
            }

            fn $dec(&self, key: &str, n: $ty) -> Result<$ty> {
                (**self).$dec(key, n)
            }
        )*
    };
}

/// Lets several facades share one engine.
impl<E: CacheEngine + ?Sized> CacheEngine for Arc<E> {
    fn get(&self, key: &str) -> Option<Value> {
        (**self).get(key)
    }

    fn get_with_expiration(&self, key: &str) -> Option<(Value, Option<SystemTime>)> {
        (**self).get_with_expiration(key)
    }

    fn set(&self, key: &str, value: Value, ttl: Ttl) {
        (**self).set(key, value, ttl)
    }

    fn set_default(&self, key: &str, value: Value) {
        (**self).set_default(key, value)
    }

    fn add(&self, key: &str, value: Value, ttl: Ttl) -> Result<()> {
        (**self).add(key, value, ttl)
    }

    fn replace(&self, key: &str, value: Value, ttl: Ttl) -> Result<()> {
        (**self).replace(key, value, ttl)
    }

    fn delete(&self, key: &str) {
        (**self).delete(key)
    }

    fn delete_expired(&self) {
        (**self).delete_expired()
    }

    fn flush(&self) {
        (**self).flush()
    }

    fn increment(&self, key: &str, n: i64) -> Result<()> {
        (**self).increment(key, n)
    }

    fn increment_float(&self, key: &str, n: f64) -> Result<()> {
        (**self).increment_float(key, n)
    }

    fn decrement(&self, key: &str, n: i64) -> Result<()> {
        (**self).decrement(key, n)
    }

    fn decrement_float(&self, key: &str, n: f64) -> Result<()> {
        (**self).decrement_float(key, n)
    }

    with_numeric_types!(forward_typed_arithmetic);

    fn item_count(&self) -> usize {
        (**self).item_count()
    }

    fn items(&self) -> HashMap<String, Item> {
        (**self).items()
    }

    fn save(&self, writer: &mut dyn Write) -> Result<()> {
        (**self).save(writer)
    }

    fn save_file(&self, path: &Path) -> Result<()> {
        (**self).save_file(path)
    }

    fn load(&self, reader: &mut dyn Read) -> Result<()> {
        (**self).load(reader)
    }

    fn load_file(&self, path: &Path) -> Result<()> {
        (**self).load_file(path)
    }

    fn on_evicted(&self, callback: EvictionCallback) {
        (**self).on_evicted(callback)
    }
}
