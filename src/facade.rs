//! Instrumented cache facade.
//!
//! # Responsibilities
//! - Expose every engine operation with a leading [`CallContext`]
//! - Wrap each call in an optional span and exactly one latency sample
//! - Return the engine's result unchanged
//!
//! # Data Flow
//! ```text
//! caller(ctx, args)
//!     → SpanHandle::start (gate, sampler)
//!     → CallTimer::start
//!     → engine call inside the span
//!     → classify outcome
//!     → close span (status-bearing for fallible operations)
//!     → record latency sample
//!     → result back to caller
//! ```
//!
//! # Design Decisions
//! - Three helpers, one per [`Category`](crate::operation::Category); every
//!   method is a one-line instantiation of one of them
//! - No retries, no error wrapping, no value rewriting
//! - The options are immutable after construction, so the facade is
//!   `Send + Sync` whenever the engine is

use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Write};
use std::path::Path;
use std::time::SystemTime;

use crate::config::options::TraceOptions;
use crate::config::schema::CacheConfig;
use crate::engine::{CacheEngine, Item, MemoryCache, Ttl, Value};
use crate::error::Result;
use crate::observability::metrics::{CallTimer, Outcome};
use crate::observability::tracing::{CallContext, SpanHandle};
use crate::operation::{Operation, UnknownOperation};

/// A cache engine decorated with spans and latency metrics.
pub struct InstrumentedCache<E: CacheEngine = MemoryCache> {
    engine: E,
    options: TraceOptions,
}

impl<E: CacheEngine> InstrumentedCache<E> {
    pub fn new(engine: E, options: TraceOptions) -> Self {
        Self { engine, options }
    }

    /// The wrapped engine. Calls made through it are not instrumented.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn options(&self) -> &TraceOptions {
        &self.options
    }

    pub fn into_inner(self) -> E {
        self.engine
    }

    /// Fire-and-forget: outcome `CALLED`, plain close.
    fn call<T>(&self, ctx: &CallContext, op: Operation, f: impl FnOnce(&E) -> T) -> T {
        let span = SpanHandle::start(ctx, op, &self.options);
        let timer = CallTimer::start(op, self.options.instance_label());

        let result = span.in_scope(|| f(&self.engine));

        span.end();
        timer.finish(Outcome::Called);
        result
    }

    /// Lookup: outcome `FOUND` or `NOT_FOUND`, plain close.
    fn lookup<T>(&self, ctx: &CallContext, op: Operation, f: impl FnOnce(&E) -> Option<T>) -> Option<T> {
        let span = SpanHandle::start(ctx, op, &self.options);
        let timer = CallTimer::start(op, self.options.instance_label());

        let result = span.in_scope(|| f(&self.engine));
        let outcome = Outcome::from_found(result.is_some());

        span.end();
        timer.finish(outcome);
        result
    }

    /// Fallible: outcome `OK` or `ERROR`, span closed with a status.
    fn fallible<T>(&self, ctx: &CallContext, op: Operation, f: impl FnOnce(&E) -> Result<T>) -> Result<T> {
        let span = SpanHandle::start(ctx, op, &self.options);
        let timer = CallTimer::start(op, self.options.instance_label());

        let result = span.in_scope(|| f(&self.engine));
        let outcome = Outcome::from_result(&result);

        span.end_with_status(result.as_ref().err());
        timer.finish(outcome);
        result
    }

    /// Store an item only if no unexpired entry exists for `key`.
    pub fn add(&self, ctx: &CallContext, key: &str, value: impl Into<Value>, ttl: Ttl) -> Result<()> {
        let value = value.into();
        self.fallible(ctx, Operation::Add, |e| e.add(key, value, ttl))
    }

    /// Store an item only if an unexpired entry already exists for `key`.
    pub fn replace(&self, ctx: &CallContext, key: &str, value: impl Into<Value>, ttl: Ttl) -> Result<()> {
        let value = value.into();
        self.fallible(ctx, Operation::Replace, |e| e.replace(key, value, ttl))
    }

    pub fn set(&self, ctx: &CallContext, key: &str, value: impl Into<Value>, ttl: Ttl) {
        let value = value.into();
        self.call(ctx, Operation::Set, |e| e.set(key, value, ttl))
    }

    /// Set with the engine's default TTL.
    pub fn set_default(&self, ctx: &CallContext, key: &str, value: impl Into<Value>) {
        let value = value.into();
        self.call(ctx, Operation::SetDefault, |e| e.set_default(key, value))
    }

    pub fn get(&self, ctx: &CallContext, key: &str) -> Option<Value> {
        self.lookup(ctx, Operation::Get, |e| e.get(key))
    }

    /// Value and expiration (`None` = never) of an unexpired entry.
    pub fn get_with_expiration(&self, ctx: &CallContext, key: &str) -> Option<(Value, Option<SystemTime>)> {
        self.lookup(ctx, Operation::GetWithExpiration, |e| e.get_with_expiration(key))
    }

    pub fn delete(&self, ctx: &CallContext, key: &str) {
        self.call(ctx, Operation::Delete, |e| e.delete(key))
    }

    pub fn delete_expired(&self, ctx: &CallContext) {
        self.call(ctx, Operation::DeleteExpired, |e| e.delete_expired())
    }

    pub fn flush(&self, ctx: &CallContext) {
        self.call(ctx, Operation::Flush, |e| e.flush())
    }

    pub fn item_count(&self, ctx: &CallContext) -> usize {
        self.call(ctx, Operation::ItemCount, |e| e.item_count())
    }

    pub fn items(&self, ctx: &CallContext) -> HashMap<String, Item> {
        self.call(ctx, Operation::Items, |e| e.items())
    }

    /// Register the callback run for every evicted entry.
    pub fn on_evicted<F>(&self, ctx: &CallContext, callback: F)
    where
        F: Fn(&str, Value) + Send + Sync + 'static,
    {
        self.call(ctx, Operation::OnEvicted, |e| e.on_evicted(Box::new(callback)))
    }

    /// Add `n` to any numeric value, truncated to the stored width.
    pub fn increment(&self, ctx: &CallContext, key: &str, n: i64) -> Result<()> {
        self.fallible(ctx, Operation::Increment, |e| e.increment(key, n))
    }

    pub fn increment_float(&self, ctx: &CallContext, key: &str, n: f64) -> Result<()> {
        self.fallible(ctx, Operation::IncrementFloat, |e| e.increment_float(key, n))
    }

    pub fn decrement(&self, ctx: &CallContext, key: &str, n: i64) -> Result<()> {
        self.fallible(ctx, Operation::Decrement, |e| e.decrement(key, n))
    }

    pub fn decrement_float(&self, ctx: &CallContext, key: &str, n: f64) -> Result<()> {
        self.fallible(ctx, Operation::DecrementFloat, |e| e.decrement_float(key, n))
    }

    pub fn save<W: Write>(&self, ctx: &CallContext, mut writer: W) -> Result<()> {
        self.fallible(ctx, Operation::Save, |e| e.save(&mut writer))
    }

    pub fn save_file(&self, ctx: &CallContext, path: impl AsRef<Path>) -> Result<()> {
        self.fallible(ctx, Operation::SaveFile, |e| e.save_file(path.as_ref()))
    }

    /// Merge a snapshot, keeping keys that already hold an unexpired entry.
    pub fn load<R: Read>(&self, ctx: &CallContext, mut reader: R) -> Result<()> {
        self.fallible(ctx, Operation::Load, |e| e.load(&mut reader))
    }

    pub fn load_file(&self, ctx: &CallContext, path: impl AsRef<Path>) -> Result<()> {
        self.fallible(ctx, Operation::LoadFile, |e| e.load_file(path.as_ref()))
    }
}

impl InstrumentedCache<MemoryCache> {
    /// Build a facade over a fresh [`MemoryCache`] from a parsed config file.
    pub fn from_config(config: &CacheConfig) -> std::result::Result<Self, UnknownOperation> {
        let options = config.tracing.to_options()?;
        Ok(Self::new(MemoryCache::from_config(&config.engine), options))
    }
}

macro_rules! instrumented_typed_arithmetic {
    ($($inc:ident, $dec:ident, $ty:ty, $inc_op:ident, $dec_op:ident;)*) => {
        impl<E: CacheEngine> InstrumentedCache<E> {
            $(
                #[doc = concat!("Add `n` to a stored `", stringify!($ty), "`, returning the new value.")]
                pub fn $inc(&self, ctx: &CallContext, key: &str, n: $ty) -> Result<$ty> {
                    self.fallible(ctx, Operation::$inc_op, |e| e.$inc(key, n))
                }

                #[doc = concat!("Subtract `n` from a stored `", stringify!($ty), "`, returning the new value.")]
                pub fn $dec(&self, ctx: &CallContext, key: &str, n: $ty) -> Result<$ty> {
                    self.fallible(ctx, Operation::$dec_op, |e| e.$dec(key, n))
                }
            )*
        }
    };
}

crate::engine::with_numeric_types!(instrumented_typed_arithmetic);

impl<E: CacheEngine + fmt::Debug> fmt::Debug for InstrumentedCache<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstrumentedCache")
            .field("engine", &self.engine)
            .field("options", &self.options)
            .finish()
    }
}
