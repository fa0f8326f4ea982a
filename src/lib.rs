//! Instrumented cache library.
//!
//! Decorates a TTL key-value cache with `tracing` spans and `metrics`
//! latency histograms. The bundled [`MemoryCache`] is the reference engine;
//! any [`CacheEngine`] can be wrapped.
//!
//! ```no_run
//! use instrumented_cache::{CallContext, InstrumentedCache, MemoryCache, TraceOptions, Ttl};
//!
//! let options = TraceOptions::builder().instance_name("sessions").all_operations().build();
//! let cache = InstrumentedCache::new(MemoryCache::default(), options);
//! let ctx = CallContext::current();
//! cache.set(&ctx, "user:1", "alice", Ttl::Never);
//! assert!(cache.get(&ctx, "user:1").is_some());
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod facade;
pub mod observability;
pub mod operation;

pub use config::{CacheConfig, TraceOptions, TraceOptionsBuilder};
pub use engine::{CacheEngine, Item, MemoryCache, Ttl, Value};
pub use error::{CacheError, Result};
pub use facade::InstrumentedCache;
pub use observability::{CallContext, Outcome};
pub use operation::{Category, Operation};
