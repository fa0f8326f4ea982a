//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! Programmatic:
//!     TraceOptions::builder() → mutators applied in order → build()
//!
//! From a file (TOML):
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → CacheConfig (validated, immutable)
//!     → TracingConfig::to_options() → TraceOptions
//!     → moved into InstrumentedCache
//! ```
//!
//! # Design Decisions
//! - Options are immutable once built; the facade owns its copy
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Unknown operation names are rejected, never ignored

pub mod loader;
pub mod options;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use options::{Attribute, AttributeValue, TraceOptions, TraceOptionsBuilder};
pub use schema::{CacheConfig, EngineConfig, LogFormat, ObservabilityConfig, SamplerConfig, TracingConfig};
