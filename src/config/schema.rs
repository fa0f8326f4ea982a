//! Configuration schema definitions.
//!
//! This module defines the file form of the cache configuration.
//! All types derive Serde traits for deserialization from TOML.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::options::{Attribute, TraceOptions};
use crate::observability::sampler::{AlwaysSample, NeverSample, ProbabilitySampler};
use crate::operation::{Operation, UnknownOperation};

/// Wildcard accepted in `tracing.operations` to enable every operation.
pub const ALL_OPERATIONS: &str = "*";

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    /// Settings for the bundled in-memory engine.
    pub engine: EngineConfig,

    /// Span settings for the instrumented facade.
    pub tracing: TracingConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// In-memory engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// TTL for entries written with the default TTL. Omitted = never expire.
    pub default_ttl_ms: Option<u64>,

    /// Interval between expiry sweeps. Omitted = no janitor.
    pub cleanup_interval_ms: Option<u64>,
}

impl EngineConfig {
    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl_ms.map(Duration::from_millis)
    }

    pub fn cleanup_interval(&self) -> Option<Duration> {
        self.cleanup_interval_ms.map(Duration::from_millis)
    }
}

/// Declarative form of [`TraceOptions`].
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TracingConfig {
    /// Instance name used in telemetry. Omitted = "default".
    pub instance_name: Option<String>,

    /// Allow root spans when the caller has no active span.
    pub allow_root: bool,

    /// Sampling policy.
    pub sampler: SamplerConfig,

    /// Operation names to trace, or `"*"` for all.
    pub operations: Vec<String>,

    /// Attributes attached to every span, in order.
    pub default_attributes: Vec<Attribute>,
}

impl TracingConfig {
    /// Resolve into options. Fails on the first unrecognised operation name.
    pub fn to_options(&self) -> Result<TraceOptions, UnknownOperation> {
        let mut builder = TraceOptions::builder()
            .allow_root(self.allow_root)
            .default_attributes(self.default_attributes.iter().cloned());

        builder = match self.sampler {
            SamplerConfig::Always => builder.sampler(AlwaysSample),
            SamplerConfig::Never => builder.sampler(NeverSample),
            SamplerConfig::Probability { fraction } => builder.sampler(ProbabilitySampler::new(fraction)),
        };

        for name in &self.operations {
            builder = if name == ALL_OPERATIONS {
                builder.all_operations()
            } else {
                builder.trace(name.parse::<Operation>()?, true)
            };
        }

        if let Some(name) = &self.instance_name {
            builder = builder.instance_name(name.clone());
        }

        Ok(builder.build())
    }
}

/// Sampling policy selection.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SamplerConfig {
    #[default]
    Always,
    Never,
    Probability { fraction: f64 },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error), overridden by `RUST_LOG`.
    pub log_level: String,

    /// Output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
