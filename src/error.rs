//! Error types.
//!
//! `CacheError` is the engine's taxonomy. The instrumented facade hands these
//! back exactly as the engine produced them; telemetry never adds variants.

use thiserror::Error;

/// Errors produced by cache engine operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// No unexpired entry exists for the key.
    #[error("item {0} not found")]
    NotFound(String),

    /// `add` found an unexpired entry already stored under the key.
    #[error("item {0} already exists")]
    AlreadyExists(String),

    /// Generic integer arithmetic on a non-numeric value.
    #[error("the value for {0} is not an integer")]
    NotAnInteger(String),

    /// Float arithmetic on a value that is neither `f32` nor `f64`.
    #[error("the value for {0} does not have type f32 or f64")]
    NotAFloat(String),

    /// Typed arithmetic on a value of a different numeric sub-type.
    #[error("the value for {key} is not an {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    /// Persistence met a value that has no serialized form.
    #[error("cannot encode value of type {type_name} stored under {key}")]
    Unencodable { key: String, type_name: &'static str },

    #[error("cache file i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache snapshot codec failed: {0}")]
    Codec(#[from] serde_json::Error),
}

pub type Result<T, E = CacheError> = std::result::Result<T, E>;
