//! Span sampling policies.
//!
//! A sampler is consulted after the trace gate has allowed a span and before
//! the span is created. Refusal yields an absent span handle.

use std::fmt;

use crate::operation::Operation;

/// What a sampler knows about the span it is asked about.
#[derive(Debug, Clone, Copy)]
pub struct SamplingParams {
    pub operation: Operation,
    /// Whether the call context carries a parent span.
    pub has_parent: bool,
}

/// Decides whether a span is recorded.
pub trait Sampler: Send + Sync + fmt::Debug {
    fn should_sample(&self, params: &SamplingParams) -> bool;
}

/// Samples every span.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysSample;

impl Sampler for AlwaysSample {
    fn should_sample(&self, _: &SamplingParams) -> bool {
        true
    }
}

/// Samples no span.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverSample;

impl Sampler for NeverSample {
    fn should_sample(&self, _: &SamplingParams) -> bool {
        false
    }
}

/// Samples a fixed fraction of spans.
#[derive(Debug, Clone, Copy)]
pub struct ProbabilitySampler {
    fraction: f64,
}

impl ProbabilitySampler {
    /// `fraction` is clamped to `[0, 1]`.
    pub fn new(fraction: f64) -> Self {
        let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
        Self { fraction }
    }

    pub fn fraction(&self) -> f64 {
        self.fraction
    }
}

impl Sampler for ProbabilitySampler {
    fn should_sample(&self, _: &SamplingParams) -> bool {
        if self.fraction >= 1.0 {
            return true;
        }
        fastrand::f64() < self.fraction
    }
}
