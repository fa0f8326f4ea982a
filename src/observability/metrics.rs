//! Call latency metrics.
//!
//! # Responsibilities
//! - Define the facade's latency histogram and its labels
//! - Classify each call's outcome into a status label
//! - Time calls and record exactly one sample per call
//!
//! # Metrics
//! - `cache_client_latency_ms` (histogram): wall-clock latency in milliseconds,
//!   labelled by `cache_name`, `cache_method` and `cache_status`
//!
//! # Design Decisions
//! - Samples go through the `metrics` facade; the process decides where they
//!   land by installing a recorder
//! - A timer that is dropped without being finished records `ERROR`, so a
//!   panicking engine call is still counted once

use metrics::{SharedString, Unit};
use std::fmt;
use std::time::Instant;

use crate::operation::Operation;

/// Latency histogram name.
pub const LATENCY_METRIC: &str = "cache_client_latency_ms";

pub const LABEL_NAME: &str = "cache_name";
pub const LABEL_METHOD: &str = "cache_method";
pub const LABEL_STATUS: &str = "cache_status";

/// Classified result of one facade call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Fire-and-forget operation completed.
    Called,
    /// Lookup produced a value.
    Found,
    /// Lookup produced nothing.
    NotFound,
    /// Fallible operation succeeded.
    Ok,
    /// Fallible operation failed, or the call unwound.
    Error,
}

impl Outcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            Outcome::Called => "CALLED",
            Outcome::Found => "FOUND",
            Outcome::NotFound => "NOT_FOUND",
            Outcome::Ok => "OK",
            Outcome::Error => "ERROR",
        }
    }

    pub fn from_found(found: bool) -> Self {
        if found {
            Outcome::Found
        } else {
            Outcome::NotFound
        }
    }

    pub fn from_result<T, E>(result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => Outcome::Ok,
            Err(_) => Outcome::Error,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Register descriptions for the facade's metrics with the installed recorder.
pub fn describe_metrics() {
    metrics::describe_histogram!(
        LATENCY_METRIC,
        Unit::Milliseconds,
        "Latency of instrumented cache calls"
    );
}

/// Record one latency sample.
pub fn record_latency(instance: SharedString, op: Operation, outcome: Outcome, elapsed_ms: f64) {
    metrics::histogram!(
        LATENCY_METRIC,
        LABEL_NAME => instance,
        LABEL_METHOD => op.name(),
        LABEL_STATUS => outcome.as_str(),
    )
    .record(elapsed_ms);
}

/// Times one facade call. Records on `finish`, or as `ERROR` when dropped.
#[derive(Debug)]
#[must_use = "a dropped timer records the call as an error"]
pub struct CallTimer {
    op: Operation,
    instance: SharedString,
    started: Instant,
    recorded: bool,
}

impl CallTimer {
    pub fn start(op: Operation, instance: impl Into<SharedString>) -> Self {
        Self {
            op,
            instance: instance.into(),
            started: Instant::now(),
            recorded: false,
        }
    }

    pub fn finish(mut self, outcome: Outcome) {
        self.record(outcome);
    }

    fn record(&mut self, outcome: Outcome) {
        if self.recorded {
            return;
        }
        self.recorded = true;
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        record_latency(self.instance.clone(), self.op, outcome, elapsed_ms);
    }
}

impl Drop for CallTimer {
    fn drop(&mut self) {
        self.record(Outcome::Error);
    }
}
