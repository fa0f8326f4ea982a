//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Facade call:
//!     → tracing.rs (gate, sampler, span start/close)
//!     → metrics.rs (outcome classification, latency sample)
//!
//! Process setup:
//!     → logging.rs (subscriber for logs and closed spans)
//!     → metrics::describe_metrics (histogram description)
//!     → summary.rs (optional in-process recorder for the operator binary)
//! ```
//!
//! # Design Decisions
//! - Spans and samples go through the `tracing` and `metrics` facades; the
//!   embedding process chooses the backends
//! - Tracing is opt-in per operation; metrics are always recorded

pub mod logging;
pub mod metrics;
pub mod sampler;
pub mod summary;
pub mod tracing;

pub use self::metrics::{describe_metrics, CallTimer, Outcome};
pub use self::sampler::{AlwaysSample, NeverSample, ProbabilitySampler, Sampler, SamplingParams};
pub use self::summary::{LatencySummary, SummaryRow};
pub use self::tracing::{should_trace, CallContext, SpanHandle};
