//! Trace gate and span lifecycle.
//!
//! # Responsibilities
//! - Carry the caller's parent span into each operation (`CallContext`)
//! - Decide per call whether a span is created (`should_trace`)
//! - Start client spans with default attributes and close them on every exit
//!   path (`SpanHandle`)
//!
//! # Design Decisions
//! - The per-operation toggle is checked first; disabled operations never
//!   touch the span machinery
//! - Span names must be static in `tracing`, so every span is named
//!   `cache.operation` and carries the operation's name in `otel.name`
//! - An absent handle makes every close a no-op; dropping a live handle ends
//!   the span, so early returns and unwinding still close it

use tracing::field::Empty;
use tracing::Span;

use crate::config::options::TraceOptions;
use crate::error::CacheError;
use crate::observability::sampler::SamplingParams;
use crate::operation::Operation;

/// Call-scoped trace context passed to every facade operation.
///
/// Holds the parent span, if any. The facade reads it and never stores it.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    parent: Option<Span>,
}

impl CallContext {
    /// A context without a parent span.
    pub fn background() -> Self {
        Self { parent: None }
    }

    /// Capture the span the calling thread is currently inside, if enabled.
    pub fn current() -> Self {
        Self::with_parent(Span::current())
    }

    pub fn with_parent(span: Span) -> Self {
        let parent = if span.is_disabled() { None } else { Some(span) };
        Self { parent }
    }

    pub fn parent(&self) -> Option<&Span> {
        self.parent.as_ref()
    }

    pub fn has_parent(&self) -> bool {
        self.parent.as_ref().is_some_and(|span| span.id().is_some())
    }
}

/// Whether a span should be started for this call.
pub fn should_trace(ctx: &CallContext, operation_enabled: bool, allow_root: bool) -> bool {
    if !operation_enabled {
        return false;
    }
    allow_root || ctx.has_parent()
}

/// Span status recorded by a status-bearing close.
pub const STATUS_OK: &str = "OK";
pub const STATUS_ERROR: &str = "ERROR";

/// A possibly-absent span owned by one call.
#[derive(Debug)]
#[must_use = "dropping the handle ends the span immediately"]
pub struct SpanHandle {
    span: Option<Span>,
}

impl SpanHandle {
    pub fn absent() -> Self {
        Self { span: None }
    }

    /// Start a span for `op` if the gate and the sampler allow it.
    pub fn start(ctx: &CallContext, op: Operation, options: &TraceOptions) -> Self {
        if !should_trace(ctx, options.traces(op), options.allow_root()) {
            return Self::absent();
        }

        let params = SamplingParams {
            operation: op,
            has_parent: ctx.has_parent(),
        };
        if !options.sampler().should_sample(&params) {
            return Self::absent();
        }

        let parent = ctx.parent().and_then(Span::id);
        let span = tracing::info_span!(
            parent: parent,
            "cache.operation",
            otel.name = op.span_name(),
            otel.kind = "client",
            cache.operation = op.name(),
            cache.attributes = Empty,
            otel.status_code = Empty,
            otel.status_message = Empty,
        );

        let attributes = options.default_attributes();
        if !attributes.is_empty() {
            let joined = attributes
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            span.record("cache.attributes", joined.as_str());
        }

        Self { span: Some(span) }
    }

    pub fn is_present(&self) -> bool {
        self.span.is_some()
    }

    /// Run `f` inside the span, if there is one.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        match &self.span {
            Some(span) => span.in_scope(f),
            None => f(),
        }
    }

    /// Record OK or the error's message as the span status, then end it.
    pub fn end_with_status(mut self, error: Option<&CacheError>) {
        if let Some(span) = self.span.take() {
            match error {
                None => {
                    span.record("otel.status_code", STATUS_OK);
                }
                Some(err) => {
                    span.record("otel.status_code", STATUS_ERROR);
                    span.record("otel.status_message", err.to_string().as_str());
                }
            }
        }
    }

    /// End the span without a status.
    pub fn end(mut self) {
        self.span.take();
    }
}
