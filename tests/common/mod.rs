//! Shared utilities for integration tests: span and metric capture, plus a
//! dispatcher that drives any operation through the facade.

#![allow(dead_code)]

use metrics::{
    Counter, Gauge, Histogram, HistogramFn, Key, KeyName, Metadata, Recorder, SharedString, Unit,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::Subscriber;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use instrumented_cache::{CacheEngine, CallContext, InstrumentedCache, Operation, Ttl, Value};

/// A span as seen by [`SpanCapture`].
#[derive(Debug, Clone, Default)]
pub struct CapturedSpan {
    pub id: u64,
    pub parent: Option<u64>,
    pub fields: HashMap<String, String>,
    pub closed: bool,
}

impl CapturedSpan {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn otel_name(&self) -> Option<&str> {
        self.field("otel.name")
    }
}

struct FieldVisitor<'a>(&'a mut HashMap<String, String>);

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{value:?}"));
    }
}

/// Layer recording every span's fields, parent and close.
#[derive(Clone, Default)]
pub struct SpanCapture {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
}

impl SpanCapture {
    pub fn spans(&self) -> Vec<CapturedSpan> {
        self.spans.lock().unwrap().clone()
    }

    /// Spans created by the facade, in creation order.
    pub fn cache_spans(&self) -> Vec<CapturedSpan> {
        self.spans()
            .into_iter()
            .filter(|s| s.field("otel.kind") == Some("client"))
            .collect()
    }

    fn with_open<F: FnOnce(&mut CapturedSpan)>(&self, id: &Id, f: F) {
        let mut spans = self.spans.lock().unwrap();
        if let Some(span) = spans
            .iter_mut()
            .rev()
            .find(|s| s.id == id.into_u64() && !s.closed)
        {
            f(span);
        }
    }
}

impl<S> Layer<S> for SpanCapture
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut fields = HashMap::new();
        attrs.record(&mut FieldVisitor(&mut fields));

        let parent = if let Some(parent) = attrs.parent() {
            Some(parent.into_u64())
        } else if attrs.is_contextual() {
            ctx.current_span().id().map(Id::into_u64)
        } else {
            None
        };

        self.spans.lock().unwrap().push(CapturedSpan {
            id: id.into_u64(),
            parent,
            fields,
            closed: false,
        });
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, _ctx: Context<'_, S>) {
        self.with_open(id, |span| values.record(&mut FieldVisitor(&mut span.fields)));
    }

    fn on_close(&self, id: Id, _ctx: Context<'_, S>) {
        self.with_open(&id, |span| span.closed = true);
    }
}

/// Run `f` with a capturing subscriber as the thread's default.
pub fn with_spans<T>(f: impl FnOnce() -> T) -> (T, SpanCapture) {
    let capture = SpanCapture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, capture)
}

/// One histogram sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: String,
    pub labels: Vec<(String, String)>,
    pub value: f64,
}

impl Sample {
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

struct CapturedHistogram {
    key: Key,
    samples: Arc<Mutex<Vec<Sample>>>,
}

impl HistogramFn for CapturedHistogram {
    fn record(&self, value: f64) {
        let labels = self
            .key
            .labels()
            .map(|l| (l.key().to_string(), l.value().to_string()))
            .collect();
        self.samples.lock().unwrap().push(Sample {
            name: self.key.name().to_string(),
            labels,
            value,
        });
    }
}

/// Recorder keeping every histogram sample and description.
#[derive(Debug, Clone, Default)]
pub struct MetricsCapture {
    samples: Arc<Mutex<Vec<Sample>>>,
    descriptions: Arc<Mutex<Vec<(String, Option<Unit>, String)>>>,
}

impl MetricsCapture {
    pub fn samples(&self) -> Vec<Sample> {
        self.samples.lock().unwrap().clone()
    }

    pub fn descriptions(&self) -> Vec<(String, Option<Unit>, String)> {
        self.descriptions.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.samples.lock().unwrap().clear();
    }
}

impl Recorder for MetricsCapture {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_histogram(&self, key: KeyName, unit: Option<Unit>, description: SharedString) {
        self.descriptions
            .lock()
            .unwrap()
            .push((key.as_str().to_string(), unit, description.to_string()));
    }

    fn register_counter(&self, _key: &Key, _metadata: &Metadata<'_>) -> Counter {
        Counter::noop()
    }

    fn register_gauge(&self, _key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        Gauge::noop()
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        Histogram::from_arc(Arc::new(CapturedHistogram {
            key: key.clone(),
            samples: self.samples.clone(),
        }))
    }
}

/// Run `f` with a capturing recorder installed on this thread.
pub fn with_metrics<T>(f: impl FnOnce() -> T) -> (T, MetricsCapture) {
    let capture = MetricsCapture::default();
    let result = metrics::with_local_recorder(&capture, f);
    (result, capture)
}

/// Run `f` capturing both spans and metrics.
pub fn with_telemetry<T>(f: impl FnOnce() -> T) -> (T, SpanCapture, MetricsCapture) {
    let ((result, spans), metrics) = with_metrics(|| with_spans(f));
    (result, spans, metrics)
}

macro_rules! typed_dispatch {
    ($cache:expr, $ctx:expr, $op:expr, $($inc:ident, $dec:ident, $ty:ty, $inc_op:ident, $dec_op:ident;)*) => {
        match $op {
            $(
                Operation::$inc_op => {
                    let _ = $cache.$inc($ctx, "n", 1 as $ty);
                    return;
                }
                Operation::$dec_op => {
                    let _ = $cache.$dec($ctx, "n", 1 as $ty);
                    return;
                }
            )*
            _ => {}
        }
    };
}

/// Invoke `op` once through the facade with throwaway arguments.
pub fn invoke<E: CacheEngine>(cache: &InstrumentedCache<E>, ctx: &CallContext, op: Operation) {
    typed_dispatch!(cache, ctx, op,
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
    );

    match op {
        Operation::Add => {
            let _ = cache.add(ctx, "k", 1_i64, Ttl::Never);
        }
        Operation::Replace => {
            let _ = cache.replace(ctx, "k", 2_i64, Ttl::Never);
        }
        Operation::Set => cache.set(ctx, "k", 1_i64, Ttl::Never),
        Operation::SetDefault => cache.set_default(ctx, "k", 1_i64),
        Operation::Get => {
            cache.get(ctx, "k");
        }
        Operation::GetWithExpiration => {
            cache.get_with_expiration(ctx, "k");
        }
        Operation::Delete => cache.delete(ctx, "k"),
        Operation::DeleteExpired => cache.delete_expired(ctx),
        Operation::Flush => cache.flush(ctx),
        Operation::ItemCount => {
            cache.item_count(ctx);
        }
        Operation::Items => {
            cache.items(ctx);
        }
        Operation::OnEvicted => cache.on_evicted(ctx, |_: &str, _: Value| {}),
        Operation::Increment => {
            let _ = cache.increment(ctx, "n", 1);
        }
        Operation::IncrementFloat => {
            let _ = cache.increment_float(ctx, "n", 1.0);
        }
        Operation::Decrement => {
            let _ = cache.decrement(ctx, "n", 1);
        }
        Operation::DecrementFloat => {
            let _ = cache.decrement_float(ctx, "n", 1.0);
        }
        Operation::Save => {
            let _ = cache.save(ctx, Vec::<u8>::new());
        }
        Operation::SaveFile => {
            let dir = tempfile::tempdir().unwrap();
            let _ = cache.save_file(ctx, dir.path().join("snapshot.json"));
        }
        Operation::Load => {
            let _ = cache.load(ctx, "{}".as_bytes());
        }
        Operation::LoadFile => {
            let dir = tempfile::tempdir().unwrap();
            let _ = cache.load_file(ctx, dir.path().join("missing.json"));
        }
        other => unreachable!("typed operation {other} not dispatched"),
    }
}
