//! In-process latency summary.
//!
//! A [`Recorder`] that folds `cache_client_latency_ms` samples into one row
//! per method and status. The operator binary installs it while driving a
//! workload; embedding processes normally install their own exporter instead.

use dashmap::DashMap;
use metrics::{Counter, Gauge, Histogram, HistogramFn, Key, KeyName, Metadata, Recorder, SharedString, Unit};
use serde::Serialize;
use std::sync::Arc;

use super::metrics::{LABEL_METHOD, LABEL_STATUS, LATENCY_METRIC};

#[derive(Debug, Default, Clone, Copy)]
struct Stats {
    count: u64,
    total_ms: f64,
    max_ms: f64,
}

/// Aggregated latency for one method and status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub method: String,
    pub status: String,
    pub count: u64,
    pub mean_ms: f64,
    pub max_ms: f64,
}

/// Recorder aggregating facade latency samples in memory.
#[derive(Debug, Clone, Default)]
pub struct LatencySummary {
    stats: Arc<DashMap<(String, String), Stats>>,
}

impl LatencySummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows sorted by method, then status.
    pub fn rows(&self) -> Vec<SummaryRow> {
        let mut rows: Vec<_> = self
            .stats
            .iter()
            .map(|entry| {
                let (method, status) = entry.key();
                let stats = entry.value();
                SummaryRow {
                    method: method.clone(),
                    status: status.clone(),
                    count: stats.count,
                    mean_ms: if stats.count == 0 {
                        0.0
                    } else {
                        stats.total_ms / stats.count as f64
                    },
                    max_ms: stats.max_ms,
                }
            })
            .collect();
        rows.sort_by(|a, b| (&a.method, &a.status).cmp(&(&b.method, &b.status)));
        rows
    }

    /// Total samples across all rows.
    pub fn total(&self) -> u64 {
        self.stats.iter().map(|entry| entry.value().count).sum()
    }
}

struct SummaryHistogram {
    key: (String, String),
    stats: Arc<DashMap<(String, String), Stats>>,
}

impl HistogramFn for SummaryHistogram {
    fn record(&self, value: f64) {
        let mut stats = self.stats.entry(self.key.clone()).or_default();
        stats.count += 1;
        stats.total_ms += value;
        stats.max_ms = stats.max_ms.max(value);
    }
}

fn label(key: &Key, name: &str) -> String {
    key.labels()
        .find(|l| l.key() == name)
        .map(|l| l.value().to_string())
        .unwrap_or_default()
}

impl Recorder for LatencySummary {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, _key: &Key, _metadata: &Metadata<'_>) -> Counter {
        Counter::noop()
    }

    fn register_gauge(&self, _key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        Gauge::noop()
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        if key.name() != LATENCY_METRIC {
            return Histogram::noop();
        }
        Histogram::from_arc(Arc::new(SummaryHistogram {
            key: (label(key, LABEL_METHOD), label(key, LABEL_STATUS)),
            stats: self.stats.clone(),
        }))
    }
}
