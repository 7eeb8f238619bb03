//! Bounded per-key metric series

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::events::{Event, EventBus};
use crate::model::{metric_key, Metric};

/// A metric observation as submitted by a producer; the store assigns the
/// timestamp and the canonical key.
#[derive(Debug, Clone)]
pub struct MetricDraft {
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub tags: HashMap<String, String>,
    pub tenant_id: Option<String>,
    pub service_id: String,
}

impl MetricDraft {
    pub fn new(service_id: impl Into<String>, name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            unit: String::new(),
            tags: HashMap::new(),
            tenant_id: None,
            service_id: service_id.into(),
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }
}

/// Append-only time series per canonical key, bounded to the most recent
/// `capacity` samples (FIFO eviction beyond that).
pub struct MetricStore {
    series: DashMap<String, VecDeque<Metric>>,
    capacity: usize,
    bus: Arc<EventBus>,
}

impl MetricStore {
    pub fn new(capacity: usize, bus: Arc<EventBus>) -> Self {
        Self {
            series: DashMap::new(),
            capacity,
            bus,
        }
    }

    /// Record an observation with timestamp = now.
    pub fn record(&self, draft: MetricDraft) -> Metric {
        self.record_at(draft, Utc::now())
    }

    /// Record with an explicit timestamp. Used by the health fan-out (one
    /// consistent timestamp across the five derived metrics) and by tests.
    pub(crate) fn record_at(&self, draft: MetricDraft, timestamp: DateTime<Utc>) -> Metric {
        let metric = Metric {
            name: draft.name,
            value: draft.value,
            unit: draft.unit,
            timestamp,
            tags: draft.tags,
            tenant_id: draft.tenant_id,
            service_id: draft.service_id,
        };

        {
            // Entry guard makes append+truncate atomic per key.
            let mut entry = self.series.entry(metric.key()).or_default();
            entry.push_back(metric.clone());
            while entry.len() > self.capacity {
                entry.pop_front();
            }
        }

        self.bus.publish(Event::MetricRecorded(metric.clone()));
        metric
    }

    /// Query one series, optionally bounded to `[from, to]` inclusive.
    /// Unknown keys yield an empty vec, not an error.
    pub fn query(
        &self,
        service_id: &str,
        name: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Vec<Metric> {
        self.query_key(&metric_key(service_id, name), from, to)
    }

    /// Same as [`query`](Self::query), by pre-built canonical key.
    pub fn query_key(
        &self,
        key: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Vec<Metric> {
        match self.series.get(key) {
            Some(entry) => entry
                .iter()
                .filter(|m| from.map_or(true, |f| m.timestamp >= f))
                .filter(|m| to.map_or(true, |t| m.timestamp <= t))
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    /// Drop samples older than `cutoff` on every key; keys are independent.
    /// Returns the number of samples removed.
    pub fn cleanup_older_than(&self, cutoff: DateTime<Utc>) -> usize {
        let mut removed = 0;
        for mut entry in self.series.iter_mut() {
            let before = entry.len();
            entry.value_mut().retain(|m| m.timestamp >= cutoff);
            removed += before - entry.len();
        }
        self.series.retain(|_, samples| !samples.is_empty());
        removed
    }

    /// Number of distinct series keys.
    pub fn key_count(&self) -> usize {
        self.series.len()
    }

    /// Total samples across all keys.
    pub fn sample_count(&self) -> usize {
        self.series.iter().map(|e| e.len()).sum()
    }

    pub fn clear(&self) {
        self.series.clear();
    }
}
