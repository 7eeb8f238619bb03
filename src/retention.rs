//! Time-based pruning of metrics and resolved alerts
//!
//! Both passes are best-effort and independent per key/record; they are
//! invoked by the host (or its scheduler) through the [`Monitor`] facade.
//!
//! [`Monitor`]: crate::monitor::Monitor

use chrono::{Duration, Utc};

use crate::store::{AlertStore, MetricStore};

/// Drop metric samples older than `older_than_days` on every key.
/// Returns the number of samples removed.
pub fn cleanup_old_metrics(store: &MetricStore, older_than_days: i64) -> usize {
    let cutoff = Utc::now() - Duration::days(older_than_days);
    let removed = store.cleanup_older_than(cutoff);
    if removed > 0 {
        tracing::info!(removed, older_than_days, "Pruned old metric samples");
    }
    removed
}

/// Remove resolved alerts whose resolution is older than `older_than_days`.
/// Firing alerts are never touched.
pub fn cleanup_resolved_alerts(store: &AlertStore, older_than_days: i64) -> usize {
    let cutoff = Utc::now() - Duration::days(older_than_days);
    let removed = store.cleanup_resolved(cutoff);
    if removed > 0 {
        tracing::info!(removed, older_than_days, "Pruned resolved alerts");
    }
    removed
}
