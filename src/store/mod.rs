//! In-memory stores
//!
//! Each store serializes its own check-then-act sequences: the metric store
//! holds the per-key append+truncate under a single map entry guard, and the
//! alert store takes one write lock across "find firing, then create or
//! resolve". All state is volatile; a restart loses everything.

mod alerts;
mod health;
mod metrics;

pub use alerts::AlertStore;
pub use health::{HealthDraft, HealthRegistry};
pub use metrics::{MetricDraft, MetricStore};
