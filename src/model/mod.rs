//! Domain records and closed enumerations

mod alert;
mod health;
mod incident;
mod metric;

pub use alert::{Alert, AlertRule, AlertStatus, RuleOperator, Severity};
pub use health::{HealthStatus, ServiceHealth};
pub use incident::{Incident, IncidentStatus};
pub use metric::{metric_key, Metric};

/// Generate a unique record id with a type prefix, e.g. `rule-18c2f4a9e3-7f21bc04`.
pub(crate) fn fresh_id(prefix: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    format!("{}-{:x}-{:08x}", prefix, millis, rand::random::<u32>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_id_prefix_and_uniqueness() {
        let a = fresh_id("rule");
        let b = fresh_id("rule");
        assert!(a.starts_with("rule-"));
        assert_ne!(a, b);
    }
}
