//! Metrics collection and statistics.

use crate::workload::Action;
use hdrhistogram::Histogram;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Collects outcomes during load test execution.
///
/// Shared across user tasks behind a mutex; each non-skipped action records
/// exactly one success or failure here.
pub struct MetricsCollector {
    histogram: Histogram<u64>,
    requests_total: u64,
    requests_success: u64,
    requests_failed: u64,
    per_action: [ActionCounters; Action::ALL.len()],
    first_request_time: Option<Instant>,
    last_request_time: Option<Instant>,
}

#[derive(Debug, Clone, Copy, Default)]
struct ActionCounters {
    success: u64,
    failed: u64,
}

fn action_index(action: Action) -> usize {
    match action {
        Action::GetBook => 0,
        Action::GetManyBooks => 1,
        Action::CreateBook => 2,
        Action::DeleteBook => 3,
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            histogram: Histogram::new(3).expect("Failed to create histogram"),
            requests_total: 0,
            requests_success: 0,
            requests_failed: 0,
            per_action: [ActionCounters::default(); Action::ALL.len()],
            first_request_time: None,
            last_request_time: None,
        }
    }

    /// Record a successful action.
    pub fn record_success(&mut self, action: Action, latency_us: u64) {
        self.requests_total += 1;
        self.requests_success += 1;
        self.per_action[action_index(action)].success += 1;
        self.histogram.record(latency_us).ok();
        self.touch();
    }

    /// Record a failed action.
    pub fn record_failure(&mut self, action: Action, latency_us: u64) {
        self.requests_total += 1;
        self.requests_failed += 1;
        self.per_action[action_index(action)].failed += 1;
        self.histogram.record(latency_us).ok();
        self.touch();
    }

    fn touch(&mut self) {
        let now = Instant::now();
        if self.first_request_time.is_none() {
            self.first_request_time = Some(now);
        }
        self.last_request_time = Some(now);
    }

    /// Generate final test results.
    pub fn results(&self, config_name: String, users: u32) -> TestResults {
        let duration = self
            .last_request_time
            .and_then(|last| self.first_request_time.map(|first| last.duration_since(first)))
            .unwrap_or_default();

        let duration_secs = duration.as_secs_f64();
        let rps = if duration_secs > 0.0 {
            self.requests_total as f64 / duration_secs
        } else {
            0.0
        };

        let actions = Action::ALL
            .iter()
            .map(|&action| {
                let counters = self.per_action[action_index(action)];
                ActionResults {
                    action: action.name().to_string(),
                    requests: counters.success + counters.failed,
                    successful: counters.success,
                    failed: counters.failed,
                }
            })
            .collect();

        TestResults {
            timestamp: chrono::Utc::now().to_rfc3339(),
            config_name,
            duration_secs,
            total_requests: self.requests_total,
            successful_requests: self.requests_success,
            failed_requests: self.requests_failed,
            requests_per_second: rps,
            latency_p50: self.histogram.value_at_percentile(50.0) as f64 / 1000.0,
            latency_p75: self.histogram.value_at_percentile(75.0) as f64 / 1000.0,
            latency_p90: self.histogram.value_at_percentile(90.0) as f64 / 1000.0,
            latency_p95: self.histogram.value_at_percentile(95.0) as f64 / 1000.0,
            latency_p99: self.histogram.value_at_percentile(99.0) as f64 / 1000.0,
            latency_min: self.histogram.min() as f64 / 1000.0,
            latency_max: self.histogram.max() as f64 / 1000.0,
            latency_avg: self.histogram.mean() / 1000.0,
            actions,
            users,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Final test results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResults {
    pub timestamp: String,
    pub config_name: String,
    pub duration_secs: f64,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub requests_per_second: f64,

    // Latency percentiles (ms)
    pub latency_p50: f64,
    pub latency_p75: f64,
    pub latency_p90: f64,
    pub latency_p95: f64,
    pub latency_p99: f64,
    pub latency_min: f64,
    pub latency_max: f64,
    pub latency_avg: f64,

    // Per-action breakdown
    pub actions: Vec<ActionResults>,

    // Test configuration
    pub users: u32,
}

/// Success/failure counts for one action type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResults {
    pub action: String,
    pub requests: u64,
    pub successful: u64,
    pub failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_action_counters() {
        let mut metrics = MetricsCollector::new();
        metrics.record_success(Action::GetBook, 1_000);
        metrics.record_success(Action::GetBook, 2_000);
        metrics.record_failure(Action::GetBook, 3_000);
        metrics.record_success(Action::CreateBook, 5_000);

        let results = metrics.results("test".to_string(), 1);
        assert_eq!(results.total_requests, 4);
        assert_eq!(results.successful_requests, 3);
        assert_eq!(results.failed_requests, 1);

        let get = results.actions.iter().find(|a| a.action == "get_book").unwrap();
        assert_eq!(get.requests, 3);
        assert_eq!(get.successful, 2);
        assert_eq!(get.failed, 1);

        let delete = results
            .actions
            .iter()
            .find(|a| a.action == "delete_book")
            .unwrap();
        assert_eq!(delete.requests, 0);
    }

    #[test]
    fn test_empty_collector_results() {
        let metrics = MetricsCollector::new();
        let results = metrics.results("empty".to_string(), 5);
        assert_eq!(results.total_requests, 0);
        assert_eq!(results.requests_per_second, 0.0);
        assert_eq!(results.actions.len(), 4);
    }
}
