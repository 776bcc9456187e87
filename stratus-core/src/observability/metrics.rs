//! Run metrics.
//!
//! All metrics follow Prometheus naming conventions:
//! - `_total` suffix for counters
//! - `_seconds` suffix for histograms measuring duration
//!
//! Nothing is exported unless the embedding application installs a recorder.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Register all run metrics with descriptions.
pub fn register_run_metrics() {
    describe_counter!(
        "stratus_stack_requests_total",
        "Create/delete requests issued to the provider (by operation)"
    );
    describe_counter!(
        "stratus_stack_failures_total",
        "Stacks that ended in an unexpected status (by operation, status)"
    );
    describe_histogram!(
        "stratus_stack_settle_duration_seconds",
        "Time from task start to terminal state (by operation)"
    );
}

pub fn record_stack_request(operation: &'static str) {
    counter!("stratus_stack_requests_total", "operation" => operation).increment(1);
}

pub fn record_stack_failure(operation: &'static str, status: &str) {
    counter!(
        "stratus_stack_failures_total",
        "operation" => operation,
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_stack_settled(operation: &'static str, elapsed: Duration) {
    histogram!("stratus_stack_settle_duration_seconds", "operation" => operation)
        .record(elapsed.as_secs_f64());
}
