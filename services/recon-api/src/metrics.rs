//! Prometheus metrics for the reconstruction pipeline.

use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};

pub const REQUESTS_TOTAL: &str = "recon_requests_total";
pub const POINTS_TOTAL: &str = "recon_points_total";
pub const PROCESSING_SECONDS: &str = "recon_processing_seconds";
pub const STORAGE_FAILURES_TOTAL: &str = "recon_storage_failures_total";

/// Register metric descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(
        REQUESTS_TOTAL,
        "Reconstruction requests by input type and outcome"
    );
    describe_counter!(POINTS_TOTAL, "Gaussian points produced across all requests");
    describe_histogram!(
        PROCESSING_SECONDS,
        Unit::Seconds,
        "End-to-end reconstruction time"
    );
    describe_counter!(
        STORAGE_FAILURES_TOTAL,
        "Encoded files that could not be persisted"
    );
}

/// Count one finished request. `outcome` is `ok` or an error kind.
pub fn record_request(input_type: &'static str, outcome: &'static str) {
    counter!(REQUESTS_TOTAL, "input_type" => input_type, "outcome" => outcome).increment(1);
}

pub fn record_points(points: usize) {
    counter!(POINTS_TOTAL).increment(points as u64);
}

pub fn record_processing_time(elapsed: Duration) {
    histogram!(PROCESSING_SECONDS).record(elapsed.as_secs_f64());
}

pub fn record_storage_failure() {
    counter!(STORAGE_FAILURES_TOTAL).increment(1);
}
