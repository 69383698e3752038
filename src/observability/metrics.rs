//! Metrics collection.
//!
//! # Metrics
//! - `hal_client_requests_total` (counter): requests by method, status
//! - `hal_client_request_duration_seconds` (histogram): latency by method
//! - `hal_client_association_fetches_total` (counter): lazy fetches by relation
//! - `hal_client_association_cache_hits_total` (counter): cached associations by relation
//!
//! Transport failures are recorded with status `0`.

use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};

/// Register metric descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(
        "hal_client_requests_total",
        "Total number of HTTP requests issued by the client"
    );
    describe_histogram!(
        "hal_client_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_counter!(
        "hal_client_association_fetches_total",
        "Linked associations fetched from the server"
    );
    describe_counter!(
        "hal_client_association_cache_hits_total",
        "Linked associations served from a proxy's cache"
    );
}

/// Records a completed request.
pub fn record_request(method: &str, status_code: u16, duration: Duration) {
    counter!(
        "hal_client_requests_total",
        "method" => method.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(
        "hal_client_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Records a lazy association fetch.
pub fn record_association_fetch(rel: &str) {
    counter!("hal_client_association_fetches_total", "rel" => rel.to_string()).increment(1);
}

/// Records an association served from cache.
pub fn record_association_cache_hit(rel: &str) {
    counter!("hal_client_association_cache_hits_total", "rel" => rel.to_string()).increment(1);
}
