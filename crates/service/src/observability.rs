use once_cell::sync::Lazy;
use prometheus::{register_histogram, register_int_counter, Encoder, Histogram, IntCounter, TextEncoder};

// Prometheus metrics (default registry)
pub static REQUESTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "dog_finder_requests_total",
        "Total remote API calls issued"
    )
    .expect("register requests_total")
});

pub static REQUEST_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "dog_finder_request_failures_total",
        "Total remote API calls that failed after retries"
    )
    .expect("register request_failures_total")
});

pub static STALE_RESPONSES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "dog_finder_stale_responses_total",
        "Responses discarded because a newer request superseded them"
    )
    .expect("register stale_responses_total")
});

pub static RETRIES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "dog_finder_retries_total",
        "Total retry attempts"
    )
    .expect("register retries_total")
});

pub static REQUEST_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "dog_finder_request_duration_seconds",
        "Remote API call duration in seconds, retries included",
        vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("register request_duration")
});

/// Text exposition of every registered metric.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return format!("# metrics encode error: {e}\n");
    }
    String::from_utf8(buffer).unwrap_or_default()
}
