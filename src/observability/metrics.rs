//! Client-side metrics
//!
//! Recorded through the `metrics` facade; nothing is exported unless the host
//! application installs a recorder. Names follow `esg_client_{name}[_total]`.

use crate::types::AcquisitionStage;
use std::sync::Once;

/// Builds a metric name with the crate's prefix and the Prometheus suffix for its type.
macro_rules! client_metric {
    (counter, $name:literal) => {
        concat!("esg_client_", $name, "_total")
    };
    (histogram, $name:literal) => {
        concat!("esg_client_", $name)
    };
}

static REGISTER: Once = Once::new();

/// Documentation for a single metric
#[derive(Debug, Clone)]
pub struct MetricDoc {
    pub name: &'static str,
    pub help: &'static str,
}

pub fn metrics_documentation() -> Vec<MetricDoc> {
    vec![
        MetricDoc { name: client_metric!(counter, "cache_hits"), help: "Responses served from the response cache" },
        MetricDoc { name: client_metric!(counter, "cache_misses"), help: "Cacheable requests that missed the cache" },
        MetricDoc { name: client_metric!(counter, "requests"), help: "Requests that received a response, by status class" },
        MetricDoc { name: client_metric!(counter, "transport_failures"), help: "Requests that received no response" },
        MetricDoc { name: client_metric!(counter, "static_fallbacks"), help: "Responses substituted by a bundled asset" },
        MetricDoc { name: client_metric!(counter, "download_stages"), help: "Download stage attempts, by stage and result" },
        MetricDoc { name: client_metric!(histogram, "request_duration_seconds"), help: "Round-trip time of requests" },
        MetricDoc { name: client_metric!(histogram, "saved_bytes"), help: "Size of documents handed to the download sink" },
    ]
}

/// Describe every metric once. Idempotent.
pub fn register_metrics() {
    REGISTER.call_once(|| {
        use ::metrics::{describe_counter, describe_histogram};
        for doc in metrics_documentation() {
            if doc.name.ends_with("_total") {
                describe_counter!(doc.name, doc.help);
            } else {
                describe_histogram!(doc.name, doc.help);
            }
        }
    });
}

pub struct ClientMetrics;

impl ClientMetrics {
    pub fn cache_hit() {
        ::metrics::counter!(client_metric!(counter, "cache_hits")).increment(1);
    }

    pub fn cache_miss() {
        ::metrics::counter!(client_metric!(counter, "cache_misses")).increment(1);
    }

    pub fn request_completed(status: u16, duration_secs: f64) {
        let class = match status {
            200..=299 => "2xx",
            300..=399 => "3xx",
            400..=499 => "4xx",
            _ => "5xx",
        };
        ::metrics::counter!(client_metric!(counter, "requests"), "status" => class).increment(1);
        ::metrics::histogram!(client_metric!(histogram, "request_duration_seconds")).record(duration_secs);
    }

    pub fn transport_failure() {
        ::metrics::counter!(client_metric!(counter, "transport_failures")).increment(1);
    }

    pub fn static_fallback_used() {
        ::metrics::counter!(client_metric!(counter, "static_fallbacks")).increment(1);
    }

    pub fn download_stage(stage: AcquisitionStage, success: bool) {
        let result = if success { "success" } else { "failure" };
        ::metrics::counter!(
            client_metric!(counter, "download_stages"),
            "stage" => stage.as_str(),
            "result" => result
        )
        .increment(1);
    }

    pub fn saved(bytes: usize) {
        ::metrics::histogram!(client_metric!(histogram, "saved_bytes")).record(bytes as f64);
    }
}
