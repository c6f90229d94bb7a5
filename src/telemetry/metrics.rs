//! Prometheus metrics setup and metric definitions

use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_prometheus_recorder() -> Result<PrometheusHandle> {
    let buckets = [
        0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ];

    PrometheusBuilder::new()
        .set_buckets(&buckets)
        .context("failed to set histogram buckets")?
        .install_recorder()
        .context("failed to install Prometheus recorder")
}

/// Register metric descriptions and emit initial zero values so the
/// exposition contains every series from startup.
pub fn describe_metrics() {
    describe_counter!("portcullis_http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "portcullis_http_request_duration_seconds",
        "HTTP request duration in seconds"
    );

    describe_counter!(
        "portcullis_auth_resolutions_total",
        "Request identity resolutions by winning mechanism"
    );
    describe_counter!(
        "portcullis_auth_lookup_errors_total",
        "Unexpected directory or session failures during identity resolution"
    );
    describe_counter!(
        "portcullis_auth_auto_registrations_total",
        "Reverse-proxy auto-registration outcomes"
    );

    for method in ["access_token", "session", "reverse_proxy", "basic", "anonymous"] {
        counter!("portcullis_auth_resolutions_total", "method" => method).absolute(0);
    }
    for operation in [
        "find_access_token_by_sha",
        "find_user_by_id",
        "find_user_by_name",
        "session_get",
    ] {
        counter!("portcullis_auth_lookup_errors_total", "operation" => operation).absolute(0);
    }
    for result in ["created", "raced", "invalid", "failed"] {
        counter!("portcullis_auth_auto_registrations_total", "result" => result).absolute(0);
    }
}
