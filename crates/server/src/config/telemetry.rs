use std::collections::HashMap;

use serde::Deserialize;

/// `[telemetry]`: optional OTLP export of tracing spans.
///
/// When enabled, the `coordinator.book` and `coordinator.cancel` spans and
/// the HTTP request spans are shipped to a collector in addition to the
/// local log output.
///
/// ```toml
/// [telemetry]
/// enabled = true
/// endpoint = "http://otel-collector:4317"
/// sample_ratio = 0.25
/// ```
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub enabled: bool,
    /// Collector endpoint.
    pub endpoint: String,
    /// Reported as `service.name`.
    pub service_name: String,
    /// Fraction of traces kept, clamped to `0.0..=1.0`.
    pub sample_ratio: f64,
    /// `"grpc"` or `"http"`.
    pub protocol: String,
    /// Export timeout in seconds.
    pub timeout_seconds: u64,
    /// Extra resource attributes attached to every span.
    pub resource_attributes: HashMap<String, String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "http://localhost:4317".into(),
            service_name: "slotguard".into(),
            sample_ratio: 1.0,
            protocol: "grpc".into(),
            timeout_seconds: 10,
            resource_attributes: HashMap::new(),
        }
    }
}
