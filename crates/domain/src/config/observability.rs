use serde::{Deserialize, Serialize};

use super::ConfigError;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Logging & trace export
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// How `edusync serve` logs, and where spans go.
///
/// `RUST_LOG` still overrides `log_filter` when set.  Span export is off
/// unless `otlp_endpoint` is given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    #[serde(default = "d_log_filter")]
    pub log_filter: String,
    /// One JSON object per line (log shippers) or compact text (terminals).
    #[serde(default = "d_json_logs")]
    pub json_logs: bool,
    /// OTLP/gRPC collector, e.g. `http://localhost:4317`.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    /// `service.name` on exported spans.
    #[serde(default = "d_service_name")]
    pub service_name: String,
    /// Fraction of traces exported, `0.0..=1.0`.
    #[serde(default = "d_sample_rate")]
    pub sample_rate: f64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: d_log_filter(),
            json_logs: d_json_logs(),
            otlp_endpoint: None,
            service_name: d_service_name(),
            sample_rate: d_sample_rate(),
        }
    }
}

impl ObservabilityConfig {
    pub(crate) fn check(&self, issues: &mut Vec<ConfigError>) {
        if self.log_filter.trim().is_empty() {
            issues.push(ConfigError::warning(
                "observability.log_filter",
                "empty filter logs errors only",
            ));
        }
        if !(0.0..=1.0).contains(&self.sample_rate) {
            issues.push(ConfigError::error(
                "observability.sample_rate",
                "must be between 0.0 and 1.0",
            ));
        }
        if let Some(endpoint) = &self.otlp_endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                issues.push(ConfigError::error(
                    "observability.otlp_endpoint",
                    "must be an http:// or https:// URL",
                ));
            }
        }
        if self.otlp_endpoint.is_some() && self.service_name.trim().is_empty() {
            issues.push(ConfigError::error(
                "observability.service_name",
                "required when otlp_endpoint is set",
            ));
        }
    }
}

fn d_log_filter() -> String {
    "info,es_gateway=debug".into()
}
fn d_json_logs() -> bool {
    true
}
fn d_service_name() -> String {
    "edusync-gateway".into()
}
fn d_sample_rate() -> f64 {
    1.0
}
