use serde::{Deserialize, Serialize};

use super::ConfigError;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// HTTP listener
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The provider must reach the webhook, so the default binds every
    /// interface.
    #[serde(default = "d_host")]
    pub host: String,
    #[serde(default = "d_port")]
    pub port: u16,
    /// Env var holding the bearer token for the admin and data routes.  The
    /// webhook and `/health` are never gated by it.  Unset means open access.
    #[serde(default = "d_api_token_env")]
    pub api_token_env: String,
    #[serde(default)]
    pub cors: CorsConfig,
    /// Largest accepted request body.  Bounds student batch uploads and
    /// webhook deliveries alike.
    #[serde(default = "d_max_body_bytes")]
    pub max_body_bytes: usize,
    #[serde(default = "d_max_concurrent")]
    pub max_concurrent_requests: usize,
    /// Per-IP limiting; off when absent.
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: d_host(),
            port: d_port(),
            api_token_env: d_api_token_env(),
            cors: CorsConfig::default(),
            max_body_bytes: d_max_body_bytes(),
            max_concurrent_requests: d_max_concurrent(),
            rate_limit: None,
        }
    }
}

/// Token bucket per client IP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub requests_per_second: u64,
    pub burst_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Exact origins, `scheme://host:*` for any port, or `["*"]`.
    #[serde(default = "d_cors_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: d_cors_origins(),
        }
    }
}

impl ServerConfig {
    pub(crate) fn check(&self, issues: &mut Vec<ConfigError>) {
        if self.port == 0 {
            issues.push(ConfigError::error("server.port", "must be greater than 0"));
        }
        if self.host.trim().is_empty() {
            issues.push(ConfigError::error("server.host", "must not be empty"));
        }
        if self.api_token_env.trim().is_empty() {
            issues.push(ConfigError::error(
                "server.api_token_env",
                "must name an environment variable",
            ));
        }
        if self.max_concurrent_requests == 0 {
            issues.push(ConfigError::error(
                "server.max_concurrent_requests",
                "must be greater than 0",
            ));
        }
        if self.max_body_bytes < MIN_BODY_BYTES {
            issues.push(ConfigError::error(
                "server.max_body_bytes",
                "too small for a webhook delivery (minimum 16 KiB)",
            ));
        }
        if let Some(rl) = &self.rate_limit {
            if rl.requests_per_second == 0 || rl.burst_size == 0 {
                issues.push(ConfigError::error(
                    "server.rate_limit",
                    "requests_per_second and burst_size must be greater than 0",
                ));
            }
        }
        if self.cors.allowed_origins.iter().any(|o| o == "*") {
            issues.push(ConfigError::warning(
                "server.cors.allowed_origins",
                "\"*\" lets any site call the admin API from a browser",
            ));
        }
    }
}

const MIN_BODY_BYTES: usize = 16 * 1024;

fn d_host() -> String {
    "0.0.0.0".into()
}
fn d_port() -> u16 {
    8000
}
fn d_api_token_env() -> String {
    "EDUSYNC_API_TOKEN".into()
}
fn d_cors_origins() -> Vec<String> {
    vec![
        "https://edusync.vercel.app".into(),
        "http://localhost:*".into(),
    ]
}
fn d_max_body_bytes() -> usize {
    2 * 1024 * 1024
}
fn d_max_concurrent() -> usize {
    256
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issues(cfg: &ServerConfig) -> Vec<ConfigError> {
        let mut out = Vec::new();
        cfg.check(&mut out);
        out
    }

    #[test]
    fn defaults_listen_publicly_and_allow_the_parent_app() {
        let cfg: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8000);
        assert!(cfg
            .cors
            .allowed_origins
            .contains(&"https://edusync.vercel.app".to_owned()));
        assert!(cfg.rate_limit.is_none());
        assert!(issues(&cfg).is_empty());
    }

    #[test]
    fn zero_rate_limit_is_rejected() {
        let cfg: ServerConfig = toml::from_str(
            r#"
            [rate_limit]
            requests_per_second = 0
            burst_size = 20
            "#,
        )
        .unwrap();
        let found = issues(&cfg);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].field, "server.rate_limit");
    }

    #[test]
    fn tiny_body_limit_is_rejected() {
        let cfg = ServerConfig {
            max_body_bytes: 1024,
            ..Default::default()
        };
        assert!(issues(&cfg).iter().any(|i| i.field == "server.max_body_bytes"));
    }

    #[test]
    fn wildcard_origin_only_warns() {
        let cfg = ServerConfig {
            cors: CorsConfig {
                allowed_origins: vec!["*".into()],
            },
            ..Default::default()
        };
        let found = issues(&cfg);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, super::super::ConfigSeverity::Warning);
    }
}
