//! Shared helpers for backend adapters.

use es_domain::error::{Error, Result};

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
///
/// Timeout errors map to [`Error::Timeout`]; everything else maps to
/// [`Error::Http`].
pub(crate) fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

/// Read an API key from the named environment variable.
pub fn resolve_api_key(env_var: &str) -> Result<String> {
    std::env::var(env_var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| {
            Error::Config(format!(
                "environment variable '{env_var}' not set or not valid UTF-8"
            ))
        })
}

/// Redact the `key=` query parameter so URLs are safe to log.
pub fn redact_url_key(url: &str) -> String {
    if let Some(idx) = url.find("key=") {
        let prefix = &url[..idx + 4];
        let rest = &url[idx + 4..];
        let end = rest.find('&').unwrap_or(rest.len());
        format!("{prefix}[REDACTED]{}", &rest[end..])
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_key_and_keeps_other_params() {
        assert_eq!(
            redact_url_key("https://h/v1beta/models/m:generateContent?key=abc123&alt=sse"),
            "https://h/v1beta/models/m:generateContent?key=[REDACTED]&alt=sse"
        );
        assert_eq!(redact_url_key("https://h/path"), "https://h/path");
    }

    #[test]
    fn unset_key_is_config_error() {
        assert!(matches!(
            resolve_api_key("ES_TEST_UNSET_TUTOR_KEY"),
            Err(Error::Config(_))
        ));
    }
}
