use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// WhatsApp Cloud API
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Outbound chat channel and inbound webhook settings.
///
/// All credentials are referenced by environment variable name and read once
/// at startup.  Missing credentials do not stop the server: every send then
/// fails with a configuration error that callers account like any other
/// per-recipient failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    #[serde(default = "d_api_base")]
    pub api_base: String,
    #[serde(default = "d_api_version")]
    pub api_version: String,
    #[serde(default = "d_access_token_env")]
    pub access_token_env: String,
    #[serde(default = "d_phone_number_id_env")]
    pub phone_number_id_env: String,
    /// Shared secret echoed back during the webhook verification handshake.
    #[serde(default = "d_verify_token_env")]
    pub verify_token_env: String,
    /// App secret used to check `X-Hub-Signature-256` on event deliveries.
    /// When the env var is unset, signatures are not checked.
    #[serde(default = "d_app_secret_env")]
    pub app_secret_env: String,
    /// Country prefix assumed for bare national numbers.
    #[serde(default = "d_country_code")]
    pub default_country_code: String,
    /// Mark each inbound message as read before replying.
    #[serde(default = "d_true")]
    pub mark_read: bool,
    #[serde(default = "d_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            api_base: d_api_base(),
            api_version: d_api_version(),
            access_token_env: d_access_token_env(),
            phone_number_id_env: d_phone_number_id_env(),
            verify_token_env: d_verify_token_env(),
            app_secret_env: d_app_secret_env(),
            default_country_code: d_country_code(),
            mark_read: true,
            timeout_secs: d_timeout_secs(),
        }
    }
}

fn d_api_base() -> String {
    "https://graph.facebook.com".into()
}
fn d_api_version() -> String {
    "v24.0".into()
}
fn d_access_token_env() -> String {
    "WHATSAPP_ACCESS_TOKEN".into()
}
fn d_phone_number_id_env() -> String {
    "WHATSAPP_PHONE_NUMBER_ID".into()
}
fn d_verify_token_env() -> String {
    "WEBHOOK_VERIFY_TOKEN".into()
}
fn d_app_secret_env() -> String {
    "WHATSAPP_APP_SECRET".into()
}
fn d_country_code() -> String {
    "91".into()
}
fn d_true() -> bool {
    true
}
fn d_timeout_secs() -> u64 {
    15
}
