use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Email (SMTP)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "d_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "d_smtp_port")]
    pub smtp_port: u16,
    #[serde(default = "d_username_env")]
    pub username_env: String,
    #[serde(default = "d_password_env")]
    pub password_env: String,
    /// Sender address.  Defaults to the SMTP username when `None`.
    #[serde(default)]
    pub from: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: d_smtp_host(),
            smtp_port: d_smtp_port(),
            username_env: d_username_env(),
            password_env: d_password_env(),
            from: None,
        }
    }
}

fn d_smtp_host() -> String {
    "smtp.gmail.com".into()
}
fn d_smtp_port() -> u16 {
    465
}
fn d_username_env() -> String {
    "EMAIL_USER".into()
}
fn d_password_env() -> String {
    "EMAIL_PASS".into()
}
