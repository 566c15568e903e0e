use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tenant directory
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// JSON snapshot loaded into the in-process tenant store at startup.
    /// When `None`, the store starts empty.  The file is read once and never
    /// written: writes made through the data routes last until restart.
    #[serde(default)]
    pub seed_path: Option<PathBuf>,
    /// Display name used when a tenant has no `settings/general.schoolName`.
    #[serde(default = "d_tenant_name")]
    pub default_tenant_name: String,
    /// Fields that support cross-tenant (collection-group) equality queries.
    /// Querying any other field fails with a missing-index error.
    #[serde(default = "d_indexed_fields")]
    pub indexed_group_fields: Vec<String>,
    /// IANA timezone that decides what "today" means for daily digests.
    #[serde(default = "d_timezone")]
    pub timezone: String,
    #[serde(default = "d_students_ttl")]
    pub students_ttl_secs: u64,
    #[serde(default = "d_tenant_name_ttl")]
    pub tenant_name_ttl_secs: u64,
    #[serde(default = "d_contacts_ttl")]
    pub contacts_ttl_secs: u64,
    #[serde(default = "d_feed_ttl")]
    pub feed_ttl_secs: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            seed_path: None,
            default_tenant_name: d_tenant_name(),
            indexed_group_fields: d_indexed_fields(),
            timezone: d_timezone(),
            students_ttl_secs: d_students_ttl(),
            tenant_name_ttl_secs: d_tenant_name_ttl(),
            contacts_ttl_secs: d_contacts_ttl(),
            feed_ttl_secs: d_feed_ttl(),
        }
    }
}

fn d_tenant_name() -> String {
    "School".into()
}
fn d_indexed_fields() -> Vec<String> {
    vec!["parentPhone".into(), "alternateParentPhone".into()]
}
fn d_timezone() -> String {
    "Asia/Kolkata".into()
}
fn d_students_ttl() -> u64 {
    600
}
fn d_tenant_name_ttl() -> u64 {
    86_400
}
fn d_contacts_ttl() -> u64 {
    3_600
}
fn d_feed_ttl() -> u64 {
    300
}
