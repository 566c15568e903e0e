//! Phone identity resolution.
//!
//! Maps an arbitrary phone number to every student linked to it across all
//! tenants.  Each variant of the number is looked up against both contact
//! fields concurrently; lookups that fail are dropped from the result rather
//! than failing the call.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures_util::future::join_all;

use es_cache::{CacheAside, CachePolicy};
use es_domain::config::DirectoryConfig;
use es_domain::error::{Error, Result};
use es_domain::phone;
use es_domain::student::{guardian_name, StudentRecord, DEFAULT_STUDENT_NAME};
use es_domain::trace::TraceEvent;

use crate::keys;
use crate::store::{Document, TenantStore, GENERAL_SETTINGS, SETTINGS, STUDENTS};

/// Student fields holding a guardian's phone number.
pub const PHONE_FIELDS: [&str; 2] = ["parentPhone", "alternateParentPhone"];

#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub country_code: String,
    pub default_tenant_name: String,
    pub students_ttl_secs: u64,
    pub tenant_name_ttl_secs: u64,
}

impl ResolverSettings {
    pub fn from_config(directory: &DirectoryConfig, country_code: &str) -> Self {
        Self {
            country_code: country_code.to_owned(),
            default_tenant_name: directory.default_tenant_name.clone(),
            students_ttl_secs: directory.students_ttl_secs,
            tenant_name_ttl_secs: directory.tenant_name_ttl_secs,
        }
    }
}

pub struct IdentityResolver {
    store: Arc<dyn TenantStore>,
    cache: CacheAside,
    settings: ResolverSettings,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn TenantStore>, cache: CacheAside, settings: ResolverSettings) -> Self {
        Self {
            store,
            cache,
            settings,
        }
    }

    /// Every student linked to `raw_phone`, or an empty list.
    ///
    /// Results are cached per normalized number.  A call where every lookup
    /// failed is not cached.
    pub async fn find_students_by_identity(&self, raw_phone: &str) -> Vec<StudentRecord> {
        let normalized = phone::normalize(raw_phone);
        if normalized.is_empty() {
            return Vec::new();
        }

        let key = keys::students(&normalized);
        let policy = CachePolicy::fixed_secs(self.settings.students_ttl_secs);
        match self
            .cache
            .get_or_compute(&key, policy, || self.lookup(&normalized))
            .await
        {
            Ok(students) => students,
            Err(e) => {
                tracing::warn!(phone = %normalized, error = %e, "identity resolution failed");
                Vec::new()
            }
        }
    }

    /// Drop cached resolutions for every variant of `raw_phone`.
    pub async fn invalidate_phone(&self, raw_phone: &str) {
        for key in keys::students_all_variants(raw_phone, &self.settings.country_code) {
            self.cache.invalidate(&key).await;
        }
    }

    /// Display name for a tenant, cached for a long window.
    pub async fn tenant_name(&self, tenant: &str) -> String {
        let key = keys::tenant_name(tenant);
        let policy = CachePolicy::fixed_secs(self.settings.tenant_name_ttl_secs);
        match self
            .cache
            .get_or_compute(&key, policy, || self.fetch_tenant_name(tenant))
            .await
        {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!(tenant_id = tenant, error = %e, "tenant name lookup failed");
                self.settings.default_tenant_name.clone()
            }
        }
    }

    async fn fetch_tenant_name(&self, tenant: &str) -> Result<String> {
        let doc = self.store.get(tenant, SETTINGS, GENERAL_SETTINGS).await?;
        Ok(doc
            .and_then(|d| d.str_field("schoolName"))
            .unwrap_or_else(|| self.settings.default_tenant_name.clone()))
    }

    async fn lookup(&self, normalized: &str) -> Result<Vec<StudentRecord>> {
        let variants = phone::variants(normalized, &self.settings.country_code);
        tracing::debug!(phone = %normalized, variants = ?variants, "identity lookup");

        let lookups = variants
            .iter()
            .flat_map(|v| PHONE_FIELDS.iter().map(move |f| (v.as_str(), *f)));
        let results = join_all(lookups.map(|(variant, field)| async move {
            (variant, field, self.store.query_group(STUDENTS, field, variant).await)
        }))
        .await;

        let attempted = results.len();
        let mut failed = 0;
        let mut seen = HashSet::new();
        let mut matches: Vec<Document> = Vec::new();

        for (variant, field, result) in results {
            match result {
                Ok(docs) => {
                    for doc in docs {
                        if seen.insert((doc.tenant_id.clone(), doc.id.clone())) {
                            matches.push(doc);
                        }
                    }
                }
                Err(Error::MissingIndex { collection, field }) => {
                    failed += 1;
                    tracing::error!(
                        collection = %collection,
                        field = %field,
                        hint = "create a collection-group index on this field",
                        "identity lookup needs a missing index"
                    );
                }
                Err(e) => {
                    failed += 1;
                    tracing::warn!(variant, field, error = %e, "identity lookup failed");
                }
            }
        }

        if attempted > 0 && failed == attempted {
            return Err(Error::Store(format!(
                "all {attempted} identity lookups failed"
            )));
        }

        let mut tenants: Vec<&str> = Vec::new();
        for doc in &matches {
            if !tenants.contains(&doc.tenant_id.as_str()) {
                tenants.push(&doc.tenant_id);
            }
        }
        let names = join_all(tenants.iter().map(|t| self.tenant_name(t))).await;
        let names: HashMap<&str, String> = tenants.into_iter().zip(names).collect();

        let students: Vec<StudentRecord> = matches
            .iter()
            .map(|doc| {
                let tenant_name = names
                    .get(doc.tenant_id.as_str())
                    .cloned()
                    .unwrap_or_else(|| self.settings.default_tenant_name.clone());
                student_from_doc(doc, tenant_name)
            })
            .collect();

        TraceEvent::IdentityResolved {
            phone: normalized.to_owned(),
            variants: variants.len(),
            students: students.len(),
            failed_lookups: failed,
        }
        .emit();

        Ok(students)
    }
}

/// Project a student document into the record shown to guardians.
pub fn student_from_doc(doc: &Document, tenant_name: String) -> StudentRecord {
    let father = doc.str_field("fatherName");
    let mother = doc.str_field("motherName");
    let parent = doc.str_field("parentName");
    StudentRecord {
        student_id: doc.id.clone(),
        tenant_id: doc.tenant_id.clone(),
        tenant_name,
        parent_name: guardian_name(father.as_deref(), mother.as_deref(), parent.as_deref()),
        student_name: doc
            .str_field("name")
            .unwrap_or_else(|| DEFAULT_STUDENT_NAME.to_owned()),
        class_grade: doc
            .str_field("class")
            .or_else(|| doc.str_field("classGrade"))
            .unwrap_or_default(),
        section: doc.str_field("section").unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn doc(data: Value) -> Document {
        let data: Map<String, Value> = match data {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        };
        Document {
            id: "s1".into(),
            tenant_id: "t1".into(),
            data,
        }
    }

    #[test]
    fn projection_applies_guardian_policy() {
        let s = student_from_doc(
            &doc(json!({"name": "Aarav", "motherName": "Priya", "parentName": "X", "class": 5, "section": "A"})),
            "Green Valley".into(),
        );
        assert_eq!(s.parent_name, "Priya");
        assert_eq!(s.class_grade, "5");
        assert_eq!(s.tenant_name, "Green Valley");
    }

    #[test]
    fn projection_fills_placeholders() {
        let s = student_from_doc(&doc(json!({"classGrade": "7"})), "School".into());
        assert_eq!(s.student_name, DEFAULT_STUDENT_NAME);
        assert_eq!(s.parent_name, "Parent");
        assert_eq!(s.class_grade, "7");
        assert_eq!(s.section, "");
    }
}
