//! Student roster: listing, admin writes, and the parent contact sheet used
//! to target broadcasts.

use std::sync::Arc;

use serde_json::{Map, Value};

use es_cache::{CacheAside, CachePolicy};
use es_domain::error::{Error, Result};
use es_domain::student::{guardian_name, ParentContact};

use crate::keys;
use crate::store::{Direction, Document, Query, TenantStore, STUDENTS};

/// Most students accepted by one batch insert.
pub const MAX_BATCH_INSERT: usize = 500;

#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    pub class_grade: Option<String>,
    pub section: Option<String>,
    /// Case-insensitive substring match on the student name.
    pub search: Option<String>,
    pub limit: Option<usize>,
}

pub struct Roster {
    store: Arc<dyn TenantStore>,
    cache: CacheAside,
    contacts_ttl_secs: u64,
    country_code: String,
}

impl Roster {
    pub fn new(
        store: Arc<dyn TenantStore>,
        cache: CacheAside,
        contacts_ttl_secs: u64,
        country_code: &str,
    ) -> Self {
        Self {
            store,
            cache,
            contacts_ttl_secs,
            country_code: country_code.to_owned(),
        }
    }

    pub async fn list_students(&self, tenant: &str, filter: &StudentFilter) -> Result<Vec<Value>> {
        let mut query = Query::new();
        if let Some(class_grade) = &filter.class_grade {
            query = query.eq("class", class_grade.as_str());
        }
        if let Some(section) = &filter.section {
            query = query.eq("section", section.as_str());
        }
        query = query
            .order_by("name", Direction::Asc)
            .limit(filter.limit.unwrap_or(20));

        let docs = self.store.query(tenant, STUDENTS, &query).await?;
        let needle = filter.search.as_deref().map(str::to_lowercase);
        Ok(docs
            .iter()
            .filter(|d| match &needle {
                Some(n) => d
                    .str_field("name")
                    .map(|name| name.to_lowercase().contains(n.as_str()))
                    .unwrap_or(false),
                None => true,
            })
            .map(Document::to_json)
            .collect())
    }

    pub async fn add_student(&self, tenant: &str, data: Map<String, Value>) -> Result<String> {
        let id = self.store.add(tenant, STUDENTS, data).await?;
        self.after_roster_change(tenant).await;
        Ok(id)
    }

    /// Insert up to [`MAX_BATCH_INSERT`] students; extras are ignored.
    /// Returns how many were inserted.
    pub async fn add_students(&self, tenant: &str, students: Vec<Value>) -> Result<usize> {
        let mut added = 0;
        for student in students.into_iter().take(MAX_BATCH_INSERT) {
            let Value::Object(data) = student else {
                return Err(Error::Other("each student must be a JSON object".into()));
            };
            self.store.add(tenant, STUDENTS, data).await?;
            added += 1;
        }
        self.after_roster_change(tenant).await;
        Ok(added)
    }

    /// Patch a student.  When the patch carries a new `parentPhone`, cached
    /// identity resolutions for that number are dropped.
    pub async fn update_student(
        &self,
        tenant: &str,
        student_id: &str,
        patch: Map<String, Value>,
    ) -> Result<()> {
        let new_phone = patch.get("parentPhone").and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

        self.store.update(tenant, STUDENTS, student_id, patch).await?;

        self.cache.invalidate(&keys::parent_contacts(tenant)).await;
        if let Some(phone) = new_phone {
            for key in keys::students_all_variants(&phone, &self.country_code) {
                self.cache.invalidate(&key).await;
            }
        }
        Ok(())
    }

    /// Every guardian with an email or phone, cached per tenant.
    pub async fn parent_contacts(&self, tenant: &str) -> Result<Vec<ParentContact>> {
        let key = keys::parent_contacts(tenant);
        self.cache
            .get_or_compute(&key, CachePolicy::fixed_secs(self.contacts_ttl_secs), || async {
                let docs = self.store.query(tenant, STUDENTS, &Query::new()).await?;
                Ok::<_, Error>(docs.iter().filter_map(contact_from_doc).collect())
            })
            .await
    }

    async fn after_roster_change(&self, tenant: &str) {
        self.cache.invalidate(&keys::parent_contacts(tenant)).await;
        self.cache.invalidate(&keys::dashboard(tenant)).await;
    }
}

fn contact_from_doc(doc: &Document) -> Option<ParentContact> {
    let email = doc.str_field("parentEmail").unwrap_or_default();
    let phone = doc.str_field("parentPhone").unwrap_or_default();
    if email.is_empty() && phone.is_empty() {
        return None;
    }
    let father = doc.str_field("fatherName");
    let mother = doc.str_field("motherName");
    Some(ParentContact {
        email,
        phone,
        alternate_phone: doc.str_field("alternateParentPhone").unwrap_or_default(),
        name: guardian_name(father.as_deref(), mother.as_deref(), None),
        student_id: doc.id.clone(),
        student_name: doc.str_field("name").unwrap_or_default(),
        class_grade: doc.str_field("class").unwrap_or_default(),
        section: doc.str_field("section").unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTenantStore;
    use es_cache::MemoryTier;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    fn roster() -> (Arc<MemoryTenantStore>, CacheAside, Roster) {
        let store = Arc::new(MemoryTenantStore::new(["parentPhone"]));
        let cache = CacheAside::new(Arc::new(MemoryTier::new(100)));
        let roster = Roster::new(store.clone(), cache.clone(), 3600, "91");
        (store, cache, roster)
    }

    #[tokio::test]
    async fn contacts_skip_students_without_channels() {
        let (store, _, roster) = roster();
        store.put("t", "students", "s1", obj(json!({"name": "A", "parentPhone": "9876543210", "motherName": "Priya"})));
        store.put("t", "students", "s2", obj(json!({"name": "B"})));
        store.put("t", "students", "s3", obj(json!({"name": "C", "parentEmail": "c@example.com"})));

        let contacts = roster.parent_contacts("t").await.unwrap();
        assert_eq!(contacts.len(), 2);
        let a = contacts.iter().find(|c| c.student_id == "s1").unwrap();
        assert_eq!(a.name, "Priya");
        let c = contacts.iter().find(|c| c.student_id == "s3").unwrap();
        assert_eq!(c.name, "Parent");
    }

    #[tokio::test]
    async fn adding_a_student_refreshes_contacts() {
        let (_, _, roster) = roster();
        assert!(roster.parent_contacts("t").await.unwrap().is_empty());

        roster
            .add_student("t", obj(json!({"name": "A", "parentPhone": "1"})))
            .await
            .unwrap();
        assert_eq!(roster.parent_contacts("t").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn batch_insert_is_capped() {
        let (store, _, roster) = roster();
        let students: Vec<Value> = (0..MAX_BATCH_INSERT + 5).map(|i| json!({"name": i.to_string()})).collect();
        let added = roster.add_students("t", students).await.unwrap();
        assert_eq!(added, MAX_BATCH_INSERT);
        assert_eq!(store.count("t", "students").await.unwrap(), MAX_BATCH_INSERT);
    }

    #[tokio::test]
    async fn phone_update_drops_every_variant_key() {
        let (store, cache, roster) = roster();
        store.put("t", "students", "s1", obj(json!({"name": "A"})));
        for key in ["students:9876543210", "students:919876543210"] {
            cache
                .get_or_compute(key, CachePolicy::fixed_secs(600), || async {
                    Ok::<_, Error>(vec!["stale".to_owned()])
                })
                .await
                .unwrap();
            assert!(cache.peek::<Vec<String>>(key).await.is_some());
        }

        roster
            .update_student("t", "s1", obj(json!({"parentPhone": "98765 43210"})))
            .await
            .unwrap();

        assert!(cache.peek::<Vec<String>>("students:9876543210").await.is_none());
        assert!(cache.peek::<Vec<String>>("students:919876543210").await.is_none());
    }

    #[tokio::test]
    async fn search_filters_by_name_substring() {
        let (store, _, roster) = roster();
        store.put("t", "students", "s1", obj(json!({"name": "Aarav", "class": "5"})));
        store.put("t", "students", "s2", obj(json!({"name": "Diya", "class": "5"})));
        store.put("t", "students", "s3", obj(json!({"name": "Arjun", "class": "6"})));

        let filter = StudentFilter {
            class_grade: Some("5".into()),
            search: Some("AAR".into()),
            ..Default::default()
        };
        let rows = roster.list_students("t", &filter).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], "s1");
    }
}
