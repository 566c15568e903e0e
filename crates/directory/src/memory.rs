//! In-process tenant store, optionally seeded from a JSON snapshot.
//!
//! The store is ephemeral: writes live in memory only and the seed file is
//! never written back, so a restart returns to the seeded state.
//!
//! Snapshot shape:
//!
//! ```json
//! { "tenants": { "<tenant>": { "<collection>": { "<id>": { ... } } } } }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::{Map, Value};

use es_domain::error::{Error, Result};

use crate::store::{compare_values, Direction, Document, Query, TenantStore};

type Collection = BTreeMap<String, Map<String, Value>>;
type Tenant = BTreeMap<String, Collection>;

#[derive(Debug, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub tenants: BTreeMap<String, Tenant>,
}

pub struct MemoryTenantStore {
    tenants: RwLock<BTreeMap<String, Tenant>>,
    group_indexes: HashSet<String>,
    /// Collections without a composite index: filtered + ordered queries
    /// against them fail with `MissingIndex`.
    unindexed_ordering: HashSet<String>,
}

impl MemoryTenantStore {
    /// Empty store.  Cross-tenant lookups are allowed on `group_indexes` only.
    pub fn new<I, S>(group_indexes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tenants: RwLock::new(BTreeMap::new()),
            group_indexes: group_indexes.into_iter().map(Into::into).collect(),
            unindexed_ordering: HashSet::new(),
        }
    }

    pub fn from_snapshot<I, S>(snapshot: Snapshot, group_indexes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new(group_indexes);
        *store.tenants.write() = snapshot.tenants;
        store
    }

    /// Load a snapshot file.
    pub fn load<I, S>(path: &Path, group_indexes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let raw = std::fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&raw)?;
        let docs: usize = snapshot
            .tenants
            .values()
            .flat_map(|t| t.values())
            .map(|c| c.len())
            .sum();
        tracing::info!(
            tenants = snapshot.tenants.len(),
            documents = docs,
            path = %path.display(),
            "tenant store seeded"
        );
        Ok(Self::from_snapshot(snapshot, group_indexes))
    }

    /// Mark `collection` as lacking a composite index.
    pub fn without_ordered_index(mut self, collection: &str) -> Self {
        self.unindexed_ordering.insert(collection.to_owned());
        self
    }

    /// Insert or replace a document under a fixed id.
    pub fn put(&self, tenant: &str, collection: &str, id: &str, data: Map<String, Value>) {
        self.tenants
            .write()
            .entry(tenant.to_owned())
            .or_default()
            .entry(collection.to_owned())
            .or_default()
            .insert(id.to_owned(), data);
    }
}

fn to_doc(tenant: &str, id: &str, data: &Map<String, Value>) -> Document {
    Document {
        id: id.to_owned(),
        tenant_id: tenant.to_owned(),
        data: data.clone(),
    }
}

#[async_trait]
impl TenantStore for MemoryTenantStore {
    async fn query(&self, tenant: &str, collection: &str, query: &Query) -> Result<Vec<Document>> {
        if let Some((field, _)) = &query.order_by {
            if !query.filters.is_empty() && self.unindexed_ordering.contains(collection) {
                return Err(Error::MissingIndex {
                    collection: collection.to_owned(),
                    field: field.clone(),
                });
            }
        }

        let tenants = self.tenants.read();
        let mut docs: Vec<Document> = tenants
            .get(tenant)
            .and_then(|t| t.get(collection))
            .map(|c| {
                c.iter()
                    .filter(|(_, data)| query.matches(data))
                    .map(|(id, data)| to_doc(tenant, id, data))
                    .collect()
            })
            .unwrap_or_default();
        drop(tenants);

        if let Some((field, direction)) = &query.order_by {
            docs.sort_by(|a, b| {
                let ord = compare_values(a.data.get(field), b.data.get(field));
                match direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            });
        }
        if let Some(limit) = query.limit {
            docs.truncate(limit);
        }
        Ok(docs)
    }

    async fn query_group(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>> {
        if !self.group_indexes.contains(field) {
            return Err(Error::MissingIndex {
                collection: collection.to_owned(),
                field: field.to_owned(),
            });
        }

        let wanted = Value::String(value.to_owned());
        let filter = Query::new().eq(field, wanted);
        let tenants = self.tenants.read();
        Ok(tenants
            .iter()
            .filter_map(|(tenant, cols)| cols.get(collection).map(|c| (tenant, c)))
            .flat_map(|(tenant, c)| {
                c.iter()
                    .filter(|(_, data)| filter.matches(data))
                    .map(move |(id, data)| to_doc(tenant, id, data))
            })
            .collect())
    }

    async fn get(&self, tenant: &str, collection: &str, id: &str) -> Result<Option<Document>> {
        Ok(self
            .tenants
            .read()
            .get(tenant)
            .and_then(|t| t.get(collection))
            .and_then(|c| c.get(id))
            .map(|data| to_doc(tenant, id, data)))
    }

    async fn add(
        &self,
        tenant: &str,
        collection: &str,
        data: Map<String, Value>,
    ) -> Result<String> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.put(tenant, collection, &id, data);
        Ok(id)
    }

    async fn update(
        &self,
        tenant: &str,
        collection: &str,
        id: &str,
        patch: Map<String, Value>,
    ) -> Result<()> {
        let mut tenants = self.tenants.write();
        let doc = tenants
            .get_mut(tenant)
            .and_then(|t| t.get_mut(collection))
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| Error::NotFound(format!("{tenant}/{collection}/{id}")))?;
        for (k, v) in patch {
            doc.insert(k, v);
        }
        Ok(())
    }

    async fn count(&self, tenant: &str, collection: &str) -> Result<usize> {
        Ok(self
            .tenants
            .read()
            .get(tenant)
            .and_then(|t| t.get(collection))
            .map(|c| c.len())
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    fn seeded() -> MemoryTenantStore {
        let store = MemoryTenantStore::new(["parentPhone"]);
        store.put("t1", "students", "s1", obj(json!({"name": "A", "parentPhone": "9876543210"})));
        store.put("t2", "students", "s2", obj(json!({"name": "B", "parentPhone": 9876543210u64})));
        store.put("t2", "students", "s3", obj(json!({"name": "C", "parentPhone": "111"})));
        store
    }

    #[tokio::test]
    async fn group_query_spans_tenants() {
        let store = seeded();
        let hits = store
            .query_group("students", "parentPhone", "9876543210")
            .await
            .unwrap();
        let mut ids: Vec<_> = hits.iter().map(|d| (d.tenant_id.as_str(), d.id.as_str())).collect();
        ids.sort();
        assert_eq!(ids, vec![("t1", "s1"), ("t2", "s2")]);
    }

    #[tokio::test]
    async fn group_query_on_unindexed_field_is_missing_index() {
        let store = seeded();
        let err = store
            .query_group("students", "alternateParentPhone", "1")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingIndex { ref field, .. } if field == "alternateParentPhone"));
    }

    #[tokio::test]
    async fn ordered_query_sorts_and_limits() {
        let store = MemoryTenantStore::new(Vec::<String>::new());
        for (id, date) in [("a", "2026-01-01"), ("b", "2026-01-03"), ("c", "2026-01-02")] {
            store.put("t", "daily_updates", id, obj(json!({"date": date, "section": "A"})));
        }
        let q = Query::new()
            .eq("section", "A")
            .order_by("date", Direction::Desc)
            .limit(2);
        let docs = store.query("t", "daily_updates", &q).await.unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn filtered_ordering_without_index_fails() {
        let store = MemoryTenantStore::new(Vec::<String>::new()).without_ordered_index("daily_updates");
        let q = Query::new().eq("section", "A").order_by("date", Direction::Desc);
        assert!(matches!(
            store.query("t", "daily_updates", &q).await,
            Err(Error::MissingIndex { .. })
        ));
        // Unfiltered ordering needs no composite index.
        let q = Query::new().order_by("date", Direction::Desc);
        assert!(store.query("t", "daily_updates", &q).await.is_ok());
    }

    #[tokio::test]
    async fn add_update_count_roundtrip() {
        let store = MemoryTenantStore::new(Vec::<String>::new());
        let id = store.add("t", "students", obj(json!({"name": "A"}))).await.unwrap();
        store
            .update("t", "students", &id, obj(json!({"section": "B"})))
            .await
            .unwrap();
        let doc = store.get("t", "students", &id).await.unwrap().unwrap();
        assert_eq!(doc.data["name"], "A");
        assert_eq!(doc.data["section"], "B");
        assert_eq!(store.count("t", "students").await.unwrap(), 1);
        assert!(matches!(
            store.update("t", "students", "nope", Map::new()).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn load_reads_snapshot_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(
            &path,
            r#"{"tenants":{"t1":{"settings":{"general":{"schoolName":"Green Valley"}}}}}"#,
        )
        .unwrap();
        let store = MemoryTenantStore::load(&path, ["parentPhone"]).unwrap();
        let doc = store.get("t1", "settings", "general").await.unwrap().unwrap();
        assert_eq!(doc.data["schoolName"], "Green Valley");
    }

    #[tokio::test]
    async fn writes_never_reach_the_seed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        let seed = r#"{"tenants":{"t1":{"students":{"s1":{"name":"A"}}}}}"#;
        std::fs::write(&path, seed).unwrap();

        let store = MemoryTenantStore::load(&path, ["parentPhone"]).unwrap();
        store.add("t1", "students", obj(json!({"name": "B"}))).await.unwrap();
        assert_eq!(store.count("t1", "students").await.unwrap(), 2);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), seed);
        let reloaded = MemoryTenantStore::load(&path, ["parentPhone"]).unwrap();
        assert_eq!(reloaded.count("t1", "students").await.unwrap(), 1);
    }
}
