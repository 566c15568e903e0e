//! Tenant data store abstraction.
//!
//! Documents live in `tenant / collection / id`.  Tenancy is a key prefix,
//! not an access boundary.  Besides per-tenant queries, the store offers a
//! cross-tenant equality lookup on a single field (collection-group style),
//! which must be backed by an index on that field.

use std::cmp::Ordering;

use async_trait::async_trait;
use serde_json::{Map, Value};

use es_domain::error::Result;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Well-known collections
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub const STUDENTS: &str = "students";
pub const DAILY_UPDATES: &str = "daily_updates";
pub const BROADCASTS: &str = "broadcasts";
pub const SETTINGS: &str = "settings";
/// Document id inside [`SETTINGS`] holding tenant-wide settings.
pub const GENERAL_SETTINGS: &str = "general";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Documents
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A stored document together with its location.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub tenant_id: String,
    pub data: Map<String, Value>,
}

impl Document {
    /// String view of a field.  Numbers are rendered; blank strings count as
    /// absent.
    pub fn str_field(&self, name: &str) -> Option<String> {
        match self.data.get(name)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// The document body with its id merged in as `"id"`.
    pub fn to_json(&self) -> Value {
        let mut data = self.data.clone();
        data.insert("id".into(), Value::String(self.id.clone()));
        Value::Object(data)
    }
}

/// Field equality that tolerates numbers stored where strings are expected
/// (phone numbers and class grades are often imported as numbers).
pub fn value_matches(stored: &Value, wanted: &Value) -> bool {
    match (stored, wanted) {
        (Value::Number(a), Value::String(b)) | (Value::String(b), Value::Number(a)) => {
            a.to_string() == *b
        }
        _ => stored == wanted,
    }
}

/// Ordering used by `order_by`: numbers numerically, strings lexically
/// (ISO dates sort correctly), missing values last.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Null) | None, Some(Value::Null) | None) => Ordering::Equal,
        (Some(Value::Null) | None, Some(_)) => Ordering::Greater,
        (Some(_), Some(Value::Null) | None) => Ordering::Less,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Queries
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Equality filters, optional ordering and limit within one tenant
/// collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<(String, Value)>,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push((field.to_owned(), value.into()));
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some((field.to_owned(), direction));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn matches(&self, data: &Map<String, Value>) -> bool {
        self.filters.iter().all(|(field, wanted)| {
            data.get(field)
                .map(|stored| value_matches(stored, wanted))
                .unwrap_or(false)
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TenantStore trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Run a query against one tenant's collection.
    async fn query(&self, tenant: &str, collection: &str, query: &Query) -> Result<Vec<Document>>;

    /// Equality lookup on `field` across every tenant's `collection`.
    ///
    /// Fails with `Error::MissingIndex` when `field` is not indexed for
    /// cross-tenant lookups.
    async fn query_group(&self, collection: &str, field: &str, value: &str)
        -> Result<Vec<Document>>;

    async fn get(&self, tenant: &str, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Insert a new document and return its generated id.
    async fn add(&self, tenant: &str, collection: &str, data: Map<String, Value>)
        -> Result<String>;

    /// Merge `patch` into an existing document.  Fails with
    /// `Error::NotFound` if it does not exist.
    async fn update(
        &self,
        tenant: &str,
        collection: &str,
        id: &str,
        patch: Map<String, Value>,
    ) -> Result<()>;

    async fn count(&self, tenant: &str, collection: &str) -> Result<usize>;
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

    #[test]
    fn numeric_phone_matches_string_filter() {
        assert!(value_matches(&json!(9876543210u64), &json!("9876543210")));
        assert!(value_matches(&json!("5"), &json!(5)));
        assert!(!value_matches(&json!("5"), &json!("6")));
    }

    #[test]
    fn query_requires_every_filter() {
        let q = Query::new().eq("classGrade", "5").eq("section", "A");
        assert!(q.matches(&obj(json!({"classGrade": "5", "section": "A"}))));
        assert!(!q.matches(&obj(json!({"classGrade": "5", "section": "B"}))));
        assert!(!q.matches(&obj(json!({"classGrade": "5"}))));
    }

    #[test]
    fn missing_values_sort_last() {
        let a = json!("2026-01-02");
        let b = json!("2026-01-01");
        assert_eq!(compare_values(Some(&a), Some(&b)), Ordering::Greater);
        assert_eq!(compare_values(None, Some(&b)), Ordering::Greater);
        assert_eq!(compare_values(Some(&a), None), Ordering::Less);
    }

    #[test]
    fn str_field_renders_numbers_and_skips_blanks() {
        let doc = Document {
            id: "d".into(),
            tenant_id: "t".into(),
            data: obj(json!({"class": 5, "name": "  ", "section": "A"})),
        };
        assert_eq!(doc.str_field("class").as_deref(), Some("5"));
        assert_eq!(doc.str_field("name"), None);
        assert_eq!(doc.str_field("section").as_deref(), Some("A"));
        assert_eq!(doc.to_json()["id"], "d");
    }
}
