//! Daily feed: per-class homework and remarks, tenant announcements, and the
//! writes that feed them.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use es_cache::{CacheAside, CachePolicy};
use es_domain::config::DirectoryConfig;
use es_domain::error::{Error, Result};

use crate::keys;
use crate::store::{Direction, Document, Query, TenantStore, BROADCASTS, DAILY_UPDATES};

/// Rows read per class before client-side filtering.
const CLASS_FEED_LIMIT: usize = 20;
const ANNOUNCEMENT_LIMIT: usize = 3;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Items
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    /// Visible to the whole class/section.
    Homework,
    /// Addressed to a single student.
    Remark,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub id: String,
    pub kind: FeedKind,
    pub subject: Option<String>,
    /// Body as authored (may contain HTML).
    pub body: String,
    pub notes: Option<String>,
    pub date: String,
    pub student_id: Option<String>,
    pub teacher_name: Option<String>,
}

impl FeedItem {
    /// Parse a `daily_updates` document.  Returns `None` for documents with
    /// no body.
    pub fn from_doc(doc: &Document) -> Option<Self> {
        let kind = match doc.str_field("kind").as_deref() {
            Some("remark") => FeedKind::Remark,
            _ => FeedKind::Homework,
        };
        let body = match kind {
            FeedKind::Remark => doc.str_field("remark").or_else(|| doc.str_field("homework")),
            FeedKind::Homework => doc.str_field("homework"),
        }?;
        Some(Self {
            id: doc.id.clone(),
            kind,
            subject: doc.str_field("subject"),
            body,
            notes: doc.str_field("notes"),
            date: doc.str_field("date").unwrap_or_default(),
            student_id: doc.str_field("studentId"),
            teacher_name: doc.str_field("teacherName"),
        })
    }

    /// Remarks are shown only to the student they address; everything else
    /// to the whole class.
    pub fn visible_to(&self, student_id: &str) -> bool {
        match self.kind {
            FeedKind::Homework => true,
            FeedKind::Remark => self.student_id.as_deref() == Some(student_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: String,
    pub title: Option<String>,
    pub message: String,
    pub date: String,
}

impl Announcement {
    pub fn from_doc(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            title: doc.str_field("title"),
            message: doc.str_field("message").unwrap_or_default(),
            date: doc
                .str_field("date")
                .or_else(|| doc.str_field("createdAt"))
                .unwrap_or_default(),
        }
    }
}

/// Calendar date of a stored timestamp in `tz`.  Accepts RFC 3339
/// timestamps and bare `YYYY-MM-DD` dates (taken as already local).
pub fn local_date(raw: &str, tz: Tz) -> Option<NaiveDate> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&tz).date_naive());
    }
    raw.get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DailyFeed
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct DailyFeed {
    store: Arc<dyn TenantStore>,
    cache: CacheAside,
    ttl_secs: u64,
    tz: Tz,
}

impl DailyFeed {
    pub fn new(store: Arc<dyn TenantStore>, cache: CacheAside, cfg: &DirectoryConfig) -> Result<Self> {
        let tz = Tz::from_str(&cfg.timezone)
            .map_err(|_| Error::Config(format!("unknown timezone {:?}", cfg.timezone)))?;
        Ok(Self {
            store,
            cache,
            ttl_secs: cfg.feed_ttl_secs,
            tz,
        })
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Today's date in the feed's timezone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }

    pub fn is_on(&self, raw_date: &str, day: NaiveDate) -> bool {
        local_date(raw_date, self.tz) == Some(day)
    }

    /// Newest homework and remark items for a class/section, cached.
    pub async fn homework(
        &self,
        tenant: &str,
        class_grade: &str,
        section: &str,
    ) -> Result<Vec<FeedItem>> {
        let key = keys::homework(tenant, class_grade, section);
        self.cache
            .get_or_compute(&key, CachePolicy::fixed_secs(self.ttl_secs), || {
                self.fetch_homework(tenant, class_grade, section)
            })
            .await
    }

    async fn fetch_homework(
        &self,
        tenant: &str,
        class_grade: &str,
        section: &str,
    ) -> Result<Vec<FeedItem>> {
        let query = Query::new()
            .eq("classGrade", class_grade)
            .eq("section", section)
            .order_by("date", Direction::Desc)
            .limit(CLASS_FEED_LIMIT);

        let docs = match self.store.query(tenant, DAILY_UPDATES, &query).await {
            Ok(docs) => docs,
            Err(Error::MissingIndex { collection, field }) => {
                tracing::warn!(
                    tenant_id = tenant,
                    collection = %collection,
                    field = %field,
                    hint = "add a composite index (classGrade, section, date desc)",
                    "homework query needs an index, sorting client-side"
                );
                let fallback = Query::new().limit(CLASS_FEED_LIMIT);
                let mut docs: Vec<Document> = self
                    .store
                    .query(tenant, DAILY_UPDATES, &fallback)
                    .await?
                    .into_iter()
                    .filter(|d| {
                        d.str_field("classGrade").as_deref() == Some(class_grade)
                            && d.str_field("section").as_deref() == Some(section)
                    })
                    .collect();
                docs.sort_by(|a, b| b.str_field("date").cmp(&a.str_field("date")));
                docs
            }
            Err(e) => return Err(e),
        };

        Ok(docs.iter().filter_map(FeedItem::from_doc).collect())
    }

    /// Newest tenant announcements, cached.
    pub async fn announcements(&self, tenant: &str) -> Result<Vec<Announcement>> {
        let key = keys::announcements(tenant);
        self.cache
            .get_or_compute(&key, CachePolicy::fixed_secs(self.ttl_secs), || async {
                let query = Query::new()
                    .order_by("createdAt", Direction::Desc)
                    .limit(ANNOUNCEMENT_LIMIT);
                let docs = self.store.query(tenant, BROADCASTS, &query).await?;
                Ok::<_, Error>(docs.iter().map(Announcement::from_doc).collect())
            })
            .await
    }

    // ── Writes ─────────────────────────────────────────────────────

    /// Newest daily updates for a tenant, uncached (admin listing).
    pub async fn list_updates(&self, tenant: &str, limit: usize) -> Result<Vec<Value>> {
        let query = Query::new().order_by("date", Direction::Desc).limit(limit);
        let docs = self.store.query(tenant, DAILY_UPDATES, &query).await?;
        Ok(docs.iter().map(Document::to_json).collect())
    }

    /// Record a daily update and drop the caches it affects.
    pub async fn add_update(&self, tenant: &str, mut data: Map<String, Value>) -> Result<String> {
        data.insert("createdAt".into(), Value::String(Utc::now().to_rfc3339()));
        let class_grade = data.get("classGrade").and_then(value_text);
        let section = data.get("section").and_then(value_text);

        let id = self.store.add(tenant, DAILY_UPDATES, data).await?;

        self.cache.invalidate(&keys::dashboard(tenant)).await;
        if let (Some(c), Some(s)) = (class_grade, section) {
            self.cache.invalidate(&keys::homework(tenant, &c, &s)).await;
        }
        Ok(id)
    }

    pub async fn list_broadcasts(&self, tenant: &str, limit: usize) -> Result<Vec<Value>> {
        let query = Query::new().order_by("createdAt", Direction::Desc).limit(limit);
        let docs = self.store.query(tenant, BROADCASTS, &query).await?;
        Ok(docs.iter().map(Document::to_json).collect())
    }

    /// Log a broadcast and drop the announcement and dashboard caches.
    pub async fn create_broadcast(&self, tenant: &str, record: BroadcastRecord) -> Result<String> {
        let now = Utc::now().to_rfc3339();
        let mut data = Map::new();
        data.insert("message".into(), Value::String(record.message));
        if let Some(title) = record.title {
            data.insert("title".into(), Value::String(title));
        }
        data.insert(
            "channels".into(),
            Value::Array(record.channels.into_iter().map(Value::String).collect()),
        );
        data.insert(
            "template".into(),
            Value::String(record.template.unwrap_or_else(|| "custom".into())),
        );
        data.insert("recipients".into(), Value::from(record.recipients_count));
        data.insert(
            "status".into(),
            Value::String(record.status.unwrap_or_else(|| "Pending".into())),
        );
        data.insert("date".into(), Value::String(now.clone()));
        data.insert("createdAt".into(), Value::String(now));

        let id = self.store.add(tenant, BROADCASTS, data).await?;

        self.cache.invalidate(&keys::dashboard(tenant)).await;
        self.cache.invalidate(&keys::announcements(tenant)).await;
        Ok(id)
    }
}

/// A broadcast as submitted by the admin surface.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub recipients_count: u64,
    #[serde(default)]
    pub status: Option<String>,
}

fn value_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, data: Value) -> Document {
        Document {
            id: id.into(),
            tenant_id: "t".into(),
            data: match data {
                Value::Object(m) => m,
                _ => panic!("not an object"),
            },
        }
    }

    #[test]
    fn remark_is_visible_only_to_its_student() {
        let item = FeedItem::from_doc(&doc(
            "r1",
            json!({"kind": "remark", "remark": "Great work", "studentId": "s1"}),
        ))
        .unwrap();
        assert_eq!(item.kind, FeedKind::Remark);
        assert!(item.visible_to("s1"));
        assert!(!item.visible_to("s2"));
    }

    #[test]
    fn homework_is_visible_to_everyone() {
        let item = FeedItem::from_doc(&doc("h1", json!({"homework": "Read ch. 3"}))).unwrap();
        assert_eq!(item.kind, FeedKind::Homework);
        assert!(item.visible_to("anyone"));
    }

    #[test]
    fn bodiless_documents_are_skipped() {
        assert!(FeedItem::from_doc(&doc("x", json!({"subject": "Math"}))).is_none());
    }

    #[test]
    fn local_date_handles_offsets_and_bare_dates() {
        let tz: Tz = "Asia/Kolkata".parse().unwrap();
        // 20:00 UTC is already the next day in India.
        assert_eq!(
            local_date("2026-10-16T20:00:00Z", tz),
            NaiveDate::from_ymd_opt(2026, 10, 17)
        );
        assert_eq!(local_date("2026-10-17", tz), NaiveDate::from_ymd_opt(2026, 10, 17));
        assert_eq!(local_date("garbage", tz), None);
    }
}
