//! Per-tenant dashboard statistics.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use es_cache::{CacheAside, CachePolicy};
use es_domain::error::{Error, Result};

use crate::keys;
use crate::store::{Direction, Document, Query, TenantStore, BROADCASTS, DAILY_UPDATES, STUDENTS};

const RECENT_ACTIVITY: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub title: String,
    pub description: String,
    pub timestamp: String,
    /// `"update"` or `"system"`.
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_students: usize,
    pub total_updates: usize,
    pub total_broadcasts: usize,
    pub recent_activity: Vec<Activity>,
}

/// Counts plus the newest activity across updates and broadcasts.  Cached
/// under `dashboard:<tenant>`.
pub async fn dashboard_stats(
    store: &Arc<dyn TenantStore>,
    cache: &CacheAside,
    tenant: &str,
    ttl_secs: u64,
) -> Result<DashboardStats> {
    cache
        .get_or_compute(&keys::dashboard(tenant), CachePolicy::fixed_secs(ttl_secs), || async {
            let (students, updates, broadcasts) = tokio::try_join!(
                store.count(tenant, STUDENTS),
                store.count(tenant, DAILY_UPDATES),
                store.count(tenant, BROADCASTS),
            )?;

            let recent_updates = Query::new()
                .order_by("date", Direction::Desc)
                .limit(RECENT_ACTIVITY);
            let recent_broadcasts = Query::new()
                .order_by("createdAt", Direction::Desc)
                .limit(RECENT_ACTIVITY);
            let (update_docs, broadcast_docs) = tokio::try_join!(
                store.query(tenant, DAILY_UPDATES, &recent_updates),
                store.query(tenant, BROADCASTS, &recent_broadcasts),
            )?;

            let mut activity: Vec<Activity> = update_docs
                .iter()
                .map(update_activity)
                .chain(broadcast_docs.iter().map(broadcast_activity))
                .collect();
            activity.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            activity.truncate(RECENT_ACTIVITY);

            Ok::<_, Error>(DashboardStats {
                total_students: students,
                total_updates: updates,
                total_broadcasts: broadcasts,
                recent_activity: activity,
            })
        })
        .await
}

fn update_activity(doc: &Document) -> Activity {
    let subject = doc.str_field("subject").unwrap_or_else(|| "Subject".into());
    let teacher = doc.str_field("teacherName").unwrap_or_else(|| "Teacher".into());
    Activity {
        id: doc.id.clone(),
        title: format!("Daily Update: {subject}"),
        description: format!(
            "{teacher} posted homework for Class {}-{}",
            doc.str_field("classGrade").unwrap_or_default(),
            doc.str_field("section").unwrap_or_default()
        ),
        timestamp: doc.str_field("date").unwrap_or_default(),
        kind: "update".into(),
    }
}

fn broadcast_activity(doc: &Document) -> Activity {
    let title = match doc.str_field("template").as_deref() {
        Some("custom") | None => "Broadcast Announcement",
        Some(_) => "Emergency Alert",
    };
    let channels = doc
        .data
        .get("channels")
        .and_then(|v| v.as_array())
        .map(|a| {
            a.iter()
                .filter_map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(" & ")
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "System".into());
    Activity {
        id: doc.id.clone(),
        title: title.into(),
        description: format!(
            "Sent to {} recipients via {channels}",
            doc.str_field("recipients").unwrap_or_else(|| "0".into())
        ),
        timestamp: doc
            .str_field("createdAt")
            .or_else(|| doc.str_field("date"))
            .unwrap_or_default(),
        kind: "system".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTenantStore;
    use es_cache::MemoryTier;
    use serde_json::{json, Map, Value};

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    #[tokio::test]
    async fn stats_merge_recent_activity_newest_first() {
        let mem = Arc::new(MemoryTenantStore::new(Vec::<String>::new()));
        mem.put("t", "students", "s1", obj(json!({"name": "A"})));
        mem.put("t", "daily_updates", "u1", obj(json!({"subject": "Math", "date": "2026-10-15", "classGrade": "5", "section": "A"})));
        mem.put("t", "daily_updates", "u2", obj(json!({"date": "2026-10-17"})));
        mem.put("t", "broadcasts", "b1", obj(json!({"template": "custom", "recipients": 40, "channels": ["whatsapp", "email"], "createdAt": "2026-10-16T08:00:00Z"})));

        let store: Arc<dyn TenantStore> = mem;
        let cache = CacheAside::new(Arc::new(MemoryTier::new(10)));
        let stats = dashboard_stats(&store, &cache, "t", 300).await.unwrap();

        assert_eq!(stats.total_students, 1);
        assert_eq!(stats.total_updates, 2);
        assert_eq!(stats.total_broadcasts, 1);
        let ids: Vec<_> = stats.recent_activity.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["u2", "b1", "u1"]);
        assert_eq!(stats.recent_activity[1].description, "Sent to 40 recipients via whatsapp & email");
        assert_eq!(stats.recent_activity[2].title, "Daily Update: Math");
    }
}
