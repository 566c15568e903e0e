use std::sync::Arc;

use serde_json::{json, Map, Value};

use es_cache::{CacheAside, MemoryTier};
use es_directory::{DailyFeed, FeedKind, MemoryTenantStore};
use es_domain::config::DirectoryConfig;

const TENANT: &str = "green-valley";

fn obj(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(m) => m,
        _ => panic!("expected an object"),
    }
}

/// Class 5-A updates on three days, plus rows for other classes and sections.
fn populate(store: &MemoryTenantStore) {
    let rows = [
        ("u1", "Class 5", "A", "2026-10-15", json!({ "subject": "Maths", "homework": "Page 10" })),
        ("u2", "Class 5", "A", "2026-10-17", json!({ "subject": "Science", "homework": "Leaf diagram" })),
        ("u3", "Class 5", "B", "2026-10-17", json!({ "subject": "Maths", "homework": "Other section" })),
        ("u4", "Class 6", "A", "2026-10-17", json!({ "subject": "English", "homework": "Other class" })),
        ("u5", "Class 5", "A", "2026-10-16", json!({ "kind": "remark", "remark": "Well done", "studentId": "s1" })),
    ];
    for (id, class, section, date, extra) in rows {
        let mut data = obj(extra);
        data.insert("classGrade".into(), class.into());
        data.insert("section".into(), section.into());
        data.insert("date".into(), date.into());
        store.put(TENANT, "daily_updates", id, data);
    }
}

fn feed(store: MemoryTenantStore) -> DailyFeed {
    let cache = CacheAside::new(Arc::new(MemoryTier::new(100)));
    DailyFeed::new(Arc::new(store), cache, &DirectoryConfig::default()).unwrap()
}

#[tokio::test]
async fn missing_index_falls_back_to_client_side_filter_and_sort() {
    let indexed = MemoryTenantStore::new(Vec::<String>::new());
    populate(&indexed);
    let unindexed = MemoryTenantStore::new(Vec::<String>::new()).without_ordered_index("daily_updates");
    populate(&unindexed);

    let expected = feed(indexed).homework(TENANT, "Class 5", "A").await.unwrap();
    let fallback = feed(unindexed).homework(TENANT, "Class 5", "A").await.unwrap();

    let ids: Vec<_> = fallback.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["u2", "u5", "u1"]);
    assert_eq!(fallback, expected);
    assert_eq!(fallback[1].kind, FeedKind::Remark);
    assert_eq!(fallback[1].student_id.as_deref(), Some("s1"));
}

#[tokio::test]
async fn fallback_result_is_cached_like_the_indexed_one() {
    let store = MemoryTenantStore::new(Vec::<String>::new()).without_ordered_index("daily_updates");
    populate(&store);
    let feed = feed(store);

    let first = feed.homework(TENANT, "Class 5", "B").await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].body, "Other section");

    // A write for the class drops the cached list.
    feed.add_update(
        TENANT,
        obj(json!({
            "classGrade": "Class 5", "section": "B", "subject": "Art",
            "homework": "Draw a tree", "date": "2026-10-18"
        })),
    )
    .await
    .unwrap();
    let second = feed.homework(TENANT, "Class 5", "B").await.unwrap();
    assert_eq!(second.len(), 2);
    assert_eq!(second[0].body, "Draw a tree");
}
