#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use es_cache::{CacheAside, MemoryTier};
use es_directory::MemoryTenantStore;
use es_domain::config::Config;
use es_domain::error::Result;
use es_messaging::testing::{RecordingChannel, RecordingMailer};
use es_providers::AnswerBackend;
use es_gateway::bootstrap::{assemble, Collaborators, Secrets};
use es_gateway::state::AppState;

pub const TENANT: &str = "green-valley";
/// Guardian of one student.
pub const SINGLE_PARENT: &str = "9876543210";
/// Guardian of two students.
pub const TWIN_PARENT: &str = "9123456780";

fn obj(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(m) => m,
        _ => panic!("expected an object"),
    }
}

/// One tenant with three students across two guardians.
pub fn seeded_store() -> MemoryTenantStore {
    let store = MemoryTenantStore::new(["parentPhone", "alternateParentPhone"]);
    store.put(
        TENANT,
        "settings",
        "general",
        obj(json!({ "schoolName": "Green Valley School" })),
    );
    store.put(
        TENANT,
        "students",
        "s-aarav",
        obj(json!({
            "name": "Aarav Sharma", "class": "Class 5", "section": "A",
            "fatherName": "Rohit Sharma", "parentPhone": SINGLE_PARENT,
            "parentEmail": "rohit@example.org"
        })),
    );
    store.put(
        TENANT,
        "students",
        "s-diya",
        obj(json!({
            "name": "Diya Patel", "class": "Class 3", "section": "B",
            "motherName": "Meera Patel", "parentPhone": TWIN_PARENT
        })),
    );
    store.put(
        TENANT,
        "students",
        "s-dev",
        obj(json!({
            "name": "Dev Patel", "class": "Class 7", "section": "A",
            "motherName": "Meera Patel", "alternateParentPhone": format!("91{TWIN_PARENT}")
        })),
    );
    store
}

/// Answers with a fixed text and counts calls.
#[derive(Default)]
pub struct CountingBackend {
    pub calls: AtomicUsize,
}

impl CountingBackend {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnswerBackend for CountingBackend {
    fn name(&self) -> &str {
        "counting"
    }

    async fn answer(&self, question: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("answer to: {question}"))
    }
}

pub struct Harness {
    pub state: AppState,
    pub channel: Arc<RecordingChannel>,
    pub mailer: Arc<RecordingMailer>,
    pub backend: Arc<CountingBackend>,
}

pub fn harness_with(config: Config, channel: RecordingChannel, secrets: Secrets) -> Harness {
    let channel = Arc::new(channel);
    let mailer = Arc::new(RecordingMailer::new());
    let backend = Arc::new(CountingBackend::default());
    let state = assemble(
        Arc::new(config),
        Collaborators {
            store: Arc::new(seeded_store()),
            cache: CacheAside::new(Arc::new(MemoryTier::new(1_000))),
            channel: channel.clone(),
            mailer: Some(mailer.clone()),
            tutor_backend: Some(backend.clone()),
        },
        secrets,
    )
    .expect("assemble app state");
    Harness {
        state,
        channel,
        mailer,
        backend,
    }
}

/// Defaults with no pacing delay and mark-read off.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.dispatch.inter_chunk_delay_ms = 0;
    config.whatsapp.mark_read = false;
    config
}

pub fn harness() -> Harness {
    harness_with(test_config(), RecordingChannel::new(), Secrets::default())
}
