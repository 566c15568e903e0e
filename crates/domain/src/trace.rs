use serde::Serialize;

/// Structured trace events emitted across all EduSync crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    CacheHit {
        key: String,
        tier: String,
        sliding: bool,
    },
    CacheMiss {
        key: String,
        tier: String,
    },
    CacheStored {
        key: String,
        tier: String,
        ttl_secs: u64,
    },
    CacheInvalidated {
        key: String,
        tier: String,
    },
    IdentityResolved {
        phone: String,
        variants: usize,
        students: usize,
        failed_lookups: usize,
    },
    StudentSelected {
        conversation: String,
        student_id: String,
        auto: bool,
    },
    CommandDispatched {
        conversation: String,
        command: String,
        outcome: String,
        duration_ms: u64,
    },
    MessageSent {
        channel: String,
        kind: String,
        ok: bool,
    },
    BatchCompleted {
        channel: String,
        recipients: usize,
        chunks: usize,
        success_count: usize,
        failure_count: usize,
        duration_ms: u64,
    },
    TutorAnswered {
        cacheable: bool,
        duration_ms: u64,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "es_event");
    }
}
