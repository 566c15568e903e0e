use std::sync::Arc;

use es_cache::CacheAside;
use es_directory::{DailyFeed, IdentityResolver, Roster, TenantStore};
use es_domain::config::Config;
use es_messaging::{EmailTransport, MessagingChannel};
use es_sessions::ConversationStore;

use crate::runtime::{ChunkPlan, Dispatcher, TutorService};

/// Shared application state passed to all API handlers.
///
/// Fields are grouped by concern:
/// - **Core services**: config, tenant store, cache
/// - **Directory**: identity resolution, daily feed, roster
/// - **Conversations**: session store, dispatcher
/// - **Outbound**: chat channel, mailer, batch pacing
/// - **Security**: token hash and webhook secrets
#[derive(Clone)]
pub struct AppState {
    // ── Core services ─────────────────────────────────────────────────
    pub config: Arc<Config>,
    pub store: Arc<dyn TenantStore>,
    pub cache: CacheAside,

    // ── Directory ─────────────────────────────────────────────────────
    pub identity: Arc<IdentityResolver>,
    pub feed: Arc<DailyFeed>,
    pub roster: Arc<Roster>,

    // ── Conversations ─────────────────────────────────────────────────
    pub sessions: Arc<ConversationStore>,
    pub dispatcher: Arc<Dispatcher>,

    // ── Outbound ──────────────────────────────────────────────────────
    pub channel: Arc<dyn MessagingChannel>,
    /// `None` when SMTP credentials are not configured.
    pub mailer: Option<Arc<dyn EmailTransport>>,
    /// `None` when no answer backend is configured.
    pub tutor: Option<Arc<TutorService>>,
    pub plan: ChunkPlan,

    // ── Security ──────────────────────────────────────────────────────
    /// SHA-256 of the API bearer token; `None` disables auth (dev mode).
    pub api_token_hash: Option<Vec<u8>>,
    /// Webhook verification handshake token.
    pub verify_token: Option<String>,
    /// Webhook payload signing secret.
    pub app_secret: Option<String>,
}
