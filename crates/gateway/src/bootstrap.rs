//! AppState construction and background-task spawning extracted from `main.rs`.
//!
//! [`build_app_state`] is the production boot path: it validates config,
//! builds the real collaborators from config and environment, then hands
//! them to [`assemble`].  Tests call [`assemble`] directly with doubles.

use std::sync::Arc;

use anyhow::Context;
use sha2::{Digest, Sha256};

use es_cache::CacheAside;
use es_directory::{DailyFeed, IdentityResolver, MemoryTenantStore, ResolverSettings, Roster, TenantStore};
use es_domain::config::{Config, ConfigSeverity};
use es_messaging::{EmailTransport, MessagingChannel, SmtpMailer, WhatsAppCloudClient};
use es_providers::{AnswerBackend, GeminiTutor};
use es_sessions::{spawn_pruner, ConversationStore, IdlePolicy};

use crate::runtime::{ChunkPlan, Dispatcher, DispatcherSettings, TutorService};
use crate::state::AppState;

/// External collaborators the gateway is wired around.
pub struct Collaborators {
    pub store: Arc<dyn TenantStore>,
    pub cache: CacheAside,
    pub channel: Arc<dyn MessagingChannel>,
    pub mailer: Option<Arc<dyn EmailTransport>>,
    pub tutor_backend: Option<Arc<dyn AnswerBackend>>,
}

/// Secrets read once at startup.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    pub api_token: Option<String>,
    pub verify_token: Option<String>,
    pub app_secret: Option<String>,
}

impl Secrets {
    /// Read every secret from the env vars named in config.
    pub fn from_env(config: &Config) -> Self {
        Self {
            api_token: read_env(&config.server.api_token_env),
            verify_token: read_env(&config.whatsapp.verify_token_env),
            app_secret: read_env(&config.whatsapp.app_secret_env),
        }
    }
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Validate config, initialize every subsystem and return a fully-wired
/// [`AppState`].
pub async fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!(
            "config validation failed with {} error(s)",
            issues
                .iter()
                .filter(|i| i.severity == ConfigSeverity::Error)
                .count()
        );
    }

    // ── Tenant store ─────────────────────────────────────────────────
    let indexed = config.directory.indexed_group_fields.clone();
    let store: Arc<dyn TenantStore> = match &config.directory.seed_path {
        Some(path) => {
            let store = MemoryTenantStore::load(path, indexed)
                .with_context(|| format!("loading tenant seed {}", path.display()))?;
            tracing::info!(
                path = %path.display(),
                "tenant store is in-memory; writes are not persisted to the seed file"
            );
            Arc::new(store)
        }
        None => {
            tracing::warn!("no directory.seed_path configured, starting with an empty tenant store");
            Arc::new(MemoryTenantStore::new(indexed))
        }
    };

    // ── Cache ────────────────────────────────────────────────────────
    let cache = es_cache::from_config(&config.cache).await;

    // ── Outbound channels ────────────────────────────────────────────
    let channel: Arc<dyn MessagingChannel> = Arc::new(
        WhatsAppCloudClient::from_config(&config.whatsapp)
            .context("initializing WhatsApp client")?,
    );

    let mailer: Option<Arc<dyn EmailTransport>> = match SmtpMailer::from_config(&config.email) {
        Ok(m) => {
            tracing::info!(host = %config.email.smtp_host, port = config.email.smtp_port, "SMTP mailer ready");
            Some(Arc::new(m))
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                hint = %format!("set {} and {}", config.email.username_env, config.email.password_env),
                "email endpoints disabled"
            );
            None
        }
    };

    // ── Tutor backend ────────────────────────────────────────────────
    let tutor_backend: Option<Arc<dyn AnswerBackend>> = match GeminiTutor::from_config(&config.tutor) {
        Ok(b) => {
            tracing::info!(model = %config.tutor.model, "tutor backend ready");
            Some(Arc::new(b))
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                hint = %format!("set {}", config.tutor.api_key_env),
                "tutor endpoint disabled"
            );
            None
        }
    };

    // ── Secrets ──────────────────────────────────────────────────────
    let secrets = Secrets::from_env(&config);
    if secrets.api_token.is_some() {
        tracing::info!(env = %config.server.api_token_env, "API bearer-token auth enabled");
    } else {
        tracing::warn!(
            "API bearer-token auth DISABLED; set the {} env var",
            config.server.api_token_env
        );
    }
    if secrets.verify_token.is_none() {
        tracing::warn!(
            hint = %format!("set {}", config.whatsapp.verify_token_env),
            "webhook verification token missing, handshakes will be refused"
        );
    }
    if secrets.app_secret.is_none() {
        tracing::warn!(
            hint = %format!("set {}", config.whatsapp.app_secret_env),
            "webhook signature check disabled"
        );
    }

    assemble(
        config,
        Collaborators {
            store,
            cache,
            channel,
            mailer,
            tutor_backend,
        },
        secrets,
    )
}

/// Wire the directory, sessions, dispatcher and tutor around the given
/// collaborators.
pub fn assemble(
    config: Arc<Config>,
    parts: Collaborators,
    secrets: Secrets,
) -> anyhow::Result<AppState> {
    let Collaborators {
        store,
        cache,
        channel,
        mailer,
        tutor_backend,
    } = parts;
    let country_code = config.whatsapp.default_country_code.as_str();

    // ── Directory ────────────────────────────────────────────────────
    let identity = Arc::new(IdentityResolver::new(
        store.clone(),
        cache.clone(),
        ResolverSettings::from_config(&config.directory, country_code),
    ));
    let feed = Arc::new(
        DailyFeed::new(store.clone(), cache.clone(), &config.directory)
            .context("initializing daily feed")?,
    );
    let roster = Arc::new(Roster::new(
        store.clone(),
        cache.clone(),
        config.directory.contacts_ttl_secs,
        country_code,
    ));
    tracing::info!(
        timezone = %config.directory.timezone,
        cache_tier = cache.tier_name(),
        "directory ready"
    );

    // ── Conversations ────────────────────────────────────────────────
    let sessions = Arc::new(ConversationStore::new(config.sessions.max_entries));
    let dispatcher = Arc::new(Dispatcher::new(
        identity.clone(),
        sessions.clone(),
        feed.clone(),
        channel.clone(),
        DispatcherSettings::from_config(&config.whatsapp, &config.dispatch),
    ));
    tracing::info!(
        max_entries = config.sessions.max_entries,
        channel = channel.name(),
        "conversation dispatcher ready"
    );

    let tutor = tutor_backend.map(|backend| {
        Arc::new(TutorService::new(
            backend,
            cache.clone(),
            config.tutor.cache_ttl_secs,
        ))
    });

    let api_token_hash = secrets
        .api_token
        .as_deref()
        .map(|t| Sha256::digest(t.as_bytes()).to_vec());

    Ok(AppState {
        plan: ChunkPlan::from_config(&config.dispatch),
        config,
        store,
        cache,
        identity,
        feed,
        roster,
        sessions,
        dispatcher,
        channel,
        mailer,
        tutor,
        api_token_hash,
        verify_token: secrets.verify_token,
        app_secret: secrets.app_secret,
    })
}

/// Spawn the long-running background tokio tasks.
///
/// Call this **after** [`build_app_state`] when running the HTTP server.
pub fn spawn_background_tasks(state: &AppState) {
    // ── Idle session pruning ─────────────────────────────────────────
    let policy = IdlePolicy::from_config(&state.config.sessions);
    match spawn_pruner(state.sessions.clone(), policy) {
        Some(_) => tracing::info!(
            interval_secs = state.config.sessions.prune_interval_secs,
            "session pruner spawned"
        ),
        None => tracing::info!("session idle pruning disabled"),
    }
    tracing::info!("background tasks spawned");
}
