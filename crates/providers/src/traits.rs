use es_domain::error::Result;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Core backend trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A model that turns one student question into one answer.
///
/// Implementations carry their own system prompt; callers pass only the
/// question text as the student typed it.
#[async_trait::async_trait]
pub trait AnswerBackend: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &str;

    async fn answer(&self, question: &str) -> Result<String>;
}
