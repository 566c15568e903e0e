//! Cached tutor answers.
//!
//! Questions are keyed by the SHA-256 of their normalized text, so
//! differences in case, punctuation and spacing share one answer.  Every
//! hit slides the entry's TTL back to the full window.  Greetings and other
//! filler, and anything shorter than three characters, bypass the cache.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use es_cache::{CacheAside, CachePolicy};
use es_domain::error::{Error, Result};
use es_domain::trace::TraceEvent;
use es_providers::AnswerBackend;

const MIN_CACHEABLE_CHARS: usize = 3;

/// Normalized phrases that are never cached.
const NON_CACHEABLE: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "hola",
    "greetings",
    "how are you",
    "how do you do",
    "good morning",
    "good afternoon",
    "good evening",
    "thanks",
    "thank you",
    "thx",
    "bye",
    "goodbye",
    "cya",
    "help",
    "menu",
];

/// Lowercase, drop punctuation, collapse whitespace.
pub fn normalize_question(question: &str) -> String {
    let cleaned = question
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn is_cacheable(normalized: &str) -> bool {
    normalized.chars().count() >= MIN_CACHEABLE_CHARS && !NON_CACHEABLE.contains(&normalized)
}

pub fn cache_key(normalized: &str) -> String {
    format!("ai_tutor:{}", hex::encode(Sha256::digest(normalized.as_bytes())))
}

/// Stored answer payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedAnswer {
    pub answer: String,
    pub original_question: String,
    pub created_at: DateTime<Utc>,
}

pub struct TutorService {
    backend: Arc<dyn AnswerBackend>,
    cache: CacheAside,
    ttl_secs: u64,
}

impl TutorService {
    pub fn new(backend: Arc<dyn AnswerBackend>, cache: CacheAside, ttl_secs: u64) -> Self {
        Self {
            backend,
            cache,
            ttl_secs,
        }
    }

    pub async fn ask(&self, question: &str) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::Other("question is required".into()));
        }
        let started = Instant::now();
        let normalized = normalize_question(question);
        let cacheable = is_cacheable(&normalized);

        let answer = if cacheable {
            let key = cache_key(&normalized);
            self.cache
                .get_or_compute(&key, CachePolicy::sliding_secs(self.ttl_secs), || async {
                    let answer = self.backend.answer(question).await?;
                    Ok::<_, Error>(CachedAnswer {
                        answer,
                        original_question: question.to_owned(),
                        created_at: Utc::now(),
                    })
                })
                .await?
                .answer
        } else {
            self.backend.answer(question).await?
        };

        TraceEvent::TutorAnswered {
            cacheable,
            duration_ms: started.elapsed().as_millis() as u64,
        }
        .emit();
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_ignores_case_punctuation_and_spacing() {
        assert_eq!(normalize_question("What is   gravity?"), "what is gravity");
        assert_eq!(normalize_question(" what is gravity "), "what is gravity");
        assert_eq!(normalize_question("How are you?"), "how are you");
    }

    #[test]
    fn punctuation_inside_words_is_removed_not_spaced() {
        assert_eq!(normalize_question("What's Newton's law?"), "whats newtons law");
        assert_eq!(
            normalize_question("What's gravity?"),
            normalize_question("whats gravity")
        );
    }

    #[test]
    fn filler_and_short_inputs_are_not_cacheable() {
        assert!(!is_cacheable(&normalize_question("Hi!")));
        assert!(!is_cacheable(&normalize_question("How are you?")));
        assert!(!is_cacheable(&normalize_question("ok")));
        assert!(is_cacheable(&normalize_question("What is gravity?")));
    }

    #[test]
    fn equivalent_questions_share_a_key() {
        assert_eq!(
            cache_key(&normalize_question("What is gravity?")),
            cache_key(&normalize_question("what is gravity"))
        );
        assert!(cache_key("x").starts_with("ai_tutor:"));
    }
}
