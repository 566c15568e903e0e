mod common;

use es_gateway::runtime::tutor::{cache_key, normalize_question, CachedAnswer};

use common::harness;

#[tokio::test]
async fn equivalent_questions_share_one_backend_call() {
    let h = harness();
    let tutor = h.state.tutor.clone().expect("tutor configured");

    let first = tutor.ask("What is gravity?").await.unwrap();
    let second = tutor.ask("what is gravity").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(h.backend.calls(), 1);

    let cached: Option<CachedAnswer> = h
        .state
        .cache
        .peek(&cache_key(&normalize_question("What is gravity?")))
        .await;
    let cached = cached.expect("answer cached");
    assert_eq!(cached.original_question, "What is gravity?");
}

#[tokio::test]
async fn greetings_are_never_cached() {
    let h = harness();
    let tutor = h.state.tutor.clone().expect("tutor configured");

    tutor.ask("hi").await.unwrap();
    tutor.ask("hi").await.unwrap();

    assert_eq!(h.backend.calls(), 2);
    let cached: Option<CachedAnswer> = h.state.cache.peek(&cache_key("hi")).await;
    assert!(cached.is_none());
}

#[tokio::test]
async fn empty_question_is_rejected_without_backend_call() {
    let h = harness();
    let tutor = h.state.tutor.clone().expect("tutor configured");

    assert!(tutor.ask("   ").await.is_err());
    assert_eq!(h.backend.calls(), 0);
}
