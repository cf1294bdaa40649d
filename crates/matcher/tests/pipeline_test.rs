//! Integration tests for [`matcher::MatchPipeline`].
//!
//! Covers the end-to-end flow, validation, embedder failures, language-model fallback and retry,
//! store failures, dimension checks, observer hand-off, concurrent appends, and cancellation.
//! Uses in-memory or temp-dir JSON stores and the doubles in `common`; no network access.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use friend_core::MatchError;
use matcher::{MatchOptions, MatchPipeline, StoreLocking};
use message_store::{Corpus, InMemoryMessageStore, JsonFileStore, MessageStore, StoredMessage};

fn seeded_store(entries: &[(&str, &str)]) -> InMemoryMessageStore {
    let mut corpus = Corpus::new();
    for (nickname, text) in entries {
        corpus
            .push(StoredMessage::new(*nickname, *text, keyword_vector(text)))
            .unwrap();
    }
    InMemoryMessageStore::with_corpus(corpus)
}

/// **Test: Two submissions into an empty corpus.**
///
/// **Setup:** Empty JSON store in a temp dir, keyword embedder, model selecting `[1]`.
/// **Action:** Submit alice's message, then bob's.
/// **Expected:** First run ranks nothing and never calls the model; second run ranks exactly
/// alice's message with a positive score; both messages are persisted in submission order.
#[tokio::test]
async fn end_to_end_second_submission_matches_first() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path().join("data").join("messages.json")));
    let llm = arc(ScriptedLlm::answering(r#"{"selected": [1]}"#));
    let pipeline = MatchPipeline::new(
        arc(KeywordEmbedder::default()),
        llm.clone(),
        store.clone(),
        fast_options(),
    );

    let first = pipeline
        .run("alice", "feeling anxious about exams")
        .await
        .unwrap();
    assert!(first.ranked.is_empty());
    assert!(first.recommended.is_empty());
    assert_eq!(llm.calls(), 0);

    let second = pipeline
        .run("bob", "exam stress is killing me")
        .await
        .unwrap();
    assert_eq!(second.ranked.len(), 1);
    assert_eq!(second.ranked[0].nickname, "alice");
    assert_eq!(second.ranked[0].text, "feeling anxious about exams");
    assert!(second.ranked[0].score > 0.0);
    assert_eq!(second.recommended, second.ranked);
    assert_eq!(llm.calls(), 1);

    let corpus = store.load().await.unwrap();
    let names: Vec<&str> = corpus.iter().map(|m| m.nickname.as_str()).collect();
    assert_eq!(names, vec!["alice", "bob"]);
}

/// **Test: Input is trimmed before matching and storing.**
#[tokio::test]
async fn inputs_are_trimmed() {
    let store = Arc::new(InMemoryMessageStore::new());
    let pipeline = MatchPipeline::new(
        arc(KeywordEmbedder::default()),
        arc(ScriptedLlm::answering(r#"{"selected": []}"#)),
        store.clone(),
        fast_options(),
    );

    pipeline.run("  alice ", "\tmusic helps\n").await.unwrap();

    let stored = store.snapshot().await;
    assert_eq!(stored.messages()[0].nickname, "alice");
    assert_eq!(stored.messages()[0].text, "music helps");
}

/// **Test: Blank nickname or text is rejected before any external call.**
///
/// **Expected:** `MatchError::Validation`; embedder, model and store untouched.
#[tokio::test]
async fn blank_input_is_validation_error() {
    let embedder = arc(KeywordEmbedder::default());
    let llm = arc(ScriptedLlm::answering(r#"{"selected": [1]}"#));
    let store = Arc::new(InMemoryMessageStore::new());
    let pipeline = MatchPipeline::new(embedder.clone(), llm.clone(), store.clone(), fast_options());

    for (nickname, text) in [("", "hello"), ("alice", "   "), (" \n", "\t")] {
        let err = pipeline.run(nickname, text).await.unwrap_err();
        assert!(matches!(err, MatchError::Validation(_)), "{err:?}");
    }

    assert_eq!(embedder.calls(), 0);
    assert_eq!(llm.calls(), 0);
    assert_eq!(store.load_count(), 0);
    assert_eq!(store.save_count(), 0);
}

/// **Test: Embedder failure is fatal and nothing is persisted.**
#[tokio::test]
async fn embedder_failure_leaves_corpus_unchanged() {
    let store = Arc::new(seeded_store(&[("alice", "exam stress")]));
    let before = store.snapshot().await;
    let llm = arc(ScriptedLlm::answering(r#"{"selected": [1]}"#));
    let pipeline = MatchPipeline::new(arc(FailingEmbedder), llm.clone(), store.clone(), fast_options());

    let err = pipeline.run("bob", "exam stress").await.unwrap_err();

    assert!(matches!(err, MatchError::Embedding(_)), "{err:?}");
    assert_eq!(err.kind(), "embedding");
    assert_eq!(llm.calls(), 0);
    assert_eq!(store.save_count(), 0);
    assert_eq!(store.snapshot().await, before);
}

/// **Test: A hanging embedder times out with a distinguishable error.**
#[tokio::test]
async fn embedder_timeout_is_distinguished() {
    let store = Arc::new(InMemoryMessageStore::new());
    let options = MatchOptions {
        embed_timeout: Duration::from_millis(30),
        ..fast_options()
    };
    let pipeline = MatchPipeline::new(
        arc(HangingEmbedder),
        arc(ScriptedLlm::answering(r#"{"selected": [1]}"#)),
        store.clone(),
        options,
    );

    let err = pipeline.run("bob", "exam stress").await.unwrap_err();

    assert!(matches!(err, MatchError::EmbeddingTimeout { .. }), "{err:?}");
    assert_eq!(store.save_count(), 0);
}

/// **Test: Prose instead of JSON falls back to the single top-ranked candidate.**
///
/// **Expected:** `recommended == [ranked[0]]` and the new message is still stored.
#[tokio::test]
async fn unparseable_answer_falls_back_to_top_candidate() {
    let store = Arc::new(seeded_store(&[
        ("alice", "exam stress"),
        ("carol", "pizza and music"),
        ("dave", "cannot sleep before exam"),
    ]));
    let pipeline = MatchPipeline::new(
        arc(KeywordEmbedder::default()),
        arc(ScriptedLlm::answering("I think alice and dave would be great friends.")),
        store.clone(),
        fast_options(),
    );

    let outcome = pipeline.run("bob", "exam stress again").await.unwrap();

    assert_eq!(outcome.ranked.len(), 3);
    assert_eq!(outcome.recommended, vec![outcome.ranked[0].clone()]);
    assert_eq!(store.snapshot().await.len(), 4);
}

/// **Test: Out-of-range and repeated positions in the answer.**
///
/// **Setup:** Three stored messages; model answers `{"selected":[2,5,2]}`.
/// **Expected:** Exactly one recommendation, the second-ranked candidate.
#[tokio::test]
async fn answer_with_out_of_range_and_duplicate_positions() {
    let store = Arc::new(seeded_store(&[
        ("alice", "exam stress"),
        ("carol", "pizza and music"),
        ("dave", "cannot sleep before exam"),
    ]));
    let pipeline = MatchPipeline::new(
        arc(KeywordEmbedder::default()),
        arc(ScriptedLlm::answering(r#"{"selected":[2,5,2]}"#)),
        store,
        fast_options(),
    );

    let outcome = pipeline.run("bob", "exam stress again").await.unwrap();

    assert_eq!(outcome.ranked.len(), 3);
    assert_eq!(outcome.recommended, vec![outcome.ranked[1].clone()]);
}

/// **Test: `{"selected": []}` is an empty recommendation, not a fallback.**
#[tokio::test]
async fn empty_selection_is_respected() {
    let store = Arc::new(seeded_store(&[("alice", "exam stress")]));
    let pipeline = MatchPipeline::new(
        arc(KeywordEmbedder::default()),
        arc(ScriptedLlm::answering(r#"{"selected": []}"#)),
        store,
        fast_options(),
    );

    let outcome = pipeline.run("bob", "pizza tonight").await.unwrap();

    assert_eq!(outcome.ranked.len(), 1);
    assert!(outcome.recommended.is_empty());
}

/// **Test: A failed model call is retried within the attempt budget.**
#[tokio::test]
async fn model_failure_is_retried() {
    let store = Arc::new(seeded_store(&[("alice", "exam stress"), ("carol", "music")]));
    let llm = arc(ScriptedLlm::with_script(
        vec![Reply::Fail("503 service unavailable")],
        r#"{"selected": [2, 1]}"#,
    ));
    let pipeline = MatchPipeline::new(arc(KeywordEmbedder::default()), llm.clone(), store, fast_options());

    let outcome = pipeline.run("bob", "exam music").await.unwrap();

    assert_eq!(llm.calls(), 2);
    assert_eq!(
        outcome.recommended,
        vec![outcome.ranked[1].clone(), outcome.ranked[0].clone()]
    );
}

/// **Test: A model that keeps failing or hanging degrades to the top candidate; the run still stores.**
#[tokio::test]
async fn model_unavailable_falls_back_and_persists() {
    let store = Arc::new(seeded_store(&[("alice", "exam stress"), ("carol", "music")]));
    let llm = arc(ScriptedLlm::with_script(
        vec![Reply::Hang, Reply::Fail("401 unauthorized")],
        r#"{"selected": [2]}"#,
    ));
    let options = MatchOptions {
        llm_timeout: Duration::from_millis(30),
        llm_max_attempts: 2,
        ..fast_options()
    };
    let pipeline = MatchPipeline::new(arc(KeywordEmbedder::default()), llm.clone(), store.clone(), options);

    let outcome = pipeline.run("bob", "exam stress").await.unwrap();

    assert_eq!(llm.calls(), 2);
    assert_eq!(outcome.recommended, vec![outcome.ranked[0].clone()]);
    assert_eq!(outcome.ranked[0].nickname, "alice");
    assert_eq!(store.snapshot().await.len(), 3);
}

/// **Test: The prompt names every ranked candidate and the user's message.**
#[tokio::test]
async fn prompt_carries_ranked_candidates() {
    let store = Arc::new(seeded_store(&[("alice", "exam stress"), ("carol", "music")]));
    let llm = arc(ScriptedLlm::answering(r#"{"selected": [1]}"#));
    let pipeline = MatchPipeline::new(arc(KeywordEmbedder::default()), llm.clone(), store, fast_options());

    pipeline.run("bob", "exam worries").await.unwrap();

    let prompt = llm.last_prompt().unwrap();
    assert!(prompt.contains("exam worries"));
    assert!(prompt.contains("1. nickname=alice | message=exam stress"));
    assert!(prompt.contains("2. nickname=carol | message=music"));
}

/// **Test: The observer receives the full ranked list before filtering.**
#[tokio::test]
async fn observer_sees_full_ranking() {
    let store = Arc::new(seeded_store(&[
        ("alice", "exam stress"),
        ("carol", "music"),
        ("dave", "sleep"),
        ("erin", "pizza"),
    ]));
    let observer = arc(RecordingObserver::default());
    let pipeline = MatchPipeline::new(
        arc(KeywordEmbedder::default()),
        arc(ScriptedLlm::answering(r#"{"selected": []}"#)),
        store,
        fast_options(),
    )
    .with_observer(observer.clone());

    let outcome = pipeline.run("bob", "exam stress").await.unwrap();

    let seen = observer.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "bob");
    assert_eq!(seen[0].1, outcome.ranked);
    assert_eq!(seen[0].1.len(), 3);
}

/// **Test: A corrupt corpus file is fatal and left as it was.**
#[tokio::test]
async fn corrupt_store_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("messages.json");
    std::fs::write(&path, "[{\"nickname\": \"alice\"").unwrap();
    let llm = arc(ScriptedLlm::answering(r#"{"selected": [1]}"#));
    let pipeline = MatchPipeline::new(
        arc(KeywordEmbedder::default()),
        llm.clone(),
        Arc::new(JsonFileStore::new(&path)),
        fast_options(),
    );

    let err = pipeline.run("bob", "exam stress").await.unwrap_err();

    assert!(matches!(err, MatchError::CorruptStore(_)), "{err:?}");
    assert_eq!(llm.calls(), 0);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "[{\"nickname\": \"alice\"");
}

/// **Test: A query embedding of another dimension is rejected unless checks are disabled.**
#[tokio::test]
async fn dimension_mismatch_is_enforced_by_default() {
    let store = Arc::new(seeded_store(&[("alice", "exam stress")]));
    let pipeline = MatchPipeline::new(
        arc(FixedEmbedder(vec![1.0, 0.0])),
        arc(ScriptedLlm::answering(r#"{"selected": [1]}"#)),
        store.clone(),
        fast_options(),
    );

    let err = pipeline.run("bob", "anything").await.unwrap_err();
    assert!(
        matches!(err, MatchError::DimensionMismatch { expected: 6, actual: 2 }),
        "{err:?}"
    );
    assert_eq!(store.save_count(), 0);

    let lenient = MatchPipeline::new(
        arc(FixedEmbedder(vec![1.0, 0.0])),
        arc(ScriptedLlm::answering(r#"{"selected": [1]}"#)),
        store.clone(),
        MatchOptions {
            enforce_dimension: false,
            ..fast_options()
        },
    );
    let outcome = lenient.run("bob", "anything").await.unwrap();
    assert_eq!(outcome.ranked[0].score, 0.0);
    assert_eq!(store.snapshot().await.len(), 2);
}

/// **Test: Concurrent runs on one pipeline keep every appended message.**
///
/// **Setup:** Shared pipeline over a JSON file store, exclusive locking, multi-threaded runtime.
/// **Expected:** All 8 messages present after the runs complete.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_runs_do_not_lose_messages() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path().join("messages.json")));
    let pipeline = Arc::new(MatchPipeline::new(
        arc(KeywordEmbedder::default()),
        arc(ScriptedLlm::answering(r#"{"selected": [1]}"#)),
        store.clone(),
        MatchOptions {
            locking: StoreLocking::Exclusive,
            ..fast_options()
        },
    ));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let pipeline = pipeline.clone();
            tokio::spawn(async move {
                pipeline
                    .run(&format!("user{i}"), "exam stress and music")
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let corpus = store.load().await.unwrap();
    assert_eq!(corpus.len(), 8);
}

/// **Test: Dropping a run while it waits on the embedder changes nothing.**
#[tokio::test]
async fn cancelled_run_leaves_store_untouched() {
    let store = Arc::new(seeded_store(&[("alice", "exam stress")]));
    let before = store.snapshot().await;
    let pipeline = MatchPipeline::new(
        arc(HangingEmbedder),
        arc(ScriptedLlm::answering(r#"{"selected": [1]}"#)),
        store.clone(),
        MatchOptions {
            embed_timeout: Duration::from_secs(3600),
            ..fast_options()
        },
    );

    let cancelled = tokio::time::timeout(Duration::from_millis(20), pipeline.run("bob", "exam")).await;

    assert!(cancelled.is_err());
    assert_eq!(store.save_count(), 0);
    assert_eq!(store.snapshot().await, before);
}
