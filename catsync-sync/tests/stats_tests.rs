//! Tests for stats.rs — counting, finalization and the report schema.

mod common;

use catsync_sync::{
    CatalogError, EntityFailure, Outcome, OutcomeKind, RunStatistics, StatisticsAggregator,
    SyncError,
};
use common::key;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn created(k: &str) -> Outcome {
    Outcome::Created { key: key(k) }
}

fn failed(k: &str) -> Outcome {
    Outcome::Failed {
        subject: k.to_string(),
        error: EntityFailure::Catalog(CatalogError::Validation("bad".into())),
    }
}

fn warned(k: &str) -> Outcome {
    Outcome::Warned {
        subject: k.to_string(),
        reason: "dangling".into(),
    }
}

// ── Recording ───────────────────────────────────────────────────

#[test]
fn records_each_kind() {
    let stats = StatisticsAggregator::new();
    stats.record(&created("a")).unwrap();
    stats.record(&created("b")).unwrap();
    stats
        .record(&Outcome::Updated {
            key: key("c"),
            actions: 3,
        })
        .unwrap();
    stats.record(&Outcome::Unchanged { key: key("d") }).unwrap();
    stats.record(&failed("e")).unwrap();
    stats.record(&warned("f")).unwrap();

    let snapshot = stats.snapshot();
    assert_eq!(
        (
            snapshot.created,
            snapshot.updated,
            snapshot.unchanged,
            snapshot.failed,
            snapshot.warned
        ),
        (2, 1, 1, 1, 1)
    );
    assert_eq!(snapshot.processed(), 6);
}

#[test]
fn outcome_kinds() {
    assert_eq!(created("a").kind(), OutcomeKind::Created);
    assert_eq!(failed("a").kind(), OutcomeKind::Failed);
    assert!(failed("a").is_failed());
    assert!(warned("a").is_warned());
    assert_eq!(warned("x").subject(), "x");
    assert!(failed("a").failure().unwrap().is_validation());
}

#[test]
fn record_all_counts_a_batch() {
    let stats = StatisticsAggregator::new();
    let outcomes = vec![created("a"), created("b"), warned("c")];

    stats.record_all(&outcomes).unwrap();

    assert_eq!(stats.snapshot().processed(), 3);
}

#[test]
fn concurrent_records_are_all_counted() {
    let stats = Arc::new(StatisticsAggregator::new());
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let stats = Arc::clone(&stats);
            std::thread::spawn(move || {
                for i in 0..250 {
                    let outcome = if i % 5 == 0 {
                        failed(&format!("t{t}-{i}"))
                    } else {
                        created(&format!("t{t}-{i}"))
                    };
                    stats.record(&outcome).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let snapshot = stats.finalize();
    assert_eq!(snapshot.processed(), 2_000);
    assert_eq!(snapshot.failed, 400);
    assert_eq!(snapshot.created, 1_600);
}

// ── Finalization ────────────────────────────────────────────────

#[test]
fn record_after_finalize_fails_loudly() {
    let stats = StatisticsAggregator::new();
    stats.record(&created("a")).unwrap();
    let frozen = stats.finalize();

    let err = stats.record(&created("b")).unwrap_err();

    assert!(matches!(err, SyncError::StatisticsFinalized));
    assert_eq!(stats.snapshot(), frozen);
    assert_eq!(frozen.created, 1);
    assert!(stats.is_finalized());
}

#[test]
fn finalize_twice_returns_the_same_statistics() {
    let stats = StatisticsAggregator::new();
    stats.record(&created("a")).unwrap();

    let first = stats.finalize();
    std::thread::sleep(std::time::Duration::from_millis(5));
    let second = stats.finalize();

    assert_eq!(first, second);
}

#[tokio::test(start_paused = true)]
async fn processing_time_is_measured_from_start() {
    let stats = StatisticsAggregator::new();
    tokio::time::advance(std::time::Duration::from_millis(1_500)).await;

    assert_eq!(stats.finalize().processing_time_ms, 1_500);
}

// ── Report schema ───────────────────────────────────────────────

#[test]
fn json_fields_have_fixed_order() {
    let stats = RunStatistics {
        created: 2,
        updated: 0,
        unchanged: 1,
        failed: 0,
        warned: 3,
        processing_time_ms: 42,
    };

    assert_eq!(
        stats.to_json().unwrap(),
        r#"{"created":2,"updated":0,"unchanged":1,"failed":0,"warned":3,"processingTimeMs":42}"#
    );
}

#[test]
fn json_round_trips() {
    let stats = RunStatistics {
        created: 5,
        processing_time_ms: 7,
        ..Default::default()
    };
    let parsed: RunStatistics = serde_json::from_str(&stats.to_json().unwrap()).unwrap();
    assert_eq!(parsed, stats);
}

#[test]
fn summary_mentions_every_count() {
    let stats = RunStatistics {
        created: 1,
        updated: 2,
        unchanged: 3,
        failed: 4,
        warned: 5,
        processing_time_ms: 6,
    };

    assert_eq!(
        stats.summary(),
        "Summary: 15 categories were processed in total (1 created, 2 updated, 3 unchanged, 4 failed to sync and 5 warned) in 6ms."
    );
}
