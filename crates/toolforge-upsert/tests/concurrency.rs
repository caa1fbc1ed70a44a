//! Concurrent upserts against one store.

use std::sync::Arc;
use toolforge_store::MemoryStore;
use toolforge_test_utils::{seeded_store, stored_manifest, GatedStore, MANIFEST_PATH};
use toolforge_upsert::{Commit, ManifestUpserter, UpsertConfig, UpsertError};

fn keys(memory: &MemoryStore) -> Vec<String> {
    stored_manifest(memory)
        .records()
        .iter()
        .map(|r| r.key.clone())
        .collect()
}

#[tokio::test]
async fn concurrent_first_creations_both_land() {
    let memory = Arc::new(MemoryStore::new());
    let store = Arc::new(GatedStore::new(Arc::clone(&memory), 2));
    let left = ManifestUpserter::new(Arc::clone(&store), UpsertConfig::new());
    let right = ManifestUpserter::new(Arc::clone(&store), UpsertConfig::new());

    let (a, b) = tokio::join!(
        left.upsert("alpha", "Alpha", "tools.alpha"),
        right.upsert("beta", "Beta", "tools.beta"),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    // exactly one created the file; the other lost, re-fetched and updated
    let mut attempts = [a.attempts, b.attempts];
    attempts.sort_unstable();
    assert_eq!(attempts, [1, 2]);
    assert!(matches!(a.commit, Commit::Created(_)) ^ matches!(b.commit, Commit::Created(_)));

    let mut found = keys(&memory);
    found.sort();
    assert_eq!(found, vec!["alpha", "beta"]);
    assert_eq!(memory.stats().conflicts, 1);
}

#[tokio::test]
async fn concurrent_updates_lose_nothing_silently() {
    let memory = seeded_store(&[("a", "A", "tools.a")]);
    let store = Arc::new(GatedStore::new(Arc::clone(&memory), 2));
    let left = ManifestUpserter::new(Arc::clone(&store), UpsertConfig::new());
    let right = ManifestUpserter::new(Arc::clone(&store), UpsertConfig::new());

    let (a, b) = tokio::join!(
        left.upsert("b", "B", "tools.b"),
        right.upsert("c", "C", "tools.c"),
    );

    // both read the same revision; the loser reports a conflict instead of
    // overwriting the winner
    let (winner, loser) = match (a, b) {
        (Ok(_), Err(err)) => ("b", err),
        (Err(err), Ok(_)) => ("c", err),
        other => panic!("expected one winner, got {other:?}"),
    };
    assert!(matches!(loser, UpsertError::Conflict { attempts: 1, .. }));
    assert_eq!(keys(&memory), vec!["a", winner]);
    assert!(memory.text(MANIFEST_PATH).is_some());
}

#[tokio::test]
async fn many_sequential_writers_accumulate() {
    let memory = Arc::new(MemoryStore::new());
    let upserter = ManifestUpserter::new(Arc::clone(&memory), UpsertConfig::new());

    for i in 0..10 {
        let key = format!("tool_{i}");
        upserter.upsert(&key, &key, "").await.unwrap();
    }

    assert_eq!(stored_manifest(&memory).len(), 10);
    assert_eq!(memory.stats().writes, 10);
}
