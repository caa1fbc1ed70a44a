//! Property tests for the full fetch-merge-write cycle.

use proptest::prelude::*;
use std::sync::Arc;
use toolforge_store::MemoryStore;
use toolforge_test_utils::{manifest_yaml, stored_manifest, MANIFEST_PATH};
use toolforge_upsert::{Commit, ManifestUpserter, UpsertConfig};

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

fn existing() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::btree_map("[a-z][a-z0-9_]{0,6}[a-z0-9]", "[A-Za-z ]{1,12}", 0..6)
        .prop_map(|m| m.into_iter().collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn repeated_upsert_is_a_no_op(
        records in existing(),
        key in "[a-z][a-z0-9_]{0,6}[a-z0-9]",
        label in "[A-Za-z][A-Za-z ]{0,10}[A-Za-z]",
    ) {
        let entries: Vec<(String, String, String)> = records
            .iter()
            .map(|(k, l)| (k.clone(), l.trim().to_string(), format!("tools.{k}")))
            .filter(|(_, l, _)| !l.is_empty())
            .collect();
        let borrowed: Vec<(&str, &str, &str)> = entries
            .iter()
            .map(|(k, l, t)| (k.as_str(), l.as_str(), t.as_str()))
            .collect();
        let memory = Arc::new(MemoryStore::new().with_file(MANIFEST_PATH, manifest_yaml(&borrowed)));
        let upserter = ManifestUpserter::new(Arc::clone(&memory), UpsertConfig::new());

        block_on(async {
            upserter.upsert(&key, &label, "").await.unwrap();
            let after_first = memory.text(MANIFEST_PATH).unwrap();

            let second = upserter.upsert(&key, &label, "").await.unwrap();
            prop_assert_eq!(second.commit, Commit::Skipped);
            prop_assert_eq!(memory.text(MANIFEST_PATH).unwrap(), after_first);

            let manifest = stored_manifest(&memory);
            for (k, l, t) in &entries {
                if *k != key {
                    let record = manifest.get(k).unwrap();
                    prop_assert_eq!(&record.label, l);
                    prop_assert_eq!(&record.target, t);
                }
            }
            Ok(())
        })?;
    }
}
