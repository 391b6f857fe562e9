use bson::doc;
use innkeep::audit::MemoryAuditSink;
use innkeep::query::MatchAll;
use innkeep::resources::room;
use innkeep::service::DocumentService;
use innkeep::store::MemoryStore;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;

fn service() -> DocumentService {
    DocumentService::new(
        room::NAME,
        Arc::new(MemoryStore::new(room::schema())),
        Arc::new(MemoryAuditSink::new()),
        Arc::new(MatchAll),
    )
}

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 48,
        .. proptest::test_runner::Config::default()
    })]

    #[test]
    fn prop_create_many_accounts_for_every_input(numbers in proptest::collection::vec(0u8..12, 0..24), bad in proptest::collection::vec(any::<bool>(), 24)) {
        let docs: Vec<bson::Document> = numbers
            .iter()
            .zip(&bad)
            .map(|(n, broken)| {
                let occupancy = if *broken { "haunted" } else { "vacant" };
                doc! { "number": n.to_string(), "type": "twin", "floor": "2", "occupancy": occupancy }
            })
            .collect();
        let mut expected = BTreeSet::new();
        for (n, broken) in numbers.iter().zip(&bad) {
            if !*broken {
                expected.insert(n.to_string());
            }
        }

        let outcome = service().create_many(docs);
        prop_assert_eq!(outcome.affected_count() + outcome.unaffected_count(), numbers.len());
        let inserted: Vec<String> = outcome.affected.iter().map(|d| d.get_str("number").unwrap().to_string()).collect();
        let distinct: BTreeSet<String> = inserted.iter().cloned().collect();
        prop_assert_eq!(distinct.len(), inserted.len());
        prop_assert_eq!(distinct, expected);
    }
}
