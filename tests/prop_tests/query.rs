use innkeep::query::{FilterValue, QueryCompiler, parse_query_string};
use proptest::prelude::*;

fn field() -> impl Strategy<Value = String> {
    "[a-z]{1,8}".prop_filter("reserved", |f| !["select", "fields", "project", "show", "sort", "order", "limit", "skip"].contains(&f.as_str()))
}

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 64,
        .. proptest::test_runner::Config::default()
    })]

    #[test]
    fn prop_equality_supersedes_ranges(f in field(), eq in "[0-9]{1,4}", lo in "[0-9]{1,4}", hi in "[0-9]{1,4}") {
        let raw = format!("{f}>={lo}&{f}={eq}&{f}<{hi}");
        let q = QueryCompiler::default().compile(&parse_query_string(&raw));
        prop_assert_eq!(q.filter.get(&f), Some(&FilterValue::Equal(eq)));
        prop_assert_eq!(q.filter.len(), 1);
    }

    #[test]
    fn prop_limit_stays_within_bounds(max in 1usize..500, limit in 0u64..100_000, skip in 0u64..1000) {
        let raw = format!("limit={limit}&skip={skip}");
        let q = QueryCompiler::new(max).compile(&parse_query_string(&raw));
        prop_assert!(q.limit >= 1 && q.limit <= max);
        if limit > 0 {
            prop_assert_eq!(q.limit, (limit as usize).min(max));
        }
        prop_assert_eq!(q.skip, skip as usize);
    }

    #[test]
    fn prop_compile_never_panics(raw in "[a-z0-9=&<>!,+%-]{0,64}") {
        let q = QueryCompiler::new(10).compile(&parse_query_string(&raw));
        prop_assert!(q.limit <= 10);
    }
}
