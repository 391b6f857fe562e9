#![no_main]
use innkeep::query::{FilterValue, QueryCompiler, parse_query_string};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 { return; }
    if let Ok(s) = std::str::from_utf8(data) {
        let q = QueryCompiler::new(50).compile(&parse_query_string(s));
        assert!(q.limit <= 50);
        for value in q.filter.values() {
            if let FilterValue::Range(r) = value {
                assert!(!(r.gt.is_some() && r.gte.is_some()));
                assert!(!(r.lt.is_some() && r.lte.is_some()));
            }
        }
    }
});
