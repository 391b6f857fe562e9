#![no_main]
use innkeep::query::{compile, eval_filter, parse_query_string};
use innkeep::resources::room;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 { return; }
    if let Ok(s) = std::str::from_utf8(data) {
        let filter = room::filter(&compile(&parse_query_string(s)).filter);
        let docs = [
            bson::doc! {"number": "101", "type": "single", "floor": "1", "isClean": true},
            bson::doc! {"number": "7", "floor": "2", "occupancy": "vacant", "createdAt": bson::DateTime::from_millis(0)},
            bson::doc! {"isOutOfOrder": false, "note": ["leaky tap"]},
        ];
        for d in &docs {
            let _ = eval_filter(d, &filter);
        }
    }
});
