#![no_main]

use libfuzzer_sys::fuzz_target;
use mapsearch::highlight::HighlightQuery;

fuzz_target!(|data: &str| {
    if let Some(query) = HighlightQuery::parse(data) {
        let _ = query.compile();
    }
});
