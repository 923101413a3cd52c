//! Fuzz target for per-wiki cache document decoding.
//!
//! Any input must either fail to decode or merge cleanly, and merging the
//! same document twice must not change the result.

#![no_main]

use libfuzzer_sys::fuzz_target;
use wikifarm_tenancy::materializer::apply;
use wikifarm_tenancy::{SiteConfiguration, WikiCacheDocument};

fuzz_target!(|data: &[u8]| {
    let Ok(document) = WikiCacheDocument::from_slice(data) else {
        return;
    };

    let mut once = SiteConfiguration::new();
    apply(&document, "fuzzwiki", &mut once);

    let mut twice = once.clone();
    apply(&document, "fuzzwiki", &mut twice);
    assert_eq!(once, twice);

    let _ = once.to_json();
});
