//! Fuzz target for host resolution.
//!
//! Tests the resolver chain with arbitrary hosts, overrides and rules.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use wikifarm_config::SuffixRule;
use wikifarm_tenancy::{DatabaseIndex, RequestIdentity, Strategy, TenantResolver};

#[derive(Debug, Arbitrary)]
struct FuzzRequest {
    host: Option<String>,
    explicit: Option<String>,
    rules: Vec<(String, String)>,
    databases: Vec<String>,
    domains: Vec<(String, String)>,
}

fuzz_target!(|data: FuzzRequest| {
    let mut index = DatabaseIndex::new(data.databases);
    for (url, dbname) in data.domains {
        index = index.with_domain(url, dbname);
    }

    let rules = data
        .rules
        .into_iter()
        .map(|(family, suffix)| SuffixRule::new(family, suffix))
        .collect();
    let identity = RequestIdentity {
        host: data.host,
        explicit: data.explicit.clone(),
    };

    match TenantResolver::new(rules).resolve(&identity, &index) {
        Ok(resolution) if resolution.strategy == Strategy::Explicit => {
            assert_eq!(Some(resolution.dbname), data.explicit);
        }
        Ok(_) => assert!(data.explicit.is_none()),
        Err(_) => assert!(data.explicit.is_none()),
    }
});
