//! Resolution Benchmarks
//!
//! Measures the per-request path: resolving a host against large farms,
//! merging a cache document, and a full bootstrap from disk.
//!
//! Run with: cargo bench --bench resolution_benchmarks

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use wikifarm::tenancy::materializer;
use wikifarm::{
    DatabaseIndex, FarmConfig, RequestIdentity, SiteConfiguration, SuffixRule, TenantResolver,
    WikiCacheDocument, WikiInitialiser,
};

const DOCUMENT: &str = r#"{
    "core": {"wgSitename": "Bench Wiki", "wgLanguageCode": "en"},
    "url": "https://bench.example.net",
    "states": {"private": false, "closed": false, "inactive": "exempt"},
    "settings": {"wgLogo": "/logo.png", "wgEnableUploads": true, "wgMaxArticleSize": 4096},
    "extensions": ["VisualEditor", "CheckUser", "Cite", "ParserFunctions"],
    "namespaces": {
        "Portal": {"id": 3000, "contentmodel": "wikitext", "aliases": ["P"], "protection": false},
        "Portal talk": {"id": 3001, "contentmodel": "wikitext", "aliases": [], "protection": false},
        "Module": {"id": 3002, "contentmodel": "Scribunto", "aliases": [], "protection": "editinterface"}
    },
    "permissions": {
        "sysop": {"permissions": ["delete", "block", "protect"], "addgroups": ["bot"], "removegroups": ["bot"]},
        "user": {"permissions": ["edit", "createpage"]}
    }
}"#;

fn farm_index(size: usize) -> DatabaseIndex {
    let mut index = DatabaseIndex::new((0..size).map(|i| format!("tenant{}wiki", i)));
    for i in (0..size).step_by(10) {
        index = index.with_domain(format!("https://custom{}.example.org/", i), format!("tenant{}wiki", i));
    }
    index
}

fn rules() -> Vec<SuffixRule> {
    vec![
        SuffixRule::new("example.com", "wikicom"),
        SuffixRule::new("example.net", "wiki"),
    ]
}

// ============================================================================
// Resolution
// ============================================================================

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    let resolver = TenantResolver::new(rules());

    for size in [100, 10_000] {
        let index = farm_index(size);
        let suffix = RequestIdentity::from_host("tenant42.example.net");
        let domain = RequestIdentity::from_host("custom40.example.org");

        group.bench_with_input(BenchmarkId::new("suffix", size), &index, |b, index| {
            b.iter(|| black_box(resolver.resolve(black_box(&suffix), index)))
        });
        group.bench_with_input(BenchmarkId::new("domain", size), &index, |b, index| {
            b.iter(|| black_box(resolver.resolve(black_box(&domain), index)))
        });
    }

    group.finish();
}

// ============================================================================
// Materialization
// ============================================================================

fn bench_materialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("materialize");
    group.throughput(Throughput::Bytes(DOCUMENT.len() as u64));

    group.bench_function("decode", |b| {
        b.iter(|| black_box(WikiCacheDocument::from_slice(black_box(DOCUMENT.as_bytes()))))
    });

    let document = WikiCacheDocument::from_slice(DOCUMENT.as_bytes()).unwrap();
    group.bench_function("apply", |b| {
        b.iter(|| {
            let mut config = SiteConfiguration::new();
            materializer::apply(black_box(&document), "benchwiki", &mut config);
            black_box(config)
        })
    });

    group.finish();
}

// ============================================================================
// Bootstrap
// ============================================================================

fn bench_bootstrap(c: &mut Criterion) {
    let mut group = c.benchmark_group("bootstrap");

    for size in [100, 10_000] {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("databases.json"),
            serde_json::to_vec(&farm_index(size)).unwrap(),
        )
        .unwrap();
        std::fs::write(dir.path().join("tenant42wiki.json"), DOCUMENT).unwrap();

        let mut config = FarmConfig::new(dir.path());
        for rule in rules() {
            config = config.with_suffix_rule(rule.family, rule.suffix);
        }
        let initialiser = WikiInitialiser::new(&config);
        let identity = RequestIdentity::from_host("tenant42.example.net");

        group.bench_function(BenchmarkId::new("initialise", size), |b| {
            b.iter(|| black_box(initialiser.initialise(black_box(&identity))))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_resolution, bench_materialize, bench_bootstrap);
criterion_main!(benches);
