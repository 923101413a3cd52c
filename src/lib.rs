// wikifarm - tenant resolution for wiki farms
//
// One application codebase serving many wikis: resolve the wiki a request
// belongs to, then materialize its layered configuration from precomputed
// JSON cache documents.

// Re-export member crates
pub use wikifarm_config as config;
pub use wikifarm_tenancy as tenancy;

// Re-export core functionality
pub use wikifarm_config::{ConfigError, ExecutionMode, FarmConfig, FarmConfigBuilder, SuffixRule};
pub use wikifarm_tenancy::{
    CacheDirectory, DatabaseIndex, InMemoryTenantStore, InactiveState, LoadOutcome, RequestIdentity,
    ResolvedWiki, SettingValue, SiteConfiguration, Strategy, TenancyError, TenantRecord,
    TenantResolver, TenantRow, TenantStore, WikiCacheDocument, WikiInitialiser, keys,
};

/// Bootstrap a web request for `host` using `config`
///
/// The configured override variable still wins over the host when set.
pub fn initialise_host(config: &FarmConfig, host: &str) -> Result<ResolvedWiki, TenancyError> {
    let initialiser = WikiInitialiser::new(config);
    let identity = initialiser.identity_for_host(Some(host));
    initialiser.initialise(&identity)
}

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        ExecutionMode,
        FarmConfig,
        InactiveState,
        LoadOutcome,
        RequestIdentity,
        ResolvedWiki,
        SettingValue,
        SiteConfiguration,
        Strategy,
        TenancyError,
        TenantRecord,
        TenantStore,
        WikiInitialiser,
        keys,
    };
}
