//! Tenant Resolution for Wiki Farms
//!
//! One codebase serving many wikis: this crate works out which wiki a
//! request belongs to and assembles that wiki's layered configuration from
//! precomputed JSON cache documents, without touching a live database on
//! the request path.
//!
//! # Features
//!
//! - 🔍 **Tenant Resolution** - Explicit override, custom domains, site-family suffixes
//! - 📦 **Cache Artifacts** - Lenient decoding of rebuild-job output
//! - 🧩 **Materialization** - Per-wiki keyed settings with idempotent merges
//! - 🗂️ **Tenant Records** - Immutable snapshots with tri-state inactivity
//! - 🚫 **Deleted Wikis** - Visible to administrative (CLI) contexts only
//!
//! # Quick Start
//!
//! ## 1. Bootstrap a request
//!
//! ```rust,ignore
//! use wikifarm_config::FarmConfig;
//! use wikifarm_tenancy::prelude::*;
//!
//! let config = FarmConfig::builder()
//!     .add_file("/etc/wikifarm/farm.toml")
//!     .load_env()
//!     .build()?;
//!
//! let initialiser = WikiInitialiser::new(&config);
//! let identity = RequestIdentity::from_headers(request.headers());
//! let wiki = initialiser.initialise(&identity)?;
//!
//! let sitename = wiki.get("wgSitename");
//! ```
//!
//! ## 2. Resolve without materializing
//!
//! ```
//! use wikifarm_config::SuffixRule;
//! use wikifarm_tenancy::{DatabaseIndex, RequestIdentity, Strategy, TenantResolver};
//!
//! let index = DatabaseIndex::new(["examplewiki"])
//!     .with_domain("https://wiki.example.org/", "examplewiki");
//! let resolver = TenantResolver::new(vec![SuffixRule::new("example.net", "wiki")]);
//!
//! let resolution = resolver
//!     .resolve(&RequestIdentity::from_host("wiki.example.org"), &index)
//!     .unwrap();
//! assert_eq!(resolution.dbname, "examplewiki");
//! assert_eq!(resolution.strategy, Strategy::DomainMap);
//! ```
//!
//! ## 3. Look up a tenant record
//!
//! ```rust,ignore
//! use wikifarm_tenancy::*;
//!
//! struct MyTenantStore {
//!     db: MyDatabasePool,
//! }
//!
//! impl TenantStore for MyTenantStore {
//!     fn find_by_dbname(&self, dbname: &str) -> Result<Option<TenantRecord>> {
//!         let row: Option<TenantRow> = self
//!             .db
//!             .query_row("SELECT * FROM cw_wikis WHERE wiki_dbname = ?", &[dbname])
//!             .map_err(|e| TenancyError::Storage(e.to_string()))?;
//!         row.map(TenantRecord::try_from).transpose()
//!     }
//! }
//! ```

mod de;

pub mod cache;
pub mod error;
pub mod initialise;
pub mod materializer;
pub mod resolver;
pub mod settings;
pub mod store;
pub mod tenant;
pub mod value;

pub use cache::{
    CacheAuditEntry, CacheDirectory, CacheStatus, CoreSection, DatabaseIndex, GroupPermissions,
    NamespaceDefinition, Namespaces, StatesSection, WikiCacheDocument, DELETED_FILE, INDEX_FILE,
};
pub use error::{Result, TenancyError};
pub use initialise::{ResolvedWiki, WikiInitialiser};
pub use materializer::{LoadOutcome, Materializer};
pub use resolver::{
    resolve, DomainMap, ExplicitOverride, RequestIdentity, Resolution, ResolutionStrategy,
    Strategy, SuffixMatch, TenantResolver,
};
pub use settings::{keys, SiteConfiguration, DEFAULT_WIKI};
pub use store::{InMemoryTenantStore, TenantStore};
pub use tenant::{InactiveState, TenantRecord, TenantRow, DEFAULT_CATEGORY};
pub use value::SettingValue;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cache::{CacheDirectory, DatabaseIndex};
    pub use crate::error::TenancyError;
    pub use crate::initialise::{ResolvedWiki, WikiInitialiser};
    pub use crate::materializer::LoadOutcome;
    pub use crate::resolver::{RequestIdentity, Strategy, TenantResolver};
    pub use crate::settings::SiteConfiguration;
    pub use crate::store::TenantStore;
    pub use crate::tenant::{InactiveState, TenantRecord};
    pub use crate::value::SettingValue;
}
