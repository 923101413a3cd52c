//! Cache Artifact Store
//!
//! Read-only access to the directory of JSON documents produced by the
//! offline cache rebuild job:
//!
//! - `databases.json`: the index of live wikis and custom domains
//! - `deleted.json`: the index of soft-deleted wikis
//! - `<dbname>.json`: one configuration document per wiki
//!
//! Documents are decoded in full before being handed out, so a corrupt
//! document never yields a partial result.

use crate::de;
use crate::error::{Result, TenancyError};
use crate::tenant::InactiveState;
use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name of the live wiki index
pub const INDEX_FILE: &str = "databases.json";

/// File name of the deleted wiki index
pub const DELETED_FILE: &str = "deleted.json";

/// Contents of `databases.json` (and `deleted.json`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseIndex {
    /// Full URL (`https://host/`) to dbname
    #[serde(default, deserialize_with = "domain_map")]
    pub domains: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "de::string_list")]
    pub databases: Vec<String>,
}

fn domain_map<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    de::keyed_map(deserializer).map(Option::unwrap_or_default)
}

impl DatabaseIndex {
    pub fn new(databases: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            domains: BTreeMap::new(),
            databases: databases.into_iter().map(Into::into).collect(),
        }
    }

    /// Map a custom domain URL to a dbname
    pub fn with_domain(mut self, url: impl Into<String>, dbname: impl Into<String>) -> Self {
        self.domains.insert(url.into(), dbname.into());
        self
    }

    /// dbname registered for `https://<host>/`
    pub fn domain_for_host(&self, host: &str) -> Option<&str> {
        self.domains
            .get(&format!("https://{}/", host))
            .map(String::as_str)
    }

    pub fn contains(&self, dbname: &str) -> bool {
        self.databases.iter().any(|db| db == dbname)
    }
}

/// `core` section of a wiki document
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CoreSection {
    #[serde(rename = "wgSitename", default, deserialize_with = "de::optional_string")]
    pub sitename: Option<String>,
    #[serde(rename = "wgLanguageCode", default, deserialize_with = "de::optional_string")]
    pub language_code: Option<String>,
}

/// `states` section of a wiki document
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct StatesSection {
    #[serde(default, deserialize_with = "de::flag")]
    pub private: bool,
    #[serde(default, deserialize_with = "de::flag")]
    pub closed: bool,
    #[serde(default)]
    pub inactive: InactiveState,
}

/// One custom namespace definition
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceDefinition {
    pub id: i64,
    pub name: String,
    pub content_model: Option<String>,
    pub aliases: Vec<String>,
    pub protection: Option<String>,
}

#[derive(Deserialize)]
struct RawNamespace {
    #[serde(deserialize_with = "de::namespace_id")]
    id: i64,
    #[serde(default, deserialize_with = "de::optional_string")]
    name: Option<String>,
    #[serde(
        rename = "contentmodel",
        alias = "content_model",
        default,
        deserialize_with = "de::optional_string"
    )]
    content_model: Option<String>,
    #[serde(default, deserialize_with = "de::string_list")]
    aliases: Vec<String>,
    #[serde(default, deserialize_with = "de::optional_string")]
    protection: Option<String>,
}

impl RawNamespace {
    fn into_definition(self, name: String) -> NamespaceDefinition {
        NamespaceDefinition {
            id: self.id,
            name,
            content_model: self.content_model,
            aliases: self.aliases,
            protection: self.protection,
        }
    }
}

/// Namespace definitions in document order
///
/// Accepts an object keyed by canonical name or a list of objects that
/// carry their own `name`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespaces(pub Vec<NamespaceDefinition>);

impl Namespaces {
    pub fn iter(&self) -> impl Iterator<Item = &NamespaceDefinition> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for Namespaces {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct NamespacesVisitor;

        impl<'de> Visitor<'de> for NamespacesVisitor {
            type Value = Namespaces;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a namespace list or an object keyed by namespace name")
            }

            fn visit_unit<E: serde::de::Error>(self) -> std::result::Result<Namespaces, E> {
                Ok(Namespaces::default())
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Namespaces, A::Error> {
                let mut definitions = Vec::new();
                while let Some(raw) = seq.next_element::<RawNamespace>()? {
                    let name = raw
                        .name
                        .clone()
                        .ok_or_else(|| serde::de::Error::missing_field("name"))?;
                    definitions.push(raw.into_definition(name));
                }
                Ok(Namespaces(definitions))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Namespaces, A::Error> {
                let mut definitions = Vec::new();
                while let Some((name, raw)) = map.next_entry::<String, RawNamespace>()? {
                    definitions.push(raw.into_definition(name));
                }
                Ok(Namespaces(definitions))
            }
        }

        deserializer.deserialize_any(NamespacesVisitor)
    }
}

/// Per-group permission overrides
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GroupPermissions {
    #[serde(default, deserialize_with = "de::string_list")]
    pub permissions: Vec<String>,
    #[serde(default, deserialize_with = "de::string_list")]
    pub addgroups: Vec<String>,
    #[serde(default, deserialize_with = "de::string_list")]
    pub removegroups: Vec<String>,
    #[serde(default, deserialize_with = "de::string_list")]
    pub addself: Vec<String>,
    #[serde(default, deserialize_with = "de::string_list")]
    pub removeself: Vec<String>,
    /// Opaque autopromote condition; `None` leaves any existing rule alone
    #[serde(default)]
    pub autopromote: Option<Value>,
}

/// Contents of `<dbname>.json`
///
/// Every section is optional; documents written by older rebuild jobs
/// simply omit what they do not know about.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WikiCacheDocument {
    #[serde(default)]
    pub core: Option<CoreSection>,
    #[serde(default, deserialize_with = "de::optional_string")]
    pub url: Option<String>,
    #[serde(default)]
    pub states: Option<StatesSection>,
    #[serde(default, deserialize_with = "de::keyed_map")]
    pub settings: Option<BTreeMap<String, Value>>,
    #[serde(default, deserialize_with = "de::string_list")]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub namespaces: Option<Namespaces>,
    #[serde(default, deserialize_with = "de::keyed_map")]
    pub permissions: Option<BTreeMap<String, GroupPermissions>>,
}

impl WikiCacheDocument {
    /// Decode a document from raw bytes
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

/// Health of one wiki's cache document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    Present,
    /// No document yet; the wiki runs on baseline settings
    Missing,
    /// Document exists but needs rebuilding
    Corrupt(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheAuditEntry {
    pub dbname: String,
    pub status: CacheStatus,
}

/// Handle on a cache directory
#[derive(Debug, Clone)]
pub struct CacheDirectory {
    root: PathBuf,
}

impl CacheDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    pub fn deleted_path(&self) -> PathBuf {
        self.root.join(DELETED_FILE)
    }

    /// Path of `<dbname>.json`
    ///
    /// Rejects dbnames that would escape the directory or name a hidden file.
    pub fn wiki_path(&self, dbname: &str) -> Result<PathBuf> {
        if dbname.is_empty() || dbname.starts_with('.') || dbname.contains(['/', '\\']) {
            return Err(TenancyError::InvalidDbname(dbname.to_string()));
        }
        Ok(self.root.join(format!("{}.json", dbname)))
    }

    /// Read `databases.json`; a missing index is fatal
    pub fn read_index(&self) -> Result<DatabaseIndex> {
        let path = self.index_path();
        match read_document(&path)? {
            Some(index) => Ok(index),
            None => Err(TenancyError::IndexMissing { path }),
        }
    }

    /// Read `deleted.json`
    pub fn read_deleted(&self) -> Result<DatabaseIndex> {
        let path = self.deleted_path();
        match read_document(&path)? {
            Some(index) => Ok(index),
            None => Err(TenancyError::DeletedIndexMissing { path }),
        }
    }

    /// Read `<dbname>.json`; `Ok(None)` when the wiki has no document
    pub fn read_wiki(&self, dbname: &str) -> Result<Option<WikiCacheDocument>> {
        let path = self.wiki_path(dbname)?;
        read_document(&path)
    }

    /// Classify every indexed wiki's document
    pub fn audit(&self) -> Result<Vec<CacheAuditEntry>> {
        let index = self.read_index()?;
        let mut entries = Vec::with_capacity(index.databases.len());

        for dbname in index.databases {
            let status = match self.read_wiki(&dbname) {
                Ok(Some(_)) => CacheStatus::Present,
                Ok(None) => CacheStatus::Missing,
                Err(e @ TenancyError::CorruptCache { .. }) | Err(e @ TenancyError::InvalidDbname(_)) => {
                    warn!(dbname = %dbname, error = %e, "Cache document needs rebuilding");
                    CacheStatus::Corrupt(e.to_string())
                }
                Err(e) => return Err(e),
            };
            entries.push(CacheAuditEntry { dbname, status });
        }

        Ok(entries)
    }
}

/// Read and fully decode one JSON document; `Ok(None)` when absent
fn read_document<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "Cache document not present");
            return Ok(None);
        }
        Err(source) => {
            return Err(TenancyError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| TenancyError::CorruptCache {
            path: path.to_path_buf(),
            source,
        })
}
