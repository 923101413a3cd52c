//! Tenancy errors

use std::path::PathBuf;

/// Errors raised while resolving a tenant or reading its cached configuration
#[derive(Debug, thiserror::Error)]
pub enum TenancyError {
    #[error("Databases index not found: {}", path.display())]
    IndexMissing { path: PathBuf },

    #[error("Deleted databases index not found: {}", path.display())]
    DeletedIndexMissing { path: PathBuf },

    #[error("Can not detect database name for host {host:?}")]
    Unresolvable { host: Option<String> },

    #[error("Wiki {dbname} is not a live wiki on this farm")]
    UnknownWiki { dbname: String },

    #[error("Invalid database name: {0:?}")]
    InvalidDbname(String),

    #[error("Corrupt cache document {}: {source}", path.display())]
    CorruptCache {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid tenant record {dbname}: {reason}")]
    InvalidRecord { dbname: String, reason: String },

    /// Backend failure reported by a [`TenantStore`](crate::TenantStore)
    /// implementation; the in-memory store never fails
    #[error("Storage error: {0}")]
    Storage(String),
}

impl TenancyError {
    /// True when a cache artifact exists but cannot be decoded and needs rebuilding
    pub fn is_corrupt_cache(&self) -> bool {
        matches!(self, TenancyError::CorruptCache { .. })
    }

    /// True when the execution context cannot continue without a tenant
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TenancyError::IndexMissing { .. }
                | TenancyError::DeletedIndexMissing { .. }
                | TenancyError::Unresolvable { .. }
                | TenancyError::UnknownWiki { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TenancyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_is_distinct_from_missing() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let corrupt = TenancyError::CorruptCache {
            path: PathBuf::from("/cache/examplewiki.json"),
            source,
        };
        let missing = TenancyError::IndexMissing {
            path: PathBuf::from("/cache/databases.json"),
        };

        assert!(corrupt.is_corrupt_cache());
        assert!(!corrupt.is_fatal());
        assert!(!missing.is_corrupt_cache());
        assert!(missing.is_fatal());
    }

    #[test]
    fn test_unresolvable_display() {
        let err = TenancyError::Unresolvable {
            host: Some("nowhere.invalid".to_string()),
        };
        assert!(err.to_string().contains("nowhere.invalid"));
    }
}
