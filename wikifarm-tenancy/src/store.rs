//! Tenant Store
//!
//! Lookup of [`TenantRecord`] snapshots by dbname. The farm's relational
//! store lives outside this crate; embedders implement [`TenantStore`] on
//! top of it.

use crate::error::Result;
use crate::tenant::{TenantRecord, TenantRow};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Tenant store trait (implement with your database)
pub trait TenantStore: Send + Sync {
    /// Find a tenant by dbname, returning a fresh snapshot
    fn find_by_dbname(&self, dbname: &str) -> Result<Option<TenantRecord>>;
}

/// In-memory tenant store
///
/// Useful for tests, tooling and embedders that preload rows.
#[derive(Debug, Default)]
pub struct InMemoryTenantStore {
    rows: RwLock<HashMap<String, TenantRow>>,
}

impl InMemoryTenantStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store preloaded with `rows`
    pub fn with_rows(rows: impl IntoIterator<Item = TenantRow>) -> Self {
        let store = Self::new();
        for row in rows {
            store.insert(row);
        }
        store
    }

    /// Insert or replace a row, returning the previous one
    pub fn insert(&self, row: TenantRow) -> Option<TenantRow> {
        self.rows.write().insert(row.wiki_dbname.clone(), row)
    }

    pub fn remove(&self, dbname: &str) -> Option<TenantRow> {
        self.rows.write().remove(dbname)
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// Stored dbnames, sorted
    pub fn dbnames(&self) -> Vec<String> {
        let mut names: Vec<String> = self.rows.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl TenantStore for InMemoryTenantStore {
    fn find_by_dbname(&self, dbname: &str) -> Result<Option<TenantRecord>> {
        let row = self.rows.read().get(dbname).cloned();
        row.map(TenantRecord::try_from).transpose()
    }
}
