//! Tenant Record
//!
//! A point-in-time snapshot of one wiki's identity and lifecycle flags,
//! built from a single row of the backing store.

use crate::de;
use crate::error::{Result, TenancyError};
use crate::value::SettingValue;
use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Category assigned to wikis created without one
pub const DEFAULT_CATEGORY: &str = "uncategorised";

/// Sentinel used by caches and settings for [`InactiveState::Exempt`]
pub const EXEMPT: &str = "exempt";

/// Storage timestamp layout (`YYYYMMDDHHMMSS`, UTC)
const STORAGE_TIMESTAMP: &str = "%Y%m%d%H%M%S";

/// Inactivity state of a wiki
///
/// `Exempt` wikis are excluded from the automated inactivity policy and are
/// neither active nor inactive for its purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InactiveState {
    #[default]
    Off,
    On,
    Exempt,
}

impl InactiveState {
    /// Combine the stored inactive and exempt flags; exemption wins
    pub fn from_flags(inactive: bool, exempt: bool) -> Self {
        match (inactive, exempt) {
            (_, true) => InactiveState::Exempt,
            (true, false) => InactiveState::On,
            (false, false) => InactiveState::Off,
        }
    }

    pub fn is_inactive(&self) -> bool {
        matches!(self, InactiveState::On)
    }

    pub fn is_exempt(&self) -> bool {
        matches!(self, InactiveState::Exempt)
    }

    /// `false`, `true` or the string `"exempt"`
    pub fn to_setting_value(self) -> SettingValue {
        match self {
            InactiveState::Off => SettingValue::Bool(false),
            InactiveState::On => SettingValue::Bool(true),
            InactiveState::Exempt => SettingValue::String(EXEMPT.to_string()),
        }
    }

    pub fn from_setting_value(value: &SettingValue) -> Option<Self> {
        match value {
            SettingValue::Bool(true) => Some(InactiveState::On),
            SettingValue::Bool(false) => Some(InactiveState::Off),
            SettingValue::String(s) if s == EXEMPT => Some(InactiveState::Exempt),
            _ => None,
        }
    }
}

impl fmt::Display for InactiveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InactiveState::Off => write!(f, "off"),
            InactiveState::On => write!(f, "on"),
            InactiveState::Exempt => write!(f, "{}", EXEMPT),
        }
    }
}

impl Serialize for InactiveState {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            InactiveState::Off => serializer.serialize_bool(false),
            InactiveState::On => serializer.serialize_bool(true),
            InactiveState::Exempt => serializer.serialize_str(EXEMPT),
        }
    }
}

impl<'de> Deserialize<'de> for InactiveState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if value.as_str() == Some(EXEMPT) {
            return Ok(InactiveState::Exempt);
        }

        match de::truthy(&value) {
            Some(true) => Ok(InactiveState::On),
            Some(false) => Ok(InactiveState::Off),
            None => Err(serde::de::Error::custom(format!(
                "expected a boolean flag or \"exempt\", found {}",
                value
            ))),
        }
    }
}

/// One row of the wiki table in the backing store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TenantRow {
    pub wiki_dbname: String,
    #[serde(default)]
    pub wiki_sitename: String,
    #[serde(default)]
    pub wiki_language: String,
    #[serde(default, deserialize_with = "de::flag")]
    pub wiki_private: bool,
    pub wiki_creation: String,
    #[serde(default, deserialize_with = "de::flag")]
    pub wiki_closed: bool,
    #[serde(default)]
    pub wiki_closed_timestamp: Option<String>,
    #[serde(default, deserialize_with = "de::flag")]
    pub wiki_inactive: bool,
    #[serde(default)]
    pub wiki_inactive_timestamp: Option<String>,
    #[serde(default, deserialize_with = "de::flag")]
    pub wiki_inactive_exempt: bool,
    #[serde(default, deserialize_with = "de::flag")]
    pub wiki_deleted: bool,
    #[serde(default)]
    pub wiki_deleted_timestamp: Option<String>,
    #[serde(default, deserialize_with = "de::flag")]
    pub wiki_locked: bool,
    #[serde(default)]
    pub wiki_settings: Option<String>,
    #[serde(default)]
    pub wiki_category: Option<String>,
    #[serde(default)]
    pub wiki_extensions: Option<String>,
}

impl TenantRow {
    /// Minimal row for a freshly created wiki
    pub fn new(dbname: impl Into<String>, creation: impl Into<String>) -> Self {
        Self {
            wiki_dbname: dbname.into(),
            wiki_creation: creation.into(),
            ..Default::default()
        }
    }
}

/// Immutable tenant snapshot
///
/// Obtained only through `TenantRecord::try_from(row)` or a
/// [`TenantStore`](crate::TenantStore); there is no mutation API.
#[derive(Debug, Clone)]
pub struct TenantRecord {
    dbname: String,
    sitename: String,
    language: String,
    private: bool,
    closed: bool,
    closed_date: Option<DateTime<Utc>>,
    locked: bool,
    deleted: bool,
    deletion_date: Option<DateTime<Utc>>,
    inactive: InactiveState,
    inactive_date: Option<DateTime<Utc>>,
    creation_date: DateTime<Utc>,
    category: String,
    extensions: BTreeSet<String>,
    settings_blob: Option<String>,
    settings: OnceCell<BTreeMap<String, Value>>,
}

impl TryFrom<TenantRow> for TenantRecord {
    type Error = TenancyError;

    fn try_from(row: TenantRow) -> Result<Self> {
        let dbname = row.wiki_dbname;
        if dbname.is_empty() {
            return Err(TenancyError::InvalidRecord {
                dbname,
                reason: "empty dbname".to_string(),
            });
        }

        let creation_date = parse_timestamp(&row.wiki_creation)
            .map_err(|reason| invalid(&dbname, "wiki_creation", reason))?
            .ok_or_else(|| invalid(&dbname, "wiki_creation", "missing".to_string()))?;
        let closed_date = optional_timestamp(&dbname, "wiki_closed_timestamp", &row.wiki_closed_timestamp)?;
        let inactive_date =
            optional_timestamp(&dbname, "wiki_inactive_timestamp", &row.wiki_inactive_timestamp)?;
        let deletion_date =
            optional_timestamp(&dbname, "wiki_deleted_timestamp", &row.wiki_deleted_timestamp)?;

        let category = row
            .wiki_category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        let extensions = row
            .wiki_extensions
            .as_deref()
            .map(parse_extension_list)
            .unwrap_or_default();

        Ok(Self {
            dbname,
            sitename: row.wiki_sitename,
            language: row.wiki_language,
            private: row.wiki_private,
            closed: row.wiki_closed,
            closed_date,
            locked: row.wiki_locked,
            deleted: row.wiki_deleted,
            deletion_date,
            inactive: InactiveState::from_flags(row.wiki_inactive, row.wiki_inactive_exempt),
            inactive_date,
            creation_date,
            category,
            extensions,
            settings_blob: row.wiki_settings,
            settings: OnceCell::new(),
        })
    }
}

impl TenantRecord {
    pub fn dbname(&self) -> &str {
        &self.dbname
    }

    pub fn sitename(&self) -> &str {
        &self.sitename
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn is_private(&self) -> bool {
        self.private
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn closed_date(&self) -> Option<DateTime<Utc>> {
        self.closed_date
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn deletion_date(&self) -> Option<DateTime<Utc>> {
        self.deletion_date
    }

    pub fn inactive(&self) -> InactiveState {
        self.inactive
    }

    /// True only for [`InactiveState::On`]
    pub fn is_inactive(&self) -> bool {
        self.inactive.is_inactive()
    }

    pub fn is_inactive_exempt(&self) -> bool {
        self.inactive.is_exempt()
    }

    pub fn inactive_date(&self) -> Option<DateTime<Utc>> {
        self.inactive_date
    }

    pub fn creation_date(&self) -> DateTime<Utc> {
        self.creation_date
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn extensions(&self) -> &BTreeSet<String> {
        &self.extensions
    }

    /// Exact-token membership test
    ///
    /// # Examples
    ///
    /// ```
    /// use wikifarm_tenancy::{TenantRecord, TenantRow};
    ///
    /// let mut row = TenantRow::new("alphawiki", "20200101000000");
    /// row.wiki_extensions = Some("FooBar,VisualEditor".to_string());
    /// let record = TenantRecord::try_from(row).unwrap();
    ///
    /// assert!(record.has_extension("FooBar"));
    /// assert!(!record.has_extension("Foo"));
    /// ```
    pub fn has_extension(&self, name: &str) -> bool {
        self.extensions.contains(name)
    }

    /// Free-form settings, decoded on first access and cached
    pub fn settings(&self) -> Result<&BTreeMap<String, Value>> {
        self.settings.get_or_try_init(|| {
            decode_settings(self.settings_blob.as_deref())
                .map_err(|reason| invalid(&self.dbname, "wiki_settings", reason))
        })
    }

    /// Look up one free-form setting; `Ok(None)` when it is not set
    pub fn settings_value(&self, key: &str) -> Result<Option<&Value>> {
        Ok(self.settings()?.get(key))
    }
}

fn invalid(dbname: &str, field: &str, reason: String) -> TenancyError {
    TenancyError::InvalidRecord {
        dbname: dbname.to_string(),
        reason: format!("{}: {}", field, reason),
    }
}

fn optional_timestamp(
    dbname: &str,
    field: &str,
    raw: &Option<String>,
) -> Result<Option<DateTime<Utc>>> {
    match raw {
        Some(raw) => parse_timestamp(raw).map_err(|reason| invalid(dbname, field, reason)),
        None => Ok(None),
    }
}

/// Parse a storage timestamp; empty means "not set"
fn parse_timestamp(raw: &str) -> std::result::Result<Option<DateTime<Utc>>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, STORAGE_TIMESTAMP) {
        return Ok(Some(naive.and_utc()));
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| Some(dt.with_timezone(&Utc)))
        .map_err(|_| format!("unrecognised timestamp {:?}", raw))
}

fn parse_extension_list(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn decode_settings(blob: Option<&str>) -> std::result::Result<BTreeMap<String, Value>, String> {
    let blob = match blob.map(str::trim) {
        None | Some("") => return Ok(BTreeMap::new()),
        Some(blob) => blob,
    };

    match serde_json::from_str::<Value>(blob).map_err(|e| e.to_string())? {
        Value::Null => Ok(BTreeMap::new()),
        Value::Array(items) if items.is_empty() => Ok(BTreeMap::new()),
        Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(format!("expected an object, found {}", other)),
    }
}
