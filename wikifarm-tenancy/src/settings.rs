//! Site Configuration
//!
//! The resolved settings context for one execution: a two-level map keyed
//! first by setting name, then by wiki dbname (or [`DEFAULT_WIKI`]).
//!
//! A `SiteConfiguration` is populated during bootstrap only; mutation is
//! crate-private. Once bootstrap returns, the context is frozen behind an
//! [`Arc`](std::sync::Arc) in [`ResolvedWiki`](crate::ResolvedWiki).

use crate::tenant::InactiveState;
use crate::value::SettingValue;
use serde_json::Value;
use std::collections::BTreeMap;

/// Wiki key holding the fallback value of a setting
pub const DEFAULT_WIKI: &str = "default";

/// Setting names written by bootstrap and materialization
pub mod keys {
    pub const DBNAME: &str = "wgDBname";
    pub const SERVER: &str = "wgServer";
    pub const LOCAL_DATABASES: &str = "wgLocalDatabases";
    pub const SITENAME: &str = "wgSitename";
    pub const LANGUAGE_CODE: &str = "wgLanguageCode";

    pub const PRIVATE: &str = "cwPrivate";
    pub const CLOSED: &str = "cwClosed";
    pub const INACTIVE: &str = "cwInactive";

    pub const EXTRA_NAMESPACES: &str = "wgExtraNamespaces";
    pub const NAMESPACES_SEARCHED_DEFAULT: &str = "wgNamespacesToBeSearchedDefault";
    pub const NAMESPACES_WITH_SUBPAGES: &str = "wgNamespacesWithSubpages";
    pub const CONTENT_NAMESPACES: &str = "wgContentNamespaces";
    pub const NAMESPACE_CONTENT_MODELS: &str = "wgNamespaceContentModels";
    pub const NAMESPACE_PROTECTION: &str = "wgNamespaceProtection";
    pub const NAMESPACE_ALIASES: &str = "wgNamespaceAliases";

    pub const GROUP_PERMISSIONS: &str = "wgGroupPermissions";
    pub const ADD_GROUPS: &str = "wgAddGroups";
    pub const REMOVE_GROUPS: &str = "wgRemoveGroups";
    pub const GROUPS_ADD_TO_SELF: &str = "wgGroupsAddToSelf";
    pub const GROUPS_REMOVE_FROM_SELF: &str = "wgGroupsRemoveFromSelf";
    pub const AUTOPROMOTE: &str = "wgAutopromote";
}

/// Settings context keyed by setting name, then wiki
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteConfiguration {
    settings: BTreeMap<String, BTreeMap<String, SettingValue>>,
    wikis: Vec<String>,
}

impl SiteConfiguration {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context seeded with baseline settings
    pub fn with_defaults(defaults: &BTreeMap<String, BTreeMap<String, Value>>) -> Self {
        let settings = defaults
            .iter()
            .map(|(setting, per_wiki)| {
                let per_wiki = per_wiki
                    .iter()
                    .map(|(wiki, value)| (wiki.clone(), SettingValue::from(value.clone())))
                    .collect();
                (setting.clone(), per_wiki)
            })
            .collect();

        Self {
            settings,
            wikis: Vec::new(),
        }
    }

    /// Value of `setting` for `wiki`, falling back to the `default` entry
    pub fn get(&self, setting: &str, wiki: &str) -> Option<&SettingValue> {
        let per_wiki = self.settings.get(setting)?;
        per_wiki.get(wiki).or_else(|| per_wiki.get(DEFAULT_WIKI))
    }

    /// Value of `setting` set specifically for `wiki`, without fallback
    pub fn get_for_wiki(&self, setting: &str, wiki: &str) -> Option<&SettingValue> {
        self.settings.get(setting)?.get(wiki)
    }

    pub fn get_bool(&self, setting: &str, wiki: &str) -> Option<bool> {
        self.get(setting, wiki)?.as_bool()
    }

    pub fn get_string(&self, setting: &str, wiki: &str) -> Option<&str> {
        self.get(setting, wiki)?.as_str()
    }

    /// Decoded `cwInactive` flag
    pub fn inactive_state(&self, wiki: &str) -> Option<InactiveState> {
        InactiveState::from_setting_value(self.get(keys::INACTIVE, wiki)?)
    }

    /// Tenants visible to this execution context
    pub fn local_databases(&self) -> &[String] {
        &self.wikis
    }

    /// Whether any wiki (or the default) has a value for `setting`
    pub fn has(&self, setting: &str) -> bool {
        self.settings.contains_key(setting)
    }

    /// Setting names in sorted order
    pub fn setting_names(&self) -> impl Iterator<Item = &str> {
        self.settings.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.settings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    /// Every setting that applies to `wiki`, with default fallback
    pub fn settings_for(&self, wiki: &str) -> BTreeMap<&str, &SettingValue> {
        self.settings
            .keys()
            .filter_map(|setting| Some((setting.as_str(), self.get(setting, wiki)?)))
            .collect()
    }

    /// Render the whole context as JSON for diagnostics
    pub fn to_json(&self) -> Value {
        let settings = self
            .settings
            .iter()
            .map(|(setting, per_wiki)| {
                let per_wiki = per_wiki
                    .iter()
                    .map(|(wiki, value)| (wiki.clone(), value.to_json()))
                    .collect();
                (setting.clone(), Value::Object(per_wiki))
            })
            .collect();

        Value::Object(settings)
    }

    pub(crate) fn set(&mut self, setting: &str, wiki: &str, value: impl Into<SettingValue>) {
        self.settings
            .entry(setting.to_string())
            .or_default()
            .insert(wiki.to_string(), value.into());
    }

    pub(crate) fn map_mut(&mut self, setting: &str, wiki: &str) -> &mut BTreeMap<String, SettingValue> {
        self.slot(setting, wiki).ensure_map()
    }

    pub(crate) fn list_mut(&mut self, setting: &str, wiki: &str) -> &mut Vec<SettingValue> {
        self.slot(setting, wiki).ensure_list()
    }

    /// Publish the working tenant list, also as `wgLocalDatabases[default]`
    pub(crate) fn set_local_databases(&mut self, wikis: Vec<String>) {
        self.set(keys::LOCAL_DATABASES, DEFAULT_WIKI, wikis.clone());
        self.wikis = wikis;
    }

    fn slot(&mut self, setting: &str, wiki: &str) -> &mut SettingValue {
        self.settings
            .entry(setting.to_string())
            .or_default()
            .entry(wiki.to_string())
            .or_insert(SettingValue::Null)
    }
}
