//! Configuration Materializer
//!
//! Merges one wiki's cache document into the settings context. Every write
//! is keyed by setting name, then by the wiki's dbname, so materializing a
//! wiki never touches another wiki's entries.
//!
//! List appends are set-unions: loading the same document twice yields the
//! same context.

use crate::cache::{CacheDirectory, GroupPermissions, NamespaceDefinition, WikiCacheDocument};
use crate::error::Result;
use crate::settings::{keys, SiteConfiguration};
use crate::value::{push_unique, SettingValue};
use tracing::debug;

/// Result of loading a wiki's cache document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No document; the context was left untouched
    Missing,
    Loaded,
}

/// Loads cache documents into a [`SiteConfiguration`]
#[derive(Debug, Clone, Copy)]
pub struct Materializer<'a> {
    cache: &'a CacheDirectory,
}

impl<'a> Materializer<'a> {
    pub fn new(cache: &'a CacheDirectory) -> Self {
        Self { cache }
    }

    /// Load `<dbname>.json` and merge it
    ///
    /// A corrupt document is reported before anything is written.
    pub fn load(&self, dbname: &str, config: &mut SiteConfiguration) -> Result<LoadOutcome> {
        match self.cache.read_wiki(dbname)? {
            Some(document) => {
                apply(&document, dbname, config);
                debug!(dbname = %dbname, settings = config.len(), "Materialized cache document");
                Ok(LoadOutcome::Loaded)
            }
            None => {
                debug!(dbname = %dbname, "No cache document, keeping baseline settings");
                Ok(LoadOutcome::Missing)
            }
        }
    }
}

/// Merge an already decoded document for `dbname`
pub fn apply(document: &WikiCacheDocument, dbname: &str, config: &mut SiteConfiguration) {
    if let Some(core) = &document.core {
        if let Some(sitename) = &core.sitename {
            config.set(keys::SITENAME, dbname, sitename.as_str());
        }
        if let Some(language) = &core.language_code {
            config.set(keys::LANGUAGE_CODE, dbname, language.as_str());
        }
    }

    if let Some(url) = &document.url {
        config.set(keys::SERVER, dbname, url.as_str());
    }

    if let Some(states) = &document.states {
        config.set(keys::PRIVATE, dbname, states.private);
        config.set(keys::CLOSED, dbname, states.closed);
        config.set(keys::INACTIVE, dbname, states.inactive.to_setting_value());
    }

    for (setting, value) in document.settings.iter().flatten() {
        config.set(setting, dbname, SettingValue::from(value.clone()));
    }

    for extension in &document.extensions {
        config.set(extension, dbname, true);
    }

    for namespace in document.namespaces.iter().flat_map(|ns| ns.iter()) {
        apply_namespace(namespace, dbname, config);
    }

    for (group, permissions) in document.permissions.iter().flatten() {
        apply_group(group, permissions, dbname, config);
    }
}

fn apply_namespace(namespace: &NamespaceDefinition, dbname: &str, config: &mut SiteConfiguration) {
    let id = namespace.id.to_string();

    config
        .map_mut(keys::EXTRA_NAMESPACES, dbname)
        .insert(id.clone(), SettingValue::from(namespace.name.as_str()));
    config
        .map_mut(keys::NAMESPACES_SEARCHED_DEFAULT, dbname)
        .insert(id.clone(), SettingValue::Bool(true));
    config
        .map_mut(keys::NAMESPACES_WITH_SUBPAGES, dbname)
        .insert(id.clone(), SettingValue::Bool(true));
    push_unique(
        config.list_mut(keys::CONTENT_NAMESPACES, dbname),
        SettingValue::Int(namespace.id),
    );

    if let Some(model) = &namespace.content_model {
        config
            .map_mut(keys::NAMESPACE_CONTENT_MODELS, dbname)
            .insert(id.clone(), SettingValue::from(model.as_str()));
    }

    if let Some(right) = &namespace.protection {
        config
            .map_mut(keys::NAMESPACE_PROTECTION, dbname)
            .insert(id, SettingValue::from(vec![right.as_str()]));
    }

    for alias in &namespace.aliases {
        config
            .map_mut(keys::NAMESPACE_ALIASES, dbname)
            .insert(alias.clone(), SettingValue::Int(namespace.id));
    }
}

fn apply_group(group: &str, permissions: &GroupPermissions, dbname: &str, config: &mut SiteConfiguration) {
    if !permissions.permissions.is_empty() {
        let rights = config
            .map_mut(keys::GROUP_PERMISSIONS, dbname)
            .entry(group.to_string())
            .or_insert(SettingValue::Null)
            .ensure_map();
        for right in &permissions.permissions {
            rights.insert(right.clone(), SettingValue::Bool(true));
        }
    }

    append_group_list(config, keys::ADD_GROUPS, dbname, group, &permissions.addgroups);
    append_group_list(config, keys::REMOVE_GROUPS, dbname, group, &permissions.removegroups);
    append_group_list(config, keys::GROUPS_ADD_TO_SELF, dbname, group, &permissions.addself);
    append_group_list(config, keys::GROUPS_REMOVE_FROM_SELF, dbname, group, &permissions.removeself);

    if let Some(rule) = &permissions.autopromote {
        config
            .map_mut(keys::AUTOPROMOTE, dbname)
            .insert(group.to_string(), SettingValue::from(rule.clone()));
    }
}

fn append_group_list(
    config: &mut SiteConfiguration,
    setting: &str,
    dbname: &str,
    group: &str,
    names: &[String],
) {
    if names.is_empty() {
        return;
    }

    let list = config
        .map_mut(setting, dbname)
        .entry(group.to_string())
        .or_insert(SettingValue::Null)
        .ensure_list();
    for name in names {
        push_unique(list, SettingValue::from(name.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenant::InactiveState;
    use serde_json::json;

    const DOCUMENT: &str = r#"{
        "core": {"wgSitename": "Example Wiki", "wgLanguageCode": "en"},
        "url": "https://wiki.example.org",
        "states": {"private": true, "closed": false, "inactive": "exempt"},
        "settings": {"wgLogo": "/logo.png", "wgRightsText": null},
        "extensions": ["VisualEditor", "CheckUser"],
        "namespaces": {
            "Project": {"id": 3000, "contentmodel": "wikitext", "aliases": ["PJ"], "protection": "editinterface"},
            "Project talk": {"id": "3001", "contentmodel": "wikitext", "aliases": [], "protection": false}
        },
        "permissions": {
            "sysop": {
                "permissions": ["delete", "block"],
                "addgroups": ["bot"],
                "removegroups": ["bot"],
                "addself": [],
                "removeself": [],
                "autopromote": null
            },
            "autoconfirmed": {
                "permissions": [],
                "addgroups": [],
                "removegroups": [],
                "addself": [],
                "removeself": [],
                "autopromote": ["&", [1, 10], [2, 345600]]
            }
        }
    }"#;

    fn document() -> WikiCacheDocument {
        WikiCacheDocument::from_slice(DOCUMENT.as_bytes()).unwrap()
    }

    fn value_of(config: &SiteConfiguration, setting: &str) -> serde_json::Value {
        config.get(setting, "examplewiki").unwrap().to_json()
    }

    #[test]
    fn test_core_states_and_extensions() {
        let mut config = SiteConfiguration::new();
        apply(&document(), "examplewiki", &mut config);

        assert_eq!(config.get_string(keys::SITENAME, "examplewiki"), Some("Example Wiki"));
        assert_eq!(config.get_string(keys::LANGUAGE_CODE, "examplewiki"), Some("en"));
        assert_eq!(config.get_string(keys::SERVER, "examplewiki"), Some("https://wiki.example.org"));
        assert_eq!(config.get_bool(keys::PRIVATE, "examplewiki"), Some(true));
        assert_eq!(config.get_bool(keys::CLOSED, "examplewiki"), Some(false));
        assert_eq!(config.inactive_state("examplewiki"), Some(InactiveState::Exempt));
        assert_eq!(config.get_bool("VisualEditor", "examplewiki"), Some(true));
        assert_eq!(config.get_string("wgLogo", "examplewiki"), Some("/logo.png"));
        assert!(config.get("wgRightsText", "examplewiki").unwrap().is_null());
    }

    #[test]
    fn test_namespaces() {
        let mut config = SiteConfiguration::new();
        apply(&document(), "examplewiki", &mut config);

        assert_eq!(
            value_of(&config, keys::EXTRA_NAMESPACES),
            json!({"3000": "Project", "3001": "Project talk"})
        );
        assert_eq!(value_of(&config, keys::CONTENT_NAMESPACES), json!([3000, 3001]));
        assert_eq!(value_of(&config, keys::NAMESPACES_WITH_SUBPAGES)["3001"], json!(true));
        assert_eq!(value_of(&config, keys::NAMESPACE_CONTENT_MODELS)["3000"], json!("wikitext"));
        assert_eq!(
            value_of(&config, keys::NAMESPACE_PROTECTION),
            json!({"3000": ["editinterface"]})
        );
        assert_eq!(value_of(&config, keys::NAMESPACE_ALIASES), json!({"PJ": 3000}));
    }

    #[test]
    fn test_permissions() {
        let mut config = SiteConfiguration::new();
        apply(&document(), "examplewiki", &mut config);

        assert_eq!(
            value_of(&config, keys::GROUP_PERMISSIONS),
            json!({"sysop": {"block": true, "delete": true}})
        );
        assert_eq!(value_of(&config, keys::ADD_GROUPS), json!({"sysop": ["bot"]}));
        assert_eq!(value_of(&config, keys::REMOVE_GROUPS), json!({"sysop": ["bot"]}));
        assert!(config.get(keys::GROUPS_ADD_TO_SELF, "examplewiki").is_none());
        assert_eq!(
            value_of(&config, keys::AUTOPROMOTE),
            json!({"autoconfirmed": ["&", [1, 10], [2, 345600]]})
        );
    }

    #[test]
    fn test_apply_twice_is_idempotent() {
        let mut once = SiteConfiguration::new();
        apply(&document(), "examplewiki", &mut once);

        let mut twice = once.clone();
        apply(&document(), "examplewiki", &mut twice);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_autopromote_replaced_not_merged() {
        let mut config = SiteConfiguration::new();
        apply(&document(), "examplewiki", &mut config);

        let replacement = WikiCacheDocument::from_slice(
            br#"{"permissions": {"autoconfirmed": {"autopromote": ["&", [1, 5]]}}}"#,
        )
        .unwrap();
        apply(&replacement, "examplewiki", &mut config);

        assert_eq!(
            value_of(&config, keys::AUTOPROMOTE),
            json!({"autoconfirmed": ["&", [1, 5]]})
        );
    }

    #[test]
    fn test_settings_section_entries_survive_later_sections() {
        let document = WikiCacheDocument::from_slice(
            br#"{
                "settings": {
                    "wgNamespacesWithSubpages": [true],
                    "wgExtraNamespaces": ["Main"],
                    "wgContentNamespaces": {"0": 0},
                    "wgAddGroups": {"sysop": {"0": "interface-admin"}}
                },
                "namespaces": {"Portal": {"id": 3000, "contentmodel": "wikitext", "aliases": [], "protection": false}},
                "permissions": {"sysop": {"addgroups": ["bot"]}}
            }"#,
        )
        .unwrap();

        let mut config = SiteConfiguration::new();
        apply(&document, "examplewiki", &mut config);

        assert_eq!(
            value_of(&config, keys::NAMESPACES_WITH_SUBPAGES),
            json!({"0": true, "3000": true})
        );
        assert_eq!(
            value_of(&config, keys::EXTRA_NAMESPACES),
            json!({"0": "Main", "3000": "Portal"})
        );
        assert_eq!(value_of(&config, keys::CONTENT_NAMESPACES), json!([0, 3000]));
        assert_eq!(
            value_of(&config, keys::ADD_GROUPS),
            json!({"sysop": ["interface-admin", "bot"]})
        );
    }

    #[test]
    fn test_other_wikis_untouched() {
        let mut config = SiteConfiguration::new();
        config.set(keys::SITENAME, "alphawiki", "Alpha");
        apply(&document(), "examplewiki", &mut config);

        assert_eq!(config.get_string(keys::SITENAME, "alphawiki"), Some("Alpha"));
        assert_eq!(config.get_for_wiki(keys::PRIVATE, "alphawiki"), None);
    }

    #[test]
    fn test_empty_document_writes_nothing() {
        let mut config = SiteConfiguration::new();
        apply(&WikiCacheDocument::from_slice(b"{}").unwrap(), "examplewiki", &mut config);
        assert!(config.is_empty());
    }

    #[test]
    fn test_load_missing_and_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("brokenwiki.json"), "{\"core\": 5}").unwrap();
        let cache = CacheDirectory::new(dir.path());
        let materializer = Materializer::new(&cache);

        let mut config = SiteConfiguration::new();
        assert_eq!(
            materializer.load("examplewiki", &mut config).unwrap(),
            LoadOutcome::Missing
        );
        assert!(materializer.load("brokenwiki", &mut config).unwrap_err().is_corrupt_cache());
        assert!(config.is_empty());
    }
}
