use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

/// Stable identifier of an installable plugin, e.g. `woocommerce`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct PluginSlug(pub String);

impl PluginSlug {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PluginSlug {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// The site whose required plugins are being installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SiteId(pub u64);

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "site#{}", self.0)
    }
}

/// A plugin already present on a site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPlugin {
    pub slug: PluginSlug,
    pub name: String,
    pub version: String,
    pub active: bool,
}

/// Directory metadata needed to install a plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub slug: PluginSlug,
    pub name: String,
    pub version: String,
    pub download_url: String,
}

/// Catalog entries keyed by slug, filled in as fetches complete.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<PluginSlug, CatalogEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: CatalogEntry) {
        self.entries.insert(entry.slug.clone(), entry);
    }

    pub fn get(&self, slug: &PluginSlug) -> Option<&CatalogEntry> {
        self.entries.get(slug)
    }

    pub fn contains(&self, slug: &PluginSlug) -> bool {
        self.entries.contains_key(slug)
    }

    pub fn slugs(&self) -> impl Iterator<Item = &PluginSlug> {
        self.entries.keys()
    }
}

pub fn is_installed(installed: &[InstalledPlugin], slug: &PluginSlug) -> bool {
    installed.iter().any(|plugin| &plugin.slug == slug)
}
