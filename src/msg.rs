use crossterm::event::KeyEvent;

use crate::model::plugin::{CatalogEntry, InstalledPlugin, PluginSlug, SiteId};

/// All possible messages that drive state transitions.
#[derive(Debug)]
pub enum Msg {
    // -- Input events (raw)
    Key(KeyEvent),
    Resize(u16, u16),

    // -- Service replies
    SiteResolved(SiteId),
    InstalledPluginsLoaded(SiteId, Vec<InstalledPlugin>),
    CatalogEntryFetched(CatalogEntry),
    CatalogEntryMissing(PluginSlug),
    InstallFailed {
        site: SiteId,
        slug: PluginSlug,
        reason: String,
    },
    SetupMarkedFinished(SiteId),

    // -- System
    Tick,
    Quit,
}
