use std::collections::BTreeSet;

use crate::model::installer::SetupSnapshot;
use crate::model::plugin::{PluginSlug, SiteId};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Observed {
    site: Option<SiteId>,
    installed: Option<BTreeSet<PluginSlug>>,
    catalog: BTreeSet<PluginSlug>,
}

impl Observed {
    fn from_snapshot(snapshot: &SetupSnapshot<'_>) -> Self {
        Self {
            site: snapshot.site,
            installed: snapshot
                .installed
                .map(|list| list.iter().map(|plugin| plugin.slug.clone()).collect()),
            catalog: snapshot.catalog.slugs().cloned().collect(),
        }
    }
}

/// Decides when the installer needs another look at its inputs.
///
/// Fires whenever the site, the set of installed slugs, or the set of catalog
/// slugs differs from the last observation. Content changes count even when
/// the installed list keeps its length.
#[derive(Debug, Default)]
pub struct Reevaluation {
    last: Option<Observed>,
    forced: bool,
}

impl Reevaluation {
    pub fn observe(&mut self, snapshot: &SetupSnapshot<'_>) -> bool {
        let observed = Observed::from_snapshot(snapshot);
        let changed = self.last.as_ref() != Some(&observed);
        self.last = Some(observed);

        let fire = changed || self.forced;
        self.forced = false;
        fire
    }

    /// Make the next [`Reevaluation::observe`] fire even if nothing changed.
    pub fn force(&mut self) {
        self.forced = true;
    }
}
