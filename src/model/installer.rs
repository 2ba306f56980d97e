use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

use crate::model::plugin::{Catalog, CatalogEntry, InstalledPlugin, PluginSlug, SiteId, is_installed};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstallerError {
    #[error("no required plugins configured")]
    NoRequiredPlugins,
    #[error("required plugin listed twice: {0}")]
    DuplicatePlugin(PluginSlug),
    #[error("max_install_attempts must be at least 1")]
    NoInstallAttempts,
}

/// Plugins a site needs before setup can continue, in install order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredPlugins(Vec<PluginSlug>);

impl RequiredPlugins {
    pub fn new(slugs: Vec<PluginSlug>) -> Result<Self, InstallerError> {
        if slugs.is_empty() {
            return Err(InstallerError::NoRequiredPlugins);
        }

        for (idx, slug) in slugs.iter().enumerate() {
            if slugs[..idx].contains(slug) {
                return Err(InstallerError::DuplicatePlugin(slug.clone()));
            }
        }

        Ok(Self(slugs))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PluginSlug> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Progress gained per issued install request.
    fn step(&self) -> f64 {
        100.0 / self.0.len() as f64
    }
}

/// Read-only view of the externally owned inputs for one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct SetupSnapshot<'a> {
    pub site: Option<SiteId>,
    /// `None` until the site's plugin list has been loaded.
    pub installed: Option<&'a [InstalledPlugin]>,
    pub catalog: &'a Catalog,
}

/// What the caller should ask the service to do after an evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum InstallAction {
    None,
    Install { site: SiteId, entry: CatalogEntry },
    FinishSetup { site: SiteId },
    /// The next plugin used up its install attempts. Reported once.
    Stall { slug: PluginSlug, attempts: u32 },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstallerState {
    pub installing: Option<PluginSlug>,
    pub progress: f64,
    pub finished: bool,
    pub stalled: Option<PluginSlug>,
    attempts: HashMap<PluginSlug, u32>,
    /// Installed slugs seen when the pending install was requested.
    installed_at_request: BTreeSet<PluginSlug>,
}

impl InstallerState {
    /// Forget the pending install of `slug` so the next evaluation retries it.
    /// Returns false when `slug` was not the pending install.
    pub fn mark_failed(&mut self, slug: &PluginSlug) -> bool {
        if self.installing.as_ref() != Some(slug) {
            return false;
        }

        self.installing = None;
        self.installed_at_request.clear();
        true
    }

    /// Give a stalled plugin a fresh set of attempts.
    pub fn clear_stall(&mut self) -> Option<PluginSlug> {
        let slug = self.stalled.take()?;
        self.attempts.remove(&slug);
        Some(slug)
    }

    pub fn attempts(&self, slug: &PluginSlug) -> u32 {
        self.attempts.get(slug).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginStatus {
    Installed,
    Installing,
    Waiting,
    Stalled,
}

impl PluginStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PluginStatus::Installed => "installed",
            PluginStatus::Installing => "installing",
            PluginStatus::Waiting => "waiting",
            PluginStatus::Stalled => "stalled",
        }
    }
}

/// Installs required plugins one at a time, in declared order.
///
/// The installer never talks to a service itself. Each call to
/// [`RequiredPluginsInstaller::evaluate`] looks at a snapshot of the inputs,
/// returns at most one action and the next state. Install results come back
/// through later snapshots, so a failed install shows up as the plugin still
/// missing from a changed installed list and is requested again.
#[derive(Debug, Clone)]
pub struct RequiredPluginsInstaller {
    required: RequiredPlugins,
    max_attempts: u32,
}

impl RequiredPluginsInstaller {
    pub fn new(required: RequiredPlugins, max_attempts: u32) -> Result<Self, InstallerError> {
        if max_attempts == 0 {
            return Err(InstallerError::NoInstallAttempts);
        }

        Ok(Self {
            required,
            max_attempts,
        })
    }

    pub fn required(&self) -> &RequiredPlugins {
        &self.required
    }

    /// Required plugins the catalog has no entry for yet.
    pub fn missing_catalog_entries(&self, catalog: &Catalog) -> Vec<PluginSlug> {
        self.required
            .iter()
            .filter(|slug| !catalog.contains(slug))
            .cloned()
            .collect()
    }

    pub fn evaluate(
        &self,
        snapshot: &SetupSnapshot<'_>,
        state: &InstallerState,
    ) -> (InstallAction, InstallerState) {
        let mut next = state.clone();

        if next.finished {
            return (InstallAction::None, next);
        }

        let (Some(site), Some(installed)) = (snapshot.site, snapshot.installed) else {
            return (InstallAction::None, next);
        };

        if let Some(pending) = next.installing.as_ref() {
            if is_installed(installed, pending) {
                tracing::debug!("{site}: {pending} confirmed installed");
            } else if installed_slugs(installed) == next.installed_at_request {
                return (InstallAction::None, next);
            } else {
                tracing::debug!("{site}: {pending} still missing after the plugin list changed");
            }
            next.installing = None;
            next.installed_at_request.clear();
        }

        let Some(slug) = self
            .required
            .iter()
            .find(|slug| !is_installed(installed, slug))
        else {
            tracing::info!("{site}: all {} required plugins installed", self.required.len());
            next.finished = true;
            next.stalled = None;
            return (InstallAction::FinishSetup { site }, next);
        };

        if next.stalled.as_ref().is_some_and(|stalled| stalled != slug) {
            next.stalled = None;
        }

        // Later plugins wait until this one is in the catalog.
        let Some(entry) = snapshot.catalog.get(slug) else {
            return (InstallAction::None, next);
        };

        let attempts = next.attempts(slug);
        if attempts >= self.max_attempts {
            if next.stalled.as_ref() == Some(slug) {
                return (InstallAction::None, next);
            }

            tracing::warn!("{site}: giving up on {slug} after {attempts} attempts");
            next.stalled = Some(slug.clone());
            return (
                InstallAction::Stall {
                    slug: slug.clone(),
                    attempts,
                },
                next,
            );
        }

        next.progress += self.required.step();
        next.attempts.insert(slug.clone(), attempts + 1);
        next.installing = Some(slug.clone());
        next.installed_at_request = installed_slugs(installed);

        tracing::info!(
            "{site}: requesting install of {slug} (attempt {}, progress {:.0}%)",
            attempts + 1,
            next.progress
        );

        (
            InstallAction::Install {
                site,
                entry: entry.clone(),
            },
            next,
        )
    }

    pub fn plugin_statuses(
        &self,
        installed: Option<&[InstalledPlugin]>,
        state: &InstallerState,
    ) -> Vec<(PluginSlug, PluginStatus)> {
        self.required
            .iter()
            .map(|slug| {
                let status = if installed.is_some_and(|list| is_installed(list, slug)) {
                    PluginStatus::Installed
                } else if state.installing.as_ref() == Some(slug) {
                    PluginStatus::Installing
                } else if state.stalled.as_ref() == Some(slug) {
                    PluginStatus::Stalled
                } else {
                    PluginStatus::Waiting
                };
                (slug.clone(), status)
            })
            .collect()
    }
}

fn installed_slugs(installed: &[InstalledPlugin]) -> BTreeSet<PluginSlug> {
    installed.iter().map(|plugin| plugin.slug.clone()).collect()
}
