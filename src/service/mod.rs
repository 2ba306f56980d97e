pub mod simulated;

use thiserror::Error;

use crate::model::plugin::{CatalogEntry, PluginSlug, SiteId};

pub use simulated::SimulatedService;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("setup service has stopped")]
    Disconnected,
    #[error("{slug} is not in the plugin directory")]
    UnknownPlugin { slug: PluginSlug },
    #[error("{site} is not managed by this service")]
    UnknownSite { site: SiteId },
    #[error("install of {slug} was rejected: {reason}")]
    InstallRejected { slug: PluginSlug, reason: String },
}

/// Requests the setup flow makes of the outside world.
///
/// Every call only dispatches the request. Results arrive later as
/// [`crate::msg::Msg`] values on the app's event channel, so an `Ok` here
/// says nothing about whether the work succeeded.
pub trait SetupService {
    fn resolve_site(&self) -> Result<(), ServiceError>;

    fn load_installed_plugins(&self, site: SiteId) -> Result<(), ServiceError>;

    fn fetch_catalog_entry(&self, slug: &PluginSlug) -> Result<(), ServiceError>;

    fn request_install(&self, site: SiteId, entry: &CatalogEntry) -> Result<(), ServiceError>;

    /// Idempotent.
    fn mark_setup_finished(&self, site: SiteId, finished: bool) -> Result<(), ServiceError>;
}
