use std::collections::{HashMap, HashSet};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::model::config::AppConfig;
use crate::model::plugin::{CatalogEntry, InstalledPlugin, PluginSlug, SiteId, is_installed};
use crate::msg::Msg;
use crate::service::{ServiceError, SetupService};

#[derive(Debug)]
enum Request {
    ResolveSite,
    LoadInstalled(SiteId),
    FetchCatalogEntry(PluginSlug),
    Install(SiteId, CatalogEntry),
    MarkFinished(SiteId, bool),
}

/// In-process stand-in for the plugin directory and the site plugin API.
///
/// Requests are queued to a worker thread that answers each one after the
/// configured latency, in order.
pub struct SimulatedService {
    tx: mpsc::Sender<Request>,
}

impl SimulatedService {
    pub fn spawn(config: &AppConfig, events: mpsc::Sender<Msg>) -> Self {
        let (tx, rx) = mpsc::channel::<Request>();
        let latency = Duration::from_millis(config.simulation.latency_ms);
        let mut backend = SimulatedBackend::new(config);

        thread::spawn(move || {
            for request in rx {
                thread::sleep(latency);
                let reply = backend.handle(request);
                if events.send(reply).is_err() {
                    break;
                }
            }
            tracing::debug!("simulated service worker stopped");
        });

        Self { tx }
    }

    fn send(&self, request: Request) -> Result<(), ServiceError> {
        tracing::trace!("service request: {request:?}");
        self.tx
            .send(request)
            .map_err(|_| ServiceError::Disconnected)
    }
}

impl SetupService for SimulatedService {
    fn resolve_site(&self) -> Result<(), ServiceError> {
        self.send(Request::ResolveSite)
    }

    fn load_installed_plugins(&self, site: SiteId) -> Result<(), ServiceError> {
        self.send(Request::LoadInstalled(site))
    }

    fn fetch_catalog_entry(&self, slug: &PluginSlug) -> Result<(), ServiceError> {
        self.send(Request::FetchCatalogEntry(slug.clone()))
    }

    fn request_install(&self, site: SiteId, entry: &CatalogEntry) -> Result<(), ServiceError> {
        self.send(Request::Install(site, entry.clone()))
    }

    fn mark_setup_finished(&self, site: SiteId, finished: bool) -> Result<(), ServiceError> {
        self.send(Request::MarkFinished(site, finished))
    }
}

struct SimulatedBackend {
    site: SiteId,
    installed: Vec<InstalledPlugin>,
    unlisted: HashSet<PluginSlug>,
    failures_left: HashMap<PluginSlug, u32>,
    finished: HashSet<SiteId>,
}

impl SimulatedBackend {
    fn new(config: &AppConfig) -> Self {
        Self {
            site: config.site_id(),
            installed: config
                .simulation
                .preinstalled
                .iter()
                .map(|slug| installed_plugin(catalog_entry(slug)))
                .collect(),
            unlisted: config.simulation.unlisted.iter().cloned().collect(),
            failures_left: config.simulation.failing_installs.clone(),
            finished: HashSet::new(),
        }
    }

    fn handle(&mut self, request: Request) -> Msg {
        match request {
            Request::ResolveSite => Msg::SiteResolved(self.site),
            Request::LoadInstalled(site) => {
                let plugins = if site == self.site {
                    self.installed.clone()
                } else {
                    Vec::new()
                };
                Msg::InstalledPluginsLoaded(site, plugins)
            }
            Request::FetchCatalogEntry(slug) => match self.lookup(&slug) {
                Ok(entry) => Msg::CatalogEntryFetched(entry),
                Err(err) => {
                    tracing::debug!("catalog lookup failed: {err}");
                    Msg::CatalogEntryMissing(slug)
                }
            },
            Request::Install(site, entry) => match self.install(site, entry) {
                Ok(()) => Msg::InstalledPluginsLoaded(site, self.installed.clone()),
                Err((slug, err)) => Msg::InstallFailed {
                    site,
                    slug,
                    reason: err.to_string(),
                },
            },
            Request::MarkFinished(site, finished) => {
                if finished {
                    if self.finished.insert(site) {
                        tracing::info!("{site}: required plugin setup marked finished");
                    }
                } else {
                    self.finished.remove(&site);
                }
                Msg::SetupMarkedFinished(site)
            }
        }
    }

    fn lookup(&self, slug: &PluginSlug) -> Result<CatalogEntry, ServiceError> {
        if self.unlisted.contains(slug) {
            return Err(ServiceError::UnknownPlugin { slug: slug.clone() });
        }
        Ok(catalog_entry(slug))
    }

    fn install(
        &mut self,
        site: SiteId,
        entry: CatalogEntry,
    ) -> Result<(), (PluginSlug, ServiceError)> {
        let slug = entry.slug.clone();

        if site != self.site {
            return Err((slug, ServiceError::UnknownSite { site }));
        }

        if let Some(left) = self.failures_left.get_mut(&slug)
            && *left > 0
        {
            *left -= 1;
            let err = ServiceError::InstallRejected {
                slug: slug.clone(),
                reason: "remote site timed out".to_string(),
            };
            return Err((slug, err));
        }

        if !is_installed(&self.installed, &slug) {
            self.installed.push(installed_plugin(entry));
        }

        Ok(())
    }
}

fn catalog_entry(slug: &PluginSlug) -> CatalogEntry {
    CatalogEntry {
        slug: slug.clone(),
        name: display_name(slug),
        version: "latest".to_string(),
        download_url: format!(
            "https://downloads.wordpress.org/plugin/{slug}.latest-stable.zip"
        ),
    }
}

fn installed_plugin(entry: CatalogEntry) -> InstalledPlugin {
    InstalledPlugin {
        slug: entry.slug,
        name: entry.name,
        version: entry.version,
        active: true,
    }
}

fn display_name(slug: &PluginSlug) -> String {
    slug.as_str()
        .split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        let mut config = AppConfig::defaults().unwrap();
        config.simulation.latency_ms = 0;
        config.simulation.preinstalled = vec!["woocommerce".into()];
        config.simulation.unlisted = vec!["woocommerce-services".into()];
        config.simulation.failing_installs =
            HashMap::from([(PluginSlug::from("woocommerce-gateway-stripe"), 1)]);
        config
    }

    #[test]
    fn catalog_lookups_respect_unlisted_plugins() {
        let mut backend = SimulatedBackend::new(&config());

        let fetched = backend.handle(Request::FetchCatalogEntry("woocommerce".into()));
        assert!(matches!(
            fetched,
            Msg::CatalogEntryFetched(entry) if entry.name == "Woocommerce"
        ));

        let missing = backend.handle(Request::FetchCatalogEntry("woocommerce-services".into()));
        assert!(matches!(
            missing,
            Msg::CatalogEntryMissing(slug) if slug.as_str() == "woocommerce-services"
        ));
    }

    #[test]
    fn unlisted_lookup_is_an_unknown_plugin() {
        let backend = SimulatedBackend::new(&config());

        let err = backend.lookup(&"woocommerce-services".into()).unwrap_err();
        assert!(matches!(
            &err,
            ServiceError::UnknownPlugin { slug } if slug.as_str() == "woocommerce-services"
        ));
        assert_eq!(err.to_string(), "woocommerce-services is not in the plugin directory");

        let entry = backend.lookup(&"woocommerce".into()).unwrap();
        assert_eq!(entry.version, "latest");
    }

    #[test]
    fn install_fails_configured_times_then_succeeds() {
        let mut backend = SimulatedBackend::new(&config());
        let site = backend.site;
        let entry = catalog_entry(&"woocommerce-gateway-stripe".into());

        let first = backend.handle(Request::Install(site, entry.clone()));
        assert!(matches!(
            first,
            Msg::InstallFailed { ref reason, .. } if reason.contains("timed out")
        ));

        let second = backend.handle(Request::Install(site, entry.clone()));
        let plugins = match second {
            Msg::InstalledPluginsLoaded(_, plugins) => plugins,
            other => panic!("expected installed list, got {other:?}"),
        };
        let slugs: Vec<&str> = plugins.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["woocommerce", "woocommerce-gateway-stripe"]);

        // Installing again does not duplicate the plugin.
        let third = backend.handle(Request::Install(site, entry));
        assert!(matches!(third, Msg::InstalledPluginsLoaded(_, plugins) if plugins.len() == 2));
    }

    #[test]
    fn other_sites_have_nothing_installed() {
        let mut backend = SimulatedBackend::new(&config());
        let other = SiteId(999);

        assert!(matches!(
            backend.handle(Request::LoadInstalled(other)),
            Msg::InstalledPluginsLoaded(site, plugins) if site == other && plugins.is_empty()
        ));
        assert!(matches!(
            backend.handle(Request::Install(other, catalog_entry(&"woocommerce".into()))),
            Msg::InstallFailed { .. }
        ));
    }

    #[test]
    fn worker_answers_requests_in_order() {
        let (events_tx, events_rx) = mpsc::channel();
        let service = SimulatedService::spawn(&config(), events_tx);

        service.resolve_site().unwrap();
        service.fetch_catalog_entry(&"woocommerce".into()).unwrap();
        service.mark_setup_finished(SiteId(1), true).unwrap();

        let timeout = Duration::from_secs(5);
        assert!(matches!(
            events_rx.recv_timeout(timeout).unwrap(),
            Msg::SiteResolved(SiteId(1))
        ));
        assert!(matches!(
            events_rx.recv_timeout(timeout).unwrap(),
            Msg::CatalogEntryFetched(_)
        ));
        assert!(matches!(
            events_rx.recv_timeout(timeout).unwrap(),
            Msg::SetupMarkedFinished(SiteId(1))
        ));
    }

    #[test]
    fn display_names_are_title_cased() {
        assert_eq!(
            display_name(&"woocommerce-gateway-stripe".into()),
            "Woocommerce Gateway Stripe"
        );
    }
}
