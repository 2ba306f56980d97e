use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::model::domain_search::DomainSearchProps;
use crate::model::installer::{RequiredPlugins, RequiredPluginsInstaller};
use crate::model::plugin::{PluginSlug, SiteId};

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub setup: SetupConfig,
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub signup: SignupConfig,
    #[serde(default)]
    pub domains: DomainSearchProps,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    /// `development` exposes the test signup step.
    pub environment: String,
    pub log_filter: String,
    pub tick_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct SetupConfig {
    pub site_id: u64,
    pub required_plugins: Vec<PluginSlug>,
    pub max_install_attempts: u32,
}

#[derive(Debug, Deserialize)]
pub struct SimulationConfig {
    pub latency_ms: u64,
    #[serde(default)]
    pub preinstalled: Vec<PluginSlug>,
    /// Slugs the catalog never returns.
    #[serde(default)]
    pub unlisted: Vec<PluginSlug>,
    /// Slug → number of install attempts that fail before one succeeds.
    #[serde(default)]
    pub failing_installs: HashMap<PluginSlug, u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SignupConfig {
    #[serde(default)]
    pub flow: Vec<String>,
}

impl AppConfig {
    /// Load configuration with layering: defaults → user config.
    pub fn load() -> Result<Self> {
        let mut config = Self::defaults()?;

        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "storefront-setup") {
            let config_path = proj_dirs.config_dir().join("config.toml");
            if config_path.exists() {
                config = Self::from_file(&config_path)?;
            }
        }

        config.installer()?;
        Ok(config)
    }

    pub fn defaults() -> Result<Self> {
        let defaults = include_str!("../../config/default.toml");
        toml::from_str(defaults).context("invalid built-in config")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn site_id(&self) -> SiteId {
        SiteId(self.setup.site_id)
    }

    pub fn is_development(&self) -> bool {
        self.general.environment == "development"
    }

    pub fn installer(&self) -> Result<RequiredPluginsInstaller> {
        let required = RequiredPlugins::new(self.setup.required_plugins.clone())?;
        Ok(RequiredPluginsInstaller::new(
            required,
            self.setup.max_install_attempts,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn built_in_defaults_parse() {
        let config = AppConfig::defaults().unwrap();

        assert_eq!(
            config.setup.required_plugins,
            vec![
                PluginSlug::from("woocommerce"),
                PluginSlug::from("woocommerce-gateway-stripe"),
                PluginSlug::from("woocommerce-services"),
            ]
        );
        assert!(config.installer().is_ok());
        assert!(!config.is_development());
        assert!(!config.signup.flow.is_empty());
    }

    #[test]
    fn user_file_replaces_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[general]
environment = "development"
log_filter = "storefront_setup=debug"
tick_ms = 50

[setup]
site_id = 7
required_plugins = ["jetpack"]
max_install_attempts = 1

[simulation]
latency_ms = 0
failing_installs = {{ jetpack = 2 }}
"#
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.site_id(), SiteId(7));
        assert!(config.is_development());
        assert_eq!(
            config.simulation.failing_installs.get(&PluginSlug::from("jetpack")),
            Some(&2)
        );
        assert!(config.signup.flow.is_empty());
        assert!(config.domains.suggestions.is_none());
    }

    #[test]
    fn empty_required_list_is_rejected() {
        let mut config = AppConfig::defaults().unwrap();
        config.setup.required_plugins.clear();

        let err = config.installer().unwrap_err();
        assert!(err.to_string().contains("no required plugins"));
    }
}
