/*
 * Dashboard configuration, read from a YAML file.
 *
 * Keys are snake_case; the SCREAMING_CASE spelling used by older deployments
 * is accepted as an alias.
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use serde::{Deserialize, Serialize};

use nsdeck_k8s_backend::{BatchFailurePolicy, NamespaceQuery};

use crate::constants::{CONFIG_PATH_ENV, DEFAULT_CONFIG_FILE};

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SideBarIcon {
    Chart,
    Url,
    Terminal,
    Text,
}

/// An extra link shown in the dashboard sidebar.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SideBarUrl {
    pub name: String,
    pub url: String,
    pub icon: SideBarIcon,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_website_name", alias = "WEBSITE_NAME")]
    pub website_name: String,
    #[serde(default, alias = "GRAFANA_BASE_URL")]
    pub grafana_base_url: String,
    #[serde(default, alias = "GRAFANA_DASHBOARD_URL_DEPLOYMENT")]
    pub grafana_dashboard_url_deployment: String,
    #[serde(default, alias = "GRAFANA_DASHBOARD_URL_NAMESPACE")]
    pub grafana_dashboard_url_namespace: String,
    #[serde(default, alias = "LABEL_SELECTOR")]
    pub label_selector: String,
    #[serde(default, alias = "SIDEBAR_URLS")]
    pub sidebar_urls: Vec<SideBarUrl>,
    #[serde(default, alias = "SPECIAL_NAMESPACES")]
    pub special_namespaces: Vec<String>,
    #[serde(default = "default_cache_ttl_secs", alias = "CACHE_TTL_SECS")]
    pub cache_ttl_secs: u64,
    #[serde(default, alias = "BATCH_FAILURE_POLICY")]
    pub batch_failure_policy: BatchFailurePolicy,
}

fn default_website_name() -> String {
    "nsdeck".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    300
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            website_name: default_website_name(),
            grafana_base_url: String::new(),
            grafana_dashboard_url_deployment: String::new(),
            grafana_dashboard_url_namespace: String::new(),
            label_selector: String::new(),
            sidebar_urls: Vec::new(),
            special_namespaces: Vec::new(),
            cache_ttl_secs: default_cache_ttl_secs(),
            batch_failure_policy: BatchFailurePolicy::default(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, else `$NSDECK_CONFIG`, else `./config.yaml`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = resolve_config_path(path);

        let raw = fs::read_to_string(&path)
            .wrap_err_with(|| format!("failed to read config {}", path.display()))?;
        let config = Self::from_yaml_str(&raw)
            .wrap_err_with(|| format!("failed to parse config {}", path.display()))?;

        tracing::info!("Configuration loaded from {}.", path.display());
        Ok(config)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let config: AppConfig = serde_yaml::from_str(raw)?;
        Ok(config)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn namespace_query(&self) -> NamespaceQuery {
        let selector = self.label_selector.trim();

        NamespaceQuery {
            label_selector: (!selector.is_empty()).then(|| selector.to_string()),
            special_namespaces: self.special_namespaces.clone(),
            failure_policy: self.batch_failure_policy,
        }
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match std::env::var_os(CONFIG_PATH_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_CONFIG_FILE),
    }
}
