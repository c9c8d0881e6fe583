/*
 * Links from a namespace or deployment to its Grafana dashboards and logs.
 */

use serde::Serialize;
use serde_json::json;

use crate::config::AppConfig;

const PROMETHEUS_DATASOURCE: &str = "Prometheus";
const LOKI_DATASOURCE: &str = "loki";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrafanaLinks {
    base_url: String,
    namespace_dashboard_uid: String,
    deployment_dashboard_uid: String,
}

/// Observability links for one namespace and its deployments.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct NamespaceLinks {
    pub namespace: String,
    pub dashboard: String,
    pub deployments: Vec<DeploymentLinks>,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct DeploymentLinks {
    pub deployment: String,
    pub dashboard: String,
    pub logs: String,
}

impl GrafanaLinks {
    pub fn new(
        base_url: impl Into<String>,
        namespace_dashboard_uid: impl Into<String>,
        deployment_dashboard_uid: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        GrafanaLinks {
            base_url: base_url.trim_end_matches('/').to_string(),
            namespace_dashboard_uid: namespace_dashboard_uid.into(),
            deployment_dashboard_uid: deployment_dashboard_uid.into(),
        }
    }

    /// `None` when no Grafana base URL is configured.
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        if config.grafana_base_url.trim().is_empty() {
            return None;
        }
        Some(Self::new(
            config.grafana_base_url.trim(),
            &config.grafana_dashboard_url_namespace,
            &config.grafana_dashboard_url_deployment,
        ))
    }

    pub fn namespace_dashboard_url(&self, namespace: &str) -> String {
        format!(
            "{}/d/{}?var-datasource={}&var-namespace={}",
            self.base_url,
            self.namespace_dashboard_uid,
            PROMETHEUS_DATASOURCE,
            urlencoding::encode(namespace),
        )
    }

    pub fn deployment_dashboard_url(&self, namespace: &str, deployment: &str) -> String {
        format!(
            "{}/d/{}?var-datasource={}&var-namespace={}&var-deployment={}",
            self.base_url,
            self.deployment_dashboard_uid,
            PROMETHEUS_DATASOURCE,
            urlencoding::encode(namespace),
            urlencoding::encode(deployment),
        )
    }

    /// Grafana Explore view over the last hour of the deployment's Loki logs.
    pub fn workload_logs_url(&self, namespace: &str, deployment: &str) -> String {
        let panes = json!({
            "logs": {
                "datasource": LOKI_DATASOURCE,
                "queries": [{
                    "refId": "A",
                    "expr": format!("{{app=\"{}\",namespace=\"{}\"}}", deployment, namespace),
                    "queryType": "range",
                    "datasource": {
                        "type": "loki",
                        "uid": LOKI_DATASOURCE,
                    },
                }],
                "range": {
                    "from": "now-1h",
                    "to": "now",
                },
            }
        });

        format!(
            "{}/explore?schemaVersion=1&panes={}&orgId=1",
            self.base_url,
            urlencoding::encode(&panes.to_string()),
        )
    }

    pub fn namespace_links<'a>(
        &self,
        namespace: &str,
        deployments: impl IntoIterator<Item = &'a str>,
    ) -> NamespaceLinks {
        NamespaceLinks {
            namespace: namespace.to_string(),
            dashboard: self.namespace_dashboard_url(namespace),
            deployments: deployments
                .into_iter()
                .map(|deployment| DeploymentLinks {
                    deployment: deployment.to_string(),
                    dashboard: self.deployment_dashboard_url(namespace, deployment),
                    logs: self.workload_logs_url(namespace, deployment),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links() -> GrafanaLinks {
        GrafanaLinks::new("https://grafana.example.com/", "ns-uid", "deploy-uid")
    }

    #[test]
    fn test_namespace_dashboard_url() {
        assert_eq!(
            links().namespace_dashboard_url("shop"),
            "https://grafana.example.com/d/ns-uid?var-datasource=Prometheus&var-namespace=shop"
        );
    }

    #[test]
    fn test_deployment_dashboard_url() {
        assert_eq!(
            links().deployment_dashboard_url("shop", "storefront"),
            "https://grafana.example.com/d/deploy-uid?var-datasource=Prometheus&var-namespace=shop&var-deployment=storefront"
        );
    }

    #[test]
    fn test_logs_url_encodes_loki_query() {
        let url = links().workload_logs_url("shop", "storefront");

        let (prefix, rest) = url.split_once("panes=").unwrap();
        assert_eq!(prefix, "https://grafana.example.com/explore?schemaVersion=1&");
        let (panes, suffix) = rest.split_once('&').unwrap();
        assert_eq!(suffix, "orgId=1");

        let decoded = urlencoding::decode(panes).unwrap();
        let panes: serde_json::Value = serde_json::from_str(&decoded).unwrap();
        assert_eq!(
            panes["logs"]["queries"][0]["expr"],
            r#"{app="storefront",namespace="shop"}"#
        );
        assert_eq!(panes["logs"]["range"]["from"], "now-1h");
    }

    #[test]
    fn test_unconfigured_grafana_gives_no_links() {
        assert_eq!(GrafanaLinks::from_config(&AppConfig::default()), None);
    }

    #[test]
    fn test_namespace_links() {
        let config = AppConfig {
            grafana_base_url: "https://grafana.example.com".to_string(),
            grafana_dashboard_url_namespace: "ns-uid".to_string(),
            grafana_dashboard_url_deployment: "deploy-uid".to_string(),
            ..Default::default()
        };
        let grafana = GrafanaLinks::from_config(&config).unwrap();

        let links = grafana.namespace_links("shop", ["storefront", "worker"]);

        assert_eq!(links.deployments.len(), 2);
        assert_eq!(links.deployments[1].deployment, "worker");
        assert!(links.dashboard.ends_with("var-namespace=shop"));
    }
}
