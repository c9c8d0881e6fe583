/*
 * Data model handed to the presentation layer.
 *
 * Every URL-bearing field holds `url::Url`, which serializes as its absolute
 * string form, so a JSON encoding of these types is exactly the
 * string-encoded representation kept in the cache.
 */

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Service};
use serde::{Deserialize, Serialize};
use url::Url;

/// One row of the namespace list view.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct NamespaceIngressInfo {
    pub namespace: Namespace,
    pub ingress_urls: Vec<Url>,
    pub is_special: bool,
}

impl NamespaceIngressInfo {
    pub fn name(&self) -> Option<&str> {
        namespace_name(&self.namespace)
    }

    pub fn ingress_url_strings(&self) -> Vec<String> {
        self.ingress_urls.iter().map(Url::to_string).collect()
    }
}

/// Detail view of a single namespace.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct NamespaceInfo {
    pub namespace: Namespace,
    pub ingress_urls: Vec<Url>,
    pub services: Vec<Service>,
    pub deployments: Vec<Deployment>,
    pub resource_usage: ResourceUsage,
}

impl NamespaceInfo {
    pub fn name(&self) -> Option<&str> {
        namespace_name(&self.namespace)
    }

    pub fn ingress_url_strings(&self) -> Vec<String> {
        self.ingress_urls.iter().map(Url::to_string).collect()
    }
}

/// Summed container resource requests for a namespace.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ResourceUsage {
    /// e.g. `"1.25 cores"`
    pub cpu: String,
    /// e.g. `"384.00 Mi"`
    pub memory: String,
    pub cpu_millicores: u64,
    pub memory_bytes: u64,
}

impl ResourceUsage {
    pub fn from_totals(cpu_millicores: u64, memory_bytes: u64) -> Self {
        let cores = cpu_millicores as f64 / 1000.0;
        let mebibytes = memory_bytes as f64 / (1024.0 * 1024.0);

        ResourceUsage {
            cpu: format!("{:.2} cores", cores),
            memory: format!("{:.2} Mi", mebibytes),
            cpu_millicores,
            memory_bytes,
        }
    }
}

impl Default for ResourceUsage {
    fn default() -> Self {
        Self::from_totals(0, 0)
    }
}

/// The name of a namespace object, if the API returned a non-empty one.
pub fn namespace_name(namespace: &Namespace) -> Option<&str> {
    namespace
        .metadata
        .name
        .as_deref()
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;

    fn namespace(name: Option<&str>) -> Namespace {
        Namespace {
            metadata: ObjectMeta {
                name: name.map(String::from),
                labels: Some(BTreeMap::from([("team".to_string(), "web".to_string())])),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_usage_display() {
        let usage = ResourceUsage::default();
        assert_eq!(usage.cpu, "0.00 cores");
        assert_eq!(usage.memory, "0.00 Mi");
    }

    #[test]
    fn test_usage_display_rounds_to_two_decimals() {
        let usage = ResourceUsage::from_totals(1250, 3 * 1024 * 1024 / 2);
        assert_eq!(usage.cpu, "1.25 cores");
        assert_eq!(usage.memory, "1.50 Mi");
    }

    #[test]
    fn test_namespace_name_absent_or_empty() {
        assert_eq!(namespace_name(&namespace(Some("shop"))), Some("shop"));
        assert_eq!(namespace_name(&namespace(Some(""))), None);
        assert_eq!(namespace_name(&namespace(None)), None);
    }

    #[test]
    fn test_string_encoding_restores_urls() {
        let info = NamespaceIngressInfo {
            namespace: namespace(Some("shop")),
            ingress_urls: vec![
                Url::parse("https://shop.example.com/checkout").unwrap(),
                Url::parse("https://shop.example.com/").unwrap(),
            ],
            is_special: false,
        };

        let encoded = serde_json::to_value(&info).unwrap();
        assert_eq!(
            encoded["ingress_urls"],
            serde_json::json!(["https://shop.example.com/checkout", "https://shop.example.com/"])
        );

        let decoded: NamespaceIngressInfo = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, info);
        assert_eq!(
            decoded.ingress_url_strings(),
            vec!["https://shop.example.com/checkout", "https://shop.example.com/"]
        );
    }
}
