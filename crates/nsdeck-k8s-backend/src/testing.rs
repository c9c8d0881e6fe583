//! In-memory [`ClusterClient`] for tests.
//!
//! Pages are served in order; page `n` answers to continuation token
//! `page-n`. Every operation bumps a call counter so callers can assert how
//! often the "cluster" was hit.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
    Container, Namespace, Pod, PodSpec, ResourceRequirements, Service,
};
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule, IngressSpec,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::core::ErrorResponse;

use crate::cluster::{ClusterClient, NamespacePage, NamespacePageRequest};
use crate::error::{BackendResult, NsdeckBackendError};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub list_namespaces: usize,
    pub read_namespace: usize,
    pub list_ingresses: usize,
    pub list_services: usize,
    pub list_pods: usize,
    pub list_deployments: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.list_namespaces
            + self.read_namespace
            + self.list_ingresses
            + self.list_services
            + self.list_pods
            + self.list_deployments
    }
}

#[derive(Default)]
pub struct FakeCluster {
    pages: Vec<Vec<Namespace>>,
    namespaces: HashMap<String, Namespace>,
    ingresses: HashMap<String, Vec<Ingress>>,
    services: HashMap<String, Vec<Service>>,
    pods: HashMap<String, Vec<Pod>>,
    deployments: HashMap<String, Vec<Deployment>>,
    failing: HashSet<String>,
    fail_listing: bool,
    outage: AtomicBool,

    list_namespaces_calls: AtomicUsize,
    read_namespace_calls: AtomicUsize,
    list_ingresses_calls: AtomicUsize,
    list_services_calls: AtomicUsize,
    list_pods_calls: AtomicUsize,
    list_deployments_calls: AtomicUsize,
    page_requests: Mutex<Vec<NamespacePageRequest>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page to the label-selector listing. Namespaces on it are
    /// also readable by name.
    pub fn with_page(mut self, items: Vec<Namespace>) -> Self {
        for ns in &items {
            if let Some(name) = &ns.metadata.name {
                self.namespaces.insert(name.clone(), ns.clone());
            }
        }
        self.pages.push(items);
        self
    }

    /// A namespace readable by name but not returned by the listing.
    pub fn with_namespace(mut self, ns: Namespace) -> Self {
        if let Some(name) = &ns.metadata.name {
            self.namespaces.insert(name.clone(), ns);
        }
        self
    }

    pub fn with_ingress(mut self, namespace: &str, ingress: Ingress) -> Self {
        self.ingresses
            .entry(namespace.to_string())
            .or_default()
            .push(ingress);
        self
    }

    pub fn with_service(mut self, namespace: &str, service: Service) -> Self {
        self.services
            .entry(namespace.to_string())
            .or_default()
            .push(service);
        self
    }

    pub fn with_pod(mut self, namespace: &str, pod: Pod) -> Self {
        self.pods.entry(namespace.to_string()).or_default().push(pod);
        self
    }

    pub fn with_deployment(mut self, namespace: &str, deployment: Deployment) -> Self {
        self.deployments
            .entry(namespace.to_string())
            .or_default()
            .push(deployment);
        self
    }

    /// Every per-namespace call for `name` fails with a transport error.
    pub fn failing(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    /// Every namespace list call fails with a transport error.
    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// Switch a cluster-wide outage on or off. While it is on every call
    /// fails with a transport error.
    pub fn set_outage(&self, down: bool) {
        self.outage.store(down, Ordering::SeqCst);
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            list_namespaces: self.list_namespaces_calls.load(Ordering::SeqCst),
            read_namespace: self.read_namespace_calls.load(Ordering::SeqCst),
            list_ingresses: self.list_ingresses_calls.load(Ordering::SeqCst),
            list_services: self.list_services_calls.load(Ordering::SeqCst),
            list_pods: self.list_pods_calls.load(Ordering::SeqCst),
            list_deployments: self.list_deployments_calls.load(Ordering::SeqCst),
        }
    }

    pub fn page_requests(&self) -> Vec<NamespacePageRequest> {
        self.page_requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn check(&self, namespace: &str) -> BackendResult<()> {
        if self.outage.load(Ordering::SeqCst) || self.failing.contains(namespace) {
            return Err(transport_error(namespace));
        }
        Ok(())
    }
}

#[async_trait]
impl ClusterClient for FakeCluster {
    async fn list_namespaces(&self, request: &NamespacePageRequest) -> BackendResult<NamespacePage> {
        self.list_namespaces_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.page_requests.lock() {
            requests.push(request.clone());
        }
        if self.fail_listing || self.outage.load(Ordering::SeqCst) {
            return Err(transport_error("namespace listing"));
        }

        let index = match &request.continue_token {
            None => 0,
            Some(token) => token
                .strip_prefix("page-")
                .and_then(|n| n.parse::<usize>().ok())
                .unwrap_or(self.pages.len()),
        };

        let items = self.pages.get(index).cloned().unwrap_or_default();
        let continue_token = (index + 1 < self.pages.len()).then(|| format!("page-{}", index + 1));

        Ok(NamespacePage {
            items,
            continue_token,
        })
    }

    async fn read_namespace(&self, name: &str) -> BackendResult<Namespace> {
        self.read_namespace_calls.fetch_add(1, Ordering::SeqCst);
        self.check(name)?;
        self.namespaces
            .get(name)
            .cloned()
            .ok_or_else(|| NsdeckBackendError::NamespaceNotFound(name.to_string()))
    }

    async fn list_ingresses(&self, namespace: &str) -> BackendResult<Vec<Ingress>> {
        self.list_ingresses_calls.fetch_add(1, Ordering::SeqCst);
        self.check(namespace)?;
        Ok(self.ingresses.get(namespace).cloned().unwrap_or_default())
    }

    async fn list_services(&self, namespace: &str) -> BackendResult<Vec<Service>> {
        self.list_services_calls.fetch_add(1, Ordering::SeqCst);
        self.check(namespace)?;
        Ok(self.services.get(namespace).cloned().unwrap_or_default())
    }

    async fn list_pods(&self, namespace: &str) -> BackendResult<Vec<Pod>> {
        self.list_pods_calls.fetch_add(1, Ordering::SeqCst);
        self.check(namespace)?;
        Ok(self.pods.get(namespace).cloned().unwrap_or_default())
    }

    async fn list_deployments(&self, namespace: &str) -> BackendResult<Vec<Deployment>> {
        self.list_deployments_calls.fetch_add(1, Ordering::SeqCst);
        self.check(namespace)?;
        Ok(self.deployments.get(namespace).cloned().unwrap_or_default())
    }
}

fn transport_error(target: &str) -> NsdeckBackendError {
    NsdeckBackendError::KubeError(kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: format!("simulated outage while reading {}", target),
        reason: "ServiceUnavailable".to_string(),
        code: 503,
    }))
}

pub fn namespace(name: &str) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn unnamed_namespace() -> Namespace {
    Namespace::default()
}

/// `count` namespaces named `{prefix}-0`, `{prefix}-1`, ...
pub fn namespaces(prefix: &str, count: usize) -> Vec<Namespace> {
    (0..count)
        .map(|i| namespace(&format!("{}-{}", prefix, i)))
        .collect()
}

/// An ingress with one rule per host, each carrying the given paths.
pub fn ingress(name: &str, rules: Vec<(Option<&str>, Vec<Option<&str>>)>) -> Ingress {
    let rules = rules
        .into_iter()
        .map(|(host, paths)| IngressRule {
            host: host.map(String::from),
            http: Some(HTTPIngressRuleValue {
                paths: paths
                    .into_iter()
                    .map(|path| HTTPIngressPath {
                        path: path.map(String::from),
                        path_type: "Prefix".to_string(),
                        backend: IngressBackend::default(),
                    })
                    .collect(),
            }),
        })
        .collect();

    Ingress {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        spec: Some(IngressSpec {
            rules: Some(rules),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// A pod whose containers request the given `(cpu, memory)` amounts.
pub fn pod(name: &str, requests: &[(Option<&str>, Option<&str>)]) -> Pod {
    let containers = requests
        .iter()
        .enumerate()
        .map(|(i, (cpu, memory))| {
            let mut map = BTreeMap::new();
            if let Some(cpu) = cpu {
                map.insert("cpu".to_string(), Quantity(cpu.to_string()));
            }
            if let Some(memory) = memory {
                map.insert("memory".to_string(), Quantity(memory.to_string()));
            }
            Container {
                name: format!("{}-{}", name, i),
                resources: Some(ResourceRequirements {
                    requests: Some(map),
                    ..Default::default()
                }),
                ..Default::default()
            }
        })
        .collect();

    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers,
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn service(name: &str) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn deployment(name: &str) -> Deployment {
    Deployment {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}
