use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Pod, Service};
use k8s_openapi::api::networking::v1::Ingress;

use kube::{
    Client,
    api::{Api, ListParams},
};

use crate::error::{BackendResult, NsdeckBackendError};

/// Parameters of a single namespace list call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NamespacePageRequest {
    pub label_selector: Option<String>,
    pub continue_token: Option<String>,
    pub limit: u32,
    pub timeout_secs: u32,
}

/// One page of namespaces plus the cursor for the next one.
#[derive(Clone, Debug, Default)]
pub struct NamespacePage {
    pub items: Vec<Namespace>,
    pub continue_token: Option<String>,
}

/// Read access to the cluster resources the dashboard needs.
///
/// Implementations never retry. A missing namespace in [`read_namespace`]
/// must surface as [`NsdeckBackendError::NamespaceNotFound`].
///
/// [`read_namespace`]: ClusterClient::read_namespace
#[async_trait]
pub trait ClusterClient: Send + Sync {
    async fn list_namespaces(&self, request: &NamespacePageRequest) -> BackendResult<NamespacePage>;
    async fn read_namespace(&self, name: &str) -> BackendResult<Namespace>;
    async fn list_ingresses(&self, namespace: &str) -> BackendResult<Vec<Ingress>>;
    async fn list_services(&self, namespace: &str) -> BackendResult<Vec<Service>>;
    async fn list_pods(&self, namespace: &str) -> BackendResult<Vec<Pod>>;
    async fn list_deployments(&self, namespace: &str) -> BackendResult<Vec<Deployment>>;
}

/// [`ClusterClient`] backed by a kube-rs client.
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    pub fn new(client: Client) -> Self {
        KubeClusterClient { client }
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn list_namespaces(&self, request: &NamespacePageRequest) -> BackendResult<NamespacePage> {
        let ns_api: Api<Namespace> = Api::all(self.client.clone());

        let mut lp = ListParams::default()
            .limit(request.limit)
            .timeout(request.timeout_secs);
        if let Some(selector) = &request.label_selector {
            lp = lp.labels(selector);
        }
        if let Some(token) = &request.continue_token {
            lp = lp.continue_token(token);
        }

        let list = ns_api.list(&lp).await?;

        Ok(NamespacePage {
            items: list.items,
            continue_token: list.metadata.continue_,
        })
    }

    async fn read_namespace(&self, name: &str) -> BackendResult<Namespace> {
        let ns_api: Api<Namespace> = Api::all(self.client.clone());

        ns_api
            .get_opt(name)
            .await?
            .ok_or_else(|| NsdeckBackendError::NamespaceNotFound(name.to_string()))
    }

    async fn list_ingresses(&self, namespace: &str) -> BackendResult<Vec<Ingress>> {
        let ingresses: Api<Ingress> = Api::namespaced(self.client.clone(), namespace);
        Ok(ingresses.list(&ListParams::default()).await?.items)
    }

    async fn list_services(&self, namespace: &str) -> BackendResult<Vec<Service>> {
        let services: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        Ok(services.list(&ListParams::default()).await?.items)
    }

    async fn list_pods(&self, namespace: &str) -> BackendResult<Vec<Pod>> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        Ok(pods.list(&ListParams::default()).await?.items)
    }

    async fn list_deployments(&self, namespace: &str) -> BackendResult<Vec<Deployment>> {
        let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        Ok(deployments.list(&ListParams::default()).await?.items)
    }
}
