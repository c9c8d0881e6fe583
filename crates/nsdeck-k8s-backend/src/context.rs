use std::sync::Arc;

use kube::Client;

use crate::cluster::{ClusterClient, KubeClusterClient};
use crate::error::{BackendResult, NsdeckBackendError};

#[derive(Default, Clone)]
pub struct KubeContext {
    pub client: Option<Client>,
}

impl KubeContext {
    pub async fn init_context(&mut self) -> BackendResult<()> {
        self.client = Some(get_client().await?);

        Ok(())
    }

    /// Hand out the context's client behind the [`ClusterClient`] surface,
    /// connecting first if needed.
    pub async fn cluster_client(&mut self) -> BackendResult<Arc<dyn ClusterClient>> {
        if self.client.is_none() {
            self.init_context().await?;
        }

        match &self.client {
            Some(client) => Ok(Arc::new(KubeClusterClient::new(client.clone()))),
            None => Err(NsdeckBackendError::InvalidConfiguration(
                "kubernetes client was not initialized".to_string(),
            )),
        }
    }
}

// Uses the default kubeconfig, falling back to the in-cluster service account.
async fn get_client() -> BackendResult<Client> {
    Client::try_default()
        .await
        .map_err(NsdeckBackendError::KubeConnectionError)
}
