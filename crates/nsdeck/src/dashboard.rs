/*
 * Cached access to the dashboard's list and detail views.
 */

use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};

use nsdeck_cache::{NsdeckStore, TtlCache};
use nsdeck_k8s_backend::{
    BackendResult, ClusterClient, NamespaceInfo, NamespaceIngressInfo, NamespaceQuery,
    fetch_namespace_info, fetch_namespaces_with_ingress,
};

use crate::config::AppConfig;
use crate::constants::{NS_INGRESS_CACHE_KEY, namespace_cache_key};

/// Owns the cluster handle and the cache; one per process (or per test).
///
/// A failed refresh leaves the cache untouched and is never answered with
/// an older value.
pub struct Dashboard<S: NsdeckStore = TtlCache> {
    client: Arc<dyn ClusterClient>,
    store: S,
    query: NamespaceQuery,
}

impl Dashboard<TtlCache> {
    pub fn new(client: Arc<dyn ClusterClient>, config: &AppConfig) -> Self {
        Dashboard::with_store(
            client,
            TtlCache::new(config.cache_ttl()),
            config.namespace_query(),
        )
    }
}

impl<S: NsdeckStore> Dashboard<S> {
    pub fn with_store(client: Arc<dyn ClusterClient>, store: S, query: NamespaceQuery) -> Self {
        Dashboard {
            client,
            store,
            query,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// List view. Errors are logged and reported as an empty list.
    pub async fn namespaces_with_ingress(&self) -> Vec<NamespaceIngressInfo> {
        self.try_namespaces_with_ingress()
            .await
            .unwrap_or_else(|e| {
                tracing::error!("Error fetching namespaces and ingress URLs: {}", e);
                Vec::new()
            })
    }

    /// Detail view. Errors, including a missing namespace, are logged and
    /// reported as `None`.
    pub async fn namespace_info(&self, name: &str) -> Option<NamespaceInfo> {
        match self.try_namespace_info(name).await {
            Ok(info) => Some(info),
            Err(e) if e.is_not_found() => {
                tracing::info!("Namespace {} not found.", name);
                None
            }
            Err(e) => {
                tracing::error!("Error fetching data for namespace {}: {}", name, e);
                None
            }
        }
    }

    /// List view with the failure kept.
    pub async fn try_namespaces_with_ingress(&self) -> BackendResult<Vec<NamespaceIngressInfo>> {
        if let Some(cached) = self.cached(NS_INGRESS_CACHE_KEY).await {
            return Ok(cached);
        }

        let infos = fetch_namespaces_with_ingress(self.client.as_ref(), &self.query).await?;
        self.remember(NS_INGRESS_CACHE_KEY, &infos).await;

        Ok(infos)
    }

    /// Detail view with the failure kept.
    pub async fn try_namespace_info(&self, name: &str) -> BackendResult<NamespaceInfo> {
        let key = namespace_cache_key(name);
        if let Some(cached) = self.cached(&key).await {
            return Ok(cached);
        }

        let info = fetch_namespace_info(self.client.as_ref(), name).await?;
        self.remember(&key, &info).await;

        Ok(info)
    }

    /// Drop every cached list and detail entry.
    pub async fn invalidate(&self) {
        if let Err(e) = self.store.clear_all().await {
            tracing::error!("Failed to clear dashboard cache: {}", e);
        }
    }

    // An unreadable entry is treated as a miss.
    async fn cached<D>(&self, key: &str) -> Option<D>
    where
        D: DeserializeOwned + Send + Sync + 'static,
    {
        match self.store.get_json::<D>(key.to_string()).await {
            Ok(Some(value)) => {
                tracing::debug!("Cache hit for {}.", key);
                Some(value)
            }
            Ok(None) => {
                tracing::debug!("Cache miss for {}.", key);
                None
            }
            Err(e) => {
                tracing::warn!("Discarding unreadable cache entry {}: {}", key, e);
                None
            }
        }
    }

    // Every refresh also sweeps entries for keys that are no longer read.
    async fn remember<V>(&self, key: &str, value: &V)
    where
        V: Serialize + Send + Sync + 'static,
    {
        match self.store.purge_expired().await {
            Ok(0) => {}
            Ok(purged) => tracing::debug!("Purged {} expired cache entries.", purged),
            Err(e) => tracing::warn!("Failed to purge expired cache entries: {}", e),
        }
        if let Err(e) = self.store.set_json(key.to_string(), value).await {
            tracing::error!("Failed to cache {}: {}", key, e);
        }
    }
}
