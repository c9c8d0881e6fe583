/*
 * Uncached fetch pipelines behind the dashboard's list and detail views.
 */

use url::Url;

use crate::batch::{BatchFailurePolicy, INGRESS_BATCH_SIZE, run_batched};
use crate::cluster::ClusterClient;
use crate::error::BackendResult;
use crate::ingress::{extract_all_urls, namespace_ingress_urls};
use crate::namespaces::{NamespaceEntry, collect_namespaces};
use crate::resources::aggregate_resource_usage;
use crate::types::{NamespaceInfo, NamespaceIngressInfo, namespace_name};

/// What the list view is built from.
#[derive(Clone, Debug, Default)]
pub struct NamespaceQuery {
    pub label_selector: Option<String>,
    pub special_namespaces: Vec<String>,
    pub failure_policy: BatchFailurePolicy,
}

/// Every selected namespace with its public ingress URLs.
pub async fn fetch_namespaces_with_ingress(
    client: &dyn ClusterClient,
    query: &NamespaceQuery,
) -> BackendResult<Vec<NamespaceIngressInfo>> {
    let entries = collect_namespaces(
        client,
        query.label_selector.as_deref(),
        &query.special_namespaces,
    )
    .await?;

    let url_lists = run_batched(
        &entries,
        INGRESS_BATCH_SIZE,
        query.failure_policy,
        |entry| entry_ingress_urls(client, entry),
    )
    .await?;

    let infos: Vec<NamespaceIngressInfo> = entries
        .into_iter()
        .zip(url_lists)
        .map(|(entry, ingress_urls)| NamespaceIngressInfo {
            namespace: entry.namespace,
            ingress_urls,
            is_special: entry.is_special,
        })
        .collect();

    tracing::info!("Fetched ingress URLs for {} namespaces.", infos.len());

    Ok(infos)
}

async fn entry_ingress_urls(
    client: &dyn ClusterClient,
    entry: &NamespaceEntry,
) -> BackendResult<Vec<Url>> {
    match namespace_name(&entry.namespace) {
        Some(name) => namespace_ingress_urls(client, name).await,
        None => Ok(Vec::new()),
    }
}

/// Namespace object, ingress URLs, services, deployments and summed resource
/// requests of one namespace, fetched concurrently.
pub async fn fetch_namespace_info(
    client: &dyn ClusterClient,
    name: &str,
) -> BackendResult<NamespaceInfo> {
    let (namespace, ingresses, services, pods, deployments) = tokio::try_join!(
        client.read_namespace(name),
        client.list_ingresses(name),
        client.list_services(name),
        client.list_pods(name),
        client.list_deployments(name),
    )?;

    Ok(NamespaceInfo {
        namespace,
        ingress_urls: extract_all_urls(&ingresses),
        services,
        deployments,
        resource_usage: aggregate_resource_usage(&pods),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        FakeCluster, deployment, ingress, namespace, namespaces, pod, service, unnamed_namespace,
    };

    fn urls(info: &NamespaceIngressInfo) -> Vec<&str> {
        info.ingress_urls.iter().map(Url::as_str).collect()
    }

    fn shop_cluster() -> FakeCluster {
        FakeCluster::new()
            .with_page(vec![namespace("shop"), namespace("blog")])
            .with_namespace(namespace("monitoring"))
            .with_ingress(
                "shop",
                ingress(
                    "storefront",
                    vec![(
                        Some("shop.example.com"),
                        vec![Some("/checkout*"), Some("/internal/metrics")],
                    )],
                ),
            )
            .with_ingress(
                "monitoring",
                ingress("grafana", vec![(Some("grafana.example.com"), vec![Some("/")])]),
            )
    }

    #[tokio::test]
    async fn test_list_view_merges_and_extracts() {
        let cluster = shop_cluster();
        let query = NamespaceQuery {
            label_selector: Some("dashboard=enabled".to_string()),
            special_namespaces: vec!["monitoring".to_string()],
            ..Default::default()
        };

        let infos = fetch_namespaces_with_ingress(&cluster, &query).await.unwrap();

        assert_eq!(infos.len(), 3);
        assert_eq!(infos[0].name(), Some("shop"));
        assert_eq!(urls(&infos[0]), vec!["https://shop.example.com/checkout"]);
        assert!(!infos[0].is_special);
        assert_eq!(infos[1].name(), Some("blog"));
        assert!(infos[1].ingress_urls.is_empty());
        assert_eq!(infos[2].name(), Some("monitoring"));
        assert_eq!(urls(&infos[2]), vec!["https://grafana.example.com/"]);
        assert!(infos[2].is_special);
        assert_eq!(cluster.calls().list_ingresses, 3);
    }

    #[tokio::test]
    async fn test_unnamed_namespace_skips_ingress_call() {
        let cluster = FakeCluster::new().with_page(vec![unnamed_namespace(), namespace("shop")]);

        let infos = fetch_namespaces_with_ingress(&cluster, &NamespaceQuery::default())
            .await
            .unwrap();

        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].name(), None);
        assert!(infos[0].ingress_urls.is_empty());
        assert_eq!(cluster.calls().list_ingresses, 1);
    }

    #[tokio::test]
    async fn test_batch_failure_aborts_by_default() {
        let mut page = namespaces("team", 25);
        page[12] = namespace("flaky");
        let cluster = FakeCluster::new().with_page(page).failing("flaky");

        let result = fetch_namespaces_with_ingress(&cluster, &NamespaceQuery::default()).await;

        assert!(result.is_err());
        // The third group never starts.
        assert_eq!(cluster.calls().list_ingresses, 20);
    }

    #[tokio::test]
    async fn test_batch_failure_can_degrade_to_empty() {
        let mut page = namespaces("team", 25);
        page[12] = namespace("flaky");
        let cluster = FakeCluster::new()
            .with_page(page)
            .failing("flaky")
            .with_ingress(
                "team-13",
                ingress("web", vec![(Some("team13.example.com"), vec![Some("/")])]),
            );
        let query = NamespaceQuery {
            failure_policy: BatchFailurePolicy::DegradeToEmpty,
            ..Default::default()
        };

        let infos = fetch_namespaces_with_ingress(&cluster, &query).await.unwrap();

        assert_eq!(infos.len(), 25);
        assert_eq!(infos[12].name(), Some("flaky"));
        assert!(infos[12].ingress_urls.is_empty());
        assert_eq!(urls(&infos[13]), vec!["https://team13.example.com/"]);
        assert_eq!(cluster.calls().list_ingresses, 25);
    }

    #[tokio::test]
    async fn test_detail_view_assembles_everything() {
        let cluster = shop_cluster()
            .with_service("shop", service("storefront"))
            .with_deployment("shop", deployment("storefront"))
            .with_pod("shop", pod("storefront-1", &[(Some("250m"), Some("256Mi"))]))
            .with_pod("shop", pod("storefront-2", &[(Some("250m"), Some("256Mi"))]));

        let info = fetch_namespace_info(&cluster, "shop").await.unwrap();

        assert_eq!(info.name(), Some("shop"));
        assert_eq!(info.ingress_url_strings(), vec!["https://shop.example.com/checkout"]);
        assert_eq!(info.services.len(), 1);
        assert_eq!(info.deployments.len(), 1);
        assert_eq!(info.resource_usage.cpu, "0.50 cores");
        assert_eq!(info.resource_usage.memory, "512.00 Mi");
    }

    #[tokio::test]
    async fn test_detail_view_reports_missing_namespace() {
        let cluster = shop_cluster();

        let err = fetch_namespace_info(&cluster, "nope").await.unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_detail_view_fails_on_any_transport_error() {
        let cluster = shop_cluster().failing("shop");

        let err = fetch_namespace_info(&cluster, "shop").await.unwrap_err();

        assert!(!err.is_not_found());
    }
}
