use futures::future::join_all;
use k8s_openapi::api::core::v1::Namespace;

use crate::cluster::{ClusterClient, NamespacePageRequest};
use crate::error::BackendResult;

pub const NAMESPACE_PAGE_SIZE: u32 = 1000;
pub const NAMESPACE_LIST_TIMEOUT_SECS: u32 = 30;

/// A namespace selected for the list view.
#[derive(Clone, Debug, PartialEq)]
pub struct NamespaceEntry {
    pub namespace: Namespace,
    pub is_special: bool,
}

/// List every namespace matching `label_selector`, following continuation
/// tokens until the server stops returning one.
///
/// All-or-nothing: an error on any page discards the pages already read.
pub async fn list_all_namespaces(
    client: &dyn ClusterClient,
    label_selector: Option<&str>,
) -> BackendResult<Vec<Namespace>> {
    let mut namespaces: Vec<Namespace> = Vec::new();
    let mut request = NamespacePageRequest {
        label_selector: label_selector
            .filter(|selector| !selector.is_empty())
            .map(String::from),
        continue_token: None,
        limit: NAMESPACE_PAGE_SIZE,
        timeout_secs: NAMESPACE_LIST_TIMEOUT_SECS,
    };
    let mut pages = 0usize;

    loop {
        let page = client.list_namespaces(&request).await?;
        pages += 1;
        tracing::debug!(
            "Namespace page {} returned {} items (more: {}).",
            pages,
            page.items.len(),
            page.continue_token.is_some()
        );
        namespaces.extend(page.items);

        match page.continue_token.filter(|token| !token.is_empty()) {
            Some(token) => request.continue_token = Some(token),
            None => break,
        }
    }

    Ok(namespaces)
}

/// Read each configured special namespace by name, concurrently.
///
/// A name that cannot be read is logged and left out; the rest keep their
/// configuration order.
pub async fn read_special_namespaces(
    client: &dyn ClusterClient,
    names: &[String],
) -> Vec<Namespace> {
    let reads = names.iter().map(|name| async move {
        match client.read_namespace(name).await {
            Ok(ns) => Some(ns),
            Err(e) => {
                tracing::warn!("Failed to fetch special namespace {}: {}", name, e);
                None
            }
        }
    });

    join_all(reads).await.into_iter().flatten().collect()
}

/// Label-matched namespaces in listing order, followed by the special
/// namespaces that could be resolved. Overlaps are kept.
pub async fn collect_namespaces(
    client: &dyn ClusterClient,
    label_selector: Option<&str>,
    special_namespaces: &[String],
) -> BackendResult<Vec<NamespaceEntry>> {
    let labelled = list_all_namespaces(client, label_selector).await?;
    let special = read_special_namespaces(client, special_namespaces).await;

    tracing::debug!(
        "Collected {} label-matched and {} special namespaces.",
        labelled.len(),
        special.len()
    );

    let entries = labelled
        .into_iter()
        .map(|namespace| NamespaceEntry {
            namespace,
            is_special: false,
        })
        .chain(special.into_iter().map(|namespace| NamespaceEntry {
            namespace,
            is_special: true,
        }))
        .collect();

    Ok(entries)
}
