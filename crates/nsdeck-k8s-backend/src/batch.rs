//! Bounded fan-out over a collection.
//!
//! Items are split into consecutive groups. Groups run one after another and
//! every item inside a group runs concurrently, so at most `group_size`
//! fetches are in flight. What happens when one fetch fails is decided by
//! [`BatchFailurePolicy`].

use std::future::Future;

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::error::{BackendResult, NsdeckBackendError};

pub const INGRESS_BATCH_SIZE: usize = 10;

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BatchFailurePolicy {
    /// The first failed fetch fails the whole run once its group has settled;
    /// later groups never start.
    #[default]
    #[serde(alias = "abort")]
    AbortAll,
    /// A failed fetch yields `R::default()` for that item and the run goes on.
    #[serde(alias = "degrade")]
    DegradeToEmpty,
}

/// Run `fetch` over `items` in groups of `group_size`, preserving input order
/// in the output.
pub async fn run_batched<'a, T, R, F, Fut>(
    items: &'a [T],
    group_size: usize,
    policy: BatchFailurePolicy,
    fetch: F,
) -> BackendResult<Vec<R>>
where
    F: Fn(&'a T) -> Fut,
    Fut: Future<Output = BackendResult<R>>,
    R: Default,
{
    if group_size == 0 {
        return Err(NsdeckBackendError::InvalidConfiguration(
            "batch group size must be at least 1".to_string(),
        ));
    }

    let mut results: Vec<R> = Vec::with_capacity(items.len());

    for (index, group) in items.chunks(group_size).enumerate() {
        // Every member of a group is driven to completion before its results
        // are looked at.
        let group_results = join_all(group.iter().map(&fetch)).await;

        match policy {
            BatchFailurePolicy::AbortAll => {
                for result in group_results {
                    let value = result.inspect_err(|e| {
                        tracing::error!("Batch group {} failed, aborting: {}", index, e);
                    })?;
                    results.push(value);
                }
            }
            BatchFailurePolicy::DegradeToEmpty => {
                results.extend(group_results.into_iter().map(|result| {
                    result.unwrap_or_else(|e| {
                        tracing::warn!(
                            "Batch item in group {} failed, using empty result: {}",
                            index,
                            e
                        );
                        R::default()
                    })
                }));
            }
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::testing::FakeCluster;

    fn outage() -> NsdeckBackendError {
        NsdeckBackendError::NamespaceNotFound("outage".to_string())
    }

    #[tokio::test]
    async fn test_results_keep_input_order() {
        let items: Vec<u64> = (0..25).collect();

        let doubled = run_batched(&items, 10, BatchFailurePolicy::AbortAll, |n| async move {
            // Later items finish first inside each group.
            tokio::time::sleep(Duration::from_millis(30 - *n)).await;
            Ok(n * 2)
        })
        .await
        .unwrap();

        assert_eq!(doubled, (0..25).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_in_flight_never_exceeds_group_size() {
        let items: Vec<usize> = (0..35).collect();
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        run_batched(&items, 10, BatchFailurePolicy::AbortAll, |_| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::task::yield_now().await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await
        .unwrap();

        assert_eq!(peak.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_abort_all_settles_group_then_stops() {
        let items: Vec<usize> = (0..30).collect();
        let sent = AtomicUsize::new(0);

        let result: BackendResult<Vec<usize>> =
            run_batched(&items, 10, BatchFailurePolicy::AbortAll, |n| {
                let sent = &sent;
                async move {
                    sent.fetch_add(1, Ordering::SeqCst);
                    if *n == 13 { Err(outage()) } else { Ok(*n) }
                }
            })
            .await;

        assert!(result.is_err());
        // The whole failing group runs, the third group never starts.
        assert_eq!(sent.load(Ordering::SeqCst), 20);
    }

    #[tokio::test]
    async fn test_abort_all_waits_for_slow_members() {
        let items: Vec<u64> = (0..10).collect();
        let finished = AtomicUsize::new(0);

        let result: BackendResult<Vec<u64>> =
            run_batched(&items, 10, BatchFailurePolicy::AbortAll, |n| {
                let finished = &finished;
                async move {
                    if *n == 0 {
                        return Err(outage());
                    }
                    tokio::time::sleep(Duration::from_millis(*n)).await;
                    finished.fetch_add(1, Ordering::SeqCst);
                    Ok(*n)
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(finished.load(Ordering::SeqCst), 9);
    }

    #[tokio::test]
    async fn test_degrade_replaces_failures_with_default() {
        let items: Vec<usize> = (0..12).collect();

        let result = run_batched(&items, 10, BatchFailurePolicy::DegradeToEmpty, |n| async move {
            if *n % 5 == 0 {
                Err(outage())
            } else {
                Ok(vec![*n])
            }
        })
        .await
        .unwrap();

        assert_eq!(result.len(), 12);
        assert!(result[0].is_empty());
        assert_eq!(result[1], vec![1]);
        assert!(result[5].is_empty());
        assert!(result[10].is_empty());
        assert_eq!(result[11], vec![11]);
    }

    #[tokio::test]
    async fn test_zero_group_size_is_rejected() {
        let items = vec![1, 2, 3];

        let result = run_batched(&items, 0, BatchFailurePolicy::AbortAll, |n| async move { Ok(*n) }).await;

        assert!(matches!(
            result,
            Err(NsdeckBackendError::InvalidConfiguration(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_calls() {
        let cluster = FakeCluster::new();
        let items: Vec<String> = Vec::new();

        let result = run_batched(&items, 10, BatchFailurePolicy::AbortAll, |name| {
            crate::cluster::ClusterClient::list_ingresses(&cluster, name)
        })
        .await
        .unwrap();

        assert!(result.is_empty());
        assert_eq!(cluster.calls().total(), 0);
    }

    #[test]
    fn test_policy_config_names() {
        let abort: BatchFailurePolicy = serde_json::from_str("\"abort\"").unwrap();
        let degrade: BatchFailurePolicy = serde_json::from_str("\"degrade\"").unwrap();
        let long: BatchFailurePolicy = serde_json::from_str("\"degrade_to_empty\"").unwrap();

        assert_eq!(abort, BatchFailurePolicy::AbortAll);
        assert_eq!(degrade, BatchFailurePolicy::DegradeToEmpty);
        assert_eq!(long, BatchFailurePolicy::DegradeToEmpty);
        assert_eq!(BatchFailurePolicy::default(), BatchFailurePolicy::AbortAll);
    }
}
