pub mod batch;
pub mod cluster;
pub mod context;
pub mod error;
pub mod ingress;
pub mod namespaces;
pub mod pipeline;
pub mod resources;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use batch::BatchFailurePolicy;
pub use cluster::{ClusterClient, KubeClusterClient};
pub use context::KubeContext;
pub use error::{BackendResult, NsdeckBackendError};
pub use pipeline::{NamespaceQuery, fetch_namespace_info, fetch_namespaces_with_ingress};
pub use types::{NamespaceInfo, NamespaceIngressInfo, ResourceUsage};
