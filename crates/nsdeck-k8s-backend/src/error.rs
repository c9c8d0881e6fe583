use thiserror::Error;

#[derive(Error, Debug)]
pub enum NsdeckBackendError {
    #[error("unable to initialize kubernetes client - please verify you can access the cluster")]
    KubeConnectionError(#[source] kube::Error),
    #[error("kubernetes api error: {0}")]
    KubeError(#[from] kube::Error),
    #[error("namespace not found: {0}")]
    NamespaceNotFound(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl NsdeckBackendError {
    /// True when the error means the requested namespace does not exist, as
    /// opposed to the cluster being unreachable.
    pub fn is_not_found(&self) -> bool {
        match self {
            NsdeckBackendError::NamespaceNotFound(_) => true,
            NsdeckBackendError::KubeError(kube::Error::Api(response)) => response.code == 404,
            _ => false,
        }
    }
}

pub type BackendResult<T> = std::result::Result<T, NsdeckBackendError>;
