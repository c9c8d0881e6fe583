#[cfg(feature = "serde_support")]
use serde::{Serialize, de::DeserializeOwned};

use crate::error::CacheResult;

#[cfg(feature = "serde_support")]
use crate::error::CacheError;

/// Key/value store holding encoded values.
#[async_trait::async_trait]
pub trait NsdeckStore: Send + Sync + 'static {
    async fn set_bytes(&self, key: String, value: Vec<u8>) -> CacheResult<()>;
    async fn get_bytes(&self, key: String) -> CacheResult<Option<Vec<u8>>>;
    async fn remove(&self, key: String) -> CacheResult<()>;
    async fn clear_all(&self) -> CacheResult<()>;

    /// Drop expired entries, returning how many went. Stores without expiry
    /// have nothing to do.
    async fn purge_expired(&self) -> CacheResult<usize> {
        Ok(0)
    }

    #[cfg(feature = "serde_support")]
    async fn set_json<S: Serialize + Send + Sync + 'static>(
        &self,
        key: String,
        value: &S,
    ) -> CacheResult<()> {
        let json_bytes = serde_json::to_vec(value).map_err(|e| CacheError::Serialize {
            key: key.clone(),
            reason: e.to_string(),
        })?;
        self.set_bytes(key, json_bytes).await
    }

    #[cfg(feature = "serde_support")]
    async fn get_json<D: DeserializeOwned + Send + Sync + 'static>(
        &self,
        key: String,
    ) -> CacheResult<Option<D>> {
        match self.get_bytes(key.clone()).await? {
            Some(bytes) => {
                let deserialized: D =
                    serde_json::from_slice(&bytes).map_err(|e| CacheError::Deserialize {
                        key,
                        reason: e.to_string(),
                    })?;
                Ok(Some(deserialized))
            }
            None => Ok(None),
        }
    }
}
