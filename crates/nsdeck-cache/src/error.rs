use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("failed to serialize value for key '{key}': {reason}")]
    Serialize { key: String, reason: String },
    #[error("failed to deserialize value for key '{key}': {reason}")]
    Deserialize { key: String, reason: String },
}

pub type CacheResult<T> = std::result::Result<T, CacheError>;
