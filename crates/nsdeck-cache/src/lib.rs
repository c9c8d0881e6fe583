pub mod error;
pub mod traits;
pub mod ttl;

pub use error::{CacheError, CacheResult};
pub use traits::NsdeckStore;
pub use ttl::{DEFAULT_TTL, TtlCache};
