pub mod janitor;
pub mod store;

mod macros;

pub use janitor::{spawn_janitor, sweep, JanitorHandle, SWEEP_INTERVAL};
pub use store::{CacheEntry, Fingerprint, ResponseCache, CACHE_TTL};
