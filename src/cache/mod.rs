//! Cache Module
//!
//! Provides a persistent TTL cache layered over a [`KeyValueStore`].
//!
//! [`KeyValueStore`]: crate::storage::KeyValueStore

mod clock;
mod entry;
mod stats;
mod ttl_cache;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use stats::CacheStats;
pub use ttl_cache::{CacheConfig, TtlCache};

// == Public Constants ==
/// Key prefix used when none is configured
pub const DEFAULT_PREFIX: &str = "portfolio-cache";

/// Default time-to-live in seconds (one hour)
pub const DEFAULT_TTL_SECS: u64 = 3600;
