//! Cache plumbing built on Moka.
//!
//! The entity storage keeps one [`TypedCache`] per entity kind, with one of
//! two retention policies:
//!
//! - [`CacheConfig::transient`] for entities that can always be rebuilt from
//!   an ID (shallow construction or a single fetch),
//! - [`CacheConfig::resident`] for entities that only exist because an event
//!   carried them; a miss there is final.

mod config;
mod typed;

pub use config::CacheConfig;
pub use typed::TypedCache;
