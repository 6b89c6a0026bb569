//! Kooklet - KOOK chat platform client library
//!
//! An object model over the platform's HTTP API, backed by lazy fetches and
//! an in-memory entity cache with identity-stable lookups.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `net` - Transport boundary (blocking HTTP, response envelope, routes)
//! - `entity` - Lazy entity types plus the factory building them from payloads
//! - `cache` - Typed caching with Moka
//! - `storage` - The per-kind entity cache with tiered retention
//! - `client` - Session object owning transport and storage
//!
//! ## Usage
//!
//! ```no_run
//! use kooklet::{Client, Config};
//!
//! let client = Client::new(&Config::from_env())?;
//!
//! // Load on demand: a shallow guild that materializes on first access.
//! let guild = client.storage().guild("1234567890");
//! println!("{}", guild.name(&client)?);
//!
//! // Event ingestion: reconcile a pushed payload with the cache.
//! # let payload = serde_json::json!({});
//! let user = client.storage().user_or_update("42", &payload)?;
//! # Ok::<(), kooklet::Error>(())
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod entity;
pub mod error;
pub mod net;
pub mod storage;
mod util;

pub use client::Client;
pub use config::Config;
pub use error::{Error, Result};
pub use storage::EntityStorage;
