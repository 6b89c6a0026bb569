//! The client: one explicit owner for the transport and the entity storage.

use crate::config::Config;
use crate::error::Result;
use crate::net::{HttpTransport, Transport};
use crate::storage::EntityStorage;

/// A session against the platform.
///
/// Owns the transport and the [`EntityStorage`]; anything needing lookups
/// borrows the client rather than reaching for a process-wide singleton.
pub struct Client {
    transport: Box<dyn Transport>,
    storage: EntityStorage,
}

impl Client {
    /// Build a client speaking HTTP per `config`.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_transport(Box::new(HttpTransport::new(config)?)))
    }

    /// Build a client over an arbitrary transport.
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            storage: EntityStorage::new(),
        }
    }

    pub fn storage(&self) -> &EntityStorage {
        &self.storage
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }
}
