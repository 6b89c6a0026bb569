//! Custom emojis.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::client::Client;
use crate::entity::guild::Guild;
use crate::error::{Error, Result};
use crate::util::json;

/// A guild's custom emoji. Always complete; there is no fetch-by-ID.
///
/// The owning guild, when there is one, is embedded in the emoji ID itself
/// as a `{guild_id}/` prefix.
#[derive(Debug)]
pub struct CustomEmoji {
    id: String,
    name: RwLock<String>,
}

impl CustomEmoji {
    pub(crate) fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: RwLock::new(name.into()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> String {
        self.name.read().clone()
    }

    /// The owning guild's ID, if the emoji ID carries one.
    pub fn guild_id(&self) -> Option<&str> {
        self.id.split_once('/').map(|(guild_id, _)| guild_id)
    }

    /// The owning guild, re-resolved through the storage. The returned guild
    /// may be one the bot can no longer see; its materialization tolerates
    /// that (403 leaves it shallow) rather than failing here.
    pub fn guild(&self, client: &Client) -> Option<Arc<Guild>> {
        self.guild_id().map(|id| client.storage().guild(id))
    }

    /// Replace the name from `data`.
    ///
    /// Fails with [`Error::IdMismatch`] if the payload describes a different
    /// emoji; nothing is changed in that case.
    pub fn update(&self, data: &Value) -> Result<()> {
        let payload_id = json::str_field(data, "id")?;
        if payload_id != self.id {
            return Err(Error::IdMismatch {
                entity_id: self.id.clone(),
                payload_id: payload_id.to_string(),
            });
        }
        *self.name.write() = json::str_field(data, "name")?.to_string();
        Ok(())
    }
}
