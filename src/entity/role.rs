//! Guild roles.
//!
//! Roles are never fetched by ID; they exist in the cache only because an
//! event or an explicit call carried them, so they are always complete.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::client::Client;
use crate::entity::guild::Guild;
use crate::error::{Error, Result};
use crate::util::json;

#[derive(Debug, Clone)]
pub(crate) struct RoleFields {
    pub name: String,
    pub color: i32,
    pub position: i32,
    pub permissions: u32,
    pub hoist: bool,
    pub mentionable: bool,
}

/// A role, scoped to its guild (there is no standalone role lookup).
#[derive(Debug)]
pub struct Role {
    guild_id: String,
    role_id: i64,
    fields: RwLock<RoleFields>,
}

impl Role {
    pub(crate) fn new(guild_id: impl Into<String>, role_id: i64, fields: RoleFields) -> Self {
        Self {
            guild_id: guild_id.into(),
            role_id,
            fields: RwLock::new(fields),
        }
    }

    pub fn id(&self) -> i64 {
        self.role_id
    }

    pub fn guild_id(&self) -> &str {
        &self.guild_id
    }

    /// The owning guild, re-resolved through the storage.
    pub fn guild(&self, client: &Client) -> Arc<Guild> {
        client.storage().guild(&self.guild_id)
    }

    pub fn name(&self) -> String {
        self.fields.read().name.clone()
    }

    pub fn color(&self) -> i32 {
        self.fields.read().color
    }

    pub fn position(&self) -> i32 {
        self.fields.read().position
    }

    pub fn permissions(&self) -> u32 {
        self.fields.read().permissions
    }

    pub fn is_hoist(&self) -> bool {
        self.fields.read().hoist
    }

    pub fn is_mentionable(&self) -> bool {
        self.fields.read().mentionable
    }

    /// Replace every mutable field from `data`.
    ///
    /// Fails with [`Error::IdMismatch`] if the payload carries a different
    /// `role_id`; the fields are left untouched in that case.
    pub fn update(&self, data: &Value) -> Result<()> {
        let payload_id = json::int_field(data, "role_id")?;
        if payload_id != self.role_id {
            return Err(Error::IdMismatch {
                entity_id: self.role_id.to_string(),
                payload_id: payload_id.to_string(),
            });
        }
        let fields = super::builder::role_fields(data)?;
        *self.fields.write() = fields;
        Ok(())
    }
}
