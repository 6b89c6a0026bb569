//! Channels.
//!
//! The platform's category/text/voice split is a tagged [`ChannelKind`] on a
//! shared record rather than an inheritance chain; callers dispatch on the
//! kind.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::trace;

use crate::client::Client;
use crate::entity::builder;
use crate::entity::guild::Guild;
use crate::entity::user::User;
use crate::error::{Error, Result};
use crate::net::ApiRoute;
use crate::util::json;

/// A per-role allow/deny bitmask attached to a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePermissionOverwrite {
    pub role_id: i64,
    pub allow: u32,
    pub deny: u32,
}

/// A per-user allow/deny bitmask attached to a channel.
#[derive(Debug, Clone)]
pub struct UserPermissionOverwrite {
    pub user: Arc<User>,
    pub allow: u32,
    pub deny: u32,
}

/// What kind of channel this is, with the kind-specific fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ChannelKind {
    #[default]
    Category,
    Text {
        parent_id: Option<String>,
        slow_mode: i32,
        topic: String,
    },
    Voice {
        parent_id: Option<String>,
        slow_mode: i32,
        password_protected: bool,
        max_size: i32,
        quality: i32,
    },
}

impl ChannelKind {
    /// The owning category's ID, for the kinds that can have one.
    pub fn parent_id(&self) -> Option<&str> {
        match self {
            Self::Category => None,
            Self::Text { parent_id, .. } | Self::Voice { parent_id, .. } => parent_id.as_deref(),
        }
    }
}

/// The populated portion of a [`Channel`].
#[derive(Debug, Clone, Default)]
pub(crate) struct ChannelFields {
    pub master_id: String,
    pub guild_id: String,
    pub perm_sync: bool,
    pub name: String,
    pub level: i32,
    pub role_overwrites: Vec<RolePermissionOverwrite>,
    pub user_overwrites: Vec<UserPermissionOverwrite>,
    pub kind: ChannelKind,
}

/// A guild channel.
///
/// Same lazy lifecycle as [`User`]: shallow until a field is first read, then
/// complete forever. Back-references (guild, master, parent category) are
/// re-resolved through the storage by ID on every access.
#[derive(Debug)]
pub struct Channel {
    id: String,
    fields: RwLock<Option<ChannelFields>>,
}

impl Channel {
    pub(crate) fn shallow(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: RwLock::new(None),
        }
    }

    pub(crate) fn complete(id: impl Into<String>, fields: ChannelFields) -> Self {
        Self {
            id: id.into(),
            fields: RwLock::new(Some(fields)),
        }
    }

    /// The channel ID. Never triggers a fetch.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the record has been populated yet.
    pub fn is_complete(&self) -> bool {
        self.fields.read().is_some()
    }

    pub fn name(&self, client: &Client) -> Result<String> {
        self.with_fields(client, |f| f.name.clone())
    }

    pub fn level(&self, client: &Client) -> Result<i32> {
        self.with_fields(client, |f| f.level)
    }

    pub fn is_permission_sync(&self, client: &Client) -> Result<bool> {
        self.with_fields(client, |f| f.perm_sync)
    }

    pub fn kind(&self, client: &Client) -> Result<ChannelKind> {
        self.with_fields(client, |f| f.kind.clone())
    }

    /// The guild this channel belongs to, re-resolved through the storage.
    pub fn guild(&self, client: &Client) -> Result<Arc<Guild>> {
        let guild_id = self.with_fields(client, |f| f.guild_id.clone())?;
        Ok(client.storage().guild(&guild_id))
    }

    /// The channel creator, re-resolved through the storage.
    pub fn master(&self, client: &Client) -> Result<Arc<User>> {
        let master_id = self.with_fields(client, |f| f.master_id.clone())?;
        Ok(client.storage().user(&master_id))
    }

    /// The parent category, if this is a text or voice channel that has one.
    pub fn parent(&self, client: &Client) -> Result<Option<Arc<Channel>>> {
        let parent_id = self.with_fields(client, |f| f.kind.parent_id().map(str::to_string))?;
        Ok(parent_id.map(|id| client.storage().category(&id)))
    }

    pub fn role_permission_overwrites(
        &self,
        client: &Client,
    ) -> Result<Vec<RolePermissionOverwrite>> {
        self.with_fields(client, |f| f.role_overwrites.clone())
    }

    pub fn user_permission_overwrites(
        &self,
        client: &Client,
    ) -> Result<Vec<UserPermissionOverwrite>> {
        self.with_fields(client, |f| f.user_overwrites.clone())
    }

    pub fn user_permission_overwrite(
        &self,
        client: &Client,
        user_id: &str,
    ) -> Result<Option<UserPermissionOverwrite>> {
        self.with_fields(client, |f| {
            f.user_overwrites
                .iter()
                .find(|o| o.user.id() == user_id)
                .cloned()
        })
    }

    pub fn role_permission_overwrite(
        &self,
        client: &Client,
        role_id: i64,
    ) -> Result<Option<RolePermissionOverwrite>> {
        self.with_fields(client, |f| {
            f.role_overwrites
                .iter()
                .find(|o| o.role_id == role_id)
                .cloned()
        })
    }

    /// Replace the event-mutable fields (name, permission sync, overwrites)
    /// from `data`, keeping kind, level and ownership as they are.
    ///
    /// Fails with [`Error::IdMismatch`] if the payload describes a different
    /// channel; nothing is changed in that case.
    pub fn update(&self, client: &Client, data: &Value) -> Result<()> {
        let payload_id = json::str_field(data, "id")?;
        if payload_id != self.id {
            return Err(Error::IdMismatch {
                entity_id: self.id.clone(),
                payload_id: payload_id.to_string(),
            });
        }
        // A shallow channel materializes before applying the partial update.
        self.with_fields(client, |_| ())?;

        let name = json::str_field(data, "name")?.to_string();
        let perm_sync = json::int_field(data, "permission_sync")? != 0;
        let role_overwrites = builder::parse_role_overwrites(data)?;
        let user_overwrites = builder::parse_user_overwrites(client, data)?;

        let mut slot = self.fields.write();
        if let Some(fields) = slot.as_mut() {
            fields.name = name;
            fields.perm_sync = perm_sync;
            fields.role_overwrites = role_overwrites;
            fields.user_overwrites = user_overwrites;
        }
        Ok(())
    }

    /// Guild ID without triggering materialization; `None` while shallow.
    pub(crate) fn cached_guild_id(&self) -> Option<String> {
        self.fields.read().as_ref().map(|f| f.guild_id.clone())
    }

    /// Drop `user_id`'s per-user overwrite, if present. No-op while shallow.
    pub(crate) fn strip_user_overwrite(&self, user_id: &str) {
        if let Some(fields) = self.fields.write().as_mut() {
            fields.user_overwrites.retain(|o| o.user.id() != user_id);
        }
    }

    fn with_fields<T: Default>(
        &self,
        client: &Client,
        f: impl FnOnce(&ChannelFields) -> T,
    ) -> Result<T> {
        {
            let guard = self.fields.read();
            if let Some(fields) = guard.as_ref() {
                return Ok(f(fields));
            }
        }
        let mut slot = self.fields.write();
        if slot.is_none() {
            trace!(channel_id = %self.id, "materializing shallow channel");
            let data = client
                .transport()
                .get(&ApiRoute::ChannelView { target_id: &self.id }.to_path())?;
            *slot = Some(builder::channel_fields(client, &data)?);
        }
        Ok(slot.as_ref().map(f).unwrap_or_default())
    }
}
