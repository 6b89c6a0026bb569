//! Guilds.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::trace;

use crate::client::Client;
use crate::entity::builder;
use crate::entity::user::User;
use crate::error::{Error, Result};
use crate::net::ApiRoute;
use crate::util::json;

/// How members are notified of guild activity by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotifyType {
    #[default]
    Default,
    All,
    MentionOnly,
    Muted,
}

impl NotifyType {
    /// Map the wire value, `None` for anything unknown.
    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Default),
            1 => Some(Self::All),
            2 => Some(Self::MentionOnly),
            3 => Some(Self::Muted),
            _ => None,
        }
    }
}

/// The populated portion of a [`Guild`].
#[derive(Debug, Clone, Default)]
pub(crate) struct GuildFields {
    pub name: String,
    pub public: bool,
    pub region: String,
    pub master_id: String,
    pub notify_type: NotifyType,
    pub avatar_url: String,
}

/// A guild.
///
/// Materialization differs from the other lazy entities in one way: a 403
/// from the remote is swallowed and the guild stays shallow, modeling "the
/// bot was kicked while a reference was in flight". While shallow, accessors
/// return the field's default value, and each access re-attempts the fetch
/// (access can be restored remotely without an explicit refresh here).
#[derive(Debug)]
pub struct Guild {
    id: String,
    fields: RwLock<Option<GuildFields>>,
}

impl Guild {
    pub(crate) fn shallow(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: RwLock::new(None),
        }
    }

    pub(crate) fn complete(id: impl Into<String>, fields: GuildFields) -> Self {
        Self {
            id: id.into(),
            fields: RwLock::new(Some(fields)),
        }
    }

    /// The guild ID. Never triggers a fetch.
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

    pub fn is_public(&self, client: &Client) -> Result<bool> {
        self.with_fields(client, |f| f.public)
    }

    pub fn voice_server_region(&self, client: &Client) -> Result<String> {
        self.with_fields(client, |f| f.region.clone())
    }

    pub fn notify_type(&self, client: &Client) -> Result<NotifyType> {
        self.with_fields(client, |f| f.notify_type)
    }

    pub fn avatar_url(&self, client: &Client) -> Result<String> {
        self.with_fields(client, |f| f.avatar_url.clone())
    }

    /// The guild owner, re-resolved through the storage by remembered ID so
    /// a replaced cache entry is picked up on the next access.
    pub fn master(&self, client: &Client) -> Result<Arc<User>> {
        let master_id = self.with_fields(client, |f| f.master_id.clone())?;
        Ok(client.storage().user(&master_id))
    }

    /// Replace every mutable field from `data`.
    ///
    /// Fails with [`Error::IdMismatch`] if the payload describes a different
    /// guild; the fields are left untouched in that case.
    pub fn update(&self, data: &Value) -> Result<()> {
        let payload_id = json::str_field(data, "id")?;
        if payload_id != self.id {
            return Err(Error::IdMismatch {
                entity_id: self.id.clone(),
                payload_id: payload_id.to_string(),
            });
        }
        let fields = builder::guild_fields(data)?;
        *self.fields.write() = Some(fields);
        Ok(())
    }

    fn with_fields<T: Default>(
        &self,
        client: &Client,
        f: impl FnOnce(&GuildFields) -> T,
    ) -> Result<T> {
        {
            let guard = self.fields.read();
            if let Some(fields) = guard.as_ref() {
                return Ok(f(fields));
            }
        }
        let mut slot = self.fields.write();
        if slot.is_none() {
            trace!(guild_id = %self.id, "materializing shallow guild");
            let fetched = client
                .transport()
                .get(&ApiRoute::GuildView { guild_id: &self.id }.to_path())
                .and_then(|data| builder::guild_fields(&data));
            match fetched {
                Ok(fields) => *slot = Some(fields),
                // Kicked mid-flight: stay shallow, surface nothing.
                Err(e) if e.is_forbidden() => {
                    trace!(guild_id = %self.id, "guild fetch forbidden, staying shallow");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(slot.as_ref().map(f).unwrap_or_default())
    }
}
