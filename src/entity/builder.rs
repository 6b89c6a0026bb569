//! The entity factory: decoded payloads in, complete entities out.
//!
//! Constructors are pure given the payload, except that cross-referenced
//! entities (a channel's overwrite users) are resolved through the storage.
//! A constructor must never look up the key it is currently building for,
//! or the per-key load coalescing in the storage would deadlock on itself.

use std::sync::Arc;

use serde_json::Value;

use crate::client::Client;
use crate::error::{Error, Result};
use crate::util::json;

use super::channel::{
    Channel, ChannelFields, ChannelKind, RolePermissionOverwrite, UserPermissionOverwrite,
};
use super::emoji::CustomEmoji;
use super::game::{Game, GameFields};
use super::guild::{Guild, GuildFields, NotifyType};
use super::role::{Role, RoleFields};
use super::user::{User, UserFields};

pub fn build_user(data: &Value) -> Result<Arc<User>> {
    let id = json::str_field(data, "id")?;
    Ok(Arc::new(User::complete(id, user_fields(data)?)))
}

pub(crate) fn user_fields(data: &Value) -> Result<UserFields> {
    Ok(UserFields {
        bot: json::bool_field(data, "bot")?,
        name: json::str_field(data, "username")?.to_string(),
        identify: json::int_field(data, "identify_num")? as i32,
        // Account status 10 means banned.
        ban: json::int_field(data, "status")? == 10,
        vip: json::bool_field(data, "is_vip")?,
        avatar_url: json::str_field(data, "avatar")?.to_string(),
        vip_avatar_url: json::str_field(data, "vip_avatar")?.to_string(),
    })
}

pub fn build_guild(data: &Value) -> Result<Arc<Guild>> {
    let id = json::str_field(data, "id")?;
    Ok(Arc::new(Guild::complete(id, guild_fields(data)?)))
}

pub(crate) fn guild_fields(data: &Value) -> Result<GuildFields> {
    let raw_notify = json::int_field(data, "notify_type")?;
    let notify_type = NotifyType::from_value(raw_notify).ok_or(Error::UnexpectedValue {
        what: "notify_type",
        value: raw_notify,
    })?;
    // Fetch payloads name the owner `master_id`, event payloads `user_id`.
    let master_id = json::str_field(data, "master_id")
        .or_else(|_| json::str_field(data, "user_id"))?
        .to_string();
    Ok(GuildFields {
        name: json::str_field(data, "name")?.to_string(),
        public: json::bool_field(data, "enable_open")?,
        region: json::str_field(data, "region")?.to_string(),
        master_id,
        notify_type,
        avatar_url: json::str_field(data, "icon")?.to_string(),
    })
}

pub fn build_channel(client: &Client, data: &Value) -> Result<Arc<Channel>> {
    let id = json::str_field(data, "id")?;
    Ok(Arc::new(Channel::complete(
        id,
        channel_fields(client, data)?,
    )))
}

pub(crate) fn channel_fields(client: &Client, data: &Value) -> Result<ChannelFields> {
    let kind = if json::bool_field(data, "is_category")? {
        ChannelKind::Category
    } else {
        let parent_id = parse_parent_id(data)?;
        match json::int_field(data, "type")? {
            1 => ChannelKind::Text {
                parent_id,
                slow_mode: json::int_field(data, "slow_mode")? as i32,
                topic: json::str_field(data, "topic")?.to_string(),
            },
            2 => ChannelKind::Voice {
                parent_id,
                slow_mode: json::int_field(data, "slow_mode")? as i32,
                password_protected: data
                    .get("has_password")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                max_size: json::int_field(data, "limit_amount")? as i32,
                quality: json::int_field(data, "voice_quality")? as i32,
            },
            value => {
                return Err(Error::UnexpectedValue {
                    what: "channel type",
                    value,
                });
            }
        }
    };
    Ok(ChannelFields {
        master_id: json::str_field(data, "user_id")?.to_string(),
        guild_id: json::str_field(data, "guild_id")?.to_string(),
        perm_sync: json::int_field(data, "permission_sync")? != 0,
        name: json::str_field(data, "name")?.to_string(),
        level: json::int_field(data, "level")? as i32,
        role_overwrites: parse_role_overwrites(data)?,
        user_overwrites: parse_user_overwrites(client, data)?,
        kind,
    })
}

fn parse_parent_id(data: &Value) -> Result<Option<String>> {
    let raw = json::str_field(data, "parent_id")?;
    // "" and "0" both mean "no category".
    Ok(match raw {
        "" | "0" => None,
        id => Some(id.to_string()),
    })
}

pub fn build_role(guild_id: &str, data: &Value) -> Result<Arc<Role>> {
    let role_id = json::int_field(data, "role_id")?;
    Ok(Arc::new(Role::new(guild_id, role_id, role_fields(data)?)))
}

pub(crate) fn role_fields(data: &Value) -> Result<RoleFields> {
    Ok(RoleFields {
        name: json::str_field(data, "name")?.to_string(),
        color: json::int_field(data, "color")? as i32,
        position: json::int_field(data, "position")? as i32,
        permissions: json::int_field(data, "permissions")? as u32,
        hoist: json::int_field(data, "hoist")? == 1,
        mentionable: json::int_field(data, "mentionable")? == 1,
    })
}

pub fn build_emoji(data: &Value) -> Result<Arc<CustomEmoji>> {
    Ok(Arc::new(CustomEmoji::new(
        json::str_field(data, "id")?,
        json::str_field(data, "name")?,
    )))
}

pub fn build_game(data: &Value) -> Result<Arc<Game>> {
    let id = json::int_field(data, "id")?;
    Ok(Arc::new(Game::new(
        id,
        GameFields {
            name: json::str_field(data, "name")?.to_string(),
            icon: json::str_field(data, "icon")?.to_string(),
        },
    )))
}

pub(crate) fn parse_role_overwrites(data: &Value) -> Result<Vec<RolePermissionOverwrite>> {
    json::array_field(data, "permission_overwrites")?
        .iter()
        .map(|entry| {
            Ok(RolePermissionOverwrite {
                role_id: json::int_field(entry, "role_id")?,
                allow: json::int_field(entry, "allow")? as u32,
                deny: json::int_field(entry, "deny")? as u32,
            })
        })
        .collect()
}

/// Parse per-user overwrites, resolving each embedded user through the
/// storage so the overwrite points at the cache's instance of that user.
pub(crate) fn parse_user_overwrites(
    client: &Client,
    data: &Value,
) -> Result<Vec<UserPermissionOverwrite>> {
    json::array_field(data, "permission_users")?
        .iter()
        .map(|entry| {
            let raw_user = json::field(entry, "user")?;
            let user_id = json::str_field(raw_user, "id")?;
            let user = client.storage().user_or_update(user_id, raw_user)?;
            Ok(UserPermissionOverwrite {
                user,
                allow: json::int_field(entry, "allow")? as u32,
                deny: json::int_field(entry, "deny")? as u32,
            })
        })
        .collect()
}
