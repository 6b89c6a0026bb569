//! Users.

use parking_lot::RwLock;
use serde_json::Value;
use tracing::trace;

use crate::client::Client;
use crate::entity::builder;
use crate::error::{Error, Result};
use crate::net::ApiRoute;
use crate::util::json;

/// The populated portion of a [`User`].
#[derive(Debug, Clone, Default)]
pub(crate) struct UserFields {
    pub bot: bool,
    pub name: String,
    pub identify: i32,
    pub ban: bool,
    pub vip: bool,
    pub avatar_url: String,
    pub vip_avatar_url: String,
}

/// A platform user.
///
/// Created shallow (ID only) when first referenced from another entity, or
/// complete when built from a decoded payload. Any field accessor on a
/// shallow user performs one blocking fetch; concurrent accessors block on
/// the same fetch rather than issuing their own.
#[derive(Debug)]
pub struct User {
    id: String,
    fields: RwLock<Option<UserFields>>,
}

impl User {
    pub(crate) fn shallow(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: RwLock::new(None),
        }
    }

    pub(crate) fn complete(id: impl Into<String>, fields: UserFields) -> Self {
        Self {
            id: id.into(),
            fields: RwLock::new(Some(fields)),
        }
    }

    /// The user ID. Never triggers a fetch.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the profile has been populated yet.
    pub fn is_complete(&self) -> bool {
        self.fields.read().is_some()
    }

    pub fn name(&self, client: &Client) -> Result<String> {
        self.with_fields(client, |f| f.name.clone())
    }

    pub fn identify_number(&self, client: &Client) -> Result<i32> {
        self.with_fields(client, |f| f.identify)
    }

    /// `name#identify`, the platform's display form.
    pub fn full_name(&self, client: &Client) -> Result<String> {
        self.with_fields(client, |f| format!("{}#{}", f.name, f.identify))
    }

    pub fn is_bot(&self, client: &Client) -> Result<bool> {
        self.with_fields(client, |f| f.bot)
    }

    pub fn is_banned(&self, client: &Client) -> Result<bool> {
        self.with_fields(client, |f| f.ban)
    }

    pub fn is_vip(&self, client: &Client) -> Result<bool> {
        self.with_fields(client, |f| f.vip)
    }

    pub fn avatar_url(&self, client: &Client, vip: bool) -> Result<String> {
        self.with_fields(client, |f| {
            if vip {
                f.vip_avatar_url.clone()
            } else {
                f.avatar_url.clone()
            }
        })
    }

    /// Replace every mutable field from `data`.
    ///
    /// Fails with [`Error::IdMismatch`] if the payload describes a different
    /// user; the fields are left untouched in that case.
    pub fn update(&self, data: &Value) -> Result<()> {
        let payload_id = json::str_field(data, "id")?;
        if payload_id != self.id {
            return Err(Error::IdMismatch {
                entity_id: self.id.clone(),
                payload_id: payload_id.to_string(),
            });
        }
        let fields = builder::user_fields(data)?;
        *self.fields.write() = Some(fields);
        Ok(())
    }

    fn with_fields<T: Default>(
        &self,
        client: &Client,
        f: impl FnOnce(&UserFields) -> T,
    ) -> Result<T> {
        {
            let guard = self.fields.read();
            if let Some(fields) = guard.as_ref() {
                return Ok(f(fields));
            }
        }
        // The write lock makes materialization single-flight per instance:
        // the first caller fetches, everyone else blocks here and then reads.
        let mut slot = self.fields.write();
        if slot.is_none() {
            trace!(user_id = %self.id, "materializing shallow user");
            let data = client
                .transport()
                .get(&ApiRoute::UserView { user_id: &self.id }.to_path())?;
            *slot = Some(builder::user_fields(&data)?);
        }
        Ok(slot.as_ref().map(f).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::client::Client;
    use crate::net::mock::MockTransport;

    use super::*;

    fn user_payload(id: &str) -> Value {
        json!({
            "id": id,
            "bot": false,
            "username": "alice",
            "identify_num": 1001,
            "status": 0,
            "is_vip": false,
            "avatar": "",
            "vip_avatar": "",
        })
    }

    #[test]
    fn test_concurrent_accessors_share_one_fetch() {
        let mock = MockTransport::always(user_payload("u1"));
        let client = Client::with_transport(Box::new(mock.clone()));
        let user = User::shallow("u1");

        // Many readers race on one shallow instance: the first to take the
        // write lock fetches, the rest block on it and read the result.
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| assert_eq!(user.name(&client).unwrap(), "alice"));
            }
        });

        assert_eq!(mock.calls(), 1);
        assert!(user.is_complete());
    }

    #[test]
    fn test_complete_instance_never_fetches() {
        let mock = MockTransport::always_err(500);
        let client = Client::with_transport(Box::new(mock.clone()));
        let user = User::complete(
            "u1",
            UserFields {
                name: "alice".into(),
                ..UserFields::default()
            },
        );

        assert_eq!(user.name(&client).unwrap(), "alice");
        assert_eq!(mock.calls(), 0);
    }
}
