//! The entity storage: per-kind caches with tiered retention.
//!
//! Two tiers, deliberately:
//!
//! - load on demand: `users`, `guilds`, `categories`, `text_channels` and
//!   `voice_channels` construct a shallow entity on a miss; `channels`
//!   fetches the record outright. Loads are coalesced per key and, for the
//!   fetching loader, retried once.
//! - populate only from events: `roles`, `emojis`, `messages`, `reactions`
//!   and `games` have no loader. A miss returns `None`, and the event
//!   handler that observed the payload is responsible for inserting.
//!
//! For a given key the storage hands out at most one live instance at a
//! time. Invalidation only clears the lookup table; callers still holding an
//! `Arc` keep their (now stale) instance.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::cache::{CacheConfig, TypedCache};
use crate::client::Client;
use crate::entity::builder;
use crate::entity::{Channel, CustomEmoji, Game, Guild, Message, Reaction, Role, User};
use crate::error::{Error, Result};
use crate::net::ApiRoute;

/// Separator for composite cache keys. Platform IDs are numeric tokens and
/// never contain it, which keeps `"12#3"` and `"1#23"` distinct.
const KEY_SEPARATOR: char = '#';

/// How many times a failed load is re-attempted before giving up.
const RETRY_TIMES: usize = 1;

pub struct EntityStorage {
    users: TypedCache<String, Arc<User>>,
    guilds: TypedCache<String, Arc<Guild>>,
    channels: TypedCache<String, Arc<Channel>>,
    categories: TypedCache<String, Arc<Channel>>,
    text_channels: TypedCache<String, Arc<Channel>>,
    voice_channels: TypedCache<String, Arc<Channel>>,

    roles: TypedCache<String, Arc<Role>>,
    emojis: TypedCache<String, Arc<CustomEmoji>>,
    messages: TypedCache<String, Arc<Message>>,
    reactions: TypedCache<String, Arc<Reaction>>,
    games: TypedCache<i64, Arc<Game>>,
}

impl EntityStorage {
    pub(crate) fn new() -> Self {
        Self {
            users: TypedCache::new("users", CacheConfig::transient()),
            guilds: TypedCache::new("guilds", CacheConfig::transient()),
            channels: TypedCache::new("channels", CacheConfig::resident()),
            categories: TypedCache::new("categories", CacheConfig::transient()),
            text_channels: TypedCache::new("text_channels", CacheConfig::transient()),
            voice_channels: TypedCache::new("voice_channels", CacheConfig::resident()),
            roles: TypedCache::new("roles", CacheConfig::resident()),
            emojis: TypedCache::new("emojis", CacheConfig::resident()),
            messages: TypedCache::new("messages", CacheConfig::resident()),
            reactions: TypedCache::new("reactions", CacheConfig::resident()),
            games: TypedCache::new("games", CacheConfig::resident()),
        }
    }

    // --- load on demand ---

    /// Cached user, or a fresh shallow one that will materialize on first
    /// field access.
    pub fn user(&self, id: &str) -> Arc<User> {
        self.users
            .get_with(id.to_string(), || Arc::new(User::shallow(id)))
    }

    pub fn guild(&self, id: &str) -> Arc<Guild> {
        self.guilds
            .get_with(id.to_string(), || Arc::new(Guild::shallow(id)))
    }

    pub fn category(&self, id: &str) -> Arc<Channel> {
        self.categories
            .get_with(id.to_string(), || Arc::new(Channel::shallow(id)))
    }

    pub fn text_channel(&self, id: &str) -> Arc<Channel> {
        self.text_channels
            .get_with(id.to_string(), || Arc::new(Channel::shallow(id)))
    }

    pub fn voice_channel(&self, id: &str) -> Arc<Channel> {
        self.voice_channels
            .get_with(id.to_string(), || Arc::new(Channel::shallow(id)))
    }

    /// Cached channel of any kind, fetched and built on a miss.
    ///
    /// Concurrent callers for the same missing ID share one fetch. The fetch
    /// is retried once; a second failure surfaces as [`Error::Load`] and is
    /// not cached, so a later call starts over.
    pub fn channel(&self, client: &Client, id: &str) -> Result<Arc<Channel>> {
        self.channels
            .try_get_with(id.to_string(), || {
                with_retry(|| {
                    let data = client
                        .transport()
                        .get(&ApiRoute::ChannelView { target_id: id }.to_path())?;
                    builder::build_channel(client, &data)
                })
            })
            .map_err(Error::Load)
    }

    // --- populate only from events ---

    pub fn game(&self, id: i64) -> Option<Arc<Game>> {
        self.games.get(&id)
    }

    pub fn message(&self, id: &str) -> Option<Arc<Message>> {
        self.messages.get(id)
    }

    pub fn role(&self, guild_id: &str, role_id: i64) -> Option<Arc<Role>> {
        self.roles.get(&role_key(guild_id, role_id))
    }

    pub fn emoji(&self, id: &str) -> Option<Arc<CustomEmoji>> {
        self.emojis.get(id)
    }

    pub fn reaction(
        &self,
        message_id: &str,
        emoji_id: &str,
        sender_id: &str,
    ) -> Option<Arc<Reaction>> {
        self.reactions
            .get(&reaction_key(message_id, emoji_id, sender_id))
    }

    // --- event ingestion: get-or-update ---
    //
    // Present: the existing instance is updated in place and returned, so
    // everyone already holding it sees the new fields. Absent: the payload
    // becomes a fresh complete entity.

    pub fn user_or_update(&self, id: &str, data: &Value) -> Result<Arc<User>> {
        if let Some(user) = self.users.get(id) {
            user.update(data)?;
            return Ok(user);
        }
        let user = builder::build_user(data)?;
        self.add_user(Arc::clone(&user));
        Ok(user)
    }

    pub fn guild_or_update(&self, id: &str, data: &Value) -> Result<Arc<Guild>> {
        if let Some(guild) = self.guilds.get(id) {
            guild.update(data)?;
            return Ok(guild);
        }
        let guild = builder::build_guild(data)?;
        self.add_guild(Arc::clone(&guild));
        Ok(guild)
    }

    pub fn channel_or_update(
        &self,
        client: &Client,
        id: &str,
        data: &Value,
    ) -> Result<Arc<Channel>> {
        if let Some(channel) = self.channels.get(id) {
            channel.update(client, data)?;
            return Ok(channel);
        }
        let channel = builder::build_channel(client, data)?;
        self.add_channel(Arc::clone(&channel));
        Ok(channel)
    }

    pub fn role_or_update(
        &self,
        guild_id: &str,
        role_id: i64,
        data: &Value,
    ) -> Result<Arc<Role>> {
        if let Some(role) = self.roles.get(&role_key(guild_id, role_id)) {
            role.update(data)?;
            return Ok(role);
        }
        let role = builder::build_role(guild_id, data)?;
        self.add_role(Arc::clone(&role));
        Ok(role)
    }

    pub fn emoji_or_update(&self, id: &str, data: &Value) -> Result<Arc<CustomEmoji>> {
        if let Some(emoji) = self.emojis.get(id) {
            emoji.update(data)?;
            return Ok(emoji);
        }
        let emoji = builder::build_emoji(data)?;
        self.add_emoji(Arc::clone(&emoji));
        Ok(emoji)
    }

    // --- explicit insert / invalidate ---

    pub fn add_user(&self, user: Arc<User>) {
        self.users.insert(user.id().to_string(), user);
    }

    pub fn add_guild(&self, guild: Arc<Guild>) {
        self.guilds.insert(guild.id().to_string(), guild);
    }

    pub fn add_channel(&self, channel: Arc<Channel>) {
        self.channels.insert(channel.id().to_string(), channel);
    }

    pub fn add_role(&self, role: Arc<Role>) {
        self.roles.insert(role_key(role.guild_id(), role.id()), role);
    }

    pub fn add_emoji(&self, emoji: Arc<CustomEmoji>) {
        self.emojis.insert(emoji.id().to_string(), emoji);
    }

    pub fn add_game(&self, game: Arc<Game>) {
        self.games.insert(game.id(), game);
    }

    pub fn add_message(&self, message: Arc<Message>) {
        self.messages.insert(message.id().to_string(), message);
    }

    pub fn add_reaction(&self, reaction: Arc<Reaction>) {
        self.reactions.insert(
            reaction_key(
                reaction.message_id(),
                reaction.emoji_id(),
                reaction.sender_id(),
            ),
            reaction,
        );
    }

    pub fn remove_channel(&self, id: &str) {
        self.channels.invalidate(id);
    }

    pub fn remove_guild(&self, id: &str) {
        self.guilds.invalidate(id);
    }

    pub fn remove_role(&self, role: &Role) {
        self.roles.invalidate(&role_key(role.guild_id(), role.id()));
    }

    pub fn remove_emoji(&self, emoji: &CustomEmoji) {
        self.emojis.invalidate(emoji.id());
    }

    pub fn remove_reaction(&self, reaction: &Reaction) {
        self.reactions.invalidate(&reaction_key(
            reaction.message_id(),
            reaction.emoji_id(),
            reaction.sender_id(),
        ));
    }

    /// Drop a message and every reaction recorded against it.
    pub fn remove_message(&self, id: &str) {
        self.messages.invalidate(id);
        let prefix = format!("{id}{KEY_SEPARATOR}");
        let stale: Vec<Arc<String>> = self
            .reactions
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(key, _)| key)
            .collect();
        for key in stale {
            self.reactions.invalidate(key.as_str());
        }
    }

    // --- maintenance ---

    /// Strip `user`'s per-user permission overwrite from every cached
    /// channel belonging to `guild`.
    ///
    /// Runs in time proportional to the cached-channel count; rare events
    /// (user left the guild) don't justify an index by user.
    pub fn clean_up_user_permission_overwrite(&self, guild: &Guild, user: &User) {
        debug!(guild_id = %guild.id(), user_id = %user.id(), "sweeping user permission overwrites");
        for (_, channel) in self.channels.iter() {
            if channel.cached_guild_id().as_deref() == Some(guild.id()) {
                channel.strip_user_overwrite(user.id());
            }
        }
    }
}

fn role_key(guild_id: &str, role_id: i64) -> String {
    format!("{guild_id}{KEY_SEPARATOR}{role_id}")
}

fn reaction_key(message_id: &str, emoji_id: &str, sender_id: &str) -> String {
    format!("{message_id}{KEY_SEPARATOR}{emoji_id}{KEY_SEPARATOR}{sender_id}")
}

/// Run `load`, re-attempting [`RETRY_TIMES`] more times on failure.
fn with_retry<T>(mut load: impl FnMut() -> Result<T>) -> Result<T> {
    let mut remaining = RETRY_TIMES;
    loop {
        match load() {
            Ok(value) => return Ok(value),
            Err(e) if remaining > 0 => {
                remaining -= 1;
                debug!(error = %e, "load failed, retrying");
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::{Value, json};

    use crate::net::mock::MockTransport;

    use super::*;

    fn client_with(mock: &MockTransport) -> Client {
        Client::with_transport(Box::new(mock.clone()))
    }

    fn user_payload(id: &str, name: &str) -> Value {
        json!({
            "id": id,
            "bot": false,
            "username": name,
            "identify_num": 1001,
            "status": 0,
            "is_vip": false,
            "avatar": "https://img.example/a.png",
            "vip_avatar": "",
        })
    }

    fn channel_payload(id: &str, guild_id: &str, overwrite_users: Value) -> Value {
        json!({
            "id": id,
            "user_id": "u1",
            "guild_id": guild_id,
            "permission_sync": 0,
            "name": "general",
            "level": 1,
            "is_category": true,
            "permission_overwrites": [],
            "permission_users": overwrite_users,
        })
    }

    fn overwrite_for(user_id: &str) -> Value {
        json!([{"user": user_payload(user_id, "member"), "allow": 4, "deny": 0}])
    }

    #[test]
    fn test_identity_stability() {
        let mock = MockTransport::always_err(500);
        let client = client_with(&mock);

        let first = client.storage().user("u1");
        let second = client.storage().user("u1");
        assert!(Arc::ptr_eq(&first, &second));
        // No network involved in shallow construction.
        assert_eq!(mock.calls(), 0);
    }

    #[test]
    fn test_get_or_update_preserves_identity() {
        let mock = MockTransport::always_err(500);
        let client = client_with(&mock);
        let storage = client.storage();

        let inserted = storage
            .user_or_update("u1", &user_payload("u1", "before"))
            .unwrap();
        let updated = storage
            .user_or_update("u1", &user_payload("u1", "after"))
            .unwrap();

        assert!(Arc::ptr_eq(&inserted, &updated));
        assert_eq!(updated.name(&client).unwrap(), "after");
    }

    #[test]
    fn test_update_rejects_mismatched_payload() {
        let mock = MockTransport::always_err(500);
        let client = client_with(&mock);
        let storage = client.storage();

        let user = storage
            .user_or_update("u1", &user_payload("u1", "alice"))
            .unwrap();
        let err = user.update(&user_payload("u2", "mallory")).unwrap_err();

        assert!(matches!(err, Error::IdMismatch { .. }));
        assert_eq!(user.name(&client).unwrap(), "alice");
    }

    #[test]
    fn test_at_most_one_load_per_key() {
        let mock = MockTransport::always(channel_payload("c1", "g1", json!([])));
        let client = client_with(&mock);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| client.storage().channel(&client, "c1").unwrap());
            }
        });

        assert_eq!(mock.calls(), 1);
    }

    #[test]
    fn test_retry_once_then_fail() {
        // Three scripted outcomes; only the first two may be consumed.
        let mock = MockTransport::always(channel_payload("c1", "g1", json!([])))
            .push_err(500)
            .push_err(502);
        let client = client_with(&mock);

        let err = client.storage().channel(&client, "c1").unwrap_err();
        assert!(matches!(err, Error::Load(_)));
        assert_eq!(mock.calls(), 2);
    }

    #[test]
    fn test_retry_recovers_from_single_failure() {
        let mock = MockTransport::always(channel_payload("c1", "g1", json!([]))).push_err(500);
        let client = client_with(&mock);

        let channel = client.storage().channel(&client, "c1").unwrap();
        assert_eq!(channel.id(), "c1");
        assert_eq!(mock.calls(), 2);
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let mock = MockTransport::always(channel_payload("c1", "g1", json!([])))
            .push_err(500)
            .push_err(500);
        let client = client_with(&mock);

        assert!(client.storage().channel(&client, "c1").is_err());

        // The next lookup starts from scratch and succeeds.
        let channel = client.storage().channel(&client, "c1").unwrap();
        assert_eq!(channel.id(), "c1");
        assert_eq!(mock.calls(), 3);
    }

    #[test]
    fn test_channel_loads_coalesce_and_hit_cache() {
        let mock = MockTransport::always(channel_payload("c1", "g1", json!([])));
        let client = client_with(&mock);

        let first = client.storage().channel(&client, "c1").unwrap();
        let second = client.storage().channel(&client, "c1").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(mock.calls(), 1);
    }

    #[test]
    fn test_tier_b_miss_is_absent() {
        let client = client_with(&MockTransport::always_err(500));
        let storage = client.storage();

        assert!(storage.message("m1").is_none());
        assert!(storage.game(7).is_none());
        assert!(storage.emoji("e1").is_none());
        assert!(storage.role("g1", 1).is_none());
    }

    #[test]
    fn test_composite_role_keys_do_not_collide() {
        let client = client_with(&MockTransport::always_err(500));
        let storage = client.storage();

        let role_a = json!({
            "role_id": 3, "name": "a", "color": 0, "position": 1,
            "permissions": 0, "hoist": 0, "mentionable": 0,
        });
        let role_b = json!({
            "role_id": 23, "name": "b", "color": 0, "position": 2,
            "permissions": 0, "hoist": 0, "mentionable": 0,
        });
        storage.role_or_update("12", 3, &role_a).unwrap();
        storage.role_or_update("1", 23, &role_b).unwrap();

        assert_eq!(storage.role("12", 3).unwrap().name(), "a");
        assert_eq!(storage.role("1", 23).unwrap().name(), "b");
        assert!(storage.role("1", 2).is_none());
    }

    #[test]
    fn test_remove_message_purges_its_reactions_only() {
        let client = client_with(&MockTransport::always_err(500));
        let storage = client.storage();

        storage.add_message(Arc::new(Message::new("m1", "u1", "hi", Utc::now())));
        storage.add_reaction(Arc::new(Reaction::new("m1", "e1", "u1")));
        storage.add_reaction(Arc::new(Reaction::new("m1", "e2", "u2")));
        // Same prefix characters, different message.
        storage.add_reaction(Arc::new(Reaction::new("m12", "e1", "u1")));

        storage.remove_message("m1");

        assert!(storage.message("m1").is_none());
        assert!(storage.reaction("m1", "e1", "u1").is_none());
        assert!(storage.reaction("m1", "e2", "u2").is_none());
        assert!(storage.reaction("m12", "e1", "u1").is_some());
    }

    #[test]
    fn test_overwrite_cleanup_scoped_to_guild() {
        let client = client_with(&MockTransport::always_err(500));
        let storage = client.storage();

        let with_u1_a = builder::build_channel(
            &client,
            &channel_payload("c1", "g1", overwrite_for("u1")),
        )
        .unwrap();
        let with_u1_b = builder::build_channel(
            &client,
            &channel_payload("c2", "g1", overwrite_for("u1")),
        )
        .unwrap();
        let without_u1 = builder::build_channel(
            &client,
            &channel_payload("c3", "g1", overwrite_for("u2")),
        )
        .unwrap();
        let other_guild = builder::build_channel(
            &client,
            &channel_payload("c4", "g2", overwrite_for("u1")),
        )
        .unwrap();
        for channel in [&with_u1_a, &with_u1_b, &without_u1, &other_guild] {
            storage.add_channel(Arc::clone(channel));
        }

        let guild = storage.guild("g1");
        let user = storage.user("u1");
        storage.clean_up_user_permission_overwrite(&guild, &user);

        assert!(
            with_u1_a
                .user_permission_overwrite(&client, "u1")
                .unwrap()
                .is_none()
        );
        assert!(
            with_u1_b
                .user_permission_overwrite(&client, "u1")
                .unwrap()
                .is_none()
        );
        assert!(
            without_u1
                .user_permission_overwrite(&client, "u2")
                .unwrap()
                .is_some()
        );
        assert!(
            other_guild
                .user_permission_overwrite(&client, "u1")
                .unwrap()
                .is_some()
        );
    }

    #[test]
    fn test_invalidation_spares_outstanding_references() {
        let client = client_with(&MockTransport::always_err(500));
        let storage = client.storage();

        let held = storage.guild("g1");
        storage.remove_guild("g1");

        // The holder keeps its instance; the storage hands out a new one.
        let fresh = storage.guild("g1");
        assert!(!Arc::ptr_eq(&held, &fresh));
        assert_eq!(held.id(), "g1");
    }

    #[test]
    fn test_guild_or_update_builds_when_absent() {
        let client = client_with(&MockTransport::always_err(500));
        let storage = client.storage();

        let payload = json!({
            "id": "g1",
            "name": "home",
            "enable_open": true,
            "region": "beijing",
            "master_id": "u1",
            "notify_type": 0,
            "icon": "",
        });
        let guild = storage.guild_or_update("g1", &payload).unwrap();

        assert!(guild.is_complete());
        assert_eq!(guild.name(&client).unwrap(), "home");
        // The storage now serves that same instance.
        assert!(Arc::ptr_eq(&guild, &storage.guild("g1")));
    }
}
