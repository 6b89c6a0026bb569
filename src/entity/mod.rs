//! The entity object model.
//!
//! `User`, `Guild` and `Channel` are lazy: a shallow instance holds only its
//! ID and materializes itself (one blocking fetch, single-flight per
//! instance) on first field access. The rest — roles, emojis, games,
//! messages, reactions — only exist once a payload carried them, so they are
//! always complete.
//!
//! Identity lives in the [`storage`](crate::storage): entities are shared as
//! `Arc`s, and an in-place `update` is visible to every holder.

pub mod builder;
mod channel;
mod emoji;
mod game;
mod guild;
mod message;
mod role;
mod user;

pub use channel::{Channel, ChannelKind, RolePermissionOverwrite, UserPermissionOverwrite};
pub use emoji::CustomEmoji;
pub use game::Game;
pub use guild::{Guild, NotifyType};
pub use message::{Message, Reaction};
pub use role::Role;
pub use user::User;
