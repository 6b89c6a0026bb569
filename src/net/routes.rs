//! HTTP API routes the entity core touches.

use std::fmt;

/// A route plus its query parameters, rendered relative to the API base URL.
#[derive(Debug, Clone, Copy)]
pub enum ApiRoute<'a> {
    /// Full profile of one user.
    UserView { user_id: &'a str },

    /// Full record of one guild.
    GuildView { guild_id: &'a str },

    /// Full record of one channel, whatever its kind.
    ChannelView { target_id: &'a str },
}

impl ApiRoute<'_> {
    pub fn to_path(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ApiRoute<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserView { user_id } => write!(f, "user/view?user_id={user_id}"),
            Self::GuildView { guild_id } => write!(f, "guild/view?guild_id={guild_id}"),
            Self::ChannelView { target_id } => write!(f, "channel/view?target_id={target_id}"),
        }
    }
}
