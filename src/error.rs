//! Error types shared across the client.

use std::sync::Arc;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong while talking to the platform or
/// reconciling its payloads with the local entity cache.
#[derive(Debug, Error)]
pub enum Error {
    /// The remote answered, but with a non-zero code in the response envelope.
    #[error("bad response from remote (code {code}): {message}")]
    BadResponse { code: i32, message: String },

    /// Transport-level failure: connection, TLS, or an unreadable body.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A load-on-demand cache entry could not be produced even after a retry.
    /// The failure is not cached; a later lookup starts from scratch.
    #[error("unable to load resource: {0}")]
    Load(Arc<Error>),

    /// An update payload carried an ID different from the entity it was
    /// applied to. This is a caller bug, never a transient condition.
    #[error("cannot update entity {entity_id} with data for {payload_id}")]
    IdMismatch {
        entity_id: String,
        payload_id: String,
    },

    /// A payload is missing a field, or the field has the wrong type.
    #[error("malformed payload: missing or invalid field `{0}`")]
    MalformedPayload(&'static str),

    /// The remote sent an enum value this client does not know how to
    /// interpret. The factory refuses to build a half-understood entity.
    #[error("unexpected {what} value from remote: {value}")]
    UnexpectedValue { what: &'static str, value: i64 },
}

impl Error {
    /// Whether this is a permission failure (remote code 403).
    ///
    /// The guild materialization path tolerates these: the bot may have been
    /// kicked while a reference to the guild was still in flight.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Error::BadResponse { code: 403, .. })
    }
}
