//! Games (the "playing ..." activity records).

use parking_lot::RwLock;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::util::json;

#[derive(Debug, Clone)]
pub(crate) struct GameFields {
    pub name: String,
    pub icon: String,
}

/// An activity record. Keyed by a numeric ID, always complete.
#[derive(Debug)]
pub struct Game {
    id: i64,
    fields: RwLock<GameFields>,
}

impl Game {
    pub(crate) fn new(id: i64, fields: GameFields) -> Self {
        Self {
            id,
            fields: RwLock::new(fields),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> String {
        self.fields.read().name.clone()
    }

    pub fn icon(&self) -> String {
        self.fields.read().icon.clone()
    }

    /// Replace name and icon from `data`.
    pub fn update(&self, data: &Value) -> Result<()> {
        let payload_id = json::int_field(data, "id")?;
        if payload_id != self.id {
            return Err(Error::IdMismatch {
                entity_id: self.id.to_string(),
                payload_id: payload_id.to_string(),
            });
        }
        let fields = GameFields {
            name: json::str_field(data, "name")?.to_string(),
            icon: json::str_field(data, "icon")?.to_string(),
        };
        *self.fields.write() = fields;
        Ok(())
    }
}
