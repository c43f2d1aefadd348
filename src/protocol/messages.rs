use crate::graph::RoomId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field state that marks a passage to another room.
pub const DOOR_STATE: &str = "door";

/// One tile of a room as delivered in a state snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goto: Option<Value>,
}

impl Field {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            state: None,
            goto: None,
        }
    }

    pub fn door(x: f64, y: f64, target: RoomId) -> Self {
        Self {
            x,
            y,
            state: Some(DOOR_STATE.to_string()),
            goto: Some(Value::from(target)),
        }
    }

    /// Target room of this field when it is a door with a numeric `goto`.
    pub fn door_target(&self) -> Option<RoomId> {
        if self.state.as_deref() != Some(DOOR_STATE) {
            return None;
        }
        self.goto
            .as_ref()
            .and_then(Value::as_u64)
            .and_then(|id| RoomId::try_from(id).ok())
    }
}

/// The `room` part of an inbound state snapshot.
///
/// Snapshots carry plenty of unrelated payload; only `room.id`, `room.name`
/// and `room.fields` are read. A room id of 0 is treated as absent.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub name: Option<String>,
    /// `None` when the snapshot had no usable `fields` array.
    pub fields: Option<Vec<Field>>,
}

impl RoomSnapshot {
    pub fn from_message(message: &Value) -> Option<Self> {
        let room = message.get("room")?;
        let id = room
            .get("id")
            .and_then(Value::as_u64)
            .filter(|id| *id != 0)
            .and_then(|id| RoomId::try_from(id).ok())?;

        let name = room.get("name").and_then(Value::as_str).map(String::from);

        // Malformed entries are dropped individually rather than failing the room
        let fields = room.get("fields").and_then(Value::as_array).map(|raw| {
            raw.iter()
                .filter_map(|f| serde_json::from_value::<Field>(f.clone()).ok())
                .collect()
        });

        Some(Self { id, name, fields })
    }

    /// Build the inbound message a broker would deliver for this room.
    pub fn to_message(&self) -> Value {
        let mut room = serde_json::json!({ "id": self.id });
        if let Some(name) = &self.name {
            room["name"] = Value::from(name.clone());
        }
        if let Some(fields) = &self.fields {
            room["fields"] = serde_json::to_value(fields).unwrap_or(Value::Null);
        }
        serde_json::json!({ "room": room })
    }
}

/// Outbound command accepted by the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Command {
    Goto { room: RoomId },
}

impl Command {
    pub fn goto(room: RoomId) -> Self {
        Command::Goto { room }
    }

    pub fn target_room(&self) -> RoomId {
        match self {
            Command::Goto { room } => *room,
        }
    }
}
