use std::collections::HashMap;
use std::fmt;

use glam::Vec2;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActorId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// The server hands out ids as strings, but numeric ids (and zero values
// normalized from "") show up too. Both collapse to the same textual id.
impl<'de> Deserialize<'de> for ActorId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Self(text),
            RawId::Number(number) => Self(number.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    Player,
    Ball,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub kind: ActorKind,
}

impl Actor {
    pub fn new(id: impl Into<String>, kind: ActorKind) -> Self {
        Self {
            id: ActorId::new(id),
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ActorState {
    #[serde(rename = "pos", with = "xy")]
    pub position: Vec2,
    #[serde(rename = "vel", with = "xy", default)]
    pub velocity: Vec2,
}

impl ActorState {
    pub fn new(position: Vec2, velocity: Vec2) -> Self {
        Self { position, velocity }
    }
}

mod xy {
    use glam::Vec2;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Xy {
        x: f32,
        y: f32,
    }

    pub fn serialize<S: Serializer>(vector: &Vec2, serializer: S) -> Result<S::Ok, S::Error> {
        Xy {
            x: vector.x,
            y: vector.y,
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec2, D::Error> {
        let Xy { x, y } = Xy::deserialize(deserializer)?;
        Ok(Vec2::new(x, y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Greeting,
    Spawn,
    Despawn,
    WorldUpdate,
    Ping,
}

impl Opcode {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "Greeting" => Some(Self::Greeting),
            "Spawn" => Some(Self::Spawn),
            "Despawn" => Some(Self::Despawn),
            "WorldUpdate" => Some(Self::WorldUpdate),
            "Ping" => Some(Self::Ping),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "Greeting",
            Self::Spawn => "Spawn",
            Self::Despawn => "Despawn",
            Self::WorldUpdate => "WorldUpdate",
            Self::Ping => "Ping",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Greeting {
    pub own_id: ActorId,
    pub actors: Vec<Actor>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldUpdate {
    #[serde(default)]
    pub actors: HashMap<ActorId, ActorState>,
    #[serde(default, deserialize_with = "command_id")]
    pub last_input: Option<u32>,
}

// Ids may arrive as integral floats (`5.0`). Anything that is not a whole
// command id reads as no acknowledgement so the snapshot itself survives.
fn command_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_f64)
        .filter(|id| id.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(id))
        .map(|id| id as u32))
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Greeting(Greeting),
    Spawn(Actor),
    Despawn(ActorId),
    WorldUpdate(WorldUpdate),
    Ping(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub body: ServerMessage,
    pub tick: Option<f64>,
    pub server_time: Option<f64>,
}

impl Message {
    pub fn opcode(&self) -> Opcode {
        match self.body {
            ServerMessage::Greeting(_) => Opcode::Greeting,
            ServerMessage::Spawn(_) => Opcode::Spawn,
            ServerMessage::Despawn(_) => Opcode::Despawn,
            ServerMessage::WorldUpdate(_) => Opcode::WorldUpdate,
            ServerMessage::Ping(_) => Opcode::Ping,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    MoveUp,
    MoveDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCommand {
    pub id: u32,
    pub command: CommandKind,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Command(ClientCommand),
    PingEcho(Value),
}

impl Outbound {
    pub fn encode(&self) -> Result<String, ProtocolError> {
        let result = match self {
            Self::Command(command) => serde_json::to_string(command),
            Self::PingEcho(token) => serde_json::to_string(&serde_json::json!({
                "opcode": Opcode::Ping.as_str(),
                "payload": token,
            })),
        };
        result.map_err(ProtocolError::Encode)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("unknown opcode {0}")]
    UnknownOpcode(String),
    #[error("invalid {} payload: {source}", .opcode.as_str())]
    Payload {
        opcode: Opcode,
        source: serde_json::Error,
    },
    #[error("encoding failed: {0}")]
    Encode(#[source] serde_json::Error),
}

#[derive(Deserialize)]
struct RawFrame {
    opcode: Value,
    #[serde(default)]
    payload: Value,
    #[serde(default)]
    tick: Option<f64>,
    #[serde(default)]
    server_time: Option<f64>,
}

/// Every empty-string value becomes 0. Keys are left alone.
pub fn normalize(value: Value) -> Value {
    match value {
        Value::String(text) if text.is_empty() => Value::from(0),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(key, value)| (key, normalize(value)))
                .collect(),
        ),
        other => other,
    }
}

pub fn decode(frame: &str) -> Result<Message, ProtocolError> {
    let tree: Value = serde_json::from_str(frame).map_err(ProtocolError::Malformed)?;

    // Ping tokens go back to the server exactly as they arrived.
    let token = tree.get("payload").cloned().unwrap_or(Value::Null);

    let raw: RawFrame = serde_json::from_value(normalize(tree)).map_err(ProtocolError::Malformed)?;

    let opcode = raw
        .opcode
        .as_str()
        .and_then(Opcode::parse)
        .ok_or_else(|| ProtocolError::UnknownOpcode(opcode_name(&raw.opcode)))?;

    let body = match opcode {
        Opcode::Greeting => {
            let (own_id, actors) = payload(opcode, raw.payload)?;
            ServerMessage::Greeting(Greeting { own_id, actors })
        }
        Opcode::Spawn => ServerMessage::Spawn(payload(opcode, raw.payload)?),
        Opcode::Despawn => ServerMessage::Despawn(payload(opcode, raw.payload)?),
        Opcode::WorldUpdate => ServerMessage::WorldUpdate(payload(opcode, raw.payload)?),
        Opcode::Ping => ServerMessage::Ping(token),
    };

    Ok(Message {
        body,
        tick: raw.tick,
        server_time: raw.server_time,
    })
}

fn opcode_name(opcode: &Value) -> String {
    match opcode {
        Value::String(name) => name.clone(),
        other => other.to_string(),
    }
}

fn payload<T: DeserializeOwned>(opcode: Opcode, value: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(value).map_err(|source| ProtocolError::Payload { opcode, source })
}
