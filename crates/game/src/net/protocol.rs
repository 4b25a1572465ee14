use bitflags::bitflags;
use glam::Vec2;
use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize, rancor};

use crate::map::{Wall, WorldMap};

pub const MAX_DATAGRAM_SIZE: usize = 1200;
pub const PROTOCOL_VERSION: u16 = 1;
pub const PROTOCOL_MAGIC: u32 = 0x534B_524D;
pub const DEFAULT_TCP_PORT: u16 = 27800;
pub const DEFAULT_UDP_PORT: u16 = 27801;
pub const DEFAULT_TICK_RATE: u32 = 30;
pub const DEFAULT_CLIENT_RATE: u32 = 60;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MoveKeys: u8 {
        const FORWARD = 1 << 0;
        const BACKWARD = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
    }
}

/// One discrete input sample. `tick` is the producing client's own counter
/// and strictly increases; `view_angle` is the post-rotation angle, applied
/// as-is on the server rather than accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct InputFrame {
    pub client_id: u32,
    pub tick: u64,
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub rotation_delta: f32,
    pub view_angle: f32,
}

impl InputFrame {
    pub fn movement(client_id: u32, tick: u64, keys: MoveKeys, view_angle: f32) -> Self {
        Self {
            client_id,
            tick,
            forward: keys.contains(MoveKeys::FORWARD),
            backward: keys.contains(MoveKeys::BACKWARD),
            left: keys.contains(MoveKeys::LEFT),
            right: keys.contains(MoveKeys::RIGHT),
            rotation_delta: 0.0,
            view_angle,
        }
    }

    pub fn rotation(client_id: u32, tick: u64, rotation_delta: f32, view_angle: f32) -> Self {
        Self {
            client_id,
            tick,
            forward: false,
            backward: false,
            left: false,
            right: false,
            rotation_delta,
            view_angle,
        }
    }

    pub fn keys(&self) -> MoveKeys {
        let mut keys = MoveKeys::empty();
        keys.set(MoveKeys::FORWARD, self.forward);
        keys.set(MoveKeys::BACKWARD, self.backward);
        keys.set(MoveKeys::LEFT, self.left);
        keys.set(MoveKeys::RIGHT, self.right);
        keys
    }

    #[inline]
    pub fn any_movement(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct PlayerState {
    pub id: u32,
    pub position: [f32; 2],
    pub velocity: [f32; 2],
    pub view_angle: f32,
}

/// Full-state broadcast for one server tick. The same player array fans out
/// to every client; only `client_id` and `acked_tick` vary per addressee.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct WorldSnapshot {
    pub server_tick: u64,
    pub players: Vec<PlayerState>,
    pub client_id: u32,
    pub acked_tick: u64,
}

impl WorldSnapshot {
    pub fn new(server_tick: u64) -> Self {
        Self {
            server_tick,
            players: Vec::new(),
            client_id: 0,
            acked_tick: 0,
        }
    }

    pub fn find_player(&self, id: u32) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct WallData {
    pub start: [f32; 2],
    pub end: [f32; 2],
}

/// Wire form of the static world, delivered once during the handshake.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct MapData {
    pub walls: Vec<WallData>,
    pub spawns: Vec<[f32; 2]>,
}

impl MapData {
    pub fn from_map(map: &WorldMap) -> Self {
        Self {
            walls: map
                .walls
                .iter()
                .map(|w| WallData {
                    start: w.start.to_array(),
                    end: w.end.to_array(),
                })
                .collect(),
            spawns: map.spawns.iter().map(|s| s.to_array()).collect(),
        }
    }

    pub fn to_map(&self) -> WorldMap {
        WorldMap::new(
            self.walls
                .iter()
                .map(|w| Wall::new(Vec2::from(w.start), Vec2::from(w.end)))
                .collect(),
            self.spawns.iter().map(|s| Vec2::from(*s)).collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum DatagramPayload {
    Input(InputFrame),
    Snapshot(WorldSnapshot),
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct Datagram {
    pub magic: u32,
    pub version: u16,
    pub payload: DatagramPayload,
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("serialization failed: {0}")]
    Serialize(rancor::Error),
    #[error("deserialization failed: {0}")]
    Deserialize(rancor::Error),
}

impl Datagram {
    pub fn new(payload: DatagramPayload) -> Self {
        Self {
            magic: PROTOCOL_MAGIC,
            version: PROTOCOL_VERSION,
            payload,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == PROTOCOL_MAGIC && self.version == PROTOCOL_VERSION
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(ProtocolError::Serialize)
    }

    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        // Archive access requires an aligned buffer; receive paths hand
        // over arbitrary slices.
        let mut aligned = AlignedVec::<16>::new();
        aligned.extend_from_slice(data);
        rkyv::from_bytes::<Self, rancor::Error>(&aligned).map_err(ProtocolError::Deserialize)
    }
}

/// Reliable-channel traffic: one-time setup and teardown.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum SessionMessage {
    ConnectionRequest { udp_port: u16 },
    ConnectionAccepted { client_id: u32, udp_port: u16, map: MapData },
    Disconnect { client_id: u32 },
}

impl SessionMessage {
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(ProtocolError::Serialize)
    }

    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        let mut aligned = AlignedVec::<16>::new();
        aligned.extend_from_slice(data);
        rkyv::from_bytes::<Self, rancor::Error>(&aligned).map_err(ProtocolError::Deserialize)
    }
}
