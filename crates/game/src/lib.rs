pub mod map;
pub mod movement;
pub mod net;
pub mod tick;

pub use map::{arena, MapError, Wall, WorldMap};
pub use movement::{
    integrate, step, step_colliding, PlayerBody, ACCELERATION, FRICTION, MAX_SPEED, PLAYER_RADIUS,
};
pub use net::{
    read_message, write_message, ChannelStats, Datagram, DatagramPayload, InputFrame, MapData,
    MoveKeys, PlayerState, ProtocolError, SessionMessage, StatsSnapshot, UdpEndpoint, WallData,
    WorldSnapshot, DEFAULT_CLIENT_RATE, DEFAULT_TCP_PORT, DEFAULT_TICK_RATE, DEFAULT_UDP_PORT,
    MAX_DATAGRAM_SIZE, MAX_FRAME_SIZE, PROTOCOL_MAGIC, PROTOCOL_VERSION,
};
pub use tick::Ticker;
