mod endpoint;
mod protocol;
mod stream;

pub use endpoint::{ChannelStats, StatsSnapshot, UdpEndpoint};
pub use protocol::{
    Datagram, DatagramPayload, InputFrame, MapData, MoveKeys, PlayerState, ProtocolError,
    SessionMessage, WallData, WorldSnapshot, DEFAULT_CLIENT_RATE, DEFAULT_TCP_PORT,
    DEFAULT_TICK_RATE, DEFAULT_UDP_PORT, MAX_DATAGRAM_SIZE, PROTOCOL_MAGIC, PROTOCOL_VERSION,
};
pub use stream::{read_message, write_message, MAX_FRAME_SIZE};
