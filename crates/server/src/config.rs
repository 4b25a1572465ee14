use std::path::PathBuf;

use skirmish::{DEFAULT_TCP_PORT, DEFAULT_TICK_RATE, DEFAULT_UDP_PORT};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub tcp_port: u16,
    pub udp_port: u16,
    pub tick_rate: u32,
    pub map_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            tcp_port: DEFAULT_TCP_PORT,
            udp_port: DEFAULT_UDP_PORT,
            tick_rate: DEFAULT_TICK_RATE,
            map_path: None,
        }
    }
}
