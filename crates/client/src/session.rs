use std::{
    io,
    net::{SocketAddr, TcpStream, ToSocketAddrs},
};

use skirmish::{
    map::WorldMap,
    net::{read_message, write_message, SessionMessage},
};

/// Reliable-channel session with the server. Owns the TCP stream for the
/// lifetime of the connection and the identity the server assigned us.
#[derive(Debug)]
pub struct ServerSession {
    stream: TcpStream,
    client_id: u32,
    server_udp: SocketAddr,
    map: WorldMap,
}

impl ServerSession {
    /// Connects to the server, advertises our UDP port, and waits for the
    /// assignment reply carrying our id and the map.
    pub fn connect<A: ToSocketAddrs>(server_addr: A, local_udp_port: u16) -> io::Result<Self> {
        let mut stream = TcpStream::connect(server_addr)?;

        write_message(
            &mut stream,
            &SessionMessage::ConnectionRequest {
                udp_port: local_udp_port,
            },
        )?;

        match read_message(&mut stream)? {
            SessionMessage::ConnectionAccepted {
                client_id,
                udp_port,
                map,
            } => {
                let server_udp = SocketAddr::new(stream.peer_addr()?.ip(), udp_port);
                let map = map.to_map();

                log::info!("joined as player {client_id}, snapshots from {server_udp}");

                Ok(Self {
                    stream,
                    client_id,
                    server_udp,
                    map,
                })
            }
            other => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unexpected handshake reply: {other:?}"),
            )),
        }
    }

    pub fn client_id(&self) -> u32 {
        self.client_id
    }

    /// Address the server sends snapshots from and expects input datagrams at.
    pub fn server_udp(&self) -> SocketAddr {
        self.server_udp
    }

    pub fn map(&self) -> &WorldMap {
        &self.map
    }

    /// Tells the server we are leaving so it can drop us from the simulation.
    pub fn disconnect(&mut self) -> io::Result<()> {
        write_message(
            &mut self.stream,
            &SessionMessage::Disconnect {
                client_id: self.client_id,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::thread;

    use skirmish::map::arena;
    use skirmish::net::MapData;

    use super::*;

    #[test]
    fn test_handshake_assigns_identity_and_map() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            match read_message(&mut stream).unwrap() {
                SessionMessage::ConnectionRequest { udp_port } => assert_eq!(udp_port, 40991),
                other => panic!("expected a connection request, got {other:?}"),
            }
            write_message(
                &mut stream,
                &SessionMessage::ConnectionAccepted {
                    client_id: 4,
                    udp_port: 27801,
                    map: MapData::from_map(&arena()),
                },
            )
            .unwrap();
        });

        let session = ServerSession::connect(addr, 40991).unwrap();
        assert_eq!(session.client_id(), 4);
        assert_eq!(session.server_udp().port(), 27801);
        assert_eq!(session.server_udp().ip(), addr.ip());
        assert_eq!(session.map(), &arena());
    }

    #[test]
    fn test_unexpected_reply_fails_the_connect() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            read_message(&mut stream).unwrap();
            write_message(&mut stream, &SessionMessage::Disconnect { client_id: 0 }).unwrap();
        });

        let err = ServerSession::connect(addr, 40000).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
