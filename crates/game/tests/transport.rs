use std::net::{SocketAddr, TcpListener, TcpStream, UdpSocket};
use std::sync::atomic::{AtomicU16, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use skirmish::{
    arena, read_message, write_message, Datagram, DatagramPayload, InputFrame, MapData, MoveKeys,
    PlayerState, SessionMessage, UdpEndpoint, WorldSnapshot,
};

static PORT_COUNTER: AtomicU16 = AtomicU16::new(41000);

fn next_port() -> u16 {
    PORT_COUNTER.fetch_add(10, Ordering::SeqCst)
}

fn wait_for_datagram(endpoint: &UdpEndpoint, timeout_ms: u64) -> Option<(Datagram, SocketAddr)> {
    let start = Instant::now();
    while start.elapsed() < Duration::from_millis(timeout_ms) {
        if let Some(received) = endpoint.recv().unwrap() {
            return Some(received);
        }
    }
    None
}

#[test]
fn test_input_datagram_exchange() {
    let port = next_port();
    let server_addr: SocketAddr = format!("127.0.0.1:{}", port).parse().unwrap();
    let client_addr: SocketAddr = format!("127.0.0.1:{}", port + 1).parse().unwrap();

    let server_endpoint = UdpEndpoint::bind(server_addr).unwrap();
    let client_endpoint = UdpEndpoint::bind(client_addr).unwrap();

    let frame = InputFrame::movement(7, 42, MoveKeys::FORWARD | MoveKeys::RIGHT, 0.25);
    let datagram = Datagram::new(DatagramPayload::Input(frame));
    client_endpoint.send_to(&datagram, server_addr).unwrap();

    let (received, from_addr) =
        wait_for_datagram(&server_endpoint, 500).expect("no datagram received");
    assert_eq!(from_addr, client_addr);
    match received.payload {
        DatagramPayload::Input(decoded) => {
            assert_eq!(decoded.client_id, 7);
            assert_eq!(decoded.tick, 42);
            assert!(decoded.forward);
            assert!(decoded.right);
            assert!(!decoded.backward);
        }
        _ => panic!("expected input payload"),
    }

    let mut snapshot = WorldSnapshot::new(100);
    snapshot.client_id = 7;
    snapshot.acked_tick = 42;
    snapshot.players.push(PlayerState {
        id: 7,
        position: [4.0, 4.0],
        velocity: [0.0, 0.0],
        view_angle: 0.25,
    });

    let reply = Datagram::new(DatagramPayload::Snapshot(snapshot));
    server_endpoint.send_to(&reply, from_addr).unwrap();

    let (received, _) = wait_for_datagram(&client_endpoint, 500).expect("no datagram received");
    match received.payload {
        DatagramPayload::Snapshot(snap) => {
            assert_eq!(snap.server_tick, 100);
            assert_eq!(snap.acked_tick, 42);
            assert_eq!(snap.players.len(), 1);
            assert_eq!(snap.players[0].id, 7);
        }
        _ => panic!("expected snapshot payload"),
    }
}

#[test]
fn test_foreign_traffic_dropped() {
    let port = next_port();
    let server_addr: SocketAddr = format!("127.0.0.1:{}", port).parse().unwrap();

    let server_endpoint = UdpEndpoint::bind(server_addr).unwrap();
    let sender = UdpSocket::bind(format!("127.0.0.1:{}", port + 1)).unwrap();

    sender.send_to(b"not a datagram", server_addr).unwrap();

    let mut stale = Datagram::new(DatagramPayload::Input(InputFrame::movement(
        1,
        1,
        MoveKeys::FORWARD,
        0.0,
    )));
    stale.magic = 0x0BAD_0BAD;
    sender
        .send_to(&stale.encode().unwrap(), server_addr)
        .unwrap();

    let valid = Datagram::new(DatagramPayload::Input(InputFrame::movement(
        2,
        9,
        MoveKeys::LEFT,
        1.0,
    )));
    sender
        .send_to(&valid.encode().unwrap(), server_addr)
        .unwrap();

    let (received, _) = wait_for_datagram(&server_endpoint, 500).expect("no datagram received");
    match received.payload {
        DatagramPayload::Input(decoded) => assert_eq!(decoded.client_id, 2),
        _ => panic!("expected input payload"),
    }

    let stats = server_endpoint.stats();
    assert_eq!(stats.datagrams_received, 1);
    assert_eq!(stats.discarded, 2);
}

#[test]
fn test_session_handshake_over_tcp() {
    let port = next_port();
    let listen_addr: SocketAddr = format!("127.0.0.1:{}", port).parse().unwrap();
    let listener = TcpListener::bind(listen_addr).unwrap();

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();

        let request = read_message(&mut stream).unwrap();
        match request {
            SessionMessage::ConnectionRequest { udp_port } => assert_eq!(udp_port, 50123),
            other => panic!("expected connection request, got {:?}", other),
        }

        let accepted = SessionMessage::ConnectionAccepted {
            client_id: 1,
            udp_port: 27801,
            map: MapData::from_map(&arena()),
        };
        write_message(&mut stream, &accepted).unwrap();

        let goodbye = read_message(&mut stream).unwrap();
        assert_eq!(goodbye, SessionMessage::Disconnect { client_id: 1 });
    });

    let mut stream = TcpStream::connect(listen_addr).unwrap();
    write_message(
        &mut stream,
        &SessionMessage::ConnectionRequest { udp_port: 50123 },
    )
    .unwrap();

    match read_message(&mut stream).unwrap() {
        SessionMessage::ConnectionAccepted {
            client_id,
            udp_port,
            map,
        } => {
            assert_eq!(client_id, 1);
            assert_eq!(udp_port, 27801);

            let world = map.to_map();
            let reference = arena();
            assert_eq!(world.walls.len(), reference.walls.len());
            assert_eq!(world.spawns, reference.spawns);
        }
        other => panic!("expected acceptance, got {:?}", other),
    }

    write_message(&mut stream, &SessionMessage::Disconnect { client_id: 1 }).unwrap();
    server.join().unwrap();
}

#[test]
fn test_oversized_datagram_rejected() {
    let port = next_port();
    let server_addr: SocketAddr = format!("127.0.0.1:{}", port).parse().unwrap();
    let endpoint = UdpEndpoint::bind(format!("127.0.0.1:{}", port + 1)).unwrap();

    let mut snapshot = WorldSnapshot::new(1);
    for id in 0..200u32 {
        snapshot.players.push(PlayerState {
            id,
            position: [0.0, 0.0],
            velocity: [0.0, 0.0],
            view_angle: 0.0,
        });
    }

    let datagram = Datagram::new(DatagramPayload::Snapshot(snapshot));
    let err = endpoint.send_to(&datagram, server_addr).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
}
