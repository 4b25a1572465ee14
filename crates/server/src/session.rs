use std::io;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use skirmish::{read_message, write_message, MapData, SessionMessage};

use crate::simulation::Simulation;

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(100);
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Accept loop for the reliable channel. Each connection gets its own
/// handler thread that runs the handshake and then waits for the goodbye.
/// Handlers read blocking; shutdown wakes them by closing their sockets.
pub fn spawn_listener(
    listener: TcpListener,
    simulation: Arc<Simulation>,
    udp_port: u16,
    running: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        if let Err(e) = listener.set_nonblocking(true) {
            log::error!("session listener setup failed: {}", e);
            return;
        }

        let mut handlers: Vec<(TcpStream, JoinHandle<()>)> = Vec::new();

        while running.load(Ordering::SeqCst) {
            handlers.retain(|(_, handler)| !handler.is_finished());

            match listener.accept() {
                Ok((stream, peer)) => {
                    // Keep a second handle on the socket so shutdown can
                    // close it out from under a blocked read.
                    let wake = match stream.try_clone() {
                        Ok(wake) => wake,
                        Err(e) => {
                            log::error!("session setup for {} failed: {}", peer, e);
                            continue;
                        }
                    };
                    let simulation = Arc::clone(&simulation);
                    let handler = thread::spawn(move || {
                        handle_session(stream, peer, simulation, udp_port);
                    });
                    handlers.push((wake, handler));
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    log::error!("accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        for (wake, handler) in handlers {
            let _ = wake.shutdown(Shutdown::Both);
            let _ = handler.join();
        }
    })
}

fn handle_session(
    mut stream: TcpStream,
    peer: SocketAddr,
    simulation: Arc<Simulation>,
    udp_port: u16,
) {
    // Accepted streams inherit the listener's nonblocking mode on some
    // platforms; session reads rely on blocking semantics.
    let setup = stream
        .set_nonblocking(false)
        .and_then(|_| stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT)));
    if let Err(e) = setup {
        log::error!("session setup for {} failed: {}", peer, e);
        return;
    }

    // First frame must be the connection request; anything else drops the
    // connection without registering.
    let client_udp_port = match read_message(&mut stream) {
        Ok(SessionMessage::ConnectionRequest { udp_port }) => udp_port,
        Ok(other) => {
            log::warn!("unexpected first message from {}: {:?}", peer, other);
            return;
        }
        Err(e) => {
            log::warn!("handshake with {} failed: {}", peer, e);
            return;
        }
    };

    let udp_addr = SocketAddr::new(peer.ip(), client_udp_port);
    let client_id = simulation.register(udp_addr);

    let accepted = SessionMessage::ConnectionAccepted {
        client_id,
        udp_port,
        map: MapData::from_map(simulation.map()),
    };
    if let Err(e) = write_message(&mut stream, &accepted) {
        log::warn!("failed to accept {}: {}", peer, e);
        simulation.unregister(client_id);
        return;
    }

    log::info!(
        "client {} connected from {} (snapshots to {})",
        client_id,
        peer,
        udp_addr
    );

    // A frame may trickle in across several segments; blocking reads
    // assemble it without dropping bytes. Shutdown interrupts the wait
    // by closing the socket from the listener thread.
    let _ = stream.set_read_timeout(None);

    loop {
        match read_message(&mut stream) {
            Ok(SessionMessage::Disconnect { client_id: id }) if id == client_id => {
                simulation.unregister(client_id);
                log::info!("client {} disconnected", client_id);
                return;
            }
            Ok(other) => {
                log::debug!("ignoring session message from client {}: {:?}", client_id, other);
            }
            Err(ref e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::TimedOut => {}
            Err(ref e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                // Stream lost without a goodbye; the player stays in the
                // world until a proper disconnect.
                log::info!("session with client {} closed", client_id);
                return;
            }
            Err(e) => {
                log::warn!("session with client {} errored: {}", client_id, e);
                return;
            }
        }
    }
}
