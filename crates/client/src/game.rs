use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use dashmap::DashMap;
use glam::Vec2;
use skirmish::{
    Datagram, DatagramPayload, StatsSnapshot, Ticker, UdpEndpoint, WorldMap, WorldSnapshot,
};

use crate::input::InputRegistry;
use crate::prediction::Prediction;
use crate::remote::RemotePlayer;
use crate::session::ServerSession;

/// A running client: the session, the predicted local player, the remote
/// player table and the two worker threads that keep them moving.
pub struct ClientGame {
    session: ServerSession,
    endpoint: Arc<UdpEndpoint>,
    prediction: Arc<Prediction>,
    remotes: Arc<DashMap<u32, RemotePlayer>>,
    input: Arc<InputRegistry>,
    running: Arc<AtomicBool>,
    threads: Vec<JoinHandle<()>>,
}

impl ClientGame {
    /// Handshakes over TCP, binds a local datagram endpoint and starts the
    /// prediction and snapshot threads.
    pub fn connect<A: ToSocketAddrs>(server_addr: A, tick_rate: u32) -> io::Result<Self> {
        let endpoint = Arc::new(UdpEndpoint::bind(("0.0.0.0", 0))?);
        let session = ServerSession::connect(server_addr, endpoint.port())?;

        let prediction = Arc::new(Prediction::new(session.client_id()));
        let remotes = Arc::new(DashMap::new());
        let input = Arc::new(InputRegistry::new());
        let running = Arc::new(AtomicBool::new(true));

        let mut threads = Vec::new();

        {
            let endpoint = Arc::clone(&endpoint);
            let prediction = Arc::clone(&prediction);
            let remotes = Arc::clone(&remotes);
            let input = Arc::clone(&input);
            let running = Arc::clone(&running);
            let server_udp = session.server_udp();
            threads.push(thread::spawn(move || {
                prediction_loop(
                    &endpoint,
                    &prediction,
                    &remotes,
                    &input,
                    &running,
                    server_udp,
                    tick_rate,
                );
            }));
        }

        {
            let endpoint = Arc::clone(&endpoint);
            let prediction = Arc::clone(&prediction);
            let remotes = Arc::clone(&remotes);
            let running = Arc::clone(&running);
            threads.push(thread::spawn(move || {
                snapshot_loop(&endpoint, &prediction, &remotes, &running);
            }));
        }

        Ok(Self {
            session,
            endpoint,
            prediction,
            remotes,
            input,
            running,
            threads,
        })
    }

    pub fn client_id(&self) -> u32 {
        self.session.client_id()
    }

    pub fn map(&self) -> &WorldMap {
        self.session.map()
    }

    /// Where key presses and pointer motion go.
    pub fn input(&self) -> &Arc<InputRegistry> {
        &self.input
    }

    pub fn prediction(&self) -> &Arc<Prediction> {
        &self.prediction
    }

    pub fn local_pose(&self) -> (Vec2, f32) {
        self.prediction.pose()
    }

    /// Displayed poses of everyone else, for a renderer.
    pub fn remote_poses(&self) -> Vec<(u32, Vec2, f32)> {
        self.remotes
            .iter()
            .map(|remote| {
                let body = remote.body();
                (body.id, body.position, body.view_angle)
            })
            .collect()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.endpoint.stats()
    }

    /// Stops the worker threads and tells the server goodbye.
    pub fn stop(&mut self) -> io::Result<()> {
        self.running.store(false, Ordering::SeqCst);
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }
        self.session.disconnect()
    }
}

fn prediction_loop(
    endpoint: &UdpEndpoint,
    prediction: &Prediction,
    remotes: &DashMap<u32, RemotePlayer>,
    input: &InputRegistry,
    running: &AtomicBool,
    server_udp: SocketAddr,
    tick_rate: u32,
) {
    let mut ticker = Ticker::from_rate(tick_rate);
    let dt = ticker.dt();

    while running.load(Ordering::SeqCst) {
        ticker.wait();

        let (keys, rotation_delta) = input.sample();
        let frame = prediction.produce(keys, rotation_delta);

        let datagram = Datagram::new(DatagramPayload::Input(frame));
        if let Err(err) = endpoint.send_to(&datagram, server_udp) {
            log::warn!("input frame {tick} failed to send: {err}", tick = frame.tick);
        }

        for mut remote in remotes.iter_mut() {
            remote.simulate(dt);
        }
    }
}

fn snapshot_loop(
    endpoint: &UdpEndpoint,
    prediction: &Prediction,
    remotes: &DashMap<u32, RemotePlayer>,
    running: &AtomicBool,
) {
    while running.load(Ordering::SeqCst) {
        match endpoint.recv() {
            Ok(Some((datagram, _))) => {
                if let DatagramPayload::Snapshot(snapshot) = datagram.payload {
                    apply_snapshot(prediction, remotes, &snapshot);
                }
            }
            Ok(None) => {}
            Err(err) => {
                log::error!("snapshot receive failed: {err}");
                thread::sleep(Duration::from_millis(100));
            }
        }
    }
}

/// Folds one snapshot into client state: our own entry reconciles the
/// predicted player, everyone else moves their interpolation target, and
/// players missing from the snapshot have left the game.
fn apply_snapshot(
    prediction: &Prediction,
    remotes: &DashMap<u32, RemotePlayer>,
    snapshot: &WorldSnapshot,
) {
    if let Some(own) = snapshot.find_player(prediction.client_id()) {
        prediction.reconcile(own, snapshot.acked_tick);
    }

    for state in &snapshot.players {
        if state.id == prediction.client_id() {
            continue;
        }
        remotes
            .entry(state.id)
            .and_modify(|remote| remote.receive_state(state))
            .or_insert_with(|| RemotePlayer::new(state));
    }

    remotes.retain(|id, _| snapshot.find_player(*id).is_some());
}
