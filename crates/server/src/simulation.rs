use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crossbeam_channel::{unbounded, Receiver, Sender};
use dashmap::DashMap;
use glam::Vec2;
use parking_lot::Mutex;

use skirmish::{step_colliding, InputFrame, PlayerBody, PlayerState, WorldMap, WorldSnapshot};

#[derive(Debug, Clone, Copy)]
pub struct ServerPlayer {
    pub body: PlayerBody,
    pub last_processed: u64,
}

struct InputQueue {
    sender: Sender<InputFrame>,
    receiver: Receiver<InputFrame>,
}

/// Authoritative world state. The tick thread is the only mutator of player
/// kinematics; handshake threads insert and remove entries, and the receive
/// thread only pushes onto the per-client queues.
pub struct Simulation {
    map: WorldMap,
    players: DashMap<u32, ServerPlayer>,
    queues: DashMap<u32, InputQueue>,
    endpoints: DashMap<u32, SocketAddr>,
    next_id: AtomicU32,
    server_tick: AtomicU64,
    registration: Mutex<()>,
}

impl Simulation {
    pub fn new(map: WorldMap) -> Self {
        Self {
            map,
            players: DashMap::new(),
            queues: DashMap::new(),
            endpoints: DashMap::new(),
            next_id: AtomicU32::new(1),
            server_tick: AtomicU64::new(0),
            registration: Mutex::new(()),
        }
    }

    pub fn map(&self) -> &WorldMap {
        &self.map
    }

    pub fn tick(&self) -> u64 {
        self.server_tick.load(Ordering::SeqCst)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Admit a client: assign the next id, place it on a spawn point and
    /// wire up its input queue and snapshot destination. Spawn points are
    /// handed out by current occupancy; past the end of the list, origin.
    pub fn register(&self, udp_addr: SocketAddr) -> u32 {
        let _guard = self.registration.lock();

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let spawn = self
            .map
            .spawns
            .get(self.players.len())
            .copied()
            .unwrap_or(Vec2::ZERO);

        let (sender, receiver) = unbounded();
        self.players.insert(
            id,
            ServerPlayer {
                body: PlayerBody::new(id, spawn),
                last_processed: 0,
            },
        );
        self.queues.insert(id, InputQueue { sender, receiver });
        self.endpoints.insert(id, udp_addr);

        id
    }

    pub fn unregister(&self, id: u32) {
        self.players.remove(&id);
        self.queues.remove(&id);
        self.endpoints.remove(&id);
    }

    /// Queue one input for the owning client. Inputs for unregistered ids
    /// are dropped.
    pub fn queue_input(&self, frame: InputFrame) {
        if let Some(queue) = self.queues.get(&frame.client_id) {
            let _ = queue.sender.send(frame);
        }
    }

    /// Advance the world one tick: drain every client's queued inputs in
    /// arrival order, stepping the shared movement model per input, then
    /// emit one snapshot per registered client carrying that client's own
    /// ack. A client with nothing queued keeps its state untouched.
    pub fn step(&self) -> Vec<(SocketAddr, WorldSnapshot)> {
        let tick = self.server_tick.fetch_add(1, Ordering::SeqCst) + 1;

        for entry in self.queues.iter() {
            let id = *entry.key();
            while let Ok(frame) = entry.value().receiver.try_recv() {
                if let Some(mut player) = self.players.get_mut(&id) {
                    step_colliding(&mut player.body, &frame, &self.map);
                    player.last_processed = frame.tick;
                }
            }
        }

        let mut states: Vec<PlayerState> = self
            .players
            .iter()
            .map(|entry| entry.value().body.to_state())
            .collect();
        states.sort_by_key(|state| state.id);

        self.endpoints
            .iter()
            .map(|entry| {
                let id = *entry.key();
                let acked_tick = self
                    .players
                    .get(&id)
                    .map(|player| player.last_processed)
                    .unwrap_or(0);

                let snapshot = WorldSnapshot {
                    server_tick: tick,
                    players: states.clone(),
                    client_id: id,
                    acked_tick,
                };

                (*entry.value(), snapshot)
            })
            .collect()
    }
}
