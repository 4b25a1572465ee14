use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicU64, Ordering},
};

use glam::Vec2;
use parking_lot::Mutex;
use skirmish::{
    movement::{step, PlayerBody},
    net::{InputFrame, MoveKeys, PlayerState},
};

/// Corrections smaller than this are skipped so float noise between our
/// prediction and the server's result does not jitter the local player.
pub const CORRECTION_EPSILON: f32 = 0.001;

#[derive(Debug, Clone, Copy)]
struct PredictedPlayer {
    body: PlayerBody,
    keys: MoveKeys,
}

/// Client-side prediction state: the locally simulated player plus the log of
/// inputs the server has not acknowledged yet.
///
/// The prediction thread calls [`produce`](Self::produce) once per local tick;
/// the snapshot thread calls [`reconcile`](Self::reconcile) whenever a
/// snapshot carries our own state. Both paths lock `local` before `pending`.
pub struct Prediction {
    client_id: u32,
    local: Mutex<PredictedPlayer>,
    pending: Mutex<BTreeMap<u64, InputFrame>>,
    tick: AtomicU64,
}

impl Prediction {
    /// Starts at the origin; the first reconcile snaps us onto the spawn
    /// point the server picked.
    pub fn new(client_id: u32) -> Self {
        Self {
            client_id,
            local: Mutex::new(PredictedPlayer {
                body: PlayerBody::new(client_id, Vec2::ZERO),
                keys: MoveKeys::empty(),
            }),
            pending: Mutex::new(BTreeMap::new()),
            tick: AtomicU64::new(0),
        }
    }

    pub fn client_id(&self) -> u32 {
        self.client_id
    }

    /// Latest local tick, i.e. the tick of the most recent produced frame.
    pub fn tick(&self) -> u64 {
        self.tick.load(Ordering::Relaxed)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Snapshot of the predicted body for rendering and logging.
    pub fn body(&self) -> PlayerBody {
        self.local.lock().body
    }

    pub fn pose(&self) -> (Vec2, f32) {
        let local = self.local.lock();
        (local.body.position, local.body.view_angle)
    }

    /// Advances the local tick, applies the input to the predicted body, and
    /// records the frame for replay until the server acknowledges it.
    pub fn produce(&self, keys: MoveKeys, rotation_delta: f32) -> InputFrame {
        let tick = self.tick.fetch_add(1, Ordering::Relaxed) + 1;
        let mut local = self.local.lock();

        let frame = InputFrame {
            client_id: self.client_id,
            tick,
            forward: keys.contains(MoveKeys::FORWARD),
            backward: keys.contains(MoveKeys::BACKWARD),
            left: keys.contains(MoveKeys::LEFT),
            right: keys.contains(MoveKeys::RIGHT),
            rotation_delta,
            view_angle: local.body.view_angle + rotation_delta,
        };

        step(&mut local.body, &frame);
        local.keys = keys;
        self.pending.lock().insert(tick, frame);

        frame
    }

    /// Folds an authoritative state for our own player back into prediction.
    ///
    /// Acknowledged frames are always dropped. If the authoritative position
    /// disagrees with the current predicted one by more than
    /// [`CORRECTION_EPSILON`], the body snaps to the server's state and the
    /// remaining pending frames are replayed in tick order on top of it.
    pub fn reconcile(&self, own_state: &PlayerState, acked_tick: u64) {
        let mut local = self.local.lock();
        let mut pending = self.pending.lock();

        *pending = pending.split_off(&(acked_tick + 1));

        let error = local.body.position.distance(Vec2::from(own_state.position));
        if error <= CORRECTION_EPSILON {
            return;
        }

        local.body.apply_state(own_state);
        for frame in pending.values() {
            step(&mut local.body, frame);
        }
    }
}
