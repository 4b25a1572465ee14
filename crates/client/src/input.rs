use parking_lot::Mutex;
use skirmish::net::MoveKeys;

/// Radians of view rotation per unit of relative pointer motion.
pub const MOUSE_SENSITIVITY: f32 = 0.003;

#[derive(Debug, Default, Clone, Copy)]
struct InputState {
    keys: MoveKeys,
    rotation_delta: f32,
}

/// Collects raw input between prediction ticks. Whatever layer owns the
/// window (or a script driving the client) presses and releases keys here;
/// the prediction thread samples once per tick.
#[derive(Debug, Default)]
pub struct InputRegistry {
    state: Mutex<InputState>,
}

impl InputRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self, key: MoveKeys) {
        self.state.lock().keys.insert(key);
    }

    pub fn release(&self, key: MoveKeys) {
        self.state.lock().keys.remove(key);
    }

    /// Replaces the held set outright, for sources that track it themselves.
    pub fn set_keys(&self, keys: MoveKeys) {
        self.state.lock().keys = keys;
    }

    /// Relative pointer motion, scaled by [`MOUSE_SENSITIVITY`].
    pub fn turn(&self, motion: f32) {
        self.state.lock().rotation_delta += motion * MOUSE_SENSITIVITY;
    }

    /// Rotation already expressed in radians, for scripted movement.
    pub fn turn_radians(&self, radians: f32) {
        self.state.lock().rotation_delta += radians;
    }

    /// Reads the held keys and drains the rotation accumulated since the
    /// previous sample. Keys stay held until released.
    pub fn sample(&self) -> (MoveKeys, f32) {
        let mut state = self.state.lock();
        let rotation_delta = std::mem::take(&mut state.rotation_delta);
        (state.keys, rotation_delta)
    }
}
