use skirmish::{movement::PlayerBody, net::PlayerState};

/// How quickly a remote player's displayed pose homes in on its snapshot
/// target, in fraction-per-second terms before the per-tick cap.
pub const CORRECTION_SPEED: f32 = 10.0;

/// A player simulated elsewhere. Snapshots move the target; the displayed
/// pose chases it a little every local tick so remote players glide instead
/// of teleporting between snapshots.
#[derive(Debug, Clone, Copy)]
pub struct RemotePlayer {
    current: PlayerBody,
    target: PlayerBody,
}

impl RemotePlayer {
    /// A newly seen player starts directly on its reported state.
    pub fn new(state: &PlayerState) -> Self {
        let body = PlayerBody::from_state(state);
        Self {
            current: body,
            target: body,
        }
    }

    /// Updates the target only; the displayed pose is owned by
    /// [`simulate`](Self::simulate).
    pub fn receive_state(&mut self, state: &PlayerState) {
        self.target = PlayerBody::from_state(state);
    }

    /// Blends the displayed pose toward the target by `dt` seconds worth of
    /// correction. Velocity is taken verbatim from the target since nothing
    /// downstream integrates it.
    pub fn simulate(&mut self, dt: f32) {
        let blend = (dt * CORRECTION_SPEED).min(1.0);

        self.current.position = self.current.position.lerp(self.target.position, blend);
        self.current.view_angle += (self.target.view_angle - self.current.view_angle) * blend;
        self.current.velocity = self.target.velocity;
    }

    /// The displayed state, as a renderer should draw it.
    pub fn body(&self) -> PlayerBody {
        self.current
    }
}
