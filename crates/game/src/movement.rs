use glam::Vec2;

use crate::map::WorldMap;
use crate::net::{InputFrame, PlayerState};

pub const ACCELERATION: f32 = 0.01;
pub const MAX_SPEED: f32 = 0.3;
pub const FRICTION: f32 = 0.9;
pub const PLAYER_RADIUS: f32 = 0.5;

/// Kinematic state of one participant. The same integrator runs on the
/// client (prediction) and the server (authoritative); any divergence
/// between the two paths shows up as permanent reconciliation drift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerBody {
    pub id: u32,
    pub position: Vec2,
    pub velocity: Vec2,
    pub view_angle: f32,
}

impl PlayerBody {
    pub fn new(id: u32, position: Vec2) -> Self {
        Self {
            id,
            position,
            velocity: Vec2::ZERO,
            view_angle: 0.0,
        }
    }

    pub fn from_state(state: &PlayerState) -> Self {
        Self {
            id: state.id,
            position: Vec2::from(state.position),
            velocity: Vec2::from(state.velocity),
            view_angle: state.view_angle,
        }
    }

    pub fn to_state(&self) -> PlayerState {
        PlayerState {
            id: self.id,
            position: self.position.to_array(),
            velocity: self.velocity.to_array(),
            view_angle: self.view_angle,
        }
    }

    /// Authoritative overwrite of everything but the id.
    pub fn apply_state(&mut self, state: &PlayerState) {
        self.position = Vec2::from(state.position);
        self.velocity = Vec2::from(state.velocity);
        self.view_angle = state.view_angle;
    }
}

fn wish_direction(input: &InputFrame) -> Vec2 {
    let facing = Vec2::from_angle(input.view_angle);
    let mut dir = Vec2::ZERO;

    if input.forward {
        dir += facing;
    }
    if input.backward {
        dir -= facing;
    }
    if input.left {
        dir += facing.perp();
    }
    if input.right {
        dir -= facing.perp();
    }

    dir
}

/// Velocity and view-angle update for one input, leaving position alone.
/// Opposing keys cancel into the friction branch, so the normalize below
/// never sees a zero vector.
pub fn integrate(body: &mut PlayerBody, input: &InputFrame) {
    let dir = wish_direction(input);

    if dir != Vec2::ZERO {
        let velocity = body.velocity + dir.normalize() * ACCELERATION;
        body.velocity = velocity.clamp_length_max(MAX_SPEED);
    } else {
        body.velocity *= FRICTION;
    }

    body.view_angle = input.view_angle;
}

/// Prediction path: integrate and advance, no collision test.
pub fn step(body: &mut PlayerBody, input: &InputFrame) {
    integrate(body, input);
    body.position += body.velocity;
}

/// Authoritative path: integrate, then slide along the first overlapped
/// wall. Only one wall is handled per step.
pub fn step_colliding(body: &mut PlayerBody, input: &InputFrame, map: &WorldMap) {
    integrate(body, input);

    let mut tentative = body.position + body.velocity;
    if let Some(wall) = map.first_overlap(tentative, PLAYER_RADIUS) {
        let normal = wall.normal();
        body.velocity -= body.velocity.dot(normal) * normal;
        tentative = body.position + body.velocity;
    }

    body.position = tentative;
}
