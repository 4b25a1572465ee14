use glam::Vec2;

use super::{Wall, WorldMap};

const WIDTH: f32 = 30.0;
const HEIGHT: f32 = 24.0;

/// Compiled-in default level: rectangular boundary, a central pillar, two
/// partition walls, one spawn per corner.
pub fn arena() -> WorldMap {
    let mut walls = Vec::new();

    add_boundary(&mut walls);
    add_pillar(&mut walls, Vec2::new(WIDTH / 2.0, HEIGHT / 2.0), 2.0);

    walls.push(Wall::new(Vec2::new(8.0, 6.0), Vec2::new(8.0, 18.0)));
    walls.push(Wall::new(Vec2::new(22.0, 6.0), Vec2::new(22.0, 18.0)));

    let spawns = vec![
        Vec2::new(4.0, 4.0),
        Vec2::new(WIDTH - 4.0, HEIGHT - 4.0),
        Vec2::new(4.0, HEIGHT - 4.0),
        Vec2::new(WIDTH - 4.0, 4.0),
    ];

    WorldMap::new(walls, spawns)
}

fn add_boundary(walls: &mut Vec<Wall>) {
    let corners = [
        Vec2::new(0.0, 0.0),
        Vec2::new(WIDTH, 0.0),
        Vec2::new(WIDTH, HEIGHT),
        Vec2::new(0.0, HEIGHT),
    ];

    for i in 0..corners.len() {
        walls.push(Wall::new(corners[i], corners[(i + 1) % corners.len()]));
    }
}

fn add_pillar(walls: &mut Vec<Wall>, center: Vec2, half_size: f32) {
    let corners = [
        center + Vec2::new(-half_size, -half_size),
        center + Vec2::new(half_size, -half_size),
        center + Vec2::new(half_size, half_size),
        center + Vec2::new(-half_size, half_size),
    ];

    for i in 0..corners.len() {
        walls.push(Wall::new(corners[i], corners[(i + 1) % corners.len()]));
    }
}
