mod arena;

pub use arena::arena;

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

const PARALLEL_EPSILON: f32 = 1e-9;

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("failed to read map file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse map file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("map has no walls")]
    Empty,
    #[error("wall {0} has zero length")]
    DegenerateWall(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub start: Vec2,
    pub end: Vec2,
}

impl Wall {
    pub fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }

    /// Distance along `dir` (in multiples of its length) to the nearest
    /// forward intersection with this segment, or `None` for a miss.
    pub fn ray_intersect(&self, origin: Vec2, dir: Vec2) -> Option<f32> {
        let seg = self.end - self.start;

        let denom = dir.x * seg.y - dir.y * seg.x;
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }

        let q = origin - self.start;

        // t: segment parameter (0..1), u: ray parameter (>= 0)
        let t = (dir.x * q.y - dir.y * q.x) / denom;
        let u = (seg.x * q.y - seg.y * q.x) / denom;

        ((0.0..=1.0).contains(&t) && u >= 0.0).then_some(u)
    }

    /// Whether a circle at `center` overlaps this segment, via the clamped
    /// closest-point projection.
    pub fn circle_intersect(&self, center: Vec2, radius: f32) -> bool {
        let seg = self.end - self.start;
        let t = ((center - self.start).dot(seg) / seg.length_squared()).clamp(0.0, 1.0);
        let closest = self.start + seg * t;
        center.distance_squared(closest) <= radius * radius
    }

    /// Unit perpendicular, left of the start-to-end direction.
    pub fn normal(&self) -> Vec2 {
        (self.end - self.start).perp().normalize()
    }

    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldMap {
    pub walls: Vec<Wall>,
    pub spawns: Vec<Vec2>,
}

impl WorldMap {
    pub fn new(walls: Vec<Wall>, spawns: Vec<Vec2>) -> Self {
        Self { walls, spawns }
    }

    pub fn from_json(text: &str) -> Result<Self, MapError> {
        let map: WorldMap = serde_json::from_str(text)?;
        map.validate()?;
        Ok(map)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MapError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// First wall in list order overlapped by the given circle.
    pub fn first_overlap(&self, center: Vec2, radius: f32) -> Option<&Wall> {
        self.walls
            .iter()
            .find(|wall| wall.circle_intersect(center, radius))
    }

    /// Nearest forward ray hit across all walls.
    pub fn cast_ray(&self, origin: Vec2, dir: Vec2) -> Option<f32> {
        let mut nearest: Option<f32> = None;
        for wall in &self.walls {
            if let Some(dist) = wall.ray_intersect(origin, dir) {
                if nearest.is_none_or(|n| dist < n) {
                    nearest = Some(dist);
                }
            }
        }
        nearest
    }

    fn validate(&self) -> Result<(), MapError> {
        if self.walls.is_empty() {
            return Err(MapError::Empty);
        }
        for (index, wall) in self.walls.iter().enumerate() {
            if wall.length() <= f32::EPSILON {
                return Err(MapError::DegenerateWall(index));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn horizontal_wall() -> Wall {
        Wall::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0))
    }

    #[test]
    fn test_ray_hits_segment() {
        let wall = horizontal_wall();
        let hit = wall.ray_intersect(Vec2::new(5.0, 5.0), Vec2::new(0.0, -1.0));
        assert_eq!(hit, Some(5.0));
    }

    #[test]
    fn test_ray_behind_origin_misses() {
        let wall = horizontal_wall();
        assert_eq!(
            wall.ray_intersect(Vec2::new(5.0, 5.0), Vec2::new(0.0, 1.0)),
            None
        );
    }

    #[test]
    fn test_ray_parallel_misses() {
        let wall = horizontal_wall();
        assert_eq!(
            wall.ray_intersect(Vec2::new(0.0, 1.0), Vec2::new(1.0, 0.0)),
            None
        );
    }

    #[test]
    fn test_ray_outside_segment_misses() {
        let wall = horizontal_wall();
        assert_eq!(
            wall.ray_intersect(Vec2::new(15.0, 5.0), Vec2::new(0.0, -1.0)),
            None
        );
    }

    #[test]
    fn test_circle_overlap() {
        let wall = horizontal_wall();
        assert!(wall.circle_intersect(Vec2::new(5.0, 1.0), 1.5));
        assert!(!wall.circle_intersect(Vec2::new(5.0, 2.0), 1.5));
    }

    #[test]
    fn test_circle_overlap_clamps_to_endpoint() {
        let wall = horizontal_wall();
        assert!(wall.circle_intersect(Vec2::new(-0.5, 0.0), 1.0));
        assert!(!wall.circle_intersect(Vec2::new(-2.0, 0.0), 1.0));
    }

    #[test]
    fn test_normal_is_unit_and_perpendicular() {
        let wall = horizontal_wall();
        let normal = wall.normal();
        assert!((normal.length() - 1.0).abs() < 1e-6);
        assert!(normal.dot(wall.end - wall.start).abs() < 1e-6);
        assert_eq!(normal, Vec2::new(0.0, 1.0));

        let vertical = Wall::new(Vec2::new(0.0, 0.0), Vec2::new(0.0, 5.0));
        assert_eq!(vertical.normal(), Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_first_overlap_returns_first_in_order() {
        let near = Wall::new(Vec2::new(-1.0, 1.0), Vec2::new(1.0, 1.0));
        let also_near = Wall::new(Vec2::new(-1.0, -1.0), Vec2::new(1.0, -1.0));
        let map = WorldMap::new(vec![near, also_near], vec![]);

        let hit = map.first_overlap(Vec2::ZERO, 1.5).unwrap();
        assert_eq!(*hit, near);
    }

    #[test]
    fn test_cast_ray_picks_nearest_wall() {
        let far = Wall::new(Vec2::new(0.0, 10.0), Vec2::new(10.0, 10.0));
        let near = Wall::new(Vec2::new(0.0, 5.0), Vec2::new(10.0, 5.0));
        let map = WorldMap::new(vec![far, near], vec![]);

        let dist = map.cast_ray(Vec2::new(5.0, 0.0), Vec2::new(0.0, 1.0));
        assert_eq!(dist, Some(5.0));
    }

    #[test]
    fn test_from_json_round_trip() {
        let text = r#"{
            "walls": [
                { "start": [0.0, 0.0], "end": [10.0, 0.0] },
                { "start": [10.0, 0.0], "end": [10.0, 8.0] }
            ],
            "spawns": [[2.0, 2.0], [8.0, 6.0]]
        }"#;

        let map = WorldMap::from_json(text).unwrap();
        assert_eq!(map.walls.len(), 2);
        assert_eq!(map.spawns.len(), 2);
        assert_eq!(map.spawns[0], Vec2::new(2.0, 2.0));
    }

    #[test]
    fn test_from_json_rejects_degenerate_wall() {
        let text = r#"{
            "walls": [{ "start": [1.0, 1.0], "end": [1.0, 1.0] }],
            "spawns": []
        }"#;

        assert!(matches!(
            WorldMap::from_json(text),
            Err(MapError::DegenerateWall(0))
        ));
    }

    #[test]
    fn test_from_json_rejects_empty_map() {
        let text = r#"{ "walls": [], "spawns": [] }"#;
        assert!(matches!(WorldMap::from_json(text), Err(MapError::Empty)));
    }

    #[test]
    fn test_arena_is_valid() {
        let map = arena();
        assert!(map.validate().is_ok());
        assert!(map.spawns.len() >= 2);
    }
}
