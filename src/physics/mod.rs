//! 2D helpers for the egg-shooter demo: circle contacts, Euler integration
//! with damping, and the hex bubble grid.

use glam::Vec2;

mod hex;

pub use self::hex::{Cell, HexGrid};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

/// Axis-aligned play area. `min` is the top-left corner (screen space, y down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wall {
    Left,
    Right,
    Top,
    Bottom,
}

/// Separation data for two overlapping circles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit vector from `a` towards `b`.
    pub normal: Vec2,
    pub depth: f32,
}

/// A moving point mass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    pub fn overlaps(&self, other: &Circle) -> bool {
        let reach = self.radius + other.radius;
        self.center.distance_squared(other.center) < reach * reach
    }

    pub fn contact(&self, other: &Circle) -> Option<Contact> {
        if !self.overlaps(other) {
            return None;
        }
        let delta = other.center - self.center;
        let dist = delta.length();
        // Coincident centres push straight up.
        let normal = if dist > f32::EPSILON { delta / dist } else { Vec2::NEG_Y };
        Some(Contact {
            normal,
            depth: self.radius + other.radius - dist,
        })
    }

    /// First wall the circle touches or crosses, checked left, right, top,
    /// bottom.
    pub fn touches_wall(&self, bounds: &Bounds) -> Option<Wall> {
        if self.center.x - self.radius <= bounds.min.x {
            Some(Wall::Left)
        } else if self.center.x + self.radius >= bounds.max.x {
            Some(Wall::Right)
        } else if self.center.y - self.radius <= bounds.min.y {
            Some(Wall::Top)
        } else if self.center.y + self.radius >= bounds.max.y {
            Some(Wall::Bottom)
        } else {
            None
        }
    }
}

impl Bounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(Vec2::ZERO, Vec2::new(width, height))
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

impl Body {
    pub fn new(position: Vec2, velocity: Vec2) -> Self {
        Self { position, velocity }
    }

    /// Semi-implicit Euler step. `damping` is the fraction of velocity kept
    /// per step (1.0 = none lost).
    pub fn step(&mut self, acceleration: Vec2, damping: f32, dt: f32) {
        self.velocity = (self.velocity + acceleration * dt) * damping;
        self.position += self.velocity * dt;
    }

    /// Bounce a body of the given radius off the side walls. The top wall
    /// stops it dead (eggs stick to the ceiling). Returns the wall hit.
    pub fn reflect_off_walls(&mut self, radius: f32, bounds: &Bounds) -> Option<Wall> {
        let circle = Circle::new(self.position, radius);
        let wall = circle.touches_wall(bounds)?;
        match wall {
            Wall::Left => {
                self.position.x = bounds.min.x + radius;
                self.velocity.x = self.velocity.x.abs();
            }
            Wall::Right => {
                self.position.x = bounds.max.x - radius;
                self.velocity.x = -self.velocity.x.abs();
            }
            Wall::Top => {
                self.position.y = bounds.min.y + radius;
                self.velocity = Vec2::ZERO;
            }
            Wall::Bottom => {
                self.position.y = bounds.max.y - radius;
                self.velocity.y = -self.velocity.y.abs();
            }
        }
        Some(wall)
    }
}

/// Launch velocity for an aim angle in radians, 0 pointing straight up and
/// positive angles to the right.
pub fn launch_velocity(angle: f32, speed: f32) -> Vec2 {
    Vec2::new(angle.sin(), -angle.cos()) * speed
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn circle_overlap_is_strict() {
        let a = Circle::new(Vec2::ZERO, 1.0);
        assert!(a.overlaps(&Circle::new(Vec2::new(1.5, 0.0), 1.0)));
        assert!(!a.overlaps(&Circle::new(Vec2::new(2.0, 0.0), 1.0)));
    }

    #[test]
    fn contact_normal_and_depth() {
        let a = Circle::new(Vec2::ZERO, 2.0);
        let b = Circle::new(Vec2::new(0.0, 3.0), 2.0);
        let c = a.contact(&b).unwrap();
        assert!((c.normal - Vec2::Y).length() < EPS);
        assert!((c.depth - 1.0).abs() < EPS);
        assert!(a.contact(&Circle::new(Vec2::new(10.0, 0.0), 1.0)).is_none());
    }

    #[test]
    fn wall_detection() {
        let bounds = Bounds::from_size(100.0, 200.0);
        assert_eq!(Circle::new(Vec2::new(5.0, 100.0), 8.0).touches_wall(&bounds), Some(Wall::Left));
        assert_eq!(Circle::new(Vec2::new(95.0, 100.0), 8.0).touches_wall(&bounds), Some(Wall::Right));
        assert_eq!(Circle::new(Vec2::new(50.0, 4.0), 8.0).touches_wall(&bounds), Some(Wall::Top));
        assert_eq!(Circle::new(Vec2::new(50.0, 100.0), 8.0).touches_wall(&bounds), None);
        assert!(bounds.contains(Vec2::new(100.0, 0.0)));
        assert!(!bounds.contains(Vec2::new(-0.1, 5.0)));
    }

    #[test]
    fn euler_step_with_damping() {
        let mut body = Body::new(Vec2::ZERO, Vec2::new(10.0, 0.0));
        body.step(Vec2::new(0.0, 10.0), 0.5, 1.0);
        assert!((body.velocity - Vec2::new(5.0, 5.0)).length() < EPS);
        assert!((body.position - Vec2::new(5.0, 5.0)).length() < EPS);

        let mut free = Body::new(Vec2::ZERO, Vec2::new(1.0, 0.0));
        for _ in 0..10 {
            free.step(Vec2::ZERO, 1.0, 0.1);
        }
        assert!((free.position.x - 1.0).abs() < EPS);
    }

    #[test]
    fn side_walls_reflect_top_wall_stops() {
        let bounds = Bounds::from_size(100.0, 200.0);
        let mut body = Body::new(Vec2::new(97.0, 100.0), Vec2::new(30.0, -40.0));
        assert_eq!(body.reflect_off_walls(5.0, &bounds), Some(Wall::Right));
        assert_eq!(body.velocity, Vec2::new(-30.0, -40.0));
        assert_eq!(body.position.x, 95.0);

        let mut body = Body::new(Vec2::new(50.0, 2.0), Vec2::new(3.0, -40.0));
        assert_eq!(body.reflect_off_walls(5.0, &bounds), Some(Wall::Top));
        assert_eq!(body.velocity, Vec2::ZERO);
    }

    #[test]
    fn launch_straight_up() {
        let v = launch_velocity(0.0, 10.0);
        assert!((v - Vec2::new(0.0, -10.0)).length() < EPS);
        assert!(launch_velocity(0.5, 10.0).x > 0.0);
    }
}
