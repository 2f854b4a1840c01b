//! Collision geometry for hexagonal bricks
//!
//! Bricks are regular hexagons with a vertex on the +x axis. The ball is a
//! circle, so a contact is found by projecting the ball center onto each of
//! the six edges and comparing the distance with the ball radius.

use glam::Vec2;

use crate::consts::MIN_VERTICAL_SPEED;

/// Slack added to the contact distance so grazing hits still register
const CONTACT_EPSILON: f32 = 0.001;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Unit normal from the contact point toward the ball center
    pub normal: Vec2,
    /// Depth of overlap along the normal
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Axis-aligned rectangle (top-left origin, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Whether a circle's bounding box overlaps this rectangle (strict)
    pub fn overlaps_circle(&self, center: Vec2, radius: f32) -> bool {
        center.y + radius > self.y
            && center.y - radius < self.y + self.height
            && center.x + radius > self.x
            && center.x - radius < self.x + self.width
    }
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Reflect velocity and keep at least `MIN_VERTICAL_SPEED` of vertical travel
///
/// When the vertical component is lifted to the floor the horizontal one is
/// shrunk so the total speed stays what the plain reflection produced.
pub fn reflect_with_floor(velocity: Vec2, normal: Vec2) -> Vec2 {
    let reflected = reflect_velocity(velocity, normal);
    if reflected.y.abs() >= MIN_VERTICAL_SPEED {
        return reflected;
    }

    let speed = reflected.length();
    let y = if reflected.y < 0.0 {
        -MIN_VERTICAL_SPEED
    } else {
        MIN_VERTICAL_SPEED
    };
    let x_mag = (speed * speed - y * y).max(0.0).sqrt();
    Vec2::new(x_mag.copysign(reflected.x), y)
}

/// Closest point to `p` on segment `a`-`b`
///
/// A zero-length segment falls back to a unit denominator and yields `a`.
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let edge = b - a;
    let len_sq = edge.length_squared();
    let denom = if len_sq > 0.0 { len_sq } else { 1.0 };
    let t = ((p - a).dot(edge) / denom).clamp(0.0, 1.0);
    a + edge * t
}

/// Vertices of a regular hexagon, counter-clockwise from the +x axis
pub fn hex_vertices(center: Vec2, radius: f32) -> [Vec2; 6] {
    std::array::from_fn(|i| {
        let angle = std::f32::consts::FRAC_PI_3 * i as f32;
        center + Vec2::new(radius * angle.cos(), radius * angle.sin())
    })
}

/// Broad-phase test: does the ball touch the hexagon's circumcircle?
#[inline]
pub fn within_bounding_circle(ball_pos: Vec2, ball_radius: f32, center: Vec2, hex_radius: f32) -> bool {
    ball_pos.distance(center) <= hex_radius + ball_radius
}

/// Check a ball against the six edges of a hexagon
///
/// Returns the first edge (counter-clockwise from the +x vertex) whose closest
/// point lies within the ball radius. A ball entirely inside the hexagon
/// touches no edge and misses.
pub fn ball_hex_collision(
    ball_pos: Vec2,
    ball_radius: f32,
    center: Vec2,
    hex_radius: f32,
) -> CollisionResult {
    debug_assert!(ball_radius > 0.0, "ball radius must be positive");
    debug_assert!(hex_radius > 0.0, "hex radius must be positive");

    let vertices = hex_vertices(center, hex_radius);
    for i in 0..vertices.len() {
        let a = vertices[i];
        let b = vertices[(i + 1) % vertices.len()];
        let closest = closest_point_on_segment(ball_pos, a, b);
        let offset = ball_pos - closest;
        let dist = offset.length();

        if dist <= ball_radius + CONTACT_EPSILON {
            let denom = if dist > 0.0 { dist } else { 1.0 };
            return CollisionResult {
                hit: true,
                normal: offset / denom,
                penetration: ball_radius - dist,
            };
        }
    }

    CollisionResult::miss()
}
