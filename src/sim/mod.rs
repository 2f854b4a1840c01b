//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One tick per display frame, timers driven by caller timestamps
//! - Seeded RNG only
//! - Stable iteration order (insertion order of entity collections)
//! - No rendering or platform dependencies

pub mod balls;
pub mod bricks;
pub mod geometry;
pub mod powerups;
pub mod state;
pub mod tick;
pub mod view;

pub use geometry::{CollisionResult, Rect, ball_hex_collision, reflect_velocity, reflect_with_floor};
pub use state::{
    ActiveEffect, Ball, Brick, BrickState, FieldMode, GameEvent, GamePhase, GameState, LayoutBrick,
    Paddle, Pickup, PowerupKind, RemovalCause,
};
pub use tick::{TickInput, lose_life, tick};
pub use view::{BrickPhase, FrameView};
