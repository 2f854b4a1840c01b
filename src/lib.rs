//! Hexanoid - hexagonal-brick arcade simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, brick field, power-ups, game state)
//! - `settings`: Operator configuration (base speed, mode, field size)
//! - `level`: Level descriptor loading for the fixed-layout mode
//! - `highscores`: Best-run leaderboard

pub mod highscores;
pub mod level;
pub mod settings;
pub mod sim;

pub use highscores::HighScores;
pub use level::{Level, LevelError};
pub use settings::{GameMode, Settings, SettingsError};

/// Game configuration constants
///
/// Distances are in field pixels, speeds in pixels per frame and times in
/// milliseconds of the caller-supplied clock.
pub mod consts {
    /// Circumradius of every hexagonal brick
    pub const HEX_RADIUS: f32 = 24.0;
    /// Horizontal slot spacing for row placement
    pub const MIN_SPACING: f32 = HEX_RADIUS * 2.8;
    /// Candidates closer than this to an existing brick are dropped
    pub const OVERLAP_FACTOR: f32 = 0.8;
    pub const MIN_BRICKS_PER_ROW: usize = 2;
    pub const MAX_BRICKS_PER_ROW: usize = 5;
    /// Palette bricks pick from at spawn
    pub const BRICK_COLORS: [&str; 6] = [
        "#c94c4c", "#4cc98a", "#4c7ac9", "#c9c24c", "#4cc9c6", "#c84cc9",
    ];

    /// Power-up drop chance per spawned brick
    pub const BASE_POWERUP_CHANCE: f32 = 0.15;
    pub const POWERUP_CHANCE_STEP: f32 = 0.02;
    pub const MAX_POWERUP_CHANCE: f32 = 0.35;

    /// Brick fall speed (px/frame) and its operator-adjustable range
    pub const DEFAULT_BRICK_SPEED: f32 = 0.08;
    pub const MIN_BRICK_SPEED: f32 = 0.02;
    pub const MAX_BRICK_SPEED: f32 = 0.2;
    /// Difficulty ramp
    pub const SPEED_INCREASE_INTERVAL_MS: f64 = 30_000.0;
    pub const SPEED_INCREASE_AMOUNT: f32 = 0.02;
    /// Brick advance multiplier while nothing is fully on screen
    pub const FAST_APPEARANCE_MULTIPLIER: f32 = 25.0;
    pub const NORMAL_SPEED_MULTIPLIER: f32 = 1.0;

    /// A new row spawns this often
    pub const SPAWN_INTERVAL_MS: f64 = 1800.0;
    /// Row offsets above the field (the opening row sits a bit higher)
    pub const INITIAL_ROW_Y: f32 = -HEX_RADIUS * 3.0;
    pub const SPAWN_ROW_Y: f32 = -HEX_RADIUS * 2.0;
    /// Dying bricks are purged after this long
    pub const REMOVE_ANIMATION_MS: f64 = 360.0;
    /// Split point of the dying animation (swell, then shrink)
    pub const REMOVE_SWELL_MS: f64 = 120.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 8.0;
    pub const BALL_LAUNCH_SPEED: f32 = 4.0;
    /// Launch point as a fraction of field height
    pub const BALL_LAUNCH_HEIGHT: f32 = 0.7;
    pub const TRAIL_LENGTH: usize = 18;
    /// Paddle bounces never leave the ball slower than this
    pub const MIN_BOUNCE_SPEED: f32 = 2.2;
    /// Reflections never leave less vertical speed than this
    pub const MIN_VERTICAL_SPEED: f32 = 1.2;
    /// Maximum launch angle off vertical from the paddle edge (60°)
    pub const PADDLE_MAX_ANGLE: f32 = std::f32::consts::PI / 3.0;
    /// Total width of the random launch jitter (±2.5°)
    pub const PADDLE_ANGLE_JITTER: f32 = std::f32::consts::PI / 36.0;
    /// Vertical speed gain on a bottom-wall bounce
    pub const BOTTOM_WALL_BOOST: f32 = 1.1;

    /// Paddle defaults
    pub const PADDLE_WIDTH_FRACTION: f32 = 0.14;
    pub const PADDLE_MIN_WIDTH: f32 = 60.0;
    pub const PADDLE_MAX_WIDTH: f32 = 260.0;
    pub const PADDLE_HEIGHT: f32 = 12.0;
    pub const PADDLE_SPEED: f32 = 8.0;
    pub const PADDLE_BOTTOM_OFFSET: f32 = 30.0;
    /// Loss line distance above the field bottom
    pub const LOSS_LINE_OFFSET: f32 = 60.0;

    /// Falling pickups
    pub const PICKUP_RADIUS: f32 = 10.0;
    pub const PICKUP_FALL_SPEED: f32 = 2.0;

    /// Scoring and lives
    pub const SCORE_BRICK: u64 = 100;
    pub const SCORE_PIERCE: u64 = 150;
    pub const STARTING_LIVES: u8 = 3;

    /// Smallest playable field
    pub const MIN_FIELD_WIDTH: f32 = 300.0;
    pub const MIN_FIELD_HEIGHT: f32 = 200.0;
    pub const DEFAULT_FIELD_WIDTH: f32 = 800.0;
    pub const DEFAULT_FIELD_HEIGHT: f32 = 600.0;
}
