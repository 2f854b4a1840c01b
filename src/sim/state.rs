//! Game state and core simulation types
//!
//! Everything a match mutates lives in [`GameState`]; the stage functions in
//! `bricks`, `balls`, `powerups` and `tick` take it explicitly.

use std::collections::{BTreeMap, VecDeque};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::bricks::spawn_row;
use super::geometry::Rect;
use crate::consts::*;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Running,
    /// Simulation gated, rendering continues
    Paused,
    /// Lives exhausted (terminal until restart)
    GameOver,
    /// Fixed layout cleared (terminal until restart)
    LevelComplete,
}

impl GamePhase {
    /// Whether the match has ended
    pub fn is_terminal(self) -> bool {
        matches!(self, GamePhase::GameOver | GamePhase::LevelComplete)
    }
}

/// How the brick field is fed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldMode {
    /// Endless procedurally spawned rows
    Procedural,
    /// A fixed layout placed at match start, no row spawning
    FixedLayout(Vec<LayoutBrick>),
}

/// One brick of a fixed layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutBrick {
    pub pos: Vec2,
    pub color: String,
    pub powerup: Option<PowerupKind>,
}

/// A ball entity
#[derive(Debug, Clone)]
pub struct Ball {
    pub id: u32,
    pub pos: Vec2,
    /// Velocity in px/frame
    pub vel: Vec2,
    pub radius: f32,
    /// Pierce mode (destroys bricks without bouncing)
    pub pierce: bool,
    /// Recent positions, oldest first (rendering only)
    pub trail: VecDeque<Vec2>,
}

impl Ball {
    pub fn new(id: u32, pos: Vec2, vel: Vec2) -> Self {
        Self {
            id,
            pos,
            vel,
            radius: BALL_RADIUS,
            pierce: false,
            trail: VecDeque::with_capacity(TRAIL_LENGTH + 1),
        }
    }

    /// Record current position to trail, evicting the oldest point
    pub fn record_trail(&mut self) {
        self.trail.push_back(self.pos);
        while self.trail.len() > TRAIL_LENGTH {
            self.trail.pop_front();
        }
    }

    /// Clear trail (on reset)
    pub fn clear_trail(&mut self) {
        self.trail.clear();
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }
}

/// Why a brick started dying
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalCause {
    /// Bounced off by a normal ball (scored at purge)
    Struck,
    /// Destroyed by a pierce ball (scored at contact)
    Pierced,
    /// Crossed the loss line (costs a life, never scores)
    Breached,
}

/// Brick lifecycle: falling, then dying for the removal animation, then gone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BrickState {
    Falling,
    Dying { since: f64, cause: RemovalCause },
}

/// A hexagonal brick
#[derive(Debug, Clone)]
pub struct Brick {
    pub id: u32,
    /// Hexagon center
    pub pos: Vec2,
    pub color: String,
    pub state: BrickState,
    /// Power-up dropped when the brick is purged
    pub powerup: Option<PowerupKind>,
    /// Shared by every brick spawned in the same row
    pub row_id: u32,
}

impl Brick {
    pub fn new(id: u32, pos: Vec2, color: impl Into<String>, powerup: Option<PowerupKind>, row_id: u32) -> Self {
        Self {
            id,
            pos,
            color: color.into(),
            state: BrickState::Falling,
            powerup,
            row_id,
        }
    }

    /// Not yet hit
    #[inline]
    pub fn is_falling(&self) -> bool {
        matches!(self.state, BrickState::Falling)
    }

    /// Top edge of the circumcircle
    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y - HEX_RADIUS
    }

    /// Bottom edge of the circumcircle
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + HEX_RADIUS
    }

    /// Start the removal animation; a brick already dying keeps its first cause
    pub fn mark_dying(&mut self, now: f64, cause: RemovalCause) {
        if self.is_falling() {
            self.state = BrickState::Dying { since: now, cause };
        }
    }
}

/// The player's paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Keyboard nudge per frame
    pub speed: f32,
}

impl Paddle {
    /// Paddle sized and centred for a field
    pub fn for_field(width: f32, height: f32) -> Self {
        let mut paddle = Self {
            x: 0.0,
            y: 0.0,
            width: PADDLE_MIN_WIDTH,
            height: PADDLE_HEIGHT,
            speed: PADDLE_SPEED,
        };
        paddle.fit_field(width, height);
        paddle.x = (width - paddle.width) / 2.0;
        paddle
    }

    /// Recompute width and y for a field size and keep x in bounds
    pub fn fit_field(&mut self, width: f32, height: f32) {
        self.width = (width * PADDLE_WIDTH_FRACTION)
            .floor()
            .clamp(PADDLE_MIN_WIDTH, PADDLE_MAX_WIDTH);
        self.y = height - PADDLE_BOTTOM_OFFSET;
        self.x = self.x.clamp(0.0, (width - self.width).max(0.0));
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Center the paddle on an absolute pointer x, clamped to the field
    pub fn center_on(&mut self, pointer_x: f32, field_width: f32) {
        self.x = (pointer_x - self.width / 2.0).clamp(0.0, (field_width - self.width).max(0.0));
    }

    /// Keyboard movement: `direction` is -1 (left) or +1 (right)
    pub fn nudge(&mut self, direction: f32, field_width: f32) {
        self.x = (self.x + direction * self.speed).clamp(0.0, (field_width - self.width).max(0.0));
    }
}

/// Power-up catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerupKind {
    /// One extra ball from the paddle (instant)
    MultiBall,
    /// Two extra balls at mirrored angles (instant)
    Triple,
    /// Stops brick advance once a brick is fully visible
    Freeze,
    /// Balls destroy bricks without bouncing
    Pierce,
    /// Balls bounce off the field bottom instead of being lost
    BottomWall,
}

impl PowerupKind {
    pub const ALL: [Self; 5] = [
        Self::MultiBall,
        Self::Freeze,
        Self::Pierce,
        Self::Triple,
        Self::BottomWall,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::MultiBall => "multiball",
            Self::Triple => "triple",
            Self::Freeze => "freeze",
            Self::Pierce => "pierce",
            Self::BottomWall => "bottomwall",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::MultiBall => "Multiball",
            Self::Triple => "Triple",
            Self::Freeze => "Freeze",
            Self::Pierce => "Pierce",
            Self::BottomWall => "Bottom Wall",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::MultiBall => "#ff6b6b",
            Self::Triple => "#f39c12",
            Self::Freeze => "#4d96ff",
            Self::Pierce => "#9b59b6",
            Self::BottomWall => "#1abc9c",
        }
    }

    pub fn indicator_color(self) -> &'static str {
        match self {
            Self::MultiBall => "#ff4444",
            other => other.color(),
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::MultiBall => "⚽",
            Self::Triple => "🔶",
            Self::Freeze => "❄️",
            Self::Pierce => "💥",
            Self::BottomWall => "⬇️",
        }
    }

    /// Effect duration; `None` for instant (one-shot) kinds
    pub fn duration_ms(self) -> Option<f64> {
        match self {
            Self::MultiBall | Self::Triple => None,
            Self::Freeze => Some(8_000.0),
            Self::Pierce => Some(12_000.0),
            Self::BottomWall => Some(15_000.0),
        }
    }

    #[inline]
    pub fn is_instant(self) -> bool {
        self.duration_ms().is_none()
    }
}

/// A falling pickup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: u32,
    pub kind: PowerupKind,
    pub pos: Vec2,
    pub radius: f32,
    /// Downward speed in px/frame
    pub speed: f32,
}

/// A running durational effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub start_ms: f64,
    pub duration_ms: f64,
}

impl ActiveEffect {
    pub fn is_expired(&self, now: f64) -> bool {
        now - self.start_ms > self.duration_ms
    }

    /// Remaining time as a fraction of the full duration, in [0, 1]
    pub fn remaining_fraction(&self, now: f64) -> f32 {
        let remaining = (self.duration_ms - (now - self.start_ms)).max(0.0);
        (remaining / self.duration_ms).clamp(0.0, 1.0) as f32
    }
}

/// Notifications produced during a tick (cleared at the start of each tick)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    BrickDestroyed { pierced: bool },
    BrickBreached,
    LifeLost { remaining: u8 },
    BallLost,
    BottomWallBounce { x: f32 },
    BallsAdded { count: u32 },
    PowerupActivated(PowerupKind),
    PowerupRenewed(PowerupKind),
    PowerupExpired(PowerupKind),
    SpeedIncreased { speed: f32 },
    GameOver { score: u64, elapsed_ms: f64 },
    LevelComplete { score: u64 },
}

/// Complete match state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Match seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub mode: FieldMode,
    pub phase: GamePhase,
    pub field_width: f32,
    pub field_height: f32,
    /// Bricks whose bottom crosses this y cost a life
    pub loss_line: f32,
    pub lives: u8,
    pub score: u64,
    pub paddle: Paddle,
    pub balls: Vec<Ball>,
    pub bricks: Vec<Brick>,
    pub pickups: Vec<Pickup>,
    /// Keys are exactly the running durational power-ups
    pub effects: BTreeMap<PowerupKind, ActiveEffect>,
    /// Balls bounce off the bottom while set
    pub bottom_wall_active: bool,
    /// Operator-chosen starting fall speed
    pub base_brick_speed: f32,
    /// Current fall speed (ramps up over time)
    pub brick_speed: f32,
    /// Current per-brick power-up drop chance
    pub powerup_chance: f32,
    /// True while no falling brick has fully cleared the top edge
    pub fast_appearance: bool,
    pub start_ms: f64,
    /// Timestamp of the latest tick
    pub now_ms: f64,
    pub last_spawn_ms: f64,
    pub last_speed_increase_ms: f64,
    /// Elapsed time frozen at the terminal transition
    pub final_elapsed_ms: Option<f64>,
    pub events: Vec<GameEvent>,
    pub frame: u64,
    next_id: u32,
    next_row_id: u32,
}

fn clamp_brick_speed(speed: f32) -> f32 {
    let clamped = speed.clamp(MIN_BRICK_SPEED, MAX_BRICK_SPEED);
    if clamped != speed {
        log::warn!("Base brick speed {speed} clamped to {clamped}");
    }
    clamped
}

impl GameState {
    /// Create a procedural match on a field of the given size
    pub fn new(seed: u64, field_width: f32, field_height: f32, now: f64) -> Self {
        Self::with_mode(seed, field_width, field_height, FieldMode::Procedural, now)
    }

    pub fn with_mode(seed: u64, field_width: f32, field_height: f32, mode: FieldMode, now: f64) -> Self {
        Self::configured(seed, field_width, field_height, mode, DEFAULT_BRICK_SPEED, now)
    }

    /// Create a match with an operator-chosen base speed
    ///
    /// The match is initialised exactly once, so the opening row and ball
    /// match what [`GameState::new`] would draw from the same seed.
    pub fn configured(
        seed: u64,
        field_width: f32,
        field_height: f32,
        mode: FieldMode,
        base_brick_speed: f32,
        now: f64,
    ) -> Self {
        let base_brick_speed = clamp_brick_speed(base_brick_speed);
        let field_width = field_width.max(MIN_FIELD_WIDTH);
        let field_height = field_height.max(MIN_FIELD_HEIGHT);
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            mode,
            phase: GamePhase::Running,
            field_width,
            field_height,
            loss_line: field_height - LOSS_LINE_OFFSET,
            lives: STARTING_LIVES,
            score: 0,
            paddle: Paddle::for_field(field_width, field_height),
            balls: Vec::new(),
            bricks: Vec::new(),
            pickups: Vec::new(),
            effects: BTreeMap::new(),
            bottom_wall_active: false,
            base_brick_speed,
            brick_speed: base_brick_speed,
            powerup_chance: BASE_POWERUP_CHANCE,
            fast_appearance: true,
            start_ms: now,
            now_ms: now,
            last_spawn_ms: now,
            last_speed_increase_ms: now,
            final_elapsed_ms: None,
            events: Vec::new(),
            frame: 0,
            next_id: 1,
            next_row_id: 1,
        };
        state.reset_match(now);
        state
    }

    /// Re-initialise to a fresh match, keeping field size, mode and base speed
    pub fn reset_match(&mut self, now: f64) {
        self.phase = GamePhase::Running;
        self.lives = STARTING_LIVES;
        self.score = 0;
        self.balls.clear();
        self.bricks.clear();
        self.pickups.clear();
        self.effects.clear();
        self.bottom_wall_active = false;
        self.brick_speed = self.base_brick_speed;
        self.powerup_chance = BASE_POWERUP_CHANCE;
        self.fast_appearance = true;
        self.start_ms = now;
        self.now_ms = now;
        self.last_spawn_ms = now;
        self.last_speed_increase_ms = now;
        self.final_elapsed_ms = None;
        self.frame = 0;

        let vel = self.random_launch_velocity();
        self.spawn_ball(self.launch_point(), vel);

        match &self.mode {
            FieldMode::Procedural => spawn_row(self, INITIAL_ROW_Y),
            FieldMode::FixedLayout(layout) => {
                let layout = layout.clone();
                let row_id = self.next_row();
                for brick in layout {
                    let id = self.next_entity_id();
                    self.bricks
                        .push(Brick::new(id, brick.pos, brick.color, brick.powerup, row_id));
                }
            }
        }

        log::info!(
            "Match started: seed={} field={}x{} speed={:.2} bricks={}",
            self.seed,
            self.field_width,
            self.field_height,
            self.brick_speed,
            self.bricks.len()
        );
    }

    /// Replace the brick source and start over (validation is the caller's job)
    pub fn load_layout(&mut self, layout: Vec<LayoutBrick>, now: f64) {
        self.mode = FieldMode::FixedLayout(layout);
        self.reset_match(now);
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Allocate a new row identifier
    pub fn next_row(&mut self) -> u32 {
        let id = self.next_row_id;
        self.next_row_id += 1;
        id
    }

    /// Apply a new field size: paddle geometry and loss line follow it
    pub fn resize(&mut self, width: f32, height: f32) {
        self.field_width = width.max(MIN_FIELD_WIDTH);
        self.field_height = height.max(MIN_FIELD_HEIGHT);
        self.paddle.fit_field(self.field_width, self.field_height);
        self.loss_line = self.field_height - LOSS_LINE_OFFSET;
    }

    /// Operator speed control: clamps to the allowed range and resets the ramp
    pub fn set_base_brick_speed(&mut self, speed: f32) {
        let clamped = clamp_brick_speed(speed);
        self.base_brick_speed = clamped;
        self.brick_speed = clamped;
    }

    /// Where fresh and reset balls start
    pub fn launch_point(&self) -> Vec2 {
        Vec2::new(self.field_width / 2.0, self.field_height * BALL_LAUNCH_HEIGHT)
    }

    /// Upward launch with a random horizontal direction
    pub fn random_launch_velocity(&mut self) -> Vec2 {
        let dx = if self.rng.random_bool(0.5) {
            BALL_LAUNCH_SPEED
        } else {
            -BALL_LAUNCH_SPEED
        };
        Vec2::new(dx, -BALL_LAUNCH_SPEED)
    }

    /// Add a ball and return its id
    pub fn spawn_ball(&mut self, pos: Vec2, vel: Vec2) -> u32 {
        let id = self.next_entity_id();
        self.balls.push(Ball::new(id, pos, vel));
        id
    }

    /// Return a ball to the launch point with a fresh velocity and no trail
    pub fn reset_ball(&mut self, index: usize) {
        let pos = self.launch_point();
        let vel = self.random_launch_velocity();
        if let Some(ball) = self.balls.get_mut(index) {
            ball.pos = pos;
            ball.vel = vel;
            ball.clear_trail();
        }
    }

    /// Milliseconds since the match started (frozen once it ended)
    pub fn elapsed_ms(&self) -> f64 {
        self.final_elapsed_ms
            .unwrap_or((self.now_ms - self.start_ms).max(0.0))
    }

    #[inline]
    pub fn is_effect_active(&self, kind: PowerupKind) -> bool {
        self.effects.contains_key(&kind)
    }

    #[inline]
    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }
}
