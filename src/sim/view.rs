//! Read-only render snapshot
//!
//! A [`FrameView`] is everything a renderer needs for one frame. It borrows
//! nothing from the state, so it can be serialized or handed to another
//! thread.

use glam::Vec2;
use serde::Serialize;

use super::geometry::Rect;
use super::state::{BrickState, GamePhase, GameState, PowerupKind};
use crate::consts::{REMOVE_ANIMATION_MS, REMOVE_SWELL_MS};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum BrickPhase {
    Falling,
    /// Removal animation progress in [0, 1]
    Dying { progress: f32 },
}

#[derive(Debug, Clone, Serialize)]
pub struct BrickView {
    pub id: u32,
    pub pos: Vec2,
    pub color: String,
    pub powerup: Option<PowerupKind>,
    pub phase: BrickPhase,
    /// Draw scale relative to the hex radius
    pub scale: f32,
    pub alpha: f32,
}

/// Scale and alpha of a dying brick `elapsed` ms into its removal
///
/// The hex swells by 15% first, then shrinks and fades out.
pub fn removal_pose(elapsed: f64) -> (f32, f32) {
    if elapsed < REMOVE_SWELL_MS {
        let p = (elapsed.max(0.0) / REMOVE_SWELL_MS) as f32;
        (1.0 + 0.15 * p, 1.0 - 0.05 * p)
    } else {
        let p = ((elapsed - REMOVE_SWELL_MS) / (REMOVE_ANIMATION_MS - REMOVE_SWELL_MS)).min(1.0) as f32;
        ((1.15 * (1.0 - p)).max(0.0), (1.0 - p).max(0.0))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BallView {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub pierce: bool,
    /// Oldest first
    pub trail: Vec<Vec2>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PickupView {
    pub id: u32,
    pub kind: PowerupKind,
    pub pos: Vec2,
    pub radius: f32,
    pub color: &'static str,
    pub icon: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct EffectView {
    pub kind: PowerupKind,
    pub color: &'static str,
    pub remaining: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaddleView {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl From<Rect> for PaddleView {
    fn from(rect: Rect) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        }
    }
}

/// Snapshot of a match for one rendered frame
#[derive(Debug, Clone, Serialize)]
pub struct FrameView {
    pub phase: GamePhase,
    pub paused: bool,
    pub terminal: bool,
    pub field_width: f32,
    pub field_height: f32,
    pub loss_line: f32,
    pub score: u64,
    pub lives: u8,
    pub elapsed_ms: f64,
    pub brick_speed: f32,
    pub powerup_chance: f32,
    pub fast_appearance: bool,
    pub bottom_wall_active: bool,
    pub paddle: PaddleView,
    pub bricks: Vec<BrickView>,
    pub balls: Vec<BallView>,
    pub pickups: Vec<PickupView>,
    pub effects: Vec<EffectView>,
}

impl FrameView {
    pub fn capture(state: &GameState, now: f64) -> Self {
        let bricks = state
            .bricks
            .iter()
            .map(|brick| {
                let (phase, (scale, alpha)) = match brick.state {
                    BrickState::Falling => (BrickPhase::Falling, (1.0, 1.0)),
                    BrickState::Dying { since, .. } => (
                        BrickPhase::Dying {
                            progress: ((now - since) / REMOVE_ANIMATION_MS).clamp(0.0, 1.0) as f32,
                        },
                        removal_pose(now - since),
                    ),
                };
                BrickView {
                    id: brick.id,
                    pos: brick.pos,
                    color: brick.color.clone(),
                    powerup: brick.powerup,
                    phase,
                    scale,
                    alpha,
                }
            })
            .collect();

        let balls = state
            .balls
            .iter()
            .map(|ball| BallView {
                id: ball.id,
                pos: ball.pos,
                radius: ball.radius,
                pierce: ball.pierce,
                trail: ball.trail.iter().copied().collect(),
            })
            .collect();

        let pickups = state
            .pickups
            .iter()
            .map(|pickup| PickupView {
                id: pickup.id,
                kind: pickup.kind,
                pos: pickup.pos,
                radius: pickup.radius,
                color: pickup.kind.color(),
                icon: pickup.kind.icon(),
            })
            .collect();

        let effects = state
            .effects
            .iter()
            .map(|(kind, effect)| EffectView {
                kind: *kind,
                color: kind.indicator_color(),
                remaining: effect.remaining_fraction(now),
            })
            .collect();

        Self {
            phase: state.phase,
            paused: state.phase == GamePhase::Paused,
            terminal: state.phase.is_terminal(),
            field_width: state.field_width,
            field_height: state.field_height,
            loss_line: state.loss_line,
            score: state.score,
            lives: state.lives,
            elapsed_ms: state.elapsed_ms(),
            brick_speed: state.brick_speed,
            powerup_chance: state.powerup_chance,
            fast_appearance: state.fast_appearance,
            bottom_wall_active: state.bottom_wall_active,
            paddle: state.paddle.rect().into(),
            bricks,
            balls,
            pickups,
            effects,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::powerups::{activate, spawn_pickup};
    use crate::sim::state::RemovalCause;

    #[test]
    fn test_capture_mirrors_state() {
        let mut state = GameState::new(8, 800.0, 600.0, 0.0);
        state.score = 250;
        let view = FrameView::capture(&state, 0.0);

        assert_eq!(view.score, 250);
        assert_eq!(view.lives, state.lives);
        assert_eq!(view.bricks.len(), state.bricks.len());
        assert_eq!(view.balls.len(), 1);
        assert_eq!(view.paddle.width, state.paddle.width);
        assert_eq!(view.loss_line, 540.0);
        assert!(view.fast_appearance);
        assert!(!view.paused && !view.terminal);
        assert!(view.bricks.iter().all(|b| b.phase == BrickPhase::Falling));
    }

    #[test]
    fn test_dying_progress_and_effect_fraction() {
        let mut state = GameState::new(8, 800.0, 600.0, 0.0);
        state.bricks[0].mark_dying(1_000.0, RemovalCause::Struck);
        activate(&mut state, PowerupKind::Freeze, 0.0);
        spawn_pickup(&mut state, PowerupKind::Triple, Vec2::new(50.0, 50.0));

        let view = FrameView::capture(&state, 1_180.0);
        assert_eq!(view.bricks[0].phase, BrickPhase::Dying { progress: 0.5 });
        assert_eq!(view.effects.len(), 1);
        assert_eq!(view.effects[0].kind, PowerupKind::Freeze);
        assert!((view.effects[0].remaining - (1.0 - 1_180.0 / 8_000.0) as f32).abs() < 1e-5);
        assert_eq!(view.pickups[0].icon, PowerupKind::Triple.icon());
    }

    #[test]
    fn test_pickup_ids_are_stable_across_frames() {
        let mut state = GameState::new(8, 800.0, 600.0, 0.0);
        spawn_pickup(&mut state, PowerupKind::Freeze, Vec2::new(100.0, 50.0));
        spawn_pickup(&mut state, PowerupKind::Pierce, Vec2::new(300.0, 50.0));

        let first = FrameView::capture(&state, 0.0);
        assert_ne!(first.pickups[0].id, first.pickups[1].id);
        assert!(first.balls.iter().all(|b| b.id != first.pickups[0].id));

        state.pickups.remove(0);
        let second = FrameView::capture(&state, 16.0);
        assert_eq!(second.pickups.len(), 1);
        assert_eq!(second.pickups[0].id, first.pickups[1].id);
        assert_eq!(second.pickups[0].kind, PowerupKind::Pierce);

        let json = serde_json::to_value(&second).unwrap();
        assert_eq!(json["pickups"][0]["id"], first.pickups[1].id);
    }

    #[test]
    fn test_removal_pose_swells_then_vanishes() {
        assert_eq!(removal_pose(0.0), (1.0, 1.0));
        let (scale, _) = removal_pose(REMOVE_SWELL_MS);
        assert!((scale - 1.15).abs() < 1e-5);
        let (scale, alpha) = removal_pose(REMOVE_ANIMATION_MS);
        assert!(scale.abs() < 1e-5 && alpha.abs() < 1e-5);
        assert_eq!(removal_pose(10_000.0), (0.0, 0.0));
    }

    #[test]
    fn test_view_serializes_to_json() {
        let state = GameState::new(8, 800.0, 600.0, 0.0);
        let json = serde_json::to_value(FrameView::capture(&state, 0.0)).unwrap();
        assert_eq!(json["phase"], "Running");
        assert_eq!(json["bricks"][0]["phase"]["phase"], "falling");
        assert!(json["balls"][0]["trail"].as_array().is_some());
    }
}
