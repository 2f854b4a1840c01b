//! Per-frame simulation tick
//!
//! One call advances the match by one display frame. Stages run in a fixed
//! order: difficulty ramp, brick advance and removal, ball movement and
//! collisions, then power-up pickup and expiry. Later stages see the earlier
//! stages' mutations from the same tick.

use super::balls::update_balls;
use super::bricks::{advance_bricks, purge_dying, ramp_difficulty, spawn_on_schedule};
use super::powerups::{expire_effects, update_pickups};
use super::state::{Ball, FieldMode, GameEvent, GamePhase, GameState};

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Absolute pointer x: recenters the paddle
    pub pointer_x: Option<f32>,
    /// Left key held
    pub left: bool,
    /// Right key held
    pub right: bool,
    /// Relaunch a lone ball with a fresh velocity
    pub launch: bool,
    /// Pause toggle
    pub pause: bool,
    /// Start over with a fresh match
    pub restart: bool,
    /// Demo mode: the paddle steers itself
    pub autopilot: bool,
}

/// Advance the game state by one frame at timestamp `now` (ms)
pub fn tick(state: &mut GameState, input: &TickInput, now: f64) {
    state.events.clear();

    if input.restart {
        state.reset_match(now);
    } else if input.pause {
        match state.phase {
            GamePhase::Running => state.phase = GamePhase::Paused,
            GamePhase::Paused => state.phase = GamePhase::Running,
            GamePhase::GameOver | GamePhase::LevelComplete => {}
        }
    }

    // Paused and terminal phases skip every stage
    if state.phase != GamePhase::Running {
        return;
    }

    state.now_ms = now;
    state.frame += 1;

    steer_paddle(state, input);
    if input.launch && state.balls.len() == 1 {
        let vel = state.random_launch_velocity();
        state.balls[0].vel = vel;
    }

    // Bricks
    ramp_difficulty(state, now);
    advance_bricks(state, now);
    if state.phase != GamePhase::Running {
        return;
    }
    purge_dying(state, now);
    spawn_on_schedule(state, now);

    // Balls
    update_balls(state, now);
    if state.phase != GamePhase::Running {
        return;
    }

    // Power-ups
    update_pickups(state, now);
    expire_effects(state, now);

    check_level_complete(state);
}

/// Charge one life: collapse to a single reset ball, or end the match
pub fn lose_life(state: &mut GameState) {
    if state.phase.is_terminal() {
        return;
    }

    state.lives = state.lives.saturating_sub(1);
    state.emit(GameEvent::LifeLost {
        remaining: state.lives,
    });

    if state.lives == 0 {
        game_over(state);
        return;
    }

    state.balls.truncate(1);
    state.reset_ball(0);
    log::info!("Life lost, {} remaining", state.lives);
}

fn game_over(state: &mut GameState) {
    let elapsed_ms = (state.now_ms - state.start_ms).max(0.0);
    state.phase = GamePhase::GameOver;
    state.final_elapsed_ms = Some(elapsed_ms);
    log::info!(
        "Game over: score={} survived={:.1}s",
        state.score,
        elapsed_ms / 1000.0
    );
    state.emit(GameEvent::GameOver {
        score: state.score,
        elapsed_ms,
    });
}

fn check_level_complete(state: &mut GameState) {
    if !matches!(state.mode, FieldMode::FixedLayout(_)) || !state.bricks.is_empty() {
        return;
    }
    state.phase = GamePhase::LevelComplete;
    state.final_elapsed_ms = Some((state.now_ms - state.start_ms).max(0.0));
    log::info!("Level complete: score={}", state.score);
    state.emit(GameEvent::LevelComplete { score: state.score });
}

fn steer_paddle(state: &mut GameState, input: &TickInput) {
    let field_width = state.field_width;

    if input.autopilot {
        let center = state.paddle.center_x();
        let step = state.paddle.speed;
        let target = autopilot_target(state).clamp(center - step, center + step);
        state.paddle.center_on(target, field_width);
        return;
    }

    if let Some(x) = input.pointer_x {
        state.paddle.center_on(x, field_width);
    }
    if input.left {
        state.paddle.nudge(-1.0, field_width);
    }
    if input.right {
        state.paddle.nudge(1.0, field_width);
    }
}

/// Where the demo driver wants the paddle center
///
/// Tracks the predicted landing point of the lowest descending ball, with a
/// slow wobble so rallies don't loop. With no ball on its way down it goes
/// for the nearest pickup.
fn autopilot_target(state: &GameState) -> f32 {
    let paddle_y = state.paddle.y;
    let paddle_x = state.paddle.center_x();

    let threat = state
        .balls
        .iter()
        .filter(|b| b.vel.y > 0.0)
        .max_by(|a, b| a.pos.y.partial_cmp(&b.pos.y).unwrap_or(std::cmp::Ordering::Equal));

    let threatened = threat.is_some_and(|b| b.pos.y > state.field_height * 0.4);
    if !threatened {
        let pickup = state
            .pickups
            .iter()
            .filter(|p| p.pos.y < paddle_y)
            .min_by(|a, b| {
                (a.pos.x - paddle_x)
                    .abs()
                    .partial_cmp(&(b.pos.x - paddle_x).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        if let Some(pickup) = pickup {
            return pickup.pos.x;
        }
    }

    let Some(ball) = threat else {
        return paddle_x;
    };

    let time_factor = state.frame as f32 * 0.01;
    let wobble = (time_factor.sin() * 0.3 + (time_factor * 0.7).sin() * 0.15) * state.paddle.width * 0.5;
    predict_landing_x(ball, paddle_y, state.field_width) + wobble
}

/// Fold the straight-line path of a descending ball off the side walls
fn predict_landing_x(ball: &Ball, paddle_y: f32, field_width: f32) -> f32 {
    let frames = ((paddle_y - ball.radius - ball.pos.y) / ball.vel.y).max(0.0);
    let raw = ball.pos.x + ball.vel.x * frames;

    let span = (field_width - 2.0 * ball.radius).max(1.0);
    let folded = (raw - ball.radius).rem_euclid(2.0 * span);
    let x = if folded > span { 2.0 * span - folded } else { folded };
    ball.radius + x
}
