//! Ball motion and collision resolution
//!
//! Per ball, per tick: integrate, bounce off side and top walls, bounce off
//! the paddle, resolve brick contacts, then apply the bottom-boundary policy.

use rand::Rng;

use super::geometry::{ball_hex_collision, reflect_with_floor, within_bounding_circle};
use super::state::{GameEvent, GameState, RemovalCause};
use super::tick::lose_life;
use crate::consts::*;

/// What happened to a ball during its step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BallOutcome {
    Kept,
    Removed,
}

/// Step every ball once
pub fn update_balls(state: &mut GameState, now: f64) {
    let mut index = 0;
    while index < state.balls.len() {
        if state.phase.is_terminal() {
            return;
        }
        match step_ball(state, index, now) {
            BallOutcome::Kept => index += 1,
            BallOutcome::Removed => {}
        }
    }
}

fn step_ball(state: &mut GameState, index: usize, now: f64) -> BallOutcome {
    let field_width = state.field_width;

    // Integrate and bounce off side/top walls
    {
        let ball = &mut state.balls[index];
        debug_assert!(ball.radius > 0.0, "ball radius must be positive");
        debug_assert!(ball.pos.is_finite(), "ball position must be finite");

        ball.pos += ball.vel;
        ball.record_trail();

        if ball.pos.x < ball.radius {
            ball.pos.x = ball.radius;
            ball.vel.x = ball.vel.x.abs();
        }
        if ball.pos.x > field_width - ball.radius {
            ball.pos.x = field_width - ball.radius;
            ball.vel.x = -ball.vel.x.abs();
        }
        if ball.pos.y < ball.radius {
            ball.pos.y = ball.radius;
            ball.vel.y = ball.vel.y.abs();
        }
    }

    bounce_off_paddle(state, index);
    collide_with_bricks(state, index, now);
    bottom_boundary(state, index)
}

/// Relaunch upward at an angle set by where the ball met the paddle
fn bounce_off_paddle(state: &mut GameState, index: usize) {
    let paddle = state.paddle.rect();
    let ball = &mut state.balls[index];
    if ball.vel.y <= 0.0 || !paddle.overlaps_circle(ball.pos, ball.radius) {
        return;
    }

    let half_width = paddle.width / 2.0;
    let offset = ((ball.pos.x - paddle.center_x()) / half_width).clamp(-1.0, 1.0);
    let jitter = (state.rng.random::<f32>() - 0.5) * PADDLE_ANGLE_JITTER;
    let angle = offset * PADDLE_MAX_ANGLE + jitter;
    let speed = ball.speed().max(MIN_BOUNCE_SPEED);

    ball.vel.x = speed * angle.sin();
    ball.vel.y = -(speed * angle.cos()).abs();
    ball.pos.y = paddle.y - ball.radius - 0.1;
}

/// Resolve brick contacts for one ball
///
/// A pierce ball destroys every brick it overlaps and keeps its velocity. A
/// normal ball reflects off the first edge it touches and stops there.
fn collide_with_bricks(state: &mut GameState, index: usize, now: f64) {
    let ball = &state.balls[index];
    let (pos, vel, radius, pierce) = (ball.pos, ball.vel, ball.radius, ball.pierce);

    let mut pierced = 0u64;
    let mut bounce = None;

    for brick in state.bricks.iter_mut().filter(|b| b.is_falling()) {
        if !within_bounding_circle(pos, radius, brick.pos, HEX_RADIUS) {
            continue;
        }

        if pierce {
            brick.mark_dying(now, RemovalCause::Pierced);
            pierced += 1;
            continue;
        }

        let contact = ball_hex_collision(pos, radius, brick.pos, HEX_RADIUS);
        if contact.hit {
            let resolved = pos + contact.normal * contact.penetration.max(0.0);
            bounce = Some((resolved, reflect_with_floor(vel, contact.normal)));
            brick.mark_dying(now, RemovalCause::Struck);
            break;
        }
    }

    if pierced > 0 {
        state.score += pierced * SCORE_PIERCE;
        for _ in 0..pierced {
            state.emit(GameEvent::BrickDestroyed { pierced: true });
        }
    }
    if let Some((pos, vel)) = bounce {
        let ball = &mut state.balls[index];
        ball.pos = pos;
        ball.vel = vel;
    }
}

/// Bottom wall bounce, ball loss, or life loss for the last ball
fn bottom_boundary(state: &mut GameState, index: usize) -> BallOutcome {
    let floor = state.field_height;
    let ball = &mut state.balls[index];
    if ball.pos.y - ball.radius <= floor {
        return BallOutcome::Kept;
    }

    if state.bottom_wall_active {
        ball.pos.y = floor - ball.radius;
        ball.vel.y = -ball.vel.y.abs() * BOTTOM_WALL_BOOST;
        let x = ball.pos.x;
        state.emit(GameEvent::BottomWallBounce { x });
        return BallOutcome::Kept;
    }

    if state.balls.len() > 1 {
        let lost = state.balls.remove(index);
        log::debug!("Ball {} lost ({} left)", lost.id, state.balls.len());
        state.emit(GameEvent::BallLost);
        return BallOutcome::Removed;
    }

    lose_life(state);
    BallOutcome::Kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Brick, BrickState, GamePhase, PowerupKind};
    use crate::sim::powerups::activate;
    use glam::Vec2;
    use proptest::prelude::*;

    fn state() -> GameState {
        let mut state = GameState::new(5, 800.0, 600.0, 0.0);
        state.bricks.clear();
        state
    }

    fn place(state: &mut GameState, x: f32, y: f32) -> usize {
        let id = state.next_entity_id();
        state.bricks.push(Brick::new(id, Vec2::new(x, y), "#4c7ac9", None, 0));
        state.bricks.len() - 1
    }

    fn set_ball(state: &mut GameState, pos: Vec2, vel: Vec2) {
        let ball = &mut state.balls[0];
        ball.pos = pos;
        ball.vel = vel;
    }

    fn hex_bottom(y: f32) -> f32 {
        y + HEX_RADIUS * (std::f32::consts::FRAC_PI_3).sin()
    }

    #[test]
    fn test_ball_moves_and_records_trail() {
        let mut state = state();
        set_ball(&mut state, Vec2::new(400.0, 300.0), Vec2::new(3.0, -2.0));
        update_balls(&mut state, 16.0);
        assert_eq!(state.balls[0].pos, Vec2::new(403.0, 298.0));
        assert_eq!(state.balls[0].trail.back().copied(), Some(Vec2::new(403.0, 298.0)));
    }

    #[test]
    fn test_side_and_top_walls_reflect() {
        let mut state = state();
        set_ball(&mut state, Vec2::new(10.0, 300.0), Vec2::new(-4.0, -4.0));
        update_balls(&mut state, 0.0);
        assert_eq!(state.balls[0].pos.x, BALL_RADIUS);
        assert_eq!(state.balls[0].vel.x, 4.0);

        set_ball(&mut state, Vec2::new(795.0, 300.0), Vec2::new(4.0, 4.0));
        update_balls(&mut state, 0.0);
        assert_eq!(state.balls[0].pos.x, 800.0 - BALL_RADIUS);
        assert_eq!(state.balls[0].vel.x, -4.0);

        set_ball(&mut state, Vec2::new(300.0, 9.0), Vec2::new(4.0, -4.0));
        update_balls(&mut state, 0.0);
        assert_eq!(state.balls[0].pos.y, BALL_RADIUS);
        assert_eq!(state.balls[0].vel.y, 4.0);
    }

    #[test]
    fn test_paddle_center_hit_launches_nearly_vertical() {
        let mut state = state();
        let cx = state.paddle.center_x();
        let top = state.paddle.y;
        set_ball(&mut state, Vec2::new(cx, top - 10.0), Vec2::new(0.0, 4.0));
        update_balls(&mut state, 0.0);

        let ball = &state.balls[0];
        assert!(ball.vel.y < 0.0);
        assert!((ball.speed() - 4.0).abs() < 1e-4);
        // Jitter is at most ±2.5°
        assert!(ball.vel.x.abs() <= 4.0 * (PADDLE_ANGLE_JITTER / 2.0).sin() + 1e-4);
        assert!((ball.pos.y - (top - BALL_RADIUS - 0.1)).abs() < 1e-4);
    }

    #[test]
    fn test_paddle_edge_hit_angles_outward_with_speed_floor() {
        let mut state = state();
        let right_edge = state.paddle.x + state.paddle.width;
        let top = state.paddle.y;
        set_ball(&mut state, Vec2::new(right_edge - 1.0, top - 8.0), Vec2::new(0.0, 1.0));
        update_balls(&mut state, 0.0);

        let ball = &state.balls[0];
        assert!((ball.speed() - MIN_BOUNCE_SPEED).abs() < 1e-4);
        assert!(ball.vel.x > 0.0 && ball.vel.y < 0.0);
        let angle = ball.vel.x.atan2(-ball.vel.y);
        assert!(angle <= PADDLE_MAX_ANGLE + PADDLE_ANGLE_JITTER / 2.0 + 1e-4);
        assert!(angle > PADDLE_MAX_ANGLE * 0.8);
    }

    #[test]
    fn test_rising_ball_passes_through_paddle() {
        let mut state = state();
        let cx = state.paddle.center_x();
        let y = state.paddle.y + 4.0;
        set_ball(&mut state, Vec2::new(cx, y + 2.0), Vec2::new(1.0, -2.0));
        update_balls(&mut state, 0.0);
        assert_eq!(state.balls[0].vel, Vec2::new(1.0, -2.0));
    }

    #[test]
    fn test_brick_hit_reflects_off_edge() {
        let mut state = state();
        let i = place(&mut state, 200.0, 200.0);
        // One step moves the ball to 7px below the bottom edge
        let target = Vec2::new(200.0, hex_bottom(200.0) + 7.0);
        set_ball(&mut state, target - Vec2::new(4.0, -4.0), Vec2::new(4.0, -4.0));
        update_balls(&mut state, 50.0);

        let ball = &state.balls[0];
        assert!(ball.vel.y > 0.0);
        assert!((ball.vel.x - 4.0).abs() < 1e-4);
        assert!((ball.speed() - Vec2::new(4.0, -4.0).length()).abs() < 1e-4);
        assert_eq!(
            state.bricks[i].state,
            BrickState::Dying {
                since: 50.0,
                cause: RemovalCause::Struck
            }
        );
        // Normal hits score when the brick is purged
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_brick_hit_pushes_ball_out_of_edge() {
        let mut state = state();
        place(&mut state, 200.0, 200.0);
        // Lands 5px below the bottom edge, overlapping it by 3px
        let target = Vec2::new(200.0, hex_bottom(200.0) + 5.0);
        set_ball(&mut state, target - Vec2::new(0.0, -4.0), Vec2::new(0.0, -4.0));
        update_balls(&mut state, 0.0);

        let ball = &state.balls[0];
        assert!((ball.pos.x - 200.0).abs() < 1e-4);
        assert!((ball.pos.y - (hex_bottom(200.0) + BALL_RADIUS)).abs() < 1e-3);
        assert!(ball.vel.y > 0.0);
    }

    #[test]
    fn test_single_bounce_per_tick() {
        let mut state = state();
        // Two bricks whose bottom edges both reach the ball
        let a = place(&mut state, 196.0, 200.0);
        let b = place(&mut state, 224.0, 200.0);
        let pos = Vec2::new(210.0, hex_bottom(200.0) + 6.0);
        set_ball(&mut state, pos - Vec2::new(0.0, -3.0), Vec2::new(0.0, -3.0));
        update_balls(&mut state, 0.0);

        let dying = [a, b]
            .iter()
            .filter(|&&i| !state.bricks[i].is_falling())
            .count();
        assert_eq!(dying, 1);
    }

    #[test]
    fn test_pierce_destroys_all_overlapping_without_bounce() {
        let mut state = state();
        let ids = [
            place(&mut state, 180.0, 200.0),
            place(&mut state, 220.0, 200.0),
            place(&mut state, 200.0, 170.0),
        ];
        activate(&mut state, PowerupKind::Pierce, 0.0);
        let vel = Vec2::new(1.0, -1.0);
        set_ball(&mut state, Vec2::new(199.0, 196.0), vel);
        update_balls(&mut state, 10.0);

        for i in ids {
            assert!(matches!(
                state.bricks[i].state,
                BrickState::Dying {
                    cause: RemovalCause::Pierced,
                    ..
                }
            ));
        }
        assert_eq!(state.balls[0].vel, vel);
        assert_eq!(state.score, 3 * SCORE_PIERCE);
    }

    #[test]
    fn test_bottom_wall_bounces_with_boost() {
        let mut state = state();
        activate(&mut state, PowerupKind::BottomWall, 0.0);
        set_ball(&mut state, Vec2::new(700.0, 607.0), Vec2::new(1.0, 4.0));
        update_balls(&mut state, 0.0);

        let ball = &state.balls[0];
        assert_eq!(ball.pos.y, 600.0 - BALL_RADIUS);
        assert!((ball.vel.y + 4.0 * BOTTOM_WALL_BOOST).abs() < 1e-5);
        assert_eq!(state.lives, STARTING_LIVES);
        assert!(state.events.contains(&GameEvent::BottomWallBounce { x: 701.0 }));
    }

    #[test]
    fn test_extra_ball_is_removed_below_field() {
        let mut state = state();
        activate(&mut state, PowerupKind::MultiBall, 0.0);
        let keep_id = state.balls[1].id;
        set_ball(&mut state, Vec2::new(700.0, 607.0), Vec2::new(1.0, 4.0));
        state.balls[1].pos = Vec2::new(300.0, 300.0);
        update_balls(&mut state, 0.0);

        assert_eq!(state.balls.len(), 1);
        assert_eq!(state.balls[0].id, keep_id);
        assert_eq!(state.lives, STARTING_LIVES);
        assert!(state.events.contains(&GameEvent::BallLost));
    }

    #[test]
    fn test_last_ball_costs_a_life_and_resets() {
        let mut state = state();
        let id = state.balls[0].id;
        set_ball(&mut state, Vec2::new(700.0, 607.0), Vec2::new(1.0, 4.0));
        update_balls(&mut state, 0.0);

        assert_eq!(state.lives, STARTING_LIVES - 1);
        assert_eq!(state.balls.len(), 1);
        let ball = &state.balls[0];
        assert_eq!(ball.id, id);
        assert_eq!(ball.pos, state.launch_point());
        assert!(ball.trail.is_empty());
        assert_eq!(ball.vel.y, -BALL_LAUNCH_SPEED);
    }

    #[test]
    fn test_last_ball_on_last_life_ends_game() {
        let mut state = state();
        state.lives = 1;
        set_ball(&mut state, Vec2::new(700.0, 607.0), Vec2::new(1.0, 4.0));
        update_balls(&mut state, 0.0);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.lives, 0);
        assert_eq!(state.balls.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_brick_contact_preserves_speed(dx in -6.0f32..6.0, dy in -6.0f32..-1.5, offset in -20.0f32..20.0) {
            let mut state = state();
            place(&mut state, 400.0, 200.0);
            let vel = Vec2::new(dx, dy);
            let start = Vec2::new(400.0 + offset, hex_bottom(200.0) + 7.0) - vel;
            set_ball(&mut state, start, vel);
            update_balls(&mut state, 0.0);
            let after = state.balls[0].speed();
            prop_assert!((after - vel.length()).abs() < 1e-3);
        }
    }
}
