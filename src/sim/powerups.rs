//! Power-up lifecycle: drop, fall, pickup, activation, renewal and expiry

use glam::Vec2;
use rand::Rng;

use super::state::{ActiveEffect, GameEvent, GameState, Pickup, PowerupKind};
use crate::consts::*;

/// Spread of the mirrored launch angles of a triple pickup (radians)
const TRIPLE_ANGLE_JITTER: f32 = 0.8;

/// Drop a falling pickup at `pos`
pub fn spawn_pickup(state: &mut GameState, kind: PowerupKind, pos: Vec2) {
    let id = state.next_entity_id();
    state.pickups.push(Pickup {
        id,
        kind,
        pos,
        radius: PICKUP_RADIUS,
        speed: PICKUP_FALL_SPEED,
    });
}

/// Move pickups down, collect the ones touching the paddle, drop the ones below the field
///
/// Freeze has no effect on falling pickups.
pub fn update_pickups(state: &mut GameState, now: f64) {
    let paddle = state.paddle.rect();
    let floor = state.field_height;
    let mut collected = Vec::new();

    state.pickups.retain_mut(|pickup| {
        pickup.pos.y += pickup.speed;

        if paddle.overlaps_circle(pickup.pos, pickup.radius) {
            collected.push(pickup.kind);
            false
        } else {
            pickup.pos.y - pickup.radius <= floor
        }
    });

    for kind in collected {
        activate(state, kind, now);
    }
}

/// Apply a collected power-up
///
/// Instant kinds always fire. A durational kind that is already running only
/// has its timer restarted; otherwise it is recorded and its side effect
/// applied once.
pub fn activate(state: &mut GameState, kind: PowerupKind, now: f64) {
    let Some(duration_ms) = kind.duration_ms() else {
        apply_instant(state, kind);
        return;
    };

    if let Some(effect) = state.effects.get_mut(&kind) {
        effect.start_ms = now;
        log::info!("Power-up renewed: {}", kind.name());
        state.emit(GameEvent::PowerupRenewed(kind));
        return;
    }

    state.effects.insert(
        kind,
        ActiveEffect {
            start_ms: now,
            duration_ms,
        },
    );
    match kind {
        PowerupKind::Pierce => {
            for ball in &mut state.balls {
                ball.pierce = true;
            }
        }
        PowerupKind::BottomWall => state.bottom_wall_active = true,
        PowerupKind::Freeze | PowerupKind::MultiBall | PowerupKind::Triple => {}
    }

    log::info!("Power-up activated: {} ({:.0}s)", kind.name(), duration_ms / 1000.0);
    state.emit(GameEvent::PowerupActivated(kind));
}

fn apply_instant(state: &mut GameState, kind: PowerupKind) {
    let origin = Vec2::new(state.paddle.center_x(), state.paddle.y - BALL_RADIUS);

    let added = match kind {
        PowerupKind::MultiBall => {
            let vel = state.random_launch_velocity();
            state.spawn_ball(origin, vel);
            1
        }
        PowerupKind::Triple => {
            for side in [-1.0f32, 1.0] {
                let angle = std::f32::consts::FRAC_PI_4
                    + (state.rng.random::<f32>() - 0.5) * TRIPLE_ANGLE_JITTER;
                let vel = Vec2::new(
                    side * BALL_LAUNCH_SPEED * angle.cos(),
                    -(BALL_LAUNCH_SPEED * angle.sin()).abs(),
                );
                state.spawn_ball(origin, vel);
            }
            2
        }
        PowerupKind::Freeze | PowerupKind::Pierce | PowerupKind::BottomWall => 0,
    };

    log::info!("Power-up {}: +{} ball(s)", kind.name(), added);
    state.emit(GameEvent::PowerupActivated(kind));
    state.emit(GameEvent::BallsAdded { count: added });
}

/// Remove effects whose time ran out and undo their side effects
pub fn expire_effects(state: &mut GameState, now: f64) {
    let expired: Vec<PowerupKind> = state
        .effects
        .iter()
        .filter(|(_, effect)| effect.is_expired(now))
        .map(|(kind, _)| *kind)
        .collect();

    for kind in expired {
        state.effects.remove(&kind);
        match kind {
            PowerupKind::Pierce => {
                for ball in &mut state.balls {
                    ball.pierce = false;
                }
            }
            PowerupKind::BottomWall => state.bottom_wall_active = false,
            PowerupKind::Freeze | PowerupKind::MultiBall | PowerupKind::Triple => {}
        }
        log::info!("Power-up expired: {}", kind.name());
        state.emit(GameEvent::PowerupExpired(kind));
    }

    state.bottom_wall_active = state.is_effect_active(PowerupKind::BottomWall);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn state() -> GameState {
        let mut state = GameState::new(11, 800.0, 600.0, 0.0);
        state.bricks.clear();
        state
    }

    #[test]
    fn test_pickup_falls_and_is_collected_by_paddle() {
        let mut state = state();
        let x = state.paddle.center_x();
        let y = state.paddle.y - PICKUP_RADIUS - 1.0;
        spawn_pickup(&mut state, PowerupKind::BottomWall, Vec2::new(x, y));

        update_pickups(&mut state, 500.0);
        assert!(state.pickups.is_empty());
        assert!(state.bottom_wall_active);
        assert_eq!(
            state.effects.get(&PowerupKind::BottomWall).map(|e| e.start_ms),
            Some(500.0)
        );
    }

    #[test]
    fn test_pickup_below_field_is_discarded() {
        let mut state = state();
        state.paddle.x = 0.0;
        spawn_pickup(&mut state, PowerupKind::Freeze, Vec2::new(700.0, 607.0));
        update_pickups(&mut state, 0.0);
        assert_eq!(state.pickups.len(), 1);
        assert_eq!(state.pickups[0].pos.y, 609.0);

        update_pickups(&mut state, 0.0);
        assert!(state.pickups.is_empty());
        assert!(state.effects.is_empty());
    }

    #[test]
    fn test_pickup_ignores_freeze() {
        let mut state = state();
        activate(&mut state, PowerupKind::Freeze, 0.0);
        spawn_pickup(&mut state, PowerupKind::Pierce, Vec2::new(20.0, 100.0));
        update_pickups(&mut state, 16.0);
        assert_eq!(state.pickups[0].pos.y, 100.0 + PICKUP_FALL_SPEED);
    }

    #[test]
    fn test_multiball_adds_one_ball_from_paddle() {
        let mut state = state();
        activate(&mut state, PowerupKind::MultiBall, 0.0);
        assert_eq!(state.balls.len(), 2);
        let ball = &state.balls[1];
        assert_eq!(ball.pos.x, state.paddle.center_x());
        assert_eq!(ball.pos.y, state.paddle.y - BALL_RADIUS);
        assert_eq!(ball.vel.y, -BALL_LAUNCH_SPEED);
        assert!(state.effects.is_empty());
    }

    #[test]
    fn test_triple_adds_two_mirrored_balls() {
        let mut state = state();
        activate(&mut state, PowerupKind::Triple, 0.0);
        activate(&mut state, PowerupKind::Triple, 0.0);
        assert_eq!(state.balls.len(), 5);
        let left = &state.balls[1];
        let right = &state.balls[2];
        assert!(left.vel.x < 0.0 && right.vel.x > 0.0);
        assert!(left.vel.y < 0.0 && right.vel.y < 0.0);
        assert!((left.speed() - BALL_LAUNCH_SPEED).abs() < 1e-4);
        assert!(state.effects.is_empty());
    }

    #[test]
    fn test_pierce_applies_and_tears_down() {
        let mut state = state();
        activate(&mut state, PowerupKind::MultiBall, 0.0);
        activate(&mut state, PowerupKind::Pierce, 1000.0);
        assert!(state.balls.iter().all(|b| b.pierce));

        expire_effects(&mut state, 1000.0 + 12_000.0);
        assert!(state.is_effect_active(PowerupKind::Pierce));

        expire_effects(&mut state, 1000.0 + 12_000.0 + 1.0);
        assert!(!state.is_effect_active(PowerupKind::Pierce));
        assert!(state.balls.iter().all(|b| !b.pierce));
        assert!(state.events.contains(&GameEvent::PowerupExpired(PowerupKind::Pierce)));
    }

    #[test]
    fn test_renewal_resets_timer_without_reapplying() {
        let mut state = state();
        activate(&mut state, PowerupKind::Pierce, 0.0);
        state.balls[0].pierce = false;

        activate(&mut state, PowerupKind::Pierce, 5_000.0);
        assert!(!state.balls[0].pierce, "renewal must not re-apply the side effect");
        assert_eq!(state.effects[&PowerupKind::Pierce].start_ms, 5_000.0);
        assert_eq!(state.effects[&PowerupKind::Pierce].remaining_fraction(5_000.0), 1.0);

        expire_effects(&mut state, 13_000.0);
        assert!(state.is_effect_active(PowerupKind::Pierce));
    }

    #[test]
    fn test_bottom_wall_expiry_clears_flag() {
        let mut state = state();
        activate(&mut state, PowerupKind::BottomWall, 0.0);
        assert!(state.bottom_wall_active);
        expire_effects(&mut state, 15_001.0);
        assert!(!state.bottom_wall_active);
        assert!(state.effects.is_empty());
    }

    proptest! {
        #[test]
        fn prop_effects_never_stack(picks in proptest::collection::vec(0usize..5, 1..40)) {
            let mut state = state();
            let mut now = 0.0;
            for pick in picks {
                now += 250.0;
                activate(&mut state, PowerupKind::ALL[pick], now);
                prop_assert!(state.effects.len() <= 3);
                prop_assert!(state.effects.keys().all(|k| !k.is_instant()));
                if let Some(effect) = state.effects.get(&PowerupKind::ALL[pick]) {
                    prop_assert_eq!(effect.start_ms, now);
                }
            }
        }
    }
}
