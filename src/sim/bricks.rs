//! Brick field: row spawning, advance, removal and the difficulty ramp

use glam::Vec2;
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use super::powerups::spawn_pickup;
use super::state::{Brick, BrickState, FieldMode, GameEvent, GameState, PowerupKind, RemovalCause};
use super::tick::lose_life;
use crate::consts::*;

/// Number of horizontal slots a row can use on a field of this width
pub fn row_columns(field_width: f32) -> usize {
    ((field_width - MIN_SPACING * 2.0) / MIN_SPACING).floor().max(0.0) as usize
}

/// Spawn one row of bricks at `y_offset`
///
/// Slots are shuffled and the first N taken; a candidate closer than
/// `OVERLAP_FACTOR * MIN_SPACING` to any brick still in the field is dropped,
/// so a row may come out empty.
pub fn spawn_row(state: &mut GameState, y_offset: f32) {
    let wanted = state
        .rng
        .random_range(MIN_BRICKS_PER_ROW..=MAX_BRICKS_PER_ROW);
    let columns = row_columns(state.field_width);
    let count = wanted.min(columns);

    let mut slots: Vec<usize> = (0..columns).collect();
    slots.shuffle(&mut state.rng);

    let row_id = state.next_row();
    let min_distance = MIN_SPACING * OVERLAP_FACTOR;
    let mut placed = Vec::with_capacity(count);

    for &col in slots.iter().take(count) {
        let pos = Vec2::new(MIN_SPACING + col as f32 * MIN_SPACING, y_offset);

        if state
            .bricks
            .iter()
            .any(|brick| brick.pos.distance(pos) < min_distance)
        {
            continue;
        }

        let powerup = if state.rng.random::<f32>() < state.powerup_chance {
            PowerupKind::ALL.choose(&mut state.rng).copied()
        } else {
            None
        };
        let color = BRICK_COLORS.choose(&mut state.rng).copied().unwrap_or(BRICK_COLORS[0]);

        let id = state.next_entity_id();
        placed.push(Brick::new(id, pos, color, powerup, row_id));
    }

    log::debug!(
        "Row {} spawned at y={}: {}/{} bricks",
        row_id,
        y_offset,
        placed.len(),
        count
    );
    state.bricks.extend(placed);
}

/// Whether some falling brick has fully cleared the top of the field
pub fn has_fully_visible_brick(state: &GameState) -> bool {
    state
        .bricks
        .iter()
        .any(|brick| brick.is_falling() && brick.top() > 0.0)
}

/// Move falling bricks down and charge a life for each that crosses the loss line
///
/// Freeze only holds the field once a brick is fully visible, so rows that
/// are still off-screen keep rushing in at the fast-appearance multiplier.
pub fn advance_bricks(state: &mut GameState, now: f64) {
    let visible = has_fully_visible_brick(state);
    state.fast_appearance = !visible;

    if visible && state.is_effect_active(PowerupKind::Freeze) {
        return;
    }

    let multiplier = if visible {
        NORMAL_SPEED_MULTIPLIER
    } else {
        FAST_APPEARANCE_MULTIPLIER
    };
    let step = state.brick_speed * multiplier;
    let loss_line = state.loss_line;

    let mut breaches = 0;
    for brick in state.bricks.iter_mut().filter(|b| b.is_falling()) {
        brick.pos.y += step;
        if brick.bottom() > loss_line {
            brick.mark_dying(now, RemovalCause::Breached);
            breaches += 1;
        }
    }

    for _ in 0..breaches {
        if state.phase.is_terminal() {
            break;
        }
        state.emit(GameEvent::BrickBreached);
        lose_life(state);
    }
}

/// Purge bricks whose removal animation has finished
///
/// Struck bricks score here; pierced ones already scored on contact and
/// breached ones never score. Any carried power-up drops where the brick was.
pub fn purge_dying(state: &mut GameState, now: f64) {
    let mut drops = Vec::new();
    let mut struck = 0u64;

    state.bricks.retain(|brick| match brick.state {
        BrickState::Dying { since, cause } if now - since > REMOVE_ANIMATION_MS => {
            if let Some(kind) = brick.powerup {
                drops.push((kind, brick.pos));
            }
            if cause == RemovalCause::Struck {
                struck += 1;
            }
            false
        }
        _ => true,
    });

    if struck > 0 {
        state.score += struck * SCORE_BRICK;
        for _ in 0..struck {
            state.emit(GameEvent::BrickDestroyed { pierced: false });
        }
    }

    for (kind, pos) in drops {
        log::debug!("Brick dropped {} at ({:.0}, {:.0})", kind.name(), pos.x, pos.y);
        spawn_pickup(state, kind, pos);
    }
}

/// Spawn a new row above the field every `SPAWN_INTERVAL_MS` (procedural mode only)
pub fn spawn_on_schedule(state: &mut GameState, now: f64) {
    if !matches!(state.mode, FieldMode::Procedural) {
        return;
    }
    if now - state.last_spawn_ms > SPAWN_INTERVAL_MS {
        spawn_row(state, SPAWN_ROW_Y);
        state.last_spawn_ms = now;
    }
}

/// Step fall speed and power-up chance up every `SPEED_INCREASE_INTERVAL_MS`
pub fn ramp_difficulty(state: &mut GameState, now: f64) {
    if now - state.last_speed_increase_ms > SPEED_INCREASE_INTERVAL_MS {
        state.brick_speed += SPEED_INCREASE_AMOUNT;
        state.powerup_chance = (state.powerup_chance + POWERUP_CHANCE_STEP).min(MAX_POWERUP_CHANCE);
        state.last_speed_increase_ms = now;

        log::info!(
            "Speed increased to {:.2} (power-up chance {:.2})",
            state.brick_speed,
            state.powerup_chance
        );
        state.emit(GameEvent::SpeedIncreased {
            speed: state.brick_speed,
        });
    }
}
