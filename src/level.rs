//! Level descriptors for the fixed-layout mode
//!
//! A level is a JSON file listing brick centers, with an optional color and
//! power-up per brick:
//!
//! ```json
//! { "name": "Diamond", "bricks": [ { "x": 400, "y": 120, "powerup": "pierce" } ] }
//! ```

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{BRICK_COLORS, HEX_RADIUS, LOSS_LINE_OFFSET};
use crate::sim::{GameState, LayoutBrick, PowerupKind};

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid level json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("level has no bricks")]
    Empty,
    #[error("brick {index} lies outside the field")]
    OutOfBounds { index: usize },
    #[error("brick {index} has unknown power-up '{id}'")]
    UnknownPowerup { index: usize, id: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelBrick {
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Power-up id (`multiball`, `triple`, `freeze`, `pierce`, `bottomwall`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub powerup: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Level {
    #[serde(default)]
    pub name: Option<String>,
    pub bricks: Vec<LevelBrick>,
}

impl Level {
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Display name, falling back to a generic label
    pub fn title(&self) -> &str {
        self.name.as_deref().unwrap_or("Untitled level")
    }

    /// Check the layout against a field size
    ///
    /// Every brick must fit horizontally inside the field, sit wholly above
    /// the loss line and carry a known power-up id, if any.
    pub fn validate(&self, field_width: f32, field_height: f32) -> Result<(), LevelError> {
        let loss_line = field_height - LOSS_LINE_OFFSET;
        if self.bricks.is_empty() {
            return Err(LevelError::Empty);
        }

        for (index, brick) in self.bricks.iter().enumerate() {
            let inside = brick.x.is_finite()
                && brick.y.is_finite()
                && brick.x >= HEX_RADIUS
                && brick.x <= field_width - HEX_RADIUS
                && brick.y + HEX_RADIUS <= loss_line;
            if !inside {
                return Err(LevelError::OutOfBounds { index });
            }
            if let Some(id) = &brick.powerup {
                if PowerupKind::from_id(id).is_none() {
                    return Err(LevelError::UnknownPowerup {
                        index,
                        id: id.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Convert to simulation layout entries (expects a validated level)
    pub fn to_layout(&self) -> Vec<LayoutBrick> {
        self.bricks
            .iter()
            .enumerate()
            .map(|(i, brick)| LayoutBrick {
                pos: Vec2::new(brick.x, brick.y),
                color: brick
                    .color
                    .clone()
                    .unwrap_or_else(|| BRICK_COLORS[i % BRICK_COLORS.len()].to_string()),
                powerup: brick.powerup.as_deref().and_then(PowerupKind::from_id),
            })
            .collect()
    }
}

impl GameState {
    /// Validate a level and start a fresh match on it
    ///
    /// Nothing changes when validation fails.
    pub fn load_level(&mut self, level: &Level, now: f64) -> Result<(), LevelError> {
        if let Err(err) = level.validate(self.field_width, self.field_height) {
            log::warn!("Rejected level '{}': {}", level.title(), err);
            return Err(err);
        }
        log::info!("Loading level '{}' ({} bricks)", level.title(), level.bricks.len());
        self.load_layout(level.to_layout(), now);
        Ok(())
    }
}
