//! Operator settings
//!
//! Read from a JSON file by the headless runner. Every field has a default
//! matching the tuning constants, so a partial file is fine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::level::{Level, LevelError};
use crate::sim::{FieldMode, GameState};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("base brick speed {0} is outside the allowed range")]
    SpeedOutOfRange(f32),
    #[error("field {width}x{height} is below the minimum size")]
    FieldTooSmall { width: f32, height: f32 },
    #[error(transparent)]
    Level(#[from] LevelError),
}

/// Where bricks come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GameMode {
    /// Endless procedural rows
    #[default]
    Infinite,
    /// A fixed layout read from a level file
    Level { path: PathBuf },
}

/// Match configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Starting brick fall speed (px/frame)
    pub base_brick_speed: f32,
    pub mode: GameMode,
    pub field_width: f32,
    pub field_height: f32,
    /// Fixed seed; callers pick one when absent
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_brick_speed: DEFAULT_BRICK_SPEED,
            mode: GameMode::Infinite,
            field_width: DEFAULT_FIELD_WIDTH,
            field_height: DEFAULT_FIELD_HEIGHT,
            seed: None,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate a settings file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let speed = self.base_brick_speed;
        if !(MIN_BRICK_SPEED..=MAX_BRICK_SPEED).contains(&speed) {
            log::warn!("Rejected base brick speed {speed}");
            return Err(SettingsError::SpeedOutOfRange(speed));
        }
        if !(self.field_width >= MIN_FIELD_WIDTH && self.field_height >= MIN_FIELD_HEIGHT) {
            log::warn!(
                "Rejected field size {}x{}",
                self.field_width,
                self.field_height
            );
            return Err(SettingsError::FieldTooSmall {
                width: self.field_width,
                height: self.field_height,
            });
        }
        Ok(())
    }

    /// Build a fresh match from these settings
    ///
    /// `seed` is used when the settings don't pin one.
    pub fn start_match(&self, seed: u64, now: f64) -> Result<GameState, SettingsError> {
        self.validate()?;
        let seed = self.seed.unwrap_or(seed);

        let mode = match &self.mode {
            GameMode::Infinite => FieldMode::Procedural,
            GameMode::Level { path } => {
                let level = Level::load(path)?;
                level.validate(self.field_width, self.field_height)?;
                log::info!("Loading level '{}' ({} bricks)", level.title(), level.bricks.len());
                FieldMode::FixedLayout(level.to_layout())
            }
        };

        Ok(GameState::configured(
            seed,
            self.field_width,
            self.field_height,
            mode,
            self.base_brick_speed,
            now,
        ))
    }
}
