//! Hexanoid headless runner
//!
//! Plays a match with the autopilot on a simulated 60 fps clock and reports
//! the result.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::Parser;

use hexanoid::highscores::format_duration;
use hexanoid::sim::{FrameView, GameEvent, GamePhase, TickInput, tick};
use hexanoid::{GameMode, HighScores, Settings};

/// Simulated frame length (ms)
const FRAME_MS: f64 = 1000.0 / 60.0;

/// Hexagonal-brick arcade simulation, played by the autopilot.
#[derive(Debug, Parser)]
#[command(name = "hexanoid", version, about)]
struct Args {
    /// Match seed (defaults to the settings seed, then the clock)
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many frames if the match is still running
    #[arg(long, default_value = "36000", value_name = "N")]
    frames: u64,

    /// Base brick fall speed in px/frame
    #[arg(long, value_name = "SPEED")]
    speed: Option<f32>,

    /// Settings JSON file
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Level JSON file (plays the fixed layout instead of endless rows)
    #[arg(long, value_name = "FILE")]
    level: Option<PathBuf>,

    /// High score JSON file to record the run in
    #[arg(long, value_name = "FILE")]
    scores: Option<PathBuf>,

    /// Print the final frame view as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();

    let args = Args::parse();

    let mut settings = match &args.settings {
        Some(path) => Settings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::default(),
    };
    if let Some(speed) = args.speed {
        settings.base_brick_speed = speed;
    }
    if let Some(path) = &args.level {
        settings.mode = GameMode::Level { path: path.clone() };
    }

    let seed = args.seed.or(settings.seed).unwrap_or_else(clock_seed);
    let mut state = settings
        .start_match(seed, 0.0)
        .context("starting match")?;
    log::info!("Hexanoid starting (seed {})", state.seed);

    let input = TickInput {
        autopilot: true,
        ..Default::default()
    };
    let mut now = 0.0;
    let mut destroyed = 0u64;
    let mut powerups = 0u64;

    for _ in 0..args.frames {
        now += FRAME_MS;
        tick(&mut state, &input, now);

        for event in &state.events {
            match event {
                GameEvent::BrickDestroyed { .. } => destroyed += 1,
                GameEvent::PowerupActivated(_) => powerups += 1,
                _ => {}
            }
        }

        if state.phase.is_terminal() {
            break;
        }
    }

    let outcome = match state.phase {
        GamePhase::GameOver => "game over",
        GamePhase::LevelComplete => "level complete",
        GamePhase::Running | GamePhase::Paused => "frame budget reached",
    };
    log::info!(
        "{}: score={} lives={} time={} bricks={} power-ups={} frames={}",
        outcome,
        state.score,
        state.lives,
        format_duration(state.elapsed_ms()),
        destroyed,
        powerups,
        state.frame
    );

    if let Some(path) = &args.scores {
        let mut scores = HighScores::load(path);
        match scores.add_score(state.score, state.elapsed_ms(), unix_ms()) {
            Some(rank) => {
                log::info!("New high score, rank #{rank}");
                scores
                    .save(path)
                    .with_context(|| format!("saving high scores to {}", path.display()))?;
            }
            None => log::info!("Score did not make the leaderboard"),
        }
    }

    if args.json {
        let view = FrameView::capture(&state, now);
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!(
            "{} | score {} | survived {}",
            outcome,
            state.score,
            format_duration(state.elapsed_ms())
        );
    }

    Ok(())
}

fn unix_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
