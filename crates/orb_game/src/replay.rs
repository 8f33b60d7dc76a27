use orb_core::input::Key;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::game::Game;
use orb_core::animation::AnimationError;

/// Scripted keyboard input for headless, deterministic runs.
#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    #[serde(default = "default_dt")]
    pub fixed_dt_ms: f64,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayFrame {
    /// Keys held during this frame. Anything not listed is released.
    #[serde(default)]
    pub keys: Vec<Key>,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl ReplaySequence {
    /// One entry per tick.
    pub fn expanded_keys(&self) -> Vec<&[Key]> {
        let mut out = Vec::new();
        for frame in &self.frames {
            for _ in 0..frame.repeat.max(1) {
                out.push(frame.keys.as_slice());
            }
        }
        out
    }

    pub fn tick_count(&self) -> usize {
        self.frames.iter().map(|f| f.repeat.max(1) as usize).sum()
    }

    /// Feed every tick into `game` at the replay's fixed step.
    pub fn play(&self, game: &mut Game) -> Result<(), AnimationError> {
        for keys in self.expanded_keys() {
            game.input.sync_held(keys);
            game.advance(self.fixed_dt_ms)?;
        }
        Ok(())
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), String> {
    if !replay.fixed_dt_ms.is_finite() || replay.fixed_dt_ms <= 0.0 {
        return Err("Replay validation failed: fixed_dt_ms must be finite and > 0".to_string());
    }
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    Ok(())
}

fn default_dt() -> f64 {
    1000.0 / 60.0
}

const fn default_repeat() -> u32 {
    1
}
