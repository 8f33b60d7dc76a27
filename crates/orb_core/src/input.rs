//! Input state tracking with both edge-triggered and level-triggered queries.
//!
//! - **Level-triggered (held):** `is_held(key)` is true every tick the key is
//!   down. Walking, jumping and warding read this.
//!
//! - **Edge-triggered (just_pressed / just_released):** true only for the tick
//!   the transition happened, cleared by `end_tick()`. One-shot actions such
//!   as a swing or a dodge read this so holding the key does not retrigger.

use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Space,
    W,
    S,
}

#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<Key>,
    just_pressed: HashSet<Key>,
    just_released: HashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: Key) {
        if self.held.insert(key) {
            self.just_pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if self.held.remove(&key) {
            self.just_released.insert(key);
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    pub fn is_just_released(&self, key: Key) -> bool {
        self.just_released.contains(&key)
    }

    /// Make exactly `keys` held, recording the presses and releases needed to
    /// get there. Replays drive input through this.
    pub fn sync_held(&mut self, keys: &[Key]) {
        let released: Vec<Key> = self
            .held
            .iter()
            .copied()
            .filter(|k| !keys.contains(k))
            .collect();
        for key in released {
            self.key_up(key);
        }
        for &key in keys {
            self.key_down(key);
        }
    }

    pub fn end_tick(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_down_sets_held_and_just_pressed() {
        let mut input = InputState::new();
        input.key_down(Key::Left);
        assert!(input.is_held(Key::Left));
        assert!(input.is_just_pressed(Key::Left));
    }

    #[test]
    fn key_up_clears_held_sets_just_released() {
        let mut input = InputState::new();
        input.key_down(Key::Left);
        input.key_up(Key::Left);
        assert!(!input.is_held(Key::Left));
        assert!(input.is_just_released(Key::Left));
    }

    #[test]
    fn key_repeat_does_not_retrigger() {
        let mut input = InputState::new();
        input.key_down(Key::Space);
        input.end_tick();
        // OS key repeat delivers another down while still held.
        input.key_down(Key::Space);
        assert!(input.is_held(Key::Space));
        assert!(!input.is_just_pressed(Key::Space));
    }

    #[test]
    fn key_up_without_down_is_no_op() {
        let mut input = InputState::new();
        input.key_up(Key::Up);
        assert!(!input.is_just_released(Key::Up));
        assert!(!input.is_held(Key::Up));
    }

    #[test]
    fn end_tick_clears_transient_state_only() {
        let mut input = InputState::new();
        input.key_down(Key::Right);
        input.key_down(Key::Up);
        input.key_down(Key::Down);
        input.key_up(Key::Down);
        input.end_tick();
        assert!(!input.is_just_pressed(Key::Right));
        assert!(!input.is_just_released(Key::Down));
        assert!(input.is_held(Key::Right));
        assert!(input.is_held(Key::Up));
    }

    #[test]
    fn sync_held_records_transitions() {
        let mut input = InputState::new();
        input.sync_held(&[Key::Left, Key::Up]);
        assert!(input.is_just_pressed(Key::Left));
        input.end_tick();

        input.sync_held(&[Key::Up, Key::Space]);
        assert!(input.is_just_released(Key::Left));
        assert!(input.is_just_pressed(Key::Space));
        assert!(!input.is_just_pressed(Key::Up));
        assert!(input.is_held(Key::Up));
        assert!(!input.is_held(Key::Left));
    }
}
