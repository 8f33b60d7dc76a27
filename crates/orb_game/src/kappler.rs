//! Kappler: an expression-only archetype.
//!
//! Twelve six-frame emotes, each looping back to frame 3. Kappler stands
//! where it is put and plays whatever mood it was last told to.

use std::sync::Arc;

use glam::DVec2;
use orb_core::animation::{AnimationClip, AnimationFrame, AnimationTable, Animator};
use orb_core::polar::HitRect;

use crate::archetype::Archetype;
use crate::atlas::SpriteAtlas;
use crate::behavior::{Behavior, Command};
use crate::physics::MotionState;

pub const NAME: &str = "kappler";
pub const SHEET_IMAGE: &str = "res/e_kappler.png";
pub const CELL_SIZE: u32 = 224;
pub const FRAME_MS: f64 = 75.0;
const FRAMES_PER_MOOD: usize = 6;
const LOOP_FROM: usize = 3;

pub const MOODS: [&str; 12] = [
    "happy", "flip", "conf", "nope", "sad", "relief", "mad", "silly", "despair", "shock", "cry",
    "clown",
];

fn mood_sprites(mood: &str) -> Vec<String> {
    (1..=FRAMES_PER_MOOD).map(|i| format!("{mood}{i}")).collect()
}

pub fn atlas() -> Result<SpriteAtlas, String> {
    let columns: Vec<Vec<String>> = MOODS.iter().map(|mood| mood_sprites(mood)).collect();
    let columns: Vec<&[String]> = columns.iter().map(Vec::as_slice).collect();
    SpriteAtlas::from_columns(SHEET_IMAGE, CELL_SIZE, CELL_SIZE, &columns)
}

pub fn animation_table() -> AnimationTable {
    let mut table = AnimationTable::new(NAME);
    for mood in MOODS {
        let frames = mood_sprites(mood)
            .into_iter()
            .map(|sprite| AnimationFrame::new(sprite, FRAME_MS))
            .collect();
        table.insert(mood, AnimationClip::new(frames).looping_from(LOOP_FROM));
    }
    table
}

pub fn archetype() -> Result<Archetype, String> {
    Ok(Archetype {
        name: NAME.to_string(),
        table: Arc::new(animation_table()),
        atlas: Arc::new(atlas()?),
        initial_animation: MOODS[0].to_string(),
        origin: DVec2::new(112.0, 112.0),
        hitbox: HitRect::new(70.0, 70.0, 84.0, 86.0),
    })
}

#[derive(Debug, Clone)]
pub struct KapplerBehavior {
    mood: String,
}

impl Default for KapplerBehavior {
    fn default() -> Self {
        Self {
            mood: MOODS[0].to_string(),
        }
    }
}

impl KapplerBehavior {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mood(&self) -> &str {
        &self.mood
    }
}

impl Behavior for KapplerBehavior {
    fn name(&self) -> &str {
        NAME
    }

    fn on_spawn(&mut self, motion: &mut MotionState) {
        motion.gravity = true;
    }

    fn apply_command(&mut self, command: &Command, _motion: &mut MotionState, animator: &Animator) {
        let Command::Emote(mood) = command else {
            return;
        };
        if animator.table().contains(mood) {
            self.mood = mood.clone();
        } else {
            log::warn!("{NAME} has no '{mood}' emote");
        }
    }

    fn decide_animation(&mut self, _motion: &MotionState, _animator: &Animator) -> &str {
        &self.mood
    }

    fn on_animation_event(&mut self, _event: &str, _motion: &mut MotionState) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::Facing;
    use crate::entity::Entity;
    use crate::floor::{Floor, FloorRegistry};
    use crate::physics::{step, PhysicsConfig};
    use orb_core::polar::Polar;

    fn spawn() -> Entity {
        Entity::spawn(
            Arc::new(archetype().unwrap()),
            Polar::new(0.0, 120.0),
            Box::new(KapplerBehavior::new()),
        )
        .unwrap()
    }

    #[test]
    fn archetype_has_twelve_looping_moods() {
        let archetype = archetype().unwrap();
        archetype.validate().unwrap();
        assert_eq!(archetype.table.len(), 12);
        assert_eq!(archetype.atlas.len(), 72);
        for mood in MOODS {
            let clip = archetype.table.get(mood).unwrap();
            assert_eq!(clip.frames.len(), 6);
            assert_eq!(clip.loop_target, Some(3));
            assert_eq!(clip.total_duration_ms(), 450.0);
        }
        assert_eq!(archetype.atlas.resolve("clown6").map(|r| (r.x, r.y)), Some((11 * 224, 5 * 224)));
    }

    #[test]
    fn emote_switches_mood_and_loops() {
        let mut k = spawn();
        k.command(&Command::Emote("mad".to_string()));
        for _ in 0..5 {
            k.update(75.0).unwrap();
        }
        assert_eq!(k.animator.current_animation(), "mad");
        assert_eq!(k.animator.frame_index(), 6);
        k.update(75.0).unwrap();
        assert_eq!(k.animator.frame_index(), 3);
        assert_eq!(k.animator.sprite_id(), "mad3");
    }

    #[test]
    fn unknown_emote_and_movement_are_ignored() {
        let mut k = spawn();
        k.command(&Command::Emote("bored".to_string()));
        k.command(&Command::Walk(Facing::Left));
        k.command(&Command::Jump);
        assert_eq!(k.motion.angular_velocity, 0.0);
        assert_eq!(k.motion.radial_velocity, 0.0);
        k.update(10.0).unwrap();
        assert_eq!(k.animator.current_animation(), "happy");
    }

    #[test]
    fn stands_on_the_floor() {
        let mut k = spawn();
        let floors = FloorRegistry::new("ring", vec![Floor::ring(100.0, 120.0)]);
        for _ in 0..30 {
            step(&mut k.motion, &floors, 16.0, &PhysicsConfig::default());
            k.update(16.0).unwrap();
        }
        assert!(k.motion.is_grounded());
        assert_eq!(k.motion.position.radius, 120.0);
    }
}
