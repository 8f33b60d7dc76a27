//! Archetypes: the fixed, shared data behind every instance of a character.
//!
//! An archetype bundles an animation table, the sprite atlas its frames draw
//! from, the initial animation, and the sprite-local origin and hitbox. It is
//! built once and handed out behind an `Arc`; instances copy the origin and
//! hitbox so tuning one instance never leaks into another.

use std::collections::HashMap;
use std::sync::Arc;

use glam::DVec2;
use orb_core::animation::AnimationTable;
use orb_core::polar::HitRect;

use crate::atlas::SpriteAtlas;

#[derive(Debug, Clone)]
pub struct Archetype {
    pub name: String,
    pub table: Arc<AnimationTable>,
    pub atlas: Arc<SpriteAtlas>,
    pub initial_animation: String,
    /// Sprite-local point that sits on the entity's position.
    pub origin: DVec2,
    pub hitbox: HitRect,
}

impl Archetype {
    /// Check that the table is well-formed, the initial animation exists and
    /// every frame's sprite resolves in the atlas.
    pub fn validate(&self) -> Result<(), String> {
        self.table
            .validate()
            .map_err(|e| format!("Archetype '{}': {e}", self.name))?;
        if !self.table.contains(&self.initial_animation) {
            return Err(format!(
                "Archetype '{}' starts on missing animation '{}'",
                self.name, self.initial_animation
            ));
        }
        for (clip_name, clip) in self.table.clips() {
            for frame in &clip.frames {
                if !self.atlas.contains(&frame.sprite_id) {
                    return Err(format!(
                        "Archetype '{}' clip '{}' references missing sprite_id '{}'",
                        self.name, clip_name, frame.sprite_id
                    ));
                }
            }
        }
        if self.hitbox.w < 0.0 || self.hitbox.h < 0.0 {
            return Err(format!(
                "Archetype '{}' has a negative hitbox dimension",
                self.name
            ));
        }
        Ok(())
    }
}

/// Validated archetypes keyed by name.
#[derive(Debug, Default)]
pub struct ArchetypeRegistry {
    archetypes: HashMap<String, Arc<Archetype>>,
}

impl ArchetypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register. Rejects a second archetype under the same name.
    pub fn register(&mut self, archetype: Archetype) -> Result<Arc<Archetype>, String> {
        if self.archetypes.contains_key(&archetype.name) {
            return Err(format!("Duplicate archetype '{}'", archetype.name));
        }
        archetype.validate()?;
        log::info!(
            "Registered archetype '{}' ({} animations, {} sprites)",
            archetype.name,
            archetype.table.len(),
            archetype.atlas.len()
        );
        let archetype = Arc::new(archetype);
        self.archetypes
            .insert(archetype.name.clone(), Arc::clone(&archetype));
        Ok(archetype)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Archetype>> {
        self.archetypes.get(name)
    }

    /// Registered names, sorted for stable selection lists.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.archetypes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
