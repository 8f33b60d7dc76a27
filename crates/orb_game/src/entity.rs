//! Entities: one archetype instance on the stage.
//!
//! An entity exclusively owns its animator, motion state and behavior. The
//! archetype's table and atlas are shared; origin and hitbox are copied in at
//! spawn so they can be tuned per instance.

use std::sync::Arc;

use glam::DVec2;
use orb_core::animation::{AnimationError, Animator};
use orb_core::polar::Polar;

use crate::archetype::Archetype;
use crate::atlas::SpriteRect;
use crate::behavior::{Behavior, Command};
use crate::physics::MotionState;

pub struct Entity {
    pub archetype: Arc<Archetype>,
    pub animator: Animator,
    pub motion: MotionState,
    /// Sprite-local point drawn at `motion.position`.
    pub origin: DVec2,
    behavior: Box<dyn Behavior>,
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("archetype", &self.archetype.name)
            .field("behavior", &self.behavior.name())
            .field("animator", &self.animator)
            .field("motion", &self.motion)
            .finish()
    }
}

impl Entity {
    pub fn spawn(
        archetype: Arc<Archetype>,
        position: Polar,
        mut behavior: Box<dyn Behavior>,
    ) -> Result<Self, AnimationError> {
        let mut animator =
            Animator::new(Arc::clone(&archetype.table), &archetype.initial_animation)?;
        animator.buffer_events(true);
        let mut motion = MotionState::new(position, archetype.hitbox);
        behavior.on_spawn(&mut motion);
        log::info!(
            "Spawned '{}' at angle {:.3} radius {:.1}",
            archetype.name,
            position.angle,
            position.radius
        );
        Ok(Self {
            origin: archetype.origin,
            archetype,
            animator,
            motion,
            behavior,
        })
    }

    pub fn behavior_name(&self) -> &str {
        self.behavior.name()
    }

    pub fn command(&mut self, command: &Command) {
        self.behavior
            .apply_command(command, &mut self.motion, &self.animator);
    }

    /// Per-tick animation update, run after physics has moved the body.
    ///
    /// The behavior picks an animation from the freshly integrated motion,
    /// the animator advances, and every event fired along the way is handed
    /// back to the behavior in firing order. A one-shot clip that already
    /// finished but is requested again restarts from frame 1.
    pub fn update(&mut self, dt: f64) -> Result<(), AnimationError> {
        let rearmed = self.animator.is_finished() && self.behavior.awaits_finish();
        let next = self.behavior.decide_animation(&self.motion, &self.animator);
        if rearmed && next == self.animator.current_animation() {
            self.animator.change_animation(next)?;
        } else {
            self.animator.continue_animation(next)?;
        }
        self.animator.advance(dt)?;
        self.deliver_events();
        Ok(())
    }

    /// Hand buffered animator events to the behavior. Anything that drives
    /// the animator outside [`Entity::update`] calls this afterwards.
    pub fn deliver_events(&mut self) {
        for event in self.animator.take_fired_events() {
            self.behavior.on_animation_event(&event, &mut self.motion);
        }
    }

    /// Atlas rectangle of the current frame, if the sprite id resolves.
    pub fn sprite_rect(&self) -> Option<&SpriteRect> {
        let rect = self.archetype.atlas.resolve(self.animator.sprite_id());
        if rect.is_none() {
            log::warn!(
                "'{}' frame sprite '{}' is not in atlas '{}'",
                self.archetype.name,
                self.animator.sprite_id(),
                self.archetype.atlas.image
            );
        }
        rect
    }
}
