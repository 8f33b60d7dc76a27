//! Animation tuning surface.
//!
//! Lets a tool list an entity's animations, force one to play, preview it
//! without the behavior interfering, flip the sprite, and edit origin and
//! hitbox in place. An [`EventLog`] attached through [`Inspector::attach`]
//! shows the most recent event and fades it out over two seconds.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use glam::DVec2;
use orb_core::animation::{AnimationError, AnimationListener};
use orb_core::polar::HitRect;

use crate::entity::Entity;

const EVENT_FADE_MS: f64 = 2000.0;

#[derive(Debug, Default)]
pub struct EventLog {
    last: Option<String>,
    opacity: f64,
    total: usize,
}

impl EventLog {
    fn record(&mut self, event: &str) {
        self.last = Some(event.to_string());
        self.opacity = 1.0;
        self.total += 1;
    }

    pub fn advance(&mut self, dt: f64) {
        self.opacity = (self.opacity - dt / EVENT_FADE_MS).max(0.0);
    }

    pub fn last(&self) -> Option<&str> {
        self.last.as_deref()
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

/// What the tuning panel shows for the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReadout {
    pub animation: String,
    pub frame_index: usize,
    pub sprite_id: String,
    pub flags: Vec<String>,
}

#[derive(Default)]
pub struct Inspector {
    log: Rc<RefCell<EventLog>>,
    listeners: HashMap<String, AnimationListener>,
}

impl std::fmt::Debug for Inspector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inspector")
            .field("log", &self.log.borrow())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Inspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen for every event name the entity's table can fire. Attaching
    /// the same entity twice registers nothing new. Returns how many
    /// listeners were added.
    pub fn attach(&mut self, entity: &mut Entity) -> usize {
        let events: Vec<String> = entity
            .animator
            .table()
            .event_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let mut added = 0;
        for event in events {
            let listener = self.listener_for(&event);
            if entity.animator.on(&event, listener) {
                added += 1;
            }
        }
        added
    }

    pub fn detach(&self, entity: &mut Entity) -> usize {
        let mut removed = 0;
        for (event, listener) in &self.listeners {
            if entity.animator.off(event, listener) {
                removed += 1;
            }
        }
        removed
    }

    fn listener_for(&mut self, event: &str) -> AnimationListener {
        if let Some(existing) = self.listeners.get(event) {
            return Rc::clone(existing);
        }
        let log = Rc::clone(&self.log);
        let name = event.to_string();
        let listener: AnimationListener = Rc::new(move || log.borrow_mut().record(&name));
        self.listeners.insert(event.to_string(), Rc::clone(&listener));
        listener
    }

    pub fn last_event(&self) -> Option<String> {
        self.log.borrow().last().map(str::to_string)
    }

    pub fn event_opacity(&self) -> f64 {
        self.log.borrow().opacity()
    }

    pub fn events_seen(&self) -> usize {
        self.log.borrow().total()
    }

    pub fn animation_names<'a>(&self, entity: &'a Entity) -> Vec<&'a str> {
        entity.animator.animation_names()
    }

    pub fn readout(&self, entity: &Entity) -> FrameReadout {
        FrameReadout {
            animation: entity.animator.current_animation().to_string(),
            frame_index: entity.animator.frame_index(),
            sprite_id: entity.animator.sprite_id().to_string(),
            flags: entity.animator.current_flags().to_vec(),
        }
    }

    /// Restart `name` from frame 1, even if it is already playing.
    pub fn force_animation(&self, entity: &mut Entity, name: &str) -> Result<(), AnimationError> {
        entity.animator.change_animation(name)?;
        entity.deliver_events();
        Ok(())
    }

    /// Advance only the animator, without physics or a new animation
    /// decision. Fired events still reach the behavior.
    pub fn preview(&mut self, entity: &mut Entity, dt: f64) -> Result<(), AnimationError> {
        entity.animator.advance(dt)?;
        entity.deliver_events();
        self.log.borrow_mut().advance(dt);
        Ok(())
    }

    pub fn set_flip(&self, entity: &mut Entity, flip: bool) {
        entity.motion.flip = flip;
    }

    pub fn origin(&self, entity: &Entity) -> DVec2 {
        entity.origin
    }

    pub fn set_origin(&self, entity: &mut Entity, origin: DVec2) {
        entity.origin = origin;
    }

    pub fn hitbox(&self, entity: &Entity) -> HitRect {
        entity.motion.hitbox
    }

    pub fn set_hitbox(&self, entity: &mut Entity, hitbox: HitRect) -> Result<(), String> {
        let values = [hitbox.x, hitbox.y, hitbox.w, hitbox.h];
        if values.iter().any(|v| !v.is_finite()) || hitbox.w < 0.0 || hitbox.h < 0.0 {
            return Err("Hitbox validation failed: need finite values and w, h >= 0".to_string());
        }
        entity.motion.hitbox = hitbox;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::{Command, Facing};
    use crate::kappler::{self, KapplerBehavior};
    use crate::woody::{self, WoodyBehavior};
    use orb_core::polar::Polar;
    use std::sync::Arc;

    fn woody() -> Entity {
        Entity::spawn(
            Arc::new(woody::archetype().unwrap()),
            Polar::new(0.0, 150.0),
            Box::new(WoodyBehavior::new()),
        )
        .unwrap()
    }

    #[test]
    fn lists_names_and_reads_frames() {
        let inspector = Inspector::new();
        let mut e = woody();
        let names = inspector.animation_names(&e);
        assert_eq!(names.len(), 20);
        assert_eq!(names[0], woody::IDLE);
        assert!(names.contains(&woody::DODGE_END));

        inspector.force_animation(&mut e, woody::HURT).unwrap();
        assert_eq!(
            inspector.readout(&e),
            FrameReadout {
                animation: woody::HURT.to_string(),
                frame_index: 1,
                sprite_id: "hurt1".to_string(),
                flags: vec![woody::NO_CONTROL.to_string()],
            }
        );
        assert!(inspector.force_animation(&mut e, "moonwalk").is_err());
        assert_eq!(e.animator.current_animation(), woody::HURT);
    }

    #[test]
    fn preview_reports_events_and_fades() {
        let mut inspector = Inspector::new();
        let mut e = woody();
        let added = inspector.attach(&mut e);
        assert_eq!(added, e.animator.table().event_names().len());
        assert_eq!(inspector.attach(&mut e), 0);

        inspector.force_animation(&mut e, woody::LAND).unwrap();
        inspector.preview(&mut e, 80.0).unwrap();
        assert_eq!(inspector.last_event(), None);
        inspector.preview(&mut e, 80.0).unwrap();
        assert_eq!(inspector.last_event().as_deref(), Some(woody::LAND));
        assert!(inspector.event_opacity() > 0.9);

        inspector.preview(&mut e, 1000.0).unwrap();
        assert!((inspector.event_opacity() - 0.46).abs() < 1e-9);
        inspector.preview(&mut e, 5000.0).unwrap();
        assert_eq!(inspector.event_opacity(), 0.0);
        assert_eq!(inspector.events_seen(), 1);

        assert_eq!(inspector.detach(&mut e), added);
        assert_eq!(e.animator.listener_count(woody::LAND), 0);
    }

    #[test]
    fn preview_mid_turn_commits_the_facing() {
        let mut inspector = Inspector::new();
        let mut e = woody();
        e.command(&Command::Face(Facing::Left));
        e.update(1.0).unwrap();
        assert_eq!(e.animator.current_animation(), woody::TURN_DJUMP);
        assert!(!e.motion.flip);

        inspector.preview(&mut e, woody::TURN_MS).unwrap();
        assert!(e.animator.is_finished());
        assert!(e.motion.flip);

        e.update(1.0).unwrap();
        assert_eq!(e.animator.current_animation(), woody::DJUMP);
    }

    #[test]
    fn one_inspector_serves_several_archetypes() {
        let mut inspector = Inspector::new();
        let mut w = woody();
        let mut k = Entity::spawn(
            Arc::new(kappler::archetype().unwrap()),
            Polar::new(0.0, 150.0),
            Box::new(KapplerBehavior::new()),
        )
        .unwrap();
        inspector.attach(&mut w);
        assert_eq!(inspector.attach(&mut k), 0);
        assert_eq!(inspector.animation_names(&k).len(), 12);
    }

    #[test]
    fn edits_origin_hitbox_and_flip() {
        let inspector = Inspector::new();
        let mut e = woody();
        assert_eq!(inspector.origin(&e), DVec2::new(110.0, 175.0));
        inspector.set_origin(&mut e, DVec2::new(100.0, 170.0));
        assert_eq!(e.origin, DVec2::new(100.0, 170.0));
        assert_eq!(e.archetype.origin, DVec2::new(110.0, 175.0));

        inspector
            .set_hitbox(&mut e, HitRect::new(60.0, 80.0, 100.0, 95.0))
            .unwrap();
        assert_eq!(inspector.hitbox(&e).h, 95.0);
        assert!(inspector
            .set_hitbox(&mut e, HitRect::new(0.0, 0.0, -1.0, 5.0))
            .is_err());
        assert_eq!(inspector.hitbox(&e).w, 100.0);

        inspector.set_flip(&mut e, true);
        assert!(e.motion.flip);
    }
}
