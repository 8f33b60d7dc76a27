//! The stage: floors, entities, the player, and the per-tick order.
//!
//! One tick is:
//!
//!   1. held and just-pressed keys become player commands
//!   2. for each entity, in spawn order: physics step, then animation update
//!
//! Rendering reads the result through [`Game::render_snapshots`] and never
//! mutates anything.

use std::sync::Arc;

use glam::DVec2;
use orb_core::animation::AnimationError;
use orb_core::input::{InputState, Key};
use orb_core::polar::{HitRect, Polar};

use crate::archetype::{Archetype, ArchetypeRegistry};
use crate::atlas::SpriteRect;
use crate::behavior::{Behavior, Command, Facing, WardStance};
use crate::config::GameConfig;
use crate::entity::Entity;
use crate::floor::FloorRegistry;
use crate::kappler::{self, KapplerBehavior};
use crate::physics;
use crate::resources::ResourceTracker;
use crate::woody::{self, WoodyBehavior};

/// Kappler stands a little clockwise of the player spawn.
const KAPPLER_SPAWN_OFFSET: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub usize);

/// Everything a renderer needs to draw one entity for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSnapshot {
    pub entity: EntityId,
    pub sprite_id: String,
    /// `None` when the sprite id does not resolve; the entity is skipped.
    pub rect: Option<SpriteRect>,
    pub image: String,
    pub image_ready: bool,
    pub position: DVec2,
    /// Radians; keeps the sprite upright relative to the centre.
    pub rotation: f64,
    pub flip: bool,
    pub origin: DVec2,
    pub hitbox: HitRect,
    pub flags: Vec<String>,
}

impl RenderSnapshot {
    pub fn is_drawable(&self) -> bool {
        self.image_ready && self.rect.is_some()
    }
}

#[derive(Debug)]
pub struct Game {
    pub config: GameConfig,
    pub floors: FloorRegistry,
    pub archetypes: ArchetypeRegistry,
    pub resources: ResourceTracker,
    pub input: InputState,
    entities: Vec<Entity>,
    player: EntityId,
    tick_count: u64,
}

impl Game {
    /// Build the stage, register both archetypes and spawn the player.
    pub fn new(config: GameConfig) -> Result<Self, String> {
        config.validate()?;
        let floors = config.load_stage()?;
        log::info!(
            "Stage '{}' loaded with {} floor(s)",
            floors.stage_id,
            floors.len()
        );

        let mut archetypes = ArchetypeRegistry::new();
        let woody = archetypes.register(woody::archetype()?)?;
        let kappler = archetypes.register(kappler::archetype()?)?;

        let mut game = Self {
            resources: ResourceTracker::new(config.resource_root.clone()),
            config,
            floors,
            archetypes,
            input: InputState::new(),
            entities: Vec::new(),
            player: EntityId(0),
            tick_count: 0,
        };

        let spawn = game.config.spawn_position();
        game.player = game.spawn(&woody, spawn, Box::new(WoodyBehavior::new()))?;
        if game.config.spawn_kappler {
            let position = Polar::new(spawn.angle + KAPPLER_SPAWN_OFFSET, spawn.radius);
            game.spawn(&kappler, position, Box::new(KapplerBehavior::new()))?;
        }
        Ok(game)
    }

    pub fn spawn(
        &mut self,
        archetype: &Arc<Archetype>,
        position: Polar,
        behavior: Box<dyn Behavior>,
    ) -> Result<EntityId, String> {
        self.resources.request(&archetype.atlas.image);
        let entity =
            Entity::spawn(Arc::clone(archetype), position, behavior).map_err(|e| e.to_string())?;
        self.entities.push(entity);
        Ok(EntityId(self.entities.len() - 1))
    }

    pub fn player_id(&self) -> EntityId {
        self.player
    }

    pub fn player(&self) -> Option<&Entity> {
        self.entity(self.player)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.0)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id.0)
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Send a command straight to one entity. Returns false for an unknown id.
    pub fn command(&mut self, id: EntityId, command: &Command) -> bool {
        match self.entities.get_mut(id.0) {
            Some(entity) => {
                entity.command(command);
                true
            }
            None => false,
        }
    }

    /// Player commands implied by the current keyboard state.
    pub fn input_commands(&self) -> Vec<Command> {
        let input = &self.input;
        let mut commands = Vec::new();
        if input.is_held(Key::Left) {
            commands.push(Command::Walk(Facing::Left));
        } else if input.is_held(Key::Right) {
            commands.push(Command::Walk(Facing::Right));
        }
        if input.is_held(Key::Up) {
            commands.push(Command::Jump);
        }
        if input.is_just_pressed(Key::Space) {
            commands.push(Command::Swing);
        }
        if input.is_just_pressed(Key::Down) {
            commands.push(Command::Dodge);
        }
        let stance = if input.is_held(Key::W) {
            Some(WardStance::Front)
        } else if input.is_held(Key::S) {
            Some(WardStance::Back)
        } else {
            None
        };
        commands.push(Command::Ward(stance));
        commands
    }

    /// Simulate `dt` milliseconds. Callers clamp `dt` (see `TickDriver`).
    pub fn advance(&mut self, dt: f64) -> Result<(), AnimationError> {
        let commands = self.input_commands();
        if let Some(player) = self.entities.get_mut(self.player.0) {
            for command in &commands {
                player.command(command);
            }
        }
        self.input.end_tick();

        for entity in &mut self.entities {
            physics::step(&mut entity.motion, &self.floors, dt, &self.config.physics);
            entity.update(dt)?;
        }
        self.tick_count += 1;
        Ok(())
    }

    pub fn render_snapshots(&self) -> Vec<RenderSnapshot> {
        self.entities
            .iter()
            .enumerate()
            .map(|(i, entity)| {
                let image = &entity.archetype.atlas.image;
                RenderSnapshot {
                    entity: EntityId(i),
                    sprite_id: entity.animator.sprite_id().to_string(),
                    rect: entity.sprite_rect().copied(),
                    image: image.clone(),
                    image_ready: self.resources.is_ready(image),
                    position: entity.motion.position.cartesian(),
                    rotation: entity.motion.position.upright_rotation(),
                    flip: entity.motion.flip,
                    origin: entity.origin,
                    hitbox: entity.motion.hitbox,
                    flags: entity.animator.current_flags().to_vec(),
                }
            })
            .collect()
    }
}
