//! Woody, the player character.
//!
//! The sheet is a 224x224 grid laid out column by column. Every animation
//! plays 80 ms frames; frame flags tell the behavior what the current pose
//! allows (`Midair` poses land, `NoControl` poses ignore movement commands).

use std::sync::Arc;

use glam::DVec2;
use orb_core::animation::{AnimationClip, AnimationFrame, AnimationTable, Animator};
use orb_core::polar::HitRect;

use crate::archetype::Archetype;
use crate::atlas::SpriteAtlas;
use crate::behavior::{Behavior, Command, Facing, LeapDepth, WardStance};
use crate::physics::MotionState;

pub const NAME: &str = "woody";
pub const SHEET_IMAGE: &str = "res/woody.png";
pub const CELL_SIZE: u32 = 224;

pub const FRAME_MS: f64 = 80.0;
pub const TURN_MS: f64 = 80.0;
pub const WALK_SPEED: f64 = 0.05;
pub const JUMP_STRENGTH: f64 = 0.7;
pub const DODGE_HOP: f64 = 0.35;
pub const DODGE_SPEED: f64 = 0.08;

pub const MIDAIR: &str = "Midair";
pub const NO_CONTROL: &str = "NoControl";
pub const WARD: &str = "Ward";
pub const WARD_BACK: &str = "WardB";
pub const WARD_FRONT: &str = "WardF";

pub const IDLE: &str = "idle";
pub const TURN: &str = "turn";
pub const TURN_JUMP: &str = "turn_jump";
pub const TURN_DJUMP: &str = "turn_djump";
pub const TURN_BLEAP: &str = "turn_bleap";
pub const TURN_FLEAP: &str = "turn_fleap";
pub const RUN: &str = "run";
pub const JUMP: &str = "jump";
pub const DJUMP: &str = "djump";
pub const LAND: &str = "land";
pub const BLEAP: &str = "bleap";
pub const FLEAP: &str = "fleap";
pub const SWING: &str = "swing";
pub const WARD_SIDE_ANIM: &str = "ward";
pub const WARD_BACK_ANIM: &str = "wardb";
pub const WARD_FRONT_ANIM: &str = "wardf";
pub const DODGE: &str = "dodge";
pub const DODGE_END: &str = "dodge_end";
pub const HURT: &str = "hurt";
pub const DEATH: &str = "death";

fn numbered(prefix: &str, count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("{prefix}{i}")).collect()
}

/// Column-major sheet layout.
pub fn sheet_columns() -> Vec<Vec<String>> {
    vec![
        vec![IDLE.to_string()],
        [TURN, TURN_JUMP, TURN_DJUMP, TURN_BLEAP, TURN_FLEAP]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        numbered("run", 12),
        numbered("jump", 6),
        numbered("djump", 6),
        numbered("land", 2),
        numbered("bleap", 6),
        numbered("fleap", 6),
        numbered("swing", 10),
        numbered("wardf", 4),
        numbered("ward", 4),
        numbered("wardb", 4),
        numbered("dodge", 10),
        numbered("hurt", 6),
        numbered("death", 16),
    ]
}

pub fn atlas() -> Result<SpriteAtlas, String> {
    let columns = sheet_columns();
    let columns: Vec<&[String]> = columns.iter().map(Vec::as_slice).collect();
    SpriteAtlas::from_columns(SHEET_IMAGE, CELL_SIZE, CELL_SIZE, &columns)
}

fn frames(prefix: &str, range: std::ops::RangeInclusive<usize>, flags: &[&str]) -> Vec<AnimationFrame> {
    range
        .map(|i| AnimationFrame::new(format!("{prefix}{i}"), FRAME_MS).with_flags(flags))
        .collect()
}

fn turn(sprite: &str, flags: &[&str]) -> AnimationClip {
    AnimationClip::new(vec![AnimationFrame::new(sprite, TURN_MS).with_flags(flags)])
        .with_finish_event(TURN)
}

pub fn animation_table() -> AnimationTable {
    AnimationTable::new(NAME)
        .with_clip(IDLE, AnimationClip::new(vec![AnimationFrame::hold(IDLE)]))
        .with_clip(TURN, turn(TURN, &[]))
        .with_clip(TURN_JUMP, turn(TURN_JUMP, &[MIDAIR]))
        .with_clip(TURN_DJUMP, turn(TURN_DJUMP, &[MIDAIR]))
        .with_clip(TURN_BLEAP, turn(TURN_BLEAP, &[MIDAIR]))
        .with_clip(TURN_FLEAP, turn(TURN_FLEAP, &[MIDAIR]))
        .with_clip(RUN, AnimationClip::new(frames("run", 1..=12, &[])).looping_from(1))
        .with_clip(
            JUMP,
            AnimationClip::new(frames("jump", 1..=6, &[MIDAIR])).looping_from(3),
        )
        .with_clip(
            DJUMP,
            AnimationClip::new(frames("djump", 1..=6, &[MIDAIR])).looping_from(3),
        )
        .with_clip(
            LAND,
            AnimationClip::new(frames("land", 1..=2, &[])).with_finish_event(LAND),
        )
        .with_clip(
            BLEAP,
            AnimationClip::new(frames("bleap", 1..=6, &[MIDAIR])).looping_from(3),
        )
        .with_clip(
            FLEAP,
            AnimationClip::new(frames("fleap", 1..=6, &[MIDAIR])).looping_from(3),
        )
        .with_clip(
            SWING,
            AnimationClip::new(frames("swing", 1..=10, &[])).with_finish_event(SWING),
        )
        .with_clip(
            WARD_FRONT_ANIM,
            AnimationClip::new(frames("wardf", 1..=4, &[WARD_FRONT])).looping_from(1),
        )
        .with_clip(
            WARD_SIDE_ANIM,
            AnimationClip::new(frames("ward", 1..=4, &[WARD])).looping_from(1),
        )
        .with_clip(
            WARD_BACK_ANIM,
            AnimationClip::new(frames("wardb", 1..=4, &[WARD_BACK])).looping_from(1),
        )
        .with_clip(
            DODGE,
            AnimationClip::new(frames("dodge", 1..=5, &[NO_CONTROL])).looping_from(3),
        )
        .with_clip(
            DODGE_END,
            AnimationClip::new(frames("dodge", 6..=10, &[NO_CONTROL])).with_finish_event(DODGE),
        )
        .with_clip(
            HURT,
            AnimationClip::new(frames("hurt", 1..=6, &[NO_CONTROL])).with_finish_event(HURT),
        )
        .with_clip(
            DEATH,
            AnimationClip::new(frames("death", 1..=16, &[NO_CONTROL])).with_finish_event(DEATH),
        )
}

pub fn archetype() -> Result<Archetype, String> {
    Ok(Archetype {
        name: NAME.to_string(),
        table: Arc::new(animation_table()),
        atlas: Arc::new(atlas()?),
        initial_animation: IDLE.to_string(),
        origin: DVec2::new(110.0, 175.0),
        hitbox: HitRect::new(62.0, 80.0, 102.0, 90.0),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Swing,
    Dodge,
    Hurt,
}

#[derive(Debug, Clone)]
pub struct WoodyBehavior {
    facing: Facing,
    /// Facing to commit when the running turn animation finishes.
    flipping_to: Option<Facing>,
    double_jump: bool,
    landing: bool,
    leap: Option<LeapDepth>,
    ward: Option<WardStance>,
    action: Option<Action>,
    dying: bool,
    dead: bool,
}

impl Default for WoodyBehavior {
    fn default() -> Self {
        Self {
            facing: Facing::Right,
            flipping_to: None,
            double_jump: false,
            landing: false,
            leap: None,
            ward: None,
            action: None,
            dying: false,
            dead: false,
        }
    }
}

impl WoodyBehavior {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn flipping_to(&self) -> Option<Facing> {
        self.flipping_to
    }

    pub fn can_double_jump(&self) -> bool {
        self.double_jump
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    fn face(&mut self, direction: Facing) {
        if self.facing == direction && self.flipping_to.is_none() {
            return;
        }
        self.flipping_to = Some(direction);
    }

    fn walk(&mut self, direction: Facing, motion: &mut MotionState) {
        motion.angular_velocity = direction.sign() * WALK_SPEED;
        self.face(direction);
    }

    fn jump(&mut self, motion: &mut MotionState) {
        if motion.is_rising() || !(motion.is_grounded() || self.double_jump) {
            return;
        }
        motion.radial_velocity = JUMP_STRENGTH;
        self.leap = None;
        if self.double_jump && !motion.is_grounded() {
            self.double_jump = false;
        }
    }

    fn leap(&mut self, depth: LeapDepth, motion: &mut MotionState) {
        if motion.is_rising() || !motion.is_grounded() {
            return;
        }
        motion.radial_velocity = JUMP_STRENGTH;
        self.leap = Some(depth);
    }

    fn dodge(&mut self, motion: &mut MotionState) {
        if self.action.is_some() {
            return;
        }
        if motion.is_grounded() {
            motion.radial_velocity = DODGE_HOP;
        }
        motion.angular_velocity = self.facing.sign() * DODGE_SPEED;
        self.action = Some(Action::Dodge);
    }

    fn turn_animation(&self, motion: &MotionState) -> &'static str {
        if motion.is_grounded() {
            return TURN;
        }
        match self.leap {
            Some(LeapDepth::Background) => TURN_BLEAP,
            Some(LeapDepth::Foreground) => TURN_FLEAP,
            None if self.double_jump => TURN_JUMP,
            None => TURN_DJUMP,
        }
    }

    fn grounded_animation(&mut self, animator: &Animator) -> &'static str {
        if animator.current_frame().has_flag(MIDAIR) || self.landing {
            self.double_jump = true;
            self.landing = true;
            self.leap = None;
            return LAND;
        }
        self.leap = None;
        match self.ward {
            Some(WardStance::Side) => WARD_SIDE_ANIM,
            Some(WardStance::Back) => WARD_BACK_ANIM,
            Some(WardStance::Front) => WARD_FRONT_ANIM,
            None => IDLE,
        }
    }

    fn airborne_animation(&self) -> &'static str {
        match self.leap {
            Some(LeapDepth::Background) => BLEAP,
            Some(LeapDepth::Foreground) => FLEAP,
            None if self.double_jump => JUMP,
            None => DJUMP,
        }
    }
}

impl Behavior for WoodyBehavior {
    fn name(&self) -> &str {
        NAME
    }

    fn on_spawn(&mut self, motion: &mut MotionState) {
        motion.gravity = true;
        motion.flip = self.facing.is_flipped();
    }

    fn apply_command(&mut self, command: &Command, motion: &mut MotionState, animator: &Animator) {
        if self.dead || self.dying {
            return;
        }
        let locked = animator.current_frame().has_flag(NO_CONTROL);
        match command {
            Command::Walk(direction) if !locked => self.walk(*direction, motion),
            Command::Face(direction) if !locked => self.face(*direction),
            Command::Jump if !locked => self.jump(motion),
            Command::Leap(depth) if !locked => self.leap(*depth, motion),
            Command::Dodge if !locked => self.dodge(motion),
            Command::Swing if !locked && self.action.is_none() => {
                self.action = Some(Action::Swing);
            }
            Command::Ward(stance) => self.ward = *stance,
            Command::Hurt => {
                motion.angular_velocity = 0.0;
                self.action = Some(Action::Hurt);
            }
            Command::Die => {
                motion.angular_velocity = 0.0;
                self.dying = true;
                self.action = Some(Action::Hurt);
            }
            _ => {}
        }
    }

    fn awaits_finish(&self) -> bool {
        !self.dead && (self.action.is_some() || self.flipping_to.is_some())
    }

    fn decide_animation(&mut self, motion: &MotionState, animator: &Animator) -> &str {
        if self.dead {
            return DEATH;
        }
        match self.action {
            Some(Action::Hurt) => return HURT,
            Some(Action::Dodge) if motion.is_grounded() => return DODGE_END,
            Some(Action::Dodge) => return DODGE,
            Some(Action::Swing) => return SWING,
            None => {}
        }
        if self.flipping_to.is_some() {
            return self.turn_animation(motion);
        }
        if motion.is_grounded() {
            let pose = self.grounded_animation(animator);
            if pose == IDLE && motion.angular_velocity != 0.0 {
                return RUN;
            }
            return pose;
        }
        self.airborne_animation()
    }

    fn on_animation_event(&mut self, event: &str, motion: &mut MotionState) {
        match event {
            LAND => self.landing = false,
            TURN => {
                self.facing = self.flipping_to.take().unwrap_or(self.facing);
                motion.flip = self.facing.is_flipped();
            }
            SWING if self.action == Some(Action::Swing) => self.action = None,
            DODGE if self.action == Some(Action::Dodge) => self.action = None,
            HURT if self.action == Some(Action::Hurt) => {
                self.action = None;
                if self.dying {
                    self.dying = false;
                    self.dead = true;
                }
            }
            DEATH => log::info!("{NAME} is down"),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use crate::floor::{Floor, FloorRegistry};
    use crate::physics::{step, PhysicsConfig};
    use orb_core::polar::Polar;
    use std::f64::consts::FRAC_PI_2;

    const DT: f64 = 1000.0 / 60.0;

    struct Rig {
        woody: Entity,
        floors: FloorRegistry,
        config: PhysicsConfig,
    }

    impl Rig {
        fn new(radius: f64) -> Self {
            let archetype = Arc::new(archetype().expect("woody archetype"));
            let woody = Entity::spawn(
                archetype,
                Polar::new(-FRAC_PI_2, radius),
                Box::new(WoodyBehavior::new()),
            )
            .expect("spawn woody");
            Self {
                woody,
                floors: FloorRegistry::new("ring", vec![Floor::ring(100.0, 120.0)]),
                config: PhysicsConfig::default(),
            }
        }

        fn grounded() -> Self {
            let mut rig = Self::new(150.0);
            rig.run_until(|w| w.animator.current_animation() == IDLE && w.motion.is_grounded());
            rig
        }

        fn tick(&mut self, commands: &[Command]) {
            for command in commands {
                self.woody.command(command);
            }
            step(&mut self.woody.motion, &self.floors, DT, &self.config);
            self.woody.update(DT).expect("update");
        }

        fn run_until(&mut self, done: impl Fn(&Entity) -> bool) -> usize {
            for ticks in 0..1_000 {
                if done(&self.woody) {
                    return ticks;
                }
                self.tick(&[]);
            }
            panic!("condition never reached: {:?}", self.woody);
        }

        fn anim(&self) -> &str {
            self.woody.animator.current_animation()
        }
    }

    #[test]
    fn archetype_is_consistent() {
        let archetype = archetype().unwrap();
        archetype.validate().expect("every frame resolves");
        assert_eq!(archetype.table.len(), 20);
        assert_eq!(archetype.atlas.len(), 1 + 5 + 12 + 6 + 6 + 2 + 6 + 6 + 10 + 12 + 10 + 6 + 16);
        assert_eq!(archetype.atlas.resolve("turn_djump").map(|r| (r.x, r.y)), Some((224, 448)));
        assert_eq!(archetype.atlas.resolve("death16").map(|r| r.x), Some(14 * 224));
        let events = archetype.table.event_names();
        for event in [TURN, LAND, SWING, DODGE, HURT, DEATH] {
            assert!(events.contains(event), "missing event {event}");
        }
    }

    #[test]
    fn falls_then_lands_then_idles() {
        let mut rig = Rig::new(150.0);
        rig.tick(&[]);
        assert_eq!(rig.anim(), DJUMP);
        assert!(!rig.woody.motion.is_grounded());

        rig.run_until(|w| w.motion.is_grounded());
        assert_eq!(rig.woody.motion.position.radius, 120.0);
        assert_eq!(rig.anim(), LAND);

        rig.run_until(|w| w.animator.current_animation() == IDLE);
        assert!(rig.woody.motion.is_grounded());
    }

    #[test]
    fn walking_turns_before_committing_facing() {
        let mut rig = Rig::grounded();
        rig.tick(&[Command::Walk(Facing::Left)]);
        assert_eq!(rig.anim(), TURN);
        assert!(!rig.woody.motion.flip);

        // The turn is 80 ms long: facing commits on the fifth 60 Hz tick.
        for _ in 0..3 {
            rig.tick(&[Command::Walk(Facing::Left)]);
        }
        assert!(!rig.woody.motion.flip);
        rig.tick(&[Command::Walk(Facing::Left)]);
        assert!(rig.woody.motion.flip);
        assert_eq!(rig.anim(), TURN);

        rig.tick(&[Command::Walk(Facing::Left)]);
        assert_eq!(rig.anim(), RUN);
        assert!(rig.woody.motion.angular_velocity < 0.0);
    }

    #[test]
    fn reversing_mid_turn_ends_facing_the_latest_direction() {
        let mut rig = Rig::grounded();
        rig.tick(&[Command::Face(Facing::Left)]);
        rig.tick(&[Command::Face(Facing::Right)]);
        rig.run_until(|w| w.animator.current_animation() != TURN);
        assert!(!rig.woody.motion.flip);
    }

    #[test]
    fn turning_back_right_after_a_turn_commits() {
        let mut rig = Rig::grounded();
        rig.tick(&[Command::Face(Facing::Left)]);
        rig.run_until(|w| w.motion.flip);
        assert!(rig.woody.animator.is_finished());

        rig.tick(&[Command::Face(Facing::Right)]);
        assert_eq!(rig.anim(), TURN);
        assert!(!rig.woody.animator.is_finished());
        rig.run_until(|w| !w.motion.flip);
        rig.run_until(|w| w.animator.current_animation() == IDLE);
    }

    #[test]
    fn running_stops_to_idle_through_friction() {
        let mut rig = Rig::grounded();
        rig.tick(&[Command::Walk(Facing::Right)]);
        assert_eq!(rig.anim(), RUN);
        rig.run_until(|w| w.animator.current_animation() == IDLE);
        assert_eq!(rig.woody.motion.angular_velocity, 0.0);
    }

    #[test]
    fn jump_and_double_jump() {
        let mut rig = Rig::grounded();
        rig.tick(&[Command::Jump]);
        assert_eq!(rig.anim(), JUMP);
        assert!(rig.woody.motion.is_rising());

        // Still rising: a second jump is ignored.
        let vr = rig.woody.motion.radial_velocity;
        rig.tick(&[Command::Jump]);
        assert!(rig.woody.motion.radial_velocity < vr);

        rig.run_until(|w| !w.motion.is_rising());
        rig.tick(&[Command::Jump]);
        assert!(rig.woody.motion.is_rising());
        assert_eq!(rig.anim(), DJUMP);

        // Both jumps spent until the next landing.
        rig.run_until(|w| !w.motion.is_rising());
        rig.tick(&[Command::Jump]);
        assert!(!rig.woody.motion.is_rising());

        rig.run_until(|w| w.motion.is_grounded());
        assert_eq!(rig.anim(), LAND);
    }

    #[test]
    fn airborne_turn_uses_jump_variant() {
        let mut rig = Rig::grounded();
        rig.tick(&[Command::Jump]);
        rig.tick(&[Command::Face(Facing::Left)]);
        assert_eq!(rig.anim(), TURN_JUMP);
        assert!(rig.woody.animator.current_frame().has_flag(MIDAIR));
    }

    #[test]
    fn leap_plays_lane_animation() {
        let mut rig = Rig::grounded();
        rig.tick(&[Command::Leap(LeapDepth::Background)]);
        assert_eq!(rig.anim(), BLEAP);
        rig.tick(&[Command::Face(Facing::Left)]);
        assert_eq!(rig.anim(), TURN_BLEAP);

        rig.run_until(|w| w.motion.is_grounded());
        rig.run_until(|w| w.animator.current_animation() == IDLE);
    }

    #[test]
    fn swing_plays_once() {
        let mut rig = Rig::grounded();
        rig.tick(&[Command::Swing]);
        assert_eq!(rig.anim(), SWING);
        let ticks = rig.run_until(|w| w.animator.current_animation() != SWING);
        assert!(ticks >= 40, "swing ended after {ticks} ticks");
        assert_eq!(rig.anim(), IDLE);
    }

    #[test]
    fn swing_again_right_after_one_ends() {
        let mut rig = Rig::grounded();
        rig.tick(&[Command::Swing]);
        rig.run_until(|w| w.animator.is_finished());
        assert_eq!(rig.anim(), SWING);

        rig.tick(&[Command::Swing]);
        assert_eq!(rig.anim(), SWING);
        assert_eq!(rig.woody.animator.frame_index(), 1);
        rig.run_until(|w| w.animator.current_animation() == IDLE);
    }

    #[test]
    fn ward_stances_follow_command() {
        let mut rig = Rig::grounded();
        rig.tick(&[Command::Ward(Some(WardStance::Front))]);
        assert_eq!(rig.anim(), WARD_FRONT_ANIM);
        assert!(rig.woody.animator.current_frame().has_flag(WARD_FRONT));
        rig.tick(&[Command::Ward(Some(WardStance::Back))]);
        assert_eq!(rig.anim(), WARD_BACK_ANIM);
        rig.tick(&[Command::Ward(None)]);
        assert_eq!(rig.anim(), IDLE);
    }

    #[test]
    fn dodge_locks_control_until_recovery() {
        let mut rig = Rig::grounded();
        rig.tick(&[Command::Dodge]);
        assert_eq!(rig.anim(), DODGE);
        assert!(rig.woody.motion.angular_velocity > 0.0);

        rig.tick(&[Command::Jump]);
        assert!(rig.woody.motion.radial_velocity < DODGE_HOP);

        rig.run_until(|w| w.animator.current_animation() == DODGE_END);
        rig.run_until(|w| w.animator.current_animation() == IDLE);
    }

    #[test]
    fn hurt_twice_then_die_still_reaches_death() {
        let mut rig = Rig::grounded();
        rig.tick(&[Command::Hurt]);
        rig.run_until(|w| w.animator.is_finished());
        assert_eq!(rig.anim(), HURT);

        rig.tick(&[Command::Hurt]);
        assert!(!rig.woody.animator.is_finished());
        rig.run_until(|w| w.animator.current_animation() == IDLE);

        rig.tick(&[Command::Hurt]);
        rig.run_until(|w| w.animator.is_finished());
        rig.tick(&[Command::Die]);
        assert_eq!(rig.anim(), HURT);
        rig.run_until(|w| w.animator.current_animation() == DEATH);
    }

    #[test]
    fn die_plays_hurt_then_death_and_ignores_input() {
        let mut rig = Rig::grounded();
        rig.tick(&[Command::Die]);
        assert_eq!(rig.anim(), HURT);
        rig.run_until(|w| w.animator.current_animation() == DEATH);
        rig.tick(&[Command::Walk(Facing::Left), Command::Jump]);
        assert_eq!(rig.woody.motion.angular_velocity, 0.0);
        assert!(!rig.woody.motion.is_rising());
        rig.run_until(|w| w.animator.is_finished());
        assert_eq!(rig.woody.animator.sprite_id(), "death16");
        rig.tick(&[]);
        assert_eq!(rig.anim(), DEATH);
    }
}
