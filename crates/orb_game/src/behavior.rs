//! Per-archetype decision logic layered over the shared animation and
//! physics substrate.
//!
//! A behavior never owns the animator or the motion state. Each tick the
//! entity asks it which animation should be playing, then hands back any
//! events the animator fired so the behavior can commit deferred state
//! (a finished turn, a completed landing).

use orb_core::animation::Animator;

use crate::physics::MotionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn sign(self) -> f64 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    pub fn is_flipped(self) -> bool {
        self == Self::Left
    }
}

/// Which lane a leap heads for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeapDepth {
    Background,
    Foreground,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WardStance {
    Side,
    Back,
    Front,
}

/// Requests from the input collaborator (or a replay).
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Walk(Facing),
    Jump,
    Face(Facing),
    Leap(LeapDepth),
    /// Hold a ward stance, or drop it with `None`.
    Ward(Option<WardStance>),
    Dodge,
    Swing,
    Hurt,
    Die,
    /// Play a named expression. Only expression-driven archetypes honour it.
    Emote(String),
}

pub trait Behavior {
    /// Short name for logs and inspectors.
    fn name(&self) -> &str;

    /// Prepare a freshly spawned entity's motion (gravity, facing).
    fn on_spawn(&mut self, _motion: &mut MotionState) {}

    /// Apply a command to the behavior's own state and the entity's motion.
    fn apply_command(&mut self, command: &Command, motion: &mut MotionState, animator: &Animator);

    /// True while a one-shot clip's finish event is still owed to this
    /// behavior. A finished clip that is still awaited is restarted.
    fn awaits_finish(&self) -> bool {
        false
    }

    /// Pick the animation that should be playing this tick.
    fn decide_animation(&mut self, motion: &MotionState, animator: &Animator) -> &str;

    /// React to an event fired by the entity's animator.
    fn on_animation_event(&mut self, event: &str, motion: &mut MotionState);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_sign_and_flip() {
        assert_eq!(Facing::Left.sign(), -1.0);
        assert_eq!(Facing::Right.sign(), 1.0);
        assert!(Facing::Left.is_flipped());
        assert!(!Facing::Right.is_flipped());
    }
}
