use crate::Action;
use glam::Vec3;
use std::collections::HashSet;

const SPRINT_MULTIPLIER: f32 = 3.0;

/// Which actions are currently held.
#[derive(Debug, Default, Clone)]
pub struct ActionState {
    held: HashSet<Action>,
}

impl ActionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `action` held. Returns `true` only on the press edge, so key
    /// repeat does not re-trigger one-shot actions.
    pub fn press(&mut self, action: Action) -> bool {
        self.held.insert(action)
    }

    /// Returns `true` if the action was held.
    pub fn release(&mut self, action: Action) -> bool {
        self.held.remove(&action)
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    /// Drop everything, e.g. when the window loses focus and release
    /// events would be missed.
    pub fn clear(&mut self) {
        self.held.clear();
    }

    /// Movement intent: x = right, y = up, z = forward. Components are
    /// -1, 0 or 1.
    pub fn movement_axes(&self) -> Vec3 {
        Vec3::new(
            self.axis(Action::StrafeRight, Action::StrafeLeft),
            self.axis(Action::Ascend, Action::Descend),
            self.axis(Action::MoveForward, Action::MoveBackward),
        )
    }

    pub fn speed_multiplier(&self) -> f32 {
        if self.is_held(Action::Sprint) {
            SPRINT_MULTIPLIER
        } else {
            1.0
        }
    }

    fn axis(&self, positive: Action, negative: Action) -> f32 {
        let mut v = 0.0;
        if self.is_held(positive) {
            v += 1.0;
        }
        if self.is_held(negative) {
            v -= 1.0;
        }
        v
    }
}
