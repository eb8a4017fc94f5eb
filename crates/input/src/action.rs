use std::collections::HashMap;
use winit::keyboard::KeyCode;

/// Something the user asked the demo to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MoveForward,
    MoveBackward,
    StrafeLeft,
    StrafeRight,
    Ascend,
    Descend,
    /// Held: multiply movement speed.
    Sprint,
    /// Grab/release the cursor for mouse look.
    ToggleMouseLook,
    /// Show/hide the debug overlay.
    ToggleOverlay,
    /// Put the sphere back at its spawn point.
    ResetPhysics,
    Quit,
}

impl Action {
    /// Actions that act once per press rather than while held.
    pub fn is_one_shot(self) -> bool {
        matches!(
            self,
            Action::ToggleMouseLook | Action::ToggleOverlay | Action::ResetPhysics | Action::Quit
        )
    }
}

/// Key to action table.
#[derive(Debug, Clone)]
pub struct Bindings {
    keys: HashMap<KeyCode, Action>,
}

impl Default for Bindings {
    fn default() -> Self {
        let mut bindings = Self {
            keys: HashMap::new(),
        };
        for (key, action) in [
            (KeyCode::KeyW, Action::MoveForward),
            (KeyCode::ArrowUp, Action::MoveForward),
            (KeyCode::KeyS, Action::MoveBackward),
            (KeyCode::ArrowDown, Action::MoveBackward),
            (KeyCode::KeyA, Action::StrafeLeft),
            (KeyCode::ArrowLeft, Action::StrafeLeft),
            (KeyCode::KeyD, Action::StrafeRight),
            (KeyCode::ArrowRight, Action::StrafeRight),
            (KeyCode::Space, Action::Ascend),
            (KeyCode::KeyE, Action::Ascend),
            (KeyCode::ControlLeft, Action::Descend),
            (KeyCode::ControlRight, Action::Descend),
            (KeyCode::KeyQ, Action::Descend),
            (KeyCode::ShiftLeft, Action::Sprint),
            (KeyCode::ShiftRight, Action::Sprint),
            (KeyCode::Tab, Action::ToggleMouseLook),
            (KeyCode::F1, Action::ToggleOverlay),
            (KeyCode::KeyR, Action::ResetPhysics),
            (KeyCode::Escape, Action::Quit),
        ] {
            bindings.bind(key, action);
        }
        bindings
    }
}

impl Bindings {
    /// Bind `key` to `action`, replacing any previous binding of that key.
    pub fn bind(&mut self, key: KeyCode, action: Action) {
        if let Some(previous) = self.keys.insert(key, action) {
            if previous != action {
                tracing::debug!("rebound {key:?}: {previous:?} -> {action:?}");
            }
        }
    }

    pub fn unbind(&mut self, key: KeyCode) {
        self.keys.remove(&key);
    }

    pub fn action_for(&self, key: KeyCode) -> Option<Action> {
        self.keys.get(&key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings() {
        let b = Bindings::default();
        assert_eq!(b.action_for(KeyCode::KeyW), Some(Action::MoveForward));
        assert_eq!(b.action_for(KeyCode::ArrowLeft), Some(Action::StrafeLeft));
        assert_eq!(b.action_for(KeyCode::Escape), Some(Action::Quit));
        assert_eq!(b.action_for(KeyCode::F1), Some(Action::ToggleOverlay));
        assert_eq!(b.action_for(KeyCode::KeyZ), None);
    }

    #[test]
    fn both_modifier_keys_are_bound() {
        let b = Bindings::default();
        assert_eq!(b.action_for(KeyCode::ControlLeft), Some(Action::Descend));
        assert_eq!(b.action_for(KeyCode::ControlRight), Some(Action::Descend));
        assert_eq!(b.action_for(KeyCode::ShiftLeft), Some(Action::Sprint));
        assert_eq!(b.action_for(KeyCode::ShiftRight), Some(Action::Sprint));
    }

    #[test]
    fn rebind_replaces() {
        let mut b = Bindings::default();
        b.bind(KeyCode::KeyW, Action::Ascend);
        assert_eq!(b.action_for(KeyCode::KeyW), Some(Action::Ascend));
        b.unbind(KeyCode::KeyW);
        assert_eq!(b.action_for(KeyCode::KeyW), None);
    }

    #[test]
    fn one_shot_classification() {
        assert!(Action::Quit.is_one_shot());
        assert!(Action::ResetPhysics.is_one_shot());
        assert!(!Action::MoveForward.is_one_shot());
        assert!(!Action::Sprint.is_one_shot());
    }
}
