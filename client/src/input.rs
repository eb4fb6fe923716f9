//! Keyboard sampling into control flags

use log::debug;
use macroquad::prelude::*;
use shared::ControlState;

/// Maps held keys to control flags. Arrows and WASD both move; Space shoots.
pub fn controls_from_keys(is_down: impl Fn(KeyCode) -> bool) -> ControlState {
    ControlState {
        left: is_down(KeyCode::Left) || is_down(KeyCode::A),
        right: is_down(KeyCode::Right) || is_down(KeyCode::D),
        jump: is_down(KeyCode::Up) || is_down(KeyCode::W),
        shoot: is_down(KeyCode::Space),
    }
}

/// Samples the keyboard once per rendered frame.
pub struct InputManager {
    current: ControlState,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            current: ControlState::default(),
        }
    }

    /// Reads the keyboard and returns the controls to push this frame.
    pub fn sample(&mut self) -> ControlState {
        self.update(controls_from_keys(is_key_down))
    }

    fn update(&mut self, controls: ControlState) -> ControlState {
        if controls != self.current {
            debug!("Controls changed to {:?}", controls);
            self.current = controls;
        }
        self.current
    }

    pub fn current(&self) -> ControlState {
        self.current
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(keys: &'static [KeyCode]) -> impl Fn(KeyCode) -> bool {
        move |key| keys.contains(&key)
    }

    #[test]
    fn test_no_keys_is_idle() {
        assert!(controls_from_keys(held(&[])).is_idle());
    }

    #[test]
    fn test_both_layouts_move() {
        let arrows = controls_from_keys(held(&[KeyCode::Left, KeyCode::Up]));
        let wasd = controls_from_keys(held(&[KeyCode::A, KeyCode::W]));
        assert_eq!(arrows, wasd);
        assert!(arrows.left && arrows.jump && !arrows.right && !arrows.shoot);
    }

    #[test]
    fn test_space_shoots() {
        let controls = controls_from_keys(held(&[KeyCode::Space, KeyCode::D]));
        assert!(controls.shoot);
        assert!(controls.right);
    }

    #[test]
    fn test_manager_tracks_latest() {
        let mut input = InputManager::new();
        assert!(input.current().is_idle());

        let jump = controls_from_keys(held(&[KeyCode::W]));
        assert_eq!(input.update(jump), jump);
        assert_eq!(input.current(), jump);
    }
}
