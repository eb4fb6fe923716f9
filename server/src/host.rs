//! The host's own fighter, steered from the operator console.
//!
//! Movement words latch until `stop` or the opposite direction. `jump` and
//! `shoot` are presses: they hold for a single tick and then release, so
//! every typed `shoot` fires exactly once.

use shared::ControlState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    Left,
    Right,
    Stop,
    Jump,
    Shoot,
}

impl HostCommand {
    /// Accepts the full word or the matching key letter, in any case.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "left" | "a" => Some(HostCommand::Left),
            "right" | "d" => Some(HostCommand::Right),
            "stop" | "s" => Some(HostCommand::Stop),
            "jump" | "w" => Some(HostCommand::Jump),
            "shoot" | "f" => Some(HostCommand::Shoot),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct HostInput {
    held: ControlState,
    jump: bool,
    shoot: bool,
}

impl HostInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, command: HostCommand) {
        match command {
            HostCommand::Left => {
                self.held.left = true;
                self.held.right = false;
            }
            HostCommand::Right => {
                self.held.left = false;
                self.held.right = true;
            }
            HostCommand::Stop => self.held = ControlState::default(),
            HostCommand::Jump => self.jump = true,
            HostCommand::Shoot => self.shoot = true,
        }
    }

    /// Controls for the next tick. Pending presses are consumed.
    pub fn next_controls(&mut self) -> ControlState {
        ControlState {
            jump: std::mem::take(&mut self.jump),
            shoot: std::mem::take(&mut self.shoot),
            ..self.held
        }
    }
}

pub const HOST_HELP: &str = "Host controls: left/a, right/d, stop/s, jump/w, shoot/f";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_words_and_keys() {
        assert_eq!(HostCommand::parse("LEFT"), Some(HostCommand::Left));
        assert_eq!(HostCommand::parse(" d "), Some(HostCommand::Right));
        assert_eq!(HostCommand::parse("w"), Some(HostCommand::Jump));
        assert_eq!(HostCommand::parse("start"), None);
        assert_eq!(HostCommand::parse("1"), None);
    }

    #[test]
    fn test_movement_latches() {
        let mut input = HostInput::new();
        input.apply(HostCommand::Left);
        assert!(input.next_controls().left);
        assert!(input.next_controls().left);

        input.apply(HostCommand::Right);
        let controls = input.next_controls();
        assert!(controls.right && !controls.left);

        input.apply(HostCommand::Stop);
        assert!(input.next_controls().is_idle());
    }

    #[test]
    fn test_presses_last_one_tick() {
        let mut input = HostInput::new();
        input.apply(HostCommand::Right);
        input.apply(HostCommand::Shoot);
        input.apply(HostCommand::Jump);

        let first = input.next_controls();
        assert!(first.shoot && first.jump && first.right);

        let second = input.next_controls();
        assert!(!second.shoot && !second.jump);
        assert!(second.right);
    }
}
