//! Operator console menus.
//!
//! Each match state has a fixed table of entries. The console prints the
//! table for the current state and maps a typed label or entry number to an
//! action on the match.

use crate::game::{Game, MatchError};
use crate::world::Simulation;
use shared::{skin_image, MatchState, SHOT_IMAGE};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Start,
    Restart,
    Exit,
}

/// What the console should do after an action ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

impl MenuAction {
    pub fn apply<W: Simulation>(self, game: &mut Game<W>) -> Result<Flow, MatchError> {
        match self {
            MenuAction::Start => game.start_match().map(|_| Flow::Continue),
            MenuAction::Restart => game.rematch().map(|_| Flow::Continue),
            MenuAction::Exit => Ok(Flow::Exit),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: &'static str,
    /// Image reference shown next to the label.
    pub icon: String,
    pub action: MenuAction,
}

impl MenuEntry {
    fn new(label: &'static str, icon: impl Into<String>, action: MenuAction) -> Self {
        Self {
            label,
            icon: icon.into(),
            action,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub title: &'static str,
    entries: Vec<MenuEntry>,
}

impl Menu {
    pub fn lobby() -> Self {
        Self {
            title: "Lobby",
            entries: vec![
                MenuEntry::new("start", skin_image(0), MenuAction::Start),
                MenuEntry::new("exit", skin_image(1), MenuAction::Exit),
            ],
        }
    }

    pub fn in_match() -> Self {
        Self {
            title: "Match running",
            entries: vec![MenuEntry::new("exit", skin_image(1), MenuAction::Exit)],
        }
    }

    pub fn game_over() -> Self {
        Self {
            title: "Game over",
            entries: vec![
                MenuEntry::new("restart", SHOT_IMAGE, MenuAction::Restart),
                MenuEntry::new("exit", skin_image(1), MenuAction::Exit),
            ],
        }
    }

    pub fn for_state(state: MatchState) -> Self {
        match state {
            MatchState::Waiting => Self::lobby(),
            MatchState::Active => Self::in_match(),
            MatchState::GameOver => Self::game_over(),
        }
    }

    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    /// Resolves console input: an entry label (any case) or its 1-based number.
    pub fn select(&self, input: &str) -> Option<MenuAction> {
        let input = input.trim();
        if let Ok(number) = input.parse::<usize>() {
            return number
                .checked_sub(1)
                .and_then(|index| self.entries.get(index))
                .map(|entry| entry.action);
        }
        self.entries
            .iter()
            .find(|entry| entry.label.eq_ignore_ascii_case(input))
            .map(|entry| entry.action)
    }
}

impl fmt::Display for Menu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ==", self.title)?;
        for (i, entry) in self.entries.iter().enumerate() {
            writeln!(f, "  {}) {:<8} [{}]", i + 1, entry.label, entry.icon)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use shared::SnapshotCodec;
    use std::net::SocketAddr;
    use std::time::Instant;

    #[test]
    fn test_menu_per_state() {
        let labels = |menu: Menu| -> Vec<&'static str> {
            menu.entries().iter().map(|e| e.label).collect()
        };
        assert_eq!(labels(Menu::for_state(MatchState::Waiting)), vec!["start", "exit"]);
        assert_eq!(labels(Menu::for_state(MatchState::Active)), vec!["exit"]);
        assert_eq!(
            labels(Menu::for_state(MatchState::GameOver)),
            vec!["restart", "exit"]
        );
    }

    #[test]
    fn test_select_by_label_or_number() {
        let menu = Menu::lobby();
        assert_eq!(menu.select("start"), Some(MenuAction::Start));
        assert_eq!(menu.select("  EXIT\n"), Some(MenuAction::Exit));
        assert_eq!(menu.select("1"), Some(MenuAction::Start));
        assert_eq!(menu.select("2"), Some(MenuAction::Exit));
        assert_eq!(menu.select("0"), None);
        assert_eq!(menu.select("3"), None);
        assert_eq!(menu.select("restart"), None);
    }

    #[test]
    fn test_render_lists_entries() {
        let rendered = Menu::game_over().to_string();
        assert!(rendered.starts_with("== Game over =="));
        assert!(rendered.contains("1) restart"));
        assert!(rendered.contains("2) exit"));
    }

    #[test]
    fn test_actions_drive_the_match() {
        let mut game = Game::new(Arena::with_seed(1), SnapshotCodec::default());
        let endpoint: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        game.admit(endpoint, Instant::now());

        assert_eq!(
            MenuAction::Restart.apply(&mut game),
            Err(MatchError::NotGameOver(MatchState::Waiting))
        );
        assert_eq!(MenuAction::Start.apply(&mut game), Ok(Flow::Continue));
        assert_eq!(game.state(), MatchState::Active);

        // A lone player wins on the first tick.
        game.tick(1.0 / 60.0);
        assert_eq!(game.state(), MatchState::GameOver);
        assert_eq!(MenuAction::Restart.apply(&mut game), Ok(Flow::Continue));
        assert_eq!(game.state(), MatchState::Active);

        assert_eq!(MenuAction::Exit.apply(&mut game), Ok(Flow::Exit));
    }
}
