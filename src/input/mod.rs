//! # Input Module
//!
//! Line-based command parsing for driving the core headlessly.
//!
//! A keyboard front end would map key presses onto the same [`PlayerInput`]
//! values; the binary reads them as words from stdin or a script file.

use crate::{BattleAction, DraponError, DraponResult, Direction, GameEvent, GameState, MenuCommand};

/// Player input types that can be processed by the input handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerInput {
    /// Direction key
    Navigate(Direction),
    /// Enter/confirm
    Confirm,
    /// Escape/back
    Cancel,
    /// Toggle between walking and the command menu
    ToggleMenu,
    /// Run a menu entry directly
    Command(MenuCommand),
    /// Battle action
    Battle(BattleAction),
    /// Turn the dialogue page
    NextPage,
    /// Sell the inventory item at an index while shopping
    Sell(usize),
    /// Let one tick pass without input
    Wait,
    /// Persist the save record
    Save,
    /// Restore the save record
    Load,
    /// Show help information
    Help,
    /// Quit the game
    Quit,
}

/// Input handler for processing player commands.
///
/// # Examples
///
/// ```
/// use drapon::{Direction, InputHandler, PlayerInput};
///
/// let handler = InputHandler::new();
/// assert_eq!(handler.parse("w").unwrap(), PlayerInput::Navigate(Direction::Up));
/// assert!(handler.parse("fly").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct InputHandler {
    /// Whether to accept Vi-style movement keys (hjkl)
    pub vi_keys_enabled: bool,
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl InputHandler {
    pub fn new() -> Self {
        Self {
            vi_keys_enabled: true,
        }
    }

    /// Parses one line of input. Blank lines are a [`PlayerInput::Wait`].
    pub fn parse(&self, line: &str) -> DraponResult<PlayerInput> {
        let mut words = line.split_whitespace();
        let Some(word) = words.next() else {
            return Ok(PlayerInput::Wait);
        };
        let word = word.to_ascii_lowercase();

        if self.vi_keys_enabled {
            let vi = match word.as_str() {
                "k" => Some(Direction::Up),
                "j" => Some(Direction::Down),
                "h" => Some(Direction::Left),
                "l" => Some(Direction::Right),
                _ => None,
            };
            if let Some(direction) = vi {
                return Ok(PlayerInput::Navigate(direction));
            }
        }

        let input = match word.as_str() {
            "w" | "up" | "north" => PlayerInput::Navigate(Direction::Up),
            "s" | "down" | "south" => PlayerInput::Navigate(Direction::Down),
            "a" | "left" | "west" => PlayerInput::Navigate(Direction::Left),
            "d" | "right" | "east" => PlayerInput::Navigate(Direction::Right),
            "enter" | "ok" | "confirm" | "buy" => PlayerInput::Confirm,
            "esc" | "back" | "cancel" => PlayerInput::Cancel,
            "m" | "menu" => PlayerInput::ToggleMenu,
            "talk" => PlayerInput::Command(MenuCommand::Talk),
            "check" => PlayerInput::Command(MenuCommand::Check),
            "magic" => PlayerInput::Command(MenuCommand::Magic),
            "item" => PlayerInput::Command(MenuCommand::Item),
            "status" => PlayerInput::Command(MenuCommand::Status),
            "attack" | "fight" => PlayerInput::Battle(BattleAction::Attack),
            "defend" => PlayerInput::Battle(BattleAction::Defend),
            "run" | "escape" => PlayerInput::Battle(BattleAction::Escape),
            "n" | "next" => PlayerInput::NextPage,
            "sell" => {
                let index = match words.next() {
                    Some(arg) => arg.parse::<usize>().map_err(|_| {
                        DraponError::InvalidCommand(format!("sell expects an index, got '{}'", arg))
                    })?,
                    None => 0,
                };
                PlayerInput::Sell(index)
            }
            "wait" | "." => PlayerInput::Wait,
            "save" => PlayerInput::Save,
            "load" => PlayerInput::Load,
            "help" | "?" => PlayerInput::Help,
            "q" | "quit" | "exit" => PlayerInput::Quit,
            other => {
                return Err(DraponError::InvalidCommand(format!(
                    "unknown command '{}'",
                    other
                )))
            }
        };
        Ok(input)
    }

    /// Forwards a game input to the matching state operation.
    ///
    /// Returns `None` for inputs the caller handles itself (ticks,
    /// persistence, help and quitting).
    pub fn dispatch(&self, input: PlayerInput, state: &mut GameState) -> Option<Vec<GameEvent>> {
        let events = match input {
            PlayerInput::Navigate(direction) => state.navigate(direction),
            PlayerInput::Confirm => state.confirm(),
            PlayerInput::Cancel => state.cancel(),
            PlayerInput::ToggleMenu => state.toggle_mode(),
            PlayerInput::Command(command) => state.start_menu_command(command),
            PlayerInput::Battle(action) => state.battle_action(action),
            PlayerInput::NextPage => {
                state.next_page();
                Vec::new()
            }
            PlayerInput::Sell(index) => state.sell_item(index),
            PlayerInput::Wait
            | PlayerInput::Save
            | PlayerInput::Load
            | PlayerInput::Help
            | PlayerInput::Quit => return None,
        };
        Some(events)
    }

    /// One-line summary of the accepted commands.
    pub fn help_text(&self) -> &'static str {
        "w/a/s/d move, enter confirm, esc back, menu, talk, check, magic, item, status, \
         attack, defend, run, next, sell N, wait, save, load, quit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GameConfig, GameMode, GameStatus};

    #[test]
    fn test_parse_movement_aliases() {
        let handler = InputHandler::new();
        assert_eq!(handler.parse("W").unwrap(), PlayerInput::Navigate(Direction::Up));
        assert_eq!(handler.parse("east").unwrap(), PlayerInput::Navigate(Direction::Right));
        assert_eq!(handler.parse("h").unwrap(), PlayerInput::Navigate(Direction::Left));
    }

    #[test]
    fn test_vi_keys_can_be_disabled() {
        let handler = InputHandler {
            vi_keys_enabled: false,
        };
        assert!(handler.parse("j").is_err());
    }

    #[test]
    fn test_parse_sell_index() {
        let handler = InputHandler::new();
        assert_eq!(handler.parse("sell 2").unwrap(), PlayerInput::Sell(2));
        assert_eq!(handler.parse("sell").unwrap(), PlayerInput::Sell(0));
        assert!(matches!(
            handler.parse("sell two"),
            Err(DraponError::InvalidCommand(_))
        ));
    }

    #[test]
    fn test_blank_line_waits() {
        assert_eq!(InputHandler::new().parse("   ").unwrap(), PlayerInput::Wait);
    }

    #[test]
    fn test_dispatch_drives_state() {
        let handler = InputHandler::new();
        let mut state = GameState::new(5, GameConfig::for_testing());
        assert!(handler.dispatch(PlayerInput::Confirm, &mut state).is_some());
        assert_eq!(state.status, GameStatus::Open);

        handler.dispatch(PlayerInput::ToggleMenu, &mut state);
        assert!(matches!(state.mode, GameMode::Menu { .. }));
        assert!(handler.dispatch(PlayerInput::Quit, &mut state).is_none());
    }
}
