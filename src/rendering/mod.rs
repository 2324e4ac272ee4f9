//! # Rendering Module
//!
//! Plain-text rendering of the 16×16 viewport, the status line and the
//! battle panel. The renderer only reads state; it never mutates it.

use crate::config::VIEWPORT_SIZE;
use crate::{GameSnapshot, GameState, GameStatus, NpcKind, Position};

/// Glyph drawn for the player.
pub const PLAYER_GLYPH: char = '@';

/// Glyph drawn for an NPC of the given kind.
pub fn npc_glyph(kind: NpcKind) -> char {
    match kind {
        NpcKind::Villager => 'v',
        NpcKind::Guard => 'g',
        NpcKind::Merchant => 'm',
        NpcKind::King => 'k',
        NpcKind::Wanderer => 'w',
    }
}

/// Text renderer for terminal output.
#[derive(Debug, Clone)]
pub struct TextRenderer {
    /// Whether to draw NPCs on top of terrain
    pub show_npcs: bool,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRenderer {
    pub fn new() -> Self {
        Self { show_npcs: true }
    }

    /// Renders the visible window, one string per row.
    ///
    /// Cells outside the layer show its boundary tile.
    pub fn viewport(&self, state: &GameState) -> Vec<String> {
        let layer = state.position.layer;
        let scroll = state.position.scroll;
        let player = state.position.cell();

        (0..VIEWPORT_SIZE)
            .map(|row| {
                (0..VIEWPORT_SIZE)
                    .map(|col| {
                        let cell = scroll + Position::new(row, col);
                        if cell == player {
                            return PLAYER_GLYPH;
                        }
                        if self.show_npcs {
                            if let Some(npc) = state.npcs.iter().find(|npc| npc.occupies(layer, cell)) {
                                return npc_glyph(npc.kind);
                            }
                        }
                        state.tile_at(layer, cell.row, cell.col).glyph()
                    })
                    .collect()
            })
            .collect()
    }

    /// One-line summary of the player.
    pub fn status_line(&self, snapshot: &GameSnapshot) -> String {
        format!(
            "[{:?}/{}] {:?} ({}, {}) LV {} HP {}/{} ATK {} DEF {} XP {} G {}",
            snapshot.status,
            snapshot.mode,
            snapshot.layer,
            snapshot.cell.row,
            snapshot.cell.col,
            snapshot.level,
            snapshot.hp,
            snapshot.max_hp,
            snapshot.attack,
            snapshot.defense,
            snapshot.xp,
            snapshot.gold
        )
    }

    /// Battle panel, empty when not fighting.
    pub fn battle_panel(&self, snapshot: &GameSnapshot) -> Option<String> {
        snapshot.battle.as_ref().map(|battle| {
            format!(
                "{} HP {}/{} [{:?}]{}",
                battle.monster,
                battle.monster_hp,
                battle.monster_max_hp,
                battle.phase,
                if battle.defending { " (defending)" } else { "" }
            )
        })
    }

    /// Full frame: title or game-over banner, or viewport plus panels.
    pub fn frame(&self, state: &GameState) -> String {
        let snapshot = state.snapshot();
        let mut lines: Vec<String> = match snapshot.status {
            GameStatus::Title => vec!["DRAPON".to_string(), "Press Enter to start".to_string()],
            GameStatus::Continue => vec!["Press Enter to continue".to_string()],
            GameStatus::Over => vec!["GAME OVER".to_string(), "Press Enter to try again".to_string()],
            GameStatus::Open | GameStatus::Wait => self.viewport(state),
        };
        lines.push(self.status_line(&snapshot));
        if let Some(panel) = self.battle_panel(&snapshot) {
            lines.push(panel);
        }
        if !state.typewriter.visible().is_empty() {
            lines.push(state.typewriter.visible().to_string());
        }
        lines.join("\n")
    }
}
