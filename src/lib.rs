//! # Drapon
//!
//! The simulation core of a tile-based exploration RPG.
//!
//! ## Architecture Overview
//!
//! The core is split into three tightly coupled pieces and a thin ambient layer:
//!
//! - **Generation**: deterministic builders for the overworld, the building
//!   interior and the maze cave, plus NPC placement
//! - **Navigation**: player position across three map layers, walkability,
//!   layer transitions and random encounter rolls
//! - **Battle**: a turn-based state machine resolving attack, defend and escape
//! - **Game State**: the tagged mode machine tying the pieces together, the
//!   message channel, the scheduled post-victory continuation and the flat
//!   save record consumed by external persistence
//!
//! Rendering, audio, localization and input devices are collaborators that
//! read state produced here and invoke its mutating operations. The crate
//! ships a text viewport and a line-based command parser so the binary can
//! drive the core headlessly.

pub mod game;
pub mod generation;
pub mod input;
pub mod rendering;
pub mod utils;

// Core module re-exports
pub use game::*;
pub use generation::*;
pub use input::*;
pub use rendering::*;
pub use utils::*;

pub use config::GameConfig;

/// Core error type for the Drapon engine.
///
/// Gameplay operations never produce errors; this type covers the ambient
/// edges (persistence, validation and startup).
#[derive(thiserror::Error, Debug)]
pub enum DraponError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// A save record could not be parsed
    #[error("Invalid save record: {0}")]
    InvalidSaveRecord(String),

    /// A typed command could not be parsed
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Generated content violates an invariant
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

/// Result type used throughout the Drapon codebase.
pub type DraponResult<T> = Result<T, DraponError>;

/// Version information for the game.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Game configuration constants and tunables.
pub mod config {
    use serde::{Deserialize, Serialize};

    /// Overworld edge length in tiles
    pub const OVERWORLD_SIZE: i32 = 128;

    /// Building and cave edge length in tiles
    pub const INTERIOR_SIZE: i32 = 16;

    /// Visible viewport edge length in tiles
    pub const VIEWPORT_SIZE: i32 = 16;

    /// Offset from the scroll origin to the player's cell
    pub const VIEW_CENTER: i32 = 8;

    /// Row of the building/cave entrance
    pub const ENTRANCE_ROW: i32 = 15;

    /// Columns of the two-cell building/cave entrance
    pub const ENTRANCE_COLS: [i32; 2] = [7, 8];

    /// Milliseconds per simulation tick
    pub const TICK_MILLIS: u64 = 100;

    /// Overworld encounter probability per step
    pub const OVERWORLD_ENCOUNTER_RATE: f64 = 0.03;

    /// Cave encounter probability per step
    pub const CAVE_ENCOUNTER_RATE: f64 = 0.08;

    /// Probability that an escape attempt succeeds
    pub const ESCAPE_CHANCE: f64 = 0.5;

    /// Ticks between a victory and the return to exploration (2 seconds)
    pub const VICTORY_DELAY_TICKS: u64 = 20;

    /// Scroll offset the player starts at (player stands on row/col 24)
    pub const START_OFFSET: (i32, i32) = (16, 16);

    /// Tunables for a running game.
    ///
    /// # Examples
    ///
    /// ```
    /// use drapon::GameConfig;
    ///
    /// let config = GameConfig::default();
    /// assert_eq!(config.player_max_hp, 40);
    /// assert_eq!(GameConfig::for_testing().overworld_encounter_rate, 0.0);
    /// ```
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct GameConfig {
        /// Encounter probability per overworld step
        pub overworld_encounter_rate: f64,
        /// Encounter probability per cave step
        pub cave_encounter_rate: f64,
        /// Escape success probability
        pub escape_chance: f64,
        /// Ticks before a won battle hands control back
        pub victory_delay_ticks: u64,
        /// Characters revealed per tick by the typewriter
        pub typewriter_chars_per_tick: usize,
        /// Starting and maximum hit points
        pub player_max_hp: i32,
        /// Starting attack
        pub player_attack: i32,
        /// Starting defense
        pub player_defense: i32,
        /// Starting gold
        pub player_gold: u32,
        /// Starting overworld scroll offset (row, col)
        pub start_offset: (i32, i32),
    }

    impl GameConfig {
        /// Configuration with random encounters switched off.
        pub fn for_testing() -> Self {
            Self {
                overworld_encounter_rate: 0.0,
                cave_encounter_rate: 0.0,
                ..Self::default()
            }
        }
    }

    impl Default for GameConfig {
        fn default() -> Self {
            Self {
                overworld_encounter_rate: OVERWORLD_ENCOUNTER_RATE,
                cave_encounter_rate: CAVE_ENCOUNTER_RATE,
                escape_chance: ESCAPE_CHANCE,
                victory_delay_ticks: VICTORY_DELAY_TICKS,
                typewriter_chars_per_tick: 1,
                player_max_hp: 40,
                player_attack: 5,
                player_defense: 2,
                player_gold: 0,
                start_offset: START_OFFSET,
            }
        }
    }
}
