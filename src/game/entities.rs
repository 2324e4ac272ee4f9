//! # Entities
//!
//! The player's stat block, NPCs placed in the world and monster templates.

use crate::config::GameConfig;
use crate::{Direction, Item, Layer, Position};
use serde::{Deserialize, Serialize};

/// The player's mutable stat block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub hp: i32,
    pub max_hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub xp: u32,
    pub level: u32,
    pub gold: u32,
    /// XP needed for the next level
    pub xp_to_next_level: u32,
}

impl PlayerStats {
    /// Creates a level-1 stat block from the game configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use drapon::{GameConfig, PlayerStats};
    ///
    /// let stats = PlayerStats::new(&GameConfig::default());
    /// assert_eq!(stats.hp, 40);
    /// assert_eq!(stats.level, 1);
    /// ```
    pub fn new(config: &GameConfig) -> Self {
        Self {
            hp: config.player_max_hp,
            max_hp: config.player_max_hp,
            attack: config.player_attack,
            defense: config.player_defense,
            xp: 0,
            level: 1,
            gold: config.player_gold,
            xp_to_next_level: 10,
        }
    }

    /// Whether the player still stands.
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Restores up to `amount` HP, never past the maximum. Returns HP gained.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = (self.hp + amount).min(self.max_hp);
        self.hp - before
    }

    /// Raises the level once if enough XP has been earned.
    ///
    /// Returns `true` when a level was gained.
    pub fn check_level_up(&mut self) -> bool {
        if self.xp < self.xp_to_next_level {
            return false;
        }
        self.level += 1;
        self.max_hp += 5;
        self.hp = self.max_hp;
        self.attack += 2;
        self.defense += 1;
        self.xp_to_next_level = self.xp_to_next_level.saturating_mul(2);
        true
    }
}

/// What an NPC is, which decides its default dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NpcKind {
    Villager,
    Guard,
    Merchant,
    King,
    Wanderer,
}

/// A non-player character placed during world setup.
///
/// Only `direction` and `visible` change after placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Npc {
    pub id: u32,
    pub position: Position,
    pub kind: NpcKind,
    pub direction: Direction,
    pub script_id: usize,
    pub layer: Layer,
    pub visible: bool,
}

impl Npc {
    /// Creates a visible NPC facing down.
    pub fn new(id: u32, layer: Layer, position: Position, kind: NpcKind, script_id: usize) -> Self {
        Self {
            id,
            position,
            kind,
            direction: Direction::Down,
            script_id,
            layer,
            visible: true,
        }
    }

    /// Whether this NPC blocks `pos` on `layer`.
    pub fn occupies(&self, layer: Layer, pos: Position) -> bool {
        self.visible && self.layer == layer && self.position == pos
    }

    /// Turns the NPC to face someone standing at `from`.
    pub fn face_towards(&mut self, from: Position) {
        if let Some(direction) = Direction::from_delta(from - self.position) {
            self.direction = direction;
        }
    }
}

/// Immutable monster template; a battle copies `max_hp` into its session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monster {
    pub name: String,
    pub max_hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub xp_value: u32,
    pub gold_value: u32,
    /// Item the monster may leave behind
    pub item_drop: Option<Item>,
    /// Probability of leaving `item_drop`
    pub drop_chance: f64,
}

impl Monster {
    /// Creates a monster template without a drop.
    pub fn new(
        name: &str,
        max_hp: i32,
        attack: i32,
        defense: i32,
        xp_value: u32,
        gold_value: u32,
    ) -> Self {
        Self {
            name: name.to_string(),
            max_hp,
            attack,
            defense,
            xp_value,
            gold_value,
            item_drop: None,
            drop_chance: 0.0,
        }
    }

    /// Attaches a possible drop.
    pub fn with_drop(mut self, item: Item, chance: f64) -> Self {
        self.item_drop = Some(item);
        self.drop_chance = chance;
        self
    }
}

/// The species table random battles draw from.
pub fn bestiary() -> Vec<Monster> {
    vec![
        Monster::new("Tung Tung Tung Sahur", 8, 4, 1, 3, 2).with_drop(Item::herb(), 0.3),
        Monster::new("Tralalero Tralala", 12, 5, 2, 5, 4).with_drop(Item::herb(), 0.2),
        Monster::new("Bombardiro Crocodilo", 18, 7, 3, 8, 7).with_drop(Item::potion(), 0.15),
    ]
}
