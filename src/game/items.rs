//! # Items
//!
//! Items, the player's inventory, the town shop and the cave treasure chest.

use crate::{Layer, PlayerStats, Position};
use serde::{Deserialize, Serialize};

/// What using an item does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemEffect {
    /// Restores hit points
    Heal(i32),
    /// No use; kept or sold
    Keepsake,
}

/// An item with a shop value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub description: String,
    pub effect: ItemEffect,
    pub value: u32,
}

impl Item {
    /// Creates a new item.
    pub fn new(name: &str, description: &str, effect: ItemEffect, value: u32) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            effect,
            value,
        }
    }

    /// Restores 20 HP.
    pub fn potion() -> Self {
        Self::new("Potion", "Restores 20 HP", ItemEffect::Heal(20), 20)
    }

    /// Restores 10 HP.
    pub fn herb() -> Self {
        Self::new("Herb", "Restores 10 HP", ItemEffect::Heal(10), 10)
    }

    /// The treasure hidden in the cave.
    pub fn dragon_scale() -> Self {
        Self::new("Dragon Scale", "A shimmering scale", ItemEffect::Keepsake, 100)
    }

    /// Whether the item does something when used.
    pub fn is_usable(&self) -> bool {
        matches!(self.effect, ItemEffect::Heal(_))
    }
}

/// Items the player carries, in pickup order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    items: Vec<Item>,
}

impl Inventory {
    /// Creates an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an item to the end of the list.
    pub fn add_item(&mut self, item: Item) {
        self.items.push(item);
    }

    /// Removes and returns the item at `index`.
    pub fn remove_at(&mut self, index: usize) -> Option<Item> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    /// All carried items.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Number of carried items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is carried.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Uses the first usable item on the player and returns a message.
    pub fn use_first(&mut self, stats: &mut PlayerStats) -> String {
        let Some(index) = self.items.iter().position(Item::is_usable) else {
            return if self.items.is_empty() {
                "Inventory is empty.".to_string()
            } else {
                "Nothing here can be used.".to_string()
            };
        };
        let item = self.items.remove(index);
        match item.effect {
            ItemEffect::Heal(amount) => {
                let healed = stats.heal(amount);
                format!("You used the {}. Recovered {} HP.", item.name, healed)
            }
            ItemEffect::Keepsake => format!("You hold up the {}.", item.name),
        }
    }

    /// Human-readable listing, one line per item.
    pub fn describe(&self) -> String {
        if self.items.is_empty() {
            return "Inventory is empty.".to_string();
        }
        let lines: Vec<String> = self
            .items
            .iter()
            .map(|item| format!("- {}: {}", item.name, item.description))
            .collect();
        format!("Inventory:@{}", lines.join("@"))
    }
}

/// Why a shop trade did not go through.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShopError {
    #[error("No item selected to {0}.")]
    NoSuchItem(&'static str),

    #[error("Not enough gold.")]
    NotEnoughGold,
}

/// The shop inside the building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shop {
    items_for_sale: Vec<Item>,
}

impl Default for Shop {
    fn default() -> Self {
        Self::new()
    }
}

impl Shop {
    /// Creates the shop with its default stock.
    pub fn new() -> Self {
        Self {
            items_for_sale: vec![Item::potion(), Item::herb()],
        }
    }

    /// Items on offer.
    pub fn items_for_sale(&self) -> &[Item] {
        &self.items_for_sale
    }

    /// Buys the item at `index` if the player can afford it, returning
    /// the item added to the inventory.
    pub fn buy(
        &self,
        index: usize,
        stats: &mut PlayerStats,
        inventory: &mut Inventory,
    ) -> Result<Item, ShopError> {
        let item = self
            .items_for_sale
            .get(index)
            .ok_or(ShopError::NoSuchItem("buy"))?;
        if stats.gold < item.value {
            return Err(ShopError::NotEnoughGold);
        }
        stats.gold -= item.value;
        inventory.add_item(item.clone());
        Ok(item.clone())
    }

    /// Sells the inventory item at `index` for half its value, returning
    /// the item and the price paid.
    pub fn sell(
        &self,
        index: usize,
        stats: &mut PlayerStats,
        inventory: &mut Inventory,
    ) -> Result<(Item, u32), ShopError> {
        let item = inventory
            .remove_at(index)
            .ok_or(ShopError::NoSuchItem("sell"))?;
        let price = item.value / 2;
        stats.gold += price;
        Ok((item, price))
    }
}

/// A chest holding one item that can be opened once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasureChest {
    pub layer: Layer,
    pub position: Position,
    content: Option<Item>,
}

impl TreasureChest {
    /// Creates a closed chest.
    pub fn new(layer: Layer, position: Position, content: Item) -> Self {
        Self {
            layer,
            position,
            content: Some(content),
        }
    }

    /// Whether the chest has been emptied.
    pub fn is_open(&self) -> bool {
        self.content.is_none()
    }

    /// Opens the chest, returning its item the first time only.
    pub fn open(&mut self) -> Option<Item> {
        self.content.take()
    }
}
