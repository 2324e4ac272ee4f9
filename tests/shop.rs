//! Trading at the building's shop counter through the game state.

use drapon::{
    scroll_for_cell, Direction, GameConfig, GameEvent, GameMode, GameState, Inventory, Item,
    Layer, NpcKind, PlayerPosition, Position, SHOP_CELL,
};

fn at_the_counter(gold: u32) -> GameState {
    let mut state = GameState::new(5, GameConfig::for_testing());
    state.confirm();
    state.position = PlayerPosition {
        layer: Layer::Building,
        scroll: scroll_for_cell(SHOP_CELL),
        facing: Direction::Up,
        saved_overworld: Some(Position::new(16, 16)),
    };
    state.stats.gold = gold;
    state.inventory = Inventory::new();
    state
}

fn item_bought(events: &[GameEvent]) -> bool {
    events
        .iter()
        .any(|event| matches!(event, GameEvent::ItemBought { .. }))
}

#[test]
fn test_counter_opens_shop_over_merchant() {
    let mut state = at_the_counter(0);
    assert_eq!(state.position.cell(), SHOP_CELL);
    // The merchant stands right behind the counter
    let merchant = Position::new(SHOP_CELL.row - 1, SHOP_CELL.col);
    assert!(state
        .npcs
        .iter()
        .any(|npc| npc.kind == NpcKind::Merchant && npc.occupies(Layer::Building, merchant)));

    let events = state.interact();
    assert!(events.contains(&GameEvent::ShopOpened));
    assert!(!events
        .iter()
        .any(|event| matches!(event, GameEvent::NpcTalked { .. })));
    assert_eq!(state.mode, GameMode::Shop { cursor: 0 });
}

#[test]
fn test_buying_needs_enough_gold() {
    let mut state = at_the_counter(5);
    state.interact();

    let events = state.confirm();
    assert!(!item_bought(&events));
    assert_eq!(state.stats.gold, 5);
    assert!(state.inventory.is_empty());
    assert_eq!(
        state.messages.last().map(|message| message.text.as_str()),
        Some("Not enough gold.~")
    );

    state.stats.gold = 30;
    let events = state.confirm();
    assert!(events.contains(&GameEvent::ItemBought {
        item: "Potion".to_string()
    }));
    assert_eq!(state.stats.gold, 10);
    assert_eq!(state.inventory.items(), &[Item::potion()]);
    assert_eq!(state.mode, GameMode::Shop { cursor: 0 });
}

#[test]
fn test_shop_cursor_wraps() {
    let mut state = at_the_counter(0);
    state.interact();

    state.navigate(Direction::Up);
    assert_eq!(state.mode, GameMode::Shop { cursor: 1 });
    state.navigate(Direction::Down);
    assert_eq!(state.mode, GameMode::Shop { cursor: 0 });
    state.navigate(Direction::Down);
    state.navigate(Direction::Down);
    assert_eq!(state.mode, GameMode::Shop { cursor: 0 });
}

#[test]
fn test_selling_pays_half_and_cancel_leaves() {
    let mut state = at_the_counter(30);
    state.interact();
    state.confirm();
    assert_eq!(state.stats.gold, 10);

    let events = state.sell_item(0);
    assert!(events.contains(&GameEvent::ItemSold {
        item: "Potion".to_string(),
        price: 10
    }));
    assert_eq!(state.stats.gold, 20);
    assert!(state.inventory.is_empty());

    // Nothing left to sell
    let events = state.sell_item(0);
    assert!(!events
        .iter()
        .any(|event| matches!(event, GameEvent::ItemSold { .. })));
    assert_eq!(state.stats.gold, 20);

    state.cancel();
    assert_eq!(state.mode, GameMode::Move);
    assert!(state.sell_item(0).is_empty());
}
