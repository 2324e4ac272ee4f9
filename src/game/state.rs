//! # Game State Module
//!
//! Central game state and the tagged mode machine that ties navigation,
//! battle, menus and the shop together.
//!
//! Every mutating command returns the [`GameEvent`]s it produced. Commands
//! submitted in a mode that does not accept them are silent no-ops and return
//! no events.

use crate::{
    bestiary, clamp_scroll, roll_encounter, script_text, BattleAction, BattleOutcome,
    BattlePhase, BattleSession, BlockReason, Continuation, DraponError, DraponResult, Direction,
    GameConfig, GenerationConfig, Generator, Inventory, Item, Layer, Message, MessageChannel,
    Monster, MoveOutcome, Npc, PlayerPosition, PlayerStats, Position, RandomSource, SaveRecord,
    Scheduler, Shop, TileType, TreasureChest, Typewriter, World, WorldGenerator, LINE_BREAK, WELCOME_SCRIPT,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Top-level status of the game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    /// Title screen, waiting for confirm
    Title,
    /// Playing
    Open,
    /// Waiting for a scheduled continuation
    Wait,
    /// Restored from a save, waiting for confirm
    Continue,
    /// Player defeated
    Over,
}

impl GameStatus {
    pub fn code(self) -> i64 {
        match self {
            GameStatus::Title => 0,
            GameStatus::Open => 1,
            GameStatus::Wait => 2,
            GameStatus::Continue => 3,
            GameStatus::Over => 4,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(GameStatus::Title),
            1 => Some(GameStatus::Open),
            2 => Some(GameStatus::Wait),
            3 => Some(GameStatus::Continue),
            4 => Some(GameStatus::Over),
            _ => None,
        }
    }
}

/// Entries of the command menu, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MenuCommand {
    Talk,
    Check,
    Magic,
    Item,
    Status,
}

impl MenuCommand {
    /// Menu entries in display order.
    pub const ALL: [MenuCommand; 5] = [
        MenuCommand::Talk,
        MenuCommand::Check,
        MenuCommand::Magic,
        MenuCommand::Item,
        MenuCommand::Status,
    ];

    fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|&command| command == self)
            .unwrap_or(0)
    }

    /// Entry below this one, wrapping to the top.
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Entry above this one, wrapping to the bottom.
    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            MenuCommand::Talk => "TALK",
            MenuCommand::Check => "CHECK",
            MenuCommand::Magic => "MAGIC",
            MenuCommand::Item => "ITEM",
            MenuCommand::Status => "STATUS",
        }
    }
}

/// What the player is currently doing. One variant per mode, each carrying
/// only the data that mode needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameMode {
    /// Walking around
    Move,
    /// Command menu open
    Menu { cursor: MenuCommand },
    /// Fighting
    Battle(BattleSession),
    /// Browsing the shop
    Shop { cursor: usize },
    /// Stats screen
    Status,
    /// Scripted event text
    Event,
}

impl GameMode {
    /// Stable numeric code used by the save record.
    pub fn code(&self) -> i64 {
        match self {
            GameMode::Move => 0,
            GameMode::Menu { .. } => 1,
            GameMode::Battle(_) => 2,
            GameMode::Event => 3,
            GameMode::Shop { .. } => 4,
            GameMode::Status => 5,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GameMode::Move => "move",
            GameMode::Menu { .. } => "menu",
            GameMode::Battle(_) => "battle",
            GameMode::Event => "event",
            GameMode::Shop { .. } => "shop",
            GameMode::Status => "status",
        }
    }

    /// Active battle session, if fighting.
    pub fn battle(&self) -> Option<&BattleSession> {
        match self {
            GameMode::Battle(session) => Some(session),
            _ => None,
        }
    }
}

/// Something observable that happened while handling a command or a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    GameStarted,
    GameRestarted,
    ModeChanged {
        mode: String,
    },
    Blocked {
        direction: Direction,
        reason: BlockReason,
    },
    PlayerMoved {
        layer: Layer,
        from: Position,
        to: Position,
    },
    EnteredLayer {
        layer: Layer,
    },
    ExitedToField {
        from: Layer,
    },
    BattleStarted {
        monster: String,
    },
    BattleTurn {
        action: BattleAction,
        damage_dealt: i32,
        damage_taken: i32,
    },
    BattleWon {
        monster: String,
        xp: u32,
        gold: u32,
    },
    BattleEscaped,
    GameOver,
    ReturnedToField,
    LevelUp {
        level: u32,
    },
    NpcTalked {
        npc_id: u32,
        script_id: usize,
    },
    ShopOpened,
    ItemBought {
        item: String,
    },
    ItemSold {
        item: String,
        price: u32,
    },
    ItemObtained {
        item: String,
    },
    ChestOpened {
        item: String,
    },
    Message {
        text: String,
    },
}

/// Game statistics tracking player progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatistics {
    /// Successful steps, the original score
    pub steps_taken: u64,
    pub battles_won: u32,
    pub escapes: u32,
    pub damage_dealt: u64,
    pub damage_taken: u64,
    pub chests_opened: u32,
    pub deaths: u32,
}

impl GameStatistics {
    /// Creates new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates statistics based on a game event.
    pub fn update_from_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::PlayerMoved { .. }
            | GameEvent::EnteredLayer { .. }
            | GameEvent::ExitedToField { .. } => {
                self.steps_taken += 1;
            }
            GameEvent::BattleTurn {
                damage_dealt,
                damage_taken,
                ..
            } => {
                self.damage_dealt += *damage_dealt as u64;
                self.damage_taken += *damage_taken as u64;
            }
            GameEvent::BattleWon { .. } => self.battles_won += 1,
            GameEvent::BattleEscaped => self.escapes += 1,
            GameEvent::GameOver => self.deaths += 1,
            GameEvent::ChestOpened { .. } => self.chests_opened += 1,
            _ => {}
        }
    }
}

/// Read-only view of an active battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub monster: String,
    pub monster_hp: i32,
    pub monster_max_hp: i32,
    pub phase: BattlePhase,
    pub defending: bool,
    pub message: String,
}

/// Read-only view of everything a display collaborator needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub status: GameStatus,
    pub mode: String,
    pub layer: Layer,
    pub cell: Position,
    pub scroll: Position,
    pub facing: Direction,
    pub hp: i32,
    pub max_hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub xp: u32,
    pub level: u32,
    pub gold: u32,
    pub battle: Option<BattleSnapshot>,
}

fn default_random() -> Box<dyn RandomSource> {
    Box::new(crate::seeded_random(0))
}

/// Central game state.
///
/// All mutation happens through `&mut self` methods on one logical thread;
/// the post-victory delay is a [`Scheduler`] entry fired by [`GameState::tick`].
#[derive(Debug, Serialize, Deserialize)]
pub struct GameState {
    /// Generated layers
    pub world: World,
    pub npcs: Vec<Npc>,
    pub position: PlayerPosition,
    pub mode: GameMode,
    pub status: GameStatus,
    pub stats: PlayerStats,
    pub inventory: Inventory,
    pub shop: Shop,
    pub chest: TreasureChest,
    /// Species table random battles draw from
    pub species: Vec<Monster>,
    pub statistics: GameStatistics,
    pub messages: MessageChannel,
    pub typewriter: Typewriter,
    /// Dialogue cursor: current script
    pub script_id: usize,
    /// Dialogue cursor: page within the script
    pub script_line: usize,
    pub scheduler: Scheduler,
    pub tick_count: u64,
    pub config: GameConfig,
    /// Seed the world was generated from
    pub seed: u64,
    #[serde(skip, default = "default_random")]
    rng: Box<dyn RandomSource>,
}

impl GameState {
    /// Generates a world from `seed` and opens a game on the title screen.
    ///
    /// The same seeded source then drives encounters and battles.
    pub fn new(seed: u64, config: GameConfig) -> Self {
        let mut rng = crate::seeded_random(seed);
        let generated = WorldGenerator::new().generate(&GenerationConfig::new(seed), &mut rng);
        info!(
            "World generated from seed {} with {} NPCs",
            seed,
            generated.npcs.len()
        );
        Self::from_parts(generated.world, generated.npcs, config, seed, Box::new(rng))
    }

    /// Builds a game from an existing world and an injected random source.
    pub fn from_parts(
        world: World,
        npcs: Vec<Npc>,
        config: GameConfig,
        seed: u64,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        let chest = TreasureChest::new(Layer::Cave, world.chest_location, Item::dragon_scale());
        let (row, col) = config.start_offset;
        Self {
            world,
            npcs,
            position: PlayerPosition::new(Position::new(row, col)),
            mode: GameMode::Move,
            status: GameStatus::Title,
            stats: PlayerStats::new(&config),
            inventory: Inventory::new(),
            shop: Shop::new(),
            chest,
            species: bestiary(),
            statistics: GameStatistics::new(),
            messages: MessageChannel::new(),
            typewriter: Typewriter::new(),
            script_id: WELCOME_SCRIPT,
            script_line: 0,
            scheduler: Scheduler::new(),
            tick_count: 0,
            config,
            seed,
            rng,
        }
    }

    /// Replaces the random source, e.g. with a scripted one in tests.
    pub fn set_random_source(&mut self, rng: Box<dyn RandomSource>) {
        self.rng = rng;
    }

    /// Bounds-safe tile query.
    pub fn tile_at(&self, layer: Layer, row: i32, col: i32) -> TileType {
        self.world.tile_at(layer, row, col)
    }

    /// Whether a battle session exists.
    pub fn in_battle(&self) -> bool {
        matches!(self.mode, GameMode::Battle(_))
    }

    /// Active battle session, if any.
    pub fn battle(&self) -> Option<&BattleSession> {
        self.mode.battle()
    }

    /// Snapshot of position, mode, stats and battle.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            status: self.status,
            mode: self.mode.name().to_string(),
            layer: self.position.layer,
            cell: self.position.cell(),
            scroll: self.position.scroll,
            facing: self.position.facing,
            hp: self.stats.hp,
            max_hp: self.stats.max_hp,
            attack: self.stats.attack,
            defense: self.stats.defense,
            xp: self.stats.xp,
            level: self.stats.level,
            gold: self.stats.gold,
            battle: self.battle().map(|session| BattleSnapshot {
                monster: session.monster.name.clone(),
                monster_hp: session.monster_hp,
                monster_max_hp: session.monster.max_hp,
                phase: session.phase,
                defending: session.defending,
                message: session.message.clone(),
            }),
        }
    }

    /// Enter/confirm key.
    pub fn confirm(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        match self.status {
            GameStatus::Over => {
                self.restart();
                events.push(GameEvent::GameRestarted);
            }
            GameStatus::Title => {
                self.status = GameStatus::Open;
                info!("Game opened");
                events.push(GameEvent::GameStarted);
                self.start_script(WELCOME_SCRIPT, &mut events);
            }
            GameStatus::Continue => {
                self.status = GameStatus::Open;
                info!("Game resumed");
                events.push(GameEvent::GameStarted);
            }
            GameStatus::Wait => {}
            GameStatus::Open => match self.mode.clone() {
                GameMode::Move => {
                    self.set_mode(
                        GameMode::Menu {
                            cursor: MenuCommand::Talk,
                        },
                        &mut events,
                    );
                }
                GameMode::Menu { cursor } => {
                    events.extend(self.start_menu_command(cursor));
                }
                GameMode::Shop { cursor } => {
                    let bought = self.shop.buy(cursor, &mut self.stats, &mut self.inventory);
                    let text = match bought {
                        Ok(item) => {
                            let text = format!("You bought a {}.", item.name);
                            events.push(GameEvent::ItemBought { item: item.name });
                            text
                        }
                        Err(err) => err.to_string(),
                    };
                    self.say(Message::system(text), &mut events);
                }
                GameMode::Status | GameMode::Event => {
                    self.set_mode(GameMode::Move, &mut events);
                }
                GameMode::Battle(_) => {}
            },
        }
        self.record(&events);
        events
    }

    /// Escape/back key.
    pub fn cancel(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        match &self.mode {
            GameMode::Menu { .. } | GameMode::Event | GameMode::Status | GameMode::Shop { .. } => {
                self.set_mode(GameMode::Move, &mut events);
            }
            GameMode::Battle(session) if session.phase == BattlePhase::Victory => {
                self.scheduler.cancel_all();
                self.finish_victory(&mut events);
            }
            GameMode::Battle(_) | GameMode::Move => {}
        }
        self.record(&events);
        events
    }

    /// Flips between walking and the command menu.
    pub fn toggle_mode(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.status != GameStatus::Open {
            return events;
        }
        match self.mode {
            GameMode::Move => self.set_mode(
                GameMode::Menu {
                    cursor: MenuCommand::Talk,
                },
                &mut events,
            ),
            GameMode::Menu { .. } => self.set_mode(GameMode::Move, &mut events),
            _ => {}
        }
        self.record(&events);
        events
    }

    /// Direction key: walks in Move mode, moves the cursor in menus.
    pub fn navigate(&mut self, direction: Direction) -> Vec<GameEvent> {
        if self.status != GameStatus::Open {
            return Vec::new();
        }
        if self.mode == GameMode::Move {
            return self.move_player(direction);
        }
        match &mut self.mode {
            GameMode::Menu { cursor } => {
                match direction {
                    Direction::Up => *cursor = cursor.previous(),
                    Direction::Down => *cursor = cursor.next(),
                    Direction::Left | Direction::Right => {}
                }
                Vec::new()
            }
            GameMode::Shop { cursor } => {
                let len = self.shop.items_for_sale().len().max(1);
                match direction {
                    Direction::Up => *cursor = (*cursor + len - 1) % len,
                    Direction::Down => *cursor = (*cursor + 1) % len,
                    Direction::Left | Direction::Right => {}
                }
                Vec::new()
            }
            GameMode::Move | GameMode::Battle(_) | GameMode::Status | GameMode::Event => {
                Vec::new()
            }
        }
    }

    /// Moves the player one step and rolls for an encounter.
    ///
    /// Only acts while walking; returns no events otherwise.
    pub fn move_player(&mut self, direction: Direction) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.status != GameStatus::Open || self.mode != GameMode::Move {
            return events;
        }

        let layer = self.position.layer;
        let outcome = self.position.step(direction, &self.world, &self.npcs);
        match outcome {
            MoveOutcome::Blocked(reason) => {
                debug!("Move {:?} blocked: {:?}", direction, reason);
                events.push(GameEvent::Blocked { direction, reason });
            }
            MoveOutcome::Moved { from, to } => {
                events.push(GameEvent::PlayerMoved { layer, from, to });
            }
            MoveOutcome::Entered(layer) => events.push(GameEvent::EnteredLayer { layer }),
            MoveOutcome::Exited { from } => events.push(GameEvent::ExitedToField { from }),
        }

        if outcome.is_success()
            && !outcome.changed_layer()
            && roll_encounter(self.position.layer, &self.config, self.rng.as_mut())
        {
            self.start_battle(&mut events);
        }

        self.record(&events);
        events
    }

    /// Talks to an adjacent NPC, or opens the shop when standing on the counter.
    pub fn interact(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.status != GameStatus::Open
            || !matches!(self.mode, GameMode::Move | GameMode::Menu { .. })
        {
            return events;
        }

        let layer = self.position.layer;
        let cell = self.position.cell();
        if self.world.tile_at(layer, cell.row, cell.col) == TileType::Shop {
            self.set_mode(GameMode::Shop { cursor: 0 }, &mut events);
            events.push(GameEvent::ShopOpened);
            let listing = self
                .shop
                .items_for_sale()
                .iter()
                .map(|item| format!("{} - {} gold", item.name, item.value))
                .collect::<Vec<_>>()
                .join("@");
            self.say(
                Message::system(format!("Welcome! What will you buy?@{}", listing)),
                &mut events,
            );
            self.record(&events);
            return events;
        }

        self.set_mode(GameMode::Move, &mut events);
        let speaker = cell
            .cardinal_adjacent_positions()
            .into_iter()
            .find_map(|adjacent| {
                self.npcs
                    .iter()
                    .position(|npc| npc.occupies(layer, adjacent))
            });
        match speaker {
            Some(index) => {
                let npc = &mut self.npcs[index];
                npc.face_towards(cell);
                let (npc_id, script_id) = (npc.id, npc.script_id);
                events.push(GameEvent::NpcTalked { npc_id, script_id });
                self.start_script(script_id, &mut events);
            }
            None => self.say(Message::system("There is no one there."), &mut events),
        }
        self.record(&events);
        events
    }

    /// Runs a command-menu entry.
    pub fn start_menu_command(&mut self, command: MenuCommand) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.status != GameStatus::Open
            || !matches!(self.mode, GameMode::Move | GameMode::Menu { .. })
        {
            return events;
        }
        debug!("Menu command {}", command.label());

        match command {
            MenuCommand::Talk => return self.interact(),
            MenuCommand::Check => {
                self.set_mode(GameMode::Move, &mut events);
                self.check_here(&mut events);
            }
            MenuCommand::Magic => {
                self.start_battle(&mut events);
            }
            MenuCommand::Item => {
                self.set_mode(GameMode::Move, &mut events);
                let text = self.inventory.use_first(&mut self.stats);
                self.say(Message::system(text), &mut events);
            }
            MenuCommand::Status => {
                self.set_mode(GameMode::Status, &mut events);
                let stats = &self.stats;
                let text = format!(
                    "Level {}@HP {}/{}@Attack {}  Defense {}@XP {}/{}  Gold {}",
                    stats.level,
                    stats.hp,
                    stats.max_hp,
                    stats.attack,
                    stats.defense,
                    stats.xp,
                    stats.xp_to_next_level,
                    stats.gold
                );
                self.say(Message::system(text), &mut events);
            }
        }
        self.record(&events);
        events
    }

    fn check_here(&mut self, events: &mut Vec<GameEvent>) {
        let here = self.position.cell();
        if self.position.layer == self.chest.layer && here == self.chest.position {
            if let Some(item) = self.chest.open() {
                info!("Chest opened at {:?}", here);
                events.push(GameEvent::ChestOpened {
                    item: item.name.clone(),
                });
                self.say(
                    Message::system(format!("You opened the chest and found a {}!", item.name)),
                    events,
                );
                self.inventory.add_item(item);
                return;
            }
            self.say(Message::system("The chest is empty."), events);
            return;
        }
        self.say(Message::system("Nothing here."), events);
    }

    /// Sells the inventory item at `index` while the shop is open.
    pub fn sell_item(&mut self, index: usize) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if !matches!(self.mode, GameMode::Shop { .. }) {
            return events;
        }
        let text = match self.shop.sell(index, &mut self.stats, &mut self.inventory) {
            Ok((item, price)) => {
                let text = format!("You sold the {} for {} gold.", item.name, price);
                events.push(GameEvent::ItemSold {
                    item: item.name,
                    price,
                });
                text
            }
            Err(err) => err.to_string(),
        };
        self.say(Message::system(text), &mut events);
        self.record(&events);
        events
    }

    /// Submits a battle action. Ignored unless it is the player's turn.
    pub fn battle_action(&mut self, action: BattleAction) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let GameMode::Battle(session) = &mut self.mode else {
            return events;
        };
        let Some(report) = session.submit(
            action,
            &mut self.stats,
            self.config.escape_chance,
            self.rng.as_mut(),
        ) else {
            return events;
        };
        let monster = session.monster.name.clone();

        events.push(GameEvent::BattleTurn {
            action,
            damage_dealt: report.damage_dealt,
            damage_taken: report.damage_taken,
        });
        if !report.log.is_empty() {
            let text = report.log.join(&LINE_BREAK.to_string());
            self.say(Message::battle(text), &mut events);
        }

        match report.outcome {
            BattleOutcome::Continue => {}
            BattleOutcome::Victory { xp, gold, drop } => {
                info!("Defeated {} for {} XP and {} gold", monster, xp, gold);
                events.push(GameEvent::BattleWon { monster, xp, gold });
                if let Some(item) = drop {
                    events.push(GameEvent::ItemObtained {
                        item: item.name.clone(),
                    });
                    self.inventory.add_item(item);
                }
                self.status = GameStatus::Wait;
                self.scheduler.schedule(
                    self.tick_count,
                    self.config.victory_delay_ticks,
                    Continuation::FinishVictory,
                );
            }
            BattleOutcome::Defeat => {
                info!("Defeated by {}", monster);
                self.stats.hp = 0;
                self.status = GameStatus::Over;
                self.set_mode(GameMode::Move, &mut events);
                events.push(GameEvent::GameOver);
                self.say(Message::system("GAME OVER#Press Enter to try again."), &mut events);
            }
            BattleOutcome::Escaped => {
                info!("Escaped from {}", monster);
                events.push(GameEvent::BattleEscaped);
                self.set_mode(GameMode::Move, &mut events);
            }
        }
        self.record(&events);
        events
    }

    /// Starts a battle against a random monster.
    ///
    /// Ignored while already fighting or when the species table is empty.
    pub fn start_battle_now(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.status == GameStatus::Open {
            self.start_battle(&mut events);
        }
        self.record(&events);
        events
    }

    fn start_battle(&mut self, events: &mut Vec<GameEvent>) {
        if self.in_battle() {
            return;
        }
        let Some(session) = BattleSession::start(&self.species, self.rng.as_mut()) else {
            warn!("No monsters available; battle not started");
            return;
        };
        info!("Battle started against {}", session.monster.name);
        let monster = session.monster.name.clone();
        let intro = session.message.clone();
        self.set_mode(GameMode::Battle(session), events);
        events.push(GameEvent::BattleStarted { monster });
        self.say(Message::battle(intro), events);
    }

    fn finish_victory(&mut self, events: &mut Vec<GameEvent>) {
        if !matches!(&self.mode, GameMode::Battle(session) if session.phase == BattlePhase::Victory)
        {
            return;
        }
        if self.stats.check_level_up() {
            let level = self.stats.level;
            info!("Level up to {}", level);
            events.push(GameEvent::LevelUp { level });
            self.say(
                Message::system(format!("You reached level {}!", level)),
                events,
            );
        }
        if self.status == GameStatus::Wait {
            self.status = GameStatus::Open;
        }
        self.set_mode(GameMode::Move, events);
        events.push(GameEvent::ReturnedToField);
    }

    /// Drops pending continuations. A won battle stays in its victory state
    /// until [`GameState::cancel`] finishes it.
    pub fn cancel_pending(&mut self) {
        self.scheduler.cancel_all();
    }

    /// Advances the simulation by one tick: fires due continuations and
    /// reveals more of the current message.
    pub fn tick(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        self.tick_count += 1;
        for continuation in self.scheduler.take_due(self.tick_count) {
            match continuation {
                Continuation::FinishVictory => self.finish_victory(&mut events),
            }
        }
        self.typewriter
            .advance(self.config.typewriter_chars_per_tick);
        self.record(&events);
        events
    }

    /// Turns the typewriter to the next page of the current script.
    pub fn next_page(&mut self) {
        if self.typewriter.state() == crate::TypewriterState::PageWait {
            self.typewriter.next_page();
            self.script_line += 1;
        }
    }

    /// Restores HP, resets position and statistics and returns to the title.
    pub fn restart(&mut self) {
        info!("Restarting game");
        self.scheduler.cancel_all();
        self.stats.hp = self.stats.max_hp;
        let (row, col) = self.config.start_offset;
        self.position = PlayerPosition::new(Position::new(row, col));
        self.mode = GameMode::Move;
        self.status = GameStatus::Title;
        self.statistics = GameStatistics::new();
        self.script_id = WELCOME_SCRIPT;
        self.script_line = 0;
        self.typewriter.clear();
    }

    /// The persisted fields in stable order.
    pub fn save_record(&self) -> SaveRecord {
        SaveRecord {
            status: self.status.code(),
            mode: self.mode.code(),
            layer: self.position.layer.code(),
            scroll_row: self.position.scroll.row as i64,
            scroll_col: self.position.scroll.col as i64,
            script_id: self.script_id as i64,
            script_line: self.script_line as i64,
            xp: self.stats.xp as i64,
            level: self.stats.level as i64,
            gold: self.stats.gold as i64,
            max_hp: self.stats.max_hp as i64,
        }
    }

    /// Restores the persisted fields.
    ///
    /// Codes that cannot be restored (an unknown code, or a battle or shop
    /// that was not persisted) fall back to walking on the overworld.
    pub fn apply_save_record(&mut self, record: &SaveRecord) {
        self.scheduler.cancel_all();

        self.status = match GameStatus::from_code(record.status) {
            Some(GameStatus::Wait) => GameStatus::Open,
            Some(status) => status,
            None => {
                warn!("Unknown status code {}; using Open", record.status);
                GameStatus::Open
            }
        };
        self.mode = match record.mode {
            0 | 2 | 4 => GameMode::Move,
            1 => GameMode::Menu {
                cursor: MenuCommand::Talk,
            },
            3 => GameMode::Event,
            5 => GameMode::Status,
            other => {
                warn!("Unknown mode code {}; using Move", other);
                GameMode::Move
            }
        };
        let layer = Layer::from_code(record.layer).unwrap_or_else(|| {
            warn!("Unknown layer code {}; using Overworld", record.layer);
            Layer::Overworld
        });
        let scroll = Position::new(clamp_i32(record.scroll_row), clamp_i32(record.scroll_col));
        let (row, col) = self.config.start_offset;
        self.position = PlayerPosition {
            layer,
            scroll: clamp_scroll(layer, scroll),
            facing: Direction::Down,
            saved_overworld: (layer != Layer::Overworld).then(|| Position::new(row, col)),
        };

        self.script_id = record.script_id.max(0) as usize;
        self.script_line = record.script_line.max(0) as usize;
        self.stats.xp = clamp_u32(record.xp);
        self.stats.level = clamp_u32(record.level).max(1);
        self.stats.gold = clamp_u32(record.gold);
        self.stats.max_hp = clamp_i32(record.max_hp).max(1);
        self.stats.hp = self.stats.hp.clamp(1, self.stats.max_hp);
        info!("Save record applied: {}", record.to_csv());
    }

    /// Saves the whole state to JSON.
    pub fn save_to_json(&self) -> DraponResult<String> {
        serde_json::to_string_pretty(self).map_err(DraponError::from)
    }

    /// Loads a whole state from JSON, reseeding the random source.
    pub fn load_from_json(json: &str) -> DraponResult<Self> {
        let mut state: GameState = serde_json::from_str(json)?;
        state.world.validate()?;
        state.rng = Box::new(crate::seeded_random(state.seed ^ state.tick_count));
        Ok(state)
    }

    fn start_script(&mut self, script_id: usize, events: &mut Vec<GameEvent>) {
        self.script_id = script_id;
        self.script_line = 0;
        self.say(Message::dialogue(script_text(script_id)), events);
    }

    fn say(&mut self, message: Message, events: &mut Vec<GameEvent>) {
        self.typewriter.start(&message.text);
        events.push(GameEvent::Message {
            text: message.text.clone(),
        });
        self.messages.emit(message);
    }

    fn set_mode(&mut self, mode: GameMode, events: &mut Vec<GameEvent>) {
        if self.mode.code() != mode.code() {
            debug!("Mode {} -> {}", self.mode.name(), mode.name());
            events.push(GameEvent::ModeChanged {
                mode: mode.name().to_string(),
            });
        }
        self.mode = mode;
    }

    fn record(&mut self, events: &[GameEvent]) {
        for event in events {
            self.statistics.update_from_event(event);
        }
    }
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

fn clamp_u32(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Scripted, ScriptedRandom};

    fn open_game(outcomes: Vec<Scripted>) -> GameState {
        let mut state = GameState::new(42, GameConfig::for_testing());
        state.set_random_source(Box::new(ScriptedRandom::new(outcomes)));
        state.confirm();
        state
    }

    #[test]
    fn test_game_state_creation() {
        let state = GameState::new(12345, GameConfig::default());
        assert_eq!(state.status, GameStatus::Title);
        assert_eq!(state.mode, GameMode::Move);
        assert_eq!(state.position.cell(), Position::new(24, 24));
        assert_eq!(state.seed, 12345);
    }

    #[test]
    fn test_confirm_opens_with_welcome() {
        let mut state = GameState::new(1, GameConfig::for_testing());
        let events = state.confirm();
        assert_eq!(state.status, GameStatus::Open);
        assert!(events.contains(&GameEvent::GameStarted));
        assert_eq!(state.script_id, WELCOME_SCRIPT);
        assert_eq!(
            state.messages.last().map(|m| m.text.as_str()),
            Some(crate::SCRIPTS[WELCOME_SCRIPT])
        );
    }

    #[test]
    fn test_commands_ignored_on_title() {
        let mut state = GameState::new(1, GameConfig::for_testing());
        assert!(state.move_player(Direction::Up).is_empty());
        assert!(state.battle_action(BattleAction::Attack).is_empty());
        assert_eq!(state.position.cell(), Position::new(24, 24));
    }

    #[test]
    fn test_menu_cursor_wraps() {
        let mut state = open_game(vec![]);
        state.toggle_mode();
        assert_eq!(
            state.mode,
            GameMode::Menu {
                cursor: MenuCommand::Talk
            }
        );
        state.navigate(Direction::Up);
        assert_eq!(
            state.mode,
            GameMode::Menu {
                cursor: MenuCommand::Status
            }
        );
        state.navigate(Direction::Down);
        state.navigate(Direction::Down);
        assert_eq!(
            state.mode,
            GameMode::Menu {
                cursor: MenuCommand::Check
            }
        );
        state.cancel();
        assert_eq!(state.mode, GameMode::Move);
    }

    #[test]
    fn test_battle_action_outside_battle_is_noop() {
        let mut state = open_game(vec![]);
        let before = state.save_record();
        assert!(state.battle_action(BattleAction::Defend).is_empty());
        assert_eq!(state.save_record(), before);
    }

    #[test]
    fn test_magic_starts_battle() {
        let mut state = open_game(vec![Scripted::Index(1)]);
        let events = state.start_menu_command(MenuCommand::Magic);
        assert!(state.in_battle());
        assert!(events.contains(&GameEvent::BattleStarted {
            monster: "Tralalero Tralala".to_string()
        }));
        // Walking is refused mid-battle
        assert!(state.move_player(Direction::Up).is_empty());
    }

    #[test]
    fn test_battle_turn_is_one_message() {
        let mut state = open_game(vec![Scripted::Index(0)]);
        state.species = vec![Monster::new("Slime", 4, 2, 1, 3, 5)];
        state.start_battle_now();
        let before = state.messages.len();

        let events = state.battle_action(BattleAction::Defend);
        let said: Vec<_> = events
            .iter()
            .filter(|event| matches!(event, GameEvent::Message { .. }))
            .collect();
        assert_eq!(said.len(), 1);
        assert_eq!(state.messages.len(), before + 1);
        assert_eq!(
            state.messages.last().map(|m| m.text.as_str()),
            Some("You brace yourself.@Slime deals 1 damage to you.~")
        );
    }

    #[test]
    fn test_victory_waits_for_continuation() {
        let mut state = open_game(vec![Scripted::Index(0)]);
        state.species = vec![Monster::new("Slime", 4, 2, 1, 3, 5)];
        state.start_battle_now();

        let events = state.battle_action(BattleAction::Attack);
        assert!(events.contains(&GameEvent::BattleWon {
            monster: "Slime".to_string(),
            xp: 3,
            gold: 5
        }));
        assert_eq!(state.status, GameStatus::Wait);
        assert!(state.in_battle());

        for _ in 1..state.config.victory_delay_ticks {
            assert!(!state.tick().contains(&GameEvent::ReturnedToField));
        }
        let events = state.tick();
        assert!(events.contains(&GameEvent::ReturnedToField));
        assert_eq!(state.mode, GameMode::Move);
        assert_eq!(state.status, GameStatus::Open);
        assert_eq!(state.statistics.battles_won, 1);
    }

    #[test]
    fn test_cancelled_continuation_leaves_victory_state() {
        let mut state = open_game(vec![]);
        state.species = vec![Monster::new("Slime", 4, 2, 1, 30, 5)];
        state.start_battle_now();
        state.battle_action(BattleAction::Attack);
        state.cancel_pending();

        for _ in 0..50 {
            state.tick();
        }
        assert_eq!(
            state.battle().map(|session| session.phase),
            Some(BattlePhase::Victory)
        );

        let events = state.cancel();
        assert!(events.contains(&GameEvent::LevelUp { level: 2 }));
        assert_eq!(state.mode, GameMode::Move);
        assert_eq!(state.status, GameStatus::Open);
    }

    #[test]
    fn test_status_command_and_item_use() {
        let mut state = open_game(vec![]);
        state.start_menu_command(MenuCommand::Status);
        assert_eq!(state.mode, GameMode::Status);
        state.confirm();
        assert_eq!(state.mode, GameMode::Move);

        state.stats.hp = 10;
        state.inventory.add_item(Item::potion());
        state.start_menu_command(MenuCommand::Item);
        assert_eq!(state.stats.hp, 30);
        assert!(state.inventory.is_empty());
    }

    #[test]
    fn test_check_finds_nothing_on_field() {
        let mut state = open_game(vec![]);
        state.start_menu_command(MenuCommand::Check);
        assert_eq!(
            state.messages.last().map(|m| m.text.as_str()),
            Some("Nothing here.~")
        );
    }

    #[test]
    fn test_save_record_round_trip() {
        let mut state = open_game(vec![]);
        state.stats.gold = 77;
        state.stats.xp = 9;
        let record = state.save_record();
        assert_eq!(record.layer, 0);
        assert_eq!((record.scroll_row, record.scroll_col), (16, 16));

        let mut other = GameState::new(42, GameConfig::for_testing());
        other.apply_save_record(&record);
        assert_eq!(other.save_record(), record);
        assert_eq!(other.stats.gold, 77);
    }

    #[test]
    fn test_save_record_clamps_bad_codes() {
        let mut state = GameState::new(42, GameConfig::for_testing());
        let record = SaveRecord::from_fields(&[9, 2, 7, 500, -500, 0, 0, -3, 0, 5, 40]).unwrap();
        state.apply_save_record(&record);
        assert_eq!(state.status, GameStatus::Open);
        assert_eq!(state.mode, GameMode::Move);
        assert_eq!(state.position.layer, Layer::Overworld);
        assert_eq!(state.position.scroll, Position::new(112, 0));
        assert_eq!(state.stats.xp, 0);
        assert_eq!(state.stats.level, 1);
    }

    #[test]
    fn test_statistics_update() {
        let mut stats = GameStatistics::new();
        stats.update_from_event(&GameEvent::PlayerMoved {
            layer: Layer::Overworld,
            from: Position::new(0, 0),
            to: Position::new(1, 0),
        });
        stats.update_from_event(&GameEvent::BattleTurn {
            action: BattleAction::Attack,
            damage_dealt: 4,
            damage_taken: 3,
        });
        stats.update_from_event(&GameEvent::BattleEscaped);
        assert_eq!(stats.steps_taken, 1);
        assert_eq!(stats.damage_dealt, 4);
        assert_eq!(stats.damage_taken, 3);
        assert_eq!(stats.escapes, 1);
    }

    #[test]
    fn test_game_state_serialization() {
        let state = open_game(vec![]);
        let json = state.save_to_json().unwrap();
        let _: serde_json::Value = serde_json::from_str(&json).unwrap();

        let loaded = GameState::load_from_json(&json).unwrap();
        assert_eq!(loaded.save_record(), state.save_record());
        assert_eq!(loaded.world, state.world);
    }

    #[test]
    fn test_load_rejects_truncated_cave() {
        let state = open_game(vec![]);
        let mut value: serde_json::Value =
            serde_json::from_str(&state.save_to_json().unwrap()).unwrap();
        let cells = value["world"]["cave"]["cells"].as_array_mut().unwrap();
        cells.truncate(10);

        let result = GameState::load_from_json(&value.to_string());
        assert!(matches!(result, Err(DraponError::InvalidState(_))));
    }
}
