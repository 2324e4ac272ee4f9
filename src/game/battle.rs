//! # Battle State Machine
//!
//! Turn-based combat between the player and a single monster. A session is
//! created when a battle starts and discarded when it ends; the surrounding
//! [`GameState`](crate::GameState) decides what happens to the game mode.

use crate::{Item, Monster, PlayerStats, RandomSource};
use log::debug;
use serde::{Deserialize, Serialize};

/// Damage dealt by an attacker to a defender. Never less than 1.
///
/// # Examples
///
/// ```
/// use drapon::damage;
///
/// assert_eq!(damage(5, 1), 4);
/// assert_eq!(damage(2, 9), 1);
/// ```
pub fn damage(attack: i32, defense: i32) -> i32 {
    (attack - defense).max(1)
}

/// Commands the player may submit on their turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleAction {
    Attack,
    Defend,
    Escape,
}

/// Phase of an active session. No session at all is the idle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattlePhase {
    PlayerTurn,
    MonsterTurn,
    Victory,
    Defeat,
    Escaped,
}

impl BattlePhase {
    /// Whether the battle has been decided.
    pub fn is_over(self) -> bool {
        matches!(
            self,
            BattlePhase::Victory | BattlePhase::Defeat | BattlePhase::Escaped
        )
    }
}

/// How a resolved turn left the battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleOutcome {
    /// Back to the player's turn
    Continue,
    /// Monster defeated; rewards already credited to the player
    Victory {
        xp: u32,
        gold: u32,
        drop: Option<Item>,
    },
    /// Player defeated
    Defeat,
    /// Player ran away
    Escaped,
}

/// Everything that happened while resolving one player action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReport {
    pub action: BattleAction,
    /// Battle log lines in order
    pub log: Vec<String>,
    pub damage_dealt: i32,
    pub damage_taken: i32,
    pub outcome: BattleOutcome,
}

/// Mutable state of one battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSession {
    pub monster: Monster,
    pub monster_hp: i32,
    pub phase: BattlePhase,
    pub defending: bool,
    /// Latest battle log text with line markers
    pub message: String,
}

impl BattleSession {
    /// Opens a session against `monster` on the player's turn.
    pub fn new(monster: Monster) -> Self {
        let message = format!("A wild {} appears!", monster.name);
        Self {
            monster_hp: monster.max_hp,
            monster,
            phase: BattlePhase::PlayerTurn,
            defending: false,
            message,
        }
    }

    /// Opens a session against a monster drawn uniformly from `species`.
    ///
    /// Returns `None` when the species table is empty.
    pub fn start(species: &[Monster], rng: &mut dyn RandomSource) -> Option<Self> {
        if species.is_empty() {
            return None;
        }
        let monster = species[rng.below(species.len())].clone();
        debug!("Battle started against {}", monster.name);
        Some(Self::new(monster))
    }

    pub fn is_player_turn(&self) -> bool {
        self.phase == BattlePhase::PlayerTurn
    }

    pub fn is_over(&self) -> bool {
        self.phase.is_over()
    }

    /// Resolves a player action and, unless the battle ended, the monster's
    /// reply.
    ///
    /// Returns `None` without touching anything if it is not the player's turn.
    pub fn submit(
        &mut self,
        action: BattleAction,
        player: &mut PlayerStats,
        escape_chance: f64,
        rng: &mut dyn RandomSource,
    ) -> Option<TurnReport> {
        if !self.is_player_turn() {
            return None;
        }

        let mut report = TurnReport {
            action,
            log: Vec::new(),
            damage_dealt: 0,
            damage_taken: 0,
            outcome: BattleOutcome::Continue,
        };

        match action {
            BattleAction::Attack => {
                let dealt = damage(player.attack, self.monster.defense);
                self.monster_hp = (self.monster_hp - dealt).max(0);
                report.damage_dealt = dealt;
                report
                    .log
                    .push(format!("You deal {} damage to {}.", dealt, self.monster.name));
                if self.monster_hp == 0 {
                    report.outcome = self.win(player, rng, &mut report.log);
                    self.message = report.log.join("@");
                    return Some(report);
                }
            }
            BattleAction::Defend => {
                self.defending = true;
                report.log.push("You brace yourself.".to_string());
            }
            BattleAction::Escape => {
                if rng.chance(escape_chance) {
                    self.phase = BattlePhase::Escaped;
                    report.log.push("You ran away safely.".to_string());
                    report.outcome = BattleOutcome::Escaped;
                    self.message = report.log.join("@");
                    return Some(report);
                }
                report.log.push("You couldn't escape!".to_string());
            }
        }

        self.phase = BattlePhase::MonsterTurn;
        let taken = self.monster_turn(player, &mut report.log);
        report.damage_taken = taken;
        report.outcome = if player.hp == 0 {
            self.phase = BattlePhase::Defeat;
            report.log.push("You have been defeated...".to_string());
            BattleOutcome::Defeat
        } else {
            self.phase = BattlePhase::PlayerTurn;
            BattleOutcome::Continue
        };
        self.message = report.log.join("@");
        Some(report)
    }

    fn monster_turn(&mut self, player: &mut PlayerStats, log: &mut Vec<String>) -> i32 {
        let mut taken = damage(self.monster.attack, player.defense);
        if self.defending {
            taken = (taken / 2).max(1);
            self.defending = false;
        }
        player.hp = (player.hp - taken).max(0);
        log.push(format!("{} deals {} damage to you.", self.monster.name, taken));
        taken
    }

    fn win(
        &mut self,
        player: &mut PlayerStats,
        rng: &mut dyn RandomSource,
        log: &mut Vec<String>,
    ) -> BattleOutcome {
        self.phase = BattlePhase::Victory;
        let xp = self.monster.xp_value;
        let gold = self.monster.gold_value;
        player.xp += xp;
        player.gold += gold;
        log.push(format!(
            "You defeated {}! Gained {} XP and {} gold.",
            self.monster.name, xp, gold
        ));

        let drop = match &self.monster.item_drop {
            Some(item) if rng.chance(self.monster.drop_chance) => Some(item.clone()),
            _ => None,
        };
        if let Some(item) = &drop {
            log.push(format!("{} dropped a {}!", self.monster.name, item.name));
        }
        BattleOutcome::Victory { xp, gold, drop }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GameConfig, Scripted, ScriptedRandom};

    fn player() -> PlayerStats {
        PlayerStats::new(&GameConfig::default())
    }

    fn weakling() -> Monster {
        Monster::new("Slime", 4, 2, 1, 3, 5)
    }

    #[test]
    fn test_start_picks_by_index() {
        let species = crate::bestiary();
        let mut rng = ScriptedRandom::new([Scripted::Index(2)]);
        let session = BattleSession::start(&species, &mut rng).unwrap();
        assert_eq!(session.monster, species[2]);
        assert_eq!(session.monster_hp, species[2].max_hp);
        assert!(session.is_player_turn());

        assert!(BattleSession::start(&[], &mut rng).is_none());
    }

    #[test]
    fn test_lethal_attack_skips_monster_turn() {
        let mut session = BattleSession::new(weakling());
        let mut stats = player();
        let mut rng = ScriptedRandom::default();

        let report = session
            .submit(BattleAction::Attack, &mut stats, 0.5, &mut rng)
            .unwrap();

        assert_eq!(report.damage_dealt, 4);
        assert_eq!(report.damage_taken, 0);
        assert_eq!(session.monster_hp, 0);
        assert_eq!(session.phase, BattlePhase::Victory);
        assert_eq!(
            report.outcome,
            BattleOutcome::Victory {
                xp: 3,
                gold: 5,
                drop: None
            }
        );
        assert_eq!(stats.hp, 40);
        assert_eq!(stats.xp, 3);
        assert_eq!(stats.gold, 5);
    }

    #[test]
    fn test_defend_halves_one_hit() {
        let mut session = BattleSession::new(Monster::new("Brute", 50, 12, 0, 1, 1));
        let mut stats = player();
        let mut rng = ScriptedRandom::default();

        let report = session
            .submit(BattleAction::Defend, &mut stats, 0.5, &mut rng)
            .unwrap();
        assert_eq!(report.damage_taken, 5);
        assert!(!session.defending);

        let report = session
            .submit(BattleAction::Defend, &mut stats, 0.5, &mut rng)
            .unwrap();
        assert_eq!(report.damage_taken, 5);
        assert_eq!(stats.hp, 30);
    }

    #[test]
    fn test_defended_damage_stays_positive() {
        let mut session = BattleSession::new(Monster::new("Gnat", 50, 1, 0, 1, 1));
        let mut stats = player();
        let mut rng = ScriptedRandom::default();
        let report = session
            .submit(BattleAction::Defend, &mut stats, 0.5, &mut rng)
            .unwrap();
        assert_eq!(report.damage_taken, 1);
    }

    #[test]
    fn test_failed_escape_passes_turn() {
        let mut session = BattleSession::new(Monster::new("Brute", 50, 4, 0, 1, 1));
        let mut stats = player();
        let mut rng = ScriptedRandom::new([Scripted::Chance(false)]);

        let report = session
            .submit(BattleAction::Escape, &mut stats, 0.5, &mut rng)
            .unwrap();
        assert_eq!(report.outcome, BattleOutcome::Continue);
        assert_eq!(report.damage_taken, 2);
        assert!(session.is_player_turn());
    }

    #[test]
    fn test_successful_escape_ends_immediately() {
        let mut session = BattleSession::new(Monster::new("Brute", 50, 40, 0, 1, 1));
        let mut stats = player();
        let mut rng = ScriptedRandom::new([Scripted::Chance(true)]);

        let report = session
            .submit(BattleAction::Escape, &mut stats, 0.5, &mut rng)
            .unwrap();
        assert_eq!(report.outcome, BattleOutcome::Escaped);
        assert_eq!(stats.hp, 40);
        assert_eq!(session.phase, BattlePhase::Escaped);
    }

    #[test]
    fn test_defeat_clamps_hp() {
        let mut session = BattleSession::new(Monster::new("Ogre", 50, 10, 0, 1, 1));
        let mut stats = player();
        stats.hp = 3;
        let mut rng = ScriptedRandom::default();

        let report = session
            .submit(BattleAction::Attack, &mut stats, 0.5, &mut rng)
            .unwrap();
        assert_eq!(report.damage_taken, 8);
        assert_eq!(stats.hp, 0);
        assert_eq!(report.outcome, BattleOutcome::Defeat);
        assert_eq!(session.phase, BattlePhase::Defeat);
    }

    #[test]
    fn test_actions_ignored_once_over() {
        let mut session = BattleSession::new(weakling());
        let mut stats = player();
        let mut rng = ScriptedRandom::default();
        session.submit(BattleAction::Attack, &mut stats, 0.5, &mut rng);

        let before = session.clone();
        assert!(session
            .submit(BattleAction::Attack, &mut stats, 0.5, &mut rng)
            .is_none());
        assert_eq!(session, before);
    }

    #[test]
    fn test_drop_rolled_on_victory() {
        let monster = weakling().with_drop(Item::herb(), 0.5);
        let mut session = BattleSession::new(monster);
        let mut stats = player();
        let mut rng = ScriptedRandom::new([Scripted::Chance(true)]);

        let report = session
            .submit(BattleAction::Attack, &mut stats, 0.5, &mut rng)
            .unwrap();
        match report.outcome {
            BattleOutcome::Victory { drop, .. } => assert_eq!(drop, Some(Item::herb())),
            other => panic!("expected victory, got {:?}", other),
        }
    }
}
