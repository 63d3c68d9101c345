//! Battle state.
//!
//! ## BattleState
//!
//! Complete state of one battle:
//! - Turn counter, turn order, current actor
//! - Actors by id and the two side rosters
//! - Shared party inventory
//! - Per-actor cooldown / charge / shield / taunt / prevent maps
//! - RNG
//! - Append-only log
//!
//! Uses `im` persistent vectors for the log and rosters so cloning a state
//! (AI lookahead, replay checkpoints) stays cheap as the log grows.

use im::Vector;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::actor::{Actor, ActorId};
use super::error::BattleError;
use super::rng::BattleRng;

/// Which party an actor fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Side {
    Player,
    Enemy,
}

impl Side {
    /// The opposing side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Enemy,
            Self::Enemy => Self::Player,
        }
    }
}

/// Why a battle ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EndReason {
    Victory,
    Defeat,
    Fled,
}

/// Terminal battle outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleEnd {
    pub reason: EndReason,
}

/// Remaining uses of a capped action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Charges {
    pub remaining: u32,
    pub max: u32,
}

/// A damage-absorption bucket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shield {
    /// Bucket name; shields with the same id stack into one bucket.
    pub id: String,
    /// Hp left to absorb.
    pub hp: i64,
    /// When set, only damage of this element is absorbed.
    pub element: Option<String>,
}

/// Forced targeting imposed on an actor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taunt {
    pub source_id: ActorId,
    pub turns: u32,
}

/// Full battle state.
///
/// Owned by whichever caller drives the battle and mutated only through the
/// engine components.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattleState {
    /// Round number (starts at 1, increments when the turn order wraps).
    pub turn: u32,

    /// Acting order for every actor, summons appended at the end.
    pub turn_order: Vector<ActorId>,

    /// Index into `turn_order` of the actor whose turn it is.
    pub current: usize,

    /// Deterministic RNG.
    pub rng: BattleRng,

    /// Actors by id.
    pub actors: FxHashMap<ActorId, Actor>,

    /// Player party roster in formation order.
    pub players: Vector<ActorId>,

    /// Enemy party roster in formation order.
    pub enemies: Vector<ActorId>,

    /// Shared party inventory: item id -> quantity.
    pub inventory: FxHashMap<String, u32>,

    /// Human-readable battle log.
    pub log: Vector<String>,

    /// actor -> action id -> turns left.
    pub cooldowns: FxHashMap<ActorId, FxHashMap<String, u32>>,

    /// actor -> action id -> charges.
    pub charges: FxHashMap<ActorId, FxHashMap<String, Charges>>,

    /// actor -> shield buckets in application order.
    pub shields: FxHashMap<ActorId, SmallVec<[Shield; 2]>>,

    /// taunted actor -> taunt.
    pub taunts: FxHashMap<ActorId, Taunt>,

    /// actor -> turn boundary count at the time the skip was applied.
    pub prevented: FxHashMap<ActorId, u64>,

    /// Number of `end_turn` boundaries crossed so far.
    pub boundaries: u64,

    /// Counter for generated summon ids.
    pub spawned: u32,

    /// Terminal outcome, set at most once.
    pub ended: Option<BattleEnd>,
}

impl BattleState {
    /// Create a battle.
    ///
    /// Turn order is the player roster followed by the enemy roster.
    pub fn new(
        seed: u64,
        players: impl IntoIterator<Item = Actor>,
        enemies: impl IntoIterator<Item = Actor>,
    ) -> Result<Self, BattleError> {
        let mut state = Self {
            turn: 1,
            turn_order: Vector::new(),
            current: 0,
            rng: BattleRng::new(seed),
            actors: FxHashMap::default(),
            players: Vector::new(),
            enemies: Vector::new(),
            inventory: FxHashMap::default(),
            log: Vector::new(),
            cooldowns: FxHashMap::default(),
            charges: FxHashMap::default(),
            shields: FxHashMap::default(),
            taunts: FxHashMap::default(),
            prevented: FxHashMap::default(),
            boundaries: 0,
            spawned: 0,
            ended: None,
        };

        for actor in players {
            state.insert_actor(Side::Player, actor)?;
        }
        for actor in enemies {
            state.insert_actor(Side::Enemy, actor)?;
        }

        if state.players.is_empty() || state.enemies.is_empty() {
            return Err(BattleError::EmptySide);
        }

        state.push_log("Turn 1");
        Ok(state)
    }

    /// Set the shared inventory (builder pattern).
    #[must_use]
    pub fn with_inventory<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        self.inventory = items.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self
    }

    /// Add an actor to a side roster and the end of the turn order.
    pub fn insert_actor(&mut self, side: Side, actor: Actor) -> Result<(), BattleError> {
        if self.actors.contains_key(&actor.id) {
            return Err(BattleError::DuplicateActor(actor.id));
        }
        let id = actor.id.clone();
        self.actors.insert(id.clone(), actor);
        self.roster_mut(side).push_back(id.clone());
        self.turn_order.push_back(id);
        Ok(())
    }

    // === Log ===

    /// Append a log line.
    pub fn push_log(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::trace!(target: "rpg_battle::log", "{line}");
        self.log.push_back(line);
    }

    /// Check if any log line contains `needle`.
    #[must_use]
    pub fn log_contains(&self, needle: &str) -> bool {
        self.log.iter().any(|l| l.contains(needle))
    }

    // === Actors ===

    /// Get an actor.
    #[must_use]
    pub fn actor(&self, id: &ActorId) -> Option<&Actor> {
        self.actors.get(id)
    }

    /// Get a mutable actor.
    pub fn actor_mut(&mut self, id: &ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(id)
    }

    /// Display name of an actor, falling back to its id.
    #[must_use]
    pub fn name_of(&self, id: &ActorId) -> String {
        self.actor(id).map_or_else(|| id.to_string(), |a| a.name.clone())
    }

    /// Check if an actor exists and is alive.
    #[must_use]
    pub fn is_alive(&self, id: &ActorId) -> bool {
        self.actor(id).is_some_and(|a| a.alive)
    }

    /// Side an actor belongs to.
    #[must_use]
    pub fn side_of(&self, id: &ActorId) -> Option<Side> {
        if self.players.contains(id) {
            Some(Side::Player)
        } else if self.enemies.contains(id) {
            Some(Side::Enemy)
        } else {
            None
        }
    }

    /// Roster of a side in formation order.
    #[must_use]
    pub fn roster(&self, side: Side) -> &Vector<ActorId> {
        match side {
            Side::Player => &self.players,
            Side::Enemy => &self.enemies,
        }
    }

    fn roster_mut(&mut self, side: Side) -> &mut Vector<ActorId> {
        match side {
            Side::Player => &mut self.players,
            Side::Enemy => &mut self.enemies,
        }
    }

    /// Living members of a side in formation order.
    pub fn living(&self, side: Side) -> impl Iterator<Item = &ActorId> {
        self.roster(side).iter().filter(|id| self.is_alive(id))
    }

    /// Check if every member of a side is down.
    #[must_use]
    pub fn side_defeated(&self, side: Side) -> bool {
        self.living(side).next().is_none()
    }

    // === Turn ===

    /// Id of the actor whose turn it is.
    #[must_use]
    pub fn current_actor(&self) -> Option<&ActorId> {
        self.turn_order.get(self.current)
    }

    /// Check if a skip was applied to `id` before its current turn started.
    #[must_use]
    pub fn is_prevented(&self, id: &ActorId) -> bool {
        self.prevented.get(id).is_some_and(|at| *at < self.boundaries)
    }

    // === Per-actor maps ===

    /// Turns left on an action's cooldown.
    #[must_use]
    pub fn cooldown(&self, actor: &ActorId, action_id: &str) -> u32 {
        self.cooldowns
            .get(actor)
            .and_then(|m| m.get(action_id))
            .copied()
            .unwrap_or(0)
    }

    /// Charges of an action, if it has been capped and used.
    #[must_use]
    pub fn charges_of(&self, actor: &ActorId, action_id: &str) -> Option<Charges> {
        self.charges.get(actor).and_then(|m| m.get(action_id)).copied()
    }

    /// Total shield hp on an actor.
    #[must_use]
    pub fn shield_total(&self, actor: &ActorId) -> i64 {
        self.shields
            .get(actor)
            .map_or(0, |buckets| buckets.iter().map(|s| s.hp).sum())
    }

    /// A named shield bucket.
    #[must_use]
    pub fn shield(&self, actor: &ActorId, shield_id: &str) -> Option<&Shield> {
        self.shields
            .get(actor)
            .and_then(|buckets| buckets.iter().find(|s| s.id == shield_id))
    }

    /// Add hp to a named shield bucket, creating it at the end if absent.
    ///
    /// A new element replaces the bucket's element.
    pub fn add_shield(&mut self, actor: &ActorId, id: &str, element: Option<&str>, amount: i64) {
        let buckets = self.shields.entry(actor.clone()).or_default();
        match buckets.iter_mut().find(|s| s.id == id) {
            Some(bucket) => {
                bucket.hp = bucket.hp.saturating_add(amount);
                if element.is_some() {
                    bucket.element = element.map(str::to_string);
                }
            }
            None => buckets.push(Shield {
                id: id.to_string(),
                hp: amount,
                element: element.map(str::to_string),
            }),
        }
    }

    /// Set a named shield bucket to exactly `amount`.
    pub fn set_shield(&mut self, actor: &ActorId, id: &str, element: Option<&str>, amount: i64) {
        self.remove_shield(actor, id);
        if amount > 0 {
            self.add_shield(actor, id, element, amount);
        }
    }

    /// Drop a named shield bucket.
    pub fn remove_shield(&mut self, actor: &ActorId, id: &str) {
        if let Some(buckets) = self.shields.get_mut(actor) {
            buckets.retain(|s| s.id != id);
            if buckets.is_empty() {
                self.shields.remove(actor);
            }
        }
    }

    /// Absorb damage with shields in bucket order. Returns the amount absorbed.
    ///
    /// Elemental buckets only absorb damage of their element. Emptied
    /// buckets are removed.
    pub fn absorb(&mut self, actor: &ActorId, element: Option<&str>, amount: i64) -> i64 {
        let Some(buckets) = self.shields.get_mut(actor) else {
            return 0;
        };

        let mut left = amount.max(0);
        for bucket in buckets.iter_mut() {
            if left == 0 {
                break;
            }
            if bucket.element.as_deref().is_some_and(|e| Some(e) != element) {
                continue;
            }
            let taken = bucket.hp.min(left);
            bucket.hp -= taken;
            left -= taken;
        }

        buckets.retain(|s| s.hp > 0);
        if buckets.is_empty() {
            self.shields.remove(actor);
        }
        amount.max(0) - left
    }

    /// Inventory quantity of an item.
    #[must_use]
    pub fn item_count(&self, item_id: &str) -> u32 {
        self.inventory.get(item_id).copied().unwrap_or(0)
    }

    // === Ending ===

    /// Set the terminal outcome. Returns `false` if the battle already ended.
    pub fn end(&mut self, reason: EndReason) -> bool {
        if self.ended.is_some() {
            return false;
        }
        tracing::info!(?reason, turn = self.turn, "battle ended");
        self.ended = Some(BattleEnd { reason });
        true
    }

    /// Check if the battle has ended.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.ended.is_some()
    }

    // === Snapshots ===

    /// Encode the state for a replay checkpoint.
    pub fn to_bytes(&self) -> Result<Vec<u8>, BattleError> {
        Ok(bincode::serialize(self)?)
    }

    /// Restore a state from a checkpoint.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BattleError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StatBlock;

    fn actor(id: &str) -> Actor {
        Actor::new(id, id.to_uppercase(), StatBlock::new(20, 10, 10, 5, 5, 1))
    }

    fn two_vs_two() -> BattleState {
        BattleState::new(42, [actor("hero"), actor("mage")], [actor("slime"), actor("goblin")]).unwrap()
    }

    #[test]
    fn test_new_builds_rosters_and_order() {
        let state = two_vs_two();

        assert_eq!(state.turn, 1);
        assert_eq!(state.players.len(), 2);
        assert_eq!(state.enemies.len(), 2);
        let order: Vec<_> = state.turn_order.iter().map(ActorId::as_str).collect();
        assert_eq!(order, vec!["hero", "mage", "slime", "goblin"]);
        assert_eq!(state.current_actor(), Some(&ActorId::from("hero")));
        assert_eq!(state.side_of(&"goblin".into()), Some(Side::Enemy));
    }

    #[test]
    fn test_duplicate_actor_rejected() {
        let result = BattleState::new(1, [actor("hero")], [actor("hero")]);
        assert!(matches!(result, Err(BattleError::DuplicateActor(_))));
    }

    #[test]
    fn test_empty_side_rejected() {
        let result = BattleState::new(1, [actor("hero")], []);
        assert!(matches!(result, Err(BattleError::EmptySide)));
    }

    #[test]
    fn test_living_excludes_fainted() {
        let mut state = two_vs_two();
        state.actor_mut(&"slime".into()).unwrap().faint();

        let living: Vec<_> = state.living(Side::Enemy).cloned().collect();
        assert_eq!(living, vec![ActorId::from("goblin")]);
        assert!(!state.side_defeated(Side::Enemy));

        state.actor_mut(&"goblin".into()).unwrap().faint();
        assert!(state.side_defeated(Side::Enemy));
    }

    #[test]
    fn test_end_is_set_once() {
        let mut state = two_vs_two();
        assert!(state.end(EndReason::Victory));
        assert!(!state.end(EndReason::Defeat));
        assert_eq!(state.ended.unwrap().reason, EndReason::Victory);
    }

    #[test]
    fn test_shield_absorb_in_bucket_order() {
        let mut state = two_vs_two();
        let hero = ActorId::from("hero");
        state.add_shield(&hero, "ward", Some("fire"), 10);
        state.add_shield(&hero, "barrier", None, 15);
        state.add_shield(&hero, "barrier", None, 5);

        // physical damage skips the fire ward
        assert_eq!(state.absorb(&hero, None, 12), 12);
        assert_eq!(state.shield(&hero, "barrier").unwrap().hp, 8);

        // fire damage drains the ward first, then the barrier
        assert_eq!(state.absorb(&hero, Some("fire"), 30), 18);
        assert_eq!(state.shield_total(&hero), 0);
        assert!(!state.shields.contains_key(&hero));
    }

    #[test]
    fn test_set_and_remove_shield() {
        let mut state = two_vs_two();
        let hero = ActorId::from("hero");
        state.add_shield(&hero, "barrier", None, 4);
        state.set_shield(&hero, "barrier", None, 20);
        assert_eq!(state.shield_total(&hero), 20);

        state.remove_shield(&hero, "barrier");
        assert!(state.shield(&hero, "barrier").is_none());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut state = two_vs_two().with_inventory([("potion", 3)]);
        state.rng.next_f64();
        state.push_log("Hero waves");

        let bytes = state.to_bytes().unwrap();
        let restored = BattleState::from_bytes(&bytes).unwrap();

        assert_eq!(restored, state);
        assert_eq!(restored.item_count("potion"), 3);
    }
}
