//! Effect targeting system.
//!
//! Defines how actions and effects pick their targets:
//! - `TargetSelector`: side, mode, count, metric, condition
//! - `resolve_targets`: deterministic resolution against battle state
//!
//! Resolution order:
//! 1. A valid taunt on the acting actor forces `[source]` for enemy/any sides.
//!    An invalid taunt (source fainted or gone) is cleared first.
//! 2. The candidate pool is built from the side, dropping fainted actors
//!    unless `include_dead`.
//! 3. The mode picks from the pool. Random draws advance the RNG once each.

use serde::{Deserialize, Serialize};

use crate::core::{Actor, ActorId, BattleState, ResourceKind};
use crate::filter::{self, Filter};

/// Which actors are candidates, relative to the acting actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetSide {
    /// Only the acting actor.
    #[serde(rename = "self")]
    Self_,
    /// The acting actor's roster, self included.
    Ally,
    /// The opposing roster.
    Enemy,
    /// Self first, then the rest of the own roster, then the opposing roster.
    Any,
}

/// How targets are picked from the candidate pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetMode {
    #[serde(rename = "self")]
    Self_,
    /// First candidate.
    #[default]
    Single,
    /// Every candidate in roster order.
    All,
    /// `count` distinct uniform draws, in draw order.
    Random,
    /// `count` candidates with the lowest metric.
    Lowest,
    /// `count` candidates with the highest metric.
    Highest,
    /// First `count` candidates matching `condition`.
    Condition,
}

/// Metric for `lowest` / `highest` modes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetMetric {
    #[default]
    HpPct,
    StaPct,
    MpPct,
    Hp,
    Atk,
    Def,
    Lv,
}

impl TargetMetric {
    /// Read the metric from an actor.
    #[must_use]
    pub fn of(self, actor: &Actor) -> f64 {
        let s = &actor.stats;
        match self {
            Self::HpPct => s.fraction(ResourceKind::Hp),
            Self::StaPct => s.fraction(ResourceKind::Sta),
            Self::MpPct => s.fraction(ResourceKind::Mp),
            Self::Hp => s.hp as f64,
            Self::Atk => s.atk as f64,
            Self::Def => s.def as f64,
            Self::Lv => s.level as f64,
        }
    }
}

fn one() -> usize {
    1
}

/// Targeting specification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSelector {
    pub side: TargetSide,
    #[serde(default)]
    pub mode: TargetMode,
    #[serde(default = "one")]
    pub count: usize,
    #[serde(default)]
    pub of_what: Option<TargetMetric>,
    #[serde(default)]
    pub condition: Option<Filter>,
    #[serde(default)]
    pub include_dead: bool,
}

impl TargetSelector {
    /// Create a selector picking one candidate.
    #[must_use]
    pub fn new(side: TargetSide, mode: TargetMode) -> Self {
        Self {
            side,
            mode,
            count: 1,
            of_what: None,
            condition: None,
            include_dead: false,
        }
    }

    /// The acting actor.
    #[must_use]
    pub fn user() -> Self {
        Self::new(TargetSide::Self_, TargetMode::Self_)
    }

    /// First living enemy.
    #[must_use]
    pub fn single_enemy() -> Self {
        Self::new(TargetSide::Enemy, TargetMode::Single)
    }

    /// Every living enemy.
    #[must_use]
    pub fn all_enemies() -> Self {
        Self::new(TargetSide::Enemy, TargetMode::All)
    }

    /// First living ally.
    #[must_use]
    pub fn single_ally() -> Self {
        Self::new(TargetSide::Ally, TargetMode::Single)
    }

    /// Every living ally.
    #[must_use]
    pub fn all_allies() -> Self {
        Self::new(TargetSide::Ally, TargetMode::All)
    }

    /// Set the count (builder pattern).
    #[must_use]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Set the metric (builder pattern).
    #[must_use]
    pub fn of_what(mut self, metric: TargetMetric) -> Self {
        self.of_what = Some(metric);
        self
    }

    /// Set the condition (builder pattern).
    #[must_use]
    pub fn with_condition(mut self, condition: Filter) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Include fainted actors (builder pattern).
    #[must_use]
    pub fn include_dead(mut self) -> Self {
        self.include_dead = true;
        self
    }
}

/// Resolve a selector to an ordered list of actor ids.
///
/// `explicit` ids (when non-empty) replace the mode's own choice for
/// `single`, `random`, `lowest`, `highest` and `condition`: ids are kept in
/// the caller's order if they are candidates, then truncated to `count`.
///
/// May return an empty list; callers treat that as "no valid target".
pub fn resolve_targets(
    state: &mut BattleState,
    selector: &TargetSelector,
    acting: &ActorId,
    explicit: Option<&[ActorId]>,
) -> Vec<ActorId> {
    if matches!(selector.side, TargetSide::Enemy | TargetSide::Any) {
        if let Some(source) = forced_target(state, acting) {
            return vec![source];
        }
    }

    let pool = candidate_pool(state, selector, acting);
    if pool.is_empty() {
        return pool;
    }

    let count = selector.count.min(pool.len());

    if let Some(ids) = explicit.filter(|ids| !ids.is_empty()) {
        if !matches!(selector.mode, TargetMode::Self_ | TargetMode::All) {
            return explicit_selection(state, selector, &pool, ids, count);
        }
    }

    match selector.mode {
        TargetMode::Self_ | TargetMode::Single => pool.into_iter().take(1).collect(),

        TargetMode::All => pool,

        TargetMode::Random => {
            let mut remaining = pool;
            let mut picked = Vec::with_capacity(count);
            for _ in 0..count {
                let idx = state.rng.gen_index(remaining.len());
                picked.push(remaining.remove(idx));
            }
            picked
        }

        TargetMode::Lowest | TargetMode::Highest => {
            let metric = selector.of_what.unwrap_or_default();
            let mut scored: Vec<(f64, ActorId)> = pool
                .into_iter()
                .map(|id| (state.actor(&id).map_or(0.0, |a| metric.of(a)), id))
                .collect();

            // Stable sorts keep roster order on ties.
            if selector.mode == TargetMode::Lowest {
                scored.sort_by(|a, b| a.0.total_cmp(&b.0));
            } else {
                scored.sort_by(|a, b| b.0.total_cmp(&a.0));
            }
            scored.into_iter().take(count).map(|(_, id)| id).collect()
        }

        TargetMode::Condition => pool
            .into_iter()
            .filter(|id| passes_condition(state, selector, id))
            .take(count)
            .collect(),
    }
}

/// Check if resolution without explicit ids would find a target.
///
/// Reads state only: no RNG draw, no taunt clearing.
#[must_use]
pub fn has_candidates(state: &BattleState, selector: &TargetSelector, acting: &ActorId) -> bool {
    if matches!(selector.side, TargetSide::Enemy | TargetSide::Any)
        && state
            .taunts
            .get(acting)
            .is_some_and(|t| state.is_alive(&t.source_id))
    {
        return true;
    }

    let pool = candidate_pool(state, selector, acting);
    match selector.mode {
        TargetMode::Self_ | TargetMode::Single | TargetMode::All => !pool.is_empty(),
        TargetMode::Random | TargetMode::Lowest | TargetMode::Highest => selector.count > 0 && !pool.is_empty(),
        TargetMode::Condition => {
            selector.count > 0 && pool.iter().any(|id| passes_condition(state, selector, id))
        }
    }
}

/// Taunt source forced onto `acting`, clearing the taunt if it is stale.
fn forced_target(state: &mut BattleState, acting: &ActorId) -> Option<ActorId> {
    let source = state.taunts.get(acting)?.source_id.clone();
    if state.is_alive(&source) {
        Some(source)
    } else {
        tracing::debug!(%acting, %source, "clearing stale taunt");
        state.taunts.remove(acting);
        None
    }
}

fn candidate_pool(state: &BattleState, selector: &TargetSelector, acting: &ActorId) -> Vec<ActorId> {
    let Some(own) = state.side_of(acting) else {
        return Vec::new();
    };

    let ids: Vec<&ActorId> = match selector.side {
        TargetSide::Self_ => vec![acting],
        TargetSide::Ally => state.roster(own).iter().collect(),
        TargetSide::Enemy => state.roster(own.opponent()).iter().collect(),
        TargetSide::Any => std::iter::once(acting)
            .chain(state.roster(own).iter().filter(|id| *id != acting))
            .chain(state.roster(own.opponent()).iter())
            .collect(),
    };

    ids.into_iter()
        .filter(|id| selector.include_dead || state.is_alive(id))
        .cloned()
        .collect()
}

fn passes_condition(state: &BattleState, selector: &TargetSelector, id: &ActorId) -> bool {
    state
        .actor(id)
        .is_some_and(|actor| filter::matches_opt(actor, selector.condition.as_ref()))
}

fn explicit_selection(
    state: &BattleState,
    selector: &TargetSelector,
    pool: &[ActorId],
    ids: &[ActorId],
    count: usize,
) -> Vec<ActorId> {
    let mut picked: Vec<ActorId> = Vec::with_capacity(count);
    for id in ids {
        if picked.len() == count {
            break;
        }
        if picked.contains(id) || !pool.contains(id) {
            continue;
        }
        if selector.mode == TargetMode::Condition && !passes_condition(state, selector, id) {
            continue;
        }
        picked.push(id.clone());
    }
    picked
}
