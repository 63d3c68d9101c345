//! Hit, crit, element and resist calculations.

use std::borrow::Cow;

use crate::content::Definitions;
use crate::core::{Actor, BalanceTable, BattleRng, StatKind, NEUTRAL};

/// Actor with active status modifiers folded into atk, def and level.
///
/// Borrows the actor unchanged when no active status modifies those stats.
#[must_use]
pub fn effective_actor<'a>(actor: &'a Actor, defs: &Definitions) -> Cow<'a, Actor> {
    let modified = actor.statuses.iter().any(|inst| {
        defs.status(&inst.status_id).is_some_and(|t| {
            t.modifiers
                .iter()
                .any(|m| matches!(m.stat, StatKind::Atk | StatKind::Def | StatKind::Lv))
        })
    });
    if !modified {
        return Cow::Borrowed(actor);
    }

    let mut out = actor.clone();
    out.stats.atk = effective_stat(actor, StatKind::Atk, defs);
    out.stats.def = effective_stat(actor, StatKind::Def, defs);
    out.stats.level = effective_stat(actor, StatKind::Lv, defs);
    Cow::Owned(out)
}

/// Base stat with every matching status modifier applied in status order.
///
/// Rounded and floored at 0.
#[must_use]
pub fn effective_stat(actor: &Actor, stat: StatKind, defs: &Definitions) -> i64 {
    let mut value = actor.stats.stat(stat) as f64;
    for inst in &actor.statuses {
        let Some(template) = defs.status(&inst.status_id) else {
            continue;
        };
        for modifier in template.modifiers.iter().filter(|m| m.stat == stat) {
            value = modifier.apply(value, inst.stacks);
        }
    }
    (value.round() as i64).max(0)
}

/// Chance for `attacker` to hit `defender`.
///
/// # Formula
///
/// ```text
/// hit = base_hit + (atk - def) * hit_per_stat + (lv_a - lv_d) * hit_per_level
/// clamped to [dodge_floor, hit_ceil]
/// ```
#[must_use]
pub fn hit_chance(balance: &BalanceTable, attacker: &Actor, defender: &Actor) -> f64 {
    let (stat_diff, level_diff) = diffs(attacker, defender);
    let chance = balance.base_hit + stat_diff * balance.hit_per_stat + level_diff * balance.hit_per_level;
    chance.clamp(balance.dodge_floor, balance.hit_ceil.max(balance.dodge_floor))
}

/// Chance for a landed hit to crit. Same shape as [`hit_chance`], clamped to `[0, 1]`.
#[must_use]
pub fn crit_chance(balance: &BalanceTable, attacker: &Actor, defender: &Actor) -> f64 {
    let (stat_diff, level_diff) = diffs(attacker, defender);
    let chance = balance.base_crit + stat_diff * balance.crit_per_stat + level_diff * balance.crit_per_level;
    chance.clamp(0.0, 1.0)
}

fn diffs(attacker: &Actor, defender: &Actor) -> (f64, f64) {
    let stat = (attacker.stats.atk - defender.stats.def) as f64;
    let level = (attacker.stats.level - defender.stats.level) as f64;
    (stat, level)
}

/// Element multiplier against a target.
///
/// The first non-neutral target tag with an entry in the element's row
/// wins; otherwise the row's `neutral` entry; otherwise 1.
#[must_use]
pub fn element_mult(balance: &BalanceTable, element: Option<&str>, target: &Actor) -> f64 {
    let Some(row) = element.and_then(|e| balance.element_matrix.get(e)) else {
        return 1.0;
    };

    target
        .tags
        .iter()
        .filter(|tag| tag.as_str() != NEUTRAL)
        .find_map(|tag| row.get(tag.as_str()))
        .or_else(|| row.get(NEUTRAL))
        .copied()
        .unwrap_or(1.0)
}

/// Product of the resist multipliers for every target tag.
#[must_use]
pub fn tag_resist_mult(balance: &BalanceTable, target: &Actor) -> f64 {
    target
        .tags
        .iter()
        .filter_map(|tag| balance.resists_by_tag.get(tag.as_str()))
        .product()
}

/// Hit and crit draws for one effect application.
///
/// When shared, the first draw of each kind is reused for every target;
/// each target still compares it against its own chance.
#[derive(Clone, Copy, Debug, Default)]
pub struct Rolls {
    shared: bool,
    hit: Option<f64>,
    crit: Option<f64>,
}

impl Rolls {
    #[must_use]
    pub fn new(shared: bool) -> Self {
        Self {
            shared,
            hit: None,
            crit: None,
        }
    }

    /// Roll to hit against `chance`.
    pub fn hit(&mut self, rng: &mut BattleRng, chance: f64) -> bool {
        Self::draw(self.shared, &mut self.hit, rng) < chance
    }

    /// Roll to crit against `chance`.
    pub fn crit(&mut self, rng: &mut BattleRng, chance: f64) -> bool {
        Self::draw(self.shared, &mut self.crit, rng) < chance
    }

    fn draw(shared: bool, slot: &mut Option<f64>, rng: &mut BattleRng) -> f64 {
        if !shared {
            return rng.next_f64();
        }
        *slot.get_or_insert_with(|| rng.next_f64())
    }
}
