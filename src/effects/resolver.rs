//! Effect resolution - executing effects on battle state.
//!
//! The `EffectResolver` applies one compiled effect to an already resolved
//! target list. Each meaningful outcome appends a log line.
//!
//! ## Dispatch
//!
//! - Per-target kinds run once per target, gated by `only_if` against that
//!   target. Fainted targets are skipped by everything except `revive`.
//! - Targetless kinds (`flee`, `summon`, `giveItem`, `removeItem`) run once
//!   per effect for the user.
//!
//! ## Hooks
//!
//! Status hooks run synchronously through the same resolver. The resolver
//! tracks which `(holder, status, hook)` triples are currently running and
//! refuses to re-enter one, so mutually triggering hooks always terminate.

use tracing::{debug, warn};

use crate::combat::{self, Rolls};
use crate::content::{Rules, StatusHook};
use crate::core::{ActorId, BattleState, EndReason, ResourceKind, Taunt};
use crate::filter;
use crate::status::StatusEngine;

use super::effect::{EffectKind, RuntimeEffect};
use super::value;

/// Default shield bucket id.
pub const DEFAULT_SHIELD: &str = "shield";

/// Most actors one `summon` effect may add.
pub const MAX_SUMMONS: i64 = 8;

/// Whether the caller should keep running effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectFlow {
    Continue,
    /// The battle ended mid-action; remaining effects and targets are dropped.
    Halt,
}

/// Where an effect came from.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectSource {
    /// Action element, used by damage effects without their own.
    pub element: Option<String>,
    /// Magnitude multiplier (stack count for `stackMagnitude` hooks).
    pub scale: f64,
}

impl Default for EffectSource {
    fn default() -> Self {
        Self {
            element: None,
            scale: 1.0,
        }
    }
}

impl EffectSource {
    /// Effects run by an action.
    #[must_use]
    pub fn action(element: Option<&str>) -> Self {
        Self {
            element: element.map(str::to_string),
            scale: 1.0,
        }
    }

    /// Effects run by a status hook.
    #[must_use]
    pub fn hook(scale: f64) -> Self {
        Self { element: None, scale }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct HookFrame {
    holder: ActorId,
    status_id: String,
    hook: StatusHook,
}

/// Damage numbers computed before any mutation.
struct DamagePlan {
    hit_chance: f64,
    crit_chance: f64,
    base: f64,
    element_mult: f64,
    resist_mult: f64,
    user_name: String,
    target_name: String,
}

/// Applies effects to battle state.
pub struct EffectResolver<'a> {
    rules: Rules<'a>,
    running_hooks: Vec<HookFrame>,
}

impl<'a> EffectResolver<'a> {
    #[must_use]
    pub fn new(rules: Rules<'a>) -> Self {
        Self {
            rules,
            running_hooks: Vec::new(),
        }
    }

    /// Definitions and balance this resolver reads.
    #[must_use]
    pub fn rules(&self) -> Rules<'a> {
        self.rules
    }

    /// Mark a hook as running. Returns `false` if it already is.
    pub(crate) fn enter_hook(&mut self, holder: &ActorId, status_id: &str, hook: StatusHook) -> bool {
        let running = self
            .running_hooks
            .iter()
            .any(|f| f.hook == hook && f.holder == *holder && f.status_id == status_id);
        if running {
            return false;
        }
        self.running_hooks.push(HookFrame {
            holder: holder.clone(),
            status_id: status_id.to_string(),
            hook,
        });
        true
    }

    pub(crate) fn exit_hook(&mut self) {
        self.running_hooks.pop();
    }

    /// Apply one effect from `user` to `targets`.
    pub fn apply(
        &mut self,
        state: &mut BattleState,
        effect: &RuntimeEffect,
        source: &EffectSource,
        user: &ActorId,
        targets: &[ActorId],
    ) -> EffectFlow {
        if state.is_over() {
            return EffectFlow::Halt;
        }
        debug!(kind = ?effect.kind, %user, targets = targets.len(), "applying effect");

        if effect.kind.is_targetless() {
            return self.apply_targetless(state, effect, source, user);
        }

        let mut rolls = Rolls::new(effect.shared_accuracy_roll);
        for target in targets {
            let Some(actor) = state.actor(target) else {
                continue;
            };
            if !actor.alive && effect.kind != EffectKind::Revive {
                continue;
            }
            if !filter::matches_opt(actor, effect.only_if.as_ref()) {
                continue;
            }

            let flow = match effect.kind {
                EffectKind::Damage => self.damage(state, effect, source, user, target, &mut rolls),
                EffectKind::ApplyStatus => match effect.status_id.as_deref() {
                    Some(status_id) => StatusEngine::apply(self, state, target, status_id, effect.status_turns),
                    None => EffectFlow::Continue,
                },
                _ => {
                    self.apply_simple(state, effect, source, user, target);
                    EffectFlow::Continue
                }
            };
            if flow == EffectFlow::Halt {
                return EffectFlow::Halt;
            }
        }
        EffectFlow::Continue
    }

    /// Resolve an effect's magnitude for one `(user, target)` pair.
    fn magnitude(
        &self,
        state: &BattleState,
        effect: &RuntimeEffect,
        source: &EffectSource,
        user: &ActorId,
        target: &ActorId,
    ) -> f64 {
        let (Some(u), Some(t)) = (state.actor(user), state.actor(target)) else {
            return 0.0;
        };
        let defs = self.rules.defs;
        let u = combat::effective_actor(u, defs);
        let t = combat::effective_actor(t, defs);
        value::resolve(&effect.value, &u, &t, effect.percent_basis()) * source.scale
    }

    fn damage(
        &mut self,
        state: &mut BattleState,
        effect: &RuntimeEffect,
        source: &EffectSource,
        user: &ActorId,
        target: &ActorId,
        rolls: &mut Rolls,
    ) -> EffectFlow {
        let balance = self.rules.balance;
        let element = effect.element.as_deref().or(source.element.as_deref());

        let plan = {
            let (Some(u), Some(t)) = (state.actor(user), state.actor(target)) else {
                return EffectFlow::Continue;
            };
            let attacker = combat::effective_actor(u, self.rules.defs);
            let defender = combat::effective_actor(t, self.rules.defs);
            DamagePlan {
                hit_chance: combat::hit_chance(balance, &attacker, &defender),
                crit_chance: combat::crit_chance(balance, &attacker, &defender),
                base: value::resolve(&effect.value, &attacker, &defender, effect.percent_basis()),
                element_mult: combat::element_mult(balance, element, t),
                resist_mult: combat::tag_resist_mult(balance, t),
                user_name: u.name.clone(),
                target_name: t.name.clone(),
            }
        };

        if effect.can_miss && !rolls.hit(&mut state.rng, plan.hit_chance) {
            state.push_log(format!("{}'s attack missed {}.", plan.user_name, plan.target_name));
            return EffectFlow::Continue;
        }
        let crit = effect.can_crit && rolls.crit(&mut state.rng, plan.crit_chance);
        let crit_mult = if crit { balance.crit_mult } else { 1.0 };

        let raw = plan.base * plan.element_mult * plan.resist_mult * crit_mult * source.scale;
        let amount = if raw.is_finite() { raw.round().max(0.0) as i64 } else { 0 };

        let mut prefix = if crit { "Critical hit! " } else { "" };
        let absorbed = state.absorb(target, element, amount);
        if absorbed > 0 {
            state.push_log(format!("{prefix}{}'s shield absorbed {absorbed} damage.", plan.target_name));
            prefix = "";
        }

        let dealt = amount - absorbed;
        if dealt > 0 || absorbed == 0 {
            if let Some(actor) = state.actor_mut(target) {
                actor.stats.add_resource(ResourceKind::Hp, -dealt);
            }
            state.push_log(format!("{prefix}{} takes {dealt} damage.", plan.target_name));
        }
        Self::faint_if_down(state, target);

        StatusEngine::on_damage(self, state, user, target)
    }

    /// Kinds with no rolls and no hooks.
    fn apply_simple(
        &mut self,
        state: &mut BattleState,
        effect: &RuntimeEffect,
        source: &EffectSource,
        user: &ActorId,
        target: &ActorId,
    ) {
        let defs = self.rules.defs;
        let name = state.name_of(target);

        match effect.kind {
            EffectKind::Heal => {
                let resource = effect.resource.unwrap_or(ResourceKind::Hp);
                let amount = self.magnitude(state, effect, source, user, target).round().max(0.0) as i64;
                let gained = state
                    .actor_mut(target)
                    .map_or(0, |a| a.stats.add_resource(resource, amount));
                state.push_log(format!("{name} recovers {gained} {}.", resource.label()));
            }

            EffectKind::Resource => {
                let resource = effect.resource.unwrap_or(ResourceKind::Hp);
                let delta = self.magnitude(state, effect, source, user, target).round() as i64;
                let applied = state
                    .actor_mut(target)
                    .map_or(0, |a| a.stats.add_resource(resource, delta));
                if applied >= 0 {
                    state.push_log(format!("{name} gains {applied} {}.", resource.label()));
                } else {
                    state.push_log(format!("{name} loses {} {}.", -applied, resource.label()));
                }
                Self::faint_if_down(state, target);
            }

            EffectKind::CleanseStatus => {
                let removed = StatusEngine::cleanse(state, defs, target, effect.cleanse_tags.as_deref());
                if !removed.is_empty() {
                    state.push_log(format!("{name} was cleansed of {}.", removed.join(", ")));
                }
            }

            EffectKind::Dispel => {
                let removed = StatusEngine::dispel(state, defs, target, effect.status_id.as_deref());
                if !removed.is_empty() {
                    state.push_log(format!("{} dispelled from {name}.", removed.join(", ")));
                }
            }

            EffectKind::ModifyStat => {
                let Some(stat) = effect.stat else {
                    debug!("modifyStat without a stat");
                    return;
                };
                let delta = self.magnitude(state, effect, source, user, target).round() as i64;
                if let Some(actor) = state.actor_mut(target) {
                    actor.stats.adjust_stat(stat, delta);
                }
                let verb = if delta >= 0 { "rises" } else { "falls" };
                state.push_log(format!("{name}'s {} {verb} by {}.", stat.label(), delta.abs()));
                Self::faint_if_down(state, target);
            }

            EffectKind::Shield => {
                let amount = self.magnitude(state, effect, source, user, target).round().max(0.0) as i64;
                let id = effect.shield_id.as_deref().unwrap_or(DEFAULT_SHIELD);
                state.add_shield(target, id, effect.element.as_deref(), amount);
                state.push_log(format!("{name} gains a {amount} HP shield."));
            }

            EffectKind::Taunt => {
                let turns = effect.status_turns.unwrap_or(1);
                state.taunts.insert(
                    target.clone(),
                    Taunt {
                        source_id: user.clone(),
                        turns,
                    },
                );
                let user_name = state.name_of(user);
                state.push_log(format!("{name} is taunted by {user_name}!"));
            }

            EffectKind::Revive => {
                let max_hp = state.actor(target).map_or(0, |a| a.stats.max_hp);
                if state.is_alive(target) || max_hp <= 0 {
                    return;
                }
                let hp = (self.magnitude(state, effect, source, user, target).round() as i64).clamp(1, max_hp);
                if let Some(actor) = state.actor_mut(target) {
                    actor.alive = true;
                    actor.stats.set_resource(ResourceKind::Hp, hp);
                }
                state.push_log(format!("{name} was revived with {hp} HP!"));
            }

            EffectKind::PreventAction => {
                state.prevented.insert(target.clone(), state.boundaries);
                state.push_log(format!("{name} will lose their next turn."));
            }

            EffectKind::Damage | EffectKind::ApplyStatus => {}
            EffectKind::Flee | EffectKind::Summon | EffectKind::GiveItem | EffectKind::RemoveItem => {}
        }
    }

    fn apply_targetless(
        &mut self,
        state: &mut BattleState,
        effect: &RuntimeEffect,
        source: &EffectSource,
        user: &ActorId,
    ) -> EffectFlow {
        let user_name = state.name_of(user);

        match effect.kind {
            EffectKind::Flee => {
                state.push_log(format!("{user_name} fled from battle!"));
                state.end(EndReason::Fled);
                return EffectFlow::Halt;
            }

            EffectKind::Summon => {
                let count = self.magnitude(state, effect, source, user, user).round() as i64;
                for _ in 0..count.clamp(1, MAX_SUMMONS) {
                    self.summon(state, effect, user);
                }
            }

            EffectKind::GiveItem | EffectKind::RemoveItem => {
                let Some(item_id) = effect.item_id.as_deref() else {
                    debug!(kind = ?effect.kind, "inventory effect without an item id");
                    return EffectFlow::Continue;
                };
                let qty = self.magnitude(state, effect, source, user, user).round() as i64;
                let qty = u32::try_from(qty).ok().filter(|q| *q > 0).unwrap_or(1);
                let label = self
                    .rules
                    .defs
                    .item(item_id)
                    .map_or_else(|| item_id.to_string(), |item| item.name.clone());

                if effect.kind == EffectKind::GiveItem {
                    let entry = state.inventory.entry(item_id.to_string()).or_insert(0);
                    *entry = entry.saturating_add(qty);
                    state.push_log(format!("{user_name} obtained {qty} {label}."));
                } else {
                    let have = state.item_count(item_id);
                    let left = have.saturating_sub(qty);
                    if left == 0 {
                        state.inventory.remove(item_id);
                    } else {
                        state.inventory.insert(item_id.to_string(), left);
                    }
                    state.push_log(format!("{user_name} lost {} {label}.", have - left));
                }
            }

            _ => {}
        }
        EffectFlow::Continue
    }

    fn summon(&mut self, state: &mut BattleState, effect: &RuntimeEffect, user: &ActorId) {
        let Some(template) = effect.summon_id.as_deref() else {
            debug!("summon without a template id");
            return;
        };
        let Some(side) = state.side_of(user) else {
            return;
        };
        let level = state.actor(user).map_or(1, |a| a.stats.level);
        let level = u32::try_from(level.max(0)).unwrap_or(u32::MAX);

        let Some(mut summoned) = self.rules.defs.spawn_enemy(template, level) else {
            warn!(template, "summon references an unknown enemy template");
            return;
        };

        let id = loop {
            state.spawned += 1;
            let candidate = ActorId::new(format!("{template}#{}", state.spawned));
            if !state.actors.contains_key(&candidate) {
                break candidate;
            }
        };
        summoned.id = id;
        let summoned_name = summoned.name.clone();

        match state.insert_actor(side, summoned) {
            Ok(()) => {
                let user_name = state.name_of(user);
                state.push_log(format!("{user_name} summons {summoned_name}!"));
            }
            Err(err) => warn!(%err, "summon failed"),
        }
    }

    /// Faint an actor whose hp reached 0.
    fn faint_if_down(state: &mut BattleState, target: &ActorId) {
        let Some(actor) = state.actor_mut(target) else {
            return;
        };
        if actor.alive && actor.stats.hp <= 0 {
            actor.faint();
            let name = actor.name.clone();
            state.push_log(format!("{name} fainted!"));
        }
    }
}
