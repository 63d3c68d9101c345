//! Status lifecycle.
//!
//! ## Application
//!
//! First application adds an instance with one stack and fires `onApply`.
//! Re-application follows the template's [`StackRule`]; every accepted
//! re-application fires `onApply` again.
//!
//! ## Turn boundary
//!
//! For the actor whose turn ends: `onTurnStart` hooks, decrement every
//! instance, `onTurnEnd` hooks, then remove instances at 0 and fire
//! `onExpire` for each.
//!
//! ## Removal
//!
//! `cleanse` and `dispel` remove instances without firing `onExpire`.
//! Any shield bucket granted by a removed status goes with it.

use tracing::{debug, warn};

use crate::combat;
use crate::content::{Definitions, StackRule, StatusHook, StatusTemplate};
use crate::core::{ActorId, BattleState, ResourceKind, StatusInstance};
use crate::effects::targeting::resolve_targets;
use crate::effects::{value, EffectFlow, EffectResolver, EffectSource};

/// What an application did to the target's instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Applied {
    Added,
    Renewed,
    Stacked(u32),
    Ignored,
}

/// Applies, ticks and removes statuses.
pub struct StatusEngine;

impl StatusEngine {
    /// Apply a status to `target`, optionally overriding its duration.
    ///
    /// Unknown templates are skipped with a warning.
    pub fn apply(
        resolver: &mut EffectResolver<'_>,
        state: &mut BattleState,
        target: &ActorId,
        status_id: &str,
        turns: Option<u32>,
    ) -> EffectFlow {
        let defs = resolver.rules().defs;
        let Some(template) = defs.status(status_id) else {
            warn!(status_id, "unknown status template");
            return EffectFlow::Continue;
        };
        let duration = turns.unwrap_or(template.duration).max(1);

        let applied = {
            let Some(actor) = state.actor_mut(target) else {
                return EffectFlow::Continue;
            };
            match actor.statuses.iter_mut().find(|s| s.status_id == status_id) {
                None => {
                    actor.statuses.push(StatusInstance {
                        status_id: status_id.to_string(),
                        remaining: duration,
                        stacks: 1,
                    });
                    Applied::Added
                }
                Some(inst) => match template.stack_rule {
                    StackRule::Ignore => Applied::Ignored,
                    StackRule::Renew => {
                        inst.remaining = duration;
                        Applied::Renewed
                    }
                    StackRule::StackCount | StackRule::StackMagnitude => {
                        inst.stacks = (inst.stacks + 1).min(template.max_stacks.max(1));
                        inst.remaining = duration;
                        Applied::Stacked(inst.stacks)
                    }
                },
            }
        };

        let name = state.name_of(target);
        let status = template.display_name();
        let stacks = match applied {
            Applied::Ignored => {
                debug!(status_id, %target, "re-application ignored");
                return EffectFlow::Continue;
            }
            Applied::Added => {
                state.push_log(format!("{name} is afflicted by {status}."));
                1
            }
            Applied::Renewed => {
                state.push_log(format!("{status} on {name} was renewed."));
                Self::stacks_of(state, target, status_id).unwrap_or(1)
            }
            Applied::Stacked(n) => {
                state.push_log(format!("{status} on {name} stacks to {n}."));
                n
            }
        };

        Self::grant_shield(defs, state, target, template);
        Self::fire(resolver, state, target, status_id, StatusHook::OnApply, None, stacks)
    }

    /// Remove statuses whose template tags intersect `tags` (all if `None`).
    ///
    /// Returns the display names of removed statuses in instance order.
    pub fn cleanse(
        state: &mut BattleState,
        defs: &Definitions,
        target: &ActorId,
        tags: Option<&[String]>,
    ) -> Vec<String> {
        Self::remove_where(state, defs, target, |template| match tags {
            None => true,
            Some(tags) => template.is_some_and(|t| tags.iter().any(|tag| t.has_tag(tag))),
        })
    }

    /// Remove the named status, or every status if `None`.
    pub fn dispel(
        state: &mut BattleState,
        defs: &Definitions,
        target: &ActorId,
        status_id: Option<&str>,
    ) -> Vec<String> {
        let Some(actor) = state.actor(target) else {
            return Vec::new();
        };
        let ids: Vec<String> = actor
            .statuses
            .iter()
            .filter(|s| status_id.map_or(true, |id| s.status_id == id))
            .map(|s| s.status_id.clone())
            .collect();
        Self::detach(state, defs, target, &ids)
    }

    /// Run the turn boundary for the actor whose turn just ended.
    pub fn tick(resolver: &mut EffectResolver<'_>, state: &mut BattleState, holder: &ActorId) -> EffectFlow {
        let Some(actor) = state.actor(holder) else {
            return EffectFlow::Continue;
        };
        let ids: Vec<String> = actor.statuses.iter().map(|s| s.status_id.clone()).collect();
        if ids.is_empty() {
            return EffectFlow::Continue;
        }

        if Self::fire_each(resolver, state, holder, &ids, StatusHook::OnTurnStart) == EffectFlow::Halt {
            return EffectFlow::Halt;
        }

        if let Some(actor) = state.actor_mut(holder) {
            for inst in actor.statuses.iter_mut().filter(|s| ids.contains(&s.status_id)) {
                inst.remaining = inst.remaining.saturating_sub(1);
            }
        }

        if Self::fire_each(resolver, state, holder, &ids, StatusHook::OnTurnEnd) == EffectFlow::Halt {
            return EffectFlow::Halt;
        }

        let mut expired: Vec<StatusInstance> = Vec::new();
        if let Some(actor) = state.actor_mut(holder) {
            actor.statuses.retain(|inst| {
                if inst.remaining == 0 {
                    expired.push(inst.clone());
                    false
                } else {
                    true
                }
            });
        }

        let defs = resolver.rules().defs;
        let name = state.name_of(holder);
        for inst in expired {
            let template = defs.status(&inst.status_id);
            if let Some(bucket) = template.and_then(StatusTemplate::shield_bucket) {
                state.remove_shield(holder, bucket);
            }
            let status = template.map_or(inst.status_id.as_str(), StatusTemplate::display_name);
            state.push_log(format!("{name}'s {status} wore off."));

            let flow = Self::fire(resolver, state, holder, &inst.status_id, StatusHook::OnExpire, None, inst.stacks);
            if flow == EffectFlow::Halt {
                return EffectFlow::Halt;
            }
        }
        EffectFlow::Continue
    }

    /// Fire `onDealDamage` on the attacker, then `onTakeDamage` on the victim.
    pub fn on_damage(
        resolver: &mut EffectResolver<'_>,
        state: &mut BattleState,
        attacker: &ActorId,
        victim: &ActorId,
    ) -> EffectFlow {
        for (holder, hook, other) in [
            (attacker, StatusHook::OnDealDamage, victim),
            (victim, StatusHook::OnTakeDamage, attacker),
        ] {
            let held: Vec<(String, u32)> = state
                .actor(holder)
                .map(|a| a.statuses.iter().map(|s| (s.status_id.clone(), s.stacks)).collect())
                .unwrap_or_default();

            for (status_id, stacks) in held {
                if Self::fire(resolver, state, holder, &status_id, hook, Some(other), stacks) == EffectFlow::Halt {
                    return EffectFlow::Halt;
                }
            }
        }
        EffectFlow::Continue
    }

    /// Run one status hook for `holder`.
    ///
    /// Hooks fire only while the holder is alive and never re-enter a
    /// `(holder, status, hook)` that is already running. Effects without a
    /// selector target `counterpart` for damage hooks, the holder otherwise.
    pub fn fire(
        resolver: &mut EffectResolver<'_>,
        state: &mut BattleState,
        holder: &ActorId,
        status_id: &str,
        hook: StatusHook,
        counterpart: Option<&ActorId>,
        stacks: u32,
    ) -> EffectFlow {
        let defs = resolver.rules().defs;
        let Some(template) = defs.status(status_id) else {
            return EffectFlow::Continue;
        };
        let effects = template.hooks(hook);
        if effects.is_empty() || !state.is_alive(holder) {
            return EffectFlow::Continue;
        }
        if !resolver.enter_hook(holder, status_id, hook) {
            debug!(status_id, ?hook, %holder, "suppressed re-entrant hook");
            return EffectFlow::Continue;
        }

        let scale = if template.stack_rule == StackRule::StackMagnitude {
            f64::from(stacks.max(1))
        } else {
            1.0
        };
        let source = EffectSource::hook(scale);
        let default_target = match hook {
            StatusHook::OnDealDamage | StatusHook::OnTakeDamage => counterpart.unwrap_or(holder),
            _ => holder,
        };

        let mut flow = EffectFlow::Continue;
        for effect in effects {
            let targets = match &effect.selector {
                Some(selector) => resolve_targets(state, selector, holder, None),
                None => vec![default_target.clone()],
            };
            flow = resolver.apply(state, effect, &source, holder, &targets);
            if flow == EffectFlow::Halt {
                break;
            }
        }

        resolver.exit_hook();
        flow
    }

    fn fire_each(
        resolver: &mut EffectResolver<'_>,
        state: &mut BattleState,
        holder: &ActorId,
        ids: &[String],
        hook: StatusHook,
    ) -> EffectFlow {
        for id in ids {
            // removed by an earlier hook
            let Some(stacks) = Self::stacks_of(state, holder, id) else {
                continue;
            };
            if Self::fire(resolver, state, holder, id, hook, None, stacks) == EffectFlow::Halt {
                return EffectFlow::Halt;
            }
        }
        EffectFlow::Continue
    }

    fn stacks_of(state: &BattleState, holder: &ActorId, status_id: &str) -> Option<u32> {
        state.actor(holder)?.status(status_id).map(|s| s.stacks)
    }

    /// Set the template's shield bucket on the holder.
    fn grant_shield(defs: &Definitions, state: &mut BattleState, holder: &ActorId, template: &StatusTemplate) {
        let (Some(spec), Some(bucket)) = (template.shield.as_ref(), template.shield_bucket()) else {
            return;
        };
        let Some(actor) = state.actor(holder) else {
            return;
        };
        let actor = combat::effective_actor(actor, defs);
        let amount = value::resolve(&spec.value, &actor, &actor, ResourceKind::Hp);
        let amount = amount.round().max(0.0) as i64;

        state.set_shield(holder, bucket, spec.element.as_deref(), amount);
    }

    fn remove_where<F>(state: &mut BattleState, defs: &Definitions, target: &ActorId, pred: F) -> Vec<String>
    where
        F: Fn(Option<&StatusTemplate>) -> bool,
    {
        let Some(actor) = state.actor(target) else {
            return Vec::new();
        };
        let ids: Vec<String> = actor
            .statuses
            .iter()
            .filter(|s| pred(defs.status(&s.status_id)))
            .map(|s| s.status_id.clone())
            .collect();
        Self::detach(state, defs, target, &ids)
    }

    /// Remove instances and their shields. Returns display names.
    fn detach(state: &mut BattleState, defs: &Definitions, target: &ActorId, ids: &[String]) -> Vec<String> {
        if ids.is_empty() {
            return Vec::new();
        }
        if let Some(actor) = state.actor_mut(target) {
            actor.statuses.retain(|s| !ids.contains(&s.status_id));
        }

        ids.iter()
            .map(|id| {
                let template = defs.status(id);
                if let Some(bucket) = template.and_then(StatusTemplate::shield_bucket) {
                    state.remove_shield(target, bucket);
                }
                template.map_or_else(|| id.clone(), |t| t.display_name().to_string())
            })
            .collect()
    }
}
