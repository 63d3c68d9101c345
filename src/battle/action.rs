//! Action execution.
//!
//! ## Validation order
//!
//! The first failing check rejects the action:
//!
//! 1. Battle not over, actor exists
//! 2. Actor alive, it is their turn, not prevented
//! 3. `canUse` filter passes for the actor
//! 4. STA, then MP affordable
//! 5. Cooldown at 0
//! 6. Charges left (capped actions only)
//! 7. Inventory unit available (items only)
//! 8. Targeting resolves to at least one actor
//!
//! A rejection appends its message to the log and leaves everything else
//! untouched.
//!
//! ## Execution
//!
//! Debit costs, start the cooldown, spend a charge and an inventory unit,
//! run each effect in order (stopping when the battle ends mid-action),
//! log the summary line, then check for victory or defeat.

use tracing::debug;

use crate::content::{Rules, RuntimeItem, RuntimeSkill, Usable};
use crate::core::{ActionRejection, ActorId, BattleState, Charges, EndReason, ResourceKind};
use crate::effects::{resolve_targets, EffectFlow, EffectResolver, EffectSource};
use crate::filter;

use super::outcome;

/// What a successful action did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionReport {
    pub action_id: String,
    /// Action-level targets in resolution order.
    pub targets: Vec<ActorId>,
    /// Set when the action ended the battle.
    pub outcome: Option<EndReason>,
}

/// Validates and executes skills and items.
pub struct ActionExecutor;

impl ActionExecutor {
    /// Use a skill.
    pub fn use_skill(
        state: &mut BattleState,
        rules: Rules<'_>,
        skill: &RuntimeSkill,
        actor: &ActorId,
        explicit: Option<&[ActorId]>,
    ) -> Result<ActionReport, ActionRejection> {
        Self::execute(state, rules, skill, actor, explicit)
    }

    /// Use an item from the shared inventory.
    pub fn use_item(
        state: &mut BattleState,
        rules: Rules<'_>,
        item: &RuntimeItem,
        actor: &ActorId,
        explicit: Option<&[ActorId]>,
    ) -> Result<ActionReport, ActionRejection> {
        Self::execute(state, rules, item, actor, explicit)
    }

    /// Validate and run any usable action.
    pub fn execute(
        state: &mut BattleState,
        rules: Rules<'_>,
        action: &dyn Usable,
        actor: &ActorId,
        explicit: Option<&[ActorId]>,
    ) -> Result<ActionReport, ActionRejection> {
        if let Err(rejection) = Self::validate(state, action, actor) {
            return Err(Self::reject(state, action, actor, rejection));
        }

        // Resolution may draw or clear a stale taunt; undo both on rejection.
        let rng = state.rng;
        let taunt = state.taunts.get(actor).cloned();
        let targets = resolve_targets(state, action.targeting(), actor, explicit);
        if targets.is_empty() {
            state.rng = rng;
            if let Some(taunt) = taunt {
                state.taunts.insert(actor.clone(), taunt);
            }
            let rejection = ActionRejection::NoValidTarget {
                action: action.name().to_string(),
            };
            return Err(Self::reject(state, action, actor, rejection));
        }

        Self::pay(state, action, actor);

        let mut resolver = EffectResolver::new(rules);
        let source = EffectSource::action(action.element());
        for effect in action.effects() {
            let effect_targets = match &effect.selector {
                Some(selector) => resolve_targets(state, selector, actor, None),
                None => targets.clone(),
            };
            if resolver.apply(state, effect, &source, actor, &effect_targets) == EffectFlow::Halt {
                break;
            }
        }

        let actor_name = state.name_of(actor);
        state.push_log(format!("{actor_name} used {}.", action.name()));
        let outcome = outcome::evaluate_outcome(state);

        Ok(ActionReport {
            action_id: action.id().to_string(),
            targets,
            outcome,
        })
    }

    /// Run every check except target resolution. Reads state only.
    pub fn validate(state: &BattleState, action: &dyn Usable, actor: &ActorId) -> Result<(), ActionRejection> {
        if state.is_over() {
            return Err(ActionRejection::BattleOver);
        }
        let Some(a) = state.actor(actor) else {
            return Err(ActionRejection::UnknownActor(actor.clone()));
        };
        let name = || a.name.clone();
        let action_name = || action.name().to_string();

        if !a.alive {
            return Err(ActionRejection::Fainted { actor: name() });
        }
        if state.current_actor() != Some(actor) {
            return Err(ActionRejection::NotYourTurn { actor: name() });
        }
        if state.is_prevented(actor) {
            return Err(ActionRejection::Prevented { actor: name() });
        }
        if !filter::matches_opt(a, action.can_use()) {
            return Err(ActionRejection::CanUseBlocked { action: action_name() });
        }

        let costs = action.costs();
        if a.stats.sta < costs.sta {
            return Err(ActionRejection::NotEnoughSta {
                action: action_name(),
                needed: costs.sta,
                available: a.stats.sta,
            });
        }
        if a.stats.mp < costs.mp {
            return Err(ActionRejection::NotEnoughMp {
                action: action_name(),
                needed: costs.mp,
                available: a.stats.mp,
            });
        }

        let cooldown = state.cooldown(actor, action.id());
        if cooldown > 0 {
            return Err(ActionRejection::OnCooldown {
                action: action_name(),
                turns: cooldown,
            });
        }

        if let Some(max) = action.charges() {
            let left = state.charges_of(actor, action.id()).map_or(max, |c| c.remaining);
            if left == 0 {
                return Err(ActionRejection::NoCharges { action: action_name() });
            }
        }

        if let Some(item) = action.inventory_item() {
            if state.item_count(item) == 0 {
                return Err(ActionRejection::NotInInventory { item: action_name() });
            }
        }

        Ok(())
    }

    fn reject(
        state: &mut BattleState,
        action: &dyn Usable,
        actor: &ActorId,
        rejection: ActionRejection,
    ) -> ActionRejection {
        debug!(%actor, action = action.id(), %rejection, "action rejected");
        state.push_log(rejection.to_string());
        rejection
    }

    /// Debit costs and start cooldown / charge / inventory bookkeeping.
    fn pay(state: &mut BattleState, action: &dyn Usable, actor: &ActorId) {
        let costs = action.costs();
        if let Some(a) = state.actor_mut(actor) {
            a.stats.add_resource(ResourceKind::Sta, -costs.sta);
            a.stats.add_resource(ResourceKind::Mp, -costs.mp);
        }

        let id = action.id();
        if action.cooldown() > 0 {
            state
                .cooldowns
                .entry(actor.clone())
                .or_default()
                .insert(id.to_string(), action.cooldown());
        }

        if let Some(max) = action.charges() {
            let charges = state
                .charges
                .entry(actor.clone())
                .or_default()
                .entry(id.to_string())
                .or_insert(Charges { remaining: max, max });
            charges.remaining = charges.remaining.saturating_sub(1);
        }

        if action.consumes_item() {
            if let Some(item) = action.inventory_item() {
                let left = state.item_count(item).saturating_sub(1);
                if left == 0 {
                    state.inventory.remove(item);
                } else {
                    state.inventory.insert(item.to_string(), left);
                }
            }
        }
    }
}
