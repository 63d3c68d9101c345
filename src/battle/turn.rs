//! Turn order and turn boundaries.
//!
//! `end_turn` runs, in order:
//!
//! 1. Status tick for the actor whose turn ends (if alive)
//! 2. Consume that actor's skip flag if it was set before the turn began
//! 3. Decrement every cooldown; decrement the ending actor's taunt
//! 4. Battle end check
//! 5. Advance to the next living actor, logging `Turn N` on each wrap

use crate::content::Rules;
use crate::core::{ActorId, BattleState};
use crate::effects::EffectResolver;
use crate::status::StatusEngine;

use super::outcome;

/// Drives the turn cycle.
pub struct TurnController;

impl TurnController {
    /// Actor whose turn it is, or `None` once the battle is over.
    #[must_use]
    pub fn current_actor(state: &BattleState) -> Option<&ActorId> {
        if state.is_over() {
            return None;
        }
        state.current_actor()
    }

    /// End the current actor's turn. No-op once the battle is over.
    pub fn end_turn(state: &mut BattleState, rules: Rules<'_>) {
        if state.is_over() {
            return;
        }
        let Some(ending) = state.current_actor().cloned() else {
            return;
        };

        if state.is_alive(&ending) {
            let mut resolver = EffectResolver::new(rules);
            StatusEngine::tick(&mut resolver, state, &ending);
        }

        if state.is_prevented(&ending) {
            state.prevented.remove(&ending);
        }
        state.boundaries += 1;

        Self::tick_cooldowns(state);
        Self::tick_taunt(state, &ending);

        if outcome::evaluate_outcome(state).is_some() {
            return;
        }
        Self::advance(state);
    }

    fn tick_cooldowns(state: &mut BattleState) {
        for per_action in state.cooldowns.values_mut() {
            per_action.retain(|_, turns| {
                *turns = turns.saturating_sub(1);
                *turns > 0
            });
        }
        state.cooldowns.retain(|_, per_action| !per_action.is_empty());
    }

    /// A taunt lasts a number of the taunted actor's own turns.
    fn tick_taunt(state: &mut BattleState, ending: &ActorId) {
        let Some(taunt) = state.taunts.get_mut(ending) else {
            return;
        };
        taunt.turns = taunt.turns.saturating_sub(1);
        if taunt.turns == 0 {
            state.taunts.remove(ending);
        }
    }

    fn advance(state: &mut BattleState) {
        let len = state.turn_order.len();
        for _ in 0..len {
            state.current += 1;
            if state.current >= len {
                state.current = 0;
                state.turn += 1;
                let turn = state.turn;
                state.push_log(format!("Turn {turn}"));
            }
            if state.current_actor().is_some_and(|id| state.is_alive(id)) {
                return;
            }
        }
    }
}
