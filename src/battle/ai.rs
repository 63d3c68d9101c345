//! Enemy action selection.
//!
//! Candidates that would fail validation, or that have no target to aim at,
//! are dropped first. One RNG draw then picks among the rest in proportion
//! to `ai_weight`; actions with a non-positive weight are never picked.

use tracing::debug;

use crate::content::Usable;
use crate::core::{ActorId, BattleState};
use crate::effects::has_candidates;

use super::action::ActionExecutor;

/// Pick an action for `actor`.
///
/// Returns `None` without drawing when nothing is usable.
pub fn choose_action<'c>(
    state: &mut BattleState,
    actor: &ActorId,
    candidates: &[&'c dyn Usable],
) -> Option<&'c dyn Usable> {
    let usable: Vec<&'c dyn Usable> = candidates
        .iter()
        .copied()
        .filter(|action| {
            ActionExecutor::validate(state, *action, actor).is_ok()
                && has_candidates(state, action.targeting(), actor)
        })
        .collect();

    let weights: Vec<f64> = usable.iter().map(|action| action.ai_weight()).collect();
    let index = state.rng.choose_weighted(&weights)?;
    let chosen = usable[index];
    debug!(%actor, action = chosen.id(), "ai chose action");
    Some(chosen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::RuntimeSkill;
    use crate::core::{Actor, StatBlock};

    fn battle() -> BattleState {
        BattleState::new(
            21,
            [Actor::new("hero", "Hero", StatBlock::new(30, 0, 0, 5, 5, 1))],
            [Actor::new("slime", "Slime", StatBlock::new(30, 0, 4, 5, 5, 1))],
        )
        .unwrap()
    }

    #[test]
    fn test_never_picks_unusable() {
        let mut state = battle();
        let hero = ActorId::from("hero");
        let pricey = RuntimeSkill::new("meteor", "Meteor").with_costs(0, 50).with_ai_weight(100.0);
        let cheap = RuntimeSkill::new("jab", "Jab");
        let candidates: [&dyn Usable; 2] = [&pricey, &cheap];

        for _ in 0..20 {
            let chosen = choose_action(&mut state, &hero, &candidates).unwrap();
            assert_eq!(chosen.id(), "jab");
        }
    }

    #[test]
    fn test_zero_weight_never_picked() {
        let mut state = battle();
        let hero = ActorId::from("hero");
        let idle = RuntimeSkill::new("idle", "Idle").with_ai_weight(0.0);
        let seed = state.rng.seed();

        let candidates: [&dyn Usable; 1] = [&idle];
        assert!(choose_action(&mut state, &hero, &candidates).is_none());
        assert_eq!(state.rng.seed(), seed);
    }

    #[test]
    fn test_not_current_actor_gets_nothing() {
        let mut state = battle();
        let jab = RuntimeSkill::new("jab", "Jab");
        let candidates: [&dyn Usable; 1] = [&jab];
        assert!(choose_action(&mut state, &"slime".into(), &candidates).is_none());
    }
}
