//! Battle end detection and victory rewards.

use crate::core::{ActorId, BattleState, EndReason, Side};

/// Set `ended` if one side is fully down. Returns the terminal reason, if any.
///
/// Victory wins when both sides are down at once. Idempotent: once the
/// battle has ended this only reports the existing reason.
pub fn evaluate_outcome(state: &mut BattleState) -> Option<EndReason> {
    if let Some(end) = state.ended {
        return Some(end.reason);
    }

    let reason = if state.side_defeated(Side::Enemy) {
        EndReason::Victory
    } else if state.side_defeated(Side::Player) {
        EndReason::Defeat
    } else {
        return None;
    };

    state.end(reason);
    match reason {
        EndReason::Victory => grant_rewards(state),
        EndReason::Defeat => state.push_log("Defeat..."),
        EndReason::Fled => {}
    }
    Some(reason)
}

/// Every surviving player gains the enemy roster's total xp; the total gold
/// goes to the first surviving player.
fn grant_rewards(state: &mut BattleState) {
    let (xp, gold) = state
        .enemies
        .iter()
        .filter_map(|id| state.actor(id))
        .fold((0i64, 0i64), |(xp, gold), enemy| (xp + enemy.stats.xp, gold + enemy.stats.gold));

    let survivors: Vec<ActorId> = state.living(Side::Player).cloned().collect();
    for (i, id) in survivors.iter().enumerate() {
        if let Some(actor) = state.actor_mut(id) {
            actor.stats.xp = actor.stats.xp.saturating_add(xp);
            if i == 0 {
                actor.stats.gold = actor.stats.gold.saturating_add(gold);
            }
        }
    }

    state.push_log(format!("Victory! Gained {xp} XP and {gold} gold."));
}
