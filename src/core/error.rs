//! Error types.
//!
//! Two families:
//!
//! - [`ActionRejection`]: ordinary gameplay refusals. They are values, not
//!   failures; their `Display` text is the line appended to the battle log.
//! - [`BattleError`]: infrastructure problems (bad registry input, broken
//!   snapshots) that a caller must handle before or outside a battle.

use thiserror::Error;

use super::actor::ActorId;

/// Why an action was refused.
///
/// State is left unchanged apart from the log line.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ActionRejection {
    #[error("The battle is already over")]
    BattleOver,

    #[error("Unknown actor {0}")]
    UnknownActor(ActorId),

    #[error("{actor} has fainted and cannot act")]
    Fainted { actor: String },

    #[error("It is not {actor}'s turn")]
    NotYourTurn { actor: String },

    #[error("{actor} is unable to act this turn")]
    Prevented { actor: String },

    #[error("{action} cannot be used right now")]
    CanUseBlocked { action: String },

    #[error("Not enough STA for {action} (need {needed}, have {available})")]
    NotEnoughSta { action: String, needed: i64, available: i64 },

    #[error("Not enough MP for {action} (need {needed}, have {available})")]
    NotEnoughMp { action: String, needed: i64, available: i64 },

    #[error("{action} is on cooldown ({turns} turns left)")]
    OnCooldown { action: String, turns: u32 },

    #[error("{action} has no charges left")]
    NoCharges { action: String },

    #[error("No {item} left in the inventory")]
    NotInInventory { item: String },

    #[error("No valid target for {action}")]
    NoValidTarget { action: String },
}

/// Infrastructure errors.
#[derive(Debug, Error)]
pub enum BattleError {
    #[error("{kind} with id {id:?} is already registered")]
    DuplicateDefinition { kind: &'static str, id: String },

    #[error("actor id {0} appears more than once in the battle")]
    DuplicateActor(ActorId),

    #[error("battle needs at least one actor on each side")]
    EmptySide,

    #[error("snapshot encoding failed: {0}")]
    Snapshot(#[from] bincode::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_messages_match_log_contract() {
        let mp = ActionRejection::NotEnoughMp {
            action: "Fireball".into(),
            needed: 8,
            available: 3,
        };
        assert!(mp.to_string().contains("Not enough MP"));

        let charges = ActionRejection::NoCharges { action: "Meteor".into() };
        assert!(charges.to_string().contains("no charges"));
    }
}
