//! # rpg-battle
//!
//! A deterministic, data-driven turn-based battle engine for RPG encounters.
//!
//! ## Design Principles
//!
//! 1. **Data-Driven**: Skills, items, statuses and enemies are authored
//!    content. The engine only interprets them.
//!
//! 2. **Deterministic**: The RNG is a seed stored in the battle state. The
//!    same seed and call sequence always produce the same log.
//!
//! 3. **Tolerant of Partial Content**: Unknown filter keys evaluate to false,
//!    malformed formulas resolve to 0, missing templates are skipped.
//!
//! ## Architecture
//!
//! - **Persistent Data Structures**: `im` vectors for the log and rosters, so
//!   cloning a state for AI lookahead or replay is cheap.
//!
//! - **Rejections Are Values**: Refused actions return an
//!   [`ActionRejection`] and append one log line; state is otherwise
//!   unchanged.
//!
//! ## Modules
//!
//! - `core`: Actors, stats, state, RNG, balance table, errors
//! - `filter`: Boolean filter language over actor attributes
//! - `effects`: Effect definitions, values, targeting and resolution
//! - `combat`: Hit, crit, element and resist math
//! - `status`: Status application, ticking and hooks
//! - `content`: Compiled skills, items, statuses and enemy factories
//! - `battle`: Action execution, turn cycle, outcome and enemy AI

pub mod battle;
pub mod combat;
pub mod content;
pub mod core;
pub mod effects;
pub mod filter;
pub mod status;

// Re-export commonly used types
pub use crate::core::{
    ActionRejection, Actor, ActorId, BalanceTable, BattleEnd, BattleError, BattleRng, BattleState, Charges,
    EndReason, ResourceKind, Shield, Side, StatBlock, StatKind, StatusInstance, Taunt,
};

pub use crate::filter::{matches, Filter, FilterKey, FilterOp, FilterTest, FilterValue};

pub use crate::effects::{
    resolve_targets, EffectFlow, EffectKind, EffectResolver, EffectSource, RuntimeEffect, TargetMetric, TargetMode,
    TargetSelector, TargetSide, Value, ValueKind,
};

pub use crate::content::{
    Costs, Definitions, Rules, RuntimeItem, RuntimeSkill, StackRule, StatModifier, StatusHook, StatusTemplate,
    Usable,
};

pub use crate::status::StatusEngine;

pub use crate::battle::{choose_action, ActionExecutor, ActionReport, TurnController};
