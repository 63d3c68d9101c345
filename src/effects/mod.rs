//! Effect system for skills, items and status hooks.
//!
//! - `RuntimeEffect`: one atomic outcome (damage, heal, status, shield, ...)
//! - `Value`: flat / percent / formula magnitude with optional clamping
//! - `TargetSelector`: how an action or effect picks its targets
//! - `EffectResolver`: applies an effect to resolved targets
//!
//! Every variant is dispatched by one exhaustive `match`, so adding a kind is
//! checked at compile time in each evaluator.

mod effect;
mod resolver;
pub mod targeting;
pub mod value;

pub use effect::{EffectKind, RuntimeEffect, Value, ValueKind};
pub use resolver::{EffectFlow, EffectResolver, EffectSource, DEFAULT_SHIELD, MAX_SUMMONS};
pub use targeting::{has_candidates, resolve_targets, TargetMetric, TargetMode, TargetSelector, TargetSide};
