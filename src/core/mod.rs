//! Core engine types: actors, stats, state, RNG, balance configuration, errors.
//!
//! Everything here is plain data. Behavior lives in the `filter`, `effects`,
//! `combat`, `status` and `battle` modules, which all operate on
//! [`BattleState`].

pub mod actor;
pub mod config;
pub mod error;
pub mod rng;
pub mod state;

pub use actor::{Actor, ActorId, ResourceKind, StatBlock, StatKind, StatusInstance};
pub use config::{BalanceTable, NEUTRAL};
pub use error::{ActionRejection, BattleError};
pub use rng::BattleRng;
pub use state::{BattleEnd, BattleState, Charges, EndReason, Shield, Side, Taunt};
