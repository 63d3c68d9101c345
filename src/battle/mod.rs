//! Battle driving: action execution, turn cycle, outcome and enemy AI.
//!
//! A caller drives one battle like this:
//!
//! 1. [`TurnController::current_actor`] says whose turn it is
//! 2. pick a skill or item (for enemies, [`choose_action`])
//! 3. [`ActionExecutor::execute`] validates and runs it
//! 4. [`TurnController::end_turn`] ticks statuses and advances
//!
//! The battle is over once `state.ended` is set.

mod action;
mod ai;
mod outcome;
mod turn;

pub use action::{ActionExecutor, ActionReport};
pub use ai::choose_action;
pub use outcome::evaluate_outcome;
pub use turn::TurnController;
