//! Combat math.
//!
//! Pure functions of the balance table and effective stats. The only
//! randomness is in [`Rolls`], which draws from the battle RNG.

mod rules;

pub use rules::{crit_chance, effective_actor, effective_stat, element_mult, hit_chance, tag_resist_mult, Rolls};
