//! Boolean filter language over actor attributes.
//!
//! - `Filter`: recursive `all` / `any` / `not` / `test` tree
//! - `matches`: evaluator; unknown keys or operators evaluate to `false`

mod condition;

pub use condition::{matches, matches_opt, Filter, FilterKey, FilterOp, FilterTest, FilterValue};
