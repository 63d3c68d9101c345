//! Compiled content: skills, items, status templates and enemy factories.
//!
//! Everything here is produced by an external compiler step and treated as
//! immutable for a battle's lifetime. All definition types deserialize from
//! the authored camelCase JSON shape.

mod definition;
mod registry;
mod status;

pub use definition::{Costs, RuntimeItem, RuntimeSkill, Usable};
pub use registry::{Definitions, EnemyFactory, Rules};
pub use status::{ShieldSpec, StackRule, StatModifier, StatusHook, StatusTemplate};
