//! Definition registry.
//!
//! `Definitions` stores every compiled skill, item, status template and
//! enemy factory for a battle. It is filled once before the battle starts
//! and only read afterwards.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::core::{Actor, BalanceTable, BattleError};

use super::definition::{RuntimeItem, RuntimeSkill};
use super::status::StatusTemplate;

/// Builds an enemy actor at a given level.
pub type EnemyFactory = Box<dyn Fn(u32) -> Actor + Send + Sync>;

/// Registry of compiled definitions.
///
/// ## Example
///
/// ```
/// use rpg_battle::content::{Definitions, RuntimeSkill, StatusTemplate};
///
/// let mut defs = Definitions::new();
/// defs.register_skill(RuntimeSkill::new("slash", "Slash")).unwrap();
/// defs.register_status(StatusTemplate::new("poison", "Poison", 3)).unwrap();
///
/// assert_eq!(defs.skill("slash").unwrap().name, "Slash");
/// assert!(defs.register_skill(RuntimeSkill::new("slash", "Again")).is_err());
/// ```
#[derive(Default)]
pub struct Definitions {
    skills: FxHashMap<String, RuntimeSkill>,
    items: FxHashMap<String, RuntimeItem>,
    statuses: FxHashMap<String, StatusTemplate>,
    enemies: FxHashMap<String, EnemyFactory>,
}

impl fmt::Debug for Definitions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut enemies: Vec<&String> = self.enemies.keys().collect();
        enemies.sort();
        f.debug_struct("Definitions")
            .field("skills", &self.skills.len())
            .field("items", &self.items.len())
            .field("statuses", &self.statuses.len())
            .field("enemies", &enemies)
            .finish()
    }
}

fn ensure_free<V>(map: &FxHashMap<String, V>, kind: &'static str, id: &str) -> Result<(), BattleError> {
    if map.contains_key(id) {
        return Err(BattleError::DuplicateDefinition {
            kind,
            id: id.to_string(),
        });
    }
    Ok(())
}

impl Definitions {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // === Registration ===

    pub fn register_skill(&mut self, skill: RuntimeSkill) -> Result<(), BattleError> {
        ensure_free(&self.skills, "skill", &skill.id)?;
        self.skills.insert(skill.id.clone(), skill);
        Ok(())
    }

    pub fn register_item(&mut self, item: RuntimeItem) -> Result<(), BattleError> {
        ensure_free(&self.items, "item", &item.id)?;
        self.items.insert(item.id.clone(), item);
        Ok(())
    }

    pub fn register_status(&mut self, status: StatusTemplate) -> Result<(), BattleError> {
        ensure_free(&self.statuses, "status", &status.id)?;
        self.statuses.insert(status.id.clone(), status);
        Ok(())
    }

    /// Register an enemy factory under a template id.
    pub fn register_enemy<F>(&mut self, template: impl Into<String>, factory: F) -> Result<(), BattleError>
    where
        F: Fn(u32) -> Actor + Send + Sync + 'static,
    {
        let template = template.into();
        ensure_free(&self.enemies, "enemy", &template)?;
        self.enemies.insert(template, Box::new(factory));
        Ok(())
    }

    // === Lookup ===

    #[must_use]
    pub fn skill(&self, id: &str) -> Option<&RuntimeSkill> {
        self.skills.get(id)
    }

    #[must_use]
    pub fn item(&self, id: &str) -> Option<&RuntimeItem> {
        self.items.get(id)
    }

    #[must_use]
    pub fn status(&self, id: &str) -> Option<&StatusTemplate> {
        self.statuses.get(id)
    }

    /// Build an enemy from its template at `level`.
    #[must_use]
    pub fn spawn_enemy(&self, template: &str, level: u32) -> Option<Actor> {
        self.enemies.get(template).map(|factory| factory(level))
    }

    /// Check if an enemy template is registered.
    #[must_use]
    pub fn has_enemy(&self, template: &str) -> bool {
        self.enemies.contains_key(template)
    }
}

/// Read-only context for one battle: definitions plus balance constants.
#[derive(Clone, Copy, Debug)]
pub struct Rules<'a> {
    pub defs: &'a Definitions,
    pub balance: &'a BalanceTable,
}

impl<'a> Rules<'a> {
    #[must_use]
    pub const fn new(defs: &'a Definitions, balance: &'a BalanceTable) -> Self {
        Self { defs, balance }
    }
}
