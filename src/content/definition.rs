//! Skill and item definitions.
//!
//! Skills and items share the same shape: targeting, an ordered effect list,
//! a `canUse` gate, costs, cooldown, charges and an AI weight. Items add a
//! `consumable` flag and are drawn from the shared party inventory.
//!
//! The [`Usable`] trait is the seam the action executor and enemy AI work
//! against, so both kinds go through one validation path.

use serde::{Deserialize, Serialize};

use crate::effects::{RuntimeEffect, TargetSelector};
use crate::filter::Filter;

/// Resource costs debited when an action is used.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Costs {
    pub sta: i64,
    pub mp: i64,
}

impl Costs {
    /// No cost.
    pub const FREE: Self = Self { sta: 0, mp: 0 };

    /// Create a cost pair.
    #[must_use]
    pub const fn new(sta: i64, mp: i64) -> Self {
        Self { sta, mp }
    }
}

fn default_targeting() -> TargetSelector {
    TargetSelector::single_enemy()
}

fn default_ai_weight() -> f64 {
    1.0
}

fn yes() -> bool {
    true
}

/// Anything an actor can use on its turn.
pub trait Usable {
    /// Definition id; cooldowns and charges are keyed by it.
    fn id(&self) -> &str;

    /// Display name for log lines.
    fn name(&self) -> &str;

    /// Element carried into damage effects.
    fn element(&self) -> Option<&str>;

    /// Default targeting for effects without their own selector.
    fn targeting(&self) -> &TargetSelector;

    /// Effects in application order.
    fn effects(&self) -> &[RuntimeEffect];

    /// Gate evaluated against the acting actor.
    fn can_use(&self) -> Option<&Filter>;

    fn costs(&self) -> Costs;

    /// Turns before the action can be used again (0 = none).
    fn cooldown(&self) -> u32;

    /// Use cap for the battle, if any.
    fn charges(&self) -> Option<u32>;

    /// Relative weight for enemy AI selection.
    fn ai_weight(&self) -> f64;

    /// Inventory entry required to use this action.
    fn inventory_item(&self) -> Option<&str> {
        None
    }

    /// Whether one inventory unit is spent per use.
    fn consumes_item(&self) -> bool {
        false
    }
}

/// A compiled skill.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeSkill {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub element: Option<String>,
    #[serde(default = "default_targeting")]
    pub targeting: TargetSelector,
    #[serde(default)]
    pub effects: Vec<RuntimeEffect>,
    #[serde(default)]
    pub can_use: Option<Filter>,
    #[serde(default)]
    pub costs: Costs,
    #[serde(default)]
    pub cooldown: u32,
    #[serde(default)]
    pub charges: Option<u32>,
    #[serde(default = "default_ai_weight")]
    pub ai_weight: f64,
}

impl RuntimeSkill {
    /// Create a free, single-enemy skill with no effects.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            element: None,
            targeting: default_targeting(),
            effects: Vec::new(),
            can_use: None,
            costs: Costs::FREE,
            cooldown: 0,
            charges: None,
            ai_weight: default_ai_weight(),
        }
    }

    /// Append an effect (builder pattern).
    #[must_use]
    pub fn with_effect(mut self, effect: RuntimeEffect) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn with_targeting(mut self, targeting: TargetSelector) -> Self {
        self.targeting = targeting;
        self
    }

    #[must_use]
    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }

    #[must_use]
    pub fn with_costs(mut self, sta: i64, mp: i64) -> Self {
        self.costs = Costs::new(sta, mp);
        self
    }

    #[must_use]
    pub fn with_cooldown(mut self, turns: u32) -> Self {
        self.cooldown = turns;
        self
    }

    #[must_use]
    pub fn with_charges(mut self, charges: u32) -> Self {
        self.charges = Some(charges);
        self
    }

    #[must_use]
    pub fn with_can_use(mut self, filter: Filter) -> Self {
        self.can_use = Some(filter);
        self
    }

    #[must_use]
    pub fn with_ai_weight(mut self, weight: f64) -> Self {
        self.ai_weight = weight;
        self
    }
}

impl Usable for RuntimeSkill {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn element(&self) -> Option<&str> {
        self.element.as_deref()
    }

    fn targeting(&self) -> &TargetSelector {
        &self.targeting
    }

    fn effects(&self) -> &[RuntimeEffect] {
        &self.effects
    }

    fn can_use(&self) -> Option<&Filter> {
        self.can_use.as_ref()
    }

    fn costs(&self) -> Costs {
        self.costs
    }

    fn cooldown(&self) -> u32 {
        self.cooldown
    }

    fn charges(&self) -> Option<u32> {
        self.charges
    }

    fn ai_weight(&self) -> f64 {
        self.ai_weight
    }
}

/// A compiled item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub element: Option<String>,
    #[serde(default = "default_targeting")]
    pub targeting: TargetSelector,
    #[serde(default)]
    pub effects: Vec<RuntimeEffect>,
    #[serde(default)]
    pub can_use: Option<Filter>,
    #[serde(default)]
    pub costs: Costs,
    #[serde(default)]
    pub cooldown: u32,
    #[serde(default)]
    pub charges: Option<u32>,
    #[serde(default = "default_ai_weight")]
    pub ai_weight: f64,
    /// Spend one inventory unit per use.
    #[serde(default = "yes")]
    pub consumable: bool,
}

impl RuntimeItem {
    /// Create a consumable item targeting the user.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            element: None,
            targeting: TargetSelector::user(),
            effects: Vec::new(),
            can_use: None,
            costs: Costs::FREE,
            cooldown: 0,
            charges: None,
            ai_weight: default_ai_weight(),
            consumable: true,
        }
    }

    /// Append an effect (builder pattern).
    #[must_use]
    pub fn with_effect(mut self, effect: RuntimeEffect) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn with_targeting(mut self, targeting: TargetSelector) -> Self {
        self.targeting = targeting;
        self
    }

    #[must_use]
    pub fn with_can_use(mut self, filter: Filter) -> Self {
        self.can_use = Some(filter);
        self
    }

    /// Keep the inventory unit after use.
    #[must_use]
    pub fn reusable(mut self) -> Self {
        self.consumable = false;
        self
    }
}

impl Usable for RuntimeItem {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn element(&self) -> Option<&str> {
        self.element.as_deref()
    }

    fn targeting(&self) -> &TargetSelector {
        &self.targeting
    }

    fn effects(&self) -> &[RuntimeEffect] {
        &self.effects
    }

    fn can_use(&self) -> Option<&Filter> {
        self.can_use.as_ref()
    }

    fn costs(&self) -> Costs {
        self.costs
    }

    fn cooldown(&self) -> u32 {
        self.cooldown
    }

    fn charges(&self) -> Option<u32> {
        self.charges
    }

    fn ai_weight(&self) -> f64 {
        self.ai_weight
    }

    fn inventory_item(&self) -> Option<&str> {
        Some(&self.id)
    }

    fn consumes_item(&self) -> bool {
        self.consumable
    }
}
