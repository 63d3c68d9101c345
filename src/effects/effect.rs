//! Effect definitions.
//!
//! A `RuntimeEffect` is one atomic outcome of an action or a status hook.
//! Effects are compiled once from authored content and never mutated.

use serde::{Deserialize, Serialize};

use crate::core::{ResourceKind, StatKind};
use crate::filter::Filter;

use super::targeting::TargetSelector;

/// What an effect does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectKind {
    /// Roll hit/crit, apply element and resist multipliers, absorb with shields.
    Damage,
    /// Restore hp (or the named resource).
    Heal,
    /// Add a signed amount to a named resource.
    Resource,
    /// Apply a status template.
    ApplyStatus,
    /// Remove statuses by tag.
    CleanseStatus,
    /// Remove a named status, or every status.
    Dispel,
    /// Adjust a stat for the rest of the battle.
    ModifyStat,
    /// Add hp to a named shield bucket.
    Shield,
    /// Force the targets to attack the user.
    Taunt,
    /// End the battle with reason `fled`.
    Flee,
    /// Bring a fainted target back.
    Revive,
    /// Spawn an enemy template on the user's side.
    Summon,
    /// Add items to the shared inventory.
    GiveItem,
    /// Remove items from the shared inventory.
    RemoveItem,
    /// Targets lose their next turn.
    PreventAction,
}

impl EffectKind {
    /// Kinds applied once per effect instead of once per target.
    #[must_use]
    pub const fn is_targetless(self) -> bool {
        matches!(self, Self::Flee | Self::Summon | Self::GiveItem | Self::RemoveItem)
    }
}

/// How a magnitude is computed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValueKind {
    /// Fixed amount.
    Flat { amount: f64 },
    /// Fraction of the relevant max (`0.25` = 25%).
    Percent { pct: f64 },
    /// Arithmetic over `u.stats.*` / `t.stats.*`.
    Formula { expr: String },
}

/// A magnitude with optional clamping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Value {
    #[serde(flatten)]
    pub kind: ValueKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Default for Value {
    fn default() -> Self {
        Self::flat(0.0)
    }
}

impl Value {
    /// Fixed amount.
    #[must_use]
    pub fn flat(amount: f64) -> Self {
        Self {
            kind: ValueKind::Flat { amount },
            min: None,
            max: None,
        }
    }

    /// Fraction of the relevant max.
    #[must_use]
    pub fn percent(pct: f64) -> Self {
        Self {
            kind: ValueKind::Percent { pct },
            min: None,
            max: None,
        }
    }

    /// Formula expression.
    pub fn formula(expr: impl Into<String>) -> Self {
        Self {
            kind: ValueKind::Formula { expr: expr.into() },
            min: None,
            max: None,
        }
    }

    /// Clamp the resolved amount (builder pattern).
    #[must_use]
    pub fn clamped(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }
}

fn yes() -> bool {
    true
}

/// A compiled effect.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeEffect {
    pub kind: EffectKind,

    #[serde(default)]
    pub value: Value,

    /// Resource for `heal` / `resource` / `revive` and the percent basis.
    #[serde(default)]
    pub resource: Option<ResourceKind>,

    /// Stat for `modifyStat`.
    #[serde(default)]
    pub stat: Option<StatKind>,

    /// Status for `applyStatus` / `dispel`.
    #[serde(default)]
    pub status_id: Option<String>,

    /// Duration override for `applyStatus`; turns for `taunt`.
    #[serde(default)]
    pub status_turns: Option<u32>,

    /// Tags for `cleanseStatus`; `None` cleanses everything.
    #[serde(default)]
    pub cleanse_tags: Option<Vec<String>>,

    /// Bucket for `shield`.
    #[serde(default)]
    pub shield_id: Option<String>,

    /// Element of a `shield` bucket; overrides the action element for `damage`.
    #[serde(default)]
    pub element: Option<String>,

    /// Enemy template for `summon`.
    #[serde(default)]
    pub summon_id: Option<String>,

    /// Item for `giveItem` / `removeItem`.
    #[serde(default)]
    pub item_id: Option<String>,

    /// Own targeting instead of the action's.
    #[serde(default)]
    pub selector: Option<TargetSelector>,

    /// Per-target gate.
    #[serde(default)]
    pub only_if: Option<Filter>,

    #[serde(default = "yes")]
    pub can_miss: bool,

    #[serde(default = "yes")]
    pub can_crit: bool,

    /// One hit/crit roll shared by all targets.
    #[serde(default)]
    pub shared_accuracy_roll: bool,
}

impl RuntimeEffect {
    /// Create an effect with no optional fields set.
    #[must_use]
    pub fn new(kind: EffectKind, value: Value) -> Self {
        Self {
            kind,
            value,
            resource: None,
            stat: None,
            status_id: None,
            status_turns: None,
            cleanse_tags: None,
            shield_id: None,
            element: None,
            summon_id: None,
            item_id: None,
            selector: None,
            only_if: None,
            can_miss: true,
            can_crit: true,
            shared_accuracy_roll: false,
        }
    }

    /// Flat damage.
    #[must_use]
    pub fn damage(amount: f64) -> Self {
        Self::new(EffectKind::Damage, Value::flat(amount))
    }

    /// Flat damage that never misses or crits.
    #[must_use]
    pub fn true_damage(amount: f64) -> Self {
        Self::damage(amount).never_miss().no_crit()
    }

    /// Flat hp heal.
    #[must_use]
    pub fn heal(amount: f64) -> Self {
        Self::new(EffectKind::Heal, Value::flat(amount))
    }

    /// Signed resource change.
    #[must_use]
    pub fn resource(resource: ResourceKind, amount: f64) -> Self {
        Self::new(EffectKind::Resource, Value::flat(amount)).with_resource(resource)
    }

    /// Apply a status, optionally overriding its duration.
    pub fn apply_status(status_id: impl Into<String>, turns: Option<u32>) -> Self {
        let mut effect = Self::new(EffectKind::ApplyStatus, Value::default());
        effect.status_id = Some(status_id.into());
        effect.status_turns = turns;
        effect
    }

    /// Cleanse statuses by tag (`None` cleanses all).
    #[must_use]
    pub fn cleanse(tags: Option<Vec<String>>) -> Self {
        let mut effect = Self::new(EffectKind::CleanseStatus, Value::default());
        effect.cleanse_tags = tags;
        effect
    }

    /// Dispel a named status (`None` dispels all).
    #[must_use]
    pub fn dispel(status_id: Option<String>) -> Self {
        let mut effect = Self::new(EffectKind::Dispel, Value::default());
        effect.status_id = status_id;
        effect
    }

    /// Adjust a stat.
    #[must_use]
    pub fn modify_stat(stat: StatKind, amount: f64) -> Self {
        let mut effect = Self::new(EffectKind::ModifyStat, Value::flat(amount));
        effect.stat = Some(stat);
        effect
    }

    /// Add hp to a shield bucket.
    pub fn shield(shield_id: impl Into<String>, amount: f64) -> Self {
        let mut effect = Self::new(EffectKind::Shield, Value::flat(amount));
        effect.shield_id = Some(shield_id.into());
        effect
    }

    /// Taunt targets for `turns`.
    #[must_use]
    pub fn taunt(turns: u32) -> Self {
        let mut effect = Self::new(EffectKind::Taunt, Value::default());
        effect.status_turns = Some(turns);
        effect
    }

    /// End the battle as fled.
    #[must_use]
    pub fn flee() -> Self {
        Self::new(EffectKind::Flee, Value::default())
    }

    /// Revive with an hp amount.
    #[must_use]
    pub fn revive(value: Value) -> Self {
        Self::new(EffectKind::Revive, value)
    }

    /// Summon an enemy template.
    pub fn summon(template: impl Into<String>) -> Self {
        let mut effect = Self::new(EffectKind::Summon, Value::flat(1.0));
        effect.summon_id = Some(template.into());
        effect
    }

    /// Give items to the party.
    pub fn give_item(item_id: impl Into<String>, qty: u32) -> Self {
        let mut effect = Self::new(EffectKind::GiveItem, Value::flat(f64::from(qty)));
        effect.item_id = Some(item_id.into());
        effect
    }

    /// Take items from the party.
    pub fn remove_item(item_id: impl Into<String>, qty: u32) -> Self {
        let mut effect = Self::new(EffectKind::RemoveItem, Value::flat(f64::from(qty)));
        effect.item_id = Some(item_id.into());
        effect
    }

    /// Targets skip their next turn.
    #[must_use]
    pub fn prevent_action() -> Self {
        Self::new(EffectKind::PreventAction, Value::default())
    }

    // === Builders ===

    /// Replace the value.
    #[must_use]
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = value;
        self
    }

    /// Set the resource.
    #[must_use]
    pub fn with_resource(mut self, resource: ResourceKind) -> Self {
        self.resource = Some(resource);
        self
    }

    /// Set the element.
    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }

    /// Use own targeting.
    #[must_use]
    pub fn with_selector(mut self, selector: TargetSelector) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Gate per target.
    #[must_use]
    pub fn only_if(mut self, filter: Filter) -> Self {
        self.only_if = Some(filter);
        self
    }

    /// Always hit.
    #[must_use]
    pub fn never_miss(mut self) -> Self {
        self.can_miss = false;
        self
    }

    /// Never crit.
    #[must_use]
    pub fn no_crit(mut self) -> Self {
        self.can_crit = false;
        self
    }

    /// Share one accuracy roll across all targets.
    #[must_use]
    pub fn shared_roll(mut self) -> Self {
        self.shared_accuracy_roll = true;
        self
    }

    /// Resource whose max is the `percent` basis.
    #[must_use]
    pub fn percent_basis(&self) -> ResourceKind {
        match self.kind {
            EffectKind::Heal | EffectKind::Resource | EffectKind::Revive => {
                self.resource.unwrap_or(ResourceKind::Hp)
            }
            _ => ResourceKind::Hp,
        }
    }
}
