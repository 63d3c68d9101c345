//! Status templates.
//!
//! A template is the immutable definition behind every [`StatusInstance`]
//! with the same id: its tags, stacking rule, default duration, stat
//! modifiers, an optional shield grant and six hook effect lists.
//!
//! [`StatusInstance`]: crate::core::StatusInstance

use serde::{Deserialize, Serialize};

use crate::core::StatKind;
use crate::effects::{RuntimeEffect, Value};

/// What re-applying an active status does.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StackRule {
    /// No change.
    Ignore,
    /// Reset the duration.
    #[default]
    Renew,
    /// Add a stack up to `max_stacks` and reset the duration.
    StackCount,
    /// As `StackCount`; hook magnitudes are multiplied by the stack count.
    StackMagnitude,
}

impl StackRule {
    /// Check if re-application adds stacks.
    #[must_use]
    pub const fn stacks(self) -> bool {
        matches!(self, Self::StackCount | Self::StackMagnitude)
    }
}

/// Lifecycle points where a status runs effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusHook {
    OnApply,
    OnTurnStart,
    OnTurnEnd,
    OnExpire,
    /// Holder dealt damage; effects default to the damaged actor.
    OnDealDamage,
    /// Holder took damage; effects default to the attacker.
    OnTakeDamage,
}

/// A stat change active while the status is.
///
/// Effective value: `(base + flat * stacks) * (1 + percent * stacks)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatModifier {
    pub stat: StatKind,
    #[serde(default)]
    pub flat: f64,
    #[serde(default)]
    pub percent: f64,
}

impl StatModifier {
    /// Apply to a base value at the given stack count.
    #[must_use]
    pub fn apply(&self, base: f64, stacks: u32) -> f64 {
        let n = f64::from(stacks.max(1));
        (base + self.flat * n) * (1.0 + self.percent * n)
    }
}

/// Shield granted while the status is active.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShieldSpec {
    /// Bucket id; defaults to the status id.
    #[serde(default)]
    pub id: Option<String>,
    pub value: Value,
    #[serde(default)]
    pub element: Option<String>,
}

fn one() -> u32 {
    1
}

/// A compiled status template.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTemplate {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "one")]
    pub max_stacks: u32,
    #[serde(default)]
    pub stack_rule: StackRule,
    /// Default duration in turns.
    #[serde(default = "one")]
    pub duration: u32,
    #[serde(default)]
    pub modifiers: Vec<StatModifier>,
    #[serde(default)]
    pub shield: Option<ShieldSpec>,

    #[serde(default)]
    pub on_apply: Vec<RuntimeEffect>,
    #[serde(default)]
    pub on_turn_start: Vec<RuntimeEffect>,
    #[serde(default)]
    pub on_turn_end: Vec<RuntimeEffect>,
    #[serde(default)]
    pub on_expire: Vec<RuntimeEffect>,
    #[serde(default)]
    pub on_deal_damage: Vec<RuntimeEffect>,
    #[serde(default)]
    pub on_take_damage: Vec<RuntimeEffect>,
}

impl StatusTemplate {
    /// Create a template with no tags, modifiers or hooks.
    pub fn new(id: impl Into<String>, name: impl Into<String>, duration: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tags: Vec::new(),
            max_stacks: 1,
            stack_rule: StackRule::default(),
            duration,
            modifiers: Vec::new(),
            shield: None,
            on_apply: Vec::new(),
            on_turn_start: Vec::new(),
            on_turn_end: Vec::new(),
            on_expire: Vec::new(),
            on_deal_damage: Vec::new(),
            on_take_damage: Vec::new(),
        }
    }

    /// Name for log lines, falling back to the id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Check for a tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Effects run at a lifecycle point.
    #[must_use]
    pub fn hooks(&self, hook: StatusHook) -> &[RuntimeEffect] {
        match hook {
            StatusHook::OnApply => &self.on_apply,
            StatusHook::OnTurnStart => &self.on_turn_start,
            StatusHook::OnTurnEnd => &self.on_turn_end,
            StatusHook::OnExpire => &self.on_expire,
            StatusHook::OnDealDamage => &self.on_deal_damage,
            StatusHook::OnTakeDamage => &self.on_take_damage,
        }
    }

    // === Builders ===

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Set the stacking rule and cap (builder pattern).
    #[must_use]
    pub fn with_stacking(mut self, rule: StackRule, max_stacks: u32) -> Self {
        self.stack_rule = rule;
        self.max_stacks = max_stacks;
        self
    }

    #[must_use]
    pub fn with_modifier(mut self, stat: StatKind, flat: f64, percent: f64) -> Self {
        self.modifiers.push(StatModifier { stat, flat, percent });
        self
    }

    #[must_use]
    pub fn with_shield(mut self, value: Value, element: Option<String>) -> Self {
        self.shield = Some(ShieldSpec {
            id: None,
            value,
            element,
        });
        self
    }

    /// Append a hook effect (builder pattern).
    #[must_use]
    pub fn with_hook(mut self, hook: StatusHook, effect: RuntimeEffect) -> Self {
        let list = match hook {
            StatusHook::OnApply => &mut self.on_apply,
            StatusHook::OnTurnStart => &mut self.on_turn_start,
            StatusHook::OnTurnEnd => &mut self.on_turn_end,
            StatusHook::OnExpire => &mut self.on_expire,
            StatusHook::OnDealDamage => &mut self.on_deal_damage,
            StatusHook::OnTakeDamage => &mut self.on_take_damage,
        };
        list.push(effect);
        self
    }

    /// Shield bucket id granted by this status.
    #[must_use]
    pub fn shield_bucket(&self) -> Option<&str> {
        self.shield
            .as_ref()
            .map(|spec| spec.id.as_deref().unwrap_or(&self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::EffectKind;

    #[test]
    fn test_template_from_json() {
        let json = r#"{
            "id": "burn",
            "name": "Burn",
            "tags": ["fire", "dot"],
            "stackRule": "stackMagnitude",
            "maxStacks": 3,
            "duration": 2,
            "onTurnEnd": [{ "kind": "damage", "canMiss": false, "canCrit": false,
                            "value": { "kind": "flat", "amount": 4 } }]
        }"#;
        let template: StatusTemplate = serde_json::from_str(json).unwrap();

        assert!(template.has_tag("fire"));
        assert_eq!(template.stack_rule, StackRule::StackMagnitude);
        assert!(template.stack_rule.stacks());
        assert_eq!(template.hooks(StatusHook::OnTurnEnd)[0].kind, EffectKind::Damage);
        assert!(template.hooks(StatusHook::OnApply).is_empty());
    }

    #[test]
    fn test_modifier_scales_with_stacks() {
        let modifier = StatModifier {
            stat: StatKind::Atk,
            flat: 2.0,
            percent: 0.1,
        };
        assert!((modifier.apply(10.0, 1) - 13.2).abs() < 1e-9);
        assert!((modifier.apply(10.0, 2) - 16.8).abs() < 1e-9);
    }

    #[test]
    fn test_shield_bucket_defaults_to_status_id() {
        let barrier = StatusTemplate::new("barrier", "Barrier", 3).with_shield(Value::flat(20.0), None);
        assert_eq!(barrier.shield_bucket(), Some("barrier"));
        assert_eq!(StatusTemplate::new("stun", "", 1).display_name(), "stun");
    }
}
