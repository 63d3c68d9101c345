//! Balance configuration.
//!
//! The balance table is supplied by the configuration collaborator and read
//! by the combat rules. Every field has a default, so a partially authored
//! table still produces a usable battle.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Neutral element / tag key.
pub const NEUTRAL: &str = "neutral";

/// Combat balance constants.
///
/// ## Hit and crit
///
/// ```text
/// hit  = clamp(base_hit  + Δatk·hit_per_stat  + Δlv·hit_per_level,  dodge_floor, hit_ceil)
/// crit = clamp(base_crit + Δatk·crit_per_stat + Δlv·crit_per_level, 0, 1)
/// ```
///
/// where `Δatk = attacker.atk - defender.def` and `Δlv = attacker.lv - defender.lv`.
///
/// ## Element and resist tables
///
/// `element_matrix[element][tag]` is a damage multiplier; `resists_by_tag[tag]`
/// multiplies all damage taken by actors carrying `tag`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BalanceTable {
    pub base_hit: f64,
    pub dodge_floor: f64,
    pub hit_ceil: f64,
    pub hit_per_stat: f64,
    pub hit_per_level: f64,

    pub base_crit: f64,
    pub crit_per_stat: f64,
    pub crit_per_level: f64,
    pub crit_mult: f64,

    pub element_matrix: FxHashMap<String, FxHashMap<String, f64>>,
    pub resists_by_tag: FxHashMap<String, f64>,
}

impl Default for BalanceTable {
    fn default() -> Self {
        Self {
            base_hit: 0.90,
            dodge_floor: 0.05,
            hit_ceil: 0.99,
            hit_per_stat: 0.005,
            hit_per_level: 0.02,
            base_crit: 0.05,
            crit_per_stat: 0.002,
            crit_per_level: 0.01,
            crit_mult: 1.5,
            element_matrix: FxHashMap::default(),
            resists_by_tag: FxHashMap::default(),
        }
    }
}

impl BalanceTable {
    /// Create a table with default constants.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an element multiplier (builder pattern).
    #[must_use]
    pub fn with_element(mut self, element: impl Into<String>, tag: impl Into<String>, mult: f64) -> Self {
        self.element_matrix
            .entry(element.into())
            .or_default()
            .insert(tag.into(), mult);
        self
    }

    /// Set a tag resist multiplier (builder pattern).
    #[must_use]
    pub fn with_resist(mut self, tag: impl Into<String>, mult: f64) -> Self {
        self.resists_by_tag.insert(tag.into(), mult);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_table_fills_defaults() {
        let json = r#"{ "critMult": 2.0, "resistsByTag": { "armored": 0.5 } }"#;
        let table: BalanceTable = serde_json::from_str(json).unwrap();

        assert_eq!(table.crit_mult, 2.0);
        assert_eq!(table.base_hit, BalanceTable::default().base_hit);
        assert_eq!(table.resists_by_tag.get("armored"), Some(&0.5));
    }

    #[test]
    fn test_builders() {
        let table = BalanceTable::new()
            .with_element("fire", "plant", 2.0)
            .with_element("fire", NEUTRAL, 1.0)
            .with_resist("stone", 0.8);

        assert_eq!(table.element_matrix["fire"]["plant"], 2.0);
        assert_eq!(table.element_matrix["fire"].len(), 2);
        assert_eq!(table.resists_by_tag["stone"], 0.8);
    }
}
