//! Filter expressions over actor attributes.
//!
//! Filters gate actions (`canUse`), effects (`onlyIf`) and selector
//! candidates (`condition` mode). They are authored externally, so every
//! malformed piece evaluates to `false` instead of failing.

use serde::{Deserialize, Serialize};

use crate::core::{Actor, ResourceKind};

/// A boolean expression tree.
///
/// Each clause is optional; clauses present at the same level are ANDed.
/// An empty filter matches everything.
///
/// ```
/// use rpg_battle::filter::{Filter, FilterKey, FilterOp};
///
/// // hp below half and not already poisoned
/// let filter = Filter::test(FilterKey::HpPct, FilterOp::Lt, 0.5)
///     .and(Filter::test(FilterKey::HasStatus, FilterOp::Eq, "poison").negate());
/// assert!(filter.all.is_some());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filter {
    /// Every sub-filter must match. Empty list matches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all: Option<Vec<Filter>>,

    /// At least one sub-filter must match. Empty list never matches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub any: Option<Vec<Filter>>,

    /// Sub-filter must not match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<Filter>>,

    /// Leaf comparison.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test: Option<FilterTest>,
}

/// Leaf comparison `metric(key) op value`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterTest {
    pub key: FilterKey,
    pub op: FilterOp,
    #[serde(default)]
    pub value: Option<FilterValue>,
}

/// Actor metric read by a test.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterKey {
    HpPct,
    StaPct,
    MpPct,
    Atk,
    Def,
    Lv,
    HasStatus,
    Tag,
    Clazz,
    #[serde(other)]
    Unknown,
}

/// Comparison operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOp {
    Lt,
    Lte,
    Eq,
    Gte,
    Gt,
    Ne,
    In,
    NotIn,
    #[serde(other)]
    Unknown,
}

/// Right-hand side of a test.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<FilterValue>),
}

impl FilterValue {
    fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    fn as_list(&self) -> Option<&[FilterValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        Self::Number(v as f64)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl Filter {
    /// Filter that matches everything.
    #[must_use]
    pub fn always() -> Self {
        Self::default()
    }

    /// Create a leaf test.
    pub fn test(key: FilterKey, op: FilterOp, value: impl Into<FilterValue>) -> Self {
        Self {
            test: Some(FilterTest {
                key,
                op,
                value: Some(value.into()),
            }),
            ..Self::default()
        }
    }

    /// Create an AND filter.
    pub fn all(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self {
            all: Some(filters.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Create an OR filter.
    pub fn any(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self {
            any: Some(filters.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Negate this filter.
    #[must_use]
    pub fn negate(self) -> Self {
        Self {
            not: Some(Box::new(self)),
            ..Self::default()
        }
    }

    /// Add another filter with AND.
    #[must_use]
    pub fn and(mut self, other: Filter) -> Self {
        if self.any.is_none() && self.not.is_none() && self.test.is_none() {
            if let Some(filters) = self.all.as_mut() {
                filters.push(other);
                return self;
            }
        }
        Self::all([self, other])
    }

    /// Check if no clause is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.all.is_none() && self.any.is_none() && self.not.is_none() && self.test.is_none()
    }
}

/// Evaluate a filter against an actor.
#[must_use]
pub fn matches(actor: &Actor, filter: &Filter) -> bool {
    if let Some(all) = &filter.all {
        if !all.iter().all(|f| matches(actor, f)) {
            return false;
        }
    }

    if let Some(any) = &filter.any {
        if !any.iter().any(|f| matches(actor, f)) {
            return false;
        }
    }

    if let Some(not) = &filter.not {
        if matches(actor, not) {
            return false;
        }
    }

    if let Some(test) = &filter.test {
        if !evaluate_test(actor, test) {
            return false;
        }
    }

    true
}

/// Evaluate an optional filter; `None` matches.
#[must_use]
pub fn matches_opt(actor: &Actor, filter: Option<&Filter>) -> bool {
    filter.is_none_or(|f| matches(actor, f))
}

const EPSILON: f64 = 1e-9;

fn evaluate_test(actor: &Actor, test: &FilterTest) -> bool {
    let Some(value) = &test.value else {
        return false;
    };

    match test.key {
        FilterKey::HpPct => compare_number(actor.stats.fraction(ResourceKind::Hp), test.op, value),
        FilterKey::StaPct => compare_number(actor.stats.fraction(ResourceKind::Sta), test.op, value),
        FilterKey::MpPct => compare_number(actor.stats.fraction(ResourceKind::Mp), test.op, value),
        FilterKey::Atk => compare_number(actor.stats.atk as f64, test.op, value),
        FilterKey::Def => compare_number(actor.stats.def as f64, test.op, value),
        FilterKey::Lv => compare_number(actor.stats.level as f64, test.op, value),
        FilterKey::HasStatus => compare_membership(|s| actor.has_status(s), test.op, value),
        FilterKey::Tag => compare_membership(|t| actor.has_tag(t), test.op, value),
        FilterKey::Clazz => compare_text(actor.class.as_deref(), test.op, value),
        FilterKey::Unknown => false,
    }
}

fn compare_number(metric: f64, op: FilterOp, value: &FilterValue) -> bool {
    let in_list = |list: &[FilterValue]| {
        list.iter()
            .filter_map(FilterValue::as_number)
            .any(|n| (metric - n).abs() < EPSILON)
    };

    match op {
        FilterOp::In => value.as_list().is_some_and(in_list),
        FilterOp::NotIn => value.as_list().is_some_and(|l| !in_list(l)),
        FilterOp::Unknown => false,
        _ => {
            let Some(rhs) = value.as_number() else {
                return false;
            };
            match op {
                FilterOp::Lt => metric < rhs,
                FilterOp::Lte => metric <= rhs + EPSILON,
                FilterOp::Eq => (metric - rhs).abs() < EPSILON,
                FilterOp::Gte => metric + EPSILON >= rhs,
                FilterOp::Gt => metric > rhs,
                FilterOp::Ne => (metric - rhs).abs() >= EPSILON,
                FilterOp::In | FilterOp::NotIn | FilterOp::Unknown => false,
            }
        }
    }
}

/// Set-valued metrics (statuses, tags): membership of one or more names.
fn compare_membership(contains: impl Fn(&str) -> bool, op: FilterOp, value: &FilterValue) -> bool {
    let any_of = |value: &FilterValue| match value {
        FilterValue::Text(name) => Some(contains(name.as_str())),
        FilterValue::List(items) => Some(items.iter().filter_map(FilterValue::as_text).any(&contains)),
        _ => None,
    };

    match op {
        FilterOp::Eq | FilterOp::In => any_of(value).unwrap_or(false),
        FilterOp::Ne | FilterOp::NotIn => any_of(value).is_some_and(|found| !found),
        _ => false,
    }
}

fn compare_text(metric: Option<&str>, op: FilterOp, value: &FilterValue) -> bool {
    match op {
        FilterOp::Eq => value.as_text().is_some_and(|v| metric == Some(v)),
        FilterOp::Ne => value.as_text().is_some_and(|v| metric != Some(v)),
        FilterOp::In => value
            .as_list()
            .is_some_and(|l| l.iter().filter_map(FilterValue::as_text).any(|v| metric == Some(v))),
        FilterOp::NotIn => value
            .as_list()
            .is_some_and(|l| !l.iter().filter_map(FilterValue::as_text).any(|v| metric == Some(v))),
        _ => false,
    }
}
