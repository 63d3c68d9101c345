//! Battle participants.
//!
//! ## ActorId
//!
//! String identifier shared with authored content (`"hero"`, `"slime"`).
//! Summoned actors get a generated id of the form `<template>#<n>`.
//!
//! ## Actor
//!
//! An actor is never removed from a battle. Fainting only clears `alive`,
//! which keeps every per-actor map pointing at a roster member.

use std::borrow::Borrow;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Unique identifier for a battle participant.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub String);

impl ActorId {
    /// Create a new actor ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActorId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ActorId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for ActorId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A depletable resource with a current and max value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    Hp,
    Sta,
    Mp,
}

impl ResourceKind {
    /// Display label used in log lines.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hp => "HP",
            Self::Sta => "STA",
            Self::Mp => "MP",
        }
    }
}

/// A stat that `modifyStat` effects and status modifiers can change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatKind {
    Atk,
    Def,
    #[serde(alias = "level")]
    Lv,
    MaxHp,
    MaxSta,
    MaxMp,
}

impl StatKind {
    /// Display label used in log lines.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Atk => "ATK",
            Self::Def => "DEF",
            Self::Lv => "LV",
            Self::MaxHp => "max HP",
            Self::MaxSta => "max STA",
            Self::MaxMp => "max MP",
        }
    }
}

/// Numeric stat block of an actor.
///
/// Current resources are kept within `[0, max]` by every mutator here;
/// code outside this type goes through [`StatBlock::set_resource`] and
/// [`StatBlock::add_resource`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatBlock {
    pub hp: i64,
    pub max_hp: i64,
    pub sta: i64,
    pub max_sta: i64,
    pub mp: i64,
    pub max_mp: i64,
    pub atk: i64,
    pub def: i64,
    pub level: i64,
    pub xp: i64,
    pub gold: i64,
}

impl StatBlock {
    /// Create a full-health stat block.
    #[must_use]
    pub fn new(max_hp: i64, max_sta: i64, max_mp: i64, atk: i64, def: i64, level: i64) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            sta: max_sta,
            max_sta,
            mp: max_mp,
            max_mp,
            atk,
            def,
            level,
            xp: 0,
            gold: 0,
        }
    }

    /// Current value of a resource.
    #[must_use]
    pub fn current(&self, kind: ResourceKind) -> i64 {
        match kind {
            ResourceKind::Hp => self.hp,
            ResourceKind::Sta => self.sta,
            ResourceKind::Mp => self.mp,
        }
    }

    /// Max value of a resource.
    #[must_use]
    pub fn max(&self, kind: ResourceKind) -> i64 {
        match kind {
            ResourceKind::Hp => self.max_hp,
            ResourceKind::Sta => self.max_sta,
            ResourceKind::Mp => self.max_mp,
        }
    }

    /// Current / max as a fraction. A zero max yields 0.
    #[must_use]
    pub fn fraction(&self, kind: ResourceKind) -> f64 {
        let max = self.max(kind);
        if max <= 0 {
            0.0
        } else {
            self.current(kind) as f64 / max as f64
        }
    }

    /// Set a resource, clamped to `[0, max]`.
    pub fn set_resource(&mut self, kind: ResourceKind, value: i64) {
        let clamped = value.clamp(0, self.max(kind).max(0));
        match kind {
            ResourceKind::Hp => self.hp = clamped,
            ResourceKind::Sta => self.sta = clamped,
            ResourceKind::Mp => self.mp = clamped,
        }
    }

    /// Add a (possibly negative) delta to a resource, clamped.
    ///
    /// Returns the change actually applied.
    pub fn add_resource(&mut self, kind: ResourceKind, delta: i64) -> i64 {
        let before = self.current(kind);
        self.set_resource(kind, before.saturating_add(delta));
        self.current(kind) - before
    }

    /// Raw value of a stat.
    #[must_use]
    pub fn stat(&self, kind: StatKind) -> i64 {
        match kind {
            StatKind::Atk => self.atk,
            StatKind::Def => self.def,
            StatKind::Lv => self.level,
            StatKind::MaxHp => self.max_hp,
            StatKind::MaxSta => self.max_sta,
            StatKind::MaxMp => self.max_mp,
        }
    }

    /// Adjust a stat by delta, floored at 0. Lowering a max re-clamps its current.
    pub fn adjust_stat(&mut self, kind: StatKind, delta: i64) {
        let slot = match kind {
            StatKind::Atk => &mut self.atk,
            StatKind::Def => &mut self.def,
            StatKind::Lv => &mut self.level,
            StatKind::MaxHp => &mut self.max_hp,
            StatKind::MaxSta => &mut self.max_sta,
            StatKind::MaxMp => &mut self.max_mp,
        };
        *slot = slot.saturating_add(delta).max(0);

        self.set_resource(ResourceKind::Hp, self.hp);
        self.set_resource(ResourceKind::Sta, self.sta);
        self.set_resource(ResourceKind::Mp, self.mp);
    }
}

/// A status applied to an actor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusInstance {
    /// Template id in the status registry.
    pub status_id: String,
    /// Turns left before expiry.
    pub remaining: u32,
    /// Stack count, at least 1.
    pub stacks: u32,
}

/// A battle participant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    pub stats: StatBlock,
    #[serde(default)]
    pub statuses: SmallVec<[StatusInstance; 4]>,
    #[serde(default = "default_alive")]
    pub alive: bool,
    #[serde(default)]
    pub tags: SmallVec<[String; 4]>,
    #[serde(default, rename = "clazz", alias = "class")]
    pub class: Option<String>,
    #[serde(default)]
    pub meta: FxHashMap<String, String>,
}

fn default_alive() -> bool {
    true
}

impl Actor {
    /// Create a living actor with no statuses or tags.
    pub fn new(id: impl Into<ActorId>, name: impl Into<String>, stats: StatBlock) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            stats,
            statuses: SmallVec::new(),
            alive: true,
            tags: SmallVec::new(),
            class: None,
            meta: FxHashMap::default(),
        }
    }

    /// Add a tag (builder pattern).
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Set the class (builder pattern).
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Check for a tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Check for an active status instance.
    #[must_use]
    pub fn has_status(&self, status_id: &str) -> bool {
        self.statuses.iter().any(|s| s.status_id == status_id)
    }

    /// Get an active status instance.
    #[must_use]
    pub fn status(&self, status_id: &str) -> Option<&StatusInstance> {
        self.statuses.iter().find(|s| s.status_id == status_id)
    }

    /// Mark as fainted. Hp is forced to 0.
    pub fn faint(&mut self) {
        self.stats.hp = 0;
        self.alive = false;
    }
}
