//! Status lifecycle integration tests.
//!
//! Statuses are applied through skills where possible so the whole
//! action path is exercised, then ticked by the turn controller.

use rpg_battle::battle::{ActionExecutor, TurnController};
use rpg_battle::content::{Definitions, Rules, RuntimeSkill, StackRule, StatusHook, StatusTemplate};
use rpg_battle::core::{Actor, ActorId, BalanceTable, BattleState, StatBlock, StatKind};
use rpg_battle::effects::{EffectResolver, RuntimeEffect, TargetSelector, Value};
use rpg_battle::status::StatusEngine;

fn duel() -> BattleState {
    BattleState::new(
        404,
        [Actor::new("hero", "Hero", StatBlock::new(60, 10, 10, 10, 2, 2))],
        [Actor::new("slime", "Slime", StatBlock::new(40, 0, 0, 4, 1, 1))],
    )
    .unwrap()
}

fn content() -> Definitions {
    let mut defs = Definitions::new();
    defs.register_status(StatusTemplate::new("burn", "Burn", 3).with_tag("fire"))
        .unwrap();
    defs.register_status(StatusTemplate::new("scorch", "Scorch", 3).with_tag("fire"))
        .unwrap();
    defs.register_status(
        StatusTemplate::new("poison", "Poison", 2)
            .with_tag("poison")
            .with_hook(StatusHook::OnTurnEnd, RuntimeEffect::true_damage(3.0)),
    )
    .unwrap();
    defs.register_status(
        StatusTemplate::new("thorns", "Thorns", 5).with_hook(StatusHook::OnTakeDamage, RuntimeEffect::true_damage(2.0)),
    )
    .unwrap();
    defs.register_status(
        StatusTemplate::new("venom", "Venom", 4)
            .with_stacking(StackRule::StackMagnitude, 3)
            .with_hook(StatusHook::OnTurnEnd, RuntimeEffect::true_damage(2.0)),
    )
    .unwrap();
    defs.register_status(StatusTemplate::new("might", "Might", 2).with_modifier(StatKind::Atk, 5.0, 0.0))
        .unwrap();
    defs.register_status(
        StatusTemplate::new("barrier", "Barrier", 2).with_shield(Value::flat(8.0), None),
    )
    .unwrap();
    defs
}

/// Cleansing by tag removes only matching statuses.
#[test]
fn test_cleanse_by_tag() {
    let defs = content();
    let balance = BalanceTable::default();
    let rules = Rules::new(&defs, &balance);
    let mut state = duel();
    let slime = ActorId::from("slime");

    let hex = RuntimeSkill::new("hex", "Hex")
        .with_effect(RuntimeEffect::apply_status("burn", None))
        .with_effect(RuntimeEffect::apply_status("poison", None))
        .with_effect(RuntimeEffect::apply_status("scorch", None));
    ActionExecutor::use_skill(&mut state, rules, &hex, &"hero".into(), None).unwrap();
    assert_eq!(state.actor(&slime).unwrap().statuses.len(), 3);

    let douse = RuntimeSkill::new("douse", "Douse").with_effect(RuntimeEffect::cleanse(Some(vec!["fire".into()])));
    ActionExecutor::use_skill(&mut state, rules, &douse, &"hero".into(), None).unwrap();

    let left: Vec<&str> = state
        .actor(&slime)
        .unwrap()
        .statuses
        .iter()
        .map(|s| s.status_id.as_str())
        .collect();
    assert_eq!(left, vec!["poison"]);
}

/// Turn-end hooks tick on the holder's own turns until the status wears off.
#[test]
fn test_poison_ticks_and_expires() {
    let defs = content();
    let balance = BalanceTable::default();
    let rules = Rules::new(&defs, &balance);
    let mut state = duel();
    let hero = ActorId::from("hero");

    let mut resolver = EffectResolver::new(rules);
    StatusEngine::apply(&mut resolver, &mut state, &hero, "poison", None);
    assert!(state.log_contains("Hero is afflicted by Poison."));

    TurnController::end_turn(&mut state, rules);
    assert_eq!(state.actor(&hero).unwrap().stats.hp, 57);
    assert_eq!(state.actor(&hero).unwrap().status("poison").unwrap().remaining, 1);

    // the slime's turn does not tick the hero
    TurnController::end_turn(&mut state, rules);
    assert_eq!(state.actor(&hero).unwrap().stats.hp, 57);

    TurnController::end_turn(&mut state, rules);
    let hero_actor = state.actor(&hero).unwrap();
    assert_eq!(hero_actor.stats.hp, 54);
    assert!(!hero_actor.has_status("poison"));
    assert!(state.log_contains("Hero's Poison wore off."));
}

/// Damage-taken hooks strike back at the attacker.
#[test]
fn test_thorns_reflect() {
    let defs = content();
    let balance = BalanceTable::default();
    let rules = Rules::new(&defs, &balance);
    let mut state = duel();

    let mut resolver = EffectResolver::new(rules);
    StatusEngine::apply(&mut resolver, &mut state, &"slime".into(), "thorns", None);

    let strike = RuntimeSkill::new("strike", "Strike").with_effect(RuntimeEffect::true_damage(5.0));
    ActionExecutor::use_skill(&mut state, rules, &strike, &"hero".into(), None).unwrap();

    assert_eq!(state.actor(&"slime".into()).unwrap().stats.hp, 35);
    assert_eq!(state.actor(&"hero".into()).unwrap().stats.hp, 58);
}

/// Magnitude stacking multiplies hook effects by the stack count.
#[test]
fn test_stack_magnitude_scales_ticks() {
    let defs = content();
    let balance = BalanceTable::default();
    let rules = Rules::new(&defs, &balance);
    let mut state = duel();
    let hero = ActorId::from("hero");

    let mut resolver = EffectResolver::new(rules);
    for _ in 0..5 {
        StatusEngine::apply(&mut resolver, &mut state, &hero, "venom", None);
    }
    assert_eq!(state.actor(&hero).unwrap().status("venom").unwrap().stacks, 3);

    TurnController::end_turn(&mut state, rules);
    assert_eq!(state.actor(&hero).unwrap().stats.hp, 54);
}

/// Stat modifiers raise formula-based damage while active.
#[test]
fn test_modifier_feeds_formulas() {
    let defs = content();
    let balance = BalanceTable::default();
    let rules = Rules::new(&defs, &balance);
    let mut state = duel();
    let hero = ActorId::from("hero");

    let smash = RuntimeSkill::new("smash", "Smash").with_effect(
        RuntimeEffect::damage(0.0)
            .with_value(Value::formula("u.stats.atk"))
            .never_miss()
            .no_crit(),
    );
    let empower = RuntimeSkill::new("empower", "Empower")
        .with_targeting(TargetSelector::user())
        .with_effect(RuntimeEffect::apply_status("might", None));

    ActionExecutor::use_skill(&mut state, rules, &empower, &hero, None).unwrap();
    ActionExecutor::use_skill(&mut state, rules, &smash, &hero, None).unwrap();

    assert_eq!(state.actor(&"slime".into()).unwrap().stats.hp, 25);
    // base stats are untouched
    assert_eq!(state.actor(&hero).unwrap().stats.atk, 10);
}

/// A status shield is granted on apply and removed when the status ends.
#[test]
fn test_status_shield_lifecycle() {
    let defs = content();
    let balance = BalanceTable::default();
    let rules = Rules::new(&defs, &balance);
    let mut state = duel();
    let hero = ActorId::from("hero");

    let mut resolver = EffectResolver::new(rules);
    StatusEngine::apply(&mut resolver, &mut state, &hero, "barrier", None);
    assert_eq!(state.shield(&hero, "barrier").map(|s| s.hp), Some(8));

    for _ in 0..3 {
        TurnController::end_turn(&mut state, rules);
    }
    assert!(!state.actor(&hero).unwrap().has_status("barrier"));
    assert!(state.shield(&hero, "barrier").is_none());
}

/// Dispel with no id removes everything and fires no expiry hooks.
#[test]
fn test_dispel_all() {
    let defs = content();
    let balance = BalanceTable::default();
    let rules = Rules::new(&defs, &balance);
    let mut state = duel();
    let slime = ActorId::from("slime");

    let mut resolver = EffectResolver::new(rules);
    StatusEngine::apply(&mut resolver, &mut state, &slime, "burn", None);
    StatusEngine::apply(&mut resolver, &mut state, &slime, "poison", Some(4));
    assert_eq!(state.actor(&slime).unwrap().status("poison").unwrap().remaining, 4);

    let purge = RuntimeSkill::new("purge", "Purge").with_effect(RuntimeEffect::dispel(None));
    ActionExecutor::use_skill(&mut state, rules, &purge, &"hero".into(), None).unwrap();

    assert!(state.actor(&slime).unwrap().statuses.is_empty());
    assert_eq!(state.actor(&slime).unwrap().stats.hp, 40);
}

/// Deal-damage hooks default to the actor that was just damaged.
#[test]
fn test_deal_damage_hook_hits_victim() {
    let mut defs = content();
    defs.register_status(
        StatusTemplate::new("serrated", "Serrated", 3)
            .with_hook(StatusHook::OnDealDamage, RuntimeEffect::true_damage(2.0)),
    )
    .unwrap();
    defs.register_status(
        StatusTemplate::new("leech", "Leech", 3).with_hook(
            StatusHook::OnDealDamage,
            RuntimeEffect::heal(3.0).with_selector(TargetSelector::user()),
        ),
    )
    .unwrap();
    let balance = BalanceTable::default();
    let rules = Rules::new(&defs, &balance);
    let mut state = duel();
    let hero = ActorId::from("hero");
    let slime = ActorId::from("slime");
    let strike = RuntimeSkill::new("strike", "Strike").with_effect(RuntimeEffect::true_damage(5.0));

    let mut resolver = EffectResolver::new(rules);
    StatusEngine::apply(&mut resolver, &mut state, &hero, "serrated", None);
    ActionExecutor::use_skill(&mut state, rules, &strike, &hero, None).unwrap();
    // the hook's own damage does not re-trigger it
    assert_eq!(state.actor(&slime).unwrap().stats.hp, 33);
    assert_eq!(state.actor(&hero).unwrap().stats.hp, 60);

    // a selector sends the hook back to the holder
    StatusEngine::dispel(&mut state, &defs, &hero, Some("serrated"));
    StatusEngine::apply(&mut resolver, &mut state, &hero, "leech", None);
    state.actor_mut(&hero).unwrap().stats.hp = 50;
    ActionExecutor::use_skill(&mut state, rules, &strike, &hero, None).unwrap();
    assert_eq!(state.actor(&slime).unwrap().stats.hp, 28);
    assert_eq!(state.actor(&hero).unwrap().stats.hp, 53);
}

/// Apply hooks run on every accepted application, never on an ignored one.
#[test]
fn test_apply_hook_refires_unless_ignored() {
    let mut defs = content();
    defs.register_status(
        StatusTemplate::new("hex", "Hex", 3).with_hook(StatusHook::OnApply, RuntimeEffect::true_damage(4.0)),
    )
    .unwrap();
    defs.register_status(
        StatusTemplate::new("mark", "Mark", 3)
            .with_stacking(StackRule::Ignore, 1)
            .with_hook(StatusHook::OnApply, RuntimeEffect::true_damage(4.0)),
    )
    .unwrap();
    let balance = BalanceTable::default();
    let rules = Rules::new(&defs, &balance);
    let mut state = duel();
    let slime = ActorId::from("slime");

    let mut resolver = EffectResolver::new(rules);
    StatusEngine::apply(&mut resolver, &mut state, &slime, "hex", None);
    assert_eq!(state.actor(&slime).unwrap().stats.hp, 36);
    StatusEngine::apply(&mut resolver, &mut state, &slime, "hex", None);
    assert!(state.log_contains("Hex on Slime was renewed."));
    assert_eq!(state.actor(&slime).unwrap().stats.hp, 32);

    StatusEngine::apply(&mut resolver, &mut state, &slime, "mark", None);
    assert_eq!(state.actor(&slime).unwrap().stats.hp, 28);
    let lines = state.log.len();
    StatusEngine::apply(&mut resolver, &mut state, &slime, "mark", None);
    assert_eq!(state.actor(&slime).unwrap().stats.hp, 28);
    assert_eq!(state.log.len(), lines);
}
