//! Action execution integration tests.
//!
//! These tests cover the full validate, pay, resolve, outcome path for
//! skills and items, together with the turn cycle.

use rpg_battle::battle::{evaluate_outcome, ActionExecutor, TurnController};
use rpg_battle::content::{Definitions, Rules, RuntimeItem, RuntimeSkill};
use rpg_battle::core::{
    ActionRejection, Actor, ActorId, BalanceTable, BattleRng, BattleState, EndReason, StatBlock,
};
use rpg_battle::effects::{RuntimeEffect, TargetSelector, Value};

fn actor(id: &str, name: &str, max_hp: i64) -> Actor {
    Actor::new(id, name, StatBlock::new(max_hp, 20, 20, 8, 4, 3))
}

fn duel() -> BattleState {
    BattleState::new(77, [actor("hero", "Hero", 60)], [actor("slime", "Slime", 30)]).unwrap()
}

fn jab() -> RuntimeSkill {
    RuntimeSkill::new("jab", "Jab").with_effect(RuntimeEffect::true_damage(1.0))
}

/// Cooldown 2 blocks reuse until two turn boundaries have passed.
#[test]
fn test_cooldown_cycle() {
    let defs = Definitions::new();
    let balance = BalanceTable::default();
    let rules = Rules::new(&defs, &balance);
    let mut state = duel();
    let hero = ActorId::from("hero");
    let skill = jab().with_cooldown(2);

    ActionExecutor::use_skill(&mut state, rules, &skill, &hero, None).unwrap();

    let err = ActionExecutor::use_skill(&mut state, rules, &skill, &hero, None).unwrap_err();
    assert_eq!(
        err,
        ActionRejection::OnCooldown {
            action: "Jab".into(),
            turns: 2
        }
    );

    TurnController::end_turn(&mut state, rules);
    assert_eq!(state.cooldown(&hero, "jab"), 1);
    TurnController::end_turn(&mut state, rules);
    assert_eq!(TurnController::current_actor(&state), Some(&hero));

    ActionExecutor::use_skill(&mut state, rules, &skill, &hero, None).unwrap();
    assert_eq!(state.actor(&"slime".into()).unwrap().stats.hp, 28);
}

/// A two-charge skill works twice, then refuses.
#[test]
fn test_charges_run_out() {
    let defs = Definitions::new();
    let balance = BalanceTable::default();
    let rules = Rules::new(&defs, &balance);
    let mut state = duel();
    let hero = ActorId::from("hero");
    let skill = jab().with_charges(2);

    ActionExecutor::use_skill(&mut state, rules, &skill, &hero, None).unwrap();
    ActionExecutor::use_skill(&mut state, rules, &skill, &hero, None).unwrap();
    let err = ActionExecutor::use_skill(&mut state, rules, &skill, &hero, None).unwrap_err();

    assert!(matches!(err, ActionRejection::NoCharges { .. }));
    assert!(state.log_contains("no charges"));
    let charges = state.charges_of(&hero, "jab").unwrap();
    assert_eq!((charges.remaining, charges.max), (0, 2));
}

/// Shields soak damage before hp.
#[test]
fn test_shield_absorbs_hit() {
    let defs = Definitions::new();
    let balance = BalanceTable::default();
    let rules = Rules::new(&defs, &balance);
    let mut state = duel();
    let slime = ActorId::from("slime");
    state.add_shield(&slime, "shield", None, 30);

    let hit = RuntimeSkill::new("hit", "Hit").with_effect(RuntimeEffect::true_damage(20.0));
    ActionExecutor::use_skill(&mut state, rules, &hit, &"hero".into(), None).unwrap();

    assert_eq!(state.shield(&slime, "shield").unwrap().hp, 10);
    assert_eq!(state.actor(&slime).unwrap().stats.hp, 30);
    assert!(state.log_contains("absorbed"));
}

/// A shield granted by a skill stacks into the named bucket.
#[test]
fn test_shield_effect_then_overflow() {
    let defs = Definitions::new();
    let balance = BalanceTable::default();
    let rules = Rules::new(&defs, &balance);
    let mut state = duel();
    let hero = ActorId::from("hero");

    let ward = RuntimeSkill::new("ward", "Ward")
        .with_targeting(TargetSelector::user())
        .with_effect(RuntimeEffect::shield("ward", 5.0));
    ActionExecutor::use_skill(&mut state, rules, &ward, &hero, None).unwrap();
    assert_eq!(state.shield_total(&hero), 5);
    TurnController::end_turn(&mut state, rules);

    let bite = RuntimeSkill::new("bite", "Bite").with_effect(RuntimeEffect::true_damage(12.0));
    ActionExecutor::use_skill(&mut state, rules, &bite, &"slime".into(), None).unwrap();

    assert_eq!(state.shield_total(&hero), 0);
    assert_eq!(state.actor(&hero).unwrap().stats.hp, 53);
}

/// Revive reaches a fainted ally only through an include-dead selector.
#[test]
fn test_revive_dead_ally() {
    let defs = Definitions::new();
    let balance = BalanceTable::default();
    let rules = Rules::new(&defs, &balance);
    let mut state = BattleState::new(
        3,
        [actor("cleric", "Cleric", 30), actor("knight", "Knight", 40)],
        [actor("slime", "Slime", 30)],
    )
    .unwrap();
    let knight = ActorId::from("knight");
    state.actor_mut(&knight).unwrap().faint();

    let raise = RuntimeSkill::new("raise", "Raise")
        .with_targeting(TargetSelector::single_ally().include_dead())
        .with_effect(RuntimeEffect::revive(Value::flat(15.0)));
    let report =
        ActionExecutor::use_skill(&mut state, rules, &raise, &"cleric".into(), Some(&[knight.clone()][..])).unwrap();

    assert_eq!(report.targets, vec![knight.clone()]);
    let revived = state.actor(&knight).unwrap();
    assert!(revived.alive);
    assert_eq!(revived.stats.hp, 15);
    assert!(state.log_contains("Knight was revived with 15 HP!"));
}

/// Revive amount is clamped to max hp.
#[test]
fn test_revive_clamped() {
    let defs = Definitions::new();
    let balance = BalanceTable::default();
    let rules = Rules::new(&defs, &balance);
    let mut state = BattleState::new(
        3,
        [actor("cleric", "Cleric", 30), actor("knight", "Knight", 40)],
        [actor("slime", "Slime", 30)],
    )
    .unwrap();
    let knight = ActorId::from("knight");
    state.actor_mut(&knight).unwrap().faint();

    let raise = RuntimeSkill::new("raise", "Raise")
        .with_targeting(TargetSelector::single_ally().include_dead())
        .with_effect(RuntimeEffect::revive(Value::flat(500.0)));
    ActionExecutor::use_skill(&mut state, rules, &raise, &"cleric".into(), Some(&[knight.clone()][..])).unwrap();

    assert_eq!(state.actor(&knight).unwrap().stats.hp, 40);
}

/// Fleeing stops the remaining effects of the action.
#[test]
fn test_flee_halts_effects() {
    let defs = Definitions::new();
    let balance = BalanceTable::default();
    let rules = Rules::new(&defs, &balance);
    let mut state = duel();
    let hero = ActorId::from("hero");

    let escape = RuntimeSkill::new("escape", "Escape")
        .with_effect(RuntimeEffect::flee())
        .with_effect(RuntimeEffect::true_damage(10.0));
    let report = ActionExecutor::use_skill(&mut state, rules, &escape, &hero, None).unwrap();

    assert_eq!(report.outcome, Some(EndReason::Fled));
    assert_eq!(state.ended.map(|e| e.reason), Some(EndReason::Fled));
    assert_eq!(state.actor(&"slime".into()).unwrap().stats.hp, 30);
    assert!(state.log_contains("Hero fled from battle!"));

    let err = ActionExecutor::use_skill(&mut state, rules, &jab(), &hero, None).unwrap_err();
    assert_eq!(err, ActionRejection::BattleOver);
}

/// Victory is recorded once, with rewards.
#[test]
fn test_victory_exactly_once() {
    let defs = Definitions::new();
    let balance = BalanceTable::default();
    let rules = Rules::new(&defs, &balance);
    let mut slime = actor("slime", "Slime", 10);
    slime.stats.xp = 5;
    slime.stats.gold = 3;
    let mut bat = actor("bat", "Bat", 10);
    bat.stats.xp = 7;
    bat.stats.gold = 1;
    let mut state = BattleState::new(9, [actor("hero", "Hero", 60)], [slime, bat]).unwrap();

    let sweep = RuntimeSkill::new("sweep", "Sweep")
        .with_targeting(TargetSelector::all_enemies())
        .with_effect(RuntimeEffect::true_damage(50.0));
    let report = ActionExecutor::use_skill(&mut state, rules, &sweep, &"hero".into(), None).unwrap();

    assert_eq!(report.outcome, Some(EndReason::Victory));
    assert_eq!(evaluate_outcome(&mut state), Some(EndReason::Victory));
    TurnController::end_turn(&mut state, rules);

    let victories = state.log.iter().filter(|l| l.starts_with("Victory!")).count();
    assert_eq!(victories, 1);
    assert!(state.log_contains("Victory! Gained 12 XP and 4 gold."));
    let hero = state.actor(&"hero".into()).unwrap();
    assert_eq!((hero.stats.xp, hero.stats.gold), (12, 4));
}

/// Losing the last player ends in defeat.
#[test]
fn test_defeat() {
    let defs = Definitions::new();
    let balance = BalanceTable::default();
    let rules = Rules::new(&defs, &balance);
    let mut state = duel();
    TurnController::end_turn(&mut state, rules);

    let crush = RuntimeSkill::new("crush", "Crush").with_effect(RuntimeEffect::true_damage(999.0));
    let report = ActionExecutor::use_skill(&mut state, rules, &crush, &"slime".into(), None).unwrap();

    assert_eq!(report.outcome, Some(EndReason::Defeat));
    assert!(state.log_contains("Hero fainted!"));
    assert!(state.log_contains("Defeat..."));
}

/// A prevented actor loses exactly one turn.
#[test]
fn test_prevent_action_skips_one_turn() {
    let defs = Definitions::new();
    let balance = BalanceTable::default();
    let rules = Rules::new(&defs, &balance);
    let mut state = duel();
    let slime = ActorId::from("slime");

    let stun = RuntimeSkill::new("stun", "Stun").with_effect(RuntimeEffect::prevent_action());
    ActionExecutor::use_skill(&mut state, rules, &stun, &"hero".into(), None).unwrap();
    TurnController::end_turn(&mut state, rules);

    let err = ActionExecutor::use_skill(&mut state, rules, &jab(), &slime, None).unwrap_err();
    assert!(matches!(err, ActionRejection::Prevented { .. }));

    TurnController::end_turn(&mut state, rules);
    TurnController::end_turn(&mut state, rules);
    ActionExecutor::use_skill(&mut state, rules, &jab(), &slime, None).unwrap();
}

/// Items come from and go back to the shared inventory.
#[test]
fn test_give_then_use_item() {
    let defs = Definitions::new();
    let balance = BalanceTable::default();
    let rules = Rules::new(&defs, &balance);
    let mut state = duel();
    let hero = ActorId::from("hero");
    state.actor_mut(&hero).unwrap().stats.hp = 20;

    let forage = RuntimeSkill::new("forage", "Forage")
        .with_targeting(TargetSelector::user())
        .with_effect(RuntimeEffect::give_item("herb", 2));
    ActionExecutor::use_skill(&mut state, rules, &forage, &hero, None).unwrap();
    assert_eq!(state.item_count("herb"), 2);

    let herb = RuntimeItem::new("herb", "Herb").with_effect(RuntimeEffect::heal(10.0));
    ActionExecutor::use_item(&mut state, rules, &herb, &hero, None).unwrap();
    assert_eq!(state.item_count("herb"), 1);
    assert_eq!(state.actor(&hero).unwrap().stats.hp, 30);
}

/// Summons join the user's side and the turn order.
#[test]
fn test_summon_joins_side() {
    let mut defs = Definitions::new();
    defs.register_enemy("wolf", |level| {
        Actor::new("wolf", "Wolf", StatBlock::new(10 + i64::from(level) * 2, 0, 0, 4, 1, i64::from(level)))
    })
    .unwrap();
    let balance = BalanceTable::default();
    let rules = Rules::new(&defs, &balance);
    let mut state = duel();

    let call = RuntimeSkill::new("call", "Call of the Wild")
        .with_targeting(TargetSelector::user())
        .with_effect(RuntimeEffect::summon("wolf"));
    ActionExecutor::use_skill(&mut state, rules, &call, &"hero".into(), None).unwrap();
    ActionExecutor::use_skill(&mut state, rules, &call, &"hero".into(), None).unwrap();

    assert_eq!(state.players.len(), 3);
    assert_eq!(state.turn_order.len(), 4);
    let first = ActorId::from("wolf#1");
    let summoned = state.actor(&first).unwrap();
    assert_eq!(summoned.stats.level, 3);
    assert_eq!(summoned.stats.max_hp, 16);
    assert!(state.actor(&"wolf#2".into()).is_some());
    assert!(state.log_contains("Hero summons Wolf!"));
}

/// Number of rng draws that lead from seed `from` to seed `to`.
fn draws_between(from: u64, to: u64) -> usize {
    let mut seed = from;
    let mut draws = 0;
    while seed != to {
        seed = BattleRng::step(seed).0;
        draws += 1;
        assert!(draws <= 32, "seed {to} not reachable from {from}");
    }
    draws
}

/// A shared roll draws hit and crit once for the whole target list.
#[test]
fn test_shared_roll_draws_once_per_effect() {
    let defs = Definitions::new();
    // every hit lands, so each target always reaches its crit roll
    let balance = BalanceTable {
        dodge_floor: 1.0,
        ..BalanceTable::default()
    };
    let rules = Rules::new(&defs, &balance);
    let trio = || {
        BattleState::new(
            77,
            [actor("hero", "Hero", 60)],
            [actor("s1", "Slime", 30), actor("s2", "Slime", 30), actor("s3", "Slime", 30)],
        )
        .unwrap()
    };
    let hero = ActorId::from("hero");

    let volley = RuntimeSkill::new("volley", "Volley")
        .with_targeting(TargetSelector::all_enemies())
        .with_effect(RuntimeEffect::damage(5.0).shared_roll());
    let mut state = trio();
    let seed = state.rng.seed();
    ActionExecutor::use_skill(&mut state, rules, &volley, &hero, None).unwrap();
    assert_eq!(draws_between(seed, state.rng.seed()), 2);
    let hp: Vec<i64> = ["s1", "s2", "s3"]
        .iter()
        .map(|id| state.actor(&ActorId::from(*id)).unwrap().stats.hp)
        .collect();
    assert!(hp.iter().all(|h| *h == hp[0] && *h < 30));

    let spray = RuntimeSkill::new("spray", "Spray")
        .with_targeting(TargetSelector::all_enemies())
        .with_effect(RuntimeEffect::damage(5.0));
    let mut state = trio();
    let seed = state.rng.seed();
    ActionExecutor::use_skill(&mut state, rules, &spray, &hero, None).unwrap();
    assert_eq!(draws_between(seed, state.rng.seed()), 6);
}
