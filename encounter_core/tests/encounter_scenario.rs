use std::sync::Arc;
use std::time::Duration;

use combat_core::prelude::*;
use combat_types::{EncounterKind, Endstate};
use encounter_core::{
    spawn_encounter, EncounterConfig, EncounterError, EncounterSession, EncounterSetup,
    Notification, SkillReport,
};

const ALLY: CombatantId = CombatantId(0);
const GOBLIN: CombatantId = CombatantId(1);
const ORC: CombatantId = CombatantId(2);

fn constants() -> Arc<CombatConstants> {
    Arc::new(CombatConstants::default())
}

fn catalog() -> Arc<StatusCatalog> {
    let mut catalog = StatusCatalog::with_builtins(&CombatConstants::default().status);
    catalog.insert(
        StatusDefinition::new("stun", StatusCategory::Impairment)
            .with_duration(Some(1))
            .build()
            .unwrap(),
    );
    catalog.insert(
        StatusDefinition::new("poison", StatusCategory::Ailment)
            .stackable(true)
            .build()
            .unwrap(),
    );
    Arc::new(catalog)
}

fn smite() -> Arc<Skill> {
    Skill::new("smite", Hit::new(1000.0, AttackAttributes::MAGICAL | AttackAttributes::LIGHT))
        .with_cost(2)
        .build()
        .unwrap()
}

fn meteor() -> Arc<Skill> {
    Skill::new("meteor", Hit::new(10.0, AttackAttributes::MAGICAL | AttackAttributes::FIRE))
        .with_timing(HitboxTiming::new(2, 1, 1))
        .build()
        .unwrap()
}

fn party() -> Vec<Combatant> {
    vec![
        Combatant::new(ALLY, "Paladin", Side::Ally, StatBlock::new(100, 10).with_speed(5))
            .with_skill(smite())
            .with_skill(meteor()),
        Combatant::new(GOBLIN, "Goblin", Side::Enemy, StatBlock::new(30, 0).with_speed(3)),
        Combatant::new(ORC, "Orc", Side::Enemy, StatBlock::new(50, 0).with_speed(4)),
    ]
}

#[tokio::test(start_paused = true)]
async fn advantage_encounter_ends_in_victory() {
    let mut session = EncounterSession::new(constants(), catalog());
    let handle = session
        .start(
            EncounterSetup::new(EncounterKind::Advantage, "forest", party()),
            EncounterConfig::default().with_seed(7),
        )
        .unwrap();
    let mut notifications = handle.subscribe();

    // Priority entry first, then the ally's regular entry
    let turn = handle.wait_turn().await.unwrap().unwrap();
    assert_eq!(turn.combatant, ALLY);
    assert!(turn.priority);
    assert_eq!(turn.round, 1);
    handle.use_skill(turn.entry, "smite", vec![ORC]).await.unwrap();
    handle.complete_turn(turn.entry).await.unwrap();

    let turn = handle.wait_turn().await.unwrap().unwrap();
    assert_eq!(turn.combatant, ALLY);
    assert!(!turn.priority);
    match handle.use_skill(turn.entry, "smite", vec![GOBLIN]).await.unwrap() {
        SkillReport::Resolved(outcomes) => {
            assert_eq!(outcomes.len(), 1);
            assert!(outcomes[0].incapacitated);
        }
        SkillReport::Placed(_) => panic!("smite resolves instantly"),
    }
    handle.complete_turn(turn.entry).await.unwrap();

    // Both enemies are down; their turns are skipped and the round closes
    assert!(handle.wait_turn().await.unwrap().is_none());

    let outcome = session.finish().await.unwrap();
    assert_eq!(outcome.endstate, Endstate::Victory);
    assert_eq!(outcome.rounds, 1);

    let orc = outcome.combatant(ORC).unwrap();
    assert_eq!(orc.stats.hp(), 0);
    assert!(orc.statuses.is_empty());
    let paladin = outcome.combatant(ALLY).unwrap();
    assert_eq!(paladin.stats.mp(), paladin.stats.max_mp);
    assert!(paladin.aggro.is_empty());

    let mut seen = Vec::new();
    while let Ok(notification) = notifications.try_recv() {
        seen.push(notification);
    }
    assert!(seen.contains(&Notification::Incapacitated { combatant: ORC }));
    assert!(seen.contains(&Notification::TurnSkipped {
        round: 1,
        entry: outcome_entry_for(&seen, GOBLIN),
        combatant: GOBLIN,
    }));
    assert_eq!(
        seen.last(),
        Some(&Notification::EncounterClosed {
            endstate: Endstate::Victory,
            rounds: 1,
        })
    );
}

fn outcome_entry_for(seen: &[Notification], combatant: CombatantId) -> encounter_core::EntryId {
    seen.iter()
        .find_map(|n| match n {
            Notification::TurnSkipped {
                entry,
                combatant: c,
                ..
            } if *c == combatant => Some(*entry),
            _ => None,
        })
        .expect("turn was skipped")
}

#[tokio::test(start_paused = true)]
async fn flee_keeps_combatant_state() {
    let mut session = EncounterSession::new(constants(), catalog());
    let handle = session
        .start(
            EncounterSetup::new(EncounterKind::Normal, "cave", party()),
            EncounterConfig::default(),
        )
        .unwrap();

    let turn = handle.wait_turn().await.unwrap().unwrap();
    handle
        .apply_status(ALLY, "poison", StatusStack::permanent(), 3)
        .await
        .unwrap();
    handle.use_skill(turn.entry, "smite", vec![GOBLIN]).await.unwrap();
    handle.flee().await.unwrap();

    let outcome = session.finish().await.unwrap();
    assert_eq!(outcome.endstate, Endstate::Flee);
    let paladin = outcome.combatant(ALLY).unwrap();
    assert_eq!(paladin.statuses.stack_count(&StatusId::from("poison")), 3);
    assert_eq!(paladin.stats.mp(), 8);
    // The goblin stays incapacitated
    assert!(outcome
        .combatant(GOBLIN)
        .unwrap()
        .has_status(&StatusId::from("incapacitated")));

    assert!(handle.snapshot().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn stunned_combatant_loses_its_turn() {
    let combatants = vec![
        Combatant::new(ALLY, "Paladin", Side::Ally, StatBlock::new(100, 10).with_speed(1)),
        Combatant::new(GOBLIN, "Goblin", Side::Enemy, StatBlock::new(30, 0).with_speed(9)),
    ];
    let (handle, task) = spawn_encounter(
        EncounterSetup::new(EncounterKind::Normal, "ruins", combatants),
        EncounterConfig::default(),
        constants(),
        &catalog(),
    )
    .unwrap();

    let turn = handle.wait_turn().await.unwrap().unwrap();
    assert_eq!((turn.round, turn.combatant), (1, GOBLIN));
    handle
        .apply_status(ALLY, "stun", StatusStack::new(Some(1)).from_inflicter(GOBLIN), 1)
        .await
        .unwrap();
    handle.complete_turn(turn.entry).await.unwrap();

    // The ally's round 1 turn is skipped; the stun runs out at round end
    let turn = handle.wait_turn().await.unwrap().unwrap();
    assert_eq!((turn.round, turn.combatant), (2, GOBLIN));
    handle.complete_turn(turn.entry).await.unwrap();

    let turn = handle.wait_turn().await.unwrap().unwrap();
    assert_eq!((turn.round, turn.combatant), (2, ALLY));

    let snapshot = handle.snapshot().await.unwrap();
    assert!(!snapshot.combatant(ALLY).unwrap().has_status(&StatusId::from("stun")));

    handle.flee().await.unwrap();
    drop(handle);
    assert_eq!(task.await.unwrap().endstate, Endstate::Flee);
}

#[tokio::test(start_paused = true)]
async fn hitbox_skill_lands_after_delay() {
    let mut session = EncounterSession::new(constants(), catalog());
    let handle = session
        .start(
            EncounterSetup::new(EncounterKind::Normal, "crater", party()),
            EncounterConfig::default(),
        )
        .unwrap();
    let mut notifications = handle.subscribe();

    let turn = handle.wait_turn().await.unwrap().unwrap();
    let hitbox = match handle.use_skill(turn.entry, "meteor", vec![GOBLIN, ORC]).await.unwrap() {
        SkillReport::Placed(id) => id,
        SkillReport::Resolved(_) => panic!("meteor has a hitbox"),
    };

    // Still in the delay phase
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.combatant(GOBLIN).unwrap().hp, 30);

    tokio::time::sleep(Duration::from_millis(120)).await;
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.combatant(GOBLIN).unwrap().hp, 20);
    assert_eq!(snapshot.combatant(ORC).unwrap().hp, 40);

    tokio::time::sleep(Duration::from_millis(200)).await;
    // Make sure the worker has serviced the expiry
    handle.snapshot().await.unwrap();
    let mut expired = false;
    while let Ok(notification) = notifications.try_recv() {
        if notification == (Notification::HitboxExpired { hitbox }) {
            expired = true;
        }
    }
    assert!(expired);

    handle.flee().await.unwrap();
    session.finish().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn fleeing_before_a_hitbox_lands_discards_it() {
    let mut session = EncounterSession::new(constants(), catalog());
    let handle = session
        .start(
            EncounterSetup::new(EncounterKind::Normal, "crater", party()),
            EncounterConfig::default(),
        )
        .unwrap();
    let mut notifications = handle.subscribe();

    let turn = handle.wait_turn().await.unwrap().unwrap();
    let hitbox = match handle.use_skill(turn.entry, "meteor", vec![GOBLIN, ORC]).await.unwrap() {
        SkillReport::Placed(id) => id,
        SkillReport::Resolved(_) => panic!("meteor has a hitbox"),
    };
    handle.flee().await.unwrap();

    // Well past the point the hitbox would have turned active
    tokio::time::sleep(Duration::from_millis(400)).await;
    let outcome = session.finish().await.unwrap();
    assert_eq!(outcome.endstate, Endstate::Flee);
    assert_eq!(outcome.combatant(GOBLIN).unwrap().stats.hp(), 30);
    assert_eq!(outcome.combatant(ORC).unwrap().stats.hp(), 50);

    let mut placed = false;
    while let Ok(notification) = notifications.try_recv() {
        match notification {
            Notification::HitPlaced { hitbox: id, .. } => placed |= id == hitbox,
            Notification::HitExecuted { .. } => panic!("hitbox landed after the flee"),
            Notification::HitboxExpired { .. } => panic!("hitbox outlived the encounter"),
            _ => {}
        }
    }
    assert!(placed);
}

#[tokio::test(start_paused = true)]
async fn invalid_requests_are_rejected() {
    let mut session = EncounterSession::new(constants(), catalog());
    assert!(matches!(
        session.finish().await,
        Err(EncounterError::NoLiveEncounter)
    ));

    let handle = session
        .start(
            EncounterSetup::new(EncounterKind::Disadvantage, "swamp", party()),
            EncounterConfig::default(),
        )
        .unwrap();
    assert!(matches!(
        session.start(
            EncounterSetup::new(EncounterKind::Normal, "swamp", party()),
            EncounterConfig::default(),
        ),
        Err(EncounterError::AlreadyActive)
    ));

    // Enemies hold priority; the orc is fastest of them
    let turn = handle.wait_turn().await.unwrap().unwrap();
    assert_eq!(turn.combatant, ORC);
    assert!(turn.priority);

    assert!(matches!(
        handle.use_skill(turn.entry, "smite", vec![ALLY]).await,
        Err(EncounterError::UnknownSkill { .. })
    ));
    assert!(matches!(
        handle
            .apply_status(ALLY, "doom", StatusStack::permanent(), 1)
            .await,
        Err(EncounterError::UnknownStatus(_))
    ));
    assert!(matches!(
        handle.complete_turn(encounter_core::EntryId(999)).await,
        Err(EncounterError::UnknownEntry(_))
    ));
    assert!(matches!(
        handle
            .resolve_hit(None, Arc::new(Hit::new(1.0, AttackAttributes::PHYSICAL)), CombatantId(42))
            .await,
        Err(EncounterError::UnknownCombatant(_))
    ));
    assert!(!handle.remove_status(ALLY, "stun").await.unwrap());

    handle.flee().await.unwrap();
    assert!(matches!(handle.flee().await, Err(_)));
    session.finish().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn dropping_every_handle_closes_as_flee() {
    let (handle, task) = spawn_encounter(
        EncounterSetup::new(EncounterKind::Normal, "bridge", party()),
        EncounterConfig::default(),
        constants(),
        &catalog(),
    )
    .unwrap();

    let turn = handle.wait_turn().await.unwrap().unwrap();
    assert_eq!(turn.combatant, ALLY);
    drop(handle);

    let outcome = task.await.unwrap();
    assert_eq!(outcome.endstate, Endstate::Flee);
    assert_eq!(outcome.rounds, 1);
}
