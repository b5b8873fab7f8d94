mod common;

use std::sync::Arc;

use common::{Harness, OneShot, spawn_point, spell};
use spell_core::{
    ActivationTrigger, CastOutcome, Element, EntityId, House, HouseBook, PerkModifiers, PerkTable,
    SlotError, SpellCategory, SpellDefinition, SpellKey,
};
use spell_runtime::{Denial, InputAction, InputResult, NoCastZones};

const CASTER: EntityId = EntityId(11);

fn fireball() -> SpellDefinition {
    SpellDefinition::new("Fireball", SpellCategory::Combat)
        .with_description("Hurls a ball of fire")
        .with_instructions("Left click to throw")
        .with_magic_cost(30)
        .with_cooldown_ms(5_000)
        .with_element(Element::Fire)
}

fn houses() -> HouseBook {
    HouseBook::from_houses([
        House::new("Ember", [Element::Fire]),
        House::new("Tide", [Element::Water]),
    ])
    .unwrap()
}

#[tokio::test]
async fn bound_slot_casts_on_its_trigger_only() {
    let h = Harness::start(vec![spell(fireball(), OneShot::new(CastOutcome::Success))]).await;
    h.online(CASTER, 100);

    assert_eq!(h.engine.bind_spell(CASTER, 0, "fireball"), Ok(None));
    assert_eq!(
        h.engine.handle_input(CASTER, 0, InputAction::RightClick),
        InputResult::TriggerMismatch
    );
    assert_eq!(
        h.engine.handle_input(CASTER, 0, InputAction::LeftClick),
        InputResult::Cast(CastOutcome::Success)
    );
    assert_eq!(
        h.engine.handle_input(CASTER, 0, InputAction::LeftClick),
        InputResult::Cast(CastOutcome::OnCooldown)
    );
    assert_eq!(
        h.engine.handle_input(CASTER, 1, InputAction::LeftClick),
        InputResult::NoSpell
    );
}

#[tokio::test]
async fn sneak_spells_start_on_sneak() {
    let definition = fireball().with_trigger(ActivationTrigger::Sneak);
    let h = Harness::start(vec![spell(definition, OneShot::new(CastOutcome::Success))]).await;
    h.online(CASTER, 100);
    h.engine.bind_spell(CASTER, 4, "Fireball").unwrap();

    assert_eq!(
        h.engine.handle_input(CASTER, 4, InputAction::LeftClick),
        InputResult::TriggerMismatch
    );
    assert_eq!(
        h.engine.handle_input(CASTER, 4, InputAction::SneakStart),
        InputResult::Cast(CastOutcome::Success)
    );
}

#[tokio::test]
async fn protections_deny_before_anything_is_spent() {
    let h = Harness::start_with(
        Default::default(),
        vec![spell(fireball(), OneShot::new(CastOutcome::Success))],
        |builder| builder.protection(Arc::new(NoCastZones::new("spawn").with_zone(spawn_point(), 16.0))),
    )
    .await;
    h.online(CASTER, 100);
    h.engine.bind_spell(CASTER, 0, "fireball").unwrap();

    assert_eq!(
        h.engine.handle_input(CASTER, 0, InputAction::LeftClick),
        InputResult::Denied(Denial::Protected {
            by: "spawn".to_owned()
        })
    );
    assert_eq!(h.engine.get_magic(CASTER), 100);
    assert!(!h.engine.is_on_cooldown(CASTER, "fireball"));
}

#[tokio::test]
async fn house_restrictions_apply_to_binding_and_input() {
    let h = Harness::start_with(
        Default::default(),
        vec![spell(fireball(), OneShot::new(CastOutcome::Success))],
        |builder| builder.houses(houses()),
    )
    .await;
    h.online(CASTER, 100);

    h.engine.set_house(CASTER, Some("Tide")).unwrap();
    assert_eq!(
        h.engine.bind_spell(CASTER, 0, "fireball"),
        Err(SlotError::HouseRestricted {
            house: "tide".to_owned(),
            spell: "Fireball".to_owned(),
        })
    );

    // Binds made while houseless are still checked at input time.
    h.engine.set_house(CASTER, None).unwrap();
    h.engine.bind_spell(CASTER, 0, "fireball").unwrap();
    h.engine
        .casters()
        .get_or_load(CASTER)
        .lock()
        .set_house(Some("tide".to_owned()));

    assert_eq!(
        h.engine.handle_input(CASTER, 0, InputAction::LeftClick),
        InputResult::Denied(Denial::HouseRestricted)
    );
    assert_eq!(h.engine.get_magic(CASTER), 100);
}

#[tokio::test]
async fn joining_a_house_unbinds_spells_it_cannot_use() {
    let h = Harness::start_with(
        Default::default(),
        vec![spell(fireball(), OneShot::new(CastOutcome::Success))],
        |builder| builder.houses(houses()),
    )
    .await;
    h.online(CASTER, 100);
    h.engine.bind_spell(CASTER, 2, "fireball").unwrap();

    assert_eq!(h.engine.set_house(CASTER, Some("TIDE")).unwrap(), vec![2]);
    assert!(h.engine.get_spell_at_slot(CASTER, 2).is_none());
    assert!(h.engine.set_house(CASTER, Some("void")).is_err());
}

#[tokio::test]
async fn binding_validates_spell_and_slot() {
    let h = Harness::start(vec![spell(fireball(), OneShot::new(CastOutcome::Success))]).await;
    h.online(CASTER, 100);

    assert_eq!(
        h.engine.bind_spell(CASTER, 0, "meteor"),
        Err(SlotError::UnknownSpell("meteor".to_owned()))
    );
    assert_eq!(
        h.engine.bind_spell(CASTER, 9, "fireball"),
        Err(SlotError::OutOfRange { slot: 9 })
    );

    h.engine.bind_spell(CASTER, 0, "fireball").unwrap();
    assert_eq!(
        h.engine.unbind_spell(CASTER, 0),
        Ok(Some(SpellKey::new("fireball")))
    );
    assert_eq!(h.engine.unbind_spell(CASTER, 0), Ok(None));
}

#[tokio::test]
async fn slot_description_reports_effective_costs() {
    let perks = PerkTable::new()
        .with_house(
            "ember",
            PerkModifiers {
                magic_cost_multiplier: 0.5,
                cooldown_multiplier: 0.5,
                magic_regen_bonus: 0,
            },
        )
        .normalized();
    let h = Harness::start_with(
        Default::default(),
        vec![spell(fireball(), OneShot::new(CastOutcome::Success))],
        |builder| builder.perks(perks).houses(houses()),
    )
    .await;
    h.online(CASTER, 100);
    h.engine.bind_spell(CASTER, 0, "fireball").unwrap();

    let info = h.engine.describe_slot(CASTER, 0).expect("bound");
    assert_eq!(info.name, "Fireball");
    assert_eq!(info.description, "Hurls a ball of fire");
    assert_eq!(info.instructions, "Left click to throw");
    assert_eq!(info.magic_cost, Some(30));
    assert_eq!(info.cooldown_secs, Some(5.0));

    h.engine.set_house(CASTER, Some("ember")).unwrap();
    let info = h.engine.describe_slot(CASTER, 0).expect("still bound");
    assert_eq!(info.magic_cost, Some(15));
    assert_eq!(info.cooldown_secs, Some(2.5));

    assert!(h.engine.describe_slot(CASTER, 1).is_none());
}
