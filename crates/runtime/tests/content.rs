mod common;

use std::path::PathBuf;
use std::sync::Arc;

use common::{Harness, OneShot};
use spell_content::ContentFactory;
use spell_core::{CastOutcome, EntityId, SlotError, SpellDefinition};
use spell_runtime::{RuntimeConfig, Spell, SpellRegistry};

const CASTER: EntityId = EntityId(21);

fn bundled() -> ContentFactory {
    ContentFactory::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../spell/content/data"))
}

async fn start() -> Harness {
    let content = bundled();
    let perks = content.load_perks().expect("bundled perks");
    let houses = content.load_houses().expect("bundled houses");
    let settings = content.load_settings().expect("bundled settings");

    let config = RuntimeConfig {
        magic: settings.magic,
        ..RuntimeConfig::default()
    };

    let h = Harness::start_with(config, Vec::new(), |builder| builder.perks(perks).houses(houses)).await;
    let registry: &Arc<SpellRegistry> = h.engine.spells();
    for spec in content.load_spells().expect("bundled spells") {
        let behavior: Arc<dyn Spell> = OneShot::new(CastOutcome::Success);
        registry.register(SpellDefinition::from(spec), behavior);
    }
    h
}

#[tokio::test]
async fn bundled_catalog_registers_with_its_flags() {
    let h = start().await;

    assert_eq!(h.engine.spells().len(), 5);
    assert!(!h.engine.spells().definition("shield").unwrap().is_enabled());

    h.online(CASTER, 100);
    assert_eq!(h.engine.cast_spell(CASTER, "Shield"), CastOutcome::Failure);
    assert_eq!(h.engine.get_magic(CASTER), 100);
}

#[tokio::test]
async fn bundled_perks_shape_costs() {
    let h = start().await;
    h.online(CASTER, 100);

    // Void spells cost a quarter more for everyone.
    assert_eq!(h.engine.cast_spell(CASTER, "blink"), CastOutcome::Success);
    assert_eq!(h.engine.get_magic(CASTER), 81);

    h.engine.set_house(CASTER, Some("ember")).unwrap();
    h.engine.casters().get_or_load(CASTER).lock().magic_mut().set(100);
    assert_eq!(h.engine.cast_spell(CASTER, "fireball"), CastOutcome::Success);
    assert_eq!(h.engine.get_magic(CASTER), 82);
}

#[tokio::test]
async fn bundled_houses_restrict_binds() {
    let h = start().await;
    h.online(CASTER, 100);
    h.engine.set_house(CASTER, Some("Ember")).unwrap();

    assert!(h.engine.bind_spell(CASTER, 0, "fireball").is_ok());
    assert_eq!(
        h.engine.bind_spell(CASTER, 1, "heal"),
        Err(SlotError::HouseRestricted {
            house: "ember".to_owned(),
            spell: "Heal".to_owned(),
        })
    );
}
