mod common;

use common::Harness;
use spell_core::{EntityId, MagicSettings};
use spell_runtime::{CasterRepository, RuntimeConfig};

fn config(magic: MagicSettings, autosave_interval_ticks: u64) -> RuntimeConfig {
    RuntimeConfig {
        magic,
        autosave_interval_ticks,
        ..RuntimeConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn regen_tops_up_online_casters_up_to_the_bound() {
    let magic = MagicSettings {
        max_magic: 100,
        regen_interval_ticks: 2,
        regen_amount: 5,
    };
    let h = Harness::start_with(config(magic, 10_000), Vec::new(), |b| b).await;
    let online = EntityId(1);
    let offline = EntityId(2);
    h.online(online, 50);
    h.engine.casters().get_or_load(offline).lock().magic_mut().set(10);

    // Half a tick past the first pass.
    tokio::time::sleep(h.tick() * 2 + h.tick() / 2).await;
    assert_eq!(h.engine.get_magic(online), 55);

    h.advance_ticks(40).await;
    assert_eq!(h.engine.get_magic(online), 100);
    assert_eq!(h.engine.get_magic(offline), 10);
}

#[tokio::test(start_paused = true)]
async fn regen_amount_of_zero_leaves_pools_alone() {
    let magic = MagicSettings {
        regen_interval_ticks: 1,
        regen_amount: 0,
        ..MagicSettings::default()
    };
    let h = Harness::start_with(config(magic, 10_000), Vec::new(), |b| b).await;
    h.online(EntityId(1), 30);

    h.advance_ticks(10).await;
    assert_eq!(h.engine.get_magic(EntityId(1)), 30);
}

#[tokio::test(start_paused = true)]
async fn autosave_persists_loaded_casters() {
    let magic = MagicSettings {
        regen_amount: 0,
        ..MagicSettings::default()
    };
    let h = Harness::start_with(config(magic, 2), Vec::new(), |b| b).await;
    h.online(EntityId(4), 42);
    assert!(h.repo.load(EntityId(4)).unwrap().is_none());

    h.advance_ticks(3).await;

    let record = h.repo.load(EntityId(4)).unwrap().expect("auto-saved");
    assert_eq!(record.magic, 42);
    assert!(h.engine.casters().get_if_loaded(EntityId(4)).is_some());
}

#[tokio::test]
async fn workers_are_listed_in_the_task_registry() {
    let h = Harness::start(Vec::new()).await;
    let labels: Vec<String> = h
        .runtime
        .scheduler()
        .registry()
        .snapshot()
        .iter()
        .filter_map(|task| task.label().map(str::to_owned))
        .collect();

    assert!(labels.contains(&"worker:regen".to_owned()));
    assert!(labels.contains(&"worker:autosave".to_owned()));
}
