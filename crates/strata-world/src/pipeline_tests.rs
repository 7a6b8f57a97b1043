//! Whole-pipeline checks on a small generated world.

use strata_common::TilePos;

use crate::autotile::compute_orientation;
use crate::blocks::BlockRegistry;
use crate::config::WorldConfig;
use crate::grid::Layer;
use crate::observer::{NullObserver, RecordingObserver};
use crate::serialize::{read_text, write_text};
use crate::snapshot::{decode_snapshot, encode_snapshot};
use crate::world::World;

fn config() -> WorldConfig {
    let mut config = WorldConfig::with_size(240, 200);
    config.dungeon.count = 2;
    config.dungeon.bounds_width = 60;
    config.dungeon.bounds_height = 30;
    config.dungeon.room_min_width = 8;
    config.dungeon.room_max_width = 14;
    config.dungeon.room_min_height = 4;
    config.dungeon.room_max_height = 6;
    config
}

fn generate(seed: u64) -> World {
    let registry = BlockRegistry::builtin().expect("builtin table is valid");
    World::generate(config(), registry, seed, &mut NullObserver).expect("generation succeeds")
}

#[test]
fn test_generation_is_deterministic() {
    let a = generate(1234);
    let b = generate(1234);
    assert_eq!(a.grid(), b.grid());
    assert_eq!(a.clouds(), b.clouds());
    assert_ne!(a.grid(), generate(4321).grid());
}

#[test]
fn test_generated_orientations_match_neighbours() {
    let world = generate(77);
    let grid = world.grid();
    let registry = world.registry();
    let mut checked = 0;

    for pos in grid.positions() {
        for layer in [Layer::World, Layer::Back, Layer::Nature] {
            let slot = grid.slot(layer, pos.x, pos.y).expect("in bounds");
            if slot.is_empty() || !registry.is_tiled(slot.block) {
                continue;
            }
            let expected = compute_orientation(grid, registry, layer, pos.x, pos.y, true)
                .expect("in bounds");
            assert_eq!(slot.orientation, expected, "{layer:?} at {pos:?}");
            checked += 1;
        }
    }
    assert!(checked > 0);
}

#[test]
fn test_generated_world_has_every_feature() {
    let mut observer = RecordingObserver::new();
    let registry = BlockRegistry::builtin().expect("builtin table is valid");
    let world = World::generate(config(), registry, 99, &mut observer).expect("generation succeeds");
    let grid = world.grid();
    let id = |name: &str| world.registry().id_of(name).expect("defined");

    let count = |layer: Layer, name: &str| {
        let block = id(name);
        grid.cells()
            .iter()
            .filter(|cell| cell.slot(layer).block == block)
            .count()
    };
    assert!(count(Layer::World, "grass") > 0);
    assert!(count(Layer::World, "stone") > 0);
    assert!(count(Layer::Back, "backdirt") > 0);
    assert!(count(Layer::World, "stoneBrick") > 0);
    assert!(!world.clouds().is_empty());
    assert_eq!(observer.events().len(), world.clouds().len());

    // Daylight reaches the spawn column.
    let x = grid.width() as i32 / 2;
    let surface = grid.surface(x).expect("in bounds");
    assert!(grid.darkness(x, surface + 1).expect("in bounds") > 0.5);
}

#[test]
fn test_text_round_trip_of_generated_world() {
    let world = generate(5);
    let mut out = Vec::new();
    write_text(world.grid(), &mut out).expect("write to memory");
    let loaded =
        read_text(out.as_slice(), world.width(), world.height(), world.registry()).expect("valid");
    assert_eq!(&loaded, world.grid());
}

#[test]
fn test_binary_round_trip_of_generated_world() {
    let world = generate(6);
    let bytes = encode_snapshot(world.grid()).expect("encodes");
    let loaded = decode_snapshot(&bytes, world.registry()).expect("decodes");
    assert_eq!(&loaded, world.grid());
}

#[test]
fn test_edits_stay_local() {
    let mut world = generate(8);
    let width = world.width() as i32;

    for x in (10..width - 10).step_by(23) {
        let surface = world.grid().surface(x).expect("in bounds");
        for y in [surface + 2, surface - 3] {
            let before = world.grid().clone();
            let center = TilePos::new(x, y);
            if world
                .place_block(x, y, "stone", &mut NullObserver)
                .expect("valid edit")
            {
                assert!(world
                    .destroy_block(x, y, &mut NullObserver)
                    .expect("valid edit"));
            } else {
                // Occupied: dig it out and fill it back in.
                assert!(world
                    .destroy_block(x, y, &mut NullObserver)
                    .expect("valid edit"));
                assert!(world
                    .place_block(x, y, "stone", &mut NullObserver)
                    .expect("valid edit"));
                assert!(world
                    .destroy_block(x, y, &mut NullObserver)
                    .expect("valid edit"));
            }
            assert!(world.slot(Layer::World, x, y).expect("in bounds").is_empty());

            for pos in before.positions() {
                if pos.manhattan(center) <= 1 {
                    continue;
                }
                assert_eq!(
                    before.cell(pos.x, pos.y).expect("in bounds"),
                    world.grid().cell(pos.x, pos.y).expect("in bounds"),
                    "edit at {center:?} changed {pos:?}"
                );
            }
        }
    }
}

#[test]
fn test_shared_world_edits() {
    let shared = generate(10).into_shared();
    let spawn = shared.read().spawn_point().expect("in bounds");
    let placed = shared
        .write()
        .place_block(spawn.x, spawn.y, "torch", &mut NullObserver)
        .expect("valid edit");
    assert!(placed);
    let name = shared
        .read()
        .block_name(Layer::Light, spawn.x, spawn.y)
        .expect("in bounds")
        .map(str::to_string);
    assert_eq!(name.as_deref(), Some("torch"));
}
