//! Replay determinism: identical (seed, config) produce identical state,
//! and perturbing any single field changes the hash.

use citysim_core::{hash_world, Overlay, SimConfig, Simulator, World};

fn seeded_world(seed: u64) -> World {
    let mut w = World::new(12, 8, seed);
    for x in 0..12 {
        w.at_mut(x, 4).overlay = Overlay::Road;
    }
    w.at_mut(1, 3).overlay = Overlay::Residential;
    w.at_mut(1, 3).occupants = 2;
    w.at_mut(10, 3).overlay = Overlay::Commercial;
    w.at_mut(10, 5).overlay = Overlay::Industrial;
    w.recompute_road_masks();
    w
}

#[test]
fn identical_runs_produce_identical_hashes() {
    let mut a = seeded_world(42);
    let mut b = seeded_world(42);
    let mut sim_a = Simulator::new(SimConfig::default());
    let mut sim_b = Simulator::new(SimConfig::default());

    for _ in 0..20 {
        sim_a.step_once(&mut a);
        sim_b.step_once(&mut b);
    }

    assert_eq!(hash_world(&a, true), hash_world(&b, true));
}

#[test]
fn differing_seeds_diverge() {
    let mut a = seeded_world(1);
    let mut b = seeded_world(2);
    let mut sim_a = Simulator::new(SimConfig::default());
    let mut sim_b = Simulator::new(SimConfig::default());

    for _ in 0..10 {
        sim_a.step_once(&mut a);
        sim_b.step_once(&mut b);
    }

    assert_ne!(hash_world(&a, true), hash_world(&b, true));
}

#[test]
fn cloned_world_replays_identically_after_divergent_mutation() {
    // Clone before a tick, mutate the original slightly, then verify the
    // clone (run fresh) doesn't silently share state with the mutated one.
    let base = seeded_world(7);
    let mut original = base.clone();
    let mut replay = base.clone();

    let mut sim = Simulator::new(SimConfig::default());
    sim.step_once(&mut original);

    original.at_mut(6, 4).overlay = Overlay::Park;

    let mut sim2 = Simulator::new(SimConfig::default());
    sim2.step_once(&mut replay);

    assert_ne!(hash_world(&original, false), hash_world(&replay, false));
}

#[test]
fn single_tile_flip_changes_hash() {
    let a = seeded_world(3);
    let mut b = a.clone();
    b.at_mut(0, 0).overlay = Overlay::Road;
    assert_ne!(hash_world(&a, true), hash_world(&b, true));
}
