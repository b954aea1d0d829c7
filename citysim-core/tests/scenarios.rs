//! Named scenarios from the testable-properties catalog (S1-S6): empty
//! world, isolated residential block, connected RCI triangle, disconnected
//! road component, congestion-aware bottleneck, and debt amortization.

use citysim_core::{
    build_zone_access_map, compute_commute_traffic, compute_goods_flow, service_debts, DebtItem,
    GoodsConfig, Overlay, SimConfig, Simulator, TrafficConfig, World,
};

// S1: empty world produces a zeroed, stable baseline.
#[test]
fn s1_empty_world_has_no_population_or_traffic() {
    let mut world = World::new(8, 8, 1);
    let mut sim = Simulator::new(SimConfig::default());
    sim.step_once(&mut world);
    assert_eq!(world.stats.population, 0);
    assert_eq!(world.stats.employed, 0);
    assert_eq!(world.stats.commuters, 0);
    assert_eq!(world.stats.max_road_traffic, 0);
}

// S2: an isolated residential block (no road access) never develops.
#[test]
fn s2_isolated_residential_block_stays_empty() {
    let mut world = World::new(6, 6, 2);
    for x in 2..4 {
        for y in 2..4 {
            world.at_mut(x, y).overlay = Overlay::Residential;
        }
    }
    let mut sim = Simulator::new(SimConfig::default());
    for _ in 0..25 {
        sim.step_once(&mut world);
    }
    for x in 2..4 {
        for y in 2..4 {
            assert_eq!(world.at(x, y).occupants, 0);
        }
    }
}

// S3: a connected residential/commercial/industrial triangle along one
// road spine produces nonzero commute traffic and nonzero goods flow.
#[test]
fn s3_connected_rci_triangle_produces_commute_and_goods_flow() {
    let mut world = World::new(11, 3, 3);
    for x in 0..11 {
        world.at_mut(x, 1).overlay = Overlay::Road;
    }
    world.at_mut(0, 0).overlay = Overlay::Residential;
    world.at_mut(0, 1).overlay = Overlay::Road; // ensure adjacency column stays road
    world.at_mut(0, 0).occupants = 4;
    world.at_mut(5, 0).overlay = Overlay::Commercial;
    world.at_mut(10, 0).overlay = Overlay::Industrial;
    world.recompute_road_masks();

    let zam = build_zone_access_map(&world, None);
    let traffic = compute_commute_traffic(&world, &TrafficConfig::default(), 1.0, &zam);
    assert!(traffic.total_commuters > 0);

    let goods = compute_goods_flow(&world, &GoodsConfig::default(), &zam);
    assert!(goods.goods_produced > 0);
}

// S4: a road component disconnected from the outside-connected border
// contributes no accessible jobs/housing when require_outside_connection
// is enabled (tested at the Simulator level via stats.jobs_capacity_accessible).
#[test]
fn s4_disconnected_road_component_has_no_accessible_capacity() {
    let mut world = World::new(8, 8, 4);
    // Interior loop, never touching the border.
    for x in 2..6 {
        world.at_mut(x, 2).overlay = Overlay::Road;
        world.at_mut(x, 5).overlay = Overlay::Road;
    }
    for y in 2..6 {
        world.at_mut(2, y).overlay = Overlay::Road;
        world.at_mut(5, y).overlay = Overlay::Road;
    }
    world.at_mut(3, 3).overlay = Overlay::Commercial;
    world.recompute_road_masks();

    let mut cfg = SimConfig::default();
    cfg.require_outside_connection = true;
    let mut sim = Simulator::new(cfg);
    for _ in 0..5 {
        sim.step_once(&mut world);
    }
    assert_eq!(world.stats.jobs_capacity_accessible, 0);
}

// S5: congestion-aware routing with a narrow bottleneck spreads some
// traffic rather than piling all of it onto the single shortest path,
// relative to a flat (non congestion-aware) pass over the same world.
#[test]
fn s5_congestion_aware_routing_reduces_peak_tile_load_at_bottleneck() {
    let mut world = World::new(9, 3, 5);
    for x in 0..9 {
        world.at_mut(x, 1).overlay = Overlay::Road;
    }
    // Parallel bypass lane except through the bottleneck column x=4.
    for x in [1, 2, 6, 7] {
        world.at_mut(x, 0).overlay = Overlay::Road;
    }
    world.at_mut(0, 1).overlay = Overlay::Road;
    world.at_mut(0, 0).overlay = Overlay::Residential;
    world.at_mut(0, 0).occupants = 40;
    world.at_mut(8, 0).overlay = Overlay::Commercial;
    world.recompute_road_masks();

    let zam = build_zone_access_map(&world, None);

    let flat = compute_commute_traffic(&world, &TrafficConfig::default(), 1.0, &zam);

    let mut cfg = TrafficConfig::default();
    cfg.congestion_aware_routing = true;
    cfg.congestion_iterations = 6;
    let congested = compute_commute_traffic(&world, &cfg, 1.0, &zam);

    assert!(congested.used_congestion_aware_routing);
    assert!(congested.max_traffic <= flat.max_traffic);
}

// S6: debt amortizes to zero over its term and never pays more principal
// than the starting balance.
#[test]
fn s6_debt_amortizes_fully_without_overpaying_principal() {
    let mut debts = vec![DebtItem {
        balance: 12_000,
        daily_payment: 400,
        apr_basis_points: 500,
        days_left: 30,
    }];
    let mut total_principal = 0i64;
    let mut total_interest = 0i64;
    for _ in 0..30 {
        let r = service_debts(&mut debts);
        total_principal += r.principal_paid as i64;
        total_interest += r.interest_accrued as i64;
    }
    assert!(debts.is_empty());
    assert_eq!(total_principal, 12_000 + total_interest);
}

// S6 (Simulator-driven): a zero-interest loan on an otherwise empty world
// reduces `stats.money` by exactly its daily payment each tick, and is
// retired with a zeroed balance after its term.
#[test]
fn s6_debt_service_reduces_money_through_simulator_step() {
    let mut world = World::new(4, 4, 6);
    world.debts.push(DebtItem {
        balance: 365,
        daily_payment: 1,
        apr_basis_points: 0,
        days_left: 365,
    });
    let mut sim = Simulator::new(SimConfig::default());

    let starting_money = world.stats.money;
    for _ in 0..365 {
        let money_before = world.stats.money;
        sim.step_once(&mut world);
        assert_eq!(world.stats.money, money_before - 1);
    }

    assert!(world.debts.is_empty());
    assert_eq!(world.stats.money, starting_money - 365);
}
