//! Commuter flow: multi-source Dijkstra from job anchors to residential
//! anchors over the road grid, with optional congestion-aware re-weighting
//! and capacity-aware job assignment.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::config::TrafficConfig;
use crate::roads::ZoneAccessMap;
use crate::tile::{cap_for_level, Overlay};
use crate::world::World;

const DIRS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct TrafficResult {
    pub road_traffic: Vec<u32>,
    pub max_traffic: u32,
    pub avg_commute: f32,
    pub p95_commute: f32,
    pub avg_commute_time: f32,
    pub p95_commute_time: f32,
    pub congestion: f32,
    pub congested_road_tiles: i32,
    pub total_commuters: u32,
    pub reachable_commuters: u32,
    pub unreachable_commuters: u32,
    pub used_congestion_aware_routing: bool,
    pub routing_passes: u32,
    pub used_capacity_aware_jobs: bool,
    pub job_assignment_iterations: u32,
    pub max_job_source_overload: f32,
}

impl TrafficResult {
    fn zeroed(n: usize) -> Self {
        Self {
            road_traffic: vec![0; n],
            max_traffic: 0,
            avg_commute: 0.0,
            p95_commute: 0.0,
            avg_commute_time: 0.0,
            p95_commute_time: 0.0,
            congestion: 0.0,
            congested_road_tiles: 0,
            total_commuters: 0,
            reachable_commuters: 0,
            unreachable_commuters: 0,
            used_congestion_aware_routing: false,
            routing_passes: 0,
            used_capacity_aware_jobs: false,
            job_assignment_iterations: 0,
            max_job_source_overload: 0.0,
        }
    }
}

struct Anchor {
    tile_index: usize,
    weight: f64,
}

pub(crate) fn road_tile_capacity(world: &World, idx: usize, base_capacity: i32, capacity_scale: f32) -> i32 {
    let tile = world.tile_at_index(idx);
    let scaled_base = (base_capacity as f64 * capacity_scale as f64).round() as i32;
    cap_for_level(scaled_base, tile.level)
}

/// Road tiles touching a residential zone tile, weighted by `occupants *
/// employed_share`. Tiles with no zone access (per `zone_access`, which
/// already reflects `require_outside_connection`) contribute nothing.
fn collect_residential_anchors(world: &World, zone_access: &ZoneAccessMap, employed_share: f64) -> Vec<Anchor> {
    let mut by_road: BTreeMap<usize, f64> = BTreeMap::new();
    for (idx, tile) in world.zone_tiles() {
        if tile.overlay != Overlay::Residential {
            continue;
        }
        if let Some(road_idx) = zone_access.road_for(idx) {
            *by_road.entry(road_idx).or_insert(0.0) += tile.occupants as f64 * employed_share;
        }
    }
    by_road
        .into_iter()
        .map(|(tile_index, weight)| Anchor { tile_index, weight })
        .collect()
}

/// Road tiles touching a commercial/industrial zone tile, weighted by total
/// job capacity, gated by the include flags.
fn collect_job_anchors(world: &World, zone_access: &ZoneAccessMap, cfg: &TrafficConfig) -> Vec<Anchor> {
    let mut by_road: BTreeMap<usize, f64> = BTreeMap::new();
    for (idx, tile) in world.zone_tiles() {
        let included = match tile.overlay {
            Overlay::Commercial => cfg.include_commercial_jobs,
            Overlay::Industrial => cfg.include_industrial_jobs,
            _ => false,
        };
        if !included {
            continue;
        }
        if let Some(road_idx) = zone_access.road_for(idx) {
            *by_road.entry(road_idx).or_insert(0.0) += tile.occupant_capacity() as f64;
        }
    }
    by_road
        .into_iter()
        .map(|(tile_index, weight)| Anchor { tile_index, weight })
        .collect()
}

/// Multi-source Dijkstra over road tiles, seeded from `sources` at
/// `start_cost(source_index)`. `edge_weight(idx)` gives the cost of
/// entering tile `idx`. Ties broken deterministically on
/// `(cost, source_index, tile_index)`. Returns parallel `(dist, parent,
/// source_of)` arrays; unreached tiles have `dist == i64::MAX`.
fn multi_source_dijkstra(
    world: &World,
    sources: &[Anchor],
    start_cost: impl Fn(usize) -> i64,
    edge_weight: impl Fn(usize) -> i64,
) -> (Vec<i64>, Vec<i32>, Vec<i32>) {
    let n = world.tile_count();
    let mut dist = vec![i64::MAX; n];
    let mut parent = vec![-1i32; n];
    let mut source_of = vec![-1i32; n];
    // Heap entries: (cost, source_index, tile_index, parent_index). Ties
    // break on source_index then tile_index per the tuple order below.
    let mut heap: BinaryHeap<Reverse<(i64, i32, usize, i32)>> = BinaryHeap::new();

    for (src_idx, anchor) in sources.iter().enumerate() {
        heap.push(Reverse((start_cost(src_idx), src_idx as i32, anchor.tile_index, -1)));
    }

    while let Some(Reverse((cost, src_idx, idx, from))) = heap.pop() {
        if dist[idx] != i64::MAX {
            continue; // already settled by an earlier (smaller or tied) pop
        }
        dist[idx] = cost;
        source_of[idx] = src_idx;
        parent[idx] = from;

        let (x, y) = world.xy(idx);
        for (dx, dy) in DIRS {
            let (nx, ny) = (x + dx, y + dy);
            if !world.in_bounds(nx, ny) || !world.at(nx, ny).is_road() {
                continue;
            }
            let nidx = world.index(nx, ny);
            if dist[nidx] != i64::MAX {
                continue;
            }
            let new_cost = cost + edge_weight(nidx);
            heap.push(Reverse((new_cost, src_idx, nidx, idx as i32)));
        }
    }

    (dist, parent, source_of)
}

pub(crate) fn percentile(mut values: Vec<f32>, p: f32) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let rank = ((values.len() as f32 - 1.0) * p).round() as usize;
    values[rank.min(values.len() - 1)]
}

struct PassOutcome {
    road_traffic: Vec<u64>,
    step_samples: Vec<f32>,
    time_samples: Vec<f32>,
    reachable: u32,
    unreachable: u32,
    assigned_per_job: Vec<f64>,
}

/// One full routing pass: Dijkstra from `job_anchors`, then trace every
/// residential anchor back to its assigned job anchor, accumulating
/// `road_traffic` and per-commuter step/time samples.
fn run_one_pass(
    world: &World,
    residential_anchors: &[Anchor],
    job_anchors: &[Anchor],
    job_start_cost: &[i64],
    edge_weight: impl Fn(usize) -> i64,
) -> PassOutcome {
    let n = world.tile_count();
    let mut road_traffic = vec![0u64; n];
    let mut step_samples = Vec::new();
    let mut time_samples = Vec::new();
    let mut reachable = 0u32;
    let mut unreachable = 0u32;
    let mut assigned_per_job = vec![0.0f64; job_anchors.len()];

    if job_anchors.is_empty() {
        let total: f64 = residential_anchors.iter().map(|a| a.weight).sum();
        unreachable = total.round() as u32;
        return PassOutcome {
            road_traffic,
            step_samples,
            time_samples,
            reachable,
            unreachable,
            assigned_per_job,
        };
    }

    let (dist, parent, source_of) =
        multi_source_dijkstra(world, job_anchors, |i| job_start_cost[i], edge_weight);

    for anchor in residential_anchors {
        let commuters = anchor.weight.round() as u32;
        if commuters == 0 {
            continue;
        }
        let idx = anchor.tile_index;
        if dist[idx] == i64::MAX {
            unreachable += commuters;
            continue;
        }
        reachable += commuters;
        let src = source_of[idx];
        if src >= 0 {
            assigned_per_job[src as usize] += commuters as f64;
        }

        let mut cur = idx as i32;
        let mut step_count: u32 = 0;
        while cur >= 0 {
            let cidx = cur as usize;
            road_traffic[cidx] = road_traffic[cidx].saturating_add(commuters as u64);
            step_count += 1;
            cur = parent[cidx];
        }
        step_samples.push(step_count.saturating_sub(1) as f32);
        time_samples.push(dist[idx] as f32);
    }

    PassOutcome {
        road_traffic,
        step_samples,
        time_samples,
        reachable,
        unreachable,
        assigned_per_job,
    }
}

/// Compute commuter traffic assignment per spec §4.5. Infallible; returns a
/// zeroed result if the world has no roads, no zones, or no reachable job
/// anchors.
pub fn compute_commute_traffic(
    world: &World,
    cfg: &TrafficConfig,
    employed_share: f32,
    zone_access: &ZoneAccessMap,
) -> TrafficResult {
    let n = world.tile_count();
    let residential_anchors = collect_residential_anchors(world, zone_access, employed_share as f64);
    let job_anchors = collect_job_anchors(world, zone_access, cfg);

    let total_commuters: u32 = residential_anchors.iter().map(|a| a.weight.round() as u32).sum();
    if total_commuters == 0 {
        return TrafficResult::zeroed(n);
    }

    let base_weight = |idx: usize| -> i64 { world.tile_at_index(idx).travel_time_milli() as i64 };

    let job_iterations = if cfg.capacity_aware_jobs && !job_anchors.is_empty() {
        cfg.job_assignment_iterations.max(1)
    } else {
        1
    };
    let congestion_passes = if cfg.congestion_aware_routing {
        cfg.congestion_iterations.max(1)
    } else {
        1
    };

    let mut job_penalty = vec![0i64; job_anchors.len()];
    let mut max_job_source_overload = 0.0f32;
    let mut final_outcome: Option<PassOutcome> = None;

    for job_iter in 0..job_iterations {
        let mut msa_traffic = vec![0.0f64; n];
        let mut pass_outcome: Option<PassOutcome> = None;

        for pass in 0..congestion_passes {
            let weight_fn = |idx: usize| -> i64 {
                if !cfg.congestion_aware_routing || pass == 0 {
                    return base_weight(idx);
                }
                let v = msa_traffic[idx];
                let c = road_tile_capacity(world, idx, cfg.road_tile_capacity, cfg.congestion_capacity_scale).max(1) as f64;
                let ratio = (v / c).min(cfg.congestion_ratio_clamp as f64);
                let multiplier = 1.0 + (cfg.congestion_alpha as f64) * ratio.powf(cfg.congestion_beta as f64);
                (base_weight(idx) as f64 * multiplier).round() as i64
            };

            let outcome = run_one_pass(world, &residential_anchors, &job_anchors, &job_penalty, weight_fn);

            let n_pass = (pass + 1) as f64;
            for i in 0..n {
                msa_traffic[i] += (outcome.road_traffic[i] as f64 - msa_traffic[i]) / n_pass;
            }
            pass_outcome = Some(outcome);
        }

        let outcome = pass_outcome.expect("congestion_passes >= 1");
        let assigned = outcome.assigned_per_job.clone();

        let mut overload_max = 0.0f32;
        for (i, anchor) in job_anchors.iter().enumerate() {
            let cap = anchor.weight.max(1.0);
            let overload_ratio = ((assigned[i] - cap) / cap).max(0.0);
            overload_max = overload_max.max(overload_ratio as f32);
            job_penalty[i] = (cfg.job_penalty_base_milli as f64 * overload_ratio).round() as i64;
        }
        max_job_source_overload = overload_max;
        final_outcome = Some(outcome);

        if !cfg.capacity_aware_jobs || job_iter + 1 == job_iterations || overload_max <= 0.0 {
            break;
        }
    }

    let outcome = final_outcome.expect("job_iterations >= 1");
    let road_traffic: Vec<u32> = outcome.road_traffic.iter().map(|&v| v.min(u32::MAX as u64) as u32).collect();
    let max_traffic = road_traffic.iter().copied().max().unwrap_or(0);

    let mut congested = 0i32;
    for (idx, &traffic) in road_traffic.iter().enumerate() {
        if !world.tile_at_index(idx).is_road() {
            continue;
        }
        let capacity = road_tile_capacity(world, idx, cfg.road_tile_capacity, cfg.congestion_capacity_scale).max(0);
        if traffic as i64 > capacity as i64 {
            congested += 1;
        }
    }
    let total_roads = world.tiles().iter().filter(|t| t.is_road()).count().max(1) as f32;
    let congestion = congested as f32 / total_roads;

    let avg_commute = if outcome.step_samples.is_empty() {
        0.0
    } else {
        outcome.step_samples.iter().sum::<f32>() / outcome.step_samples.len() as f32
    };
    let avg_commute_time = if outcome.time_samples.is_empty() {
        0.0
    } else {
        outcome.time_samples.iter().sum::<f32>() / outcome.time_samples.len() as f32
    };
    let p95_commute = percentile(outcome.step_samples.clone(), 0.95);
    let p95_commute_time = percentile(outcome.time_samples.clone(), 0.95);

    TrafficResult {
        road_traffic,
        max_traffic,
        avg_commute,
        p95_commute,
        avg_commute_time,
        p95_commute_time,
        congestion,
        congested_road_tiles: congested,
        total_commuters,
        reachable_commuters: outcome.reachable,
        unreachable_commuters: outcome.unreachable,
        used_congestion_aware_routing: cfg.congestion_aware_routing,
        routing_passes: congestion_passes,
        used_capacity_aware_jobs: cfg.capacity_aware_jobs,
        job_assignment_iterations: job_iterations,
        max_job_source_overload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roads::build_zone_access_map;

    fn line_world(len: i32) -> World {
        let mut w = World::new(len, 1, 1);
        for x in 0..len {
            w.at_mut(x, 0).overlay = Overlay::Road;
        }
        w
    }

    #[test]
    fn no_zones_yields_zero_commuters() {
        let w = line_world(5);
        let zam = build_zone_access_map(&w, None);
        let result = compute_commute_traffic(&w, &TrafficConfig::default(), 1.0, &zam);
        assert_eq!(result.total_commuters, 0);
        assert!(result.road_traffic.iter().all(|&v| v == 0));
    }

    #[test]
    fn connected_residential_and_job_produces_traffic_on_path() {
        let mut w = line_world(5);
        w.at_mut(0, 0).overlay = Overlay::Residential;
        w.at_mut(0, 0).occupants = 4;
        w.at_mut(4, 0).overlay = Overlay::Commercial;
        let zam = build_zone_access_map(&w, None);
        let result = compute_commute_traffic(&w, &TrafficConfig::default(), 1.0, &zam);
        assert!(result.total_commuters > 0);
        assert_eq!(result.unreachable_commuters, 0);
        assert!(result.road_traffic.iter().sum::<u32>() > 0);
    }

    #[test]
    fn unreachable_residential_counts_as_unreachable_not_reachable() {
        // Residential sits next to its own isolated dead-end road tile,
        // disconnected from the job network on row y=2.
        let mut w = World::new(5, 3, 1);
        w.at_mut(0, 0).overlay = Overlay::Residential;
        w.at_mut(0, 0).occupants = 4;
        w.at_mut(1, 0).overlay = Overlay::Road;
        for x in 2..5 {
            w.at_mut(x, 2).overlay = Overlay::Road;
        }
        w.at_mut(4, 2).overlay = Overlay::Commercial;
        let zam = build_zone_access_map(&w, None);
        let result = compute_commute_traffic(&w, &TrafficConfig::default(), 1.0, &zam);
        assert_eq!(result.reachable_commuters, 0);
        assert_eq!(result.unreachable_commuters, 4);
    }

    #[test]
    fn capacity_aware_jobs_keeps_total_assigned_within_capacity() {
        let mut w = World::new(7, 1, 1);
        for x in 0..7 {
            w.at_mut(x, 0).overlay = Overlay::Road;
        }
        w.at_mut(0, 0).overlay = Overlay::Residential;
        w.at_mut(0, 0).occupants = 4;
        w.at_mut(6, 0).overlay = Overlay::Residential;
        w.at_mut(6, 0).occupants = 4;
        w.at_mut(3, 0).overlay = Overlay::Commercial; // cap_for_level(3,1)=3 jobs
        let zam = build_zone_access_map(&w, None);
        let mut cfg = TrafficConfig::default();
        cfg.capacity_aware_jobs = true;
        cfg.job_assignment_iterations = 6;
        let result = compute_commute_traffic(&w, &cfg, 1.0, &zam);
        assert!(result.used_capacity_aware_jobs);
        assert_eq!(result.total_commuters, 8);
    }
}
