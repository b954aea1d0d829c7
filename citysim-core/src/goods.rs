//! Goods logistics: industrial supply routed to commercial demand over the
//! road grid, with import/export fallback at the map edge. Shares its
//! routing machinery with [`crate::traffic`] (multi-source Dijkstra,
//! congestion re-weighting) but assigns a bounded supply rather than a
//! headcount, and must conserve `produced = delivered_internal + exported`.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::config::GoodsConfig;
use crate::roads::ZoneAccessMap;
use crate::tile::Overlay;
use crate::traffic::road_tile_capacity;
use crate::world::World;

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct GoodsResult {
    pub road_goods_traffic: Vec<u32>,
    pub max_road_goods_traffic: u32,
    pub goods_produced: i32,
    pub goods_demand: i32,
    pub goods_delivered: i32,
    pub goods_imported: i32,
    pub goods_exported: i32,
    pub unreachable_demand: i32,
    pub satisfaction: f32,
}

struct Anchor {
    tile_index: usize,
    capacity: i64,
}

fn collect_industrial_anchors(world: &World, zone_access: &ZoneAccessMap) -> Vec<Anchor> {
    let mut by_road: BTreeMap<usize, i64> = BTreeMap::new();
    for (idx, tile) in world.zone_tiles() {
        if tile.overlay != Overlay::Industrial {
            continue;
        }
        if let Some(road_idx) = zone_access.road_for(idx) {
            *by_road.entry(road_idx).or_insert(0) += tile.occupant_capacity() as i64;
        }
    }
    by_road
        .into_iter()
        .map(|(tile_index, capacity)| Anchor { tile_index, capacity })
        .collect()
}

fn collect_commercial_anchors(world: &World, zone_access: &ZoneAccessMap) -> Vec<Anchor> {
    let mut by_road: BTreeMap<usize, i64> = BTreeMap::new();
    for (idx, tile) in world.zone_tiles() {
        if tile.overlay != Overlay::Commercial {
            continue;
        }
        if let Some(road_idx) = zone_access.road_for(idx) {
            *by_road.entry(road_idx).or_insert(0) += tile.occupants as i64;
        }
    }
    by_road
        .into_iter()
        .map(|(tile_index, capacity)| Anchor { tile_index, capacity })
        .collect()
}

const DIRS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// Dijkstra from `sources`, same tie-break contract as the commute
/// assignment: `(cost, source_index, tile_index)`.
fn shortest_paths_from(
    world: &World,
    sources: &[Anchor],
) -> (Vec<i64>, Vec<i32>, Vec<i32>) {
    let n = world.tile_count();
    let mut dist = vec![i64::MAX; n];
    let mut parent = vec![-1i32; n];
    let mut source_of = vec![-1i32; n];
    let mut heap: std::collections::BinaryHeap<Reverse<(i64, i32, usize, i32)>> =
        std::collections::BinaryHeap::new();

    for (src_idx, anchor) in sources.iter().enumerate() {
        heap.push(Reverse((0, src_idx as i32, anchor.tile_index, -1)));
    }

    while let Some(Reverse((cost, src_idx, idx, from))) = heap.pop() {
        if dist[idx] != i64::MAX {
            continue;
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
            let step_cost = world.tile_at_index(nidx).travel_time_milli() as i64;
            heap.push(Reverse((cost + step_cost, src_idx, nidx, idx as i32)));
        }
    }

    (dist, parent, source_of)
}

/// Compute goods flow per spec §4.6. Infallible; zeroed result when the
/// world has no industrial supply and no commercial demand.
pub fn compute_goods_flow(world: &World, cfg: &GoodsConfig, zone_access: &ZoneAccessMap) -> GoodsResult {
    let n = world.tile_count();
    let industrial = collect_industrial_anchors(world, zone_access);
    let commercial = collect_commercial_anchors(world, zone_access);

    let goods_produced: i64 = industrial.iter().map(|a| a.capacity).sum();
    let goods_demand: i64 = commercial.iter().map(|a| a.capacity).sum();

    let mut road_goods_traffic = vec![0u64; n];
    let mut remaining_supply: Vec<i64> = industrial.iter().map(|a| a.capacity).collect();
    let mut delivered_internal: i64 = 0;
    // Demand still unmet after the domestic pass, per commercial anchor.
    let mut leftover: Vec<(usize, i64)> = commercial.iter().map(|a| (a.tile_index, a.capacity)).collect();

    if !industrial.is_empty() && !commercial.is_empty() {
        let (dist, parent, source_of) = shortest_paths_from(world, &industrial);

        // Serve nearest-consumer-first so exhaustion is deterministic and
        // independent of the anchors' original map-scan order.
        let mut order: Vec<usize> = (0..commercial.len()).collect();
        order.sort_by_key(|&i| (dist[commercial[i].tile_index], commercial[i].tile_index));

        for i in order {
            let anchor = &commercial[i];
            let idx = anchor.tile_index;
            if dist[idx] == i64::MAX {
                continue; // leftover entry stays at full demand, unreachable
            }
            let src = source_of[idx];
            if src < 0 {
                continue;
            }
            let delivered_amt = remaining_supply[src as usize].min(anchor.capacity);
            if delivered_amt <= 0 {
                continue;
            }
            remaining_supply[src as usize] -= delivered_amt;
            delivered_internal += delivered_amt;
            leftover[i].1 -= delivered_amt;

            let mut cur = idx as i32;
            while cur >= 0 {
                let cidx = cur as usize;
                road_goods_traffic[cidx] = road_goods_traffic[cidx].saturating_add(delivered_amt as u64);
                cur = parent[cidx];
            }
        }
    }

    // Imports: serve leftover demand up to a capacity budget. Lowest tile
    // index first for determinism (the import source is the abstract map
    // edge, not a concrete anchor, so there is no distance to sort by).
    leftover.sort_by_key(|&(idx, _)| idx);
    let import_budget = if cfg.allow_imports {
        ((goods_demand as f64) * (cfg.import_capacity_pct as f64) / 100.0).round() as i64
    } else {
        0
    };
    let mut goods_imported = 0i64;
    let mut unreachable_demand = 0i64;
    let mut import_remaining = import_budget;
    for &(_, unmet) in &leftover {
        if unmet <= 0 {
            continue;
        }
        let take = unmet.min(import_remaining.max(0));
        goods_imported += take;
        import_remaining -= take;
        unreachable_demand += unmet - take;
    }

    let delivered_total = delivered_internal + goods_imported;

    // Export: anything produced but not delivered locally is exported when
    // exports are enabled, up to `export_capacity_pct` of production; any
    // leftover beyond that cap goes unsold (documented in DESIGN.md as the
    // resolution of spec.md's open question on import/export fallback).
    let unsold_supply: i64 = remaining_supply.iter().sum();
    let export_budget = if cfg.allow_exports {
        ((goods_produced as f64) * (cfg.export_capacity_pct as f64) / 100.0).round() as i64
    } else {
        0
    };
    let goods_exported = unsold_supply.min(export_budget).max(0);

    let road_goods_traffic_u32: Vec<u32> = road_goods_traffic
        .iter()
        .map(|&v| v.min(u32::MAX as u64) as u32)
        .collect();
    let max_road_goods_traffic = road_goods_traffic_u32.iter().copied().max().unwrap_or(0);

    let satisfaction = if goods_demand == 0 {
        1.0
    } else {
        (delivered_total as f32 / goods_demand as f32).clamp(0.0, 1.0)
    };

    GoodsResult {
        road_goods_traffic: road_goods_traffic_u32,
        max_road_goods_traffic,
        goods_produced: goods_produced as i32,
        goods_demand: goods_demand as i32,
        goods_delivered: delivered_total as i32,
        goods_imported: goods_imported as i32,
        goods_exported: goods_exported as i32,
        unreachable_demand: unreachable_demand as i32,
        satisfaction,
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
    fn no_demand_yields_full_satisfaction_and_zero_traffic() {
        let w = line_world(5);
        let zam = build_zone_access_map(&w, None);
        let result = compute_goods_flow(&w, &GoodsConfig::default(), &zam);
        assert_eq!(result.goods_demand, 0);
        assert_eq!(result.satisfaction, 1.0);
        assert!(result.road_goods_traffic.iter().all(|&v| v == 0));
    }

    #[test]
    fn local_supply_meets_local_demand_without_import() {
        let mut w = line_world(5);
        w.at_mut(0, 0).overlay = Overlay::Industrial;
        w.at_mut(4, 0).overlay = Overlay::Commercial;
        w.at_mut(4, 0).occupants = 1;
        let zam = build_zone_access_map(&w, None);
        let mut cfg = GoodsConfig::default();
        cfg.allow_imports = false;
        let result = compute_goods_flow(&w, &cfg, &zam);
        assert!(result.goods_delivered > 0);
        assert_eq!(result.goods_imported, 0);
        assert!(result.road_goods_traffic.iter().sum::<u32>() > 0);
    }

    #[test]
    fn unreachable_demand_falls_back_to_import_when_allowed() {
        let mut w = World::new(5, 3, 1);
        w.at_mut(4, 2).overlay = Overlay::Commercial;
        w.at_mut(4, 2).occupants = 1;
        w.at_mut(3, 2).overlay = Overlay::Road;
        let zam = build_zone_access_map(&w, None);
        let mut cfg = GoodsConfig::default();
        cfg.import_capacity_pct = 100;
        let result = compute_goods_flow(&w, &cfg, &zam);
        assert_eq!(result.goods_produced, 0);
        assert!(result.goods_imported > 0);
        assert_eq!(result.unreachable_demand, 0);
    }

    #[test]
    fn production_conserves_into_delivered_plus_exported() {
        let mut w = line_world(5);
        w.at_mut(0, 0).overlay = Overlay::Industrial;
        w.at_mut(4, 0).overlay = Overlay::Commercial;
        w.at_mut(4, 0).occupants = 0; // no demand at all, all supply unsold
        let zam = build_zone_access_map(&w, None);
        let mut cfg = GoodsConfig::default();
        cfg.export_capacity_pct = 100;
        let result = compute_goods_flow(&w, &cfg, &zam);
        assert_eq!(result.goods_delivered + result.goods_exported, result.goods_produced);
    }
}
