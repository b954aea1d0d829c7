//! Greedy road-upgrade planner: pick which road-graph edges to upgrade
//! (street → avenue → highway) under a money budget, ranked by
//! benefit/cost ratio. Ported from `RoadUpgradePlanner.cpp`; `Road.hpp`'s
//! placement-cost table wasn't in the retrieved source, so
//! [`road_placement_cost`] is this crate's own reconstruction from the
//! `15 + 20*level` upgrade-cost shape already used for building levels
//! (see §4.9.1), scaled per level-step and doubled over water (documented
//! in DESIGN.md).

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::roads::graph::{Point, RoadGraph};
use crate::tile::{bridge_travel_time_milli_for_level, cap_for_level, road_travel_time_milli_for_level, Terrain};
use crate::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum RoadUpgradeObjective {
    Congestion,
    Time,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct RoadUpgradePlannerConfig {
    pub base_tile_capacity: i32,
    pub use_road_level_capacity: bool,
    /// When `false`, edges longer than 2 tiles are evaluated on their
    /// interior only, so adjacent edges sharing a node don't double-bid
    /// on the same upgrade.
    pub upgrade_endpoints: bool,
    pub max_target_level: u8,
    /// Only consider edges whose current max utilization is at least this
    /// (0 disables the filter).
    pub min_util_consider: f64,
    pub objective: RoadUpgradeObjective,
    pub hybrid_excess_weight: f64,
    pub hybrid_time_weight: f64,
    /// Negative = unlimited. Zero = report only, select nothing.
    pub budget: i32,
}

impl Default for RoadUpgradePlannerConfig {
    fn default() -> Self {
        Self {
            base_tile_capacity: 28,
            use_road_level_capacity: true,
            upgrade_endpoints: false,
            max_target_level: 3,
            min_util_consider: 1.0,
            objective: RoadUpgradeObjective::Congestion,
            hybrid_excess_weight: 1.0,
            hybrid_time_weight: 1.0,
            budget: -1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct RoadUpgradeEdge {
    pub edge_index: i32,
    pub a: i32,
    pub b: i32,
    pub target_level: u8,
    pub cost: i32,
    pub time_saved: u64,
    pub excess_reduced: u64,
    pub tile_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct RoadUpgradePlan {
    pub w: i32,
    pub h: i32,
    pub total_cost: i32,
    pub total_time_saved: u64,
    pub total_excess_reduced: u64,
    pub edges: Vec<RoadUpgradeEdge>,
    /// Per-tile target level, `0` meaning "no change".
    pub tile_target_level: Vec<u8>,
}

fn clamp_level(level: i32) -> u8 {
    level.clamp(1, 3) as u8
}

/// Reconstruction of the original's placement-cost table: a flat cost per
/// level-step upgraded, doubled for bridges (water-crossing roads cost
/// more to build in every other part of this source, e.g. maintenance).
pub fn road_placement_cost(from_level: u8, to_level: u8, is_bridge: bool) -> i32 {
    if to_level <= from_level {
        return 0;
    }
    let steps: i32 = (to_level as i32) - (from_level as i32);
    let mut cost = 0;
    for step in 0..steps {
        let target = from_level as i32 + step + 1;
        cost += 15 + 20 * target;
    }
    if is_bridge {
        cost *= 2;
    }
    cost
}

fn capacity_for_level(base_cap: i32, level: u8, use_road_levels: bool) -> i32 {
    let base = base_cap.max(1);
    if !use_road_levels {
        base
    } else {
        cap_for_level(base, clamp_level(level as i32)).max(1)
    }
}

fn travel_time_for_tile(is_bridge: bool, level: u8) -> u32 {
    let lvl = clamp_level(level as i32);
    if is_bridge {
        bridge_travel_time_milli_for_level(lvl)
    } else {
        road_travel_time_milli_for_level(lvl)
    }
}

struct EvalResult {
    cost: i32,
    time_saved: u64,
    excess_reduced: u64,
}

fn evaluate_upgrade(
    world: &World,
    tiles: &[Point],
    target_level: u8,
    flow: &[u32],
    base_cap: i32,
    use_road_levels: bool,
    planned_levels: Option<&[u8]>,
) -> EvalResult {
    let mut r = EvalResult { cost: 0, time_saved: 0, excess_reduced: 0 };
    let tgt = clamp_level(target_level as i32);

    for &p in tiles {
        if !world.in_bounds(p.x, p.y) {
            continue;
        }
        let t = world.at(p.x, p.y);
        if !t.is_road() {
            continue;
        }
        let idx = world.index(p.x, p.y);

        let cur_lvl = clamp_level(t.level as i32);
        let mut base_lvl = cur_lvl;
        if let Some(planned) = planned_levels {
            if idx < planned.len() && planned[idx] != 0 {
                base_lvl = base_lvl.max(clamp_level(planned[idx] as i32));
            }
        }
        if base_lvl >= tgt {
            continue;
        }

        let is_bridge = t.terrain == Terrain::Water;
        r.cost += road_placement_cost(base_lvl, tgt, is_bridge);

        let v = flow.get(idx).copied().unwrap_or(0).min(i32::MAX as u32) as i32;
        let old_cap = capacity_for_level(base_cap, base_lvl, use_road_levels);
        let new_cap = capacity_for_level(base_cap, tgt, use_road_levels);
        let old_excess = (v - old_cap).max(0);
        let new_excess = (v - new_cap).max(0);
        r.excess_reduced += (old_excess - new_excess).max(0) as u64;

        let old_time = travel_time_for_tile(is_bridge, base_lvl);
        let new_time = travel_time_for_tile(is_bridge, tgt);
        if old_time > new_time && v > 0 {
            r.time_saved += v as u64 * (old_time - new_time) as u64;
        }
    }

    r
}

fn benefit_score(cfg: &RoadUpgradePlannerConfig, r: &EvalResult) -> f64 {
    match cfg.objective {
        RoadUpgradeObjective::Congestion => r.excess_reduced as f64,
        RoadUpgradeObjective::Time => r.time_saved as f64,
        RoadUpgradeObjective::Hybrid => {
            cfg.hybrid_excess_weight * r.excess_reduced as f64 + cfg.hybrid_time_weight * r.time_saved as f64
        }
    }
}

struct Candidate {
    edge_index: i32,
    a: i32,
    b: i32,
    target_level: u8,
    ratio: f64,
    benefit: f64,
    base_cost: i32,
    tiles: Vec<Point>,
}

fn edge_tiles_for(edge_tiles: &[Point], upgrade_endpoints: bool) -> Vec<Point> {
    if upgrade_endpoints || edge_tiles.len() <= 2 {
        edge_tiles.to_vec()
    } else {
        edge_tiles[1..edge_tiles.len() - 1].to_vec()
    }
}

fn tile_util(world: &World, p: Point, road_flow: &[u32], base_cap: i32, use_road_levels: bool) -> f64 {
    if !world.in_bounds(p.x, p.y) {
        return 0.0;
    }
    let t = world.at(p.x, p.y);
    if !t.is_road() {
        return 0.0;
    }
    let idx = world.index(p.x, p.y);
    let v = road_flow.get(idx).copied().unwrap_or(0).min(1_000_000) as i32;
    let cap = capacity_for_level(base_cap, t.level, use_road_levels);
    if cap <= 0 {
        0.0
    } else {
        v as f64 / cap as f64
    }
}

/// Plan road upgrades under `cfg.budget`, given a per-tile flow map
/// (commuter traffic, goods traffic, or a combined heatmap).
pub fn plan_road_upgrades(
    world: &World,
    g: &RoadGraph,
    road_flow: &[u32],
    cfg: RoadUpgradePlannerConfig,
) -> RoadUpgradePlan {
    let w = world.width;
    let h = world.height;
    let n = world.tile_count();
    let mut plan = RoadUpgradePlan {
        w,
        h,
        total_cost: 0,
        total_time_saved: 0,
        total_excess_reduced: 0,
        edges: Vec::new(),
        tile_target_level: vec![0u8; n],
    };
    if w <= 0 || h <= 0 || road_flow.len() != n {
        return plan;
    }

    let base_cap = cfg.base_tile_capacity.max(1);
    let use_road_levels = cfg.use_road_level_capacity;
    let max_level = clamp_level(cfg.max_target_level as i32);

    let mut candidates: Vec<Candidate> = Vec::new();

    for (ei, edge) in g.edges.iter().enumerate() {
        let tiles = edge_tiles_for(&edge.tiles, cfg.upgrade_endpoints);
        if tiles.is_empty() {
            continue;
        }

        let max_util = tiles
            .iter()
            .map(|&p| tile_util(world, p, road_flow, base_cap, use_road_levels))
            .fold(0.0f64, f64::max);
        if cfg.min_util_consider > 0.0 && max_util < cfg.min_util_consider {
            continue;
        }

        for tgt in 2..=max_level {
            let base_eval = evaluate_upgrade(world, &tiles, tgt, road_flow, base_cap, use_road_levels, None);
            if base_eval.cost <= 0 {
                continue;
            }
            let benefit = benefit_score(&cfg, &base_eval);
            if benefit <= 0.0 {
                continue;
            }
            candidates.push(Candidate {
                edge_index: ei as i32,
                a: edge.a,
                b: edge.b,
                target_level: tgt,
                base_cost: base_eval.cost,
                ratio: benefit / base_eval.cost.max(1) as f64,
                benefit,
                tiles: tiles.clone(),
            });
        }
    }

    candidates.sort_by(|a, b| {
        b.ratio
            .partial_cmp(&a.ratio)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.benefit.partial_cmp(&a.benefit).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| a.base_cost.cmp(&b.base_cost))
            .then_with(|| a.edge_index.cmp(&b.edge_index))
            .then_with(|| a.target_level.cmp(&b.target_level))
    });

    let budget = cfg.budget;
    let mut edge_chosen = vec![false; g.edges.len()];

    for c in &candidates {
        if c.edge_index < 0 || c.edge_index as usize >= edge_chosen.len() {
            continue;
        }
        if edge_chosen[c.edge_index as usize] {
            continue;
        }

        let inc = evaluate_upgrade(
            world,
            &c.tiles,
            c.target_level,
            road_flow,
            base_cap,
            use_road_levels,
            Some(&plan.tile_target_level),
        );
        if inc.cost <= 0 {
            continue;
        }
        let inc_benefit = benefit_score(&cfg, &inc);
        if inc_benefit <= 0.0 {
            continue;
        }
        if budget >= 0 && plan.total_cost + inc.cost > budget {
            continue;
        }

        edge_chosen[c.edge_index as usize] = true;
        plan.total_cost += inc.cost;
        plan.total_time_saved += inc.time_saved;
        plan.total_excess_reduced += inc.excess_reduced;

        for &p in &c.tiles {
            if !world.in_bounds(p.x, p.y) {
                continue;
            }
            let idx = world.index(p.x, p.y);
            plan.tile_target_level[idx] = plan.tile_target_level[idx].max(c.target_level);
        }

        plan.edges.push(RoadUpgradeEdge {
            edge_index: c.edge_index,
            a: c.a,
            b: c.b,
            target_level: c.target_level,
            cost: inc.cost,
            time_saved: inc.time_saved,
            excess_reduced: inc.excess_reduced,
            tile_count: c.tiles.len() as i32,
        });

        if budget == 0 {
            break;
        }
    }

    plan.edges.sort_by(|a, b| a.edge_index.cmp(&b.edge_index).then_with(|| a.target_level.cmp(&b.target_level)));
    plan
}

/// Apply `plan.tile_target_level` to `world`, never downgrading a tile,
/// and refresh road masks. Does not charge money.
pub fn apply_road_upgrade_plan(world: &mut World, plan: &RoadUpgradePlan) {
    let w = world.width;
    let h = world.height;
    if w <= 0 || h <= 0 || plan.w != w || plan.h != h {
        return;
    }
    let n = world.tile_count();
    if plan.tile_target_level.len() != n {
        return;
    }

    for idx in 0..n {
        let tgt = plan.tile_target_level[idx];
        if tgt == 0 {
            continue;
        }
        let (x, y) = world.xy(idx);
        let tile = world.at_mut(x, y);
        if !tile.is_road() {
            continue;
        }
        let cur = clamp_level(tile.level as i32);
        tile.level = cur.max(clamp_level(tgt as i32));
    }

    world.recompute_road_masks();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roads::build_road_graph;
    use crate::tile::Overlay;

    fn line_world(len: i32) -> World {
        let mut w = World::new(len, 1, 1);
        for x in 0..len {
            w.at_mut(x, 0).overlay = Overlay::Road;
        }
        w
    }

    #[test]
    fn congested_edge_gets_selected_under_ample_budget() {
        let w = line_world(5);
        let g = build_road_graph(&w);
        let mut flow = vec![0u32; w.tile_count()];
        for x in 0..5 {
            flow[w.index(x, 0)] = 1000;
        }
        let cfg = RoadUpgradePlannerConfig::default();
        let plan = plan_road_upgrades(&w, &g, &flow, cfg);
        assert!(!plan.edges.is_empty());
        assert!(plan.tile_target_level.iter().any(|&l| l > 0));
    }

    #[test]
    fn zero_budget_selects_nothing() {
        let w = line_world(5);
        let g = build_road_graph(&w);
        let mut flow = vec![0u32; w.tile_count()];
        for x in 0..5 {
            flow[w.index(x, 0)] = 1000;
        }
        let mut cfg = RoadUpgradePlannerConfig::default();
        cfg.budget = 0;
        let plan = plan_road_upgrades(&w, &g, &flow, cfg);
        assert!(plan.edges.is_empty());
        assert_eq!(plan.total_cost, 0);
    }

    #[test]
    fn low_utilization_edge_is_not_considered() {
        let w = line_world(5);
        let g = build_road_graph(&w);
        let flow = vec![0u32; w.tile_count()];
        let cfg = RoadUpgradePlannerConfig::default();
        let plan = plan_road_upgrades(&w, &g, &flow, cfg);
        assert!(plan.edges.is_empty());
    }

    #[test]
    fn apply_plan_never_downgrades_a_tile() {
        let mut w = line_world(3);
        w.at_mut(0, 0).level = 3;
        let g = build_road_graph(&w);
        let mut flow = vec![0u32; w.tile_count()];
        for x in 0..3 {
            flow[w.index(x, 0)] = 1000;
        }
        let plan = plan_road_upgrades(&w, &g, &flow, RoadUpgradePlannerConfig::default());
        apply_road_upgrade_plan(&mut w, &plan);
        assert_eq!(w.at(0, 0).level, 3);
    }
}
