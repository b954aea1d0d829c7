//! Aggregate a per-tile traffic/flow heatmap onto a compressed [`RoadGraph`],
//! for bottleneck ranking and smaller exported visualizations. Ported from
//! `RoadGraphTraffic.hpp`/`.cpp`: node stats read the node's own tile, edge
//! stats fold over the edge's tile run with All/Interior variants (interior
//! excludes the two endpoint tiles, so adjacent edges don't double-count a
//! shared node's traffic).

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::roads::graph::{Point, RoadGraph};
use crate::tile::cap_for_level;
use crate::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct RoadGraphTrafficConfig {
    pub base_tile_capacity: i32,
    pub use_road_level_capacity: bool,
}

impl Default for RoadGraphTrafficConfig {
    fn default() -> Self {
        Self {
            base_tile_capacity: 28,
            use_road_level_capacity: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct RoadGraphTrafficNodeStats {
    pub pos: Point,
    pub degree: i32,

    pub traffic: i32,
    pub capacity: i32,
    pub util: f64,

    pub incident_sum_traffic: u64,
    pub incident_max_util: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct RoadGraphTrafficEdgeStats {
    pub a: i32,
    pub b: i32,

    pub length: i32,
    pub tile_count: i32,
    pub interior_tile_count: i32,

    pub sum_traffic_all: u64,
    pub max_traffic_all: i32,
    pub sum_capacity_all: u64,
    pub min_capacity_all: i32,
    pub max_capacity_all: i32,
    pub sum_util_all: f64,
    pub max_util_all: f64,
    pub congested_tiles_all: i32,
    pub excess_traffic_all: u64,

    pub sum_traffic_interior: u64,
    pub max_traffic_interior: i32,
    pub sum_capacity_interior: u64,
    pub min_capacity_interior: i32,
    pub max_capacity_interior: i32,
    pub sum_util_interior: f64,
    pub max_util_interior: f64,
    pub congested_tiles_interior: i32,
    pub excess_traffic_interior: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct RoadGraphTrafficResult {
    pub w: i32,
    pub h: i32,
    pub cfg: Option<RoadGraphTrafficConfig>,
    pub nodes: Vec<RoadGraphTrafficNodeStats>,
    pub edges: Vec<RoadGraphTrafficEdgeStats>,
}

fn tile_capacity(world: &World, p: Point, cfg: &RoadGraphTrafficConfig) -> i32 {
    let idx = world.index(p.x, p.y);
    let tile = world.tile_at_index(idx);
    if !tile.is_road() {
        return 0;
    }
    if cfg.use_road_level_capacity {
        cap_for_level(cfg.base_tile_capacity, tile.level)
    } else {
        cfg.base_tile_capacity
    }
}

fn tile_traffic(road_flow: &[u32], world: &World, p: Point) -> i32 {
    let idx = world.index(p.x, p.y);
    road_flow[idx].min(i32::MAX as u32) as i32
}

/// Aggregate a generic per-tile road flow map (vehicles/day) onto `g`.
/// `road_flow` must have `world.width()*world.height()` entries, indexed
/// `y*w+x` the same way as [`crate::traffic::TrafficResult::road_traffic`].
pub fn aggregate_flow_on_road_graph(
    world: &World,
    g: &RoadGraph,
    road_flow: &[u32],
    cfg: RoadGraphTrafficConfig,
) -> RoadGraphTrafficResult {
    let mut nodes = Vec::with_capacity(g.nodes.len());
    for node in &g.nodes {
        let traffic = tile_traffic(road_flow, world, node.pos);
        let capacity = tile_capacity(world, node.pos, &cfg);
        let util = if capacity > 0 { traffic as f64 / capacity as f64 } else { 0.0 };
        nodes.push(RoadGraphTrafficNodeStats {
            pos: node.pos,
            degree: node.edges.len() as i32,
            traffic,
            capacity,
            util,
            incident_sum_traffic: 0,
            incident_max_util: 0.0,
        });
    }

    let mut edges = Vec::with_capacity(g.edges.len());
    for edge in &g.edges {
        let tile_count = edge.tiles.len() as i32;
        let interior_tile_count = (tile_count - 2).max(0);

        let mut sum_traffic_all = 0u64;
        let mut max_traffic_all = 0i32;
        let mut sum_capacity_all = 0u64;
        let mut min_capacity_all = i32::MAX;
        let mut max_capacity_all = 0i32;
        let mut sum_util_all = 0.0f64;
        let mut max_util_all = 0.0f64;
        let mut congested_tiles_all = 0i32;
        let mut excess_traffic_all = 0u64;

        let mut sum_traffic_interior = 0u64;
        let mut max_traffic_interior = 0i32;
        let mut sum_capacity_interior = 0u64;
        let mut min_capacity_interior = i32::MAX;
        let mut max_capacity_interior = 0i32;
        let mut sum_util_interior = 0.0f64;
        let mut max_util_interior = 0.0f64;
        let mut congested_tiles_interior = 0i32;
        let mut excess_traffic_interior = 0u64;

        for (i, &p) in edge.tiles.iter().enumerate() {
            let traffic = tile_traffic(road_flow, world, p);
            let capacity = tile_capacity(world, p, &cfg);
            let util = if capacity > 0 { traffic as f64 / capacity as f64 } else { 0.0 };
            let excess = (traffic - capacity).max(0) as u64;
            let congested = traffic > capacity;

            sum_traffic_all += traffic as u64;
            max_traffic_all = max_traffic_all.max(traffic);
            sum_capacity_all += capacity as u64;
            min_capacity_all = min_capacity_all.min(capacity);
            max_capacity_all = max_capacity_all.max(capacity);
            sum_util_all += util;
            max_util_all = max_util_all.max(util);
            if congested {
                congested_tiles_all += 1;
            }
            excess_traffic_all += excess;

            let is_interior = i > 0 && i < edge.tiles.len() - 1;
            if is_interior {
                sum_traffic_interior += traffic as u64;
                max_traffic_interior = max_traffic_interior.max(traffic);
                sum_capacity_interior += capacity as u64;
                min_capacity_interior = min_capacity_interior.min(capacity);
                max_capacity_interior = max_capacity_interior.max(capacity);
                sum_util_interior += util;
                max_util_interior = max_util_interior.max(util);
                if congested {
                    congested_tiles_interior += 1;
                }
                excess_traffic_interior += excess;
            }
        }

        if min_capacity_all == i32::MAX {
            min_capacity_all = 0;
        }
        if min_capacity_interior == i32::MAX {
            min_capacity_interior = 0;
        }

        edges.push(RoadGraphTrafficEdgeStats {
            a: edge.a,
            b: edge.b,
            length: edge.length,
            tile_count,
            interior_tile_count,
            sum_traffic_all,
            max_traffic_all,
            sum_capacity_all,
            min_capacity_all,
            max_capacity_all,
            sum_util_all,
            max_util_all,
            congested_tiles_all,
            excess_traffic_all,
            sum_traffic_interior,
            max_traffic_interior,
            sum_capacity_interior,
            min_capacity_interior,
            max_capacity_interior,
            sum_util_interior,
            max_util_interior,
            congested_tiles_interior,
            excess_traffic_interior,
        });
    }

    // Fold interior edge stats back onto their endpoint nodes so a node's
    // incident fields summarize nearby congestion without re-reading every
    // edge from the caller side.
    for (edge, stats) in g.edges.iter().zip(edges.iter()) {
        for &node_id in [edge.a, edge.b].iter() {
            if node_id < 0 {
                continue;
            }
            let n = &mut nodes[node_id as usize];
            n.incident_sum_traffic += stats.sum_traffic_interior;
            n.incident_max_util = n.incident_max_util.max(stats.max_util_interior);
        }
    }

    RoadGraphTrafficResult {
        w: world.width,
        h: world.height,
        cfg: Some(cfg),
        nodes,
        edges,
    }
}

/// Aggregate [`crate::traffic::TrafficResult::road_traffic`] onto `g`.
pub fn aggregate_traffic_on_road_graph(
    world: &World,
    g: &RoadGraph,
    traffic: &crate::traffic::TrafficResult,
    cfg: RoadGraphTrafficConfig,
) -> RoadGraphTrafficResult {
    aggregate_flow_on_road_graph(world, g, &traffic.road_traffic, cfg)
}
