//! Deterministic bus-line heuristic over the compressed road graph. Not a
//! full transit network design solver — greedily lays down lines along
//! high-demand corridors, consuming a fraction of the demand it covers so
//! later lines spread out. Ported from `TransitPlanner.cpp`'s shape.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::roads::graph::{Point, RoadGraph};
use crate::tile::road_travel_time_milli_for_level;
use crate::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum TransitEdgeWeightMode {
    Steps,
    TravelTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct TransitPlannerConfig {
    pub max_lines: i32,
    pub endpoint_candidates: i32,
    pub weight_mode: TransitEdgeWeightMode,
    /// Demand-biased edges get a cost multiplier in `[1, 1+demand_bias]` —
    /// lower for high remaining demand.
    pub demand_bias: f64,
    pub max_detour: f64,
    pub cover_fraction: f64,
    pub min_edge_demand: u64,
    pub min_line_demand: u64,
}

impl Default for TransitPlannerConfig {
    fn default() -> Self {
        Self {
            max_lines: 8,
            endpoint_candidates: 24,
            weight_mode: TransitEdgeWeightMode::TravelTime,
            demand_bias: 2.5,
            max_detour: 1.6,
            cover_fraction: 0.7,
            min_edge_demand: 1,
            min_line_demand: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct TransitLine {
    pub id: i32,
    pub nodes: Vec<i32>,
    pub edges: Vec<i32>,
    pub sum_demand: u64,
    pub base_cost: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct TransitPlan {
    pub total_demand: u64,
    pub covered_demand: u64,
    pub lines: Vec<TransitLine>,
}

fn base_edge_weight(g: &RoadGraph, world: Option<&World>, edge_idx: usize, mode: TransitEdgeWeightMode) -> u64 {
    let edge = &g.edges[edge_idx];
    match mode {
        TransitEdgeWeightMode::Steps => edge.length.max(1) as u64,
        TransitEdgeWeightMode::TravelTime => match world {
            Some(w) => edge
                .tiles
                .iter()
                .map(|&p| {
                    if w.in_bounds(p.x, p.y) {
                        road_travel_time_milli_for_level(w.at(p.x, p.y).level) as u64
                    } else {
                        0
                    }
                })
                .sum(),
            None => (edge.length.max(1) as u64) * 1000,
        },
    }
}

/// Shortest path from `start` to every other node via weighted Dijkstra
/// over `g`'s edges, where edge cost is `base * (1 + demand_bias * (1 -
/// remaining[e]/max_remaining))` — corridors with more remaining demand
/// are cheaper to traverse, biasing the line toward high-demand streets.
fn weighted_shortest_paths(
    g: &RoadGraph,
    base_cost: &[u64],
    remaining_demand: &[u64],
    max_remaining: u64,
    demand_bias: f64,
    min_edge_demand: u64,
    start: usize,
) -> (Vec<u64>, Vec<i32>, Vec<i32>) {
    let n = g.nodes.len();
    let mut dist = vec![u64::MAX; n];
    let mut parent_node = vec![-1i32; n];
    let mut parent_edge = vec![-1i32; n];
    let mut heap: BinaryHeap<Reverse<(u64, usize)>> = BinaryHeap::new();

    dist[start] = 0;
    heap.push(Reverse((0, start)));

    while let Some(Reverse((d, u))) = heap.pop() {
        if d != dist[u] {
            continue;
        }
        for &edge_idx in &g.nodes[u].edges {
            let edge = &g.edges[edge_idx as usize];
            let v = if edge.a as usize == u { edge.b } else { edge.a };
            if v < 0 {
                continue;
            }
            let v = v as usize;

            let demand = remaining_demand[edge_idx as usize];
            let factor = if max_remaining > 0 && demand >= min_edge_demand {
                1.0 + demand_bias * (demand as f64 / max_remaining as f64)
            } else {
                1.0 + demand_bias
            };
            // Higher demand -> lower multiplier (cheaper to route through).
            let mult = (1.0 + demand_bias) - (factor - 1.0);
            let weight = ((base_cost[edge_idx as usize] as f64) * mult.max(1.0)).round() as u64;

            let nd = d.saturating_add(weight);
            if nd < dist[v] {
                dist[v] = nd;
                parent_node[v] = u as i32;
                parent_edge[v] = edge_idx;
                heap.push(Reverse((nd, v)));
            }
        }
    }

    (dist, parent_node, parent_edge)
}

/// Plan up to `cfg.max_lines` bus lines over `g`, given remaining demand
/// per edge (parallel to `g.edges`). `world` supplies per-tile travel
/// times when `cfg.weight_mode == TravelTime`; without it, steps are
/// approximated at 1000ms each.
pub fn plan_transit_lines(
    g: &RoadGraph,
    edge_demand: &[u64],
    cfg: &TransitPlannerConfig,
    world: Option<&World>,
) -> TransitPlan {
    let total_demand: u64 = edge_demand.iter().sum();
    let mut plan = TransitPlan {
        total_demand,
        covered_demand: 0,
        lines: Vec::new(),
    };
    if g.edges.is_empty() || edge_demand.len() != g.edges.len() || cfg.max_lines <= 0 {
        return plan;
    }

    let base_cost: Vec<u64> = (0..g.edges.len()).map(|i| base_edge_weight(g, world, i, cfg.weight_mode)).collect();
    let mut remaining: Vec<u64> = edge_demand.to_vec();

    // Endpoint candidates: nodes incident to the highest-demand edges,
    // deterministically ordered by (demand desc, node index asc).
    let mut node_demand = vec![0u64; g.nodes.len()];
    for (i, edge) in g.edges.iter().enumerate() {
        let d = edge_demand[i];
        if edge.a >= 0 {
            node_demand[edge.a as usize] += d;
        }
        if edge.b >= 0 {
            node_demand[edge.b as usize] += d;
        }
    }
    let mut candidates: Vec<usize> = (0..g.nodes.len()).collect();
    candidates.sort_by_key(|&n| (Reverse(node_demand[n]), n));
    candidates.truncate(cfg.endpoint_candidates.max(0) as usize);

    let mut next_line_id = 0i32;

    for _ in 0..cfg.max_lines {
        let max_remaining = remaining.iter().copied().max().unwrap_or(0);
        if max_remaining == 0 {
            break;
        }

        let mut best: Option<(u64, usize, usize, Vec<i32>, Vec<i32>, u64)> = None;

        for &start in &candidates {
            let (dist, parent_node, parent_edge) = weighted_shortest_paths(
                g,
                &base_cost,
                &remaining,
                max_remaining,
                cfg.demand_bias,
                cfg.min_edge_demand,
                start,
            );

            for &end in &candidates {
                if end <= start {
                    continue;
                }
                if dist[end] == u64::MAX {
                    continue;
                }

                // Reconstruct path edges/nodes.
                let mut nodes_path = vec![end as i32];
                let mut edges_path = Vec::new();
                let mut cur = end;
                while cur != start {
                    let pe = parent_edge[cur];
                    let pn = parent_node[cur];
                    if pe < 0 || pn < 0 {
                        break;
                    }
                    edges_path.push(pe);
                    nodes_path.push(pn);
                    cur = pn as usize;
                }
                if cur != start {
                    continue; // disconnected / malformed reconstruction
                }
                nodes_path.reverse();
                edges_path.reverse();

                let sum_demand: u64 = edges_path.iter().map(|&e| remaining[e as usize]).sum();
                if sum_demand < cfg.min_line_demand {
                    continue;
                }

                let shortest_base: u64 = edges_path.iter().map(|&e| base_cost[e as usize]).sum();
                let naive_shortest = shortest_base.max(1);
                if (dist[end] as f64) > cfg.max_detour * naive_shortest as f64 {
                    continue;
                }

                let key = sum_demand;
                let better = match &best {
                    None => true,
                    Some((bd, _, _, _, _, _)) => key > *bd,
                };
                if better {
                    best = Some((key, start, end, nodes_path, edges_path, dist[end]));
                }
            }
        }

        let Some((sum_demand, _start, _end, nodes_path, edges_path, base_cost_val)) = best else {
            break;
        };

        for &e in &edges_path {
            let consumed = (remaining[e as usize] as f64 * cfg.cover_fraction).round() as u64;
            remaining[e as usize] = remaining[e as usize].saturating_sub(consumed);
        }

        plan.covered_demand += sum_demand;
        plan.lines.push(TransitLine {
            id: next_line_id,
            nodes: nodes_path,
            edges: edges_path,
            sum_demand,
            base_cost: base_cost_val,
        });
        next_line_id += 1;
    }

    plan
}

/// Concatenate a line's edge tile-runs into one inclusive polyline.
pub fn build_transit_line_tile_polyline(g: &RoadGraph, line: &TransitLine) -> Option<Vec<Point>> {
    if line.nodes.len() < 2 || line.edges.len() != line.nodes.len() - 1 {
        return None;
    }
    let mut out = Vec::new();
    for (i, &edge_idx) in line.edges.iter().enumerate() {
        if edge_idx < 0 || edge_idx as usize >= g.edges.len() {
            return None;
        }
        let edge = &g.edges[edge_idx as usize];
        let from_node = line.nodes[i];
        let forward = edge.a == from_node;
        let mut tiles = edge.tiles.clone();
        if !forward {
            tiles.reverse();
        }
        if i == 0 {
            out.extend(tiles);
        } else {
            out.extend(tiles.into_iter().skip(1));
        }
    }
    Some(out)
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
    fn high_demand_corridor_produces_one_line() {
        let w = line_world(6);
        let g = build_road_graph(&w);
        assert_eq!(g.edges.len(), 1);
        let demand = vec![500u64];
        let cfg = TransitPlannerConfig::default();
        let plan = plan_transit_lines(&g, &demand, &cfg, Some(&w));
        assert_eq!(plan.lines.len(), 1);
        assert!(plan.covered_demand > 0);
    }

    #[test]
    fn below_min_line_demand_yields_no_lines() {
        let w = line_world(6);
        let g = build_road_graph(&w);
        let demand = vec![1u64];
        let cfg = TransitPlannerConfig::default();
        let plan = plan_transit_lines(&g, &demand, &cfg, Some(&w));
        assert!(plan.lines.is_empty());
    }

    #[test]
    fn polyline_concatenation_is_inclusive_of_endpoints() {
        let w = line_world(6);
        let g = build_road_graph(&w);
        let line = TransitLine {
            id: 0,
            nodes: vec![0, 1],
            edges: vec![0],
            sum_demand: 100,
            base_cost: 1000,
        };
        let poly = build_transit_line_tile_polyline(&g, &line).unwrap();
        assert_eq!(poly.len(), g.edges[0].tiles.len());
    }
}
