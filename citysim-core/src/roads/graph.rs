//! Compressed intersection graph extracted from the road tile grid.
//!
//! Nodes are road tiles that are intersections/endpoints (degree != 2) or
//! corners (degree 2 but not straight). Edges connect nodes by following
//! straight-or-corner-free chains of degree-2 tiles between them. Ported
//! from the two-pass node/edge extraction in `RoadGraph.cpp`.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::world::World;

const DIRS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct RoadGraphEdge {
    pub a: i32,
    pub b: i32,
    /// Steps between nodes, i.e. `tiles.len() - 1`.
    pub length: i32,
    /// Tile coordinates along the edge, inclusive of endpoints. Order is
    /// deterministic (build order) but not guaranteed to run a -> b.
    pub tiles: Vec<Point>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct RoadGraphNode {
    pub pos: Point,
    /// Indices into `RoadGraph::edges`.
    pub edges: Vec<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct RoadGraph {
    pub nodes: Vec<RoadGraphNode>,
    pub edges: Vec<RoadGraphEdge>,
}

fn is_road(world: &World, x: i32, y: i32) -> bool {
    world.in_bounds(x, y) && world.at(x, y).is_road()
}

fn degree4(world: &World, x: i32, y: i32) -> i32 {
    DIRS.iter()
        .filter(|(dx, dy)| is_road(world, x + dx, y + dy))
        .count() as i32
}

fn is_straight_degree2(world: &World, x: i32, y: i32) -> bool {
    let n = is_road(world, x, y - 1);
    let s = is_road(world, x, y + 1);
    let e = is_road(world, x + 1, y);
    let w = is_road(world, x - 1, y);
    (n && s && !e && !w) || (e && w && !n && !s)
}

fn is_graph_node(world: &World, x: i32, y: i32) -> bool {
    if !is_road(world, x, y) {
        return false;
    }
    let deg = degree4(world, x, y);
    if deg != 2 {
        return true;
    }
    !is_straight_degree2(world, x, y)
}

/// Walk from `start_node_pos` through `first` until another node tile is
/// reached. Returns `None` on malformed input: out of bounds, a non-road
/// tile, a fork (more than one forward choice), or exceeding the
/// `w*h + 8` step cap that guards against cyclic/malformed grids.
fn trace_to_next_node(
    world: &World,
    node_id_of: &[i32],
    start_node_pos: Point,
    first: Point,
) -> Option<(Vec<Point>, i32)> {
    let w = world.width;
    let h = world.height;
    let mut tiles = vec![start_node_pos];
    let mut prev = start_node_pos;
    let mut cur = first;

    let max_steps = (w as i64) * (h as i64) + 8;
    let mut steps: i64 = 0;
    while steps < max_steps {
        if !world.in_bounds(cur.x, cur.y) {
            return None;
        }
        if !world.at(cur.x, cur.y).is_road() {
            return None;
        }
        tiles.push(cur);

        let idx = world.index(cur.x, cur.y);
        let id = node_id_of[idx];
        if id != -1 {
            return Some((tiles, id));
        }

        let mut next: Option<Point> = None;
        let mut choices = 0;
        for (dx, dy) in DIRS {
            let (nx, ny) = (cur.x + dx, cur.y + dy);
            if !is_road(world, nx, ny) {
                continue;
            }
            if nx == prev.x && ny == prev.y {
                continue;
            }
            next = Some(Point { x: nx, y: ny });
            choices += 1;
        }

        if choices != 1 {
            return None;
        }

        prev = cur;
        cur = next.unwrap();
        steps += 1;
    }

    None
}

/// Build a compressed road graph from the world's road tiles. `O(W*H)`
/// for node extraction; edge tracing is bounded per-edge by the
/// `w*h + 8` step cap.
pub fn build_road_graph(world: &World) -> RoadGraph {
    let mut g = RoadGraph::default();
    let w = world.width;
    let h = world.height;
    if w <= 0 || h <= 0 {
        return g;
    }

    let mut node_id_of = vec![-1i32; world.tile_count()];

    for y in 0..h {
        for x in 0..w {
            if !is_graph_node(world, x, y) {
                continue;
            }
            let id = g.nodes.len() as i32;
            g.nodes.push(RoadGraphNode {
                pos: Point { x, y },
                edges: Vec::new(),
            });
            node_id_of[world.index(x, y)] = id;
        }
    }

    for a in 0..g.nodes.len() as i32 {
        let p = g.nodes[a as usize].pos;
        for (dx, dy) in DIRS {
            let (nx, ny) = (p.x + dx, p.y + dy);
            if !is_road(world, nx, ny) {
                continue;
            }
            let Some((tiles, b)) = trace_to_next_node(world, &node_id_of, p, Point { x: nx, y: ny })
            else {
                continue;
            };
            if b < 0 || b == a {
                continue;
            }
            if a < b {
                let length = (tiles.len() as i32 - 1).max(0);
                let edge_index = g.edges.len() as i32;
                g.edges.push(RoadGraphEdge {
                    a,
                    b,
                    length,
                    tiles,
                });
                g.nodes[a as usize].edges.push(edge_index);
                g.nodes[b as usize].edges.push(edge_index);
            }
        }
    }

    g
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::Overlay;

    fn make_road(world: &mut World, x: i32, y: i32) {
        world.at_mut(x, y).overlay = Overlay::Road;
    }

    #[test]
    fn straight_segment_has_two_endpoint_nodes_one_edge() {
        let mut w = World::new(5, 1, 1);
        for x in 0..5 {
            make_road(&mut w, x, 0);
        }
        let g = build_road_graph(&w);
        assert_eq!(g.nodes.len(), 2);
        assert_eq!(g.edges.len(), 1);
        assert_eq!(g.edges[0].length, 4);
        assert_eq!(g.edges[0].tiles.len(), 5);
    }

    #[test]
    fn t_intersection_is_a_node_with_three_edges() {
        let mut w = World::new(5, 3, 1);
        for x in 0..5 {
            make_road(&mut w, x, 1);
        }
        make_road(&mut w, 2, 0);
        make_road(&mut w, 2, 2);
        let g = build_road_graph(&w);
        // nodes: (0,1) end, (2,1) tee, (4,1) end, (2,0) end, (2,2) end = 5
        assert_eq!(g.nodes.len(), 5);
        let tee = g
            .nodes
            .iter()
            .find(|n| n.pos.x == 2 && n.pos.y == 1)
            .unwrap();
        assert_eq!(tee.edges.len(), 3);
    }

    #[test]
    fn corner_is_its_own_node() {
        let mut w = World::new(3, 3, 1);
        make_road(&mut w, 0, 0);
        make_road(&mut w, 1, 0);
        make_road(&mut w, 1, 1);
        let g = build_road_graph(&w);
        // Endpoints (0,0) and (1,1) plus corner (1,0): 3 nodes, 2 edges.
        assert_eq!(g.nodes.len(), 3);
        assert_eq!(g.edges.len(), 2);
    }

    #[test]
    fn isolated_single_tile_is_its_own_node_with_no_edges() {
        let mut w = World::new(3, 3, 1);
        make_road(&mut w, 1, 1);
        let g = build_road_graph(&w);
        assert_eq!(g.nodes.len(), 1);
        assert_eq!(g.edges.len(), 0);
    }

    #[test]
    fn closed_loop_produces_matching_node_and_edge_count() {
        let mut w = World::new(3, 3, 1);
        make_road(&mut w, 0, 0);
        make_road(&mut w, 1, 0);
        make_road(&mut w, 2, 0);
        make_road(&mut w, 2, 1);
        make_road(&mut w, 2, 2);
        make_road(&mut w, 1, 2);
        make_road(&mut w, 0, 2);
        make_road(&mut w, 0, 1);
        let g = build_road_graph(&w);
        // All 4 corners are nodes; 4 edges connect them around the ring.
        assert_eq!(g.nodes.len(), 4);
        assert_eq!(g.edges.len(), 4);
    }

    #[test]
    fn empty_world_has_no_nodes() {
        let w = World::new(4, 4, 1);
        let g = build_road_graph(&w);
        assert!(g.nodes.is_empty());
        assert!(g.edges.is_empty());
    }
}
