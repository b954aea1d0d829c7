//! Road-graph structural invariant and edge-aggregation conservation.

use citysim_core::{
    aggregate_flow_on_road_graph, build_road_graph, Overlay, RoadGraphTrafficConfig, World,
};

fn road_tile_count(world: &World) -> usize {
    world.tiles().iter().filter(|t| t.is_road()).count()
}

#[test]
fn straight_road_graph_edge_length_plus_nodes_covers_every_tile() {
    let mut w = World::new(9, 1, 1);
    for x in 0..9 {
        w.at_mut(x, 0).overlay = Overlay::Road;
    }
    let g = build_road_graph(&w);
    let total_interior_tiles: i32 = g.edges.iter().map(|e| (e.length - 1).max(0)).sum();
    assert_eq!(total_interior_tiles as usize + g.nodes.len(), road_tile_count(&w));
}

#[test]
fn t_junction_graph_edge_length_plus_nodes_covers_every_tile() {
    let mut w = World::new(5, 5, 1);
    for x in 0..5 {
        w.at_mut(x, 2).overlay = Overlay::Road;
    }
    w.at_mut(2, 0).overlay = Overlay::Road;
    w.at_mut(2, 1).overlay = Overlay::Road;
    let g = build_road_graph(&w);
    let total_interior_tiles: i32 = g.edges.iter().map(|e| (e.length - 1).max(0)).sum();
    assert_eq!(total_interior_tiles as usize + g.nodes.len(), road_tile_count(&w));
}

#[test]
fn edge_aggregation_interior_sum_plus_endpoints_equals_all_sum() {
    let mut w = World::new(6, 1, 1);
    for x in 0..6 {
        w.at_mut(x, 0).overlay = Overlay::Road;
    }
    let g = build_road_graph(&w);
    let mut flow = vec![0u32; w.tile_count()];
    for (i, f) in flow.iter_mut().enumerate() {
        *f = (i as u32 + 1) * 3;
    }
    let result = aggregate_flow_on_road_graph(&w, &g, &flow, RoadGraphTrafficConfig::default());
    assert_eq!(result.edges.len(), 1);
    let edge = &result.edges[0];
    let a_tile_traffic = flow[w.index(0, 0)] as u64;
    let b_tile_traffic = flow[w.index(5, 0)] as u64;
    assert_eq!(edge.sum_traffic_all, edge.sum_traffic_interior + a_tile_traffic + b_tile_traffic);
}

#[test]
fn isolated_road_tile_has_no_edges_and_zero_length() {
    let mut w = World::new(4, 4, 1);
    w.at_mut(2, 2).overlay = Overlay::Road;
    let g = build_road_graph(&w);
    assert_eq!(g.nodes.len(), 1);
    assert!(g.edges.is_empty());
}
