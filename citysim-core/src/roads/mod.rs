//! Road-network derived structures: reachability, zone access, and the
//! compressed intersection graph.

pub mod graph;
pub mod reachability;

pub use graph::{build_road_graph, Point, RoadGraph, RoadGraphEdge, RoadGraphNode};
pub use reachability::{
    build_zone_access_map, compute_roads_connected_to_edge, ZoneAccessMap,
};
