//! Deterministic city-simulation kernel.
//!
//! This crate is the pure, replayable core of a tile-based city builder:
//! given a [`World`] (grid + derived stats) and a [`config::SimConfig`], it
//! advances the city by one day at a time, deterministically, with no I/O
//! and no wall-clock or OS randomness. Everything upstream of the grid
//! (procedural generation, rendering, UI, the save codec) and everything
//! downstream (persistence) lives outside this crate; see [`external`] for
//! the seam.
//!
//! ## Module structure
//!
//! - `world`      Tile grid, derived stats, and debt ledger
//! - `tile`       Terrain/overlay definitions and per-tile derived values
//! - `config`     Tunable simulation parameters, sanitized on load
//! - `rng`        Deterministic per-subsystem PRNG (`SplitMix64`)
//! - `roads`      Road graph construction and edge-connected reachability
//! - `traffic`    Commute assignment: multi-source Dijkstra, congestion MSA
//! - `goods`      Goods production/delivery/import/export flow
//! - `land_value` Land value from proximity, access, and congestion
//! - `sky_view`   Street-canyon sky exposure
//! - `traffic_safety`        Crash-risk/exposure/priority scoring
//! - `transit_accessibility` Walk-to-transit coverage
//! - `edge_aggregate`        Per-tile flow rolled up onto road-graph edges
//! - `planners`   Road-upgrade and transit-line planning heuristics
//! - `debt`       Debt amortization
//! - `hash`       Stable world/stats hashing for replay verification
//! - `sim`        Daily tick orchestration (`Simulator::step_once`)
//! - `error`      The crate's one fallible boundary (`LoadError`)
//! - `external`   Save-loader trait and opaque proc-gen config passthrough

pub mod config;
pub mod debt;
pub mod edge_aggregate;
pub mod error;
pub mod external;
pub mod goods;
pub mod hash;
#[cfg(feature = "instrument")]
pub use instrument;
pub mod land_value;
pub mod planners;
pub mod rng;
pub mod roads;
pub mod sim;
pub mod sky_view;
pub mod stats;
pub mod tile;
pub mod traffic;
pub mod traffic_safety;
pub mod transit_accessibility;
pub mod world;

// Config
pub use config::{
    AirPollutionModel, DistrictPolicies, EconomyModel, FireIncidentSettings, GoodsConfig, ServicesModel,
    SimConfig, TradeModel, TrafficConfig, TrafficIncidentSettings, TrafficSafetyModel, TransitModel,
    DISTRICT_COUNT,
};

// Debt
pub use debt::{service_debts, DebtItem, DebtServiceResult};

// Edge aggregation
pub use edge_aggregate::{
    aggregate_flow_on_road_graph, aggregate_traffic_on_road_graph, RoadGraphTrafficConfig,
    RoadGraphTrafficEdgeStats, RoadGraphTrafficNodeStats, RoadGraphTrafficResult,
};

// Errors
pub use error::LoadError;

// External seam
pub use external::{LoadedSave, OpaqueConfig, ProcGenConfig, SaveLoader};

// Goods
pub use goods::{compute_goods_flow, GoodsResult};

// Hashing
pub use hash::{hash_stats, hash_world};

// Land value
pub use land_value::{compute_land_value, LandValueConfig, LandValueResult};

// Planners
pub use planners::{
    apply_road_upgrade_plan, build_transit_line_tile_polyline, plan_road_upgrades, plan_transit_lines,
    RoadUpgradeEdge, RoadUpgradeObjective, RoadUpgradePlan, RoadUpgradePlannerConfig, TransitEdgeWeightMode,
    TransitLine, TransitPlan, TransitPlannerConfig,
};

// RNG
pub use rng::{day_salt, SplitMix64};

// Roads
pub use roads::{
    build_road_graph, build_zone_access_map, compute_roads_connected_to_edge, Point, RoadGraph,
    RoadGraphEdge, RoadGraphNode, ZoneAccessMap,
};

// Simulation
pub use sim::Simulator;

// Sky view
pub use sky_view::{compute_sky_view_factor, SkyViewConfig, SkyViewResult};

// Stats
pub use stats::Stats;

// Tiles
pub use tile::{Overlay, RoadLevel, Terrain, Tile};

// Traffic
pub use traffic::{compute_commute_traffic, TrafficResult};

// Traffic safety
pub use traffic_safety::{compute_traffic_safety, TrafficSafetyResult};

// Transit accessibility
pub use transit_accessibility::{
    compute_transit_accessibility, TransitAccessibilityConfig, TransitAccessibilityResult,
};

// World
pub use world::World;
