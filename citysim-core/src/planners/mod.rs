//! Greedy heuristics over the road graph: road-class upgrades and bus-line
//! placement. Both are tooling-facing — they never mutate World on their
//! own except via the explicit `apply_*` entry point.

pub mod road_upgrade;
pub mod transit;

pub use road_upgrade::{
    apply_road_upgrade_plan, plan_road_upgrades, RoadUpgradeEdge, RoadUpgradeObjective, RoadUpgradePlan,
    RoadUpgradePlannerConfig,
};
pub use transit::{
    build_transit_line_tile_polyline, plan_transit_lines, TransitEdgeWeightMode, TransitLine, TransitPlan,
    TransitPlannerConfig,
};
