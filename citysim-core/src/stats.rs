//! Per-day derived snapshot. Every field is rewritten each tick by the
//! Daily Simulator; nothing here is read back as simulation input.
//!
//! Field order is a hashing contract (see [`crate::hash`]): it must match
//! `original_source/src/isocity/Hash.cpp`'s `HashStats` declared order,
//! plus this crate's incident fields appended at the end.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct Stats {
    pub day: i64,

    pub population: i32,
    pub housing_capacity: i32,
    pub jobs_capacity: i32,
    pub jobs_capacity_accessible: i32,
    pub employed: i32,
    pub happiness: f32,
    pub money: i32,
    pub roads: i32,
    pub parks: i32,

    pub commuters: i32,
    pub commuters_unreachable: i32,
    pub avg_commute: f32,
    pub p95_commute: f32,
    pub avg_commute_time: f32,
    pub p95_commute_time: f32,
    pub traffic_congestion: f32,
    pub congested_road_tiles: i32,
    pub max_road_traffic: i32,

    pub transit_lines: i32,
    pub transit_stops: i32,
    pub transit_riders: i32,
    pub transit_mode_share: f32,
    pub transit_commute_coverage: f32,

    pub goods_produced: i32,
    pub goods_demand: i32,
    pub goods_delivered: i32,
    pub goods_imported: i32,
    pub goods_exported: i32,
    pub goods_unreachable_demand: i32,
    pub goods_satisfaction: f32,
    pub max_road_goods_traffic: i32,

    pub trade_import_partner: i32,
    pub trade_export_partner: i32,
    pub trade_import_capacity_pct: i32,
    pub trade_export_capacity_pct: i32,
    pub trade_import_disrupted: bool,
    pub trade_export_disrupted: bool,
    pub trade_market_index: f32,

    pub economy_index: f32,
    pub economy_inflation: f32,
    pub economy_event_kind: i32,
    pub economy_event_days_left: i32,
    pub economy_city_wealth: f32,

    pub income: i32,
    pub expenses: i32,
    pub tax_revenue: i32,
    pub maintenance_cost: i32,
    pub upgrade_cost: i32,
    pub import_cost: i32,
    pub export_revenue: i32,
    pub transit_cost: i32,
    pub avg_tax_per_capita: f32,

    pub demand_residential: f32,
    pub demand_commercial: f32,
    pub demand_industrial: f32,
    pub avg_land_value: f32,

    pub fire_incidents_today: i32,
    pub fire_damage_cost: i32,
    pub traffic_incidents_today: i32,
    pub traffic_incident_cost: i32,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            day: 0,
            population: 0,
            housing_capacity: 0,
            jobs_capacity: 0,
            jobs_capacity_accessible: 0,
            employed: 0,
            happiness: 0.45,
            money: 0,
            roads: 0,
            parks: 0,
            commuters: 0,
            commuters_unreachable: 0,
            avg_commute: 0.0,
            p95_commute: 0.0,
            avg_commute_time: 0.0,
            p95_commute_time: 0.0,
            traffic_congestion: 0.0,
            congested_road_tiles: 0,
            max_road_traffic: 0,
            transit_lines: 0,
            transit_stops: 0,
            transit_riders: 0,
            transit_mode_share: 0.0,
            transit_commute_coverage: 0.0,
            goods_produced: 0,
            goods_demand: 0,
            goods_delivered: 0,
            goods_imported: 0,
            goods_exported: 0,
            goods_unreachable_demand: 0,
            goods_satisfaction: 0.0,
            max_road_goods_traffic: 0,
            trade_import_partner: -1,
            trade_export_partner: -1,
            trade_import_capacity_pct: 0,
            trade_export_capacity_pct: 0,
            trade_import_disrupted: false,
            trade_export_disrupted: false,
            trade_market_index: 1.0,
            economy_index: 1.0,
            economy_inflation: 0.0,
            economy_event_kind: 0,
            economy_event_days_left: 0,
            economy_city_wealth: 0.0,
            income: 0,
            expenses: 0,
            tax_revenue: 0,
            maintenance_cost: 0,
            upgrade_cost: 0,
            import_cost: 0,
            export_revenue: 0,
            transit_cost: 0,
            avg_tax_per_capita: 0.0,
            demand_residential: 0.0,
            demand_commercial: 0.0,
            demand_industrial: 0.0,
            avg_land_value: 0.0,
            fire_incidents_today: 0,
            fire_damage_cost: 0,
            traffic_incidents_today: 0,
            traffic_incident_cost: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_match_empty_world_baseline() {
        let s = Stats::default();
        assert_eq!(s.population, 0);
        assert_eq!(s.employed, 0);
        assert!((s.happiness - 0.45).abs() < f32::EPSILON);
    }
}
