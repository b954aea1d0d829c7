//! Flat, enumerated config structs consumed by the simulator and its
//! analytical sub-systems. No dynamic dispatch: overlay/terrain/level
//! tables are matched exhaustively in [`crate::tile`]; these structs are
//! just tuning knobs, all serializable for save/load round-tripping.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

/// Compile-time district count. Parametrizing further would mean every
/// per-district array below grows with it; the source fixes this at 8.
pub const DISTRICT_COUNT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct TrafficConfig {
    pub require_outside_connection: bool,
    pub road_tile_capacity: i32,
    pub include_commercial_jobs: bool,
    pub include_industrial_jobs: bool,

    pub congestion_aware_routing: bool,
    pub congestion_iterations: u32,
    pub congestion_alpha: f32,
    pub congestion_beta: f32,
    pub congestion_capacity_scale: f32,
    pub congestion_ratio_clamp: f32,

    pub capacity_aware_jobs: bool,
    pub job_assignment_iterations: u32,
    pub job_penalty_base_milli: i32,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            require_outside_connection: true,
            road_tile_capacity: 28,
            include_commercial_jobs: true,
            include_industrial_jobs: true,
            congestion_aware_routing: false,
            congestion_iterations: 4,
            congestion_alpha: 0.15,
            congestion_beta: 4.0,
            congestion_capacity_scale: 1.0,
            congestion_ratio_clamp: 3.0,
            capacity_aware_jobs: false,
            job_assignment_iterations: 6,
            job_penalty_base_milli: 8000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct GoodsConfig {
    pub require_outside_connection: bool,
    pub road_tile_capacity: i32,

    pub allow_imports: bool,
    pub allow_exports: bool,
    pub import_capacity_pct: i32,
    pub export_capacity_pct: i32,

    pub congestion_aware_routing: bool,
    pub congestion_iterations: u32,
    pub congestion_alpha: f32,
    pub congestion_beta: f32,
    pub congestion_capacity_scale: f32,
    pub congestion_ratio_clamp: f32,
}

impl Default for GoodsConfig {
    fn default() -> Self {
        Self {
            require_outside_connection: true,
            road_tile_capacity: 28,
            allow_imports: true,
            allow_exports: true,
            import_capacity_pct: 40,
            export_capacity_pct: 40,
            congestion_aware_routing: false,
            congestion_iterations: 4,
            congestion_alpha: 0.15,
            congestion_beta: 4.0,
            congestion_capacity_scale: 1.0,
            congestion_ratio_clamp: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct TradeModel {
    pub legacy_fixed_exchange_rate: f32,
    pub model_driven_rates: bool,
    pub volatility: f32,
    pub partner_count: i32,
}

impl Default for TradeModel {
    fn default() -> Self {
        Self {
            legacy_fixed_exchange_rate: 1.0,
            model_driven_rates: true,
            volatility: 0.05,
            partner_count: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct EconomyModel {
    pub base_inflation: f32,
    pub wealth_smoothing: f32,
    pub event_chance_per_day: f32,
    pub event_duration_days: i32,
}

impl Default for EconomyModel {
    fn default() -> Self {
        Self {
            base_inflation: 0.0,
            wealth_smoothing: 0.1,
            event_chance_per_day: 0.01,
            event_duration_days: 14,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct TransitModel {
    pub enabled: bool,
    pub stop_capture_radius: i32,
    pub mode_share_ceiling: f32,
    pub speed_multiplier: f32,
}

impl Default for TransitModel {
    fn default() -> Self {
        Self {
            enabled: false,
            stop_capture_radius: 3,
            mode_share_ceiling: 0.6,
            speed_multiplier: 1.8,
        }
    }
}

/// Ported from `TrafficSafety.hpp`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct TrafficSafetyModel {
    pub enabled: bool,
    pub require_outside_connection: bool,
    pub traffic_percentile: f32,
    pub traffic_exponent: f32,
    pub base_factor: f32,
    pub geometry_weight: f32,
    pub canyon_weight: f32,
    pub risk_percentile: f32,
    pub exposure_radius: i32,
    pub exposure_percentile: f32,
    pub priority_percentile: f32,
}

impl Default for TrafficSafetyModel {
    fn default() -> Self {
        Self {
            enabled: true,
            require_outside_connection: true,
            traffic_percentile: 0.95,
            traffic_exponent: 0.70,
            base_factor: 0.25,
            geometry_weight: 0.60,
            canyon_weight: 0.35,
            risk_percentile: 0.95,
            exposure_radius: 6,
            exposure_percentile: 0.95,
            priority_percentile: 0.95,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct AirPollutionModel {
    pub industrial_emission_per_job: f32,
    pub traffic_emission_per_unit: f32,
    pub diffusion_radius: i32,
    pub decay_per_tile: f32,
}

impl Default for AirPollutionModel {
    fn default() -> Self {
        Self {
            industrial_emission_per_job: 1.0,
            traffic_emission_per_unit: 0.15,
            diffusion_radius: 5,
            decay_per_tile: 0.18,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct ServicesModel {
    pub enabled: bool,
    pub school_radius: i32,
    pub hospital_radius: i32,
    pub police_radius: i32,
    pub fire_station_radius: i32,
}

impl Default for ServicesModel {
    fn default() -> Self {
        Self {
            enabled: true,
            school_radius: 10,
            hospital_radius: 12,
            police_radius: 10,
            fire_station_radius: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct FireIncidentSettings {
    pub base_chance_per_tile_per_day: f32,
    pub fire_station_mitigation: f32,
    pub damage_cost_per_incident: i32,
    pub happiness_penalty: f32,
}

impl Default for FireIncidentSettings {
    fn default() -> Self {
        Self {
            base_chance_per_tile_per_day: 0.0005,
            fire_station_mitigation: 0.5,
            damage_cost_per_incident: 500,
            happiness_penalty: 0.02,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct TrafficIncidentSettings {
    pub base_chance_per_congested_tile_per_day: f32,
    pub police_mitigation: f32,
    pub cost_per_incident: i32,
    pub happiness_penalty: f32,
}

impl Default for TrafficIncidentSettings {
    fn default() -> Self {
        Self {
            base_chance_per_congested_tile_per_day: 0.002,
            police_mitigation: 0.4,
            cost_per_incident: 300,
            happiness_penalty: 0.01,
        }
    }
}

/// Per-district tax/maintenance multipliers, enabled by
/// `SimConfig::district_policies_enabled`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct DistrictPolicies {
    pub tax_multiplier: [f32; DISTRICT_COUNT],
    pub maintenance_multiplier: [f32; DISTRICT_COUNT],
}

impl Default for DistrictPolicies {
    fn default() -> Self {
        Self {
            tax_multiplier: [1.0; DISTRICT_COUNT],
            maintenance_multiplier: [1.0; DISTRICT_COUNT],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct SimConfig {
    pub tick_seconds: f32,
    pub require_outside_connection: bool,
    /// 0 selects legacy global-ratio park coverage instead of per-tile radius.
    pub park_influence_radius: i32,

    pub tax_residential: i32,
    pub tax_commercial: i32,
    pub tax_industrial: i32,
    pub maintenance_road: i32,
    pub maintenance_park: i32,
    pub tax_happiness_per_capita: f32,

    pub residential_desirability_weight: f32,
    pub commercial_desirability_weight: f32,
    pub industrial_desirability_weight: f32,

    pub district_policies_enabled: bool,
    pub district_policies: DistrictPolicies,

    pub traffic: TrafficConfig,
    pub goods: GoodsConfig,
    pub trade: TradeModel,
    pub economy: EconomyModel,
    pub transit: TransitModel,
    pub traffic_safety: TrafficSafetyModel,
    pub air_pollution: AirPollutionModel,
    pub services: ServicesModel,
    pub fire_incidents: FireIncidentSettings,
    pub traffic_incidents: TrafficIncidentSettings,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_seconds: 1.0,
            require_outside_connection: true,
            park_influence_radius: 6,
            tax_residential: 2,
            tax_commercial: 3,
            tax_industrial: 3,
            maintenance_road: 1,
            maintenance_park: 1,
            tax_happiness_per_capita: 0.0005,
            residential_desirability_weight: 1.0,
            commercial_desirability_weight: 1.0,
            industrial_desirability_weight: 1.0,
            district_policies_enabled: false,
            district_policies: DistrictPolicies::default(),
            traffic: TrafficConfig::default(),
            goods: GoodsConfig::default(),
            trade: TradeModel::default(),
            economy: EconomyModel::default(),
            transit: TransitModel::default(),
            traffic_safety: TrafficSafetyModel::default(),
            air_pollution: AirPollutionModel::default(),
            services: ServicesModel::default(),
            fire_incidents: FireIncidentSettings::default(),
            traffic_incidents: TrafficIncidentSettings::default(),
        }
    }
}

impl SimConfig {
    /// Clamp fields a hand-edited or deserialized config could put out of
    /// range, so a bad save file degrades gracefully instead of feeding
    /// negative radii or NaN weights into the simulator.
    pub fn sanitized(mut self) -> Self {
        if !(self.tick_seconds.is_finite()) || self.tick_seconds <= 0.0 {
            self.tick_seconds = 1.0;
        }
        self.park_influence_radius = self.park_influence_radius.max(0);

        self.tax_residential = self.tax_residential.max(0);
        self.tax_commercial = self.tax_commercial.max(0);
        self.tax_industrial = self.tax_industrial.max(0);
        self.maintenance_road = self.maintenance_road.max(0);
        self.maintenance_park = self.maintenance_park.max(0);
        if !self.tax_happiness_per_capita.is_finite() {
            self.tax_happiness_per_capita = 0.0;
        }

        if !self.residential_desirability_weight.is_finite() {
            self.residential_desirability_weight = 1.0;
        }
        if !self.commercial_desirability_weight.is_finite() {
            self.commercial_desirability_weight = 1.0;
        }
        if !self.industrial_desirability_weight.is_finite() {
            self.industrial_desirability_weight = 1.0;
        }

        for w in self.district_policies.tax_multiplier.iter_mut() {
            if !w.is_finite() || *w < 0.0 {
                *w = 1.0;
            }
        }
        for w in self.district_policies.maintenance_multiplier.iter_mut() {
            if !w.is_finite() || *w < 0.0 {
                *w = 1.0;
            }
        }

        self.traffic.road_tile_capacity = self.traffic.road_tile_capacity.max(1);
        self.traffic.congestion_iterations = self.traffic.congestion_iterations.min(64);
        self.traffic.congestion_alpha = self.traffic.congestion_alpha.max(0.0);
        self.traffic.congestion_beta = self.traffic.congestion_beta.max(0.0);
        self.traffic.congestion_ratio_clamp = self.traffic.congestion_ratio_clamp.max(1.0);
        self.traffic.job_assignment_iterations = self.traffic.job_assignment_iterations.min(64);

        self.goods.road_tile_capacity = self.goods.road_tile_capacity.max(1);
        self.goods.import_capacity_pct = self.goods.import_capacity_pct.clamp(0, 1000);
        self.goods.export_capacity_pct = self.goods.export_capacity_pct.clamp(0, 1000);
        self.goods.congestion_iterations = self.goods.congestion_iterations.min(64);

        self.trade.partner_count = self.trade.partner_count.max(0);
        self.trade.volatility = self.trade.volatility.max(0.0);

        self.economy.event_chance_per_day = self.economy.event_chance_per_day.clamp(0.0, 1.0);
        self.economy.event_duration_days = self.economy.event_duration_days.max(0);

        self.transit.stop_capture_radius = self.transit.stop_capture_radius.max(0);
        self.transit.mode_share_ceiling = self.transit.mode_share_ceiling.clamp(0.0, 1.0);
        self.transit.speed_multiplier = self.transit.speed_multiplier.max(0.01);

        self.traffic_safety.traffic_percentile = self.traffic_safety.traffic_percentile.clamp(0.0, 1.0);
        self.traffic_safety.risk_percentile = self.traffic_safety.risk_percentile.clamp(0.0, 1.0);
        self.traffic_safety.exposure_percentile = self.traffic_safety.exposure_percentile.clamp(0.0, 1.0);
        self.traffic_safety.priority_percentile = self.traffic_safety.priority_percentile.clamp(0.0, 1.0);
        self.traffic_safety.exposure_radius = self.traffic_safety.exposure_radius.max(0);

        self.air_pollution.diffusion_radius = self.air_pollution.diffusion_radius.max(0);
        self.air_pollution.decay_per_tile = self.air_pollution.decay_per_tile.clamp(0.0, 1.0);

        self.services.school_radius = self.services.school_radius.max(0);
        self.services.hospital_radius = self.services.hospital_radius.max(0);
        self.services.police_radius = self.services.police_radius.max(0);
        self.services.fire_station_radius = self.services.fire_station_radius.max(0);

        self.fire_incidents.base_chance_per_tile_per_day =
            self.fire_incidents.base_chance_per_tile_per_day.clamp(0.0, 1.0);
        self.fire_incidents.fire_station_mitigation = self.fire_incidents.fire_station_mitigation.clamp(0.0, 1.0);
        self.traffic_incidents.base_chance_per_congested_tile_per_day =
            self.traffic_incidents.base_chance_per_congested_tile_per_day.clamp(0.0, 1.0);
        self.traffic_incidents.police_mitigation = self.traffic_incidents.police_mitigation.clamp(0.0, 1.0);

        self
    }
}

/// Quantize a normalized `[0,1]` value to Q16 fixed point for deterministic
/// sort keys (spec's "quantized to Q16" contract on desirability weights).
pub fn quantize_q16(value: f32) -> i32 {
    (value.clamp(0.0, 1.0) * 65536.0).round() as i32
}
