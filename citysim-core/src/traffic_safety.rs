//! Road safety risk/exposure/priority scoring. Ported from
//! `TrafficSafety.hpp/.cpp`: a percentile-normalized traffic-volume term is
//! blended with a road-geometry term and a sky-view/canyon term into a
//! per-tile crash-risk proxy, then box-filtered into an "exposure" field and
//! weighted by resident population into a "priority" field for ranking
//! capital work.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::config::TrafficSafetyModel;
use crate::sky_view::SkyViewResult;
use crate::tile::Overlay;
use crate::traffic::TrafficResult;
use crate::world::World;

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct TrafficSafetyResult {
    pub w: i32,
    pub h: i32,
    pub risk01: Vec<f32>,
    pub exposure01: Vec<f32>,
    pub priority01: Vec<f32>,
    pub road_tiles_considered: i32,
    pub resident_population: i32,
    pub resident_mean_exposure: f32,
    pub resident_mean_priority: f32,
}

impl TrafficSafetyResult {
    fn zeroed(w: i32, h: i32, n: usize) -> Self {
        Self {
            w,
            h,
            risk01: vec![0.0; n],
            exposure01: vec![0.0; n],
            priority01: vec![0.0; n],
            road_tiles_considered: 0,
            resident_population: 0,
            resident_mean_exposure: 0.0,
            resident_mean_priority: 0.0,
        }
    }
}

/// `p` in `[0,1]`; nearest-rank percentile over a value's own distribution
/// among `values`, normalized back into `[0,1]` by dividing by the value at
/// the requested percentile (so the chosen percentile itself maps to 1.0).
fn percentile_scale(values: &[f32], p: f32) -> f32 {
    let mut sorted: Vec<f32> = values.iter().copied().filter(|v| *v > 0.0).collect();
    if sorted.is_empty() {
        return 1.0;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let p = p.clamp(0.0, 1.0);
    let idx = ((sorted.len() as f32 - 1.0) * p).round() as usize;
    let v = sorted[idx.min(sorted.len() - 1)];
    if v > 0.0 {
        v
    } else {
        1.0
    }
}

/// Road-geometry risk heuristic: 4-way intersections and dead-ends score
/// higher than simple straight-through or gentle-turn segments.
fn geometry01_for_road_tile(world: &World, idx: usize) -> f32 {
    let (x, y) = world.xy(idx);
    let mut degree = 0u8;
    let mut dirs = [false; 4];
    for (i, (dx, dy)) in [(0, -1), (1, 0), (0, 1), (-1, 0)].into_iter().enumerate() {
        let (nx, ny) = (x + dx, y + dy);
        if world.in_bounds(nx, ny) && world.at(nx, ny).is_road() {
            degree += 1;
            dirs[i] = true;
        }
    }
    match degree {
        0 => 0.0,
        1 => 0.35,
        2 => {
            let straight = dirs[0] == dirs[2] && dirs[1] == dirs[3] && dirs[0] != dirs[1];
            if straight {
                0.15
            } else {
                0.55
            }
        }
        3 => 0.75,
        _ => 1.0,
    }
}

fn build_integral_image(values: &[f32], w: i32, h: i32) -> Vec<f64> {
    let mut integral = vec![0.0f64; ((w + 1) * (h + 1)) as usize];
    let stride = (w + 1) as usize;
    for y in 0..h {
        let mut row_sum = 0.0f64;
        for x in 0..w {
            row_sum += values[(y * w + x) as usize] as f64;
            let above = integral[(y as usize) * stride + (x as usize + 1)];
            integral[(y as usize + 1) * stride + (x as usize + 1)] = above + row_sum;
        }
    }
    integral
}

fn box_sum(integral: &[f64], w: i32, h: i32, cx: i32, cy: i32, radius: i32) -> f64 {
    let stride = (w + 1) as usize;
    let x0 = (cx - radius).max(0);
    let y0 = (cy - radius).max(0);
    let x1 = (cx + radius + 1).min(w);
    let y1 = (cy + radius + 1).min(h);
    if x1 <= x0 || y1 <= y0 {
        return 0.0;
    }
    let a = integral[(y0 as usize) * stride + (x0 as usize)];
    let b = integral[(y0 as usize) * stride + (x1 as usize)];
    let c = integral[(y1 as usize) * stride + (x0 as usize)];
    let d = integral[(y1 as usize) * stride + (x1 as usize)];
    d - b - c + a
}

/// Compute the road safety risk/exposure/priority fields per spec §4.8.
/// `sky_view` supplies the canyon term; pass the output of
/// [`crate::sky_view::compute_sky_view_factor`].
pub fn compute_traffic_safety(
    world: &World,
    cfg: &TrafficSafetyModel,
    traffic: &TrafficResult,
    sky_view: &SkyViewResult,
) -> TrafficSafetyResult {
    let w = world.width;
    let h = world.height;
    let n = world.tile_count();
    if w <= 0 || h <= 0 || !cfg.enabled {
        return TrafficSafetyResult::zeroed(w, h, n);
    }

    let road_traffic_f32: Vec<f32> = traffic.road_traffic.iter().map(|&v| v as f32).collect();
    let traffic_scale = percentile_scale(&road_traffic_f32, cfg.traffic_percentile);

    let mut risk01 = vec![0.0f32; n];
    let mut road_count = 0i32;

    for idx in 0..n {
        if !world.tile_at_index(idx).is_road() {
            continue;
        }
        road_count += 1;
        let traffic_norm = (road_traffic_f32[idx] / traffic_scale).clamp(0.0, 1.0);
        let traffic_term = traffic_norm.powf(cfg.traffic_exponent.max(0.01));
        let geometry = geometry01_for_road_tile(world, idx);
        let canyon = sky_view.canyon01.get(idx).copied().unwrap_or(0.0);

        let r = cfg.base_factor
            + (1.0 - cfg.base_factor) * (cfg.geometry_weight * geometry + cfg.canyon_weight * canyon).clamp(0.0, 1.0)
            + traffic_term * (1.0 - cfg.base_factor);
        risk01[idx] = (r / 2.0).clamp(0.0, 1.0);
    }

    let risk_scale = percentile_scale(&risk01, cfg.risk_percentile);
    for v in risk01.iter_mut() {
        *v = (*v / risk_scale).clamp(0.0, 1.0);
    }

    let integral = build_integral_image(&risk01, w, h);
    let radius = cfg.exposure_radius.max(0);
    let mut exposure_raw = vec![0.0f32; n];
    for y in 0..h {
        for x in 0..w {
            let idx = world.index(x, y);
            let side = (2 * radius + 1).max(1);
            let area = (side * side) as f64;
            exposure_raw[idx] = (box_sum(&integral, w, h, x, y, radius) / area) as f32;
        }
    }
    let exposure_scale = percentile_scale(&exposure_raw, cfg.exposure_percentile);
    let exposure01: Vec<f32> = exposure_raw.iter().map(|&v| (v / exposure_scale).clamp(0.0, 1.0)).collect();

    let mut resident_population = 0i32;
    let mut priority_raw = vec![0.0f32; n];
    let mut sum_pop_exposure = 0.0f64;
    for idx in 0..n {
        let t = world.tile_at_index(idx);
        if t.overlay == Overlay::Residential {
            resident_population += t.occupants as i32;
            sum_pop_exposure += exposure01[idx] as f64 * t.occupants as f64;
            priority_raw[idx] = exposure01[idx] * (1.0 + t.occupants as f32 / 60.0);
        }
    }
    let priority_scale = percentile_scale(&priority_raw, cfg.priority_percentile);
    let priority01: Vec<f32> = priority_raw.iter().map(|&v| (v / priority_scale).clamp(0.0, 1.0)).collect();

    let resident_mean_exposure =
        if resident_population > 0 { (sum_pop_exposure / resident_population as f64) as f32 } else { 0.0 };
    let resident_mean_priority = if resident_population > 0 {
        let mut sum = 0.0f64;
        for idx in 0..n {
            let t = world.tile_at_index(idx);
            if t.overlay == Overlay::Residential {
                sum += priority01[idx] as f64 * t.occupants as f64;
            }
        }
        (sum / resident_population as f64) as f32
    } else {
        0.0
    };

    TrafficSafetyResult {
        w,
        h,
        risk01,
        exposure01,
        priority01,
        road_tiles_considered: road_count,
        resident_population,
        resident_mean_exposure,
        resident_mean_priority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::Overlay as Ov;

    fn flat_traffic(n: usize) -> TrafficResult {
        TrafficResult {
            road_traffic: vec![0; n],
            max_traffic: 0,
            avg_commute: 0.0,
            p95_commute: 0.0,
            avg_commute_time: 0.0,
            p95_commute_time: 0.0,
            congestion: 0.0,
            congested_road_tiles: 0,
            total_commuters: 0,
            reachable_commuters: 0,
            unreachable_commuters: 0,
            used_congestion_aware_routing: false,
            routing_passes: 0,
            used_capacity_aware_jobs: false,
            job_assignment_iterations: 0,
            max_job_source_overload: 0.0,
        }
    }

    #[test]
    fn disabled_model_returns_zeroed_result() {
        let w = World::new(4, 4, 1);
        let mut cfg = TrafficSafetyModel::default();
        cfg.enabled = false;
        let traffic = flat_traffic(w.tile_count());
        let sv = crate::sky_view::compute_sky_view_factor(&w, &Default::default());
        let result = compute_traffic_safety(&w, &cfg, &traffic, &sv);
        assert!(result.risk01.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn no_roads_means_no_considered_tiles() {
        let w = World::new(4, 4, 1);
        let cfg = TrafficSafetyModel::default();
        let traffic = flat_traffic(w.tile_count());
        let sv = crate::sky_view::compute_sky_view_factor(&w, &Default::default());
        let result = compute_traffic_safety(&w, &cfg, &traffic, &sv);
        assert_eq!(result.road_tiles_considered, 0);
    }

    #[test]
    fn busier_road_tile_has_higher_risk() {
        let mut w = World::new(5, 1, 1);
        for x in 0..5 {
            w.at_mut(x, 0).overlay = Ov::Road;
        }
        w.recompute_road_masks();
        let cfg = TrafficSafetyModel::default();
        let mut traffic = flat_traffic(w.tile_count());
        traffic.road_traffic[w.index(2, 0)] = 100;
        let sv = crate::sky_view::compute_sky_view_factor(&w, &Default::default());
        let result = compute_traffic_safety(&w, &cfg, &traffic, &sv);
        assert!(result.risk01[w.index(2, 0)] >= result.risk01[w.index(0, 0)]);
    }

    #[test]
    fn resident_population_counted_from_residential_tiles() {
        let mut w = World::new(3, 1, 1);
        w.at_mut(0, 0).overlay = Ov::Residential;
        w.at_mut(0, 0).occupants = 10;
        let cfg = TrafficSafetyModel::default();
        let traffic = flat_traffic(w.tile_count());
        let sv = crate::sky_view::compute_sky_view_factor(&w, &Default::default());
        let result = compute_traffic_safety(&w, &cfg, &traffic, &sv);
        assert_eq!(result.resident_population, 10);
    }
}
