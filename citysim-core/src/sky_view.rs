//! Sky View Factor (SVF) / urban-canyon confinement. Ported from
//! `SkyView.hpp/.cpp`: scan a small compass of azimuth directions from each
//! tile, take the horizon elevation angle in each, and average `cos^2` of
//! the horizon angles for an approximate fraction of visible sky.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::tile::Overlay;
use crate::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct SkyViewConfig {
    pub max_horizon_radius: i32,
    /// `<= 8` uses an 8-direction compass; anything larger uses 16.
    pub azimuth_samples: i32,
    pub include_buildings: bool,
    pub residential_height_per_level: f32,
    pub commercial_height_per_level: f32,
    pub industrial_height_per_level: f32,
    pub civic_height_per_level: f32,
    pub occupant_height_boost: f32,
    pub occupant_scale: i32,
}

impl Default for SkyViewConfig {
    fn default() -> Self {
        Self {
            max_horizon_radius: 64,
            azimuth_samples: 16,
            include_buildings: true,
            residential_height_per_level: 0.05,
            commercial_height_per_level: 0.07,
            industrial_height_per_level: 0.06,
            civic_height_per_level: 0.08,
            occupant_height_boost: 0.04,
            occupant_scale: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct SkyViewResult {
    pub w: i32,
    pub h: i32,
    pub sky_view01: Vec<f32>,
    pub canyon01: Vec<f32>,
    pub mean_sky_view: f32,
    pub mean_road_sky_view: f32,
    pub road_tile_count: i32,
}

struct DirStep {
    dx: i32,
    dy: i32,
    dist_per_step: f32,
}

const SQRT2: f32 = 1.414_213_6;
const SQRT5: f32 = 2.236_068;

const DIRS8: [DirStep; 8] = [
    DirStep { dx: 1, dy: 0, dist_per_step: 1.0 },
    DirStep { dx: 1, dy: -1, dist_per_step: SQRT2 },
    DirStep { dx: 0, dy: -1, dist_per_step: 1.0 },
    DirStep { dx: -1, dy: -1, dist_per_step: SQRT2 },
    DirStep { dx: -1, dy: 0, dist_per_step: 1.0 },
    DirStep { dx: -1, dy: 1, dist_per_step: SQRT2 },
    DirStep { dx: 0, dy: 1, dist_per_step: 1.0 },
    DirStep { dx: 1, dy: 1, dist_per_step: SQRT2 },
];

const DIRS16: [DirStep; 16] = [
    DirStep { dx: 1, dy: 0, dist_per_step: 1.0 },
    DirStep { dx: 2, dy: -1, dist_per_step: SQRT5 },
    DirStep { dx: 1, dy: -1, dist_per_step: SQRT2 },
    DirStep { dx: 1, dy: -2, dist_per_step: SQRT5 },
    DirStep { dx: 0, dy: -1, dist_per_step: 1.0 },
    DirStep { dx: -1, dy: -2, dist_per_step: SQRT5 },
    DirStep { dx: -1, dy: -1, dist_per_step: SQRT2 },
    DirStep { dx: -2, dy: -1, dist_per_step: SQRT5 },
    DirStep { dx: -1, dy: 0, dist_per_step: 1.0 },
    DirStep { dx: -2, dy: 1, dist_per_step: SQRT5 },
    DirStep { dx: -1, dy: 1, dist_per_step: SQRT2 },
    DirStep { dx: -1, dy: 2, dist_per_step: SQRT5 },
    DirStep { dx: 0, dy: 1, dist_per_step: 1.0 },
    DirStep { dx: 1, dy: 2, dist_per_step: SQRT5 },
    DirStep { dx: 1, dy: 1, dist_per_step: SQRT2 },
    DirStep { dx: 2, dy: 1, dist_per_step: SQRT5 },
];

fn building_height(world: &World, idx: usize, cfg: &SkyViewConfig) -> f32 {
    if !cfg.include_buildings {
        return 0.0;
    }
    let t = world.tile_at_index(idx);
    let lvl = t.level.clamp(1, 3) as f32;
    let mut h = match t.overlay {
        Overlay::Residential => cfg.residential_height_per_level * lvl,
        Overlay::Commercial => cfg.commercial_height_per_level * lvl,
        Overlay::Industrial => cfg.industrial_height_per_level * lvl,
        o if o.is_service() => cfg.civic_height_per_level * lvl,
        _ => 0.0,
    };
    if h > 0.0 && cfg.occupant_scale > 0 && cfg.occupant_height_boost > 0.0 {
        let occ01 = (t.occupants as f32 / cfg.occupant_scale as f32).clamp(0.0, 1.0);
        h += cfg.occupant_height_boost * occ01;
    }
    h
}

/// Compute the sky view factor / canyon confinement proxy over `world`.
pub fn compute_sky_view_factor(world: &World, cfg: &SkyViewConfig) -> SkyViewResult {
    let w = world.width;
    let h = world.height;
    let n = world.tile_count();
    if w <= 0 || h <= 0 {
        return SkyViewResult {
            w,
            h,
            sky_view01: Vec::new(),
            canyon01: Vec::new(),
            mean_sky_view: 0.0,
            mean_road_sky_view: 0.0,
            road_tile_count: 0,
        };
    }

    let mut eff_h = vec![0.0f32; n];
    for idx in 0..n {
        eff_h[idx] = world.tile_at_index(idx).height + building_height(world, idx, cfg);
    }

    let use16 = cfg.azimuth_samples > 8;
    let dirs: &[DirStep] = if use16 { &DIRS16 } else { &DIRS8 };
    let dir_count = dirs.len() as f32;

    let max_r = cfg.max_horizon_radius.clamp(1, w.max(h));

    let mut sky_view01 = vec![0.0f32; n];
    let mut canyon01 = vec![0.0f32; n];
    let mut sum_all = 0.0f64;
    let mut sum_road = 0.0f64;
    let mut road_count = 0i32;

    for y in 0..h {
        for x in 0..w {
            let i0 = world.index(x, y);
            let h0 = eff_h[i0];
            let mut acc = 0.0f32;

            for d in dirs {
                let mut max_ang = 0.0f32;
                let (mut sx, mut sy) = (x, y);
                for step in 1..=max_r {
                    sx += d.dx;
                    sy += d.dy;
                    if !world.in_bounds(sx, sy) {
                        break;
                    }
                    let dh = eff_h[world.index(sx, sy)] - h0;
                    if dh <= 0.0 {
                        continue;
                    }
                    let dist = step as f32 * d.dist_per_step;
                    if dist <= 0.0 {
                        continue;
                    }
                    let ang = dh.atan2(dist);
                    if ang > max_ang {
                        max_ang = ang;
                    }
                }
                let c = max_ang.cos();
                acc += c * c;
            }

            let svf = (acc / dir_count).clamp(0.0, 1.0);
            sky_view01[i0] = svf;
            canyon01[i0] = 1.0 - svf;

            sum_all += svf as f64;
            if world.tile_at_index(i0).overlay == Overlay::Road {
                sum_road += svf as f64;
                road_count += 1;
            }
        }
    }

    let mean_sky_view = (sum_all / n as f64) as f32;
    let mean_road_sky_view = if road_count > 0 { (sum_road / road_count as f64) as f32 } else { 0.0 };

    SkyViewResult {
        w,
        h,
        sky_view01,
        canyon01,
        mean_sky_view,
        mean_road_sky_view,
        road_tile_count: road_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_world_has_full_sky_view() {
        let w = World::new(5, 5, 1);
        let result = compute_sky_view_factor(&w, &SkyViewConfig::default());
        assert!(result.sky_view01.iter().all(|&v| (v - 1.0).abs() < 1e-5));
    }

    #[test]
    fn tall_neighbor_reduces_sky_view() {
        let mut w = World::new(5, 1, 1);
        w.at_mut(2, 0).overlay = Overlay::Industrial;
        w.at_mut(2, 0).level = 3;
        w.at_mut(2, 0).occupants = 60;
        let result = compute_sky_view_factor(&w, &SkyViewConfig::default());
        assert!(result.sky_view01[w.index(1, 0)] < 1.0);
    }

    #[test]
    fn canyon_is_complement_of_sky_view() {
        let w = World::new(3, 3, 1);
        let result = compute_sky_view_factor(&w, &SkyViewConfig::default());
        for i in 0..result.sky_view01.len() {
            assert!((result.sky_view01[i] + result.canyon01[i] - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn empty_world_returns_empty_result() {
        let w = World::new(0, 0, 1);
        let result = compute_sky_view_factor(&w, &SkyViewConfig::default());
        assert!(result.sky_view01.is_empty());
    }
}
