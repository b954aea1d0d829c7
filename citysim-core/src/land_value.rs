//! Land value & derived amenity fields. No C++ source for this module was
//! retrieved (`LandValue.hpp/.cpp` are absent from `original_source`), so
//! the algorithm is this crate's own design grounded in spec prose plus the
//! BFS/diffusion and box-filter idioms already used by
//! [`crate::roads::reachability`] and [`crate::traffic_safety`]
//! (documented in DESIGN.md).
//!
//! `land_value[idx] in [0,1]` blends: proximity to parks (positive),
//! proximity to water (positive, dampened), proximity to industrial zones
//! and traffic congestion (negative), and a flat terrain penalty for
//! non-buildable tiles. Diffusion is a bounded multi-source BFS rather than
//! a true Gaussian blur, so it stays an exact integer-distance computation
//! with no float non-determinism in the traversal itself.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::tile::{Overlay, Terrain};
use crate::traffic::TrafficResult;
use crate::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct LandValueConfig {
    pub park_radius: i32,
    pub park_weight: f32,
    pub water_radius: i32,
    pub water_weight: f32,
    pub industrial_radius: i32,
    pub industrial_weight: f32,
    /// Requires a [`TrafficResult`] to have any effect; ignored otherwise.
    pub traffic_radius: i32,
    pub traffic_weight: f32,
    pub base_value: f32,
}

impl Default for LandValueConfig {
    fn default() -> Self {
        Self {
            park_radius: 8,
            park_weight: 0.35,
            water_radius: 10,
            water_weight: 0.25,
            industrial_radius: 8,
            industrial_weight: 0.40,
            traffic_radius: 3,
            traffic_weight: 0.20,
            base_value: 0.35,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct LandValueResult {
    pub w: i32,
    pub h: i32,
    pub value: Vec<f32>,
    /// Mean `value` over non-water tiles; feeds `Stats::avg_land_value`.
    pub avg_non_water: f32,
}

const DIRS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// Multi-source BFS distance in tile-steps, capped at `radius` (tiles beyond
/// the cap keep `-1` = unreached). `sources` need not be sorted; BFS order
/// is deterministic row-major seed order so ties never matter for a pure
/// distance field.
fn bfs_distance(world: &World, sources: &[usize], radius: i32) -> Vec<i32> {
    let n = world.tile_count();
    let mut dist = vec![-1i32; n];
    if radius < 0 {
        return dist;
    }
    let mut queue = std::collections::VecDeque::new();
    for &idx in sources {
        if dist[idx] < 0 {
            dist[idx] = 0;
            queue.push_back(idx);
        }
    }
    while let Some(idx) = queue.pop_front() {
        let d = dist[idx];
        if d >= radius {
            continue;
        }
        let (x, y) = world.xy(idx);
        for (dx, dy) in DIRS {
            let (nx, ny) = (x + dx, y + dy);
            if !world.in_bounds(nx, ny) {
                continue;
            }
            let nidx = world.index(nx, ny);
            if dist[nidx] >= 0 {
                continue;
            }
            dist[nidx] = d + 1;
            queue.push_back(nidx);
        }
    }
    dist
}

/// Linear falloff from 1.0 at distance 0 to 0.0 at distance `radius` (or
/// beyond / unreached).
fn amenity01(dist: i32, radius: i32) -> f32 {
    if dist < 0 || radius <= 0 {
        return 0.0;
    }
    (1.0 - dist as f32 / radius as f32).clamp(0.0, 1.0)
}

/// Compute land value per spec §4.8. `traffic`, when provided, supplies a
/// congestion-aware negative term near heavily trafficked road tiles.
pub fn compute_land_value(world: &World, cfg: &LandValueConfig, traffic: Option<&TrafficResult>) -> LandValueResult {
    let w = world.width;
    let h = world.height;
    let n = world.tile_count();
    if w <= 0 || h <= 0 {
        return LandValueResult { w, h, value: Vec::new(), avg_non_water: 0.0 };
    }

    let park_sources: Vec<usize> =
        (0..n).filter(|&i| world.tile_at_index(i).overlay == Overlay::Park).collect();
    let water_sources: Vec<usize> =
        (0..n).filter(|&i| world.tile_at_index(i).terrain == Terrain::Water).collect();
    let industrial_sources: Vec<usize> =
        (0..n).filter(|&i| world.tile_at_index(i).overlay == Overlay::Industrial).collect();

    let park_dist = bfs_distance(world, &park_sources, cfg.park_radius);
    let water_dist = bfs_distance(world, &water_sources, cfg.water_radius);
    let industrial_dist = bfs_distance(world, &industrial_sources, cfg.industrial_radius);

    let traffic_term: Vec<f32> = if let Some(t) = traffic {
        let tr = cfg.traffic_radius.max(0);
        let mut max_nearby = vec![0u32; n];
        // Row-major fixed-order box max in a (2r+1)^2 window; small radius by
        // convention so the naive scan stays cheap.
        for y in 0..h {
            for x in 0..w {
                let idx = world.index(x, y);
                let mut m = 0u32;
                for dy in -tr..=tr {
                    for dx in -tr..=tr {
                        let (nx, ny) = (x + dx, y + dy);
                        if !world.in_bounds(nx, ny) {
                            continue;
                        }
                        let nidx = world.index(nx, ny);
                        if world.tile_at_index(nidx).is_road() {
                            m = m.max(t.road_traffic.get(nidx).copied().unwrap_or(0));
                        }
                    }
                }
                max_nearby[idx] = m;
            }
        }
        let peak = max_nearby.iter().copied().max().unwrap_or(0).max(1) as f32;
        max_nearby.iter().map(|&v| (v as f32 / peak).clamp(0.0, 1.0)).collect()
    } else {
        vec![0.0; n]
    };

    let mut value = vec![0.0f32; n];
    let mut sum = 0.0f64;
    let mut count = 0u32;

    for y in 0..h {
        for x in 0..w {
            let idx = world.index(x, y);
            let tile = world.tile_at_index(idx);

            if tile.terrain == Terrain::Water {
                value[idx] = 0.0;
                continue;
            }

            let park = amenity01(park_dist[idx], cfg.park_radius);
            let water = amenity01(water_dist[idx], cfg.water_radius);
            let industrial = amenity01(industrial_dist[idx], cfg.industrial_radius);

            let v = cfg.base_value + cfg.park_weight * park + cfg.water_weight * water
                - cfg.industrial_weight * industrial
                - cfg.traffic_weight * traffic_term[idx];
            let v = v.clamp(0.0, 1.0);
            value[idx] = v;
            sum += v as f64;
            count += 1;
        }
    }

    let avg_non_water = if count > 0 { (sum / count as f64) as f32 } else { 0.0 };

    LandValueResult { w, h, value, avg_non_water }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn water_tiles_have_zero_value() {
        let mut w = World::new(4, 1, 1);
        w.at_mut(2, 0).terrain = Terrain::Water;
        let result = compute_land_value(&w, &LandValueConfig::default(), None);
        assert_eq!(result.value[w.index(2, 0)], 0.0);
    }

    #[test]
    fn proximity_to_park_raises_value() {
        let mut w = World::new(9, 1, 1);
        w.at_mut(0, 0).overlay = Overlay::Park;
        let result = compute_land_value(&w, &LandValueConfig::default(), None);
        assert!(result.value[w.index(1, 0)] > result.value[w.index(8, 0)]);
    }

    #[test]
    fn proximity_to_industrial_lowers_value() {
        let mut w = World::new(9, 1, 1);
        w.at_mut(0, 0).overlay = Overlay::Industrial;
        let result = compute_land_value(&w, &LandValueConfig::default(), None);
        assert!(result.value[w.index(1, 0)] < result.value[w.index(8, 0)]);
    }

    #[test]
    fn empty_world_has_no_tiles() {
        let w = World::new(0, 0, 1);
        let result = compute_land_value(&w, &LandValueConfig::default(), None);
        assert!(result.value.is_empty());
        assert_eq!(result.avg_non_water, 0.0);
    }
}
