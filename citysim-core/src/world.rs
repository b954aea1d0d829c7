//! The World: flat row-major tile grid, derived stats, and debt ledger.
//!
//! World is the single shared datum. Every analyzer borrows it
//! immutably; only the Simulator holds (and only transiently) a
//! mutable reference, for the duration of one [`crate::sim::Simulator::step_once`].

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::debt::DebtItem;
use crate::stats::Stats;
use crate::tile::{Overlay, Tile};

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct World {
    pub width: i32,
    pub height: i32,
    pub seed: u64,
    tiles: Vec<Tile>,
    pub stats: Stats,
    pub debts: Vec<DebtItem>,
    /// Day counter, incremented once per `step`. Not part of `Stats` because
    /// it's simulation state, not a derived field -- `Stats::day` mirrors it.
    pub day: i64,
}

impl World {
    /// A new world of the given dimensions, all tiles at their default
    /// (grass, unoccupied) value. `seed` must be nonzero per the loader
    /// contract in spec §6.1.
    pub fn new(width: i32, height: i32, seed: u64) -> Self {
        assert!(width > 0 && height > 0, "World dimensions must be positive");
        let n = (width as usize) * (height as usize);
        Self {
            width,
            height,
            seed,
            tiles: vec![Tile::default(); n],
            stats: Stats::default(),
            debts: Vec::new(),
            day: 0,
        }
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    #[inline]
    pub fn index(&self, x: i32, y: i32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    #[inline]
    pub fn xy(&self, idx: usize) -> (i32, i32) {
        let w = self.width as usize;
        ((idx % w) as i32, (idx / w) as i32)
    }

    pub fn at(&self, x: i32, y: i32) -> Tile {
        self.tiles[self.index(x, y)]
    }

    pub fn at_mut(&mut self, x: i32, y: i32) -> &mut Tile {
        let idx = self.index(x, y);
        &mut self.tiles[idx]
    }

    pub fn tile_at_index(&self, idx: usize) -> Tile {
        self.tiles[idx]
    }

    pub fn set_tile(&mut self, x: i32, y: i32, tile: Tile) {
        let idx = self.index(x, y);
        self.tiles[idx] = tile;
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn has_adjacent_road(&self, x: i32, y: i32) -> bool {
        const DIRS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];
        DIRS.iter().any(|(dx, dy)| {
            let (nx, ny) = (x + dx, y + dy);
            self.in_bounds(nx, ny) && self.at(nx, ny).is_road()
        })
    }

    /// `O(W*H)`. Rewrites `variation` of every road tile from its
    /// 4-neighborhood road adjacency bitmask (N=1, E=2, S=4, W=8).
    /// Idempotent: a second call is a no-op.
    pub fn recompute_road_masks(&mut self) {
        const DIRS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];
        let w = self.width;
        let h = self.height;
        let mut new_variations = vec![0u8; self.tiles.len()];

        for y in 0..h {
            for x in 0..w {
                let idx = self.index(x, y);
                if !self.tiles[idx].is_road() {
                    continue;
                }
                let mut mask = 0u8;
                for (bit, (dx, dy)) in DIRS.iter().enumerate() {
                    let (nx, ny) = (x + dx, y + dy);
                    if self.in_bounds(nx, ny) && self.at(nx, ny).is_road() {
                        mask |= 1 << bit;
                    }
                }
                new_variations[idx] = mask;
            }
        }

        for (idx, tile) in self.tiles.iter_mut().enumerate() {
            if tile.is_road() {
                tile.variation = new_variations[idx];
            }
        }
    }

    /// Iterate every tile with a zoned overlay (residential/commercial/industrial).
    pub fn zone_tiles(&self) -> impl Iterator<Item = (usize, Tile)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| t.overlay.is_zone())
            .map(|(i, t)| (i, *t))
    }

    pub fn overlay_count(&self, overlay: Overlay) -> i32 {
        self.tiles.iter().filter(|t| t.overlay == overlay).count() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::Terrain;

    #[test]
    fn in_bounds_rejects_negative_and_overflowing_coords() {
        let w = World::new(4, 4, 1);
        assert!(w.in_bounds(0, 0));
        assert!(w.in_bounds(3, 3));
        assert!(!w.in_bounds(-1, 0));
        assert!(!w.in_bounds(4, 0));
    }

    #[test]
    fn recompute_road_masks_is_idempotent() {
        let mut w = World::new(3, 1, 1);
        w.at_mut(0, 0).overlay = Overlay::Road;
        w.at_mut(1, 0).overlay = Overlay::Road;
        w.at_mut(2, 0).overlay = Overlay::Road;
        w.recompute_road_masks();
        let snapshot: Vec<Tile> = w.tiles().to_vec();
        w.recompute_road_masks();
        assert_eq!(snapshot, w.tiles().to_vec());
        // Middle tile connects E and W -> mask bits 1 (E) and 3 (W) set.
        assert_eq!(w.at(1, 0).variation, 0b1010);
    }

    #[test]
    fn bridge_tile_requires_water_and_road() {
        let mut w = World::new(1, 1, 1);
        w.at_mut(0, 0).terrain = Terrain::Water;
        w.at_mut(0, 0).overlay = Overlay::Road;
        assert!(w.at(0, 0).is_bridge());
    }

    #[test]
    fn has_adjacent_road_checks_4_neighborhood() {
        let mut w = World::new(3, 3, 1);
        w.at_mut(1, 0).overlay = Overlay::Road;
        assert!(w.has_adjacent_road(1, 1));
        assert!(!w.has_adjacent_road(0, 2));
    }
}
