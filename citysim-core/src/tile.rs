//! The fixed-size per-cell record and the enumerated tags that drive it.
//!
//! Overlays, terrains, and road level tables replace virtual dispatch:
//! every behavior keyed by a tag is an exhaustive `match`, never a trait
//! object.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum Terrain {
    Grass,
    Sand,
    Water,
    Rock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum Overlay {
    None,
    Road,
    Residential,
    Commercial,
    Industrial,
    Park,
    School,
    Hospital,
    PoliceStation,
    FireStation,
    Market,
    Stadium,
}

impl Overlay {
    pub fn is_zone(self) -> bool {
        matches!(self, Overlay::Residential | Overlay::Commercial | Overlay::Industrial)
    }

    pub fn is_service(self) -> bool {
        matches!(
            self,
            Overlay::School | Overlay::Hospital | Overlay::PoliceStation | Overlay::FireStation
        )
    }
}

/// A road's travel-time/maintenance/capacity class. `1 = street, 2 = avenue, 3 = highway`.
pub type RoadLevel = u8;

/// Housing capacity for a residential tile at the given building level.
pub fn housing_for(level: u8) -> u16 {
    match level {
        1 => 4,
        2 => 8,
        3 => 16,
        _ => 4,
    }
}

/// Job capacity for a commercial/industrial tile at the given building level.
pub fn jobs_for(overlay: Overlay, level: u8) -> u16 {
    let base: u16 = match overlay {
        Overlay::Commercial => 3,
        Overlay::Industrial => 4,
        _ => 0,
    };
    match level {
        1 => base,
        2 => base * 2,
        3 => base * 3,
        _ => base,
    }
}

/// `cap_for_level(base, level)`: `{1.0, 1.5, 2.25}` times base, rounded.
pub fn cap_for_level(base: i32, level: RoadLevel) -> i32 {
    let mult = match level {
        1 => 1.0,
        2 => 1.5,
        3 => 2.25,
        _ => 1.0,
    };
    (base as f64 * mult).round() as i32
}

/// Per-tile travel time in milliseconds for a street/avenue/highway tile.
pub fn road_travel_time_milli_for_level(level: RoadLevel) -> u32 {
    match level {
        1 => 1200, // street
        2 => 800,  // avenue
        3 => 500,  // highway
        _ => 1200,
    }
}

/// Bridges (roads over water) are slower and separately tabulated.
pub fn bridge_travel_time_milli_for_level(level: RoadLevel) -> u32 {
    match level {
        1 => 1600,
        2 => 1100,
        3 => 700,
        _ => 1600,
    }
}

/// Daily per-tile maintenance cost for a road of the given level (non-bridge).
pub fn road_maintenance_for_level(level: RoadLevel) -> i32 {
    match level {
        1 => 1,
        2 => 2,
        3 => 4,
        _ => 1,
    }
}

/// Bridges cost more to maintain than an at-grade road of the same level.
pub fn bridge_maintenance_for_level(level: RoadLevel) -> i32 {
    road_maintenance_for_level(level) * 3
}

/// A single grid cell. Fixed-size, `Copy`, hashed byte-for-byte by
/// [`crate::hash::hash_world`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct Tile {
    pub terrain: Terrain,
    pub overlay: Overlay,
    pub height: f32,
    /// Redundant cache of the 4-neighborhood road adjacency. Only valid for
    /// `overlay == Road`; recomputed in bulk by `World::recompute_road_masks`.
    pub variation: u8,
    pub level: u8,
    pub occupants: u16,
    pub district: u8,
}

impl Default for Tile {
    fn default() -> Self {
        Self {
            terrain: Terrain::Grass,
            overlay: Overlay::None,
            height: 0.5,
            variation: 0,
            level: 1,
            occupants: 0,
            district: 0,
        }
    }
}

impl Tile {
    /// A road tile laid over water terrain is a bridge: different
    /// maintenance and travel-time tables apply.
    pub fn is_bridge(&self) -> bool {
        self.overlay == Overlay::Road && self.terrain == Terrain::Water
    }

    pub fn is_road(&self) -> bool {
        self.overlay == Overlay::Road
    }

    /// Maximum legal occupancy for this tile's current overlay/level.
    pub fn occupant_capacity(&self) -> u16 {
        match self.overlay {
            Overlay::Residential => housing_for(self.level),
            Overlay::Commercial | Overlay::Industrial => jobs_for(self.overlay, self.level),
            _ => 0,
        }
    }

    /// `true` iff every invariant in spec §3.1 holds for this tile.
    pub fn is_valid(&self) -> bool {
        if !(0.0..=1.0).contains(&self.height) {
            return false;
        }
        if matches!(
            self.overlay,
            Overlay::Residential | Overlay::Commercial | Overlay::Industrial
        ) && self.occupants > self.occupant_capacity()
        {
            return false;
        }
        true
    }

    pub fn travel_time_milli(&self) -> u32 {
        if self.is_bridge() {
            bridge_travel_time_milli_for_level(self.level)
        } else {
            road_travel_time_milli_for_level(self.level)
        }
    }

    pub fn maintenance_cost(&self) -> i32 {
        if self.is_bridge() {
            bridge_maintenance_for_level(self.level)
        } else {
            road_maintenance_for_level(self.level)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tile_is_valid() {
        assert!(Tile::default().is_valid());
    }

    #[test]
    fn over_capacity_residential_is_invalid() {
        let mut t = Tile {
            overlay: Overlay::Residential,
            level: 1,
            ..Tile::default()
        };
        t.occupants = housing_for(1) + 1;
        assert!(!t.is_valid());
    }

    #[test]
    fn bridge_is_road_over_water() {
        let t = Tile {
            terrain: Terrain::Water,
            overlay: Overlay::Road,
            ..Tile::default()
        };
        assert!(t.is_bridge());
        assert!(t.travel_time_milli() > road_travel_time_milli_for_level(t.level));
    }

    #[test]
    fn cap_for_level_matches_fixed_multipliers() {
        assert_eq!(cap_for_level(28, 1), 28);
        assert_eq!(cap_for_level(28, 2), 42);
        assert_eq!(cap_for_level(28, 3), 63);
    }

    #[test]
    fn height_out_of_range_is_invalid() {
        let t = Tile {
            height: 1.5,
            ..Tile::default()
        };
        assert!(!t.is_valid());
    }
}
