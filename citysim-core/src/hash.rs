//! Stable 64-bit FNV-1a hash over world state, for save/replay
//! verification and the idempotence tests in the integration suite.
//! Byte order and field order are the contract: anything that changes
//! either changes the hash of every existing save. Ported from
//! `Hash.cpp`'s `HashStats`/`HashWorld`; this crate's own incident
//! fields are appended after `avg_land_value`, the original's last
//! hashed field.

use crate::stats::Stats;
use crate::tile::Tile;
use crate::world::World;

const FNV_OFFSET: u64 = 1469598103934665603;
const FNV_PRIME: u64 = 1099511628211;

#[inline]
fn hash_byte(h: &mut u64, b: u8) {
    *h ^= b as u64;
    *h = h.wrapping_mul(FNV_PRIME);
}

#[inline]
fn hash_u16(h: &mut u64, v: u16) {
    for b in v.to_le_bytes() {
        hash_byte(h, b);
    }
}

#[inline]
fn hash_u32(h: &mut u64, v: u32) {
    for b in v.to_le_bytes() {
        hash_byte(h, b);
    }
}

#[inline]
fn hash_u64(h: &mut u64, v: u64) {
    for b in v.to_le_bytes() {
        hash_byte(h, b);
    }
}

#[inline]
fn hash_i32(h: &mut u64, v: i32) {
    hash_u32(h, v as u32);
}

#[inline]
fn hash_f32(h: &mut u64, v: f32) {
    hash_u32(h, v.to_bits());
}

#[inline]
fn hash_bool(h: &mut u64, v: bool) {
    hash_byte(h, v as u8);
}

fn hash_tile(h: &mut u64, t: &Tile) {
    hash_byte(h, t.terrain as u8);
    hash_byte(h, t.overlay as u8);
    hash_f32(h, t.height);
    hash_byte(h, t.variation);
    hash_byte(h, t.level);
    hash_u16(h, t.occupants);
    hash_byte(h, t.district);
}

/// Hash of the daily derived snapshot, in the exact field order declared
/// on [`Stats`].
pub fn hash_stats(s: &Stats) -> u64 {
    let mut h = FNV_OFFSET;

    hash_i32(&mut h, s.day as i32);

    hash_i32(&mut h, s.population);
    hash_i32(&mut h, s.housing_capacity);
    hash_i32(&mut h, s.jobs_capacity);
    hash_i32(&mut h, s.jobs_capacity_accessible);
    hash_i32(&mut h, s.employed);
    hash_f32(&mut h, s.happiness);
    hash_i32(&mut h, s.money);
    hash_i32(&mut h, s.roads);
    hash_i32(&mut h, s.parks);

    hash_i32(&mut h, s.commuters);
    hash_i32(&mut h, s.commuters_unreachable);
    hash_f32(&mut h, s.avg_commute);
    hash_f32(&mut h, s.p95_commute);
    hash_f32(&mut h, s.avg_commute_time);
    hash_f32(&mut h, s.p95_commute_time);
    hash_f32(&mut h, s.traffic_congestion);
    hash_i32(&mut h, s.congested_road_tiles);
    hash_i32(&mut h, s.max_road_traffic);

    hash_i32(&mut h, s.transit_lines);
    hash_i32(&mut h, s.transit_stops);
    hash_i32(&mut h, s.transit_riders);
    hash_f32(&mut h, s.transit_mode_share);
    hash_f32(&mut h, s.transit_commute_coverage);

    hash_i32(&mut h, s.goods_produced);
    hash_i32(&mut h, s.goods_demand);
    hash_i32(&mut h, s.goods_delivered);
    hash_i32(&mut h, s.goods_imported);
    hash_i32(&mut h, s.goods_exported);
    hash_i32(&mut h, s.goods_unreachable_demand);
    hash_f32(&mut h, s.goods_satisfaction);
    hash_i32(&mut h, s.max_road_goods_traffic);

    hash_i32(&mut h, s.trade_import_partner);
    hash_i32(&mut h, s.trade_export_partner);
    hash_i32(&mut h, s.trade_import_capacity_pct);
    hash_i32(&mut h, s.trade_export_capacity_pct);
    hash_bool(&mut h, s.trade_import_disrupted);
    hash_bool(&mut h, s.trade_export_disrupted);
    hash_f32(&mut h, s.trade_market_index);

    hash_f32(&mut h, s.economy_index);
    hash_f32(&mut h, s.economy_inflation);
    hash_i32(&mut h, s.economy_event_kind);
    hash_i32(&mut h, s.economy_event_days_left);
    hash_f32(&mut h, s.economy_city_wealth);

    hash_i32(&mut h, s.income);
    hash_i32(&mut h, s.expenses);
    hash_i32(&mut h, s.tax_revenue);
    hash_i32(&mut h, s.maintenance_cost);
    hash_i32(&mut h, s.upgrade_cost);
    hash_i32(&mut h, s.import_cost);
    hash_i32(&mut h, s.export_revenue);
    hash_i32(&mut h, s.transit_cost);
    hash_f32(&mut h, s.avg_tax_per_capita);

    hash_f32(&mut h, s.demand_residential);
    hash_f32(&mut h, s.demand_commercial);
    hash_f32(&mut h, s.demand_industrial);
    hash_f32(&mut h, s.avg_land_value);

    // This crate's own addition: daily incident counters.
    hash_i32(&mut h, s.fire_incidents_today);
    hash_i32(&mut h, s.fire_damage_cost);
    hash_i32(&mut h, s.traffic_incidents_today);
    hash_i32(&mut h, s.traffic_incident_cost);

    h
}

/// Hash of `world`'s grid and identity (width, height, seed), optionally
/// folding in [`hash_stats`]. Two worlds with identical tiles but
/// different stats only differ under `include_stats = true`.
pub fn hash_world(world: &World, include_stats: bool) -> u64 {
    let mut h = FNV_OFFSET;

    hash_i32(&mut h, world.width);
    hash_i32(&mut h, world.height);
    hash_u64(&mut h, world.seed);

    for y in 0..world.height {
        for x in 0..world.width {
            let tile = world.at(x, y);
            hash_tile(&mut h, &tile);
        }
    }

    if include_stats {
        let sh = hash_stats(&world.stats);
        hash_u64(&mut h, sh);
    }

    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_worlds_hash_identically() {
        let a = World::new(4, 4, 7);
        let b = World::new(4, 4, 7);
        assert_eq!(hash_world(&a, true), hash_world(&b, true));
    }

    #[test]
    fn differing_seed_changes_hash() {
        let a = World::new(4, 4, 7);
        let b = World::new(4, 4, 8);
        assert_ne!(hash_world(&a, true), hash_world(&b, true));
    }

    #[test]
    fn differing_tile_changes_hash() {
        let mut a = World::new(4, 4, 7);
        let b = a.clone();
        a.at_mut(0, 0).overlay = crate::tile::Overlay::Road;
        assert_ne!(hash_world(&a, true), hash_world(&b, true));
    }

    #[test]
    fn differing_variation_changes_hash() {
        let mut a = World::new(4, 4, 7);
        let b = a.clone();
        a.at_mut(0, 0).variation = 3;
        assert_ne!(hash_world(&a, true), hash_world(&b, true));
    }

    #[test]
    fn stats_only_difference_ignored_when_excluded() {
        let mut a = World::new(4, 4, 7);
        let b = a.clone();
        a.stats.money = 12345;
        assert_eq!(hash_world(&a, false), hash_world(&b, false));
        assert_ne!(hash_world(&a, true), hash_world(&b, true));
    }
}
