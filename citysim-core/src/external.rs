//! The seam this crate exposes to its external collaborators: the save
//! loader. Everything else in §6.1 (procedural generation, the binary
//! codec itself) lives outside this crate; this module only gives those
//! collaborators a concrete trait and error type to implement against.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::config::SimConfig;
use crate::error::LoadError;
use crate::world::World;

/// Procedural-generation configuration is opaque to the core: it is
/// stored for pass-through and re-serialization only, never inspected.
/// Wrapping `serde_json::Value` lets a save loader round-trip whatever
/// shape its own generator used without this crate depending on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct OpaqueConfig(pub serde_json::Value);

impl Default for OpaqueConfig {
    fn default() -> Self {
        Self(serde_json::Value::Null)
    }
}

pub type ProcGenConfig = OpaqueConfig;

/// A successfully parsed save: the world, its (opaque) generator config,
/// and the simulator config active when it was written.
#[derive(Debug, Clone)]
pub struct LoadedSave {
    pub world: World,
    pub proc_gen: ProcGenConfig,
    pub sim_config: SimConfig,
}

/// Implemented by an external collaborator's save codec. The core assumes
/// a valid `World` downstream of `load`; everything past this boundary is
/// infallible, per spec §7.
pub trait SaveLoader {
    fn load(&self, bytes: &[u8]) -> Result<LoadedSave, LoadError>;
}

/// Validate the invariants a freshly loaded `World` must satisfy (spec
/// §3.1/§6.1), independent of any particular codec. A `SaveLoader`
/// implementation can call this after decoding bytes into a `World` to
/// get the crate's own `LoadError` variants for free.
pub fn validate_loaded_world(world: &World) -> Result<(), LoadError> {
    if world.width <= 0 || world.height <= 0 {
        return Err(LoadError::InvalidDimensions {
            width: world.width,
            height: world.height,
        });
    }
    if world.seed == 0 {
        return Err(LoadError::ZeroSeed);
    }
    let expected = (world.width as usize) * (world.height as usize);
    if world.tile_count() != expected {
        return Err(LoadError::TileCountMismatch {
            expected,
            got: world.tile_count(),
        });
    }
    for idx in 0..world.tile_count() {
        let tile = world.tile_at_index(idx);
        if !(0.0..=1.0).contains(&tile.height) {
            return Err(LoadError::TileHeightOutOfRange {
                index: idx,
                height: tile.height,
            });
        }
        if !tile.is_valid() {
            return Err(LoadError::OccupantsExceedCapacity {
                index: idx,
                occupants: tile.occupants,
                capacity: tile.occupant_capacity(),
            });
        }
    }
    Ok(())
}
