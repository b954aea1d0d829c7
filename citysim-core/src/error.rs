//! The one fallible boundary: loading a save. Everything downstream of a
//! successfully loaded `World` is infallible (see §7 of the design notes).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("world dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("world seed must be nonzero")]
    ZeroSeed,

    #[error("tile {index} has out-of-range height {height}")]
    TileHeightOutOfRange { index: usize, height: f32 },

    #[error("tile {index} has invalid terrain discriminant {raw}")]
    InvalidTerrainDiscriminant { index: usize, raw: u8 },

    #[error("tile {index} has invalid overlay discriminant {raw}")]
    InvalidOverlayDiscriminant { index: usize, raw: u8 },

    #[error("tile {index} occupants {occupants} exceed capacity {capacity}")]
    OccupantsExceedCapacity {
        index: usize,
        occupants: u16,
        capacity: u16,
    },

    #[error("tile payload length {got} does not match width*height {expected}")]
    TileCountMismatch { expected: usize, got: usize },

    #[error("unsupported save format version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("corrupt save data: {reason}")]
    Corrupt { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_human_readable() {
        let e = LoadError::ZeroSeed;
        assert_eq!(e.to_string(), "world seed must be nonzero");
    }
}
