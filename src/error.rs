//! Setup-time error types.
//!
//! Only body construction, tuning loads and level parsing can fail. Once a
//! body is simulating, every per-tick condition degrades gracefully instead.

use thiserror::Error;

/// A body that cannot be simulated correctly with the given setup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("body has no bounding shape")]
    MissingShape,

    #[error("skin width must be positive, got {0}")]
    NonPositiveSkinWidth(f32),

    #[error("{axis} ray count must be at least 2, got {count}")]
    TooFewRays { axis: &'static str, count: usize },

    #[error("{field} must be finite and non-negative, got {value}")]
    InvalidValue { field: &'static str, value: f32 },

    #[error("max slope angle must be within [0, 90) degrees, got {0}")]
    InvalidSlopeAngle(f32),

    #[error("mass must be positive, got {0}")]
    NonPositiveMass(f32),

    #[error("max move speed {max} is below move speed {speed}")]
    SpeedOrdering { speed: f32, max: f32 },

    #[error("shape half extents must be positive, got ({0}, {1})")]
    DegenerateShape(f32, f32),

    #[error("tuning parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("tuning io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A tile level that cannot be turned into collision geometry.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level has no rows")]
    Empty,

    #[error("unknown tile {glyph:?} at row {row}, column {col}")]
    UnknownTile { glyph: char, row: usize, col: usize },

    #[error("row {row} has {len} tiles, expected {expected}")]
    RaggedRow { row: usize, len: usize, expected: usize },

    #[error("tile size must be positive, got {0}")]
    BadTileSize(f32),
}
