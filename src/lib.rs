//! Tile Motor - kinematic 2D character movement without a rigid-body solver
//!
//! Core modules:
//! - `sim`: Deterministic per-tick simulation (probing, contact resolution, integration)
//! - `settings`: Data-driven movement tuning
//! - `error`: Setup-time failures (bad tuning, missing shape, malformed levels)

pub mod error;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, LevelError};
pub use settings::{AirControl, MovementConfig};

/// Simulation constants and empirically tuned defaults.
///
/// The tolerances below only seed `MovementConfig::default()`; every one of
/// them can be overridden per body from a tuning file.
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Largest vertical snap accepted when landing (world units)
    pub const LANDING_CORRECTION_LIMIT: f32 = 0.1;
    /// Dead band above the resting distance before ground snap pulls down
    pub const GROUND_SNAP_THRESHOLD: f32 = 0.01;
    /// Vertical speeds smaller than this are zeroed while grounded
    pub const VELOCITY_EPSILON: f32 = 0.01;
    /// Horizontal speed above which a reversed input counts as a turn-around
    pub const TURN_AROUND_SPEED_EPSILON: f32 = 0.1;
    /// Target speeds below this are treated as "no input"
    pub const INPUT_EPSILON: f32 = 0.01;
    /// Ground normals closer than this to vertical (radians) count as flat
    pub const FLAT_ANGLE_EPSILON: f32 = 1.0e-4;
    /// Decimal places kept on the vertical position while grounded
    pub const POSITION_DECIMALS: u32 = 4;
}

/// Move `current` toward `target` by at most `max_delta`, never overshooting.
#[inline]
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let diff = target - current;
    if diff.abs() <= max_delta {
        target
    } else {
        current + diff.signum() * max_delta
    }
}

/// Round to a fixed number of decimal places
#[inline]
pub fn round_to_decimals(value: f32, decimals: u32) -> f32 {
    let scale = 10f32.powi(decimals as i32);
    (value * scale).round() / scale
}

/// Sign of `value` with zero mapped to zero (unlike `f32::signum`)
#[inline]
pub fn sign_or_zero(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_towards_never_overshoots() {
        assert_eq!(move_towards(0.0, 1.0, 5.0), 1.0);
        assert_eq!(move_towards(0.0, 10.0, 2.0), 2.0);
        assert_eq!(move_towards(3.0, -3.0, 1.5), 1.5);
        assert_eq!(move_towards(2.0, 2.0, 0.0), 2.0);
    }

    #[test]
    fn test_round_to_decimals() {
        assert!((round_to_decimals(1.234_56, 2) - 1.23).abs() < 1e-6);
        assert!((round_to_decimals(-0.000_04, 4)).abs() < 1e-6);
        assert_eq!(round_to_decimals(0.5, 4), 0.5);
    }

    #[test]
    fn test_sign_or_zero() {
        assert_eq!(sign_or_zero(3.0), 1.0);
        assert_eq!(sign_or_zero(-0.5), -1.0);
        assert_eq!(sign_or_zero(0.0), 0.0);
    }
}
