//! Movement tuning
//!
//! Loaded once when a body is built and treated as immutable afterwards.
//! Tuning files are plain JSON; any field left out keeps its default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Which air-control multiplier applies while airborne
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AirControl {
    #[default]
    Normal,
    FastFall,
    DownJump,
    WallSlide,
}

impl AirControl {
    /// Resolve caller mode flags into one context.
    ///
    /// Precedence: down-jump > fast-fall > wall-slide > normal.
    pub fn resolve(down_jumping: bool, fast_falling: bool, wall_sliding: bool) -> Self {
        if down_jumping {
            AirControl::DownJump
        } else if fast_falling {
            AirControl::FastFall
        } else if wall_sliding {
            AirControl::WallSlide
        } else {
            AirControl::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AirControl::Normal => "normal",
            AirControl::FastFall => "fast-fall",
            AirControl::DownJump => "down-jump",
            AirControl::WallSlide => "wall-slide",
        }
    }

    /// Multiplier applied to air acceleration in this context
    pub fn multiplier(&self, config: &MovementConfig) -> f32 {
        match self {
            AirControl::Normal => config.air_control,
            AirControl::FastFall => config.fast_fall_air_control,
            AirControl::DownJump => config.down_jump_air_control,
            AirControl::WallSlide => config.wall_slide_air_control,
        }
    }
}

/// Per-body movement tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    // === Horizontal ===
    /// Target speed for a full `move_axis(±1)` input
    pub move_speed: f32,
    /// Hard horizontal speed cap
    pub max_move_speed: f32,
    pub ground_acceleration: f32,
    pub ground_deceleration: f32,
    pub air_acceleration: f32,
    pub air_deceleration: f32,
    /// Acceleration bonus while reversing direction on the ground
    pub turn_around_multiplier: f32,
    /// Scales ground deceleration when there is no input
    pub ground_friction: f32,
    /// Scales air deceleration when there is no input
    pub air_friction: f32,

    // === Vertical ===
    /// Fixed rising speed set by the caller's jump state
    pub ascent_speed: f32,
    /// Fixed falling speed set by the caller's fall state
    pub descent_speed: f32,
    /// Magnitude of the downward speed floor
    pub max_fall_speed: f32,

    // === Air control multipliers ===
    pub air_control: f32,
    pub fast_fall_air_control: f32,
    pub down_jump_air_control: f32,
    pub wall_slide_air_control: f32,

    // === Probing ===
    /// Inward shrink of the box before casting
    pub skin_width: f32,
    /// Rays per side on the left/right scans
    pub horizontal_ray_count: usize,
    /// Rays per side on the ground/ceiling scans
    pub vertical_ray_count: usize,
    pub ground_check_distance: f32,
    pub wall_check_distance: f32,
    pub ceiling_check_distance: f32,
    /// Steepest walkable incline, in degrees
    pub max_slope_angle: f32,

    // === Ground snap ===
    pub use_ground_snap: bool,
    pub ground_snap_distance: f32,
    pub ground_snap_threshold: f32,
    pub landing_correction_limit: f32,

    // === Numerics ===
    pub velocity_epsilon: f32,
    pub position_decimals: u32,
    pub mass: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            move_speed: 8.0,
            max_move_speed: 12.0,
            ground_acceleration: 80.0,
            ground_deceleration: 60.0,
            air_acceleration: 40.0,
            air_deceleration: 20.0,
            turn_around_multiplier: 2.0,
            ground_friction: 1.0,
            air_friction: 1.0,

            ascent_speed: 12.0,
            descent_speed: 15.0,
            max_fall_speed: 25.0,

            air_control: 1.0,
            fast_fall_air_control: 0.5,
            down_jump_air_control: 0.3,
            wall_slide_air_control: 0.6,

            skin_width: 0.02,
            horizontal_ray_count: 4,
            vertical_ray_count: 4,
            ground_check_distance: 0.05,
            wall_check_distance: 0.05,
            ceiling_check_distance: 0.05,
            max_slope_angle: 50.0,

            use_ground_snap: true,
            ground_snap_distance: 0.06,
            ground_snap_threshold: GROUND_SNAP_THRESHOLD,
            landing_correction_limit: LANDING_CORRECTION_LIMIT,

            velocity_epsilon: VELOCITY_EPSILON,
            position_decimals: POSITION_DECIMALS,
            mass: 1.0,
        }
    }
}

impl MovementConfig {
    /// Parse and validate a JSON tuning document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON tuning file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded movement tuning from {}", path.as_ref().display());
        Ok(config)
    }

    /// Reject tuning that would make the body simulate incorrectly
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.skin_width > 0.0) || !self.skin_width.is_finite() {
            return Err(ConfigError::NonPositiveSkinWidth(self.skin_width));
        }
        if self.horizontal_ray_count < 2 {
            return Err(ConfigError::TooFewRays {
                axis: "horizontal",
                count: self.horizontal_ray_count,
            });
        }
        if self.vertical_ray_count < 2 {
            return Err(ConfigError::TooFewRays {
                axis: "vertical",
                count: self.vertical_ray_count,
            });
        }

        let non_negative = [
            ("move_speed", self.move_speed),
            ("max_move_speed", self.max_move_speed),
            ("ground_acceleration", self.ground_acceleration),
            ("ground_deceleration", self.ground_deceleration),
            ("air_acceleration", self.air_acceleration),
            ("air_deceleration", self.air_deceleration),
            ("turn_around_multiplier", self.turn_around_multiplier),
            ("ground_friction", self.ground_friction),
            ("air_friction", self.air_friction),
            ("ascent_speed", self.ascent_speed),
            ("descent_speed", self.descent_speed),
            ("max_fall_speed", self.max_fall_speed),
            ("air_control", self.air_control),
            ("fast_fall_air_control", self.fast_fall_air_control),
            ("down_jump_air_control", self.down_jump_air_control),
            ("wall_slide_air_control", self.wall_slide_air_control),
            ("ground_check_distance", self.ground_check_distance),
            ("wall_check_distance", self.wall_check_distance),
            ("ceiling_check_distance", self.ceiling_check_distance),
            ("ground_snap_distance", self.ground_snap_distance),
            ("ground_snap_threshold", self.ground_snap_threshold),
            ("landing_correction_limit", self.landing_correction_limit),
            ("velocity_epsilon", self.velocity_epsilon),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue { field, value });
            }
        }

        if !(0.0..90.0).contains(&self.max_slope_angle) {
            return Err(ConfigError::InvalidSlopeAngle(self.max_slope_angle));
        }
        if !(self.mass > 0.0) || !self.mass.is_finite() {
            return Err(ConfigError::NonPositiveMass(self.mass));
        }
        if self.max_move_speed < self.move_speed {
            return Err(ConfigError::SpeedOrdering {
                speed: self.move_speed,
                max: self.max_move_speed,
            });
        }
        Ok(())
    }

    /// Walkable slope ceiling in radians
    #[inline]
    pub fn max_slope_radians(&self) -> f32 {
        self.max_slope_angle.to_radians()
    }

    /// Vertical velocity a caller sets when starting an ascent
    #[inline]
    pub fn ascent_velocity(&self) -> f32 {
        self.ascent_speed
    }

    /// Vertical velocity a caller sets when starting a descent
    #[inline]
    pub fn descent_velocity(&self) -> f32 {
        -self.descent_speed
    }

    /// Length of each ground ray, measured from the shrunk box
    #[inline]
    pub fn ground_ray_length(&self) -> f32 {
        self.skin_width + self.ground_check_distance
    }

    #[inline]
    pub fn wall_ray_length(&self) -> f32 {
        self.skin_width + self.wall_check_distance
    }

    #[inline]
    pub fn ceiling_ray_length(&self) -> f32 {
        self.skin_width + self.ceiling_check_distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(MovementConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_skin_width_rejected() {
        let config = MovementConfig {
            skin_width: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveSkinWidth(_))
        ));
    }

    #[test]
    fn test_single_ray_rejected() {
        let config = MovementConfig {
            vertical_ray_count: 1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TooFewRays { axis: "vertical", count: 1 })
        ));
    }

    #[test]
    fn test_negative_value_rejected_not_clamped() {
        let config = MovementConfig {
            air_acceleration: -1.0,
            ..Default::default()
        };
        match config.validate() {
            Err(ConfigError::InvalidValue { field, value }) => {
                assert_eq!(field, "air_acceleration");
                assert_eq!(value, -1.0);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = MovementConfig::from_json_str(r#"{ "move_speed": 5.0, "skin_width": 0.03 }"#)
            .expect("valid tuning");
        assert_eq!(config.move_speed, 5.0);
        assert_eq!(config.skin_width, 0.03);
        assert_eq!(config.vertical_ray_count, 4);
    }

    #[test]
    fn test_invalid_json_tuning_rejected() {
        assert!(matches!(
            MovementConfig::from_json_str(r#"{ "horizontal_ray_count": 0 }"#),
            Err(ConfigError::TooFewRays { .. })
        ));
        assert!(matches!(
            MovementConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_air_control_precedence() {
        assert_eq!(AirControl::resolve(true, true, true), AirControl::DownJump);
        assert_eq!(AirControl::resolve(false, true, true), AirControl::FastFall);
        assert_eq!(AirControl::resolve(false, false, true), AirControl::WallSlide);
        assert_eq!(AirControl::resolve(false, false, false), AirControl::Normal);

        let config = MovementConfig::default();
        assert_eq!(AirControl::DownJump.multiplier(&config), config.down_jump_air_control);
    }

    #[test]
    fn test_air_control_labels() {
        let labels: Vec<_> = [
            AirControl::Normal,
            AirControl::FastFall,
            AirControl::DownJump,
            AirControl::WallSlide,
        ]
        .iter()
        .map(AirControl::as_str)
        .collect();
        assert_eq!(labels, ["normal", "fast-fall", "down-jump", "wall-slide"]);
    }
}
