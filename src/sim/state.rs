//! Per-body simulation state
//!
//! `PhysicsState` persists across ticks. `CollisionState` is rebuilt from
//! scratch by every probe; only `was_grounded_last_frame` carries over, so
//! consumers can see landing and leaving-ground edges.

use std::ops::{BitOr, BitOrAssign};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::query::BodyId;

/// Velocity and pending external force for one body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsState {
    pub velocity: Vec2,
    /// Force accumulated since the last tick. Consumed and cleared every tick.
    pub external_force: Vec2,
    pub mass: f32,
}

impl PhysicsState {
    pub fn new(mass: f32) -> Self {
        Self {
            velocity: Vec2::ZERO,
            external_force: Vec2::ZERO,
            mass,
        }
    }
}

/// Bitset of the sides currently in contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactSides(u8);

impl ContactSides {
    pub const NONE: Self = Self(0);
    pub const BELOW: Self = Self(1 << 0);
    pub const ABOVE: Self = Self(1 << 1);
    pub const LEFT: Self = Self(1 << 2);
    pub const RIGHT: Self = Self(1 << 3);
    pub const SLOPE: Self = Self(1 << 4);
    pub const PLATFORM: Self = Self(1 << 5);

    #[inline]
    pub fn bits(&self) -> u8 {
        self.0
    }

    #[inline]
    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn intersects(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ContactSides {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ContactSides {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Contact results of one probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionState {
    // === Ground ===
    pub is_grounded: bool,
    pub was_grounded_last_frame: bool,
    /// Ray distance from the shrunk box; equals skin width when resting
    pub ground_distance: f32,
    pub ground_normal: Vec2,
    pub ground_hit_point: Vec2,
    pub ground_body: Option<BodyId>,

    // === Walls ===
    pub is_wall_left: bool,
    pub wall_left_distance: f32,
    pub wall_left_normal: Vec2,
    pub is_wall_right: bool,
    pub wall_right_distance: f32,
    pub wall_right_normal: Vec2,

    // === Ceiling ===
    pub is_ceiling: bool,
    pub ceiling_distance: f32,
    pub ceiling_normal: Vec2,

    // === Slope ===
    pub is_on_slope: bool,
    /// Angle between the ground normal and up (radians)
    pub slope_angle: f32,
    pub slope_normal: Vec2,
    /// False on inclines steeper than the walkable ceiling
    pub can_walk_on_slope: bool,

    // === Platforms ===
    pub is_on_moving_platform: bool,
    pub platform_reference: Option<BodyId>,
    pub platform_velocity: Vec2,
    pub is_on_one_way_platform: bool,

    // === Ledges ===
    /// Top corner of the wall on the left when its upper part is open
    pub corner_left: Option<Vec2>,
    /// Top corner of the wall on the right when its upper part is open
    pub corner_right: Option<Vec2>,

    pub sides: ContactSides,
}

impl Default for CollisionState {
    fn default() -> Self {
        Self {
            is_grounded: false,
            was_grounded_last_frame: false,
            ground_distance: f32::MAX,
            ground_normal: Vec2::Y,
            ground_hit_point: Vec2::ZERO,
            ground_body: None,

            is_wall_left: false,
            wall_left_distance: f32::MAX,
            wall_left_normal: Vec2::X,
            is_wall_right: false,
            wall_right_distance: f32::MAX,
            wall_right_normal: Vec2::NEG_X,

            is_ceiling: false,
            ceiling_distance: f32::MAX,
            ceiling_normal: Vec2::NEG_Y,

            is_on_slope: false,
            slope_angle: 0.0,
            slope_normal: Vec2::Y,
            can_walk_on_slope: true,

            is_on_moving_platform: false,
            platform_reference: None,
            platform_velocity: Vec2::ZERO,
            is_on_one_way_platform: false,

            corner_left: None,
            corner_right: None,

            sides: ContactSides::NONE,
        }
    }
}

impl CollisionState {
    /// Fresh state carrying only the previous tick's grounded flag
    pub fn fresh(was_grounded_last_frame: bool) -> Self {
        Self {
            was_grounded_last_frame,
            ..Default::default()
        }
    }

    #[inline]
    pub fn is_against_wall(&self) -> bool {
        self.is_wall_left || self.is_wall_right
    }

    #[inline]
    pub fn just_landed(&self) -> bool {
        self.is_grounded && !self.was_grounded_last_frame
    }

    #[inline]
    pub fn just_left_ground(&self) -> bool {
        !self.is_grounded && self.was_grounded_last_frame
    }

    /// Direction along the ground, pointing right
    pub fn ground_tangent(&self) -> Vec2 {
        Vec2::new(self.ground_normal.y, -self.ground_normal.x)
    }

    /// Wall normal on the side `direction` points to, if touching it
    pub fn wall_normal(&self, direction: f32) -> Option<Vec2> {
        if direction < 0.0 && self.is_wall_left {
            Some(self.wall_left_normal)
        } else if direction > 0.0 && self.is_wall_right {
            Some(self.wall_right_normal)
        } else {
            None
        }
    }
}
