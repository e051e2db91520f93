//! Services the movement core consumes from the level
//!
//! The probe and resolver only ever talk to the level through these traits,
//! so they run the same against a brute-force shape list, a tile grid or an
//! engine's own scene queries. All queries must be read-only and repeatable
//! within a tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Stable identifier of a level body (tile, platform, ledge)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u32);

/// Which collision layer a raycast tests against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerFilter {
    /// Geometry that blocks from every side
    Solid,
    /// Geometry that only blocks bodies coming down onto it
    OneWay,
}

/// Closest hit of a single ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance from the ray origin along its direction
    pub distance: f32,
    /// World-space contact point
    pub point: Vec2,
    /// Surface normal facing the ray origin
    pub normal: Vec2,
    /// Body that was hit, when the level tracks identities
    pub body: Option<BodyId>,
}

/// Directed single-hit raycasts against one layer at a time
pub trait SpatialQuery {
    /// Cast from `origin` along the unit `direction` up to `max_distance`.
    ///
    /// Returns the closest hit on `filter`'s layer. Rays that start inside a
    /// shape do not report that shape.
    fn raycast(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        filter: LayerFilter,
    ) -> Option<RayHit>;
}

/// Moving-platform data for a level body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlatformInfo {
    /// Platform velocity as of the current global tick
    pub velocity: Vec2,
}

/// Lookup of moving-platform tags by body id
pub trait PlatformRegistry {
    /// `None` means "not a moving platform"; it is never an error.
    fn platform(&self, body: BodyId) -> Option<PlatformInfo>;
}
