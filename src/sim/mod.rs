//! Deterministic simulation module
//!
//! All movement logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Stable iteration order (rays left to right, colliders by id)
//! - No rendering or platform dependencies
//!
//! Per global tick, advance moving platforms first, then tick every rider.

pub mod geometry;
pub mod probe;
pub mod query;
pub mod resolver;
pub mod state;
pub mod world;

pub use geometry::{Aabb, Segment, Shape};
pub use probe::{CollisionProbe, classify_slope, slope_angle};
pub use query::{BodyId, LayerFilter, PlatformInfo, PlatformRegistry, RayHit, SpatialQuery};
pub use resolver::{MotionFlags, MotionResolver, ResolverBuilder, redirect_along_slope};
pub use state::{CollisionState, ContactSides, PhysicsState};
pub use world::{Collider, Layer, StaticWorld};
