//! Raycast contact probing
//!
//! The hard part of the movement core: turning a handful of rays fired from
//! the edges of the body's box into ground, wall, ceiling, slope and platform
//! contacts, plus the small position corrections (de-penetration, ground
//! snap, landing snap) that keep the body resting exactly one skin width
//! above whatever it stands on.
//!
//! Every ray starts on the body's box shrunk inward by the skin width, so a
//! body resting flush on a surface reports a hit distance of exactly
//! `skin_width`. Distances below that mean the box overlaps the surface.

use glam::Vec2;

use super::geometry::Aabb;
use super::query::{LayerFilter, PlatformRegistry, RayHit, SpatialQuery};
use super::state::{CollisionState, ContactSides};
use crate::consts::FLAT_ANGLE_EPSILON;
use crate::error::ConfigError;
use crate::settings::MovementConfig;

/// Angle between a surface normal and world up (radians)
#[inline]
pub fn slope_angle(normal: Vec2) -> f32 {
    normal
        .normalize_or_zero()
        .dot(Vec2::Y)
        .clamp(-1.0, 1.0)
        .acos()
}

/// Classify a ground angle as `(is_on_slope, can_walk_on_slope)`.
///
/// The walkable ceiling is inclusive.
#[inline]
pub fn classify_slope(angle: f32, max_slope: f32) -> (bool, bool) {
    if angle <= FLAT_ANGLE_EPSILON {
        (false, true)
    } else if angle <= max_slope {
        (true, true)
    } else {
        (true, false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

impl Side {
    #[inline]
    fn sign(self) -> f32 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }
}

/// Evenly spaced ray origins from `start` to `end` (inclusive)
fn ray_origins(start: Vec2, end: Vec2, count: usize) -> impl Iterator<Item = Vec2> {
    let step = (end - start) / (count - 1) as f32;
    (0..count).map(move |i| start + step * i as f32)
}

/// Fires the contact rays for one body
#[derive(Debug, Clone)]
pub struct CollisionProbe {
    config: MovementConfig,
    max_slope: f32,
}

impl CollisionProbe {
    pub fn new(config: &MovementConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
            max_slope: config.max_slope_radians(),
        })
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    /// Probe all four sides of `body` and return this tick's contacts.
    ///
    /// Wall and ceiling overlaps are pushed out of `body` immediately. The
    /// ground is left alone here; see [`CollisionProbe::correct_ground`].
    pub fn check_collisions<Q>(
        &self,
        world: &Q,
        body: &mut Aabb,
        velocity: Vec2,
        was_grounded: bool,
        dropping_through: bool,
    ) -> CollisionState
    where
        Q: SpatialQuery + PlatformRegistry + ?Sized,
    {
        let mut state = CollisionState::fresh(was_grounded);

        self.scan_ground(world, body, velocity, dropping_through, &mut state);
        self.scan_wall(world, body, Side::Left, &mut state);
        self.scan_wall(world, body, Side::Right, &mut state);
        self.scan_ceiling(world, body, &mut state);

        if state.is_grounded {
            let angle = slope_angle(state.ground_normal);
            let (on_slope, walkable) = classify_slope(angle, self.max_slope);
            state.slope_angle = angle;
            state.slope_normal = state.ground_normal;
            state.is_on_slope = on_slope;
            state.can_walk_on_slope = walkable;
            if on_slope {
                state.sides |= ContactSides::SLOPE;
            }
        }

        state
    }

    fn scan_ground<Q>(
        &self,
        world: &Q,
        body: &Aabb,
        velocity: Vec2,
        dropping_through: bool,
        state: &mut CollisionState,
    ) where
        Q: SpatialQuery + PlatformRegistry + ?Sized,
    {
        let bounds = body.shrink(self.config.skin_width);
        let (min, max) = (bounds.min(), bounds.max());
        let length = self.config.ground_ray_length();
        let allow_one_way = velocity.y <= 0.0 && !dropping_through;

        // Closest hit wins; strict comparison keeps the leftmost ray on ties
        let mut best: Option<(RayHit, bool)> = None;
        for origin in ray_origins(
            Vec2::new(min.x, min.y),
            Vec2::new(max.x, min.y),
            self.config.vertical_ray_count,
        ) {
            let hit = world
                .raycast(origin, Vec2::NEG_Y, length, LayerFilter::Solid)
                .map(|h| (h, false))
                .or_else(|| {
                    allow_one_way
                        .then(|| world.raycast(origin, Vec2::NEG_Y, length, LayerFilter::OneWay))
                        .flatten()
                        .map(|h| (h, true))
                });
            if let Some((hit, one_way)) = hit {
                if best.map_or(true, |(b, _)| hit.distance < b.distance) {
                    best = Some((hit, one_way));
                }
            }
        }

        let Some((hit, one_way)) = best else {
            return;
        };

        state.is_grounded = true;
        state.ground_distance = hit.distance;
        state.ground_normal = hit.normal;
        state.ground_hit_point = hit.point;
        state.ground_body = hit.body;
        state.is_on_one_way_platform = one_way;
        state.sides |= ContactSides::BELOW;

        if let Some(platform) = hit.body.and_then(|id| world.platform(id).map(|p| (id, p))) {
            state.is_on_moving_platform = true;
            state.platform_reference = Some(platform.0);
            state.platform_velocity = platform.1.velocity;
            state.sides |= ContactSides::PLATFORM;
        }
    }

    fn scan_wall<Q>(&self, world: &Q, body: &mut Aabb, side: Side, state: &mut CollisionState)
    where
        Q: SpatialQuery + ?Sized,
    {
        let skin = self.config.skin_width;
        let bounds = body.shrink(skin);
        let (min, max) = (bounds.min(), bounds.max());
        let x = match side {
            Side::Left => min.x,
            Side::Right => max.x,
        };
        let direction = Vec2::new(side.sign(), 0.0);
        let length = self.config.wall_ray_length();
        let count = self.config.horizontal_ray_count;

        let mut best: Option<RayHit> = None;
        let mut top_ray_hit = false;
        for (i, origin) in ray_origins(Vec2::new(x, min.y), Vec2::new(x, max.y), count).enumerate()
        {
            let Some(hit) = world.raycast(origin, direction, length, LayerFilter::Solid) else {
                continue;
            };
            // A walkable incline caught by a low ray is ground, not wall
            if slope_angle(hit.normal) <= self.max_slope {
                continue;
            }
            if i == count - 1 {
                top_ray_hit = true;
            }
            if best.map_or(true, |b| hit.distance < b.distance) {
                best = Some(hit);
            }
        }

        let Some(hit) = best else {
            return;
        };

        match side {
            Side::Left => {
                state.is_wall_left = true;
                state.wall_left_distance = hit.distance;
                state.wall_left_normal = hit.normal;
                state.sides |= ContactSides::LEFT;
            }
            Side::Right => {
                state.is_wall_right = true;
                state.wall_right_distance = hit.distance;
                state.wall_right_normal = hit.normal;
                state.sides |= ContactSides::RIGHT;
            }
        }

        if !top_ray_hit {
            let corner = self.find_corner(world, &bounds, hit.point.x + side.sign() * skin);
            match side {
                Side::Left => state.corner_left = corner,
                Side::Right => state.corner_right = corner,
            }
        }

        if hit.distance < skin {
            let push = skin - hit.distance;
            body.center.x -= side.sign() * push;
            log::trace!("Pushed {:?} out of wall by {:.4}", side, push);
        }
    }

    /// Look down just inside the wall from head height for its top edge
    fn find_corner<Q>(&self, world: &Q, bounds: &Aabb, x: f32) -> Option<Vec2>
    where
        Q: SpatialQuery + ?Sized,
    {
        let origin = Vec2::new(x, bounds.max().y);
        world
            .raycast(origin, Vec2::NEG_Y, bounds.height(), LayerFilter::Solid)
            .map(|hit| hit.point)
    }

    fn scan_ceiling<Q>(&self, world: &Q, body: &mut Aabb, state: &mut CollisionState)
    where
        Q: SpatialQuery + ?Sized,
    {
        let skin = self.config.skin_width;
        let bounds = body.shrink(skin);
        let (min, max) = (bounds.min(), bounds.max());
        let length = self.config.ceiling_ray_length();

        let mut best: Option<RayHit> = None;
        for origin in ray_origins(
            Vec2::new(min.x, max.y),
            Vec2::new(max.x, max.y),
            self.config.vertical_ray_count,
        ) {
            if let Some(hit) = world.raycast(origin, Vec2::Y, length, LayerFilter::Solid) {
                if best.map_or(true, |b| hit.distance < b.distance) {
                    best = Some(hit);
                }
            }
        }

        let Some(hit) = best else {
            return;
        };

        state.is_ceiling = true;
        state.ceiling_distance = hit.distance;
        state.ceiling_normal = hit.normal;
        state.sides |= ContactSides::ABOVE;

        if hit.distance < skin {
            let push = skin - hit.distance;
            body.center.y -= push;
            log::trace!("Pushed out of ceiling by {:.4}", push);
        }
    }

    /// Keep a grounded body resting one skin width above the ground.
    ///
    /// Returns the vertical displacement applied to `body`. Only the
    /// vertical velocity is ever touched, and only to zero it.
    pub fn correct_ground(
        &self,
        body: &mut Aabb,
        velocity: &mut Vec2,
        state: &mut CollisionState,
    ) -> f32 {
        if !self.config.use_ground_snap || !state.is_grounded {
            return 0.0;
        }

        let skin = self.config.skin_width;
        let distance = state.ground_distance;

        if state.just_landed() && velocity.y <= 0.0 {
            // Bottom edge flush with the hit: shrunk half height + skin
            let target = state.ground_hit_point.y + body.half_extents.y;
            let delta = target - body.center.y;
            if delta.abs() > self.config.landing_correction_limit {
                log::debug!(
                    "Rejected landing correction of {:.3} (limit {:.3})",
                    delta,
                    self.config.landing_correction_limit
                );
                return 0.0;
            }
            body.center.y = target;
            velocity.y = 0.0;
            state.ground_distance = skin;
            return delta;
        }

        if distance < skin {
            let push = skin - distance;
            body.center.y += push;
            state.ground_distance = skin;
            log::trace!("Pushed out of ground by {:.4}", push);
            return push;
        }

        if velocity.y <= 0.0
            && distance > skin + self.config.ground_snap_threshold
            && distance <= self.config.ground_snap_distance
        {
            let pull = distance - skin;
            body.center.y -= pull;
            velocity.y = 0.0;
            state.ground_distance = skin;
            log::trace!("Snapped down to ground by {:.4}", pull);
            return -pull;
        }

        0.0
    }

    /// Predict whether a falling `movement` lands within this step.
    ///
    /// Casts along the movement from the bottom ray origins. When any of them
    /// would reach the ground, returns the movement scaled so the bottom edge
    /// stops flush on the first surface touched.
    pub fn landing_lookahead<Q>(
        &self,
        world: &Q,
        body: &Aabb,
        movement: Vec2,
        dropping_through: bool,
    ) -> Option<Vec2>
    where
        Q: SpatialQuery + ?Sized,
    {
        if movement.y >= 0.0 {
            return None;
        }

        let skin = self.config.skin_width;
        let direction = movement.normalize();
        // Long enough to descend the whole step plus the ground ray margin
        let reach = (-movement.y + self.config.ground_ray_length()) / -direction.y;

        let bounds = body.shrink(skin);
        let (min, max) = (bounds.min(), bounds.max());

        let mut scale = 1.0_f32;
        let mut landed = false;
        for origin in ray_origins(
            Vec2::new(min.x, min.y),
            Vec2::new(max.x, min.y),
            self.config.vertical_ray_count,
        ) {
            let solid = world.raycast(origin, direction, reach, LayerFilter::Solid);
            let one_way = if dropping_through {
                None
            } else {
                world.raycast(origin, direction, reach, LayerFilter::OneWay)
            };
            let hit = match (solid, one_way) {
                (Some(s), Some(o)) => Some(if o.distance < s.distance { o } else { s }),
                (s, o) => s.or(o),
            };
            let Some(hit) = hit else {
                continue;
            };
            if hit.normal.y <= 0.0 {
                continue;
            }

            // Vertical travel that leaves this origin one skin above the hit
            let needed = hit.point.y + skin - origin.y;
            if needed >= movement.y {
                landed = true;
                scale = scale.min((needed / movement.y).clamp(0.0, 1.0));
            }
        }

        landed.then(|| movement * scale)
    }

    /// Clamp a horizontal step so the leading side stops flush on a wall.
    ///
    /// Returns the shortened step when a wall is within reach of `dx`.
    /// Walkable inclines are left to the ground scan.
    pub fn wall_lookahead<Q>(&self, world: &Q, body: &Aabb, dx: f32) -> Option<f32>
    where
        Q: SpatialQuery + ?Sized,
    {
        if dx == 0.0 {
            return None;
        }

        let skin = self.config.skin_width;
        let side = if dx < 0.0 { Side::Left } else { Side::Right };
        let bounds = body.shrink(skin);
        let (min, max) = (bounds.min(), bounds.max());
        let x = match side {
            Side::Left => min.x,
            Side::Right => max.x,
        };
        let direction = Vec2::new(side.sign(), 0.0);
        let reach = dx.abs() + skin;

        let mut allowed = dx.abs();
        let mut blocked = false;
        for origin in ray_origins(
            Vec2::new(x, min.y),
            Vec2::new(x, max.y),
            self.config.horizontal_ray_count,
        ) {
            let Some(hit) = world.raycast(origin, direction, reach, LayerFilter::Solid) else {
                continue;
            };
            if slope_angle(hit.normal) <= self.max_slope {
                continue;
            }
            let free = (hit.distance - skin).max(0.0);
            if free < allowed {
                allowed = free;
                blocked = true;
            }
        }

        blocked.then(|| side.sign() * allowed)
    }

    /// Clamp a rising step so the head stops flush under a ceiling.
    ///
    /// One-way ledges never block from below.
    pub fn ceiling_lookahead<Q>(&self, world: &Q, body: &Aabb, dy: f32) -> Option<f32>
    where
        Q: SpatialQuery + ?Sized,
    {
        if dy <= 0.0 {
            return None;
        }

        let skin = self.config.skin_width;
        let bounds = body.shrink(skin);
        let (min, max) = (bounds.min(), bounds.max());
        let reach = dy + skin;

        let mut allowed = dy;
        let mut blocked = false;
        for origin in ray_origins(
            Vec2::new(min.x, max.y),
            Vec2::new(max.x, max.y),
            self.config.vertical_ray_count,
        ) {
            if let Some(hit) = world.raycast(origin, Vec2::Y, reach, LayerFilter::Solid) {
                let free = (hit.distance - skin).max(0.0);
                if free < allowed {
                    allowed = free;
                    blocked = true;
                }
            }
        }

        blocked.then_some(allowed)
    }
}
