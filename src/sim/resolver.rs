//! Per-tick motion pipeline for one body
//!
//! `MotionResolver` owns a body's box, physics state and last contact state.
//! Callers set intent through `move_axis`, `set_velocity`, `add_force` and
//! `stop`, then call `update_physics` once per fixed tick. The tick runs a
//! fixed sequence of steps; reordering them changes the numerical outcome.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::Aabb;
use super::probe::CollisionProbe;
use super::query::{PlatformRegistry, SpatialQuery};
use super::state::{CollisionState, PhysicsState};
use crate::consts::{INPUT_EPSILON, SIM_DT, TURN_AROUND_SPEED_EPSILON};
use crate::error::ConfigError;
use crate::settings::{AirControl, MovementConfig};
use crate::{move_towards, round_to_decimals, sign_or_zero};

/// Caller-owned movement modes.
///
/// These only select tuning (air control, one-way filtering); they never
/// write velocity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionFlags {
    pub fast_falling: bool,
    pub down_jumping: bool,
    pub wall_sliding: bool,
    /// Ignore one-way ledges below the body
    pub dropping_through: bool,
}

impl MotionFlags {
    #[inline]
    pub fn air_control(&self) -> AirControl {
        AirControl::resolve(self.down_jumping, self.fast_falling, self.wall_sliding)
    }
}

/// Rotate a horizontal velocity onto the slope tangent.
///
/// Keeps the speed `|velocity.x|` and the sign of `velocity.x`.
#[inline]
pub fn redirect_along_slope(velocity: Vec2, normal: Vec2) -> Vec2 {
    let tangent = Vec2::new(normal.y, -normal.x).normalize_or_zero();
    tangent * velocity.x
}

/// True when `current` is fast enough and pointing away from `target`
#[inline]
fn is_turning(current: f32, target: f32) -> bool {
    target.abs() >= INPUT_EPSILON
        && current.abs() > TURN_AROUND_SPEED_EPSILON
        && sign_or_zero(current) != sign_or_zero(target)
}

/// Builder for [`MotionResolver`]
#[derive(Debug, Clone)]
pub struct ResolverBuilder {
    config: MovementConfig,
    shape: Option<Aabb>,
}

impl ResolverBuilder {
    /// World-space box of the body
    pub fn shape(mut self, shape: Aabb) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn build(self) -> Result<MotionResolver, ConfigError> {
        let probe = CollisionProbe::new(&self.config)?;
        let body = self.shape.ok_or(ConfigError::MissingShape)?;

        let half = body.half_extents;
        let skin = self.config.skin_width;
        if !(half.x > skin && half.y > skin) || !half.is_finite() {
            return Err(ConfigError::DegenerateShape(half.x, half.y));
        }

        Ok(MotionResolver {
            physics: PhysicsState::new(self.config.mass),
            collision: CollisionState::default(),
            last_grounded_y: body.center.y,
            body,
            probe,
            config: self.config,
            flags: MotionFlags::default(),
            target_velocity_x: 0.0,
            turning_around: false,
            riding_slope: false,
            last_dt: SIM_DT,
        })
    }
}

/// Kinematic mover for one box-shaped body
#[derive(Debug, Clone)]
pub struct MotionResolver {
    config: MovementConfig,
    probe: CollisionProbe,
    body: Aabb,
    physics: PhysicsState,
    collision: CollisionState,
    flags: MotionFlags,
    target_velocity_x: f32,
    turning_around: bool,
    /// Vertical velocity currently comes from walking up an incline
    riding_slope: bool,
    last_grounded_y: f32,
    last_dt: f32,
}

impl MotionResolver {
    pub fn builder(config: MovementConfig) -> ResolverBuilder {
        ResolverBuilder {
            config,
            shape: None,
        }
    }

    /// Advance the body by one tick of `dt` seconds.
    ///
    /// Moving platforms in `world` should already be advanced for this tick.
    /// Invalid `dt` values skip the tick and leave every field untouched.
    pub fn update_physics<Q>(&mut self, world: &Q, dt: f32)
    where
        Q: SpatialQuery + PlatformRegistry + ?Sized,
    {
        if !(dt > 0.0) || !dt.is_finite() {
            log::warn!("Skipping tick with invalid dt {}", dt);
            return;
        }

        // 1. Snapshot
        let was_grounded = self.collision.is_grounded;
        if was_grounded {
            self.last_grounded_y = self.body.center.y;
        }

        // 2. Forces
        self.apply_forces(dt);

        // 3. Probe with the pre-collision velocity
        let mut collision = self.probe.check_collisions(
            world,
            &mut self.body,
            self.physics.velocity,
            was_grounded,
            self.flags.dropping_through,
        );

        // 4. Contacts
        self.resolve_contacts(&collision);

        // 5. Ground correction
        let ground_shift =
            self.probe
                .correct_ground(&mut self.body, &mut self.physics.velocity, &mut collision);

        // 6. Horizontal control
        self.apply_control(&collision, dt);

        // 7. Clamp
        self.clamp_velocity(collision.is_grounded);

        // 8. Integrate
        let ground_aligned = ground_shift != 0.0 || collision.just_landed();
        self.integrate(world, &collision, ground_aligned, dt);

        // 9. Forces never outlive the tick
        self.physics.external_force = Vec2::ZERO;

        if collision.just_landed() {
            log::debug!(
                "Landed at y={:.3} (dropped {:.3})",
                self.body.min().y,
                self.last_grounded_y - self.body.center.y
            );
        } else if collision.just_left_ground() {
            log::debug!("Left ground at y={:.3}", self.body.min().y);
        }

        self.collision = collision;
        self.last_dt = dt;
    }

    fn apply_forces(&mut self, dt: f32) {
        let force = self.physics.external_force;
        if force != Vec2::ZERO {
            self.physics.velocity += force / self.physics.mass * dt;
        }
    }

    fn resolve_contacts(&mut self, c: &CollisionState) {
        let v = &mut self.physics.velocity;

        if (c.is_grounded && v.y < 0.0) || (c.is_ceiling && v.y > 0.0) {
            v.y = 0.0;
        }
        if (c.is_wall_left && v.x < 0.0) || (c.is_wall_right && v.x > 0.0) {
            v.x = 0.0;
        }

        // Rise left over from last tick's incline is not a jump
        if self.riding_slope && v.y > 0.0 {
            v.y = 0.0;
        }
        self.riding_slope = false;

        let walkable_slope = c.is_grounded && c.is_on_slope && c.can_walk_on_slope;
        if walkable_slope && v.y <= 0.0 && v.x != 0.0 {
            *v = redirect_along_slope(*v, c.slope_normal);
            self.riding_slope = v.y > 0.0;
        }
    }

    /// Acceleration toward `target` for the current contact and mode
    fn control_rate(&self, grounded: bool, current: f32, target: f32) -> f32 {
        let no_input = target.abs() < INPUT_EPSILON;
        if grounded {
            if no_input {
                self.config.ground_deceleration * self.config.ground_friction
            } else if is_turning(current, target) {
                self.config.ground_acceleration * self.config.turn_around_multiplier
            } else {
                self.config.ground_acceleration
            }
        } else {
            let multiplier = self.flags.air_control().multiplier(&self.config);
            if no_input {
                self.config.air_deceleration * self.config.air_friction * multiplier
            } else {
                self.config.air_acceleration * multiplier
            }
        }
    }

    fn apply_control(&mut self, c: &CollisionState, dt: f32) {
        let current = self.physics.velocity.x;
        let target = self.target_velocity_x;
        self.turning_around = is_turning(current, target);

        let rate = self.control_rate(c.is_grounded, current, target);
        let mut vx = move_towards(current, target, rate * dt);
        if (c.is_wall_left && vx < 0.0) || (c.is_wall_right && vx > 0.0) {
            vx = 0.0;
        }
        self.physics.velocity.x = vx;
    }

    fn clamp_velocity(&mut self, grounded: bool) {
        let v = &mut self.physics.velocity;
        v.x = v.x.clamp(-self.config.max_move_speed, self.config.max_move_speed);
        v.y = v.y.max(-self.config.max_fall_speed);
        if grounded && v.y.abs() < self.config.velocity_epsilon {
            v.y = 0.0;
        }
    }

    /// `ground_aligned` means step 5 already lined the body up with the
    /// ground as it stands this tick.
    fn integrate<Q>(&mut self, world: &Q, c: &CollisionState, ground_aligned: bool, dt: f32)
    where
        Q: SpatialQuery + ?Sized,
    {
        let mut movement = self.physics.velocity * dt;

        if let Some(dx) = self.probe.wall_lookahead(world, &self.body, movement.x) {
            log::trace!("Wall lookahead clamped step from {:.4} to {:.4}", movement.x, dx);
            movement.x = dx;
            self.physics.velocity.x = 0.0;
        }

        if movement.y > 0.0 {
            let mut swept = self.body;
            swept.center.x += movement.x;
            if let Some(dy) = self.probe.ceiling_lookahead(world, &swept, movement.y) {
                log::trace!("Ceiling lookahead clamped rise from {:.4} to {:.4}", movement.y, dy);
                movement.y = dy;
                self.physics.velocity.y = 0.0;
            }
        }

        if !c.is_grounded && movement.y < 0.0 {
            if let Some(clamped) = self.probe.landing_lookahead(
                world,
                &self.body,
                movement,
                self.flags.dropping_through,
            ) {
                log::trace!(
                    "Landing lookahead clamped fall from {:.4} to {:.4}",
                    movement.y,
                    clamped.y
                );
                movement = clamped;
                self.physics.velocity.y = 0.0;
            }
        }

        if c.is_on_moving_platform {
            // Platforms advance before riders, so a ground correction has
            // already carried the body along the platform's vertical motion
            let carry = if ground_aligned {
                Vec2::new(c.platform_velocity.x, 0.0)
            } else {
                c.platform_velocity
            };
            movement += carry * dt;
        }

        self.body.center += movement;

        if c.is_grounded {
            self.body.center.y = round_to_decimals(self.body.center.y, self.config.position_decimals);
        }
    }

    /// Set the horizontal target from an axis value in `[-1, 1]`.
    ///
    /// Nudges velocity toward the new target right away; position only moves
    /// in `update_physics`.
    pub fn move_axis(&mut self, axis: f32) {
        let axis = if axis.is_finite() {
            axis.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        let target = axis * self.config.move_speed;
        let current = self.physics.velocity.x;

        self.target_velocity_x = target;
        self.turning_around = is_turning(current, target);

        let rate = self.control_rate(self.collision.is_grounded, current, target);
        self.physics.velocity.x = move_towards(current, target, rate * self.last_dt);
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.physics.velocity = velocity;
        self.riding_slope = false;
    }

    /// Accumulate a force for the next tick only
    pub fn add_force(&mut self, force: Vec2) {
        self.physics.external_force += force;
        self.riding_slope = false;
    }

    pub fn stop(&mut self) {
        self.physics.velocity = Vec2::ZERO;
        self.target_velocity_x = 0.0;
        self.turning_around = false;
        self.riding_slope = false;
    }

    pub fn set_fast_falling(&mut self, on: bool) {
        self.flags.fast_falling = on;
    }

    pub fn set_down_jumping(&mut self, on: bool) {
        self.flags.down_jumping = on;
    }

    pub fn set_wall_sliding(&mut self, on: bool) {
        self.flags.wall_sliding = on;
    }

    pub fn set_dropping_through(&mut self, on: bool) {
        self.flags.dropping_through = on;
    }

    pub fn flags(&self) -> MotionFlags {
        self.flags
    }

    pub fn air_control(&self) -> AirControl {
        self.flags.air_control()
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    pub fn physics(&self) -> &PhysicsState {
        &self.physics
    }

    pub fn collision(&self) -> &CollisionState {
        &self.collision
    }

    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.collision.is_grounded
    }

    #[inline]
    pub fn is_against_wall(&self) -> bool {
        self.collision.is_against_wall()
    }

    /// Center of the body box
    pub fn position(&self) -> Vec2 {
        self.body.center
    }

    pub fn bounds(&self) -> Aabb {
        self.body
    }

    pub fn target_velocity_x(&self) -> f32 {
        self.target_velocity_x
    }

    pub fn is_turning_around(&self) -> bool {
        self.turning_around
    }

    /// Center height at the start of the last grounded tick
    pub fn last_grounded_y(&self) -> f32 {
        self.last_grounded_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::geometry::{Segment, Shape};
    use crate::sim::world::{Layer, StaticWorld};
    use proptest::prelude::*;

    const HALF: Vec2 = Vec2::new(0.25, 0.5);

    fn flat_world() -> StaticWorld {
        let mut world = StaticWorld::new();
        world.add_solid(Shape::Box(Aabb::from_min_max(
            Vec2::new(-50.0, -1.0),
            Vec2::new(50.0, 0.0),
        )));
        world
    }

    fn body_with(config: MovementConfig, bottom: Vec2) -> MotionResolver {
        MotionResolver::builder(config)
            .shape(Aabb::new(bottom + Vec2::new(0.0, HALF.y), HALF))
            .build()
            .expect("valid body")
    }

    fn body(bottom: Vec2) -> MotionResolver {
        body_with(MovementConfig::default(), bottom)
    }

    #[test]
    fn test_missing_shape_fails_fast() {
        let result = MotionResolver::builder(MovementConfig::default()).build();
        assert!(matches!(result, Err(ConfigError::MissingShape)));
    }

    #[test]
    fn test_shape_thinner_than_skin_rejected() {
        let result = MotionResolver::builder(MovementConfig::default())
            .shape(Aabb::new(Vec2::ZERO, Vec2::new(0.01, 0.5)))
            .build();
        assert!(matches!(result, Err(ConfigError::DegenerateShape(..))));
    }

    #[test]
    fn test_invalid_config_rejected_at_build() {
        let config = MovementConfig {
            skin_width: -0.1,
            ..Default::default()
        };
        let result = MotionResolver::builder(config)
            .shape(Aabb::new(Vec2::ZERO, HALF))
            .build();
        assert!(matches!(result, Err(ConfigError::NonPositiveSkinWidth(_))));
    }

    #[test]
    fn test_flat_landing() {
        let world = flat_world();
        let mut r = body(Vec2::new(0.0, 2.0));
        r.set_velocity(Vec2::new(0.0, -20.0));

        let mut landed_ticks = 0;
        for _ in 0..30 {
            r.update_physics(&world, SIM_DT);
            if r.collision().just_landed() {
                landed_ticks += 1;
            }
        }

        assert!(r.is_grounded());
        assert_eq!(r.physics().velocity.y, 0.0);
        assert!((r.collision().ground_distance - r.config().skin_width).abs() < 1e-3);
        assert!(r.bounds().min().y.abs() < 1e-3);
        assert_eq!(landed_ticks, 1);
    }

    #[test]
    fn test_wall_stop() {
        let mut world = flat_world();
        let skin = MovementConfig::default().skin_width;
        world.add_solid(Shape::Box(Aabb::from_min_max(
            Vec2::new(HALF.x + skin + 0.01, 0.0),
            Vec2::new(HALF.x + skin + 1.01, 3.0),
        )));
        let mut r = body(Vec2::ZERO);
        r.set_velocity(Vec2::new(5.0, 0.0));

        r.update_physics(&world, SIM_DT);
        assert!(r.collision().is_wall_right);
        assert!(r.is_against_wall());
        assert_eq!(r.physics().velocity.x, 0.0);
    }

    #[test]
    fn test_moving_platform_ride() {
        let mut world = StaticWorld::new();
        let platform = world.add_moving_platform(
            Shape::Box(Aabb::from_min_max(Vec2::new(-2.0, -0.5), Vec2::new(2.0, 0.0))),
            Layer::Solid,
            Vec2::new(2.0, 0.0),
        );
        let mut r = body(Vec2::ZERO);

        world.advance(SIM_DT);
        r.update_physics(&world, SIM_DT);

        assert!(r.collision().is_on_moving_platform);
        assert_eq!(r.collision().platform_reference, Some(platform));
        assert_eq!(r.physics().velocity.x, 0.0);
        assert!((r.position().x - 2.0 * SIM_DT).abs() < 1e-6);
    }

    #[test]
    fn test_walking_into_wall_never_passes_through() {
        for i in 0..40 {
            let mut world = flat_world();
            world.add_solid(Shape::Box(Aabb::from_min_max(
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 3.0),
            )));
            let right_edge = -1.0 - i as f32 * 0.01;
            let mut r = body(Vec2::new(right_edge - HALF.x, 0.0));

            for tick in 0..120 {
                r.move_axis(1.0);
                r.update_physics(&world, SIM_DT);
                assert!(
                    r.bounds().max().x <= 1e-4,
                    "start {} tick {}: right edge at {}",
                    right_edge,
                    tick,
                    r.bounds().max().x
                );
            }
            assert!(r.collision().is_wall_right, "start {}", right_edge);
            assert_eq!(r.physics().velocity.x, 0.0);
        }
    }

    #[test]
    fn test_rising_into_ceiling_never_passes_through() {
        for i in 0..40 {
            let gap = 0.3 + i as f32 * 0.01;
            let underside = 5.0 + gap;
            let mut world = StaticWorld::new();
            world.add_solid(Shape::Box(Aabb::from_min_max(
                Vec2::new(-2.0, underside),
                Vec2::new(2.0, underside + 1.0),
            )));
            let mut r = body(Vec2::new(0.0, 4.0));
            let ascent = r.config().ascent_velocity();

            let mut touched = false;
            for tick in 0..20 {
                if !r.collision().is_ceiling {
                    r.set_velocity(Vec2::new(0.0, ascent));
                }
                r.update_physics(&world, SIM_DT);
                touched |= r.collision().is_ceiling;
                assert!(
                    r.bounds().max().y <= underside + 1e-4,
                    "gap {} tick {}: head at {}",
                    gap,
                    tick,
                    r.bounds().max().y
                );
            }
            assert!(touched, "gap {}", gap);
        }
    }

    #[test]
    fn test_ceiling_blocks_upward_velocity() {
        let mut world = StaticWorld::new();
        world.add_solid(Shape::Box(Aabb::from_min_max(
            Vec2::new(-2.0, 1.03),
            Vec2::new(2.0, 2.0),
        )));
        let mut r = body(Vec2::ZERO);
        r.set_velocity(Vec2::new(0.0, 12.0));

        r.update_physics(&world, SIM_DT);
        assert!(r.collision().is_ceiling);
        assert_eq!(r.physics().velocity.y, 0.0);
        assert!(r.bounds().max().y <= 1.03 + 1e-5);
    }

    #[test]
    fn test_platform_moving_vertically_keeps_rider_flush() {
        for speed in [-2.0, 1.0] {
            let mut world = StaticWorld::new();
            let platform = world.add_moving_platform(
                Shape::Box(Aabb::from_min_max(Vec2::new(-2.0, -0.5), Vec2::new(2.0, 0.0))),
                Layer::Solid,
                Vec2::new(0.0, speed),
            );
            let mut r = body(Vec2::ZERO);

            for tick in 0..30 {
                world.advance(SIM_DT);
                r.update_physics(&world, SIM_DT);

                let top = match world.collider(platform).map(|c| &c.shape) {
                    Some(Shape::Box(b)) => b.max().y,
                    other => panic!("unexpected platform shape {:?}", other),
                };
                assert!(r.is_grounded(), "speed {} tick {}", speed, tick);
                assert!(
                    (r.bounds().min().y - top).abs() < 1e-3,
                    "speed {} tick {}: bottom {} vs top {}",
                    speed,
                    tick,
                    r.bounds().min().y,
                    top
                );
            }
        }
    }

    #[test]
    fn test_turn_around_beats_plain_deceleration() {
        let world = flat_world();
        let config = MovementConfig {
            max_move_speed: 8.0,
            ..Default::default()
        };
        let mut r = body_with(config, Vec2::ZERO);
        r.set_velocity(Vec2::new(8.0, 0.0));
        r.move_axis(1.0);
        r.update_physics(&world, SIM_DT);
        assert!(r.is_grounded());
        assert_eq!(r.physics().velocity.x, 8.0);

        let mut turning = r.clone();
        turning.move_axis(-1.0);
        assert!(turning.is_turning_around());
        turning.update_physics(&world, SIM_DT);

        let mut releasing = r.clone();
        releasing.move_axis(0.0);
        assert!(!releasing.is_turning_around());
        releasing.update_physics(&world, SIM_DT);

        let turn_delta = 8.0 - turning.physics().velocity.x;
        let release_delta = 8.0 - releasing.physics().velocity.x;
        assert!(turn_delta > release_delta);
        assert!((turn_delta - 2.0 * 2.0 * 80.0 * SIM_DT).abs() < 1e-4);
    }

    #[test]
    fn test_move_axis_clamps_and_sets_target() {
        let mut r = body(Vec2::ZERO);
        r.move_axis(3.0);
        assert_eq!(r.target_velocity_x(), r.config().move_speed);
        r.move_axis(f32::NAN);
        assert_eq!(r.target_velocity_x(), 0.0);
    }

    #[test]
    fn test_air_control_uses_mode_multiplier() {
        let world = StaticWorld::new();
        let mut normal = body(Vec2::new(0.0, 10.0));
        let mut down_jump = normal.clone();
        down_jump.set_down_jumping(true);
        down_jump.set_fast_falling(true);
        assert_eq!(down_jump.air_control(), AirControl::DownJump);

        for r in [&mut normal, &mut down_jump] {
            r.move_axis(1.0);
            r.update_physics(&world, SIM_DT);
        }

        let config = MovementConfig::default();
        let expected = 2.0 * config.air_acceleration * config.down_jump_air_control * SIM_DT;
        assert!((down_jump.physics().velocity.x - expected).abs() < 1e-5);
        assert!(normal.physics().velocity.x > down_jump.physics().velocity.x);
    }

    #[test]
    fn test_air_release_uses_air_deceleration() {
        let world = StaticWorld::new();
        let config = MovementConfig {
            air_friction: 0.5,
            ..Default::default()
        };
        let mut r = body_with(config.clone(), Vec2::new(0.0, 10.0));
        r.move_axis(0.0);
        let mut fast_fall = r.clone();
        fast_fall.set_fast_falling(true);

        for mover in [&mut r, &mut fast_fall] {
            mover.set_velocity(Vec2::new(6.0, 0.0));
            mover.update_physics(&world, SIM_DT);
        }

        // Releasing input in the air slows at air_deceleration, not air_acceleration
        let release = config.air_deceleration * config.air_friction * SIM_DT;
        assert!((r.physics().velocity.x - (6.0 - release)).abs() < 1e-5);
        let slowed = release * config.fast_fall_air_control;
        assert!((fast_fall.physics().velocity.x - (6.0 - slowed)).abs() < 1e-5);
    }

    #[test]
    fn test_walkable_slope_redirects_velocity() {
        let n = Vec2::new(-0.5, 3.0_f32.sqrt() / 2.0);
        let up = redirect_along_slope(Vec2::new(3.0, 0.0), n);
        assert!((up.length() - 3.0).abs() < 1e-5);
        assert!(up.x > 0.0 && up.y > 0.0);

        let down = redirect_along_slope(Vec2::new(-3.0, 0.0), n);
        assert!(down.x < 0.0 && down.y < 0.0);
    }

    #[test]
    fn test_walking_up_a_slope() {
        let k = 30.0_f32.to_radians().tan();
        let mut world = StaticWorld::new();
        world.add_solid(Shape::Segment(Segment::new(
            Vec2::new(-5.0, -5.0 * k),
            Vec2::new(5.0, 5.0 * k),
        )));
        // Right-most ground ray 0.03 above the incline
        let mut r = body(Vec2::new(0.0, 0.23 * k + 0.01));
        r.set_velocity(Vec2::new(4.0, 0.0));
        r.move_axis(0.5);
        let start = r.position();

        r.update_physics(&world, SIM_DT);
        assert!(r.collision().is_on_slope);
        assert!(r.collision().can_walk_on_slope);
        assert!(r.physics().velocity.y > 0.0);
        assert!(r.position().y > start.y);
    }

    #[test]
    fn test_steep_slope_does_not_redirect() {
        let k = 60.0_f32.to_radians().tan();
        let mut world = StaticWorld::new();
        world.add_solid(Shape::Segment(Segment::new(
            Vec2::new(-5.0, -5.0 * k),
            Vec2::new(5.0, 5.0 * k),
        )));
        let mut r = body(Vec2::new(0.0, 0.23 * k + 0.01));
        r.set_velocity(Vec2::new(-1.0, 0.0));

        r.update_physics(&world, SIM_DT);
        assert!(r.is_grounded());
        assert!(!r.collision().can_walk_on_slope);
        assert_eq!(r.physics().velocity.y, 0.0);
    }

    #[test]
    fn test_drop_through_one_way() {
        let mut world = StaticWorld::new();
        world.add_one_way(Segment::new(Vec2::new(-2.0, 0.0), Vec2::new(2.0, 0.0)));
        let mut r = body(Vec2::ZERO);
        r.update_physics(&world, SIM_DT);
        assert!(r.collision().is_on_one_way_platform);

        r.set_dropping_through(true);
        r.set_velocity(Vec2::new(0.0, -5.0));
        r.update_physics(&world, SIM_DT);
        assert!(!r.is_grounded());
        assert!(r.bounds().min().y < 0.0);
    }

    #[test]
    fn test_invalid_dt_skips_tick() {
        let world = flat_world();
        let mut r = body(Vec2::new(0.0, 1.0));
        r.set_velocity(Vec2::new(1.0, -1.0));
        r.add_force(Vec2::new(10.0, 0.0));
        let before = r.clone();

        for dt in [0.0, -SIM_DT, f32::NAN, f32::INFINITY] {
            r.update_physics(&world, dt);
        }
        assert_eq!(r.physics(), before.physics());
        assert_eq!(r.bounds(), before.bounds());
        assert_eq!(r.collision(), before.collision());
    }

    #[test]
    fn test_stop_clears_velocity_and_target() {
        let mut r = body(Vec2::ZERO);
        r.set_velocity(Vec2::new(3.0, 2.0));
        r.move_axis(1.0);
        r.stop();
        assert_eq!(r.physics().velocity, Vec2::ZERO);
        assert_eq!(r.target_velocity_x(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_force_is_single_use(
            height in 0.0f32..5.0,
            fx in -500.0f32..500.0,
            fy in -500.0f32..500.0,
            dt in 0.001f32..SIM_DT,
        ) {
            let world = flat_world();
            let mut r = body(Vec2::new(0.0, height));
            r.add_force(Vec2::new(fx, fy));
            r.update_physics(&world, dt);
            prop_assert_eq!(r.physics().external_force, Vec2::ZERO);
        }

        #[test]
        fn prop_velocity_clamped(
            height in 0.0f32..5.0,
            vx in -100.0f32..100.0,
            vy in -100.0f32..100.0,
            fx in -1000.0f32..1000.0,
            axis in -1.5f32..1.5,
        ) {
            let world = flat_world();
            let mut r = body(Vec2::new(0.0, height));
            r.set_velocity(Vec2::new(vx, vy));
            r.add_force(Vec2::new(fx, 0.0));
            r.move_axis(axis);
            r.update_physics(&world, SIM_DT);

            let v = r.physics().velocity;
            let config = r.config();
            prop_assert!(v.x.abs() <= config.max_move_speed);
            prop_assert!(v.y >= -config.max_fall_speed);
        }

        #[test]
        fn prop_no_tunneling(
            height in 0.0f32..3.0,
            fall in 0.0f32..=25.0,
            vx in -5.0f32..5.0,
            dt in 0.001f32..=SIM_DT,
        ) {
            let world = flat_world();
            let mut r = body(Vec2::new(0.0, height));
            r.set_velocity(Vec2::new(vx, -fall));
            r.update_physics(&world, dt);
            prop_assert!(r.bounds().min().y >= -1e-4);
        }
    }
}
