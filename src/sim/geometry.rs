//! Level and body geometry
//!
//! Bodies are axis-aligned boxes. Level geometry is either a box (solid
//! tiles, moving platforms) or a line segment (slopes, one-way ledges).
//! Both support a single-hit raycast returning the distance along the ray and
//! the surface normal facing the ray origin.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned box stored as center + half extents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center: Vec2,
    pub half_extents: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self {
            center: (min + max) * 0.5,
            half_extents: (max - min) * 0.5,
        }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.half_extents.x * 2.0
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.half_extents.y * 2.0
    }

    /// Shrink every side inward by `amount` (never below zero extent)
    pub fn shrink(&self, amount: f32) -> Self {
        Self {
            center: self.center,
            half_extents: (self.half_extents - Vec2::splat(amount)).max(Vec2::ZERO),
        }
    }

    /// Slab raycast. `direction` must be unit length.
    ///
    /// Rays starting inside the box report no hit.
    pub fn raycast(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<(f32, Vec2)> {
        let min = self.min().to_array();
        let max = self.max().to_array();
        let o = origin.to_array();
        let d = direction.to_array();

        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        let mut normal = Vec2::ZERO;

        for axis in 0..2 {
            if d[axis].abs() < 1.0e-12 {
                // Parallel to this slab: must already be between its planes
                if o[axis] < min[axis] || o[axis] > max[axis] {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d[axis];
            let mut t0 = (min[axis] - o[axis]) * inv;
            let mut t1 = (max[axis] - o[axis]) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }

            if t0 > t_enter {
                t_enter = t0;
                let mut n = [0.0; 2];
                n[axis] = -d[axis].signum();
                normal = Vec2::from_array(n);
            }
            t_exit = t_exit.min(t1);
            if t_enter > t_exit {
                return None;
            }
        }

        if t_enter < 0.0 || t_enter > max_distance {
            return None;
        }
        Some((t_enter, normal))
    }
}

/// Two-sided line segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub a: Vec2,
    pub b: Vec2,
}

impl Segment {
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self { a, b }
    }

    /// Ray/segment intersection. `direction` must be unit length.
    ///
    /// The returned normal always faces back toward the ray origin.
    pub fn raycast(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<(f32, Vec2)> {
        let edge = self.b - self.a;
        let denom = direction.perp_dot(edge);
        if denom.abs() < 1.0e-9 {
            return None;
        }

        let to_a = self.a - origin;
        let t = to_a.perp_dot(edge) / denom;
        let u = to_a.perp_dot(direction) / denom;
        if t < 0.0 || t > max_distance || !(0.0..=1.0).contains(&u) {
            return None;
        }

        let mut normal = edge.perp().normalize_or_zero();
        if normal.dot(direction) > 0.0 {
            normal = -normal;
        }
        Some((t, normal))
    }
}

/// Collision shape for level geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Box(Aabb),
    Segment(Segment),
}

impl Shape {
    pub fn raycast(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<(f32, Vec2)> {
        match self {
            Shape::Box(aabb) => aabb.raycast(origin, direction, max_distance),
            Shape::Segment(segment) => segment.raycast(origin, direction, max_distance),
        }
    }

    /// Move the shape rigidly (moving platforms)
    pub fn translate(&mut self, delta: Vec2) {
        match self {
            Shape::Box(aabb) => aabb.center += delta,
            Shape::Segment(segment) => {
                segment.a += delta;
                segment.b += delta;
            }
        }
    }
}
