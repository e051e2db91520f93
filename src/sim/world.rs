//! Reference level: a flat list of colliders queried by brute force
//!
//! Good enough for tile rooms of a few hundred shapes. Colliders are kept in
//! id order so queries resolve exact ties the same way every run.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{Aabb, Segment, Shape};
use super::query::{BodyId, LayerFilter, PlatformInfo, PlatformRegistry, RayHit, SpatialQuery};
use crate::error::LevelError;

/// Collision layer a collider lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layer {
    Solid,
    OneWay,
}

impl Layer {
    #[inline]
    pub fn matches(&self, filter: LayerFilter) -> bool {
        matches!(
            (self, filter),
            (Layer::Solid, LayerFilter::Solid) | (Layer::OneWay, LayerFilter::OneWay)
        )
    }
}

/// A piece of level geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collider {
    pub id: BodyId,
    pub shape: Shape,
    pub layer: Layer,
    /// Set for moving platforms
    pub velocity: Option<Vec2>,
}

/// Brute-force spatial query over a collider list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticWorld {
    colliders: Vec<Collider>,
    next_id: u32,
}

impl StaticWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next body id
    pub fn next_body_id(&mut self) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        id
    }

    fn push(&mut self, shape: Shape, layer: Layer, velocity: Option<Vec2>) -> BodyId {
        let id = self.next_body_id();
        self.colliders.push(Collider {
            id,
            shape,
            layer,
            velocity,
        });
        id
    }

    /// Add geometry that blocks from every side
    pub fn add_solid(&mut self, shape: Shape) -> BodyId {
        self.push(shape, Layer::Solid, None)
    }

    /// Add a ledge that only blocks bodies landing on it from above
    pub fn add_one_way(&mut self, ledge: Segment) -> BodyId {
        self.push(Shape::Segment(ledge), Layer::OneWay, None)
    }

    /// Add a moving platform on either layer
    pub fn add_moving_platform(&mut self, shape: Shape, layer: Layer, velocity: Vec2) -> BodyId {
        self.push(shape, layer, Some(velocity))
    }

    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }

    pub fn collider(&self, id: BodyId) -> Option<&Collider> {
        // Ids are handed out in push order, so the list stays sorted
        self.colliders
            .binary_search_by_key(&id, |c| c.id)
            .ok()
            .map(|i| &self.colliders[i])
    }

    /// Change a platform's velocity. Returns false if `id` is not a platform.
    pub fn set_platform_velocity(&mut self, id: BodyId, velocity: Vec2) -> bool {
        match self.colliders.iter_mut().find(|c| c.id == id) {
            Some(collider) if collider.velocity.is_some() => {
                collider.velocity = Some(velocity);
                true
            }
            _ => false,
        }
    }

    /// Move every platform by its velocity.
    ///
    /// Call this before ticking any rider so riders read settled velocities.
    pub fn advance(&mut self, dt: f32) {
        for collider in &mut self.colliders {
            if let Some(velocity) = collider.velocity {
                collider.shape.translate(velocity * dt);
            }
        }
    }

    /// Build a level from an ASCII grid (first line is the top row).
    ///
    /// - `#` solid tile (horizontal runs merge into one box)
    /// - `=` one-way ledge along the tile's top edge
    /// - `/` slope rising to the right, `\` slope falling to the right
    /// - `.` or space: empty
    ///
    /// Tile (row 0, col 0) spans `x in [0, tile_size]` at the top of the level;
    /// the bottom row sits on `y = 0`.
    pub fn from_tiles(text: &str, tile_size: f32) -> Result<Self, LevelError> {
        if !(tile_size > 0.0) || !tile_size.is_finite() {
            return Err(LevelError::BadTileSize(tile_size));
        }

        let lines: Vec<&str> = text.lines().map(|l| l.trim_end_matches('\r')).collect();
        let first = lines.iter().position(|l| !l.trim().is_empty());
        let last = lines.iter().rposition(|l| !l.trim().is_empty());
        let rows: Vec<Vec<char>> = match (first, last) {
            (Some(first), Some(last)) => lines[first..=last]
                .iter()
                .map(|l| l.chars().collect())
                .collect(),
            _ => return Err(LevelError::Empty),
        };

        let width = rows[0].len();
        let height = rows.len();
        let mut world = Self::new();

        for (row, tiles) in rows.iter().enumerate() {
            if tiles.len() != width {
                return Err(LevelError::RaggedRow {
                    row,
                    len: tiles.len(),
                    expected: width,
                });
            }

            let bottom = (height - 1 - row) as f32 * tile_size;
            let top = bottom + tile_size;
            let mut col = 0;
            while col < width {
                let glyph = tiles[col];
                let x0 = col as f32 * tile_size;
                match glyph {
                    '#' | '=' => {
                        let run = tiles[col..].iter().take_while(|&&c| c == glyph).count();
                        let x1 = (col + run) as f32 * tile_size;
                        if glyph == '#' {
                            world.add_solid(Shape::Box(Aabb::from_min_max(
                                Vec2::new(x0, bottom),
                                Vec2::new(x1, top),
                            )));
                        } else {
                            world.add_one_way(Segment::new(Vec2::new(x0, top), Vec2::new(x1, top)));
                        }
                        col += run;
                        continue;
                    }
                    '/' => {
                        let x1 = x0 + tile_size;
                        world.add_solid(Shape::Segment(Segment::new(
                            Vec2::new(x0, bottom),
                            Vec2::new(x1, top),
                        )));
                    }
                    '\\' => {
                        let x1 = x0 + tile_size;
                        world.add_solid(Shape::Segment(Segment::new(
                            Vec2::new(x0, top),
                            Vec2::new(x1, bottom),
                        )));
                    }
                    '.' | ' ' => {}
                    _ => return Err(LevelError::UnknownTile { glyph, row, col }),
                }
                col += 1;
            }
        }

        log::debug!(
            "Built {}x{} tile level with {} colliders",
            width,
            height,
            world.colliders.len()
        );
        Ok(world)
    }
}

impl SpatialQuery for StaticWorld {
    fn raycast(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        filter: LayerFilter,
    ) -> Option<RayHit> {
        let mut best: Option<RayHit> = None;
        for collider in self.colliders.iter().filter(|c| c.layer.matches(filter)) {
            if let Some((distance, normal)) = collider.shape.raycast(origin, direction, max_distance)
            {
                if best.map_or(true, |b| distance < b.distance) {
                    best = Some(RayHit {
                        distance,
                        point: origin + direction * distance,
                        normal,
                        body: Some(collider.id),
                    });
                }
            }
        }
        best
    }
}

impl PlatformRegistry for StaticWorld {
    fn platform(&self, body: BodyId) -> Option<PlatformInfo> {
        self.collider(body)
            .and_then(|c| c.velocity)
            .map(|velocity| PlatformInfo { velocity })
    }
}
