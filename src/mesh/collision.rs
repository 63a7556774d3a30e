//! Wall queries against the tile grid.
//!
//! A character is treated as an axis-aligned square of half-width `radius`.
//! A tile blocks when its flags intersect the character's stop mask; tiles
//! outside the grid block anything stopped by WALL or IMPASS.

use bevy::math::Vec2;

use super::{Mesh, TileFlags, INVALID_TILE};
use crate::constants::{DIFF_JITTER, GRID_SIZE};

/// Result of a full wall query.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WallHit {
    /// Union of the blocking flags found
    pub flags: TileFlags,
    /// Unit direction out of the wall, or zero when no direction is evident
    pub normal: Vec2,
    /// Fraction of the character's footprint covered by blocking tiles
    pub pressure: f32,
}

impl WallHit {
    pub fn is_clear(&self) -> bool {
        self.flags.is_empty()
    }
}

/// One tile touched by a footprint.
struct Touch {
    center: Vec2,
    /// Overlap area relative to the footprint area
    weight: f32,
    blocking: TileFlags,
}

impl Mesh {
    fn blocking_flags(&self, gx: i32, gy: i32, mask: TileFlags) -> TileFlags {
        let tile = self
            .grid_index(gx, gy)
            .map_or(&INVALID_TILE, |idx| &self.tiles[idx]);
        tile.flags & mask
    }

    /// Visit every tile overlapped by the footprint. A zero radius samples
    /// the single tile under `pos` with full weight.
    fn for_each_touch(&self, pos: Vec2, radius: f32, mask: TileFlags, mut visit: impl FnMut(Touch)) {
        if radius <= 0.0 {
            let (gx, gy) = Mesh::tile_coords(pos);
            visit(Touch {
                center: Mesh::tile_center(gx, gy),
                weight: 1.0,
                blocking: self.blocking_flags(gx, gy, mask),
            });
            return;
        }

        let lo = pos - Vec2::splat(radius);
        let hi = pos + Vec2::splat(radius);
        let (gx0, gy0) = Mesh::tile_coords(lo);
        let (gx1, gy1) = Mesh::tile_coords(hi);
        let area = (2.0 * radius) * (2.0 * radius);

        for gy in gy0..=gy1 {
            for gx in gx0..=gx1 {
                let tile_lo = Vec2::new(gx as f32, gy as f32) * GRID_SIZE;
                let tile_hi = tile_lo + Vec2::splat(GRID_SIZE);
                let overlap = (hi.min(tile_hi) - lo.max(tile_lo)).max(Vec2::ZERO);
                let weight = overlap.x * overlap.y / area;
                if weight <= 0.0 {
                    continue;
                }
                visit(Touch {
                    center: Mesh::tile_center(gx, gy),
                    weight,
                    blocking: self.blocking_flags(gx, gy, mask),
                });
            }
        }
    }

    /// Blocking flags under the footprint; empty means the position is free.
    pub fn test_wall(&self, pos: Vec2, radius: f32, mask: TileFlags) -> TileFlags {
        let mut flags = TileFlags::empty();
        self.for_each_touch(pos, radius, mask, |t| flags |= t.blocking);
        flags
    }

    /// Blocking flags, escape normal and pressure in one pass.
    ///
    /// The normal is the negated, normalized sum of offsets toward blocking
    /// tile centers minus offsets toward open tile centers, each weighted by
    /// overlap. It is zero when the footprint is fully inside a wall and no
    /// direction stands out.
    pub fn hit_wall(&self, pos: Vec2, radius: f32, mask: TileFlags) -> WallHit {
        let mut hit = WallHit::default();
        let mut toward = Vec2::ZERO;

        self.for_each_touch(pos, radius, mask, |t| {
            let offset = (t.center - pos) * t.weight;
            if t.blocking.is_empty() {
                toward -= offset;
            } else {
                hit.flags |= t.blocking;
                hit.pressure += t.weight;
                toward += offset;
            }
        });

        if !hit.flags.is_empty() {
            hit.normal = -toward.normalize_or_zero();
        }
        hit
    }

    pub fn get_pressure(&self, pos: Vec2, radius: f32, mask: TileFlags) -> f32 {
        let mut pressure = 0.0;
        self.for_each_touch(pos, radius, mask, |t| {
            if !t.blocking.is_empty() {
                pressure += t.weight;
            }
        });
        pressure
    }

    /// Displacement toward lower pressure, found by sampling the eight
    /// neighbours half a tile away. Zero when no neighbour improves on
    /// `center_pressure`.
    pub fn get_diff(&self, pos: Vec2, radius: f32, center_pressure: f32, mask: TileFlags) -> Vec2 {
        let mut diff = Vec2::ZERO;
        let mut total = 0.0;

        for iy in -1..=1 {
            for ix in -1..=1 {
                if ix == 0 && iy == 0 {
                    continue;
                }
                let offset = Vec2::new(ix as f32, iy as f32) * DIFF_JITTER;
                let relief = center_pressure - self.get_pressure(pos + offset, radius, mask);
                if relief > 0.0 {
                    diff += offset * relief;
                    total += relief;
                }
            }
        }

        if total > 0.0 {
            diff / total
        } else {
            Vec2::ZERO
        }
    }
}
