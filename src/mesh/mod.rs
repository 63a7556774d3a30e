//! Tile mesh
//!
//! - Rectangular grid of square tiles, each owning a chain of vertices
//! - Bilinear floor height and lighting queries
//! - Per-tile flags and quantized slope ("twist")
//! - Wall, pressure and push-out queries (see [`collision`])

pub mod builder;
pub mod collision;
pub mod fan;
pub mod flags;
pub mod twist;

pub use builder::MeshBuilder;
pub use collision::WallHit;
pub use flags::TileFlags;

use bevy::math::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::{BLOCK_SIZE, BLOCK_TILES, CORNER_COUNT, GRID_SIZE, TWIST_FLAT};

/// One vertex of a tile fan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshVertex {
    pub pos: Vec3,
    /// Baked ambient light, 0..=255
    pub ambient: u8,
    /// Dynamic light accumulated by the renderer
    pub light: f32,
    /// Next vertex of the same tile
    pub next: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    /// Fan template byte, see [`fan`]
    pub fan: u8,
    /// Texture index; low bits animate when [`TileFlags::ANIM`] is set
    pub img: u16,
    pub flags: TileFlags,
    pub twist: u8,
    /// First vertex of this tile's chain
    pub vrt_start: usize,
}

/// Stand-in for every tile outside the grid.
pub const INVALID_TILE: Tile = Tile {
    fan: fan::FAN_TWO_FACED,
    img: 0,
    flags: TileFlags::BLOCKING,
    twist: TWIST_FLAT,
    vrt_start: usize::MAX,
};

/// Water covering all WATER tiles of a module.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterSurface {
    pub enabled: bool,
    /// Height characters float at when walking on water
    pub surface_level: f32,
    /// Height below which fire is doused
    pub douse_level: f32,
}

/// The terrain grid.
#[derive(Debug, Clone)]
pub struct Mesh {
    tiles_x: i32,
    tiles_y: i32,
    tiles: Vec<Tile>,
    vertices: Vec<MeshVertex>,
    pub water: WaterSurface,
}

impl Mesh {
    /// Level mesh at height zero built from plain quads.
    pub fn new(tiles_x: i32, tiles_y: i32) -> Self {
        Self::with_fans(tiles_x, tiles_y, |_, _| fan::FAN_TWO_FACED)
    }

    /// Level mesh with a fan template chosen per tile.
    pub fn with_fans(tiles_x: i32, tiles_y: i32, fan_for: impl Fn(i32, i32) -> u8) -> Self {
        let (tiles_x, tiles_y) = (tiles_x.max(1), tiles_y.max(1));
        let mut tiles = Vec::with_capacity((tiles_x * tiles_y) as usize);
        let mut vertices = Vec::new();

        for gy in 0..tiles_y {
            for gx in 0..tiles_x {
                let fan_id = fan_for(gx, gy);
                let template = fan::template(fan_id);
                let start = vertices.len();
                let origin = Vec2::new(gx as f32, gy as f32) * GRID_SIZE;
                let count = template.vertex_count();
                for (i, [u, v]) in template.offsets.iter().enumerate() {
                    vertices.push(MeshVertex {
                        pos: Vec3::new(origin.x + u * GRID_SIZE, origin.y + v * GRID_SIZE, 0.0),
                        ambient: 0,
                        light: 0.0,
                        next: (i + 1 < count).then_some(start + i + 1),
                    });
                }
                tiles.push(Tile {
                    fan: fan_id,
                    img: 0,
                    flags: TileFlags::empty(),
                    twist: TWIST_FLAT,
                    vrt_start: start,
                });
            }
        }

        Self {
            tiles_x,
            tiles_y,
            tiles,
            vertices,
            water: WaterSurface::default(),
        }
    }

    pub fn tiles_x(&self) -> i32 {
        self.tiles_x
    }

    pub fn tiles_y(&self) -> i32 {
        self.tiles_y
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// World extent along X.
    pub fn edge_x(&self) -> f32 {
        self.tiles_x as f32 * GRID_SIZE
    }

    pub fn edge_y(&self) -> f32 {
        self.tiles_y as f32 * GRID_SIZE
    }

    pub fn blocks_x(&self) -> i32 {
        (self.tiles_x + BLOCK_TILES - 1) / BLOCK_TILES
    }

    /// Tile coordinates containing a world position. May lie outside the grid.
    pub fn tile_coords(pos: Vec2) -> (i32, i32) {
        (
            (pos.x / GRID_SIZE).floor() as i32,
            (pos.y / GRID_SIZE).floor() as i32,
        )
    }

    pub fn grid_index(&self, gx: i32, gy: i32) -> Option<usize> {
        if gx < 0 || gy < 0 || gx >= self.tiles_x || gy >= self.tiles_y {
            return None;
        }
        Some((gy * self.tiles_x + gx) as usize)
    }

    /// Tile index under a world position.
    pub fn grid_at(&self, pos: Vec2) -> Option<usize> {
        let (gx, gy) = Self::tile_coords(pos);
        self.grid_index(gx, gy)
    }

    /// Collision block under a world position.
    pub fn block_at(&self, pos: Vec2) -> Option<usize> {
        self.grid_at(pos)?;
        let bx = (pos.x / BLOCK_SIZE).floor() as i32;
        let by = (pos.y / BLOCK_SIZE).floor() as i32;
        Some((by * self.blocks_x() + bx) as usize)
    }

    /// Tile by coordinates; outside the grid this is [`INVALID_TILE`].
    pub fn tile_at(&self, gx: i32, gy: i32) -> &Tile {
        self.grid_index(gx, gy)
            .map_or(&INVALID_TILE, |idx| &self.tiles[idx])
    }

    pub fn tile(&self, idx: usize) -> Option<&Tile> {
        self.tiles.get(idx)
    }

    pub fn tile_center(gx: i32, gy: i32) -> Vec2 {
        Vec2::new(gx as f32 + 0.5, gy as f32 + 0.5) * GRID_SIZE
    }

    pub fn has_flags(&self, idx: Option<usize>, flags: TileFlags) -> bool {
        let tile_flags = idx
            .and_then(|i| self.tiles.get(i))
            .map_or(INVALID_TILE.flags, |t| t.flags);
        tile_flags.intersects(flags)
    }

    pub fn set_flags(&mut self, gx: i32, gy: i32, flags: TileFlags) {
        if let Some(idx) = self.grid_index(gx, gy) {
            self.tiles[idx].flags = flags;
            self.refresh_twist(idx);
        }
    }

    pub fn add_flags(&mut self, gx: i32, gy: i32, flags: TileFlags) {
        if let Some(idx) = self.grid_index(gx, gy) {
            self.tiles[idx].flags |= flags;
            self.refresh_twist(idx);
        }
    }

    pub fn set_image(&mut self, gx: i32, gy: i32, img: u16) {
        if let Some(idx) = self.grid_index(gx, gy) {
            self.tiles[idx].img = img;
        }
    }

    /// Texture shown this frame. Animated tiles step through the frames
    /// selected by `frame_and`, offset by the global `frame_add` counter.
    pub fn animated_image(&self, idx: usize, frame_add: u16, frame_and: u16) -> Option<u16> {
        let tile = self.tiles.get(idx)?;
        if !tile.flags.contains(TileFlags::ANIM) {
            return Some(tile.img);
        }
        let base = tile.img & !frame_and;
        Some(base | (tile.img.wrapping_add(frame_add) & frame_and))
    }

    /// Vertex chain of a tile, corners first.
    pub fn tile_vertices(&self, idx: usize) -> impl Iterator<Item = &MeshVertex> + '_ {
        let start = self.tiles.get(idx).map(|t| t.vrt_start);
        std::iter::successors(start.and_then(|s| self.vertices.get(s)), move |v| {
            v.next.and_then(|n| self.vertices.get(n))
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    fn corners(&self, idx: usize) -> [MeshVertex; CORNER_COUNT] {
        let start = self.tiles[idx].vrt_start;
        [
            self.vertices[start],
            self.vertices[start + 1],
            self.vertices[start + 2],
            self.vertices[start + 3],
        ]
    }

    pub fn corner_heights(&self, idx: usize) -> Option<[f32; CORNER_COUNT]> {
        self.tiles.get(idx)?;
        Some(self.corners(idx).map(|v| v.pos.z))
    }

    /// Set the four corner heights of a tile. Inner fan vertices are blended
    /// from the corners.
    pub fn set_corner_heights(&mut self, gx: i32, gy: i32, z: [f32; CORNER_COUNT]) {
        let Some(idx) = self.grid_index(gx, gy) else {
            return;
        };
        let origin = Vec2::new(gx as f32, gy as f32) * GRID_SIZE;
        let mut cursor = Some(self.tiles[idx].vrt_start);
        while let Some(v) = cursor {
            let vert = &mut self.vertices[v];
            let uv = (vert.pos.truncate() - origin) / GRID_SIZE;
            vert.pos.z = bilerp(z, uv.x, uv.y);
            cursor = vert.next;
        }
        self.refresh_twist(idx);
    }

    /// Set every vertex height from a function of world position.
    pub fn apply_heights(&mut self, height: impl Fn(f32, f32) -> f32) {
        for v in &mut self.vertices {
            v.pos.z = height(v.pos.x, v.pos.y);
        }
        for idx in 0..self.tiles.len() {
            self.refresh_twist(idx);
        }
    }

    pub fn set_ambient(&mut self, ambient: impl Fn(f32, f32) -> u8) {
        for v in &mut self.vertices {
            v.ambient = ambient(v.pos.x, v.pos.y);
        }
    }

    fn refresh_twist(&mut self, idx: usize) {
        let twist = if self.tiles[idx].flags.intersects(TileFlags::BLOCKING) {
            TWIST_FLAT
        } else {
            twist::twist_from_corners(self.corners(idx).map(|v| v.pos.z))
        };
        self.tiles[idx].twist = twist;
    }

    pub fn twist_at(&self, idx: Option<usize>) -> u8 {
        idx.and_then(|i| self.tiles.get(i))
            .map_or(TWIST_FLAT, |t| t.twist)
    }

    /// Floor height at a world position. Zero outside the grid. Characters
    /// that walk on water stand on the surface over WATER tiles.
    pub fn height_at(&self, pos: Vec2, waterwalk: bool) -> f32 {
        let Some(idx) = self.grid_at(pos) else {
            return 0.0;
        };
        let (gx, gy) = Self::tile_coords(pos);
        let uv = (pos - Vec2::new(gx as f32, gy as f32) * GRID_SIZE) / GRID_SIZE;
        let floor = bilerp(self.corners(idx).map(|v| v.pos.z), uv.x, uv.y);

        if waterwalk
            && self.water.enabled
            && self.tiles[idx].flags.contains(TileFlags::WATER)
            && self.water.surface_level > floor
        {
            return self.water.surface_level;
        }
        floor
    }

    /// Baked plus dynamic light at a world position, 0..=255.
    pub fn light_at(&self, pos: Vec2) -> f32 {
        let Some(idx) = self.grid_at(pos) else {
            return 0.0;
        };
        let (gx, gy) = Self::tile_coords(pos);
        let uv = (pos - Vec2::new(gx as f32, gy as f32) * GRID_SIZE) / GRID_SIZE;
        let light = self.corners(idx).map(|v| v.ambient as f32 + v.light);
        bilerp(light, uv.x, uv.y).clamp(0.0, 255.0)
    }
}

/// Blend corner values ordered `(0,0) (1,0) (1,1) (0,1)`.
fn bilerp(c: [f32; 4], u: f32, v: f32) -> f32 {
    let (u, v) = (u.clamp(0.0, 1.0), v.clamp(0.0, 1.0));
    c[0] * (1.0 - u) * (1.0 - v) + c[1] * u * (1.0 - v) + c[2] * u * v + c[3] * (1.0 - u) * v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outside_grid_is_invalid() {
        let mesh = Mesh::new(4, 4);
        assert_eq!(mesh.grid_at(Vec2::new(-1.0, 10.0)), None);
        assert_eq!(mesh.tile_at(4, 0), &INVALID_TILE);
        assert!(mesh.has_flags(None, TileFlags::WALL));
        assert!((mesh.height_at(Vec2::new(-5.0, -5.0), false)).abs() < f32::EPSILON);
    }

    #[test]
    fn test_corner_heights_blend() {
        let mut mesh = Mesh::with_fans(2, 2, |_, _| fan::FAN_EIGHT_FACED);
        mesh.set_corner_heights(0, 0, [0.0, 100.0, 100.0, 0.0]);
        let mid = mesh.height_at(Vec2::new(64.0, 64.0), false);
        assert!((mid - 50.0).abs() < 1e-4);
        // inner vertices follow the corners
        let center = mesh.tile_vertices(0).last().unwrap();
        assert!((center.pos.z - 50.0).abs() < 1e-4);
        assert_eq!(mesh.tile_vertices(0).count(), 9);
    }

    #[test]
    fn test_wall_tiles_are_flat() {
        let mut mesh = Mesh::new(2, 1);
        mesh.set_corner_heights(0, 0, [0.0, 64.0, 64.0, 0.0]);
        assert_ne!(mesh.twist_at(Some(0)), TWIST_FLAT);
        mesh.add_flags(0, 0, TileFlags::WALL);
        assert_eq!(mesh.twist_at(Some(0)), TWIST_FLAT);
    }

    #[test]
    fn test_water_surface_for_waterwalkers() {
        let mut mesh = Mesh::new(2, 2);
        mesh.water = WaterSurface {
            enabled: true,
            surface_level: 40.0,
            douse_level: 30.0,
        };
        mesh.add_flags(1, 1, TileFlags::WATER);
        let p = Vec2::new(190.0, 190.0);
        assert!((mesh.height_at(p, true) - 40.0).abs() < f32::EPSILON);
        assert!(mesh.height_at(p, false).abs() < f32::EPSILON);
    }

    #[test]
    fn test_animated_image_cycles_low_bits() {
        let mut mesh = Mesh::new(1, 1);
        mesh.set_image(0, 0, 0x10);
        mesh.add_flags(0, 0, TileFlags::ANIM);
        assert_eq!(mesh.animated_image(0, 1, 0x03), Some(0x11));
        assert_eq!(mesh.animated_image(0, 4, 0x03), Some(0x10));
    }
}
