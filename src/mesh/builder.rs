//! Mesh construction helpers: level arenas, walled rooms and Perlin terrain.

use noise::{NoiseFn, Perlin};

use super::{fan, Mesh, TileFlags, WaterSurface};
use crate::constants::GRID_SIZE;

/// Builder for test and demo meshes.
#[derive(Debug, Clone)]
pub struct MeshBuilder {
    tiles_x: i32,
    tiles_y: i32,
    fan: u8,
    border_walls: bool,
    terrain: Option<Terrain>,
    water: Option<WaterSurface>,
    flags: Vec<(i32, i32, TileFlags)>,
    slopes: Vec<(i32, i32, [f32; 4])>,
}

#[derive(Debug, Clone, Copy)]
struct Terrain {
    seed: u32,
    amplitude: f32,
    /// Noise feature size in tiles
    scale: f32,
}

impl MeshBuilder {
    pub fn new(tiles_x: i32, tiles_y: i32) -> Self {
        Self {
            tiles_x,
            tiles_y,
            fan: fan::FAN_TWO_FACED,
            border_walls: false,
            terrain: None,
            water: None,
            flags: Vec::new(),
            slopes: Vec::new(),
        }
    }

    pub fn fan(mut self, fan: u8) -> Self {
        self.fan = fan;
        self
    }

    /// Ring the grid with WALL tiles.
    pub fn border_walls(mut self) -> Self {
        self.border_walls = true;
        self
    }

    /// Rolling hills from 2D Perlin noise.
    pub fn perlin_terrain(mut self, seed: u32, amplitude: f32, scale: f32) -> Self {
        self.terrain = Some(Terrain {
            seed,
            amplitude,
            scale: scale.max(1.0),
        });
        self
    }

    pub fn water(mut self, surface_level: f32) -> Self {
        self.water = Some(WaterSurface {
            enabled: true,
            surface_level,
            douse_level: surface_level - 8.0,
        });
        self
    }

    pub fn flags(mut self, gx: i32, gy: i32, flags: TileFlags) -> Self {
        self.flags.push((gx, gy, flags));
        self
    }

    /// Fill a rectangle of tiles (inclusive) with flags.
    pub fn flag_rect(mut self, x0: i32, y0: i32, x1: i32, y1: i32, flags: TileFlags) -> Self {
        for gy in y0..=y1 {
            for gx in x0..=x1 {
                self.flags.push((gx, gy, flags));
            }
        }
        self
    }

    /// Explicit corner heights for one tile, applied after terrain.
    pub fn corners(mut self, gx: i32, gy: i32, z: [f32; 4]) -> Self {
        self.slopes.push((gx, gy, z));
        self
    }

    /// Uniform incline: every tile in the rectangle rises `rise` along +x.
    pub fn incline_x(mut self, x0: i32, y0: i32, x1: i32, y1: i32, rise: f32) -> Self {
        for gy in y0..=y1 {
            for gx in x0..=x1 {
                let base = (gx - x0) as f32 * rise;
                self.slopes
                    .push((gx, gy, [base, base + rise, base + rise, base]));
            }
        }
        self
    }

    pub fn build(self) -> Mesh {
        let fan_id = self.fan;
        let mut mesh = Mesh::with_fans(self.tiles_x, self.tiles_y, |_, _| fan_id);

        if let Some(terrain) = self.terrain {
            let perlin = Perlin::new(terrain.seed);
            let step = (GRID_SIZE * terrain.scale) as f64;
            mesh.apply_heights(|x, y| {
                let n = perlin.get([x as f64 / step, y as f64 / step]);
                (n as f32 * terrain.amplitude).max(0.0)
            });
            mesh.set_ambient(|x, y| {
                let n = perlin.get([y as f64 / step, x as f64 / step]);
                (128.0 + n * 96.0).clamp(0.0, 255.0) as u8
            });
        }

        for (gx, gy, z) in self.slopes {
            mesh.set_corner_heights(gx, gy, z);
        }

        if self.border_walls {
            let (w, h) = (mesh.tiles_x(), mesh.tiles_y());
            for gx in 0..w {
                mesh.add_flags(gx, 0, TileFlags::WALL);
                mesh.add_flags(gx, h - 1, TileFlags::WALL);
            }
            for gy in 0..h {
                mesh.add_flags(0, gy, TileFlags::WALL);
                mesh.add_flags(w - 1, gy, TileFlags::WALL);
            }
        }

        for (gx, gy, flags) in self.flags {
            mesh.add_flags(gx, gy, flags);
        }

        if let Some(water) = self.water {
            mesh.water = water;
        }

        tracing::debug!(
            tiles_x = mesh.tiles_x(),
            tiles_y = mesh.tiles_y(),
            vertices = mesh.vertex_count(),
            "mesh built"
        );
        mesh
    }
}
