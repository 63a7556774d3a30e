//! Quantized tile slopes.
//!
//! A twist packs the rise of a tile along X (low nibble) and Y (high nibble),
//! each in steps of [`TWIST_STEP`] centered on 7. The lookup table maps a
//! twist to its surface normal, the downhill pull of unit gravity, and the
//! map-axis facings used to tilt characters with sticky butts.

use bevy::math::Vec3;
use std::sync::OnceLock;

use crate::constants::{
    GRID_SIZE, MAP_TURN_OFFSET, TURN_UNITS, TWIST_COUNT, TWIST_FLAT, TWIST_STEP,
};

/// Per-twist derived quantities.
pub struct TwistTable {
    pub normal: [Vec3; TWIST_COUNT],
    /// Component of unit downward gravity parallel to the surface
    pub slide: [Vec3; TWIST_COUNT],
    /// Tilt about the X axis, as a map facing
    pub facing_x: [u16; TWIST_COUNT],
    /// Tilt about the Y axis, as a map facing
    pub facing_y: [u16; TWIST_COUNT],
}

impl TwistTable {
    fn build() -> Self {
        let mut table = TwistTable {
            normal: [Vec3::Z; TWIST_COUNT],
            slide: [Vec3::ZERO; TWIST_COUNT],
            facing_x: [MAP_TURN_OFFSET; TWIST_COUNT],
            facing_y: [MAP_TURN_OFFSET; TWIST_COUNT],
        };

        for twist in 0..TWIST_COUNT {
            let (zx, zy) = twist_rise(twist as u8);
            let normal = Vec3::new(-zx / GRID_SIZE, -zy / GRID_SIZE, 1.0).normalize();
            table.normal[twist] = normal;
            table.slide[twist] = Vec3::NEG_Z + normal * normal.z;
            table.facing_x[twist] = map_facing((zy / GRID_SIZE).atan());
            table.facing_y[twist] = map_facing(-(zx / GRID_SIZE).atan());
        }

        table
    }
}

fn map_facing(radians: f32) -> u16 {
    let turns = (radians / std::f32::consts::TAU * TURN_UNITS).round() as i32;
    (MAP_TURN_OFFSET as i32 + turns) as u16
}

pub fn twist_table() -> &'static TwistTable {
    static TABLE: OnceLock<TwistTable> = OnceLock::new();
    TABLE.get_or_init(TwistTable::build)
}

/// Quantized rise across one tile along X and Y.
pub fn twist_rise(twist: u8) -> (f32, f32) {
    let ix = (twist & 0x0F) as f32 - 7.0;
    let iy = (twist >> 4) as f32 - 7.0;
    (ix * TWIST_STEP, iy * TWIST_STEP)
}

/// Twist for a tile with corner heights ordered `(x0,y0) (x1,y0) (x1,y1) (x0,y1)`.
pub fn twist_from_corners(z: [f32; 4]) -> u8 {
    let zx = ((z[1] + z[2]) - (z[0] + z[3])) * 0.5;
    let zy = ((z[2] + z[3]) - (z[0] + z[1])) * 0.5;
    let quantize = |rise: f32| ((rise / TWIST_STEP).round().clamp(-7.0, 8.0) as i32 + 7) as u8;
    (quantize(zy) << 4) | quantize(zx)
}

pub fn is_flat(twist: u8) -> bool {
    twist == TWIST_FLAT
}
