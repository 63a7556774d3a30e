//! Character world matrices
//!
//! - Plain characters: translation, map tilt, facing and scale
//! - Held items: built from four grip points on the holder's model
//! - [`MatrixCache`] records the inputs of the last build so unchanged
//!   characters skip the work
//! - Reflections mirror the matrix in the floor plane

pub mod update;

use bevy::math::{Mat4, Vec2, Vec3, Vec4};

use crate::character::{ChrRef, Slot};
use crate::constants::{GRIP_VERTS, MAP_TURN_OFFSET, TURN_UNITS};

/// Inputs of a free-standing character's matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterXform {
    pub pos: Vec3,
    pub scale: Vec3,
    pub facing_z: u16,
    pub map_x: u16,
    pub map_y: u16,
}

/// Inputs of a held item's matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponXform {
    pub holder: ChrRef,
    pub slot: Slot,
    pub grip_verts: [usize; GRIP_VERTS],
    pub holder_matrix: Mat4,
    pub holder_frame_lst: usize,
    pub holder_frame_nxt: usize,
    pub holder_flip: f32,
    pub scale: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatrixInputs {
    Character(CharacterXform),
    Weapon(WeaponXform),
}

/// Where an item is gripped, recorded when it is attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GripBinding {
    pub holder: ChrRef,
    pub slot: Slot,
    pub verts: [usize; GRIP_VERTS],
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MatrixCache {
    /// `inputs` describe the current matrix
    pub valid: bool,
    /// The matrix was built and nothing has invalidated it since
    pub matrix_valid: bool,
    pub inputs: Option<MatrixInputs>,
    pub grip: Option<GripBinding>,
}

impl MatrixCache {
    pub fn invalidate(&mut self) {
        self.matrix_valid = false;
    }

    /// Whether `fresh` inputs require rebuilding the matrix.
    pub fn needs_update(&self, fresh: &MatrixInputs) -> bool {
        !self.valid || !self.matrix_valid || self.inputs.as_ref() != Some(fresh)
    }

    pub fn store(&mut self, inputs: MatrixInputs) {
        self.inputs = Some(inputs);
        self.valid = true;
        self.matrix_valid = true;
    }
}

/// Reflection of a character in the floor below it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReflectionCache {
    pub valid: bool,
    pub matrix: Mat4,
    pub floor: f32,
    pub alpha: u8,
}

impl Default for ReflectionCache {
    fn default() -> Self {
        Self {
            valid: false,
            matrix: Mat4::IDENTITY,
            floor: 0.0,
            alpha: 0,
        }
    }
}

pub fn facing_to_radians(facing: u16) -> f32 {
    facing as f32 / TURN_UNITS * std::f32::consts::TAU
}

pub fn radians_to_facing(radians: f32) -> u16 {
    (radians / std::f32::consts::TAU * TURN_UNITS).round() as i64 as u16
}

/// Facing that points along `dir` (0 = +x, counter-clockwise).
pub fn vec_to_facing(dir: Vec2) -> u16 {
    radians_to_facing(dir.y.atan2(dir.x))
}

pub fn facing_to_vec(facing: u16) -> Vec2 {
    let a = facing_to_radians(facing);
    Vec2::new(a.cos(), a.sin())
}

/// Tilt angle of a map facing, zero at [`MAP_TURN_OFFSET`].
pub fn map_turn_to_radians(turn: u16) -> f32 {
    facing_to_radians(turn.wrapping_sub(MAP_TURN_OFFSET))
}

/// `T(pos) * Ry(map_y) * Rx(map_x) * Rz(facing) * S(scale)`
pub fn character_matrix(x: &CharacterXform) -> Mat4 {
    Mat4::from_translation(x.pos)
        * Mat4::from_rotation_y(map_turn_to_radians(x.map_y))
        * Mat4::from_rotation_x(map_turn_to_radians(x.map_x))
        * Mat4::from_rotation_z(facing_to_radians(x.facing_z))
        * Mat4::from_scale(x.scale)
}

/// Frame from four grip points: origin at `p[3]`, X toward `p[0]`, Y toward
/// `p[1]` made orthogonal to X, Z completing the basis on the side of `p[2]`.
/// `None` when the points are degenerate.
pub fn four_points(p: [Vec3; 4], scale: Vec3) -> Option<Mat4> {
    let origin = p[3];
    let x = (p[0] - origin).try_normalize()?;
    let y_raw = p[1] - origin;
    let y = (y_raw - x * y_raw.dot(x)).try_normalize()?;
    let mut z = x.cross(y);
    if z.dot(p[2] - origin) < 0.0 {
        z = -z;
    }

    Some(Mat4::from_cols(
        (x * scale.x).extend(0.0),
        (y * scale.y).extend(0.0),
        (z * scale.z).extend(0.0),
        origin.extend(1.0),
    ))
}

/// Mirror of `matrix` in the plane `z = floor`.
pub fn reflection_matrix(matrix: &Mat4, floor: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, 0.0, 2.0 * floor))
        * Mat4::from_scale(Vec3::new(1.0, 1.0, -1.0))
        * *matrix
}

/// Reflections fade out linearly as the character rises above the floor.
pub fn reflection_alpha(alpha: u8, z: f32, floor: f32) -> u8 {
    let fade = (255.0 - (z - floor)).clamp(0.0, 255.0) / 255.0;
    (alpha as f32 * fade) as u8
}

pub fn matrix_translation(matrix: &Mat4) -> Vec3 {
    matrix.w_axis.truncate()
}

/// Apply a matrix to a point.
pub fn transform_point(matrix: &Mat4, p: Vec3) -> Vec3 {
    (*matrix * Vec4::new(p.x, p.y, p.z, 1.0)).truncate()
}
