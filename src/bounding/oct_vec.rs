//! Five-axis octagonal vectors.
//!
//! An [`OVec`] stores a point projected onto X, Y, Z and the two diagonals
//! `X+Y` and `Y-X`. Boxes built from these projections are octagonal prisms.

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Index, IndexMut, Mul, Neg, Sub, SubAssign};

use crate::constants::OCT_COUNT;
use crate::error::CoreError;

/// One of the five octagonal axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OctAxis {
    X = 0,
    Y = 1,
    Z = 2,
    XY = 3,
    YX = 4,
}

impl OctAxis {
    pub const ALL: [OctAxis; OCT_COUNT] = [
        OctAxis::X,
        OctAxis::Y,
        OctAxis::Z,
        OctAxis::XY,
        OctAxis::YX,
    ];

    /// Axes that lie in the horizontal plane
    pub const HORIZONTAL: [OctAxis; 4] = [OctAxis::X, OctAxis::Y, OctAxis::XY, OctAxis::YX];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Lenient index conversion: panics in debug builds, clamps in release.
    pub fn clamped(index: usize) -> OctAxis {
        debug_assert!(index < OCT_COUNT, "octagonal axis {index} out of range");
        OctAxis::ALL[index.min(OCT_COUNT - 1)]
    }
}

impl TryFrom<usize> for OctAxis {
    type Error = CoreError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        OctAxis::ALL
            .get(index)
            .copied()
            .ok_or(CoreError::OutOfRange(index))
    }
}

/// A point in octagonal coordinates: `[x, y, z, x+y, y-x]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OVec(pub [f32; OCT_COUNT]);

impl OVec {
    pub const ZERO: OVec = OVec([0.0; OCT_COUNT]);

    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        OVec([x, y, z, x + y, y - x])
    }

    pub fn from_point(p: Vec3) -> Self {
        Self::from_xyz(p.x, p.y, p.z)
    }

    /// Value on every axis set to `v`. Used for symmetric extents.
    pub fn splat(v: f32) -> Self {
        OVec([v; OCT_COUNT])
    }

    pub fn get(&self, axis: OctAxis) -> f32 {
        self.0[axis.index()]
    }

    /// Strict indexed access.
    pub fn at(&self, index: usize) -> Result<f32, CoreError> {
        OctAxis::try_from(index).map(|axis| self.get(axis))
    }

    pub fn xyz(&self) -> Vec3 {
        Vec3::new(self.0[0], self.0[1], self.0[2])
    }

    /// Whether the diagonal axes agree with X and Y within `eps`.
    pub fn is_consistent(&self, eps: f32) -> bool {
        let [x, y, _, xy, yx] = self.0;
        (xy - (x + y)).abs() <= eps && (yx - (y - x)).abs() <= eps
    }

    pub fn min(&self, other: &OVec) -> OVec {
        let mut out = *self;
        for (o, b) in out.0.iter_mut().zip(other.0.iter()) {
            *o = o.min(*b);
        }
        out
    }

    pub fn max(&self, other: &OVec) -> OVec {
        let mut out = *self;
        for (o, b) in out.0.iter_mut().zip(other.0.iter()) {
            *o = o.max(*b);
        }
        out
    }

    pub fn lerp(&self, other: &OVec, t: f32) -> OVec {
        let mut out = *self;
        for (o, b) in out.0.iter_mut().zip(other.0.iter()) {
            *o += (*b - *o) * t;
        }
        out
    }
}

impl Index<OctAxis> for OVec {
    type Output = f32;

    fn index(&self, axis: OctAxis) -> &f32 {
        &self.0[axis.index()]
    }
}

impl IndexMut<OctAxis> for OVec {
    fn index_mut(&mut self, axis: OctAxis) -> &mut f32 {
        &mut self.0[axis.index()]
    }
}

impl Add for OVec {
    type Output = OVec;

    fn add(mut self, rhs: OVec) -> OVec {
        self += rhs;
        self
    }
}

impl AddAssign for OVec {
    fn add_assign(&mut self, rhs: OVec) {
        for (a, b) in self.0.iter_mut().zip(rhs.0.iter()) {
            *a += *b;
        }
    }
}

impl Sub for OVec {
    type Output = OVec;

    fn sub(mut self, rhs: OVec) -> OVec {
        self -= rhs;
        self
    }
}

impl SubAssign for OVec {
    fn sub_assign(&mut self, rhs: OVec) {
        for (a, b) in self.0.iter_mut().zip(rhs.0.iter()) {
            *a -= *b;
        }
    }
}

impl Mul<f32> for OVec {
    type Output = OVec;

    fn mul(mut self, rhs: f32) -> OVec {
        for a in self.0.iter_mut() {
            *a *= rhs;
        }
        self
    }
}

impl Neg for OVec {
    type Output = OVec;

    fn neg(self) -> OVec {
        self * -1.0
    }
}
