//! Octagonal bounding boxes.
//!
//! An [`OctBb`] holds per-axis `mins` and `maxs` over the five octagonal axes.
//! The `empty` flag is authoritative: an empty box has no meaningful extents
//! and every accessor that would expose them returns
//! [`CoreError::EmptyBoundingVolume`].

use bevy::math::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::oct_vec::{OVec, OctAxis};
use super::Bumper;
use crate::constants::OCT_COUNT;
use crate::error::{CoreError, CoreResult};

/// Largest outline of an octagonal slice: a square clipped by four diagonals.
const OUTLINE_MAX: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OctBb {
    empty: bool,
    mins: OVec,
    maxs: OVec,
}

impl Default for OctBb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl OctBb {
    pub const EMPTY: OctBb = OctBb {
        empty: true,
        mins: OVec::ZERO,
        maxs: OVec::ZERO,
    };

    /// Box from explicit extents. Marked empty if any axis is inverted.
    pub fn new(mins: OVec, maxs: OVec) -> Self {
        let mut bb = Self {
            empty: false,
            mins,
            maxs,
        };
        bb.validate();
        bb
    }

    pub fn from_point(p: Vec3) -> Self {
        let v = OVec::from_point(p);
        Self::new(v, v)
    }

    /// Local-space volume described by a bumper, standing on z = 0.
    pub fn from_bumper(bump: &Bumper) -> Self {
        let (s, b) = (bump.size.max(0.0), bump.size_big.max(0.0));
        Self::new(
            OVec([-s, -s, 0.0, -b, -b]),
            OVec([s, s, bump.height.max(0.0), b, b]),
        )
    }

    /// Smallest box enclosing all points. Empty for an empty slice.
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut bb = Self::EMPTY;
        for p in points {
            bb.join_point(*p);
        }
        bb
    }

    fn validate(&mut self) {
        self.empty = self
            .mins
            .0
            .iter()
            .zip(self.maxs.0.iter())
            .any(|(lo, hi)| !(lo <= hi));
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn mins(&self) -> CoreResult<&OVec> {
        if self.empty {
            return Err(CoreError::EmptyBoundingVolume);
        }
        Ok(&self.mins)
    }

    pub fn maxs(&self) -> CoreResult<&OVec> {
        if self.empty {
            return Err(CoreError::EmptyBoundingVolume);
        }
        Ok(&self.maxs)
    }

    pub fn mid(&self) -> CoreResult<OVec> {
        Ok((*self.mins()? + *self.maxs()?) * 0.5)
    }

    /// `(min, max)` on one axis.
    pub fn extent(&self, axis: OctAxis) -> CoreResult<(f32, f32)> {
        Ok((self.mins()?[axis], self.maxs()?[axis]))
    }

    pub fn join_vec(&mut self, v: &OVec) {
        if self.empty {
            self.mins = *v;
            self.maxs = *v;
            self.empty = false;
        } else {
            self.mins = self.mins.min(v);
            self.maxs = self.maxs.max(v);
        }
    }

    pub fn join_point(&mut self, p: Vec3) {
        self.join_vec(&OVec::from_point(p));
    }

    /// Union. An empty operand is the identity.
    pub fn join(&self, other: &OctBb) -> OctBb {
        match (self.empty, other.empty) {
            (true, _) => *other,
            (_, true) => *self,
            _ => OctBb::new(self.mins.min(&other.mins), self.maxs.max(&other.maxs)),
        }
    }

    /// Intersection, which may be empty.
    pub fn intersection(&self, other: &OctBb) -> OctBb {
        if self.empty || other.empty {
            return Self::EMPTY;
        }
        OctBb::new(self.mins.max(&other.mins), self.maxs.min(&other.maxs))
    }

    /// Intersection that must be non-empty.
    pub fn cut(&self, other: &OctBb) -> CoreResult<OctBb> {
        let out = self.intersection(other);
        if out.empty {
            return Err(CoreError::EmptyBoundingVolume);
        }
        Ok(out)
    }

    /// Extend along a single axis only.
    pub fn restricted_join(&self, other: &OctBb, axis: OctAxis) -> OctBb {
        if self.empty || other.empty {
            return *self;
        }
        let mut out = *self;
        out.mins[axis] = out.mins[axis].min(other.mins[axis]);
        out.maxs[axis] = out.maxs[axis].max(other.maxs[axis]);
        out
    }

    /// Clip along a single axis only.
    pub fn restricted_cut(&self, other: &OctBb, axis: OctAxis) -> CoreResult<OctBb> {
        if self.empty || other.empty {
            return Err(CoreError::EmptyBoundingVolume);
        }
        let mut out = *self;
        out.mins[axis] = out.mins[axis].max(other.mins[axis]);
        out.maxs[axis] = out.maxs[axis].min(other.maxs[axis]);
        out.validate();
        if out.empty {
            return Err(CoreError::EmptyBoundingVolume);
        }
        Ok(out)
    }

    pub fn contains_vec(&self, v: &OVec) -> bool {
        !self.empty
            && (0..OCT_COUNT).all(|i| self.mins.0[i] <= v.0[i] && v.0[i] <= self.maxs.0[i])
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        self.contains_vec(&OVec::from_point(p))
    }

    /// Every point of `other` is inside `self`. The empty box is contained everywhere.
    pub fn contains(&self, other: &OctBb) -> bool {
        if other.empty {
            return true;
        }
        !self.empty
            && (0..OCT_COUNT)
                .all(|i| self.mins.0[i] <= other.mins.0[i] && other.maxs.0[i] <= self.maxs.0[i])
    }

    pub fn overlaps(&self, other: &OctBb) -> bool {
        !self.intersection(other).empty
    }

    pub fn translate(&self, by: Vec3) -> OctBb {
        if self.empty {
            return *self;
        }
        let d = OVec::from_point(by);
        OctBb {
            empty: false,
            mins: self.mins + d,
            maxs: self.maxs + d,
        }
    }

    /// Uniform scale about the origin. Negative factors are treated as zero.
    pub fn scale(&self, factor: f32) -> OctBb {
        if self.empty {
            return *self;
        }
        let f = factor.max(0.0);
        OctBb::new(self.mins * f, self.maxs * f)
    }

    /// Per-axis blend of two boxes; both must be non-empty.
    pub fn interpolate(a: &OctBb, b: &OctBb, t: f32) -> CoreResult<OctBb> {
        if a.empty || b.empty {
            return Err(CoreError::EmptyBoundingVolume);
        }
        Ok(OctBb::new(a.mins.lerp(&b.mins, t), a.maxs.lerp(&b.maxs, t)))
    }

    /// Corner points of the prism: the octagonal outline at the bottom and
    /// at the top. Writes at most `buf.len()` points and returns the count.
    pub fn to_points(&self, buf: &mut [Vec3]) -> usize {
        if self.empty {
            return 0;
        }
        let (outline, n) = self.outline();
        let mut count = 0;
        for z in [self.mins[OctAxis::Z], self.maxs[OctAxis::Z]] {
            for p in &outline[..n] {
                let Some(slot) = buf.get_mut(count) else {
                    return count;
                };
                *slot = Vec3::new(p.x, p.y, z);
                count += 1;
            }
        }
        count
    }

    /// The horizontal cross-section as a convex polygon: the X/Y square
    /// clipped against the four diagonal half-planes.
    fn outline(&self) -> ([Vec2; OUTLINE_MAX], usize) {
        let (x0, x1) = (self.mins[OctAxis::X], self.maxs[OctAxis::X]);
        let (y0, y1) = (self.mins[OctAxis::Y], self.maxs[OctAxis::Y]);

        let mut poly = [Vec2::ZERO; OUTLINE_MAX];
        poly[0] = Vec2::new(x0, y0);
        poly[1] = Vec2::new(x1, y0);
        poly[2] = Vec2::new(x1, y1);
        poly[3] = Vec2::new(x0, y1);
        let mut n = 4;

        // keep normal . p <= offset
        let planes = [
            (Vec2::new(1.0, 1.0), self.maxs[OctAxis::XY]),
            (Vec2::new(-1.0, -1.0), -self.mins[OctAxis::XY]),
            (Vec2::new(-1.0, 1.0), self.maxs[OctAxis::YX]),
            (Vec2::new(1.0, -1.0), -self.mins[OctAxis::YX]),
        ];
        for (normal, offset) in planes {
            n = clip_outline(&mut poly, n, normal, offset);
        }
        (poly, n)
    }

    /// Fit a character's collision volume to its animated frame box.
    ///
    /// - `bump_stt`: the profile's stated bumper. A zero size or height
    ///   collapses that part of the volume.
    /// - `bump_base`: the minimum bumper, used when `self` is empty and as a
    ///   floor for the height.
    ///
    /// Returns the derived bumper and the collision volume.
    pub fn downgrade(&self, bump_stt: &Bumper, bump_base: &Bumper) -> (Bumper, OctBb) {
        if self.empty {
            return (*bump_base, OctBb::from_bumper(bump_base));
        }

        let mut cv = *self;
        let mut bump = Bumper::default();

        if bump_stt.height <= 0.0 {
            cv.mins[OctAxis::Z] = 0.0;
            cv.maxs[OctAxis::Z] = 0.0;
        } else {
            bump.height = bump_base.height.max(cv.maxs[OctAxis::Z]);
            cv.maxs[OctAxis::Z] = bump.height;
            cv.mins[OctAxis::Z] = cv.mins[OctAxis::Z].min(0.0);
        }

        if bump_stt.size <= 0.0 {
            for axis in OctAxis::HORIZONTAL {
                cv.mins[axis] = 0.0;
                cv.maxs[axis] = 0.0;
            }
        } else {
            let reach = |axis: OctAxis| cv.mins[axis].abs().max(cv.maxs[axis].abs());
            bump.size = reach(OctAxis::X).max(reach(OctAxis::Y));
            bump.size_big = reach(OctAxis::XY)
                .max(reach(OctAxis::YX))
                .min(2.0 * bump.size);
        }

        cv.validate();
        (bump, cv)
    }
}

fn clip_outline(poly: &mut [Vec2; OUTLINE_MAX], n: usize, normal: Vec2, offset: f32) -> usize {
    let input = *poly;
    let mut out = 0;
    let mut push = |p: Vec2, out: &mut usize| {
        if *out < OUTLINE_MAX {
            poly[*out] = p;
            *out += 1;
        }
    };
    for i in 0..n {
        let a = input[i];
        let b = input[(i + 1) % n];
        let da = normal.dot(a) - offset;
        let db = normal.dot(b) - offset;
        if da <= 0.0 {
            push(a, &mut out);
        }
        if (da < 0.0 && db > 0.0) || (da > 0.0 && db < 0.0) {
            let t = da / (da - db);
            push(a + (b - a) * t, &mut out);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::OCT_POINT_MAX;

    fn unit_box() -> OctBb {
        OctBb::from_points(&[Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 2.0)])
    }

    #[test]
    fn test_empty_accessors_fail() {
        let bb = OctBb::EMPTY;
        assert!(bb.is_empty());
        assert_eq!(bb.mins(), Err(CoreError::EmptyBoundingVolume));
        assert_eq!(bb.mid(), Err(CoreError::EmptyBoundingVolume));
        let mut buf = [Vec3::ZERO; OCT_POINT_MAX];
        assert_eq!(bb.to_points(&mut buf), 0);
    }

    #[test]
    fn test_join_identity_and_idempotence() {
        let a = unit_box();
        assert_eq!(a.join(&OctBb::EMPTY), a);
        assert_eq!(OctBb::EMPTY.join(&a), a);
        assert_eq!(a.join(&a), a);
        assert_eq!(a.cut(&a), Ok(a));
    }

    #[test]
    fn test_disjoint_cut_is_empty() {
        let a = unit_box();
        let b = a.translate(Vec3::new(10.0, 0.0, 0.0));
        assert!(!a.overlaps(&b));
        assert_eq!(a.cut(&b), Err(CoreError::EmptyBoundingVolume));
    }

    #[test]
    fn test_restricted_join_touches_one_axis() {
        let a = unit_box();
        let b = a.translate(Vec3::new(0.0, 0.0, 5.0));
        let j = a.restricted_join(&b, OctAxis::Z);
        assert_eq!(j.extent(OctAxis::Z), Ok((0.0, 7.0)));
        assert_eq!(j.extent(OctAxis::X), a.extent(OctAxis::X));
        assert!(a.restricted_cut(&b, OctAxis::Z).is_err());
    }

    #[test]
    fn test_tight_square_outline() {
        let corners = [
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 2.0),
            Vec3::new(-1.0, 1.0, 2.0),
        ];
        let bb = OctBb::from_points(&corners);
        let mut buf = [Vec3::ZERO; OCT_POINT_MAX];
        // diagonals only touch the corners
        assert_eq!(bb.to_points(&mut buf), 8);
    }

    #[test]
    fn test_octagon_points_recover_box() {
        let bb = OctBb::from_bumper(&Bumper::new(10.0, 14.0, 20.0));
        let mut buf = [Vec3::ZERO; OCT_POINT_MAX];
        let n = bb.to_points(&mut buf);
        assert_eq!(n, OCT_POINT_MAX);
        let back = OctBb::from_points(&buf[..n]);
        for axis in OctAxis::ALL {
            let (lo, hi) = bb.extent(axis).unwrap();
            let (blo, bhi) = back.extent(axis).unwrap();
            assert!((lo - blo).abs() < 1e-4, "{axis:?}");
            assert!((hi - bhi).abs() < 1e-4, "{axis:?}");
        }
    }

    #[test]
    fn test_to_points_respects_buffer() {
        let bb = OctBb::from_bumper(&Bumper::new(10.0, 14.0, 20.0));
        let mut buf = [Vec3::ZERO; 3];
        assert_eq!(bb.to_points(&mut buf), 3);
    }

    #[test]
    fn test_downgrade_zero_size_collapses_horizontal() {
        let frame = OctBb::from_bumper(&Bumper::new(30.0, 40.0, 60.0));
        let stt = Bumper::new(0.0, 0.0, 50.0);
        let base = Bumper::new(10.0, 14.0, 70.0);
        let (bump, cv) = frame.downgrade(&stt, &base);
        assert!((bump.size).abs() < f32::EPSILON);
        assert!((bump.height - 70.0).abs() < f32::EPSILON);
        assert_eq!(cv.extent(OctAxis::X), Ok((0.0, 0.0)));
        assert_eq!(cv.extent(OctAxis::Z), Ok((0.0, 70.0)));
    }

    #[test]
    fn test_downgrade_takes_frame_reach() {
        let frame = OctBb::from_points(&[Vec3::new(-20.0, -5.0, 0.0), Vec3::new(12.0, 8.0, 40.0)]);
        let stt = Bumper::new(25.0, 35.0, 40.0);
        let base = Bumper::new(5.0, 7.0, 10.0);
        let (bump, cv) = frame.downgrade(&stt, &base);
        assert!((bump.size - 20.0).abs() < 1e-5);
        assert!((bump.height - 40.0).abs() < 1e-5);
        assert!(cv.contains(&frame));
    }

    #[test]
    fn test_downgrade_empty_uses_base() {
        let base = Bumper::new(5.0, 7.0, 10.0);
        let (bump, cv) = OctBb::EMPTY.downgrade(&base, &base);
        assert_eq!(bump, base);
        assert_eq!(cv, OctBb::from_bumper(&base));
    }

    #[test]
    fn test_interpolate_midpoint() {
        let a = unit_box();
        let b = a.translate(Vec3::new(4.0, 0.0, 0.0));
        let m = OctBb::interpolate(&a, &b, 0.5).unwrap();
        assert_eq!(m.extent(OctAxis::X), Ok((1.0, 3.0)));
        assert!(OctBb::interpolate(&a, &OctBb::EMPTY, 0.5).is_err());
    }
}
