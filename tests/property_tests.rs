//! Property-based tests using proptest
//!
//! Invariants that must hold for ALL inputs:
//! - Octagonal vectors keep their diagonals consistent under arithmetic
//! - Box join/cut are idempotent and join contains both operands
//! - Box corners fed back through `from_points` recover the box
//! - Mesh height is the bilinear blend of a tile's corners, zero off-grid

use bevy::math::{Vec2, Vec3};
use proptest::prelude::*;

use egoboo_core::bounding::{OVec, OctAxis, OctBb};
use egoboo_core::constants::GRID_SIZE;
use egoboo_core::mesh::MeshBuilder;

const EPS: f32 = 1e-2;

fn coord() -> impl Strategy<Value = f32> {
    -1000.0f32..1000.0
}

fn point() -> impl Strategy<Value = Vec3> {
    (coord(), coord(), coord()).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

/// Non-empty boxes built the way the simulation builds them: from points.
fn bbox() -> impl Strategy<Value = OctBb> {
    prop::collection::vec(point(), 1..12).prop_map(|pts| OctBb::from_points(&pts))
}

fn roughly_contains(outer: &OctBb, inner: &OctBb) -> bool {
    let (Ok(omin), Ok(omax), Ok(imin), Ok(imax)) =
        (outer.mins(), outer.maxs(), inner.mins(), inner.maxs())
    else {
        return false;
    };
    OctAxis::ALL
        .iter()
        .all(|&a| omin[a] <= imin[a] + EPS && imax[a] <= omax[a] + EPS)
}

// ============================================================
// Octagonal Vector Properties
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_diagonals_survive_arithmetic(a in point(), b in point(), k in -8.0f32..8.0) {
        let (va, vb) = (OVec::from_point(a), OVec::from_point(b));
        prop_assert!(va.is_consistent(EPS));
        prop_assert!((va + vb).is_consistent(EPS));
        prop_assert!((va - vb).is_consistent(EPS));
        prop_assert!((va * k).is_consistent(EPS * 8.0));
        prop_assert!((-va).is_consistent(EPS));
    }
}

// ============================================================
// Bounding Box Properties
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_join_and_cut_are_idempotent(a in bbox()) {
        prop_assert_eq!(a.join(&a), a);
        prop_assert_eq!(a.cut(&a).unwrap(), a);
    }

    #[test]
    fn prop_join_contains_both(a in bbox(), b in bbox()) {
        let j = a.join(&b);
        prop_assert!(j.contains(&a));
        prop_assert!(j.contains(&b));
    }

    #[test]
    fn prop_join_with_empty_is_identity(a in bbox()) {
        prop_assert_eq!(a.join(&OctBb::EMPTY), a);
        prop_assert_eq!(OctBb::EMPTY.join(&a), a);
    }

    #[test]
    fn prop_cut_is_inside_both(a in bbox(), b in bbox()) {
        if let Ok(c) = a.cut(&b) {
            prop_assert!(a.contains(&c));
            prop_assert!(b.contains(&c));
        } else {
            prop_assert!(!a.overlaps(&b));
        }
    }

    #[test]
    fn prop_corner_points_recover_box(a in bbox(), extra in point()) {
        let mut buf = [Vec3::ZERO; 16];
        let n = a.to_points(&mut buf);
        prop_assert!(n > 0);
        let back = OctBb::from_points(&buf[..n]);
        prop_assert!(roughly_contains(&back, &a));
        prop_assert!(roughly_contains(&a, &back));

        // the smallest box around the corners
        let mut wider = OctBb::from_points(&buf[..n]);
        wider.join_point(extra);
        prop_assert!(wider.contains(&back));
    }

    #[test]
    fn prop_translate_moves_every_extent(a in bbox(), by in point()) {
        let moved = a.translate(by);
        let delta = OVec::from_point(by);
        let (m0, m1) = (a.mins().unwrap(), moved.mins().unwrap());
        for axis in OctAxis::ALL {
            prop_assert!((m1[axis] - (m0[axis] + delta[axis])).abs() < EPS);
        }
    }
}

// ============================================================
// Mesh Height Properties
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_height_is_bilinear_blend(
        z in prop::array::uniform4(-200.0f32..200.0),
        u in 0.0f32..0.999,
        v in 0.0f32..0.999,
    ) {
        let mesh = MeshBuilder::new(3, 3).corners(1, 1, z).build();
        let pos = Vec2::new((1.0 + u) * GRID_SIZE, (1.0 + v) * GRID_SIZE);
        let expected = z[0] * (1.0 - u) * (1.0 - v)
            + z[1] * u * (1.0 - v)
            + z[2] * u * v
            + z[3] * (1.0 - u) * v;
        prop_assert!((mesh.height_at(pos, false) - expected).abs() < 0.05);
    }

    #[test]
    fn prop_height_is_zero_off_grid(x in -2000.0f32..-1.0, y in coord()) {
        let mesh = MeshBuilder::new(3, 3).corners(0, 0, [50.0; 4]).build();
        prop_assert_eq!(mesh.height_at(Vec2::new(x, y), false), 0.0);
        prop_assert_eq!(mesh.height_at(Vec2::new(y.abs() + 3.0 * GRID_SIZE, x.abs()), false), 0.0);
    }
}
