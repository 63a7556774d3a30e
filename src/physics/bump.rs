//! Character/character contacts.
//!
//! Free characters are bucketed by collision block; pairs in the same or
//! adjacent blocks are tested with their world octagonal boxes. A contact
//! either lands a character on a platform, seats a rider on a mount, or
//! pushes the pair apart along the axis of least penetration.

use bevy::math::Vec2;
use std::collections::BTreeMap;

use crate::bounding::OctAxis;
use crate::character::{AlertFlags, Character, ChrRef, Slot};
use crate::constants::{BLOCK_SIZE, GRIP_ONLY, INFINITE_WEIGHT, PLATTOLERANCE};
use crate::simulation::Simulation;

/// Share of a separation taken by each side, by inverse weight.
pub fn separation_shares(weight_a: u32, weight_b: u32) -> Option<(f32, f32)> {
    let inverse = |w: u32| {
        if w == INFINITE_WEIGHT {
            0.0
        } else {
            1.0 / w.max(1) as f32
        }
    };
    let (ia, ib) = (inverse(weight_a), inverse(weight_b));
    let total = ia + ib;
    (total > 0.0).then(|| (ia / total, ib / total))
}

/// Smallest horizontal overlap between two boxes, as a displacement that
/// moves `a` out of `b`.
pub fn least_penetration(a: &Character, b: &Character) -> Option<Vec2> {
    let (bb_a, bb_b) = (a.world_bb(), b.world_bb());
    let (mins_a, maxs_a) = (bb_a.mins().ok()?, bb_a.maxs().ok()?);
    let (mins_b, maxs_b) = (bb_b.mins().ok()?, bb_b.maxs().ok()?);

    let mut best: Option<(f32, OctAxis, f32)> = None;
    for axis in OctAxis::HORIZONTAL {
        let overlap = maxs_a[axis].min(maxs_b[axis]) - mins_a[axis].max(mins_b[axis]);
        if overlap <= 0.0 {
            return None;
        }
        let mid_a = (mins_a[axis] + maxs_a[axis]) * 0.5;
        let mid_b = (mins_b[axis] + maxs_b[axis]) * 0.5;
        let sign = if mid_a >= mid_b { 1.0 } else { -1.0 };
        if best.map_or(true, |(o, _, _)| overlap < o) {
            best = Some((overlap, axis, sign));
        }
    }

    let (overlap, axis, sign) = best?;
    let d = overlap * sign;
    Some(match axis {
        OctAxis::X => Vec2::new(d, 0.0),
        OctAxis::Y => Vec2::new(0.0, d),
        OctAxis::XY => Vec2::new(d * 0.5, d * 0.5),
        OctAxis::YX => Vec2::new(-d * 0.5, d * 0.5),
        OctAxis::Z => Vec2::ZERO,
    })
}

fn horizontally_overlaps(a: &Character, b: &Character) -> bool {
    let (bb_a, bb_b) = (a.world_bb(), b.world_bb());
    let (Ok(mins_a), Ok(maxs_a), Ok(mins_b), Ok(maxs_b)) =
        (bb_a.mins(), bb_a.maxs(), bb_b.mins(), bb_b.maxs())
    else {
        return false;
    };
    OctAxis::HORIZONTAL
        .iter()
        .all(|&axis| mins_a[axis] <= maxs_b[axis] && mins_b[axis] <= maxs_a[axis])
}

fn platform_top(c: &Character) -> Option<f32> {
    c.world_bb().extent(OctAxis::Z).ok().map(|(_, hi)| hi)
}

/// Whether `rider` stands on `platform` this tick.
fn stands_on(rider: &Character, platform: &Character) -> bool {
    if !platform.is_platform || !rider.can_use_platforms || rider.is_flying() {
        return false;
    }
    let Some(top) = platform_top(platform) else {
        return false;
    };
    (rider.pos.z - top).abs() <= PLATTOLERANCE && horizontally_overlaps(rider, platform)
}

/// Whether `rider` lands in the saddle of `mount`.
fn lands_on_mount(rider: &Character, mount: &Character, mount_ref: ChrRef) -> bool {
    mount.is_mount
        && mount.alive
        && mount.attached_to.is_none()
        && mount.holding(Slot::Left).is_none()
        && rider.alive
        && !rider.is_item
        && !rider.is_mount
        && rider.timers.dismount == 0
        && rider.dismount_object != Some(mount_ref)
        && rider.vel.z <= 0.0
        && rider.pos.z > mount.pos.z + mount.bump.height * 0.5
}

impl Simulation {
    fn bump_candidates(&self) -> BTreeMap<(i32, i32), Vec<ChrRef>> {
        let mut blocks: BTreeMap<(i32, i32), Vec<ChrRef>> = BTreeMap::new();
        for (r, c) in self.chars.iter_active() {
            if c.pack.is_packed || c.attached_to.is_some() || c.bump.size <= 0.0 {
                continue;
            }
            let key = (
                (c.pos.x / BLOCK_SIZE).floor() as i32,
                (c.pos.y / BLOCK_SIZE).floor() as i32,
            );
            blocks.entry(key).or_default().push(r);
        }
        blocks
    }

    /// Pairs from the same or neighbouring blocks, each reported once.
    fn bump_pairs(&self) -> Vec<(ChrRef, ChrRef)> {
        let blocks = self.bump_candidates();
        let mut pairs = Vec::new();
        for (&(bx, by), members) in &blocks {
            for (i, &a) in members.iter().enumerate() {
                for &b in &members[i + 1..] {
                    pairs.push((a, b));
                }
            }
            // forward half of the neighbourhood
            for (dx, dy) in [(1, -1), (1, 0), (1, 1), (0, 1)] {
                if let Some(others) = blocks.get(&(bx + dx, by + dy)) {
                    for &a in members {
                        for &b in others {
                            pairs.push((a, b));
                        }
                    }
                }
            }
        }
        pairs
    }

    /// Resolve contacts between all free characters.
    pub fn bump_characters(&mut self) {
        let keys = self.chars.active_keys();
        for r in keys {
            if let Some(c) = self.chars.active_mut(r) {
                c.on_platform = None;
            }
        }

        for (a, b) in self.bump_pairs() {
            self.bump_pair(a, b);
        }
    }

    fn bump_pair(&mut self, a: ChrRef, b: ChrRef) {
        let (Some(ca), Some(cb)) = (self.chars.active(a), self.chars.active(b)) else {
            return;
        };
        let ignoring = |x: &Character, other: ChrRef| {
            x.dismount_object == Some(other) && x.timers.dismount > 0
        };
        if ignoring(ca, b) || ignoring(cb, a) {
            return;
        }

        if lands_on_mount(ca, cb, b) {
            self.mount_up(a, b);
            return;
        }
        if lands_on_mount(cb, ca, a) {
            self.mount_up(b, a);
            return;
        }

        if stands_on(ca, cb) {
            self.land_on_platform(a, b);
            return;
        }
        if stands_on(cb, ca) {
            self.land_on_platform(b, a);
            return;
        }

        if !ca.world_bb().overlaps(&cb.world_bb()) {
            return;
        }
        let Some(push) = least_penetration(ca, cb) else {
            return;
        };
        let Some((share_a, share_b)) = separation_shares(ca.weight, cb.weight) else {
            return;
        };
        let (from_a, from_b) = (ca.pos_xy(), cb.pos_xy());
        let is_clear =
            |c: &Character, at: Vec2| self.mesh.test_wall(at, 0.0, c.stopped_by).is_empty();
        // only push into open floor
        let mut new_a = Some(from_a + push * share_a).filter(|&p| is_clear(ca, p));
        let mut new_b = Some(from_b - push * share_b).filter(|&p| is_clear(cb, p));
        // a side backed against a wall hands its share to the other
        if new_a.is_none() && share_b > 0.0 {
            new_b = Some(from_b - push).filter(|&p| is_clear(cb, p)).or(new_b);
        } else if new_b.is_none() && share_a > 0.0 {
            new_a = Some(from_a + push).filter(|&p| is_clear(ca, p)).or(new_a);
        }

        if let Some([ca, cb]) = self.chars.pair_mut(a, b) {
            if let Some(p) = new_a {
                ca.pos.x = p.x;
                ca.pos.y = p.y;
            }
            if let Some(p) = new_b {
                cb.pos.x = p.x;
                cb.pos.y = p.y;
            }
            ca.ai.raise(AlertFlags::BUMPED);
            ca.ai.bumplast = Some(b);
            cb.ai.raise(AlertFlags::BUMPED);
            cb.ai.bumplast = Some(a);
        }
    }

    fn land_on_platform(&mut self, rider: ChrRef, platform: ChrRef) {
        let Some(top) = self.chars.active(platform).and_then(platform_top) else {
            return;
        };
        let Some(chr) = self.chars.active_mut(rider) else {
            return;
        };
        chr.on_platform = Some(platform);
        if chr.pos.z < top {
            chr.pos.z = top;
            chr.vel.z = chr.vel.z.max(0.0);
        }
    }

    fn mount_up(&mut self, rider: ChrRef, mount: ChrRef) {
        match self.attach(rider, mount, GRIP_ONLY) {
            Ok(()) => tracing::debug!(?rider, ?mount, "mounted"),
            Err(e) => tracing::debug!(?rider, ?mount, "mount refused: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::Team;
    use crate::config::SimConfig;
    use crate::mesh::MeshBuilder;
    use crate::profile::CharacterProfile;
    use bevy::math::Vec3;

    fn walled_pair(ax: f32, bx: f32) -> (Simulation, ChrRef, ChrRef) {
        let mesh = MeshBuilder::new(8, 8).border_walls().build();
        let mut sim = Simulation::new(SimConfig::default(), mesh);
        let id = sim.add_profile(CharacterProfile::default());
        let a = sim.spawn(id, Vec3::new(ax, 300.0, 0.0), 0, Team::GOOD).unwrap();
        let b = sim.spawn(id, Vec3::new(bx, 300.0, 0.0), 0, Team::GOOD).unwrap();
        sim.chars.activate_pending();
        (sim, a, b)
    }

    #[test]
    fn test_open_floor_splits_push_by_weight() {
        let (mut sim, a, b) = walled_pair(400.0, 412.0);
        let push = least_penetration(sim.chars.get(a).unwrap(), sim.chars.get(b).unwrap()).unwrap();
        sim.bump_characters();
        let (pa, pb) = (sim.chars.get(a).unwrap().pos_xy(), sim.chars.get(b).unwrap().pos_xy());
        assert!(pa.distance(Vec2::new(400.0, 300.0) + push * 0.5) < 1e-3);
        assert!(pb.distance(Vec2::new(412.0, 300.0) - push * 0.5) < 1e-3);
        assert!(sim.chars.get(a).unwrap().ai.has(AlertFlags::BUMPED));
    }

    #[test]
    fn test_side_against_wall_hands_push_to_other() {
        // the border column ends at x = 128
        let (mut sim, a, b) = walled_pair(130.0, 142.0);
        let push = least_penetration(sim.chars.get(a).unwrap(), sim.chars.get(b).unwrap()).unwrap();
        assert!(push.x < 0.0);
        sim.bump_characters();
        let (pa, pb) = (sim.chars.get(a).unwrap().pos_xy(), sim.chars.get(b).unwrap().pos_xy());
        assert_eq!(pa, Vec2::new(130.0, 300.0));
        assert!(pb.distance(Vec2::new(142.0, 300.0) - push) < 1e-3);
    }

    #[test]
    fn test_infinite_weight_never_moves() {
        assert_eq!(separation_shares(INFINITE_WEIGHT, 10), Some((0.0, 1.0)));
        assert_eq!(separation_shares(INFINITE_WEIGHT, INFINITE_WEIGHT), None);
        let (a, b) = separation_shares(100, 300).unwrap();
        assert!((a - 0.75).abs() < 1e-5 && (b - 0.25).abs() < 1e-5);
    }
}
