//! Position integration with floor bounce and wall push-out.

use bevy::math::{Vec2, Vec3};

use super::voluntary::terp_dir;
use crate::character::{AlertFlags, Character};
use crate::constants::{MAP_TURN_OFFSET, STOPBOUNCING, TURN_DIVISOR, WALL_STEP_MAX};
use crate::mesh::{twist::twist_table, Mesh};

/// What the horizontal move did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WallOutcome {
    Clear,
    /// Touched a wall and was pushed back out along `normal`
    Pushed { normal: Vec2, pressure: f32 },
    /// No way out was found; moved to a remembered safe spot
    Teleported { to: Vec3 },
}

/// Advance z and bounce off the floor. Landing restores the jump count.
pub fn integrate_z(chr: &mut Character) {
    let level = chr.enviro.level;
    chr.pos.z += chr.vel.z;
    if chr.pos.z >= level {
        return;
    }

    chr.pos.z = level;
    if chr.vel.z < -STOPBOUNCING {
        if chr.vel.z < -STOPBOUNCING * 10.0 {
            chr.ai.raise(AlertFlags::HITGROUND);
        }
        chr.vel.z = -chr.vel.z * chr.bump_dampen;
        if chr.vel.z < STOPBOUNCING {
            chr.vel.z = 0.0;
        }
    } else {
        chr.vel.z = 0.0;
    }
    chr.jump_number = chr.jump_number_reset;
}

/// Where to push toward: the safe position, else the newest breadcrumb,
/// else straight back along the velocity. Never points into the wall.
fn escape_direction(chr: &Character, at: Vec2, normal: Vec2) -> Vec2 {
    let diff = if chr.safe_valid {
        chr.safe_pos.truncate() - at
    } else if let Some(crumb) = chr.crumbs.last_valid() {
        crumb.pos.truncate() - at
    } else {
        -chr.vel.truncate()
    };
    if diff.dot(normal) < 0.0 {
        -diff
    } else {
        diff
    }
}

/// Advance x and y, resolving wall contact.
///
/// A blocked move is pushed out along the wall normal by a bounded step that
/// is only kept when it lowers the pressure, and the velocity component into
/// the wall is removed. With no usable normal the character is teleported to
/// its newest breadcrumb, its safe position or its spawn point.
pub fn integrate_xy(chr: &mut Character, mesh: &Mesh) -> WallOutcome {
    let old = chr.pos_xy();
    let mut new = old + chr.vel.truncate();

    if chr.ignores_walls() {
        chr.pos.x = new.x;
        chr.pos.y = new.y;
        return WallOutcome::Clear;
    }

    let radius = chr.bump.size;
    let mask = chr.stopped_by;
    let hit = mesh.hit_wall(new, radius, mask);
    if hit.is_clear() {
        chr.pos.x = new.x;
        chr.pos.y = new.y;
        return WallOutcome::Clear;
    }

    let pressure = hit.pressure;
    let mut normal = hit.normal;
    if normal == Vec2::ZERO {
        normal = mesh.get_diff(new, radius, pressure, mask).normalize_or_zero();
    }

    if normal == Vec2::ZERO {
        let to = if let Some(crumb) = chr.crumbs.take_last_valid() {
            crumb.pos
        } else if chr.safe_valid {
            chr.safe_pos
        } else {
            tracing::warn!(name = %chr.name, "stuck in a wall with no safe position, back to spawn");
            chr.spawn_pos
        };
        tracing::warn!(name = %chr.name, x = to.x, y = to.y, "teleported out of a wall");
        chr.pos = to;
        chr.vel.x = 0.0;
        chr.vel.y = 0.0;
        return WallOutcome::Teleported { to };
    }

    let diff = escape_direction(chr, new, normal);
    let along = diff.dot(normal);
    let limit = WALL_STEP_MAX * pressure;
    let step = if along > 0.0 { along.min(limit) } else { limit };
    let candidate = new + normal * step;
    if mesh.get_pressure(candidate, radius, mask) < pressure {
        new = candidate;
    }

    // never leave the centre inside a wall
    if !mesh.test_wall(new, 0.0, mask).is_empty() {
        new = old;
    }
    chr.pos.x = new.x;
    chr.pos.y = new.y;

    let v = chr.vel.truncate();
    let vn = v.dot(normal);
    if vn < 0.0 {
        let factor = ((1.0 + chr.bump_dampen) * pressure).max(1.0);
        let v = v - normal * vn * factor;
        chr.vel.x = v.x;
        chr.vel.y = v.y;
    }
    WallOutcome::Pushed { normal, pressure }
}

/// Lie flat on the ground when sticky or dead, stand upright otherwise.
pub fn settle_orientation(chr: &mut Character) {
    let (target_x, target_y) = if chr.sticky_butt || !chr.alive {
        let table = twist_table();
        let t = chr.enviro.twist as usize;
        (table.facing_x[t], table.facing_y[t])
    } else {
        (MAP_TURN_OFFSET, MAP_TURN_OFFSET)
    };
    chr.ori.map_x = terp_dir(chr.ori.map_x, target_x, TURN_DIVISOR);
    chr.ori.map_y = terp_dir(chr.ori.map_y, target_y, TURN_DIVISOR);
}
