//! Voluntary motion: turn a latch into a desired velocity and an
//! acceleration toward it, and turn the character to face where it goes.

use bevy::math::Vec2;

use crate::constants::{LATCH_DEADZONE, TURN_DIVISOR};
use crate::matrix::vec_to_facing;

/// Movement speeds of a character, from its profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gait {
    pub sneak: f32,
    pub walk: f32,
    pub run: f32,
    pub max_accel: f32,
}

/// Status effects that scramble the latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Confusion {
    /// Dazed characters walk the opposite way
    pub dazed: bool,
    /// Grogged characters have their axes swapped
    pub grogged: bool,
}

/// Apply daze and grog to a latch direction.
pub fn scramble(dir: Vec2, confusion: Confusion) -> Vec2 {
    let mut dir = dir;
    if confusion.dazed {
        dir = -dir;
    }
    if confusion.grogged {
        dir = Vec2::new(dir.y, dir.x);
    }
    dir
}

fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Speed for a latch magnitude in 0..=1, rising through sneak, walk and run
/// over equal thirds. Players get eased transitions inside each third.
pub fn target_speed(magnitude: f32, gait: &Gait, smooth: bool) -> f32 {
    let m = magnitude.clamp(0.0, 1.0);
    if m < LATCH_DEADZONE {
        return 0.0;
    }
    let (lo, hi, t) = if m < 1.0 / 3.0 {
        (0.0, gait.sneak, m * 3.0)
    } else if m < 2.0 / 3.0 {
        (gait.sneak, gait.walk, m * 3.0 - 1.0)
    } else {
        (gait.walk, gait.run, m * 3.0 - 2.0)
    };
    let t = if smooth { smoothstep(t) } else { t };
    lo + (hi - lo) * t
}

/// Desired horizontal velocity for a latch direction.
pub fn target_velocity(dir: Vec2, gait: &Gait, smooth: bool) -> Vec2 {
    let magnitude = dir.length().min(1.0);
    dir.normalize_or_zero() * target_speed(magnitude, gait, smooth)
}

/// Acceleration from `vel` toward `target`, limited by `max_accel` and traction.
pub fn accelerate(vel: Vec2, target: Vec2, gait: &Gait, traction: f32) -> Vec2 {
    (target - vel).clamp_length_max(gait.max_accel) * traction
}

/// Move a facing a fraction of the way toward `target` along the short arc.
pub fn terp_dir(current: u16, target: u16, divisor: i32) -> u16 {
    let diff = target.wrapping_sub(current) as i16 as i32;
    current.wrapping_add((diff / divisor.max(1)) as i16 as u16)
}

/// Facing after turning toward the direction of travel.
pub fn face_velocity(current: u16, vel: Vec2) -> u16 {
    if vel.length_squared() < 1e-4 {
        return current;
    }
    terp_dir(current, vec_to_facing(vel), TURN_DIVISOR)
}
