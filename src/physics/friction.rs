//! Floor friction: drag a grounded character toward the velocity of what it
//! stands on.

use bevy::math::{Vec2, Vec3};

use super::environment::Environment;
use crate::constants::{FLOOR_FORWARD_DAMPEN, INERT_FRICTION, SLIP_LIMIT};

/// Velocity a living character's footing pulls toward on open floor: its
/// motion along `facing`, damped. Sideways motion gets braked to zero.
pub fn forward_target(vel: Vec3, facing: Vec2) -> Vec3 {
    let forward = facing.normalize_or_zero().extend(0.0);
    forward * vel.dot(forward) * FLOOR_FORWARD_DAMPEN
}

/// Velocity change from floor friction.
///
/// `target` is the velocity of the supporting surface: a platform's, zero
/// under the inert, or [`forward_target`] for the living. Only the floor-parallel part of the correction is applied.
/// A correction beyond the slip limit marks the character as slipping and is
/// recomputed with half the traction and a weaker floor.
pub fn floor_friction(vel: Vec3, target: Vec3, inert: bool, enviro: &mut Environment) -> Vec3 {
    let normal = enviro.normal();
    let mut friction = enviro.friction_hrz;
    if inert {
        friction = friction.min(INERT_FRICTION + enviro.zlerp * (1.0 - INERT_FRICTION));
    }

    let fric = target - vel;
    let parallel = fric - normal * fric.dot(normal);

    let mut correction = parallel * (1.0 - friction) * enviro.traction;
    if correction.length() > SLIP_LIMIT * enviro.traction {
        enviro.is_slipping = true;
        enviro.traction *= 0.5;
        correction = parallel * (1.0 - friction.sqrt()) * enviro.traction;
    } else {
        enviro.is_slipping = false;
    }
    correction
}
