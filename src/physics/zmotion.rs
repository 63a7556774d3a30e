//! Gravity, hovering and downhill sliding.

use bevy::math::Vec3;

use super::environment::Environment;
use crate::constants::FLYDAMPEN;
use crate::mesh::twist::is_flat;

/// Velocity change from gravity for one tick.
///
/// Flyers are pulled toward `fly_level + fly_height`. On slippy slopes the
/// floor-supported share of gravity turns into a pull along the slope;
/// everywhere else only the airborne share applies.
pub fn z_motion(z: f32, fly_height: f32, enviro: &Environment, gravity: f32) -> Vec3 {
    if fly_height > 0.0 {
        return Vec3::new(0.0, 0.0, (enviro.fly_level + fly_height - z) * FLYDAMPEN);
    }

    let airborne = Vec3::new(0.0, 0.0, gravity * enviro.zlerp);
    if enviro.is_slippy && !is_flat(enviro.twist) {
        enviro.slide() * gravity.abs() * (1.0 - enviro.zlerp) + airborne
    } else {
        airborne
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::twist::twist_from_corners;

    #[test]
    fn test_flyer_seeks_hover_height() {
        let env = Environment {
            fly_level: 0.0,
            ..Environment::default()
        };
        assert!(z_motion(10.0, 100.0, &env, -1.0).z > 0.0);
        assert!(z_motion(300.0, 100.0, &env, -1.0).z < 0.0);
    }

    #[test]
    fn test_grounded_flat_floor_cancels_gravity() {
        let env = Environment {
            zlerp: 0.0,
            ..Environment::default()
        };
        assert_eq!(z_motion(0.0, 0.0, &env, -1.0), Vec3::ZERO);
    }

    #[test]
    fn test_slippy_slope_pulls_downhill() {
        let env = Environment {
            zlerp: 0.0,
            is_slippy: true,
            // rises toward +x
            twist: twist_from_corners([0.0, 64.0, 64.0, 0.0]),
            ..Environment::default()
        };
        let dv = z_motion(0.0, 0.0, &env, -1.0);
        assert!(dv.x < 0.0);
        assert!(dv.y.abs() < 1e-6);
    }

    #[test]
    fn test_airborne_falls() {
        let env = Environment::default();
        assert!((z_motion(100.0, 0.0, &env, -1.0).z + 1.0).abs() < 1e-6);
    }
}
