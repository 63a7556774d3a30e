//! Per-tick sampling of what a character stands on.

use bevy::math::Vec3;

use crate::character::{AlertFlags, Character, ChrRef};
use crate::config::PhysicsConfig;
use crate::constants::{AIR_TRACTION, GROUNDED_ZLERP, PLATTOLERANCE, TWIST_FLAT};
use crate::mesh::{twist::twist_table, Mesh, TileFlags};
use crate::simulation::Simulation;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Environment {
    /// Mesh height under the character
    pub floor_level: f32,
    /// Floor or the top of the platform stood on
    pub level: f32,
    /// Height flying characters hover relative to
    pub fly_level: f32,
    /// 0 on the floor, 1 at or above `PLATTOLERANCE`
    pub zlerp: f32,
    pub grounded: bool,
    pub twist: u8,
    pub is_watery: bool,
    pub inwater: bool,
    pub is_slippy: bool,
    pub is_slipping: bool,
    pub traction: f32,
    /// Velocity kept per tick by air or water
    pub fluid_friction_hrz: f32,
    pub fluid_friction_vrt: f32,
    /// Horizontal velocity kept per tick, blended between floor and air
    pub friction_hrz: f32,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            floor_level: 0.0,
            level: 0.0,
            fly_level: 0.0,
            zlerp: 1.0,
            grounded: false,
            twist: TWIST_FLAT,
            is_watery: false,
            inwater: false,
            is_slippy: false,
            is_slipping: false,
            traction: AIR_TRACTION,
            fluid_friction_hrz: 1.0,
            fluid_friction_vrt: 1.0,
            friction_hrz: 1.0,
        }
    }
}

impl Environment {
    pub fn normal(&self) -> Vec3 {
        twist_table().normal[self.twist as usize]
    }

    /// Downhill pull of unit gravity on the current tile.
    pub fn slide(&self) -> Vec3 {
        twist_table().slide[self.twist as usize]
    }
}

/// Sample the mesh under `chr`. `platform_top` is the top of the platform
/// it stands on, if any.
pub fn sample(
    chr: &Character,
    platform_top: Option<f32>,
    mesh: &Mesh,
    physics: &PhysicsConfig,
    was_in_water: bool,
) -> Environment {
    let xy = chr.pos_xy();
    let grid = mesh.grid_at(xy);
    let tile_water = mesh.water.enabled && mesh.has_flags(grid, TileFlags::WATER);

    let floor_level = mesh.height_at(xy, chr.waterwalk);
    let level = platform_top.map_or(floor_level, |top| top.max(floor_level));
    let fly_level = if tile_water {
        level.max(mesh.water.surface_level)
    } else {
        level
    };

    let zlerp = ((chr.pos.z - level) / PLATTOLERANCE).clamp(0.0, 1.0);
    let grounded = zlerp < GROUNDED_ZLERP && !chr.is_flying();

    let twist = if platform_top.is_some() {
        TWIST_FLAT
    } else {
        mesh.twist_at(grid)
    };
    let is_watery = tile_water && !chr.waterwalk && chr.pos.z < mesh.water.surface_level;
    let is_slippy = !is_watery && mesh.has_flags(grid, TileFlags::SLIPPY);

    let normal = twist_table().normal[twist as usize];
    let mut traction = normal.z.abs() * (1.0 - zlerp) + AIR_TRACTION * zlerp;
    if is_slippy {
        traction /= physics.hillslide;
    }

    let fluid = if is_watery {
        physics.water_friction
    } else {
        physics.air_friction
    };
    let floor = if is_slippy {
        physics.slippy_friction
    } else {
        physics.noslip_friction
    };

    Environment {
        floor_level,
        level,
        fly_level,
        zlerp,
        grounded,
        twist,
        is_watery,
        inwater: is_watery || (was_in_water && tile_water),
        is_slippy,
        is_slipping: false,
        traction,
        fluid_friction_hrz: fluid,
        fluid_friction_vrt: fluid,
        friction_hrz: zlerp + (1.0 - zlerp) * floor,
    }
}

impl Simulation {
    /// Top of the platform a character stands on.
    pub(crate) fn platform_top(&self, platform: Option<ChrRef>) -> Option<f32> {
        let p = self.chars.active(platform?)?;
        p.world_bb().extent(crate::bounding::OctAxis::Z).ok().map(|(_, hi)| hi)
    }

    /// Refresh `chr.enviro`, apply fluid drag and raise INWATER on entry.
    pub(crate) fn update_environment(&mut self, r: ChrRef) {
        let Some(chr) = self.chars.active(r) else {
            return;
        };
        let top = self.platform_top(chr.on_platform);
        let was_in_water = chr.enviro.inwater;
        let env = sample(chr, top, &self.mesh, &self.config.physics, was_in_water);

        let Some(chr) = self.chars.active_mut(r) else {
            return;
        };
        if env.is_watery && !was_in_water {
            chr.ai.raise(AlertFlags::INWATER);
        }
        chr.enviro = env;

        if chr.attached_to.is_none() {
            chr.vel.x *= env.fluid_friction_hrz;
            chr.vel.y *= env.fluid_friction_hrz;
            if chr.is_flying() || env.is_watery {
                chr.vel.z *= env.fluid_friction_vrt;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::Team;
    use crate::mesh::MeshBuilder;
    use crate::profile::{CharacterProfile, ProfileId};

    fn chr_at(pos: Vec3) -> Character {
        Character::from_profile(ProfileId(0), &CharacterProfile::default(), pos, 0, Team::GOOD)
    }

    #[test]
    fn test_grounded_on_flat_floor() {
        let mesh = Mesh::new(4, 4);
        let env = sample(
            &chr_at(Vec3::new(200.0, 200.0, 0.0)),
            None,
            &mesh,
            &PhysicsConfig::default(),
            false,
        );
        assert!(env.grounded);
        assert_eq!(env.zlerp, 0.0);
        assert!((env.traction - 1.0).abs() < 1e-5);
        assert!((env.friction_hrz - 0.91).abs() < 1e-5);
    }

    #[test]
    fn test_airborne_blends_to_air() {
        let mesh = Mesh::new(4, 4);
        let env = sample(
            &chr_at(Vec3::new(200.0, 200.0, 500.0)),
            None,
            &mesh,
            &PhysicsConfig::default(),
            false,
        );
        assert!(!env.grounded);
        assert_eq!(env.zlerp, 1.0);
        assert!((env.traction - AIR_TRACTION).abs() < 1e-5);
        assert_eq!(env.friction_hrz, 1.0);
    }

    #[test]
    fn test_platform_raises_level() {
        let mesh = Mesh::new(4, 4);
        let env = sample(
            &chr_at(Vec3::new(200.0, 200.0, 60.0)),
            Some(60.0),
            &mesh,
            &PhysicsConfig::default(),
            false,
        );
        assert_eq!(env.level, 60.0);
        assert!(env.grounded);
    }

    #[test]
    fn test_water_tiles_use_water_friction() {
        let mesh = MeshBuilder::new(4, 4)
            .water(40.0)
            .flag_rect(0, 0, 3, 3, TileFlags::WATER)
            .build();
        let env = sample(
            &chr_at(Vec3::new(200.0, 200.0, 0.0)),
            None,
            &mesh,
            &PhysicsConfig::default(),
            false,
        );
        assert!(env.is_watery);
        assert!(env.inwater);
        assert!((env.fluid_friction_hrz - 0.80).abs() < 1e-5);
        assert_eq!(env.fly_level, 40.0);
    }
}
