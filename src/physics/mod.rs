//! Character step
//!
//! One tick of motion for one character, in order:
//! - timers count down
//! - [`environment`]: floor level, traction, friction, water
//! - [`friction`] and [`voluntary`] motion for free characters
//! - [`latch`] buttons: jump, grab, pack, attack
//! - [`zmotion`] gravity, then [`integrate`] with wall push-out
//! - animation and frame FX (see [`crate::instance`])
//!
//! Character/character contacts are resolved afterwards by [`bump`].

pub mod bump;
pub mod environment;
pub mod friction;
pub mod integrate;
pub mod latch;
pub mod voluntary;
pub mod zmotion;

use bevy::math::{Vec2, Vec3};

use crate::character::{AlertFlags, ChrRef};
use crate::matrix::facing_to_vec;
use crate::model::FrameFx;
use crate::simulation::Simulation;
use voluntary::{Confusion, Gait};

impl Simulation {
    /// Advance one active, unpacked character by a tick.
    pub fn step_character(&mut self, r: ChrRef) {
        self.count_down_timers(r);
        self.update_environment(r);

        if self.is_free(r) {
            self.apply_floor_friction(r);
            self.apply_voluntary_motion(r);
        }
        self.apply_latch_buttons(r);

        // the latch may have dismounted us
        if self.is_free(r) {
            self.apply_z_motion(r);
            self.integrate(r);
        }

        self.animate_character(r);
        if let Some(chr) = self.chars.active_mut(r) {
            integrate::settle_orientation(chr);
        }
    }

    fn is_free(&self, r: ChrRef) -> bool {
        self.chars.active(r).is_some_and(|c| c.attached_to.is_none())
    }

    fn count_down_timers(&mut self, r: ChrRef) {
        let Some(chr) = self.chars.active_mut(r) else {
            return;
        };
        chr.pos_old = chr.pos;
        chr.vel_old = chr.vel;

        let t = &mut chr.timers;
        for timer in [
            &mut t.jump,
            &mut t.reload,
            &mut t.careful,
            &mut t.damage,
            &mut t.dismount,
            &mut t.daze,
            &mut t.grog,
        ] {
            *timer = timer.saturating_sub(1);
        }
        if chr.timers.dismount == 0 {
            chr.dismount_object = None;
        }
        if chr.timers.jump == 0 {
            chr.jump_ready = true;
        }
    }

    fn apply_floor_friction(&mut self, r: ChrRef) {
        let Some(chr) = self.chars.active(r) else {
            return;
        };
        let inert = !chr.alive || chr.is_item;
        let platform = chr.on_platform.and_then(|p| self.chars.active(p));
        let target = match platform {
            Some(p) => p.vel,
            None if inert => Vec3::ZERO,
            None => friction::forward_target(chr.vel, facing_to_vec(chr.ori.facing_z)),
        };

        let Some(chr) = self.chars.active_mut(r) else {
            return;
        };
        let mut enviro = chr.enviro;
        let dv = friction::floor_friction(chr.vel, target, inert, &mut enviro);
        chr.enviro = enviro;
        chr.vel += dv;
    }

    fn apply_voluntary_motion(&mut self, r: ChrRef) {
        let Some(chr) = self.chars.active(r) else {
            return;
        };
        let stop = chr
            .inst
            .model
            .and_then(|id| self.models.get(id))
            .is_some_and(|m| chr.inst.current_fx(m).contains(FrameFx::STOP));
        if !chr.alive || chr.is_item {
            return;
        }
        let Some(profile) = self.profiles.get(chr.profile) else {
            return;
        };
        let gait = Gait {
            sneak: profile.sneak_speed,
            walk: profile.walk_speed,
            run: profile.run_speed,
            max_accel: profile.max_accel,
        };
        let confusion = Confusion {
            dazed: chr.timers.daze > 0 && profile.can_be_dazed,
            grogged: chr.timers.grog > 0 && profile.can_be_grogged,
        };

        let Some(chr) = self.chars.active_mut(r) else {
            return;
        };
        let dir = voluntary::scramble(chr.latch.dir(), confusion);
        let target = voluntary::target_velocity(dir, &gait, chr.is_player);
        if target == Vec2::ZERO || stop {
            return;
        }
        let accel = voluntary::accelerate(chr.vel.truncate(), target, &gait, chr.enviro.traction);
        chr.vel.x += accel.x;
        chr.vel.y += accel.y;
        chr.ori.facing_z = voluntary::face_velocity(chr.ori.facing_z, target);
    }

    fn apply_z_motion(&mut self, r: ChrRef) {
        let gravity = self.config.physics.gravity;
        let Some(chr) = self.chars.active_mut(r) else {
            return;
        };
        chr.vel += zmotion::z_motion(chr.pos.z, chr.fly_height, &chr.enviro, gravity);
    }

    fn integrate(&mut self, r: ChrRef) {
        let Some(chr) = self.chars.active_mut(r) else {
            return;
        };
        integrate::integrate_z(chr);
        if let integrate::WallOutcome::Pushed { .. } = integrate::integrate_xy(chr, &self.mesh) {
            chr.ai.raise(AlertFlags::BLOCKED);
        }
        let xy = chr.pos_xy();
        chr.grid = self.mesh.grid_at(xy);
        chr.block = self.mesh.block_at(xy);
    }
}
