//! Walk-cycle selection and per-tick animation.

use rand::Rng;

use super::action::Action;
use crate::character::{AlertFlags, ChrRef};
use crate::constants::{BORETIME_MAX, BORETIME_MIN};
use crate::physics::voluntary::Gait;
use crate::simulation::Simulation;

/// Locomotion action and playback rate for a ground speed.
///
/// Rates are in model frames per tick relative to the animator's speed; fat
/// characters take longer strides, except when running.
pub fn choose_locomotion(speed: f32, gait: &Gait, fat: f32, bored: bool) -> (Action, f32) {
    let fat = fat.max(0.01);
    let per = |base: f32| if base > 0.0 { speed / base } else { 1.0 };

    if speed < gait.sneak * 0.5 {
        if bored || speed <= 0.0 {
            (Action::DA, 1.0)
        } else {
            (Action::WA, per(gait.sneak) / fat)
        }
    } else if speed < (gait.sneak + gait.walk) * 0.5 {
        (Action::WA, per(gait.sneak) / fat)
    } else if speed < (gait.walk + gait.run) * 0.5 {
        (Action::WB, per(gait.walk) / fat)
    } else {
        (Action::WC, per(gait.run))
    }
}

impl Simulation {
    /// Pick a locomotion action, tick the bored timer, advance the animation
    /// and react to the frames entered.
    pub fn animate_character(&mut self, r: ChrRef) {
        let Some(model_id) = self.ensure_model(r) else {
            return;
        };
        self.select_locomotion(r);
        self.tick_boredom(r);

        let (Some(model), Some(chr)) = (self.models.get(model_id), self.chars.get_mut(r)) else {
            return;
        };
        let step = chr.inst.advance(model);
        if step.frames_entered == 0 {
            return;
        }
        chr.inst.vlst_cache.valid = false;
        let held: Vec<ChrRef> = chr.held_items().collect();
        for item in held {
            if let Some(item) = self.chars.get_mut(item) {
                item.inst.matrix_cache.invalidate();
            }
        }
        for fx in step.fx.into_iter().filter(|fx| !fx.is_empty()) {
            self.dispatch_frame_fx(r, fx);
        }
    }

    fn select_locomotion(&mut self, r: ChrRef) {
        let Some(chr) = self.chars.active(r) else {
            return;
        };
        let Some(model) = chr.inst.model.and_then(|id| self.models.get(id)) else {
            return;
        };
        let inst = &chr.inst;
        let selectable = inst.lip == 0
            && inst.action_ready
            && !inst.action_keep
            && !inst.action_loop
            && !inst.action.is_parry()
            && chr.alive
            && chr.enviro.grounded
            && (inst.framelip(model) & 7) < 2;
        if !selectable {
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

        // speed over whatever we are standing on
        let ground_vel = chr
            .on_platform
            .and_then(|p| self.chars.active(p))
            .map_or(bevy::math::Vec2::ZERO, |p| p.vel.truncate());
        let speed = (chr.vel.truncate() - ground_vel).length();
        let bored = chr.timers.bore == 0;
        let (action, rate) = choose_locomotion(speed, &gait, chr.fat, bored);

        let current = inst.action;
        let framelip = inst.framelip(model);
        let Some(resolved) = model.resolve(action) else {
            return;
        };
        let sync_frame = (current.is_walk() && resolved.is_walk() && resolved != current)
            .then(|| model.lip_to_walk_frame(resolved, framelip))
            .flatten();

        let Some(chr) = self.chars.active_mut(r) else {
            return;
        };
        if resolved != current {
            if chr.inst.set_action(model, action, true).is_err() {
                return;
            }
            if let Some(frame) = sync_frame {
                chr.inst.set_frame(model, frame);
            }
        }
        chr.inst.rate = rate;
    }

    /// Idle characters get bored now and then.
    fn tick_boredom(&mut self, r: ChrRef) {
        let Some(chr) = self.chars.active_mut(r) else {
            return;
        };
        let idle = chr.alive
            && !chr.is_item
            && chr.inst.action.is_type('D')
            && chr.vel.truncate().length_squared() < 0.01;
        if !idle {
            chr.timers.bore = BORETIME_MIN;
            return;
        }
        chr.timers.bore = chr.timers.bore.saturating_sub(1);
        if chr.timers.bore > 0 {
            return;
        }
        chr.ai.raise(AlertFlags::BORED);
        chr.timers.bore = self.rng.gen_range(BORETIME_MIN..=BORETIME_MAX);
        self.play_action(r, Action::DB, false);
    }
}
