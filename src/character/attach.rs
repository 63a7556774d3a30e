//! Holding, riding and dropping.
//!
//! `attached_to` on the held character and `holding[slot]` on the holder are
//! written together here and nowhere else, so each is always the inverse of
//! the other.

use bevy::math::Vec3;

use super::{AlertFlags, ChrRef, Slot};
use crate::attachment;
use crate::constants::{DROPZVEL, GRABSIZE, MAX_ATTACH_DEPTH, PHYS_DISMOUNT_TIME};
use crate::error::{AttachRefusal, CoreError, CoreResult};
use crate::instance::action::{Action, ACTION_HELD, ACTION_RIDE, ACTION_SIT};
use crate::matrix::GripBinding;
use crate::simulation::Simulation;

/// What a grab frame reaches for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabKind {
    Item,
    /// Another person, e.g. to carry them
    Character,
}

impl Simulation {
    /// Check an attach without changing anything. Returns the grip binding
    /// the item would get.
    pub fn can_attach(&self, item: ChrRef, holder: ChrRef, grip_offset: usize) -> CoreResult<GripBinding> {
        let refuse = |why| Err(CoreError::AttachRefused(why));
        if item == holder {
            return refuse(AttachRefusal::SelfAttach);
        }
        let it = self.chars.active(item).ok_or(CoreError::InvalidReference("item"))?;
        let ho = self
            .chars
            .active(holder)
            .ok_or(CoreError::InvalidReference("holder"))?;

        if it.pack.is_packed {
            return refuse(AttachRefusal::Packed);
        }
        if it.attached_to.is_some() {
            return refuse(AttachRefusal::AlreadyAttached);
        }

        let Some(slot) = Slot::from_grip_offset(grip_offset) else {
            return refuse(AttachRefusal::SlotInvalid);
        };
        let slot_valid = self
            .profiles
            .get(ho.profile)
            .is_some_and(|p| p.slot_valid[slot.index()]);
        let verts = ho
            .inst
            .model
            .and_then(|id| self.models.get(id))
            .and_then(|m| m.grip_vertices(grip_offset));
        let Some(verts) = verts.filter(|_| slot_valid || ho.is_mount) else {
            return refuse(AttachRefusal::SlotInvalid);
        };
        if ho.holding(slot).is_some() {
            return refuse(AttachRefusal::SlotOccupied);
        }
        if ho.is_mount && ho.attached_to.is_some() {
            return refuse(AttachRefusal::MountHeld);
        }
        if attachment::would_create_cycle(&self.chars, item, holder, MAX_ATTACH_DEPTH) {
            return refuse(AttachRefusal::WouldCycle);
        }
        if !ho.alive {
            return refuse(AttachRefusal::HolderDead);
        }

        Ok(GripBinding { holder, slot, verts })
    }

    /// Put `item` in `holder`'s hand at `grip_offset`, or seat a rider on a
    /// mount.
    pub fn attach(&mut self, item: ChrRef, holder: ChrRef, grip_offset: usize) -> CoreResult<()> {
        let binding = self.can_attach(item, holder, grip_offset)?;
        let slot = binding.slot;

        let Some([it, ho]) = self.chars.pair_mut(item, holder) else {
            return Err(CoreError::InvalidReference("holder"));
        };
        it.attached_to = Some(holder);
        it.in_slot = Some(slot);
        it.on_platform = None;
        it.inst.matrix_cache.grip = Some(binding);
        it.inst.matrix_cache.invalidate();
        ho.holding[slot.index()] = Some(item);

        // weapons join their wielder, mounts join their rider
        if ho.is_mount && !it.is_item {
            ho.team = it.team;
        } else if it.is_item {
            it.team = ho.team;
        }
        it.ai.raise(AlertFlags::GRABBED);

        let rider = ho.is_mount && !it.is_item;
        let is_item = it.is_item;
        let rider_holds = it.held_items().next().is_some();
        if rider {
            let seat = if rider_holds { ACTION_SIT } else { ACTION_RIDE };
            self.play_action(item, seat, true);
            if let Some(it) = self.chars.get_mut(item) {
                it.inst.action_loop = true;
            }
        } else if is_item {
            self.play_action(item, ACTION_HELD[slot.index()], true);
            if let Some(it) = self.chars.get_mut(item) {
                it.inst.action_keep = true;
            }
        }

        tracing::debug!(?item, ?holder, ?slot, "attached");
        Ok(())
    }

    /// Let go of `item`. Kursed items stay in living hands unless
    /// `ignore_kursed` is set; items dropped inside a shop are offered for
    /// sale when `do_shop_check` is set.
    pub fn detach(&mut self, item: ChrRef, ignore_kursed: bool, do_shop_check: bool) -> CoreResult<()> {
        let it = self.chars.get(item).ok_or(CoreError::InvalidReference("item"))?;
        let holder = it.attached_to.ok_or(CoreError::InvalidReference("holder"))?;
        let ho = self
            .chars
            .get(holder)
            .ok_or(CoreError::InvalidReference("holder"))?;

        let holder_alive = ho.alive;
        let holder_was_mount = ho.is_mount && !it.is_item;
        if it.is_kursed && holder_alive && !ignore_kursed {
            if let Some(it) = self.chars.get_mut(item) {
                it.ai.raise(AlertFlags::NOTDROPPED);
            }
            return Err(CoreError::Kursed);
        }

        let Some([it, ho]) = self.chars.pair_mut(item, holder) else {
            return Err(CoreError::InvalidReference("holder"));
        };
        if let Some(slot) = it.in_slot {
            if ho.holding[slot.index()] == Some(item) {
                ho.holding[slot.index()] = None;
            }
        }
        it.attached_to = None;
        it.in_slot = None;
        it.inst.matrix_cache.grip = None;
        it.inst.matrix_cache.invalidate();

        it.vel = ho.vel;
        if it.is_item {
            it.vel.z += DROPZVEL;
        }
        it.timers.dismount = PHYS_DISMOUNT_TIME;
        it.dismount_object = Some(holder);
        it.ori.facing_z = ho.ori.facing_z;

        it.team = it.team_base;
        if holder_was_mount {
            ho.team = ho.team_base;
        }
        it.ai.raise(AlertFlags::DROPPED);

        // never leave the item inside a wall
        if !self.mesh.test_wall(it.pos_xy(), 0.0, it.stopped_by).is_empty() {
            it.pos.x = ho.pos.x;
            it.pos.y = ho.pos.y;
        }
        let is_item = it.is_item;
        it.inst.action_keep = false;
        it.inst.action_loop = false;
        self.play_action(item, Action::DA, true);

        if do_shop_check && is_item && holder_alive {
            self.sell_if_in_shop(holder, item);
        }
        tracing::debug!(?item, ?holder, "detached");
        Ok(())
    }

    /// Detach whatever the state of either side, kurses included.
    pub(crate) fn detach_any(&mut self, item: ChrRef) -> CoreResult<()> {
        self.detach(item, true, false)
    }

    /// Pick up the nearest thing of `kind` within reach of an empty hand.
    pub fn grab_nearby(&mut self, r: ChrRef, slot: Slot, kind: GrabKind) -> bool {
        let Some(chr) = self.chars.active(r) else {
            return false;
        };
        if !chr.alive || chr.holding(slot).is_some() {
            return false;
        }
        let reach = chr.bump.size + GRABSIZE;
        let origin = chr.pos;

        let nearest = self
            .chars
            .iter_active()
            .filter(|&(o, c)| {
                o != r
                    && !c.pack.is_packed
                    && c.attached_to.is_none()
                    && match kind {
                        GrabKind::Item => c.is_item,
                        GrabKind::Character => !c.is_item,
                    }
            })
            .map(|(o, c)| (o, dist_xy(origin, c.pos), (c.pos.z - origin.z).abs()))
            .filter(|&(_, d, dz)| d <= reach && dz <= reach)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(o, _, _)| o);
        let Some(target) = nearest else {
            return false;
        };

        let shop_owned = self.chars.active(target).is_some_and(|c| c.shop_owned);
        if shop_owned && !self.buy_if_in_shop(r, target) {
            return false;
        }

        if self.top_up_stack(r, target).is_some()
            && self.chars.active(target).is_some_and(|c| c.ammo == 0)
        {
            self.chars.request_terminate(target);
            return true;
        }

        match self.attach(target, r, slot.grip_offset()) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(?r, ?target, "grab failed: {e}");
                false
            }
        }
    }
}

fn dist_xy(a: Vec3, b: Vec3) -> f32 {
    a.truncate().distance(b.truncate())
}
