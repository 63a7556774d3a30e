//! Pack chains.
//!
//! A container's `pack.next` heads a singly linked chain of stored
//! characters, each pointing back at the container. Stackable items pour
//! their ammo into a matching stack before taking a place of their own.

use bevy::math::Vec3;

use super::{AlertFlags, ChrRef, Slot};
use crate::constants::MAXNUMINPACK;
use crate::error::{AttachRefusal, CoreError, CoreResult};
use crate::simulation::{SimEvent, Simulation};

impl Simulation {
    /// Items stored by `container`, first to last.
    pub fn pack_items(&self, container: ChrRef) -> Vec<ChrRef> {
        let mut items = Vec::new();
        let mut next = self.chars.get(container).and_then(|c| c.pack.next);
        while let Some(r) = next {
            // a corrupt chain must not spin forever
            if items.len() > MAXNUMINPACK * 2 || items.contains(&r) {
                tracing::warn!(?container, "pack chain is corrupt, truncating");
                break;
            }
            items.push(r);
            next = self.chars.get(r).and_then(|c| c.pack.next);
        }
        items
    }

    /// Append `item` to the end of `container`'s chain.
    fn pack_link(&mut self, container: ChrRef, item: ChrRef) {
        let last = self.pack_items(container).last().copied().unwrap_or(container);
        if let Some(prev) = self.chars.get_mut(last) {
            prev.pack.next = Some(item);
        }
        if let Some(c) = self.chars.get_mut(container) {
            c.pack.count += 1;
        }
        if let Some(it) = self.chars.get_mut(item) {
            it.pack.next = None;
            it.pack.container = Some(container);
            it.pack.is_packed = true;
            it.pack.was_packed = true;
        }
    }

    /// Take `item` out of whatever chain holds it.
    pub(crate) fn pack_unlink(&mut self, item: ChrRef) {
        let Some(it) = self.chars.get(item) else {
            return;
        };
        let after = it.pack.next;
        if let Some(container) = it.pack.container {
            let prev = std::iter::once(container)
                .chain(self.pack_items(container))
                .find(|&r| self.chars.get(r).is_some_and(|c| c.pack.next == Some(item)));
            if let Some(prev) = prev.and_then(|p| self.chars.get_mut(p)) {
                prev.pack.next = after;
            }
            if let Some(c) = self.chars.get_mut(container) {
                c.pack.count = c.pack.count.saturating_sub(1);
                for slot in c.equipment.iter_mut().filter(|s| **s == Some(item)) {
                    *slot = None;
                }
            }
        }
        if let Some(it) = self.chars.get_mut(item) {
            it.pack.next = None;
            it.pack.container = None;
            it.pack.is_packed = false;
            it.is_equipped = false;
        }
    }

    /// Pour `item`'s ammo into a stack of the same kind in `container`'s
    /// pack. Returns the stack that took any.
    pub(crate) fn top_up_stack(&mut self, container: ChrRef, item: ChrRef) -> Option<ChrRef> {
        let it = self.chars.get(item)?;
        let stackable = self.profiles.get(it.profile).is_some_and(|p| p.is_stackable);
        if !stackable || it.ammo == 0 {
            return None;
        }
        let (profile, ammo) = (it.profile, it.ammo);

        let stack = self.pack_items(container).into_iter().find(|&s| {
            s != item
                && self
                    .chars
                    .get(s)
                    .is_some_and(|c| c.profile == profile && c.ammo < c.ammo_max)
        })?;

        let [st, it] = self.chars.pair_mut(stack, item)?;
        let moved = (st.ammo_max - st.ammo).min(ammo);
        st.ammo += moved;
        it.ammo -= moved;
        tracing::debug!(?stack, ?item, moved, "stacked");
        Some(stack)
    }

    /// Whether `container` already stores a stack of `item`'s kind.
    fn has_matching_stack(&self, container: ChrRef, item: ChrRef) -> bool {
        let Some(it) = self.chars.get(item) else {
            return false;
        };
        if !self.profiles.get(it.profile).is_some_and(|p| p.is_stackable) {
            return false;
        }
        self.pack_items(container)
            .into_iter()
            .any(|s| s != item && self.chars.get(s).is_some_and(|c| c.profile == it.profile))
    }

    /// Store `item` in `container`'s pack.
    pub fn inventory_add(&mut self, item: ChrRef, container: ChrRef) -> CoreResult<()> {
        if item == container {
            return Err(CoreError::InvalidReference("item"));
        }
        let it = self.chars.active(item).ok_or(CoreError::InvalidReference("item"))?;
        self.chars
            .active(container)
            .ok_or(CoreError::InvalidReference("container"))?;
        if it.pack.is_packed {
            return Err(CoreError::InvalidReference("item"));
        }
        let name = it.name.clone();

        if it.is_kursed && (it.is_equipped || it.attached_to.is_some()) {
            if let Some(c) = self.chars.get_mut(container) {
                c.ai.raise(AlertFlags::NOTPUTAWAY);
            }
            self.events.push(SimEvent::Billboard {
                chr: container,
                text: format!("{name} is sticky..."),
            });
            return Err(CoreError::Kursed);
        }

        let topped_up = self.top_up_stack(container, item).is_some();
        if topped_up && self.chars.get(item).is_some_and(|c| c.ammo == 0) {
            if self.chars.get(item).is_some_and(|c| c.attached_to.is_some()) {
                self.detach_any(item)?;
            }
            self.chars.request_terminate(item);
            if let Some(it) = self.chars.get_mut(item) {
                it.ai.raise(AlertFlags::PUTAWAY);
            }
            return Ok(());
        }
        // whatever a stack could not take stays where it is
        if topped_up || self.has_matching_stack(container, item) {
            if let Some(c) = self.chars.get_mut(container) {
                c.ai.raise(AlertFlags::TOOMUCHBAGGAGE);
            }
            return Err(CoreError::PackFull);
        }

        let full = self
            .chars
            .get(container)
            .is_some_and(|c| c.pack.count >= MAXNUMINPACK);
        if full {
            if let Some(c) = self.chars.get_mut(container) {
                c.ai.raise(AlertFlags::TOOMUCHBAGGAGE);
            }
            return Err(CoreError::PackFull);
        }

        if self.chars.get(item).is_some_and(|c| c.attached_to.is_some()) {
            self.detach_any(item)?;
        }
        self.pack_link(container, item);

        let equipment = self
            .chars
            .get(item)
            .and_then(|c| self.profiles.get(c.profile))
            .is_some_and(|p| p.is_equipment);
        let Some([c, it]) = self.chars.pair_mut(container, item) else {
            return Err(CoreError::InvalidReference("item"));
        };
        if equipment {
            if let Some(free) = c.equipment.iter_mut().find(|s| s.is_none()) {
                *free = Some(item);
                it.is_equipped = true;
            }
        }
        it.pos = c.pos;
        it.vel = Vec3::ZERO;
        it.on_platform = None;
        it.timers.dismount = 0;
        it.dismount_object = None;
        it.inst.matrix_cache.invalidate();
        it.ai.raise(AlertFlags::PUTAWAY);

        tracing::debug!(?item, ?container, "put away");
        Ok(())
    }

    /// Take the most recently stored item into `slot`.
    pub fn inventory_get(&mut self, container: ChrRef, slot: Slot, ignore_kursed: bool) -> CoreResult<ChrRef> {
        let last = self
            .pack_items(container)
            .last()
            .copied()
            .ok_or(CoreError::InvalidReference("pack"))?;
        self.inventory_take(container, last, slot, ignore_kursed)
    }

    /// Take a specific stored item into `slot`.
    pub fn inventory_take(
        &mut self,
        container: ChrRef,
        item: ChrRef,
        slot: Slot,
        ignore_kursed: bool,
    ) -> CoreResult<ChrRef> {
        let it = self.chars.get(item).ok_or(CoreError::InvalidReference("item"))?;
        if it.pack.container != Some(container) {
            return Err(CoreError::InvalidReference("item"));
        }
        if it.is_kursed && it.is_equipped && !ignore_kursed {
            let text = format!("{} won't come off!", it.name);
            if let Some(c) = self.chars.get_mut(container) {
                c.ai.raise(AlertFlags::NOTTAKENOUT);
            }
            self.events.push(SimEvent::Billboard { chr: container, text });
            return Err(CoreError::Kursed);
        }
        let hand_full = self
            .chars
            .get(container)
            .is_some_and(|c| c.holding(slot).is_some());
        if hand_full {
            return Err(CoreError::AttachRefused(AttachRefusal::SlotOccupied));
        }

        self.pack_unlink(item);
        if let Err(e) = self.attach(item, container, slot.grip_offset()) {
            self.pack_link(container, item);
            return Err(e);
        }
        if let Some(it) = self.chars.get_mut(item) {
            it.ai.raise(AlertFlags::TAKENOUT);
        }
        tracing::debug!(?item, ?container, "taken out");
        Ok(item)
    }

    /// Put the item in `slot` away and bring out the one stored before it.
    pub fn pack_swap(&mut self, r: ChrRef, slot: Slot) -> bool {
        let prev_last = self.pack_items(r).last().copied();
        let held = self.chars.get(r).and_then(|c| c.holding(slot));

        if let Some(held) = held {
            if self.inventory_add(held, r).is_err() {
                if let Some(c) = self.chars.get_mut(r) {
                    c.ai.raise(AlertFlags::NOTPUTAWAY);
                }
                return false;
            }
        }
        match prev_last {
            Some(item) => self.inventory_take(r, item, slot, false).is_ok(),
            None => held.is_some(),
        }
    }
}
