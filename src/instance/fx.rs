//! Frame FX side effects.

use crate::character::attach::GrabKind;
use crate::character::{ChrRef, Slot};
use crate::model::FrameFx;
use crate::simulation::{Simulation, SimEvent, SoundKind};

/// FX bits of each hand, as (act, grab item, grab character, drop).
fn hand_bits(slot: Slot) -> [FrameFx; 4] {
    match slot {
        Slot::Left => [
            FrameFx::ACTLEFT,
            FrameFx::GRABLEFT,
            FrameFx::CHARLEFT,
            FrameFx::DROPLEFT,
        ],
        Slot::Right => [
            FrameFx::ACTRIGHT,
            FrameFx::GRABRIGHT,
            FrameFx::CHARRIGHT,
            FrameFx::DROPRIGHT,
        ],
    }
}

impl Simulation {
    /// React to the FX of one frame just entered by `r`.
    pub(crate) fn dispatch_frame_fx(&mut self, r: ChrRef, fx: FrameFx) {
        for slot in Slot::BOTH {
            let [act, grab, grab_char, drop] = hand_bits(slot);
            if fx.contains(act) {
                self.events.push(SimEvent::Swipe { chr: r, slot });
            }
            if fx.contains(grab) {
                self.grab_nearby(r, slot, GrabKind::Item);
            }
            if fx.contains(grab_char) {
                self.grab_nearby(r, slot, GrabKind::Character);
            }
            if fx.contains(drop) {
                self.drop_held(r, slot);
            }
        }

        if fx.contains(FrameFx::POOF) {
            let when = self.update_wld + 1;
            if let Some(chr) = self.chars.get_mut(r).filter(|c| !c.is_player) {
                chr.ai.poof_time = Some(when);
            }
        }

        if fx.contains(FrameFx::FOOTFALL) {
            let sound = self
                .chars
                .get(r)
                .and_then(|c| self.profiles.get(c.profile))
                .and_then(|p| p.sound_footfall);
            if let Some(sound) = sound {
                self.events.push(SimEvent::Sound {
                    chr: r,
                    sound,
                    kind: SoundKind::Footfall,
                });
            }
        }
    }

    fn drop_held(&mut self, r: ChrRef, slot: Slot) {
        let Some(item) = self.chars.get(r).and_then(|c| c.holding(slot)) else {
            return;
        };
        if let Err(e) = self.detach(item, false, true) {
            tracing::debug!(?item, "frame drop refused: {e}");
        }
    }
}
