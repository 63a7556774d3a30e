use sha3::{Digest, Sha3_256};

use super::Simulation;
use crate::character::ChrRef;

fn put_ref(hasher: &mut Sha3_256, r: Option<ChrRef>) {
    use slotmap::Key;
    hasher.update(r.map_or(u64::MAX, |r| r.data().as_ffi()).to_le_bytes());
}

impl Simulation {
    /// Digest of every active character's state. Two runs fed the same
    /// inputs produce the same digest tick for tick.
    pub fn state_hash(&self) -> [u8; 32] {
        let mut hasher = Sha3_256::new();
        hasher.update(self.update_wld.to_le_bytes());

        for (r, c) in self.chars.iter_active() {
            put_ref(&mut hasher, Some(r));
            for v in [c.pos, c.vel] {
                for f in v.to_array() {
                    hasher.update(f.to_bits().to_le_bytes());
                }
            }
            hasher.update(c.ori.facing_z.to_le_bytes());
            hasher.update(c.ori.map_x.to_le_bytes());
            hasher.update(c.ori.map_y.to_le_bytes());

            let t = &c.timers;
            for timer in [t.jump, t.reload, t.careful, t.damage, t.dismount, t.daze, t.grog, t.bore] {
                hasher.update(timer.to_le_bytes());
            }
            hasher.update([c.alive as u8, c.jump_number, c.team.0]);
            hasher.update(c.ammo.to_le_bytes());
            hasher.update(c.ai.alert.bits().to_le_bytes());

            put_ref(&mut hasher, c.attached_to);
            put_ref(&mut hasher, c.holding[0]);
            put_ref(&mut hasher, c.holding[1]);
            put_ref(&mut hasher, c.pack.next);
            put_ref(&mut hasher, c.on_platform);

            let inst = &c.inst;
            hasher.update([inst.action as u8, inst.lip]);
            hasher.update((inst.frame_lst as u64).to_le_bytes());
            hasher.update((inst.frame_nxt as u64).to_le_bytes());
            hasher.update(inst.flip.to_bits().to_le_bytes());
        }
        hasher.finalize().into()
    }
}
