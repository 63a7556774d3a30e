//! Controller input and the button half of the character step.
//!
//! - [`Latch`]: direction plus button set written by a player or script
//! - Jump, dismount, grab/drop, pack swap and the attack pipeline

use bevy::math::Vec2;
use bitflags::bitflags;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::character::{AlertFlags, ChrRef, Slot};
use crate::constants::{
    DISMOUNTZVEL, DISMOUNTZVELFLY, GRABDELAY, JUMPDELAY, JUMPINFINITE, PACKDELAY, WATERJUMP,
};
use crate::instance::action::{Action, ACTION_DROP, ACTION_GRAB};
use crate::simulation::{SimEvent, SoundKind, Simulation};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct LatchButtons: u8 {
        const JUMP      = 1 << 0;
        const LEFT      = 1 << 1;
        const RIGHT     = 1 << 2;
        const ALTLEFT   = 1 << 3;
        const ALTRIGHT  = 1 << 4;
        const PACKLEFT  = 1 << 5;
        const PACKRIGHT = 1 << 6;
    }
}

/// One tick of controller input.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Latch {
    pub x: f32,
    pub y: f32,
    pub buttons: LatchButtons,
}

impl Latch {
    pub fn new(dir: Vec2, buttons: LatchButtons) -> Self {
        Self {
            x: dir.x,
            y: dir.y,
            buttons,
        }
    }

    pub fn dir(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn pressed(&self, button: LatchButtons) -> bool {
        self.buttons.contains(button)
    }
}

impl Simulation {
    /// React to the buttons held this tick.
    pub(crate) fn apply_latch_buttons(&mut self, r: ChrRef) {
        let Some(chr) = self.chars.active(r) else {
            return;
        };
        let latch = chr.latch;

        if latch.pressed(LatchButtons::JUMP) && chr.timers.jump == 0 {
            self.latch_jump(r);
        }

        for (button, slot) in [(LatchButtons::ALTLEFT, Slot::Left), (LatchButtons::ALTRIGHT, Slot::Right)] {
            if latch.pressed(button) {
                self.latch_grab_or_drop(r, slot);
            }
        }

        for (button, slot) in [(LatchButtons::PACKLEFT, Slot::Left), (LatchButtons::PACKRIGHT, Slot::Right)] {
            if latch.pressed(button) {
                self.latch_pack(r, slot);
            }
        }

        for (button, slot) in [(LatchButtons::LEFT, Slot::Left), (LatchButtons::RIGHT, Slot::Right)] {
            if latch.pressed(button) {
                self.attack(r, slot);
            }
        }
    }

    fn latch_jump(&mut self, r: ChrRef) {
        let Some(chr) = self.chars.active(r) else {
            return;
        };

        if let Some(mount) = chr.attached_to {
            let flying = chr.is_flying();
            // riders always get off; items never jump out of hands
            if chr.is_item {
                return;
            }
            if self.detach(r, true, false).is_err() {
                return;
            }
            let Some(chr) = self.chars.active_mut(r) else {
                return;
            };
            chr.vel.z += if flying { DISMOUNTZVELFLY } else { DISMOUNTZVEL };
            chr.timers.jump = JUMPDELAY;
            chr.dismount_object = Some(mount);
            self.play_action(r, Action::JA, true);
            tracing::debug!(?r, ?mount, "dismount jump");
            return;
        }

        let can_jump = chr.jump_number > 0 && (chr.enviro.grounded || chr.jump_number < chr.jump_number_reset || chr.enviro.is_watery);
        if !can_jump || chr.is_flying() {
            return;
        }
        let Some(profile) = self.profiles.get(chr.profile) else {
            return;
        };
        let power = if chr.enviro.is_watery {
            WATERJUMP
        } else {
            profile.jump_power
        };
        let sound = profile.sound_jump;

        let Some(chr) = self.chars.active_mut(r) else {
            return;
        };
        chr.vel.z += power;
        chr.timers.jump = JUMPDELAY;
        chr.jump_ready = false;
        if chr.jump_number != JUMPINFINITE {
            chr.jump_number -= 1;
        }
        self.play_action(r, Action::JA, true);
        if let Some(sound) = sound {
            self.events.push(SimEvent::Sound {
                chr: r,
                sound,
                kind: SoundKind::Jump,
            });
        }
    }

    /// ALT buttons: pick something up with an empty hand, drop what it holds otherwise.
    fn latch_grab_or_drop(&mut self, r: ChrRef, slot: Slot) {
        let Some(chr) = self.chars.active(r) else {
            return;
        };
        if chr.timers.reload > 0 || (chr.attached_to.is_some() && chr.is_item) {
            return;
        }
        let empty = chr.holding(slot).is_none();
        let actions = if empty { ACTION_GRAB } else { ACTION_DROP };
        let action = actions[slot.index()];
        if self.play_action(r, action, false) {
            if let Some(chr) = self.chars.active_mut(r) {
                chr.timers.reload = GRABDELAY;
            }
        }
    }

    fn latch_pack(&mut self, r: ChrRef, slot: Slot) {
        let Some(chr) = self.chars.active(r) else {
            return;
        };
        if chr.timers.reload > 0 || chr.is_item {
            return;
        }
        self.pack_swap(r, slot);
        if let Some(chr) = self.chars.active_mut(r) {
            chr.timers.reload = PACKDELAY;
        }
    }

    /// Start an attack with whatever is in `slot`, or unarmed. A rider whose
    /// mount forbids riders from attacking makes the mount attack instead,
    /// unarmed unless the rider holds a weapon in that hand.
    pub fn attack(&mut self, r: ChrRef, slot: Slot) -> bool {
        let Some(chr) = self.chars.active(r) else {
            return false;
        };
        if chr.timers.reload > 0 || !chr.alive || chr.is_item {
            return false;
        }
        let weapon = chr.holding(slot);

        let mut actor = r;
        if let Some(mount) = chr.attached_to {
            let forbids = self
                .chars
                .active(mount)
                .filter(|m| m.is_mount)
                .and_then(|m| self.profiles.get(m.profile))
                .is_some_and(|p| !p.rider_can_attack);
            if forbids {
                actor = mount;
            }
        }

        let weapon_profile = match weapon {
            Some(w) => self.chars.active(w).and_then(|c| self.profiles.get(c.profile)),
            None => self.chars.active(actor).and_then(|c| self.profiles.get(c.profile)),
        };
        let Some(weapon_profile) = weapon_profile else {
            return false;
        };
        let (base_action, delay, cost) = (
            weapon_profile.weapon_action,
            weapon_profile.attack_delay,
            weapon_profile.mana_cost,
        );

        let Some(actor_chr) = self.chars.active(actor) else {
            return false;
        };
        if actor_chr.timers.reload > 0 {
            return false;
        }
        if actor_chr.mana < cost {
            tracing::debug!(?actor, cost, "not enough mana to attack");
            return false;
        }

        // left hand swings A/B, right hand C/D
        let variant = slot.index() * 2 + self.rng.gen_range(0..2usize);
        let action = base_action.with_variant(variant).unwrap_or(base_action);
        if !self.play_action(actor, action, false) {
            return false;
        }

        if let Some(actor_chr) = self.chars.active_mut(actor) {
            actor_chr.mana -= cost;
            actor_chr.timers.reload = delay;
            actor_chr.ai.lastitemused = weapon;
        }
        if let Some(w) = weapon.and_then(|w| self.chars.active_mut(w)) {
            w.ai.raise(AlertFlags::USED);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::Team;
    use crate::config::SimConfig;
    use crate::constants::{GRIP_LEFT, GRIP_ONLY};
    use crate::mesh::{Mesh, MeshBuilder, TileFlags};
    use crate::model::{FrameFx, ModelBuilder, ModelId};
    use crate::profile::CharacterProfile;
    use bevy::math::Vec3;

    /// A sim whose one model can stand, jump, swing, grab and drop.
    fn arena(mesh: Mesh) -> (Simulation, ModelId) {
        let mut sim = Simulation::new(SimConfig::default(), mesh);
        let model = sim.add_model(
            ModelBuilder::new("fighter", 16)
                .action(Action::DA, 0, 1)
                .action(Action::JA, 2, 3)
                .action(Action::UA, 4, 7)
                .action(ACTION_DROP[0], 8, 11)
                .fx(9, FrameFx::DROPLEFT)
                .action(ACTION_GRAB[0], 12, 15)
                .fx(13, FrameFx::GRABLEFT)
                .build(),
        );
        (sim, model)
    }

    fn spawn(sim: &mut Simulation, profile: CharacterProfile, x: f32) -> ChrRef {
        let id = sim.add_profile(profile);
        sim.spawn(id, Vec3::new(x, 300.0, 0.0), 0, Team::GOOD).unwrap()
    }

    fn press(sim: &mut Simulation, r: ChrRef, buttons: LatchButtons) {
        sim.set_latch(r, Latch::new(Vec2::ZERO, buttons));
    }

    #[test]
    fn test_attack_spends_weapon_mana_and_reloads() {
        let (mut sim, model) = arena(MeshBuilder::new(8, 8).build());
        let hero = spawn(
            &mut sim,
            CharacterProfile {
                model: Some(model),
                mana: 5.0,
                ..CharacterProfile::default()
            },
            300.0,
        );
        let wand = spawn(
            &mut sim,
            CharacterProfile {
                mana_cost: 2.0,
                attack_delay: 30,
                ..CharacterProfile::item("Wand")
            },
            600.0,
        );
        sim.tick();
        sim.attach(wand, hero, GRIP_LEFT).unwrap();

        press(&mut sim, hero, LatchButtons::LEFT);
        sim.tick();

        let chr = sim.chars.get(hero).unwrap();
        assert_eq!(chr.mana, 3.0);
        assert_eq!(chr.timers.reload, 30);
        assert_eq!(chr.inst.action, Action::UA);
        assert_eq!(chr.ai.lastitemused, Some(wand));
        assert!(sim.chars.get(wand).unwrap().ai.has(AlertFlags::USED));

        // held down, the next swing waits for the reload
        sim.tick();
        assert_eq!(sim.chars.get(hero).unwrap().mana, 3.0);
        sim.run(29);
        assert_eq!(sim.chars.get(hero).unwrap().mana, 1.0);
    }

    #[test]
    fn test_attack_refused_when_mana_is_short() {
        let (mut sim, model) = arena(MeshBuilder::new(8, 8).build());
        let hero = spawn(
            &mut sim,
            CharacterProfile {
                model: Some(model),
                mana: 1.0,
                mana_cost: 2.0,
                ..CharacterProfile::default()
            },
            300.0,
        );
        sim.tick();

        press(&mut sim, hero, LatchButtons::LEFT);
        sim.tick();

        let chr = sim.chars.get(hero).unwrap();
        assert_eq!(chr.mana, 1.0);
        assert_eq!(chr.timers.reload, 0);
        assert_ne!(chr.inst.action, Action::UA);
    }

    #[test]
    fn test_mount_attacks_for_a_forbidden_rider() {
        let (mut sim, model) = arena(MeshBuilder::new(8, 8).build());
        let horse = spawn(
            &mut sim,
            CharacterProfile {
                model: Some(model),
                is_mount: true,
                rider_can_attack: false,
                attack_delay: 40,
                ..CharacterProfile::default()
            },
            300.0,
        );
        let rider = spawn(
            &mut sim,
            CharacterProfile {
                model: Some(model),
                ..CharacterProfile::default()
            },
            600.0,
        );
        sim.tick();
        sim.attach(rider, horse, GRIP_ONLY).unwrap();

        press(&mut sim, rider, LatchButtons::LEFT);
        sim.tick();

        let mount = sim.chars.get(horse).unwrap();
        assert_eq!(mount.inst.action, Action::UA);
        assert!(mount.timers.reload > 0);
        // the rider's hand is empty, not the rider itself
        assert_eq!(mount.ai.lastitemused, None);
        assert_eq!(sim.chars.get(rider).unwrap().timers.reload, 0);
    }

    #[test]
    fn test_alt_button_grabs_then_drops() {
        let (mut sim, model) = arena(MeshBuilder::new(8, 8).build());
        let hero = spawn(
            &mut sim,
            CharacterProfile {
                model: Some(model),
                ..CharacterProfile::default()
            },
            300.0,
        );
        let gem = spawn(&mut sim, CharacterProfile::item("Gem"), 340.0);
        sim.tick();

        press(&mut sim, hero, LatchButtons::ALTLEFT);
        sim.tick();
        let chr = sim.chars.get(hero).unwrap();
        assert_eq!(chr.inst.action, ACTION_GRAB[0]);
        assert_eq!(chr.timers.reload, GRABDELAY);

        // the grab lands on the action's GRABLEFT frame
        press(&mut sim, hero, LatchButtons::empty());
        sim.run(8);
        assert_eq!(sim.chars.get(hero).unwrap().holding(Slot::Left), Some(gem));

        sim.run(GRABDELAY as u32);
        press(&mut sim, hero, LatchButtons::ALTLEFT);
        sim.tick();
        assert_eq!(sim.chars.get(hero).unwrap().inst.action, ACTION_DROP[0]);
        press(&mut sim, hero, LatchButtons::empty());
        sim.run(8);
        assert_eq!(sim.chars.get(hero).unwrap().holding(Slot::Left), None);
        assert_eq!(sim.chars.get(gem).unwrap().attached_to, None);
    }

    #[test]
    fn test_pack_button_swaps_hand_and_pack() {
        let (mut sim, model) = arena(MeshBuilder::new(8, 8).build());
        let hero = spawn(
            &mut sim,
            CharacterProfile {
                model: Some(model),
                ..CharacterProfile::default()
            },
            300.0,
        );
        let sword = spawn(&mut sim, CharacterProfile::item("Sword"), 600.0);
        let gem = spawn(&mut sim, CharacterProfile::item("Gem"), 700.0);
        sim.tick();
        sim.attach(sword, hero, GRIP_LEFT).unwrap();
        sim.inventory_add(gem, hero).unwrap();

        press(&mut sim, hero, LatchButtons::PACKLEFT);
        sim.tick();

        let chr = sim.chars.get(hero).unwrap();
        assert_eq!(chr.holding(Slot::Left), Some(gem));
        assert_eq!(chr.timers.reload, PACKDELAY);
        assert_eq!(sim.pack_items(hero), vec![sword]);

        // still held: nothing happens until the reload runs out
        sim.tick();
        assert_eq!(sim.chars.get(hero).unwrap().holding(Slot::Left), Some(gem));
    }

    #[test]
    fn test_water_jump_ignores_jump_power() {
        let mesh = MeshBuilder::new(8, 8)
            .water(50.0)
            .flag_rect(0, 0, 7, 7, TileFlags::WATER)
            .build();
        let (mut sim, model) = arena(mesh);
        let swimmer = spawn(
            &mut sim,
            CharacterProfile {
                model: Some(model),
                jump_power: 3.0,
                ..CharacterProfile::default()
            },
            300.0,
        );
        sim.tick();
        assert!(sim.chars.get(swimmer).unwrap().enviro.is_watery);

        press(&mut sim, swimmer, LatchButtons::JUMP);
        sim.tick();

        let chr = sim.chars.get(swimmer).unwrap();
        assert!((chr.vel.z - WATERJUMP).abs() < 0.5, "vz = {}", chr.vel.z);
        assert_eq!(chr.jump_number, 0);
        assert_eq!(chr.timers.jump, JUMPDELAY);
    }

    #[test]
    fn test_jumps_count_down_in_the_air() {
        let (mut sim, model) = arena(MeshBuilder::new(8, 8).build());
        let hero = spawn(
            &mut sim,
            CharacterProfile {
                model: Some(model),
                jump_power: 20.0,
                jump_number: 2,
                ..CharacterProfile::default()
            },
            300.0,
        );
        press(&mut sim, hero, LatchButtons::JUMP);

        sim.tick();
        assert_eq!(sim.chars.get(hero).unwrap().jump_number, 1);
        sim.run(JUMPDELAY as u32 - 1);
        assert_eq!(sim.chars.get(hero).unwrap().jump_number, 1);

        // second jump, in mid air, once the delay runs out
        sim.tick();
        let chr = sim.chars.get(hero).unwrap();
        assert_eq!(chr.jump_number, 0);
        assert!(chr.pos.z > 0.0);

        sim.run(10);
        let chr = sim.chars.get(hero).unwrap();
        assert_eq!(chr.jump_number, 0);
        assert!(!chr.enviro.grounded);
    }

    #[test]
    fn test_latch_buttons_parse_from_text() {
        let latch: Latch = ron::from_str("(x: 0.5, y: 0.0, buttons: \"JUMP | LEFT\")").unwrap();
        assert!(latch.pressed(LatchButtons::JUMP));
        assert!(latch.pressed(LatchButtons::LEFT));
        assert!(!latch.pressed(LatchButtons::RIGHT));
        assert_eq!(latch.dir(), Vec2::new(0.5, 0.0));
    }
}
