//! Death and experience.

use bevy::math::Vec2;
use rand::Rng;

use super::{AlertFlags, ChrRef};
use crate::constants::{DROPXYVEL, DROPZVEL};
use crate::instance::action::Action;
use crate::model::FrameFx;
use crate::simulation::{SimEvent, Simulation};

/// Kinds of experience, each scaled by its own profile rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XpType {
    Finesse,
    Achieve,
    KillEnemy,
    KillSleepy,
    KillHated,
    TeamKill,
    /// Unscaled grants from scripts
    Direct,
}

pub const XP_COUNT: usize = 7;

impl XpType {
    pub fn index(self) -> usize {
        self as usize
    }
}

impl Simulation {
    /// Grant experience, scaled by the receiver's rate for `kind`.
    pub fn give_experience(&mut self, r: ChrRef, amount: f32, kind: XpType) {
        let Some(chr) = self.chars.active(r) else {
            return;
        };
        if !chr.alive || amount <= 0.0 {
            return;
        }
        let rate = match kind {
            XpType::Direct => 1.0,
            _ => self
                .profiles
                .get(chr.profile)
                .map_or(1.0, |p| p.experience_rate[kind.index()]),
        };
        if let Some(chr) = self.chars.active_mut(r) {
            chr.experience += amount * rate;
        }
    }

    /// Kill `r`. Returns false when it was already dead or the current frame
    /// makes it invincible.
    pub fn kill(&mut self, r: ChrRef, killer: Option<ChrRef>, ignore_invictus: bool) -> bool {
        let Some(victim) = self.chars.active(r) else {
            return false;
        };
        if !victim.alive {
            return false;
        }
        let invictus = victim
            .inst
            .model
            .and_then(|id| self.models.get(id))
            .is_some_and(|m| victim.inst.current_fx(m).contains(FrameFx::INVICTUS));
        if invictus && !ignore_invictus {
            return false;
        }

        if victim.attached_to.is_some() {
            let _ = self.detach_any(r);
        }
        self.award_kill(r, killer);
        self.alert_listeners(r);

        let Some(victim) = self.chars.active_mut(r) else {
            return false;
        };
        victim.alive = false;
        victim.life = victim.life.min(0.0);
        victim.is_platform = true;
        victim.bump_dampen *= 0.5;
        victim.ai.raise(AlertFlags::KILLED);
        let team = victim.team;
        let death = Action::KA
            .with_variant(self.rng.gen_range(0..4usize))
            .unwrap_or(Action::KA);
        self.teams.remove_morale(team);
        if self.teams.leader(team) == Some(r) {
            self.teams.set_leader(team, None);
        }
        self.play_action(r, death, true);
        if let Some(victim) = self.chars.active_mut(r) {
            victim.inst.action_keep = true;
        }

        self.scatter_belongings(r);
        self.events.push(SimEvent::Think { chr: r });
        tracing::debug!(?r, ?killer, "killed");
        true
    }

    fn award_kill(&mut self, r: ChrRef, killer: Option<ChrRef>) {
        let Some(victim) = self.chars.active(r) else {
            return;
        };
        let Some(vp) = self.profiles.get(victim.profile) else {
            return;
        };
        let worth = vp.experience_worth + victim.experience * vp.experience_exchange;
        let (victim_team, parent, kind) = (victim.team, vp.idsz_parent, vp.idsz_type);

        let Some(killer) = killer.filter(|&k| k != r) else {
            return;
        };
        let Some(k) = self.chars.active(killer) else {
            return;
        };
        let killer_team = k.team;
        let hated = self.profiles.get(k.profile).is_some_and(|kp| {
            !kp.idsz_hate.is_none() && (kp.idsz_hate == parent || kp.idsz_hate == kind)
        });
        if hated {
            self.give_experience(killer, worth, XpType::KillHated);
        } else if self.teams.hates(killer_team, victim_team) {
            self.give_experience(killer, worth, XpType::KillEnemy);
        }

        let allies: Vec<ChrRef> = self
            .chars
            .iter_active()
            .filter(|&(o, c)| {
                o != killer
                    && o != r
                    && c.alive
                    && !c.is_item
                    && self.teams.hates(c.team, victim_team)
                    && !self.teams.hates(c.team, killer_team)
            })
            .map(|(o, _)| o)
            .collect();
        for ally in allies {
            self.give_experience(ally, worth, XpType::TeamKill);
        }
    }

    fn alert_listeners(&mut self, r: ChrRef) {
        let Some(team) = self.chars.active(r).map(|c| c.team) else {
            return;
        };
        let was_leader = self.teams.leader(team) == Some(r);
        for o in self.chars.active_keys() {
            if o == r {
                continue;
            }
            let Some(c) = self.chars.active_mut(o) else {
                continue;
            };
            if !c.alive {
                continue;
            }
            if c.ai.target == Some(r) {
                c.ai.raise(AlertFlags::TARGETKILLED);
            }
            if was_leader && c.team == team {
                c.ai.raise(AlertFlags::LEADERKILLED);
            }
        }
    }

    /// Drop held items, and the pack when the profile says so, each with an
    /// outward shove.
    fn scatter_belongings(&mut self, r: ChrRef) {
        let Some(victim) = self.chars.get(r) else {
            return;
        };
        let held: Vec<ChrRef> = victim.held_items().collect();
        let origin = victim.pos;
        let drop_pack = self
            .profiles
            .get(victim.profile)
            .is_some_and(|p| p.drop_pack_on_death);

        for item in held {
            if self.detach_any(item).is_ok() {
                self.shove(item, 0.0);
            }
        }
        if !drop_pack {
            return;
        }
        for item in self.pack_items(r) {
            self.pack_unlink(item);
            if let Some(it) = self.chars.get_mut(item) {
                it.pos = origin;
                it.dismount_object = Some(r);
                it.ai.raise(AlertFlags::DROPPED);
            }
            self.shove(item, DROPZVEL);
        }
    }

    fn shove(&mut self, item: ChrRef, up: f32) {
        let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
        let dir = Vec2::from_angle(angle) * DROPXYVEL;
        if let Some(it) = self.chars.get_mut(item) {
            it.vel.x += dir.x;
            it.vel.y += dir.y;
            it.vel.z += up;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{Slot, Team};
    use crate::config::SimConfig;
    use crate::constants::GRIP_LEFT;
    use crate::mesh::MeshBuilder;
    use crate::model::ModelBuilder;
    use crate::profile::CharacterProfile;
    use bevy::math::Vec3;

    struct Fight {
        sim: Simulation,
        hero: ChrRef,
        ally: ChrRef,
        orc: ChrRef,
        axe: ChrRef,
    }

    fn fight() -> Fight {
        let mut sim = Simulation::new(SimConfig::default(), MeshBuilder::new(8, 8).build());
        let model = sim.add_model(
            ModelBuilder::new("biped", 8)
                .action(Action::DA, 0, 3)
                .action(Action::KA, 4, 7)
                .build(),
        );
        let person = sim.add_profile(CharacterProfile {
            model: Some(model),
            ..CharacterProfile::default()
        });
        let axe = sim.add_profile(CharacterProfile::item("Axe"));
        let hero = sim.spawn(person, Vec3::new(200.0, 200.0, 0.0), 0, Team::GOOD).unwrap();
        let ally = sim.spawn(person, Vec3::new(200.0, 600.0, 0.0), 0, Team::GOOD).unwrap();
        let orc = sim.spawn(person, Vec3::new(600.0, 600.0, 0.0), 0, Team::EVIL).unwrap();
        let axe = sim.spawn(axe, Vec3::new(620.0, 600.0, 0.0), 0, Team::NULL).unwrap();
        sim.tick();
        sim.attach(axe, orc, GRIP_LEFT).unwrap();
        Fight { sim, hero, ally, orc, axe }
    }

    #[test]
    fn test_kill_pays_killer_and_allies() {
        let Fight { mut sim, hero, ally, orc, .. } = fight();
        assert!(sim.kill(orc, Some(hero), false));

        // worth = 10 + 0 * exchange, at rate 1
        assert_eq!(sim.chars.get(hero).unwrap().experience, 10.0);
        assert_eq!(sim.chars.get(ally).unwrap().experience, 10.0);
        assert_eq!(sim.teams.morale(Team::EVIL), 0);
    }

    #[test]
    fn test_corpse_drops_weapon_and_becomes_platform() {
        let Fight { mut sim, hero, orc, axe, .. } = fight();
        sim.chars.get_mut(hero).unwrap().ai.target = Some(orc);
        sim.kill(orc, None, false);

        let body = sim.chars.get(orc).unwrap();
        assert!(!body.alive);
        assert!(body.is_platform);
        assert!(body.ai.has(AlertFlags::KILLED));
        assert_eq!(body.holding(Slot::Left), None);
        assert_eq!(body.inst.action, Action::KA);
        assert_eq!(sim.chars.get(axe).unwrap().attached_to, None);
        assert!(sim.chars.get(hero).unwrap().ai.has(AlertFlags::TARGETKILLED));
        assert!(sim.events().iter().any(|e| matches!(e, SimEvent::Think { chr } if *chr == orc)));
    }

    #[test]
    fn test_dead_stay_dead() {
        let Fight { mut sim, orc, .. } = fight();
        assert!(sim.kill(orc, None, false));
        assert!(!sim.kill(orc, None, false));
    }

    #[test]
    fn test_friendly_kill_pays_nothing() {
        let Fight { mut sim, hero, ally, .. } = fight();
        sim.kill(ally, Some(hero), false);
        assert_eq!(sim.chars.get(hero).unwrap().experience, 0.0);
    }

    #[test]
    fn test_xp_indices_cover_table() {
        assert_eq!(XpType::Direct.index() + 1, XP_COUNT);
        assert_eq!(XpType::KillEnemy.index(), 2);
    }
}
