use bevy::math::Vec3;

use super::Simulation;
use crate::breadcrumb::BreadcrumbRing;
use crate::character::{AlertFlags, Character, ChrRef, Team};
use crate::error::{CoreError, CoreResult};
use crate::instance::action::Action;
use crate::profile::ProfileId;

impl Simulation {
    /// Create a character from a profile. It joins the simulation at the
    /// start of the next tick.
    pub fn spawn(&mut self, profile: ProfileId, pos: Vec3, facing_z: u16, team: Team) -> CoreResult<ChrRef> {
        let p = self
            .profiles
            .get(profile)
            .ok_or(CoreError::InvalidReference("profile"))?;

        let floor = self.mesh.height_at(pos.truncate(), p.waterwalk);
        let pos = Vec3::new(pos.x, pos.y, pos.z.max(floor));

        let mut chr = Character::from_profile(profile, p, pos, facing_z, team);
        chr.crumbs = BreadcrumbRing::new(self.config.breadcrumb_capacity);
        chr.enviro.floor_level = floor;
        chr.enviro.level = floor;
        chr.inst.alpha = p.alpha;
        chr.inst.light = p.light;
        chr.inst.sheen = p.sheen;
        chr.ai.raise(AlertFlags::SPAWNED);
        let (alive, is_item, name) = (chr.alive, chr.is_item, chr.name.clone());

        match p.model.and_then(|id| self.models.get(id)) {
            Some(model) => {
                if let Err(e) = chr.inst.set_action(model, Action::DA, true) {
                    tracing::warn!(%name, "model has no idle action: {e}");
                }
            }
            None => tracing::warn!(%name, "spawned without a model"),
        }

        let r = self.chars.insert(chr);
        if alive && !is_item {
            self.teams.add_morale(team);
        }
        tracing::debug!(?r, %name, x = pos.x, y = pos.y, z = pos.z, "character spawned");
        Ok(r)
    }

    /// Remove `r` at the end of the current tick.
    pub fn request_terminate(&mut self, r: ChrRef) {
        self.chars.request_terminate(r);
    }
}
