//! Per-tick matrix pass: holders first, then what they carry.

use bevy::math::{Mat4, Vec3};

use super::{
    character_matrix, four_points, reflection_alpha, reflection_matrix, transform_point,
    CharacterXform, MatrixInputs, WeaponXform,
};
use crate::attachment::holder_first_order;
use crate::character::ChrRef;
use crate::constants::GRIP_VERTS;
use crate::mesh::TileFlags;
use crate::simulation::Simulation;

impl Simulation {
    /// Bring every visible character's matrix up to date.
    pub fn update_all_matrices(&mut self) {
        for r in holder_first_order(&self.chars) {
            if self.chars.active(r).is_some_and(|c| !c.pack.is_packed) {
                self.update_matrix(r);
            }
        }
    }

    /// Rebuild `r`'s matrix when its inputs changed. Returns whether it did.
    pub fn update_matrix(&mut self, r: ChrRef) -> bool {
        let fresh = match self.weapon_inputs(r) {
            Some(w) => MatrixInputs::Weapon(w),
            None => match self.character_inputs(r) {
                Some(x) => MatrixInputs::Character(x),
                None => return false,
            },
        };
        let stale = self
            .chars
            .get(r)
            .is_some_and(|c| c.inst.matrix_cache.needs_update(&fresh));

        if stale {
            let built = match fresh {
                MatrixInputs::Weapon(w) => self.grip_matrix(&w).map(|m| (m, fresh)),
                MatrixInputs::Character(x) => Some((character_matrix(&x), fresh)),
            };
            // a degenerate grip leaves the item drawn where it stands
            let built = built.or_else(|| {
                let x = self.character_inputs(r)?;
                Some((character_matrix(&x), MatrixInputs::Character(x)))
            });
            let Some((matrix, inputs)) = built else {
                return false;
            };
            let Some(chr) = self.chars.get_mut(r) else {
                return false;
            };
            chr.inst.matrix = matrix;
            chr.inst.matrix_cache.store(inputs);
            self.invalidate_carried(r);
        }

        self.update_reflection(r);
        stale
    }

    fn character_inputs(&self, r: ChrRef) -> Option<CharacterXform> {
        let chr = self.chars.get(r)?;
        Some(CharacterXform {
            pos: chr.pos,
            scale: Vec3::splat(chr.fat),
            facing_z: chr.ori.facing_z,
            map_x: chr.ori.map_x,
            map_y: chr.ori.map_y,
        })
    }

    /// Grip inputs of a held item, interpolating the holder's grip vertices
    /// on the way. `None` for anything not held through a valid grip.
    fn weapon_inputs(&mut self, r: ChrRef) -> Option<WeaponXform> {
        let chr = self.chars.get(r)?;
        let binding = chr.inst.matrix_cache.grip?;
        if chr.attached_to != Some(binding.holder) {
            return None;
        }
        let scale = Vec3::splat(chr.fat);

        let model_id = self.chars.get(binding.holder)?.inst.model?;
        let model = self.models.get(model_id)?;
        let holder = self.chars.get_mut(binding.holder)?;
        holder
            .inst
            .update_vertices(model, binding.verts[0], binding.verts[GRIP_VERTS - 1])
            .ok()?;

        Some(WeaponXform {
            holder: binding.holder,
            slot: binding.slot,
            grip_verts: binding.verts,
            holder_matrix: holder.inst.matrix,
            holder_frame_lst: holder.inst.frame_lst,
            holder_frame_nxt: holder.inst.frame_nxt,
            holder_flip: holder.inst.flip,
            scale,
        })
    }

    fn grip_matrix(&self, w: &WeaponXform) -> Option<Mat4> {
        let holder = self.chars.get(w.holder)?;
        let mut points = [Vec3::ZERO; GRIP_VERTS];
        for (p, &v) in points.iter_mut().zip(&w.grip_verts) {
            *p = transform_point(&w.holder_matrix, *holder.inst.vlst.get(v)?);
        }
        four_points(points, w.scale)
    }

    /// Mark everything `r` holds or stores as needing a new matrix.
    fn invalidate_carried(&mut self, r: ChrRef) {
        let mut carried: Vec<ChrRef> = self
            .chars
            .get(r)
            .map(|c| c.held_items().collect())
            .unwrap_or_default();
        carried.extend(self.pack_items(r));
        for item in carried {
            if let Some(c) = self.chars.get_mut(item) {
                c.inst.matrix_cache.invalidate();
            }
        }
    }

    fn update_reflection(&mut self, r: ChrRef) {
        let Some(chr) = self.chars.get(r) else {
            return;
        };
        let noreflect = self.mesh.has_flags(chr.grid, TileFlags::NOREFLECT);
        let Some(chr) = self.chars.get_mut(r) else {
            return;
        };
        let floor = chr.enviro.floor_level;
        let refl = &mut chr.inst.reflection;
        refl.valid = !noreflect;
        refl.floor = floor;
        refl.matrix = reflection_matrix(&chr.inst.matrix, floor);
        refl.alpha = reflection_alpha(chr.inst.alpha, chr.pos.z, floor);
    }
}
