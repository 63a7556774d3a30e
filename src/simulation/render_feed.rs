use bevy::math::{Mat4, Vec3};

use super::Simulation;
use crate::bounding::OctBb;
use crate::character::ChrRef;

/// What a renderer needs to draw one character.
#[derive(Debug, Clone)]
pub struct RenderEntry {
    pub chr: ChrRef,
    pub matrix: Mat4,
    pub reflection: Option<Mat4>,
    pub reflection_alpha: u8,
    pub alpha: u8,
    pub light: u8,
    pub sheen: u8,
    /// Red, green and blue shift
    pub tint: [u8; 3],
    /// Interpolated pose, model space
    pub vertices: Vec<Vec3>,
    pub world_bb: OctBb,
}

impl Simulation {
    /// Visible characters with their current pose. Packed characters are
    /// hidden.
    pub fn render_feed(&mut self) -> Vec<RenderEntry> {
        let visible: Vec<ChrRef> = self
            .chars
            .iter_active()
            .filter(|(_, c)| !c.pack.is_packed)
            .map(|(r, _)| r)
            .collect();

        let mut feed = Vec::with_capacity(visible.len());
        for r in visible {
            let model_id = self.ensure_model(r);
            let Some(chr) = self.chars.get_mut(r) else {
                continue;
            };
            if let Some(model) = model_id.and_then(|id| self.models.get(id)) {
                let last = model.vertex_count().saturating_sub(1);
                if let Err(e) = chr.inst.update_vertices(model, 0, last) {
                    tracing::debug!(?r, "no pose for render: {e}");
                }
            }
            let inst = &chr.inst;
            feed.push(RenderEntry {
                chr: r,
                matrix: inst.matrix,
                reflection: inst.reflection.valid.then_some(inst.reflection.matrix),
                reflection_alpha: inst.reflection.alpha,
                alpha: inst.alpha,
                light: inst.light,
                sheen: inst.sheen,
                tint: [inst.redshift, inst.grnshift, inst.blushift],
                vertices: inst.vlst.clone(),
                world_bb: chr.world_bb(),
            });
        }
        feed
    }
}
