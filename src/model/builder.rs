use bevy::math::Vec3;

use super::{ActionRange, FrameFx, Model, ModelFrame};
use crate::bounding::OctBb;
use crate::instance::action::{Action, ACTION_COUNT};

/// Assembles a [`Model`] from a static body, two grip points and per-frame
/// metadata. Grip points may sway per frame so held items visibly move.
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    name: String,
    frame_count: usize,
    body: Vec<Vec3>,
    /// Left, right
    grips: [Vec3; 2],
    fx: Vec<FrameFx>,
    framelip: Vec<u8>,
    sway: Vec<Vec3>,
    actions: Vec<(Action, usize, usize)>,
}

impl ModelBuilder {
    pub fn new(name: &str, frame_count: usize) -> Self {
        let frame_count = frame_count.max(1);
        let body = [-15.0f32, 15.0]
            .iter()
            .flat_map(|&x| [-15.0f32, 15.0].map(move |y| (x, y)))
            .flat_map(|(x, y)| [Vec3::new(x, y, 0.0), Vec3::new(x, y, 60.0)])
            .collect();
        Self {
            name: name.to_string(),
            frame_count,
            body,
            grips: [Vec3::new(0.0, 20.0, 40.0), Vec3::new(0.0, -20.0, 40.0)],
            fx: vec![FrameFx::empty(); frame_count],
            framelip: vec![0; frame_count],
            sway: vec![Vec3::ZERO; frame_count],
            actions: Vec::new(),
        }
    }

    pub fn body(mut self, vertices: Vec<Vec3>) -> Self {
        self.body = vertices;
        self
    }

    /// Grip origin for a hand: 0 = left, 1 = right.
    pub fn grip(mut self, hand: usize, origin: Vec3) -> Self {
        if let Some(g) = self.grips.get_mut(hand) {
            *g = origin;
        }
        self
    }

    pub fn action(mut self, action: Action, start: usize, end: usize) -> Self {
        self.actions.push((action, start, end));
        self
    }

    pub fn fx(mut self, frame: usize, fx: FrameFx) -> Self {
        if let Some(f) = self.fx.get_mut(frame) {
            *f |= fx;
        }
        self
    }

    pub fn framelip(mut self, frame: usize, lip: u8) -> Self {
        if let Some(f) = self.framelip.get_mut(frame) {
            *f = lip;
        }
        self
    }

    /// Offset applied to both grips in one frame.
    pub fn sway(mut self, frame: usize, offset: Vec3) -> Self {
        if let Some(s) = self.sway.get_mut(frame) {
            *s = offset;
        }
        self
    }

    pub fn build(self) -> Model {
        let last = self.frame_count - 1;
        let frames = (0..self.frame_count)
            .map(|f| {
                let mut vertices = self.body.clone();
                // right grip block sits before the left one
                for origin in [self.grips[1], self.grips[0]] {
                    let o = origin + self.sway[f];
                    vertices.extend([o + Vec3::X, o + Vec3::Y, o + Vec3::Z, o]);
                }
                let bbox = OctBb::from_points(&vertices);
                ModelFrame {
                    vertices,
                    fx: self.fx[f],
                    framelip: self.framelip[f],
                    bbox,
                }
            })
            .collect::<Vec<_>>();

        let mut ranges = [None; ACTION_COUNT];
        for (action, start, end) in self.actions {
            let start = start.min(last);
            ranges[action.index()] = Some(ActionRange {
                start,
                end: end.clamp(start, last),
            });
        }
        if ranges[Action::DA.index()].is_none() {
            ranges[Action::DA.index()] = Some(ActionRange { start: 0, end: last });
        }

        Model {
            name: self.name,
            vertex_count: self.body.len() + 8,
            frames,
            ranges,
        }
    }
}
