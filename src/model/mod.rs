//! Animated models
//!
//! - Per-frame vertex lists, FX bits, foot-sync lip and bounding box
//! - Action table mapping every [`Action`] to a frame range, with fallbacks
//! - Grip vertices at the end of the vertex list for held items and riders

pub mod builder;

pub use builder::ModelBuilder;

use bevy::math::Vec3;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::bounding::OctBb;
use crate::constants::GRIP_VERTS;
use crate::instance::action::{Action, ACTION_COUNT};

bitflags! {
    /// Events attached to a model frame, fired when the frame is entered.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct FrameFx: u32 {
        /// Character is invulnerable during this frame
        const INVICTUS  = 1 << 0;
        /// Left hand attacks
        const ACTLEFT   = 1 << 1;
        const ACTRIGHT  = 1 << 2;
        /// Left hand picks up an item
        const GRABLEFT  = 1 << 3;
        const GRABRIGHT = 1 << 4;
        /// Left hand grabs a character
        const CHARLEFT  = 1 << 5;
        const CHARRIGHT = 1 << 6;
        /// Left hand lets go
        const DROPLEFT  = 1 << 7;
        const DROPRIGHT = 1 << 8;
        /// Voluntary motion is suppressed
        const STOP      = 1 << 9;
        const FOOTFALL  = 1 << 10;
        /// Non-players vanish at the next tick
        const POOF      = 1 << 11;
    }
}

/// Index into the [`ModelCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelId(pub u16);

/// Inclusive frame range of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionRange {
    pub start: usize,
    pub end: usize,
}

impl ActionRange {
    pub fn contains(&self, frame: usize) -> bool {
        (self.start..=self.end).contains(&frame)
    }
}

#[derive(Debug, Clone)]
pub struct ModelFrame {
    pub vertices: Vec<Vec3>,
    pub fx: FrameFx,
    /// Foot position used to keep walk cycles in step, 0..16
    pub framelip: u8,
    pub bbox: OctBb,
}

#[derive(Debug, Clone)]
pub struct Model {
    pub name: String,
    vertex_count: usize,
    frames: Vec<ModelFrame>,
    ranges: [Option<ActionRange>; ACTION_COUNT],
}

/// Related action to try when a model lacks `action`.
fn fallback(action: Action) -> Option<Action> {
    match action {
        Action::DA => None,
        Action::WA => Some(Action::DA),
        Action::WB => Some(Action::WA),
        Action::WC => Some(Action::WB),
        Action::WD => Some(Action::WC),
        _ if action.variant() > 0 => action.with_variant(0),
        _ => Some(Action::DA),
    }
}

impl Model {
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frame(&self, index: usize) -> Option<&ModelFrame> {
        self.frames.get(index)
    }

    pub fn has_action(&self, action: Action) -> bool {
        self.ranges[action.index()].is_some()
    }

    /// The action actually played for a request, following fallbacks.
    pub fn resolve(&self, action: Action) -> Option<Action> {
        let mut current = Some(action);
        while let Some(a) = current {
            if self.has_action(a) {
                return Some(a);
            }
            current = fallback(a);
        }
        None
    }

    pub fn action_range(&self, action: Action) -> Option<ActionRange> {
        self.resolve(action)
            .and_then(|a| self.ranges[a.index()])
    }

    pub fn frame_fx(&self, frame: usize) -> FrameFx {
        self.frames.get(frame).map_or(FrameFx::empty(), |f| f.fx)
    }

    /// Vertex indices of a grip, counted back from the end of the vertex list.
    pub fn grip_vertices(&self, grip_offset: usize) -> Option<[usize; GRIP_VERTS]> {
        if grip_offset < GRIP_VERTS || grip_offset > self.vertex_count {
            return None;
        }
        let start = self.vertex_count - grip_offset;
        Some(std::array::from_fn(|i| start + i))
    }

    /// Frame of a walk action whose foot position matches `framelip`.
    pub fn lip_to_walk_frame(&self, action: Action, framelip: u8) -> Option<usize> {
        let range = self.action_range(action)?;
        (range.start..=range.end)
            .find(|&f| self.frames[f].framelip >= framelip)
            .or(Some(range.start))
    }
}

/// All loaded models, indexed by [`ModelId`].
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: Vec<Model>,
}

impl ModelCatalog {
    pub fn insert(&mut self, model: Model) -> ModelId {
        self.models.push(model);
        ModelId((self.models.len() - 1) as u16)
    }

    pub fn get(&self, id: ModelId) -> Option<&Model> {
        self.models.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
