//! Per-character animation instance
//!
//! - Current action and its keep/loop/ready state
//! - Interpolation between two frames in quarter-frame "lip" steps
//! - Interpolated model-space vertex list with a range cache
//! - World matrix, reflection and tint
//!
//! Simulation-level behaviour (choosing walk cycles, reacting to frame FX)
//! lives in [`locomotion`] and [`fx`].

pub mod action;
pub mod fx;
pub mod locomotion;

use bevy::math::{Mat4, Vec3};

use crate::bounding::OctBb;
use crate::constants::{FLIP_PER_LIP, LIP_PER_FRAME};
use crate::error::{CoreError, CoreResult};
use crate::matrix::{MatrixCache, ReflectionCache};
use crate::model::{FrameFx, Model, ModelId};
use action::Action;

/// Range and frames the interpolated vertex list was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VlstCache {
    pub valid: bool,
    pub frame_lst: usize,
    pub frame_nxt: usize,
    pub flip: f32,
    pub vmin: usize,
    pub vmax: usize,
}

/// What one call to [`ChrInstance::advance`] did.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnimStep {
    /// FX of each frame entered, in order
    pub fx: Vec<FrameFx>,
    pub frames_entered: u32,
    /// A non-looping action ran out and its follow-up started
    pub action_finished: bool,
}

#[derive(Debug, Clone)]
pub struct ChrInstance {
    pub model: Option<ModelId>,

    pub action: Action,
    pub action_next: Action,
    pub action_ready: bool,
    pub action_keep: bool,
    pub action_loop: bool,

    pub frame_lst: usize,
    pub frame_nxt: usize,
    /// Quarter-frame step, 0..4
    pub lip: u8,
    /// Fraction of the way from `frame_lst` to `frame_nxt`
    pub flip: f32,
    pub rate: f32,

    pub vlst: Vec<Vec3>,
    pub vlst_cache: VlstCache,

    pub matrix: Mat4,
    pub matrix_cache: MatrixCache,
    pub reflection: ReflectionCache,

    pub alpha: u8,
    pub light: u8,
    pub sheen: u8,
    pub redshift: u8,
    pub grnshift: u8,
    pub blushift: u8,
}

impl ChrInstance {
    pub fn new(model: Option<ModelId>) -> Self {
        Self {
            model,
            action: Action::DA,
            action_next: Action::DA,
            action_ready: true,
            action_keep: false,
            action_loop: false,
            frame_lst: 0,
            frame_nxt: 0,
            lip: 0,
            flip: 0.0,
            rate: 1.0,
            vlst: Vec::new(),
            vlst_cache: VlstCache::default(),
            matrix: Mat4::IDENTITY,
            matrix_cache: MatrixCache::default(),
            reflection: ReflectionCache::default(),
            alpha: 255,
            light: 255,
            sheen: 0,
            redshift: 0,
            grnshift: 0,
            blushift: 0,
        }
    }

    /// Start an action unconditionally. Returns the action actually played
    /// after the model's fallbacks.
    pub fn set_action(&mut self, model: &Model, action: Action, ready: bool) -> CoreResult<Action> {
        let resolved = model
            .resolve(action)
            .ok_or(CoreError::InvalidReference("action"))?;
        let range = model
            .action_range(resolved)
            .ok_or(CoreError::InvalidReference("action"))?;

        self.action = resolved;
        self.action_next = resolved.follow_up();
        self.action_ready = ready;
        self.action_keep = false;
        self.action_loop = false;

        self.frame_lst = self.frame_nxt;
        self.frame_nxt = range.start;
        self.lip = 0;
        self.flip = 0.0;
        Ok(resolved)
    }

    /// Request an action. Kept or looping actions refuse everything but
    /// parries and explicit overrides; a running parry yields to anything.
    pub fn play_action(&mut self, model: &Model, action: Action, can_override: bool) -> bool {
        let locked = (self.action_keep || self.action_loop) && !self.action.is_parry();
        if locked && !can_override && !action.is_parry() {
            return false;
        }
        if self.set_action(model, action, action.is_locomotion()).is_err() {
            return false;
        }
        if action.is_parry() {
            self.action_keep = true;
        }
        true
    }

    /// Jump to a frame inside the current action, keeping the lip.
    pub fn set_frame(&mut self, model: &Model, frame: usize) {
        if model
            .action_range(self.action)
            .is_some_and(|r| r.contains(frame))
        {
            self.frame_lst = self.frame_nxt;
            self.frame_nxt = frame;
        }
    }

    /// Advance by one tick at the current rate.
    pub fn advance(&mut self, model: &Model) -> AnimStep {
        let mut step = AnimStep::default();
        let mut remaining = FLIP_PER_LIP * self.rate.max(0.0);

        // a rate high enough to skip many frames in one tick is a data error
        for _ in 0..64 {
            if remaining <= 0.0 {
                break;
            }
            let to_boundary = (self.lip + 1) as f32 * FLIP_PER_LIP - self.flip;
            if remaining < to_boundary {
                self.flip += remaining;
                break;
            }
            remaining -= to_boundary;
            self.lip += 1;
            if self.lip >= LIP_PER_FRAME {
                self.lip = 0;
                self.flip = 0.0;
                self.increment_frame(model, &mut step);
            } else {
                self.flip = self.lip as f32 * FLIP_PER_LIP;
            }
        }
        step
    }

    fn increment_frame(&mut self, model: &Model, step: &mut AnimStep) {
        let Some(range) = model.action_range(self.action) else {
            return;
        };
        self.frame_lst = self.frame_nxt;

        if self.frame_nxt < range.start || self.frame_nxt >= range.end {
            if self.action_loop {
                self.frame_nxt = range.start;
            } else if self.action_keep {
                return;
            } else {
                step.action_finished = true;
                let next = self.action_next;
                let lst = self.frame_lst;
                if self.set_action(model, next, true).is_err() {
                    return;
                }
                self.frame_lst = lst;
            }
        } else {
            self.frame_nxt += 1;
        }

        step.frames_entered += 1;
        step.fx.push(model.frame_fx(self.frame_nxt));
    }

    /// Snap to the next frame so nothing blends from the previous pose.
    pub fn remove_interpolation(&mut self) {
        self.frame_lst = self.frame_nxt;
        self.lip = 0;
        self.flip = 0.0;
        self.vlst_cache.valid = false;
    }

    pub fn current_fx(&self, model: &Model) -> FrameFx {
        model.frame_fx(self.frame_nxt)
    }

    pub fn framelip(&self, model: &Model) -> u8 {
        model.frame(self.frame_nxt).map_or(0, |f| f.framelip)
    }

    /// Bounding box of the interpolated pose, in model space.
    pub fn current_bbox(&self, model: &Model) -> OctBb {
        match (model.frame(self.frame_lst), model.frame(self.frame_nxt)) {
            (Some(a), Some(b)) => OctBb::interpolate(&a.bbox, &b.bbox, self.flip).unwrap_or(b.bbox),
            (_, Some(b)) => b.bbox,
            _ => OctBb::EMPTY,
        }
    }

    /// Interpolate vertices `vmin..=vmax` into `vlst`, reusing the cache
    /// when it already covers the range for the current frames.
    pub fn update_vertices(&mut self, model: &Model, vmin: usize, vmax: usize) -> CoreResult<()> {
        let count = model.vertex_count();
        if count == 0 {
            return Ok(());
        }
        let vmax = vmax.min(count - 1);
        if vmin > vmax {
            return Ok(());
        }
        if self.vlst.len() != count {
            self.vlst = vec![Vec3::ZERO; count];
            self.vlst_cache.valid = false;
        }

        let cache = self.vlst_cache;
        let same_pose = cache.valid
            && cache.frame_lst == self.frame_lst
            && cache.frame_nxt == self.frame_nxt
            && cache.flip == self.flip;
        if same_pose && cache.vmin <= vmin && cache.vmax >= vmax {
            return Ok(());
        }

        let lst = model
            .frame(self.frame_lst)
            .ok_or(CoreError::InvalidReference("frame"))?;
        let nxt = model
            .frame(self.frame_nxt)
            .ok_or(CoreError::InvalidReference("frame"))?;
        for v in vmin..=vmax {
            self.vlst[v] = lst.vertices[v].lerp(nxt.vertices[v], self.flip);
        }

        self.vlst_cache = if same_pose {
            VlstCache {
                vmin: cache.vmin.min(vmin),
                vmax: cache.vmax.max(vmax),
                ..cache
            }
        } else {
            VlstCache {
                valid: true,
                frame_lst: self.frame_lst,
                frame_nxt: self.frame_nxt,
                flip: self.flip,
                vmin,
                vmax,
            }
        };
        Ok(())
    }
}
