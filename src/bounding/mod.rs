//! Octagonal bounding volumes
//!
//! - [`OVec`]: a point projected onto the five octagonal axes
//! - [`OctBb`]: an octagonal prism, the collision volume of every character
//! - [`Bumper`]: the compact size/height description stored in profiles

pub mod oct_bb;
pub mod oct_vec;

pub use oct_bb::OctBb;
pub use oct_vec::{OVec, OctAxis};

use serde::{Deserialize, Serialize};

/// Collision cylinder approximated by an axis square (`size`), a diagonal
/// square (`size_big`) and a height.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bumper {
    pub size: f32,
    pub size_big: f32,
    pub height: f32,
}

impl Bumper {
    pub fn new(size: f32, size_big: f32, height: f32) -> Self {
        Self {
            size,
            size_big,
            height,
        }
    }

    /// Bumper grown or shrunk by a character's fatness.
    pub fn scaled(&self, fat: f32) -> Self {
        Self {
            size: self.size * fat,
            size_big: self.size_big * fat,
            height: self.height * fat,
        }
    }

    pub fn is_point(&self) -> bool {
        self.size <= 0.0 && self.size_big <= 0.0
    }
}
