//! Egoboo Core - Mesh and Character Simulation Library
//!
//! Deterministic game logic for the Egoboo dungeon crawler:
//! - Octagonal bounding volumes (axes X, Y, Z, X+Y, Y-X)
//! - Tile mesh with heights, flags, twist, walls and water
//! - Animated models and per-character animation instances
//! - Character physics step (environment, friction, jumping, gravity, walls)
//! - Character/character bumping, platforms and mounting
//! - Attachment: held items, riders, packs, shops and death
//! - World matrices for characters and held items, with reflections
//! - Bevy plugin hosting a simulation at one tick per update

pub mod attachment;
pub mod bounding;
pub mod breadcrumb;
pub mod character;
pub mod config;
pub mod constants;
pub mod error;
pub mod instance;
pub mod logging;
pub mod matrix;
pub mod mesh;
pub mod model;
pub mod physics;
pub mod profile;
pub mod simulation;

pub use error::{CoreError, CoreResult};
pub use simulation::Simulation;
