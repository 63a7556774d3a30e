use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Per-tile effect bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct TileFlags: u32 {
        /// Tile is drawn with an environment map
        const SHINY     = 0x01;
        /// Reflections are not drawn on this tile
        const NOREFLECT = 0x02;
        /// Texture cycles through animation frames
        const ANIM      = 0x04;
        /// Tile is covered by the water surface
        const WATER     = 0x08;
        /// Blocks characters and particles
        const WALL      = 0x10;
        /// Blocks characters only
        const IMPASS    = 0x20;
        /// Hurts characters standing on it
        const DAMAGE    = 0x40;
        /// Removes floor friction
        const SLIPPY    = 0x80;
    }
}

impl TileFlags {
    /// What characters are stopped by unless their profile says otherwise
    pub const BLOCKING: TileFlags = TileFlags::WALL.union(TileFlags::IMPASS);
}
