//! Tile vertex-fan templates.
//!
//! Every template lists vertex offsets in tile units. The first four are
//! always the corners, in the order `(0,0) (1,0) (1,1) (0,1)`, so height
//! queries never need to walk past them.

/// A vertex layout for one tile.
#[derive(Debug)]
pub struct FanTemplate {
    pub name: &'static str,
    pub offsets: &'static [[f32; 2]],
}

impl FanTemplate {
    pub fn vertex_count(&self) -> usize {
        self.offsets.len()
    }
}

pub const FAN_TWO_FACED: u8 = 0;
pub const FAN_FOUR_FACED: u8 = 1;
pub const FAN_EIGHT_FACED: u8 = 2;
pub const FAN_RIDGE: u8 = 3;

/// Marks a tile textured from the large texture set. Does not change geometry.
pub const FAN_BIG: u8 = 0x20;

const FAN_INDEX_MASK: u8 = 0x1F;

pub static FAN_TEMPLATES: [FanTemplate; 4] = [
    FanTemplate {
        name: "two_faced",
        offsets: &[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
    },
    FanTemplate {
        name: "four_faced",
        offsets: &[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.5, 0.5]],
    },
    FanTemplate {
        name: "eight_faced",
        offsets: &[
            [0.0, 0.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [0.0, 1.0],
            [0.5, 0.0],
            [1.0, 0.5],
            [0.5, 1.0],
            [0.0, 0.5],
            [0.5, 0.5],
        ],
    },
    FanTemplate {
        name: "ridge",
        offsets: &[
            [0.0, 0.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [0.0, 1.0],
            [0.5, 0.0],
            [0.5, 1.0],
        ],
    },
];

/// Template for a tile's fan byte. Unknown layouts fall back to the plain quad.
pub fn template(fan: u8) -> &'static FanTemplate {
    FAN_TEMPLATES
        .get((fan & FAN_INDEX_MASK) as usize)
        .unwrap_or(&FAN_TEMPLATES[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_start_with_corners() {
        for t in &FAN_TEMPLATES {
            assert_eq!(&t.offsets[..4], &[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        }
    }

    #[test]
    fn test_big_bit_keeps_geometry() {
        assert_eq!(template(FAN_EIGHT_FACED | FAN_BIG).vertex_count(), 9);
        assert_eq!(template(0x1F).name, "two_faced");
    }
}
