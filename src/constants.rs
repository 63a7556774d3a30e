//! Structural constants for the egoboo simulation core.
//!
//! Tunable coefficients (gravity, friction, dampening) live in
//! [`crate::config::PhysicsConfig`]. The values here define grid geometry,
//! timers and table sizes and never change at runtime.

// =====================================================
// Mesh
// =====================================================

/// Width of one square tile in world units
pub const GRID_SIZE: f32 = 128.0;

/// Tiles per side of a collision block
pub const BLOCK_TILES: i32 = 4;

/// Width of one collision block in world units
pub const BLOCK_SIZE: f32 = GRID_SIZE * BLOCK_TILES as f32;

/// The first four vertices of every tile chain are its corners
pub const CORNER_COUNT: usize = 4;

/// Height rise (per tile) represented by one twist step
pub const TWIST_STEP: f32 = 16.0;

/// Twist value of a level tile: both slope indices centered at 7
pub const TWIST_FLAT: u8 = 0x77;

/// Number of distinct twist values
pub const TWIST_COUNT: usize = 256;

/// Jitter used by the pressure gradient search, as a fraction of a tile
pub const DIFF_JITTER: f32 = GRID_SIZE * 0.5;

/// Largest push-out step per tick, before scaling by pressure
pub const WALL_STEP_MAX: f32 = GRID_SIZE * 0.1;

// =====================================================
// Bounding volumes
// =====================================================

/// Axes of an octagonal vector: X, Y, Z, X+Y, Y-X
pub const OCT_COUNT: usize = 5;

/// Upper bound on corner points emitted by an octagonal box
pub const OCT_POINT_MAX: usize = 16;

// =====================================================
// Character motion
// =====================================================

/// Distance above the floor over which a character blends from grounded to airborne
pub const PLATTOLERANCE: f32 = 50.0;

/// Vertical speed below which a floor impact settles instead of bouncing
pub const STOPBOUNCING: f32 = 0.1;

/// Fraction of PLATTOLERANCE under which a character counts as grounded
pub const GROUNDED_ZLERP: f32 = 0.25;

/// Traction available while fully airborne
pub const AIR_TRACTION: f32 = 0.25;

/// Vertical pull toward the hover height for flying characters
pub const FLYDAMPEN: f32 = 0.001;

/// Upward impulse when jumping off a mount
pub const DISMOUNTZVEL: f32 = 16.0;

/// Upward impulse when a flying character jumps off a mount
pub const DISMOUNTZVELFLY: f32 = 4.0;

/// Jump impulse used while standing in water
pub const WATERJUMP: f32 = 12.0;

/// Upward impulse given to a dropped item
pub const DROPZVEL: f32 = 7.0;

/// Horizontal impulse given to items scattered on death
pub const DROPXYVEL: f32 = 12.0;

/// Ticks between jumps
pub const JUMPDELAY: u16 = 20;

/// `jump_number` value meaning unlimited jumps
pub const JUMPINFINITE: u8 = 255;

/// Ticks a detached character ignores collisions with its former holder
pub const PHYS_DISMOUNT_TIME: u16 = 50;

/// Ticks between grab/drop attempts
pub const GRABDELAY: u16 = 25;

/// Ticks between pack operations
pub const PACKDELAY: u16 = 25;

/// Reach for picking up items, added to the holder's bump size
pub const GRABSIZE: f32 = 90.0;

/// Weight marking an immovable character, exempt from wall collisions
pub const INFINITE_WEIGHT: u32 = u32::MAX;

/// Latch input magnitude below which a character stands still
pub const LATCH_DEADZONE: f32 = 0.05;

/// Velocity-facing blend divisor (higher turns slower)
pub const TURN_DIVISOR: i32 = 8;

/// Bored timer is reset to a random value in this range
pub const BORETIME_MIN: u16 = 255;
pub const BORETIME_MAX: u16 = 511;

/// Extra friction for objects that cannot walk (items, corpses)
pub const INERT_FRICTION: f32 = 0.5;

/// Share of its forward speed a living character's footing holds on to
pub const FLOOR_FORWARD_DAMPEN: f32 = 0.5;

/// Slip limit as a multiple of available traction
pub const SLIP_LIMIT: f32 = 1.0;

// =====================================================
// Animation
// =====================================================

/// Sub-frame steps per model frame
pub const LIP_PER_FRAME: u8 = 4;

/// Fraction of a frame advanced per lip
pub const FLIP_PER_LIP: f32 = 0.25;

/// Facing value meaning "no tilt" on the map axes
pub const MAP_TURN_OFFSET: u16 = 0x8000;

/// Angular units per full turn
pub const TURN_UNITS: f32 = 65536.0;

// =====================================================
// Attachment
// =====================================================

/// Vertices per grip point
pub const GRIP_VERTS: usize = 4;

/// Grip offset (from the end of the vertex list) of the left hand
pub const GRIP_LEFT: usize = GRIP_VERTS;

/// Grip offset (from the end of the vertex list) of the right hand
pub const GRIP_RIGHT: usize = GRIP_VERTS * 2;

/// Mounts carry riders on their single grip
pub const GRIP_ONLY: usize = GRIP_LEFT;

/// Longest holder chain walked by cycle checks and matrix recursion
pub const MAX_ATTACH_DEPTH: usize = 8;

/// Items a character may carry in its pack
pub const MAXNUMINPACK: usize = 6;

/// Equipment slots tracked per character
pub const MAX_EQUIP: usize = 4;

// =====================================================
// Breadcrumbs
// =====================================================

/// Recent-safe positions remembered per character
pub const BREADCRUMB_CAPACITY: usize = 8;

// =====================================================
// Teams
// =====================================================

/// Teams are named by letter: A..Z plus the damage team
pub const TEAM_MAX: usize = 27;
