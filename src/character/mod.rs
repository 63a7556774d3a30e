//! Character entity
//!
//! - [`Character`]: kinematics, bounds, timers, attachment links, pack chain
//! - [`pool`]: generational storage and lifecycle states
//! - [`attach`], [`inventory`], [`kill`], [`shop`]: operations that touch
//!   several characters at once, implemented on the simulation
//! - [`ai`], [`team`]: alerts and allegiance

pub mod ai;
pub mod attach;
pub mod inventory;
pub mod kill;
pub mod pool;
pub mod shop;
pub mod team;

pub use ai::{AiState, AlertFlags};
pub use pool::{CharacterPool, ChrRef, ObjState};
pub use team::{Team, TeamTable};

use bevy::math::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::bounding::{Bumper, OctBb};
use crate::breadcrumb::BreadcrumbRing;
use crate::constants::{BORETIME_MIN, GRIP_LEFT, GRIP_RIGHT, MAP_TURN_OFFSET, MAX_EQUIP};
use crate::instance::ChrInstance;
use crate::mesh::TileFlags;
use crate::physics::environment::Environment;
use crate::physics::latch::Latch;
use crate::profile::{CharacterProfile, ProfileId};

/// A hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    Left = 0,
    Right = 1,
}

impl Slot {
    pub const BOTH: [Slot; 2] = [Slot::Left, Slot::Right];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Grip vertices of this hand, counted back from the end of the model.
    pub fn grip_offset(self) -> usize {
        match self {
            Slot::Left => GRIP_LEFT,
            Slot::Right => GRIP_RIGHT,
        }
    }

    pub fn from_grip_offset(offset: usize) -> Option<Slot> {
        match offset {
            GRIP_LEFT => Some(Slot::Left),
            GRIP_RIGHT => Some(Slot::Right),
            _ => None,
        }
    }
}

/// Facing plus tilt on the two map axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Orientation {
    pub facing_z: u16,
    pub map_x: u16,
    pub map_y: u16,
}

impl Orientation {
    pub fn level(facing_z: u16) -> Self {
        Self {
            facing_z,
            map_x: MAP_TURN_OFFSET,
            map_y: MAP_TURN_OFFSET,
        }
    }
}

/// Links of the inventory chain.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pack {
    /// Next item in the chain; on the owner this is the first item
    pub next: Option<ChrRef>,
    /// Items in the chain (owner only)
    pub count: usize,
    /// Owner of the chain this character is stored in
    pub container: Option<ChrRef>,
    /// This character is stored in someone's pack
    pub is_packed: bool,
    pub was_packed: bool,
}

/// Countdown timers, decremented once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Timers {
    pub jump: u16,
    pub reload: u16,
    pub careful: u16,
    pub damage: u16,
    pub dismount: u16,
    pub daze: u16,
    pub grog: u16,
    pub bore: u16,
}

#[derive(Debug, Clone)]
pub struct Character {
    pub profile: ProfileId,
    pub name: String,
    pub state: ObjState,
    pub terminate_requested: bool,
    pub is_player: bool,

    pub alive: bool,
    pub life: f32,
    pub life_max: f32,
    pub mana: f32,
    pub money: u16,
    pub experience: f32,

    pub team: Team,
    pub team_base: Team,

    pub pos: Vec3,
    pub pos_old: Vec3,
    pub vel: Vec3,
    pub vel_old: Vec3,
    pub spawn_pos: Vec3,
    pub ori: Orientation,
    pub fat: f32,

    /// Wall collision bumper, the profile's scaled by fatness
    pub bump: Bumper,
    /// Bumper derived from the animated pose
    pub bump_1: Bumper,
    /// Local-space collision volume
    pub chr_min_cv: OctBb,
    pub bump_dampen: f32,
    pub weight: u32,
    pub stopped_by: TileFlags,

    pub attached_to: Option<ChrRef>,
    pub in_slot: Option<Slot>,
    pub holding: [Option<ChrRef>; 2],
    pub pack: Pack,
    pub equipment: [Option<ChrRef>; MAX_EQUIP],
    pub is_equipped: bool,
    pub on_platform: Option<ChrRef>,
    /// Former holder ignored by collisions while the dismount timer runs
    pub dismount_object: Option<ChrRef>,

    pub ai: AiState,
    pub latch: Latch,
    pub inst: ChrInstance,
    pub enviro: Environment,

    pub crumbs: BreadcrumbRing,
    pub safe_pos: Vec3,
    pub safe_grid: Option<usize>,
    pub safe_valid: bool,
    pub grid: Option<usize>,
    pub block: Option<usize>,

    pub timers: Timers,
    pub jump_number: u8,
    pub jump_number_reset: u8,
    pub jump_ready: bool,
    pub hit_ready: bool,

    pub fly_height: f32,
    pub is_item: bool,
    pub is_mount: bool,
    pub is_platform: bool,
    pub can_use_platforms: bool,
    pub is_kursed: bool,
    pub waterwalk: bool,
    pub sticky_butt: bool,
    pub ammo: u16,
    pub ammo_max: u16,
    pub name_known: bool,
    /// Dropped inside a shop; belongs to the shopkeeper until bought
    pub shop_owned: bool,
}

impl Character {
    pub fn from_profile(
        profile_id: ProfileId,
        profile: &CharacterProfile,
        pos: Vec3,
        facing_z: u16,
        team: Team,
    ) -> Self {
        let fat = profile.fat.max(0.01);
        let bump = profile.bumper.scaled(fat);
        Self {
            profile: profile_id,
            name: profile.name.clone(),
            state: ObjState::Constructing,
            terminate_requested: false,
            is_player: false,
            alive: true,
            life: profile.life,
            life_max: profile.life,
            mana: profile.mana,
            money: profile.money,
            experience: 0.0,
            team,
            team_base: team,
            pos,
            pos_old: pos,
            vel: Vec3::ZERO,
            vel_old: Vec3::ZERO,
            spawn_pos: pos,
            ori: Orientation::level(facing_z),
            fat,
            bump,
            bump_1: bump,
            chr_min_cv: OctBb::from_bumper(&bump),
            bump_dampen: profile.bump_dampen,
            weight: profile.weight,
            stopped_by: profile.stopped_by,
            attached_to: None,
            in_slot: None,
            holding: [None; 2],
            pack: Pack::default(),
            equipment: [None; MAX_EQUIP],
            is_equipped: false,
            on_platform: None,
            dismount_object: None,
            ai: AiState::default(),
            latch: Latch::default(),
            inst: ChrInstance::new(profile.model),
            enviro: Environment::default(),
            crumbs: BreadcrumbRing::default(),
            safe_pos: pos,
            safe_grid: None,
            safe_valid: false,
            grid: None,
            block: None,
            timers: Timers {
                bore: BORETIME_MIN,
                ..Timers::default()
            },
            jump_number: profile.jump_number,
            jump_number_reset: profile.jump_number,
            jump_ready: true,
            hit_ready: true,
            fly_height: profile.fly_height,
            is_item: profile.is_item,
            is_mount: profile.is_mount,
            is_platform: profile.is_platform,
            can_use_platforms: profile.can_use_platforms,
            is_kursed: profile.is_kursed,
            waterwalk: profile.waterwalk,
            sticky_butt: profile.sticky_butt,
            ammo: profile.ammo,
            ammo_max: profile.ammo_max,
            name_known: !profile.is_item,
            shop_owned: false,
        }
    }

    pub fn pos_xy(&self) -> Vec2 {
        self.pos.truncate()
    }

    /// Collision volume in world space.
    pub fn world_bb(&self) -> OctBb {
        self.chr_min_cv.translate(self.pos)
    }

    pub fn holding(&self, slot: Slot) -> Option<ChrRef> {
        self.holding[slot.index()]
    }

    pub fn held_items(&self) -> impl Iterator<Item = ChrRef> + '_ {
        self.holding.iter().flatten().copied()
    }

    /// Immune to wall collisions.
    pub fn ignores_walls(&self) -> bool {
        self.weight == crate::constants::INFINITE_WEIGHT || self.bump.size <= 0.0
    }

    pub fn is_flying(&self) -> bool {
        self.fly_height > 0.0
    }
}
