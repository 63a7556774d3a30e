//! Character profiles
//!
//! - [`Idsz`]: four-letter identifiers used for types, parents and hatred
//! - [`CharacterProfile`]: static template a character is spawned from
//! - [`ProfileCatalog`]: profiles by id, loadable from RON

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::bounding::Bumper;
use crate::character::kill::XP_COUNT;
use crate::instance::action::Action;
use crate::mesh::TileFlags;
use crate::model::ModelId;

/// Four uppercase letters packed into a u32, e.g. `[SWOR]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Idsz(pub u32);

impl Idsz {
    pub const NONE: Idsz = Idsz(0);

    pub fn new(text: &str) -> Self {
        let mut value = 0u32;
        for b in text.bytes().take(4) {
            value = (value << 8) | b.to_ascii_uppercase() as u32;
        }
        Idsz(value)
    }

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Idsz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0.to_be_bytes();
        let text: String = bytes
            .iter()
            .filter(|b| **b != 0)
            .map(|b| *b as char)
            .collect();
        write!(f, "[{text}]")
    }
}

impl TryFrom<String> for Idsz {
    type Error = String;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        let trimmed = text.trim_matches(|c| c == '[' || c == ']');
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("NONE") {
            return Ok(Idsz::NONE);
        }
        if trimmed.len() != 4 || !trimmed.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(format!("idsz must be four letters, got {text:?}"));
        }
        Ok(Idsz::new(trimmed))
    }
}

impl From<Idsz> for String {
    fn from(idsz: Idsz) -> String {
        if idsz.is_none() {
            return "NONE".to_string();
        }
        idsz.to_string().trim_matches(|c| c == '[' || c == ']').to_string()
    }
}

/// Index into the [`ProfileCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileId(pub u16);

/// Static template for spawning characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterProfile {
    pub name: String,
    pub model: Option<ModelId>,
    pub idsz_parent: Idsz,
    pub idsz_type: Idsz,
    pub idsz_hate: Idsz,

    // body
    pub bumper: Bumper,
    pub bump_dampen: f32,
    pub weight: u32,
    pub fat: f32,
    pub stopped_by: TileFlags,
    pub fly_height: f32,

    // life
    pub life: f32,
    pub mana: f32,
    pub money: u16,

    // motion
    pub jump_power: f32,
    pub jump_number: u8,
    pub sneak_speed: f32,
    pub walk_speed: f32,
    pub run_speed: f32,
    pub max_accel: f32,

    // kind
    pub is_item: bool,
    pub is_mount: bool,
    pub is_platform: bool,
    pub can_use_platforms: bool,
    pub is_stackable: bool,
    pub is_equipment: bool,
    pub is_kursed: bool,
    pub waterwalk: bool,
    pub sticky_butt: bool,
    pub rider_can_attack: bool,
    pub can_be_dazed: bool,
    pub can_be_grogged: bool,
    pub drop_pack_on_death: bool,

    /// Left, right
    pub slot_valid: [bool; 2],
    pub ammo: u16,
    pub ammo_max: u16,

    // weapon use
    pub weapon_action: Action,
    pub attack_delay: u16,
    pub mana_cost: f32,

    // experience
    pub experience_worth: f32,
    pub experience_exchange: f32,
    pub experience_rate: [f32; XP_COUNT],

    pub price: u16,
    pub sound_footfall: Option<u16>,
    pub sound_jump: Option<u16>,

    // render
    pub alpha: u8,
    pub light: u8,
    pub sheen: u8,
}

impl Default for CharacterProfile {
    fn default() -> Self {
        Self {
            name: "Unnamed".to_string(),
            model: None,
            idsz_parent: Idsz::NONE,
            idsz_type: Idsz::NONE,
            idsz_hate: Idsz::NONE,
            bumper: Bumper::new(25.0, 35.0, 60.0),
            bump_dampen: 0.5,
            weight: 100,
            fat: 1.0,
            stopped_by: TileFlags::BLOCKING,
            fly_height: 0.0,
            life: 10.0,
            mana: 0.0,
            money: 0,
            jump_power: 10.0,
            jump_number: 1,
            sneak_speed: 2.0,
            walk_speed: 4.0,
            run_speed: 8.0,
            max_accel: 1.5,
            is_item: false,
            is_mount: false,
            is_platform: false,
            can_use_platforms: true,
            is_stackable: false,
            is_equipment: false,
            is_kursed: false,
            waterwalk: false,
            sticky_butt: false,
            rider_can_attack: true,
            can_be_dazed: true,
            can_be_grogged: true,
            drop_pack_on_death: false,
            slot_valid: [true, true],
            ammo: 0,
            ammo_max: 0,
            weapon_action: Action::UA,
            attack_delay: 20,
            mana_cost: 0.0,
            experience_worth: 10.0,
            experience_exchange: 0.1,
            experience_rate: [1.0; XP_COUNT],
            price: 0,
            sound_footfall: None,
            sound_jump: None,
            alpha: 255,
            light: 255,
            sheen: 0,
        }
    }
}

impl CharacterProfile {
    /// Small carryable object with no hands of its own.
    pub fn item(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_item: true,
            bumper: Bumper::new(10.0, 14.0, 20.0),
            weight: 10,
            slot_valid: [false, false],
            can_use_platforms: false,
            ..Self::default()
        }
    }

    pub fn has_idsz(&self, idsz: Idsz) -> bool {
        !idsz.is_none() && (self.idsz_type == idsz || self.idsz_parent == idsz)
    }
}

/// Profiles by [`ProfileId`].
#[derive(Debug, Clone, Default)]
pub struct ProfileCatalog {
    profiles: Vec<CharacterProfile>,
}

impl ProfileCatalog {
    pub fn insert(&mut self, profile: CharacterProfile) -> ProfileId {
        self.profiles.push(profile);
        ProfileId((self.profiles.len() - 1) as u16)
    }

    pub fn get(&self, id: ProfileId) -> Option<&CharacterProfile> {
        self.profiles.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Parse a RON list of profiles, appending them in order.
    pub fn load_ron(&mut self, text: &str) -> Result<Vec<ProfileId>, ron::error::SpannedError> {
        let list: Vec<CharacterProfile> = ron::from_str(text)?;
        Ok(list.into_iter().map(|p| self.insert(p)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idsz_text() {
        let idsz = Idsz::new("swor");
        assert_eq!(idsz.to_string(), "[SWOR]");
        assert_eq!(Idsz::try_from("[SWOR]".to_string()), Ok(idsz));
        assert!(Idsz::try_from("TOOLONG".to_string()).is_err());
        assert_eq!(String::from(Idsz::NONE), "NONE");
    }

    #[test]
    fn test_load_ron_with_defaults() {
        let mut catalog = ProfileCatalog::default();
        let ids = catalog
            .load_ron(
                r#"[
                    (name: "Sword", is_item: true, idsz_type: "SWOR", stopped_by: "WALL"),
                    (name: "Grub", run_speed: 12.0),
                ]"#,
            )
            .unwrap();
        assert_eq!(ids.len(), 2);
        let sword = catalog.get(ids[0]).unwrap();
        assert!(sword.is_item);
        assert!(sword.has_idsz(Idsz::new("SWOR")));
        assert_eq!(sword.stopped_by, TileFlags::WALL);
        let grub = catalog.get(ids[1]).unwrap();
        assert!((grub.run_speed - 12.0).abs() < f32::EPSILON);
        assert!((grub.walk_speed - 4.0).abs() < f32::EPSILON);
    }
}
