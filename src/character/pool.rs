//! Character storage with generational handles.
//!
//! A [`ChrRef`] stays valid until its character is removed; afterwards every
//! lookup through it yields `None`, so dangling references degrade to "no
//! such character" instead of aliasing a newer spawn.

use slotmap::{new_key_type, SlotMap};

use super::Character;

new_key_type! {
    /// Handle to a character in the [`CharacterPool`].
    pub struct ChrRef;
}

/// Lifecycle of a pooled character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjState {
    /// Built from its profile but not yet in a pool
    Constructing,
    /// Spawned this tick; joins the simulation at the next tick boundary
    Initializing,
    Active,
    /// Termination requested; links to other characters are being cut
    Deinitializing,
    Destructing,
    Terminated,
}

#[derive(Debug, Clone, Default)]
pub struct CharacterPool {
    chars: SlotMap<ChrRef, Character>,
}

impl CharacterPool {
    pub fn insert(&mut self, mut chr: Character) -> ChrRef {
        chr.state = ObjState::Initializing;
        self.chars.insert(chr)
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn contains(&self, r: ChrRef) -> bool {
        self.chars.contains_key(r)
    }

    /// Any character still in the pool, whatever its state.
    pub fn get(&self, r: ChrRef) -> Option<&Character> {
        self.chars.get(r)
    }

    pub fn get_mut(&mut self, r: ChrRef) -> Option<&mut Character> {
        self.chars.get_mut(r)
    }

    pub fn active(&self, r: ChrRef) -> Option<&Character> {
        self.chars.get(r).filter(|c| c.state == ObjState::Active)
    }

    pub fn active_mut(&mut self, r: ChrRef) -> Option<&mut Character> {
        self.chars
            .get_mut(r)
            .filter(|c| c.state == ObjState::Active)
    }

    /// Two distinct characters at once.
    pub fn pair_mut(&mut self, a: ChrRef, b: ChrRef) -> Option<[&mut Character; 2]> {
        self.chars.get_disjoint_mut([a, b])
    }

    pub fn keys(&self) -> Vec<ChrRef> {
        self.chars.keys().collect()
    }

    pub fn active_keys(&self) -> Vec<ChrRef> {
        self.chars
            .iter()
            .filter(|(_, c)| c.state == ObjState::Active)
            .map(|(k, _)| k)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChrRef, &Character)> {
        self.chars.iter()
    }

    pub fn iter_active(&self) -> impl Iterator<Item = (ChrRef, &Character)> {
        self.chars
            .iter()
            .filter(|(_, c)| c.state == ObjState::Active)
    }

    /// Promote everything spawned since the last boundary. Returns how many.
    pub fn activate_pending(&mut self) -> usize {
        let mut count = 0;
        for (_, chr) in self.chars.iter_mut() {
            if chr.state == ObjState::Initializing {
                chr.state = ObjState::Active;
                count += 1;
            }
        }
        count
    }

    /// Flag a character for removal at the end of the tick.
    pub fn request_terminate(&mut self, r: ChrRef) {
        if let Some(chr) = self.chars.get_mut(r) {
            chr.terminate_requested = true;
        }
    }

    pub fn pending_termination(&self) -> Vec<ChrRef> {
        self.chars
            .iter()
            .filter(|(_, c)| c.terminate_requested)
            .map(|(k, _)| k)
            .collect()
    }

    pub fn set_state(&mut self, r: ChrRef, state: ObjState) {
        if let Some(chr) = self.chars.get_mut(r) {
            chr.state = state;
        }
    }

    pub fn remove(&mut self, r: ChrRef) -> Option<Character> {
        self.chars.remove(r)
    }
}
