use crate::character::{ChrRef, Slot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundKind {
    Footfall,
    Jump,
}

/// Side effects for the host: audio, floating text, weapon swings and
/// script ticks. Drained once per frame with [`super::Simulation::drain_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    Sound {
        chr: ChrRef,
        sound: u16,
        kind: SoundKind,
    },
    /// Floating text above a character
    Billboard { chr: ChrRef, text: String },
    /// A hand's attack frame was reached
    Swipe { chr: ChrRef, slot: Slot },
    /// Run the character's script once more (last breath of a dying character)
    Think { chr: ChrRef },
    /// Removed by a POOF frame
    Poofed { chr: ChrRef },
}

impl SimEvent {
    pub fn chr(&self) -> ChrRef {
        match self {
            SimEvent::Sound { chr, .. }
            | SimEvent::Billboard { chr, .. }
            | SimEvent::Swipe { chr, .. }
            | SimEvent::Think { chr }
            | SimEvent::Poofed { chr } => *chr,
        }
    }
}
