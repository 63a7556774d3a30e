//! Animation action codes.
//!
//! Actions are two-letter codes: the first letter names the kind of motion,
//! the second a variant (A..D, or A..N for the M group). Models map every
//! code to a frame range, falling back to a related code when a model lacks
//! the exact animation.

use serde::{Deserialize, Serialize};

macro_rules! actions {
    ($($name:ident),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[repr(u8)]
        pub enum Action {
            $($name),*
        }

        impl Action {
            pub const ALL: &'static [Action] = &[$(Action::$name),*];

            pub fn name(self) -> &'static str {
                match self {
                    $(Action::$name => stringify!($name)),*
                }
            }
        }
    };
}

actions!(
    // idle
    DA, DB, DC, DD,
    // unarmed / armed attacks
    UA, UB, UC, UD, TA, TB, TC, TD, CA, CB, CC, CD, SA, SB, SC, SD,
    BA, BB, BC, BD, LA, LB, LC, LD, XA, XB, XC, XD, FA, FB, FC, FD,
    // parry
    PA, PB, PC, PD,
    // evade
    EA, EB,
    // roll
    RA,
    // zap
    ZA, ZB, ZC, ZD,
    // walk: sneak, walk, run, ...
    WA, WB, WC, WD,
    // jump
    JA, JB, JC,
    // hurt
    HA, HB, HC, HD,
    // killed
    KA, KB, KC, KD,
    // misc: drop, cheer, grab, kick, sit, ride, use, stomp, held
    MA, MB, MC, MD, ME, MF, MG, MH, MI, MJ, MK, ML, MM, MN,
);

pub const ACTION_COUNT: usize = 76;

impl Action {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Action> {
        Self::ALL.get(index).copied()
    }

    /// Motion kind, the first letter of the code.
    pub fn letter(self) -> char {
        self.name().as_bytes()[0] as char
    }

    /// Variant number within the kind: A = 0, B = 1, ...
    pub fn variant(self) -> usize {
        (self.name().as_bytes()[1] - b'A') as usize
    }

    pub fn is_type(self, letter: char) -> bool {
        self.letter() == letter
    }

    pub fn is_parry(self) -> bool {
        self.is_type('P')
    }

    pub fn is_walk(self) -> bool {
        self.is_type('W')
    }

    /// Actions picked automatically from movement speed.
    pub fn is_locomotion(self) -> bool {
        matches!(self, Action::DA | Action::WA | Action::WB | Action::WC | Action::WD)
    }

    pub fn is_attack(self) -> bool {
        matches!(
            self.letter(),
            'U' | 'T' | 'C' | 'S' | 'B' | 'L' | 'X' | 'F' | 'Z'
        )
    }

    /// Same kind, different variant, if the kind has that many variants.
    pub fn with_variant(self, variant: usize) -> Option<Action> {
        let base = self.index() - self.variant();
        let candidate = Action::from_index(base + variant)?;
        (candidate.letter() == self.letter()).then_some(candidate)
    }

    /// What plays once this action finishes without looping.
    pub fn follow_up(self) -> Action {
        if self.is_locomotion() {
            self
        } else {
            Action::DA
        }
    }
}

/// Hand-specific actions indexed by slot: left, right.
pub const ACTION_DROP: [Action; 2] = [Action::MA, Action::MB];
pub const ACTION_GRAB: [Action; 2] = [Action::ME, Action::MF];
pub const ACTION_HELD: [Action; 2] = [Action::MM, Action::MN];
pub const ACTION_SIT: Action = Action::MH;
pub const ACTION_RIDE: Action = Action::MI;
pub const ACTION_USE: Action = Action::MJ;
