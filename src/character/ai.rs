use bitflags::bitflags;

use super::ChrRef;

bitflags! {
    /// Events raised on a character for its controller to react to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AlertFlags: u32 {
        const SPAWNED        = 1 << 0;
        const ATTACKED       = 1 << 1;
        const BUMPED         = 1 << 2;
        const GRABBED        = 1 << 3;
        const DROPPED        = 1 << 4;
        const KILLED         = 1 << 5;
        const TARGETKILLED   = 1 << 6;
        const LEADERKILLED   = 1 << 7;
        const HITGROUND      = 1 << 8;
        const INWATER        = 1 << 9;
        const CLEANEDUP      = 1 << 10;
        const BORED          = 1 << 11;
        const CALLEDFORHELP  = 1 << 12;
        const CHANGED        = 1 << 13;
        const BLOCKED        = 1 << 14;
        const HEALED         = 1 << 15;
        const TOOMUCHBAGGAGE = 1 << 16;
        const PUTAWAY        = 1 << 17;
        const NOTPUTAWAY     = 1 << 18;
        const TAKENOUT       = 1 << 19;
        const NOTTAKENOUT    = 1 << 20;
        const USED           = 1 << 21;
        const THROWN         = 1 << 22;
        const ORDERED        = 1 << 23;
        const NOTDROPPED     = 1 << 24;
    }
}

/// Controller-facing state. Scripts live outside the core; they read the
/// alerts and set latches.
#[derive(Debug, Clone, Default)]
pub struct AiState {
    pub alert: AlertFlags,
    pub target: Option<ChrRef>,
    /// Last character that bumped into this one
    pub bumplast: Option<ChrRef>,
    /// Last character that attacked this one
    pub attacklast: Option<ChrRef>,
    pub lastitemused: Option<ChrRef>,
    /// Tick at which a poofing character is removed
    pub poof_time: Option<u64>,
}

impl AiState {
    pub fn raise(&mut self, alert: AlertFlags) {
        self.alert |= alert;
    }

    pub fn has(&self, alert: AlertFlags) -> bool {
        self.alert.contains(alert)
    }

    /// Hand the accumulated alerts to the controller and clear them.
    pub fn take_alerts(&mut self) -> AlertFlags {
        std::mem::take(&mut self.alert)
    }
}
