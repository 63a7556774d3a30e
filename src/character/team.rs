//! Teams, hatred and leaders.

use serde::{Deserialize, Serialize};

use super::ChrRef;
use crate::constants::TEAM_MAX;

/// Team by letter index: `A` = 0 .. `Z` = 25, plus the damage team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Team(pub u8);

impl Team {
    pub const EVIL: Team = Team(b'E' - b'A');
    pub const GOOD: Team = Team(b'G' - b'A');
    /// Hates nobody, hated by nobody
    pub const NULL: Team = Team(b'N' - b'A');
    /// Owner of environmental damage
    pub const DAMAGE: Team = Team(26);

    pub fn from_letter(letter: char) -> Team {
        let upper = letter.to_ascii_uppercase();
        if upper.is_ascii_uppercase() {
            Team(upper as u8 - b'A')
        } else {
            Team::NULL
        }
    }

    pub fn index(self) -> usize {
        (self.0 as usize).min(TEAM_MAX - 1)
    }
}

impl Default for Team {
    fn default() -> Self {
        Team::NULL
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TeamInfo {
    pub hates: [bool; TEAM_MAX],
    pub leader: Option<ChrRef>,
    /// Living members
    pub morale: u32,
}

#[derive(Debug, Clone)]
pub struct TeamTable {
    teams: [TeamInfo; TEAM_MAX],
}

impl Default for TeamTable {
    fn default() -> Self {
        let mut teams = [TeamInfo {
            hates: [false; TEAM_MAX],
            leader: None,
            morale: 0,
        }; TEAM_MAX];
        for (i, info) in teams.iter_mut().enumerate() {
            for (j, hate) in info.hates.iter_mut().enumerate() {
                *hate = i != j && i != Team::NULL.index() && j != Team::NULL.index();
            }
        }
        Self { teams }
    }
}

impl TeamTable {
    pub fn hates(&self, team: Team, other: Team) -> bool {
        self.teams[team.index()].hates[other.index()]
    }

    pub fn set_hates(&mut self, team: Team, other: Team, hates: bool) {
        self.teams[team.index()].hates[other.index()] = hates;
    }

    pub fn leader(&self, team: Team) -> Option<ChrRef> {
        self.teams[team.index()].leader
    }

    pub fn set_leader(&mut self, team: Team, leader: Option<ChrRef>) {
        self.teams[team.index()].leader = leader;
    }

    pub fn morale(&self, team: Team) -> u32 {
        self.teams[team.index()].morale
    }

    pub fn add_morale(&mut self, team: Team) {
        self.teams[team.index()].morale += 1;
    }

    pub fn remove_morale(&mut self, team: Team) {
        let m = &mut self.teams[team.index()].morale;
        *m = m.saturating_sub(1);
    }
}
