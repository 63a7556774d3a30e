//! Simulation
//!
//! The [`Simulation`] owns the mesh, catalogues and character pool and runs
//! one fixed-rate tick at a time:
//! 1. activate characters spawned since the last tick
//! 2. step every active, unpacked character (environment, friction,
//!    voluntary motion, latch buttons, gravity, integration, animation)
//! 3. character/character bumping
//! 4. world matrices, holders before what they hold
//! 5. held and packed items follow their holders
//! 6. safe positions and breadcrumbs
//! 7. deferred removals

pub mod events;
pub mod hash;
pub mod plugin;
pub mod render_feed;
pub mod spawn;

pub use events::{SimEvent, SoundKind};
pub use plugin::{SimulationPlugin, SimulationResource};
pub use render_feed::RenderEntry;

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::character::shop::Shop;
use crate::character::{CharacterPool, ChrRef, ObjState, TeamTable};
use crate::config::SimConfig;
use crate::instance::action::Action;
use crate::logging::TickSpan;
use crate::mesh::Mesh;
use crate::model::{Model, ModelCatalog, ModelId};
use crate::physics::latch::Latch;
use crate::profile::{CharacterProfile, ProfileCatalog, ProfileId};

pub struct Simulation {
    pub config: SimConfig,
    pub mesh: Mesh,
    pub models: ModelCatalog,
    pub profiles: ProfileCatalog,
    pub chars: CharacterPool,
    pub teams: TeamTable,
    pub shops: Vec<Shop>,
    /// Ticks completed
    pub update_wld: u64,
    pub(crate) rng: Xoshiro256PlusPlus,
    pub(crate) events: Vec<SimEvent>,
}

impl Simulation {
    pub fn new(config: SimConfig, mut mesh: Mesh) -> Self {
        if config.water.enabled {
            mesh.water = config.water;
        }
        let rng = Xoshiro256PlusPlus::seed_from_u64(config.seed);
        tracing::info!(
            seed = config.seed,
            tiles_x = mesh.tiles_x(),
            tiles_y = mesh.tiles_y(),
            "simulation created"
        );
        Self {
            config,
            mesh,
            models: ModelCatalog::default(),
            profiles: ProfileCatalog::default(),
            chars: CharacterPool::default(),
            teams: TeamTable::default(),
            shops: Vec::new(),
            update_wld: 0,
            rng,
            events: Vec::new(),
        }
    }

    pub fn add_model(&mut self, model: Model) -> ModelId {
        self.models.insert(model)
    }

    pub fn add_profile(&mut self, profile: CharacterProfile) -> ProfileId {
        self.profiles.insert(profile)
    }

    /// Swap in reloaded settings. The seed and breadcrumb sizes of existing
    /// characters stay as they were.
    pub fn apply_config(&mut self, config: SimConfig) {
        if config.water.enabled {
            self.mesh.water = config.water;
        }
        self.config = SimConfig {
            seed: self.config.seed,
            ..config
        };
    }

    pub fn set_latch(&mut self, r: ChrRef, latch: Latch) {
        if let Some(chr) = self.chars.get_mut(r) {
            chr.latch = latch;
        }
    }

    pub fn set_player(&mut self, r: ChrRef, is_player: bool) {
        if let Some(chr) = self.chars.get_mut(r) {
            chr.is_player = is_player;
        }
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Model of a character, repairing a missing assignment from its profile.
    pub(crate) fn ensure_model(&mut self, r: ChrRef) -> Option<ModelId> {
        let chr = self.chars.get_mut(r)?;
        if chr.inst.model.is_none() {
            chr.inst.model = self.profiles.get(chr.profile).and_then(|p| p.model);
        }
        chr.inst.model.filter(|id| self.models.get(*id).is_some())
    }

    /// Request an action through the character's model.
    pub fn play_action(&mut self, r: ChrRef, action: Action, can_override: bool) -> bool {
        let Some(id) = self.ensure_model(r) else {
            return false;
        };
        let (Some(model), Some(chr)) = (self.models.get(id), self.chars.get_mut(r)) else {
            return false;
        };
        chr.inst.play_action(model, action, can_override)
    }

    /// Run one simulation tick.
    pub fn tick(&mut self) {
        let _span = TickSpan::enter(self.update_wld, self.chars.len());
        self.begin_tick();

        for r in self.chars.active_keys() {
            let packed = self.chars.active(r).is_some_and(|c| c.pack.is_packed);
            if !packed {
                self.step_character(r);
            }
        }

        self.bump_characters();
        self.update_all_matrices();
        self.keep_weapons_with_holders();
        self.update_safe_positions();

        self.update_wld += 1;
        self.end_tick();
    }

    pub fn run(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    fn begin_tick(&mut self) {
        self.remove_poofed();
        let activated = self.chars.activate_pending();
        if activated > 0 {
            tracing::debug!(count = activated, tick = self.update_wld, "characters activated");
        }
    }

    /// Remember where each character last stood clear of walls.
    fn update_safe_positions(&mut self) {
        let tick = self.update_wld;
        for r in self.chars.active_keys() {
            let Some(chr) = self.chars.active_mut(r) else {
                continue;
            };
            let xy = chr.pos_xy();
            chr.grid = self.mesh.grid_at(xy);
            chr.block = self.mesh.block_at(xy);
            if !self.mesh.test_wall(xy, 0.0, chr.stopped_by).is_empty() {
                continue;
            }
            chr.safe_pos = chr.pos;
            chr.safe_valid = true;
            if chr.grid != chr.safe_grid {
                chr.safe_grid = chr.grid;
                chr.crumbs.push(chr.pos, chr.grid, tick);
            }
        }
    }

    /// A poof requested during tick `t` takes effect when tick `t + 1` begins.
    fn remove_poofed(&mut self) {
        let now = self.update_wld;
        let poofed: Vec<ChrRef> = self
            .chars
            .iter_active()
            .filter(|(_, c)| c.ai.poof_time.is_some_and(|t| t <= now))
            .map(|(r, _)| r)
            .collect();
        for r in poofed {
            self.events.push(SimEvent::Poofed { chr: r });
            self.chars.request_terminate(r);
            self.terminate(r);
        }
    }

    fn end_tick(&mut self) {
        for r in self.chars.pending_termination() {
            self.terminate(r);
        }
    }

    /// Cut every link to `r`, then free its slot. Packed items go with it.
    fn terminate(&mut self, r: ChrRef) {
        let Some(chr) = self.chars.get(r) else {
            return;
        };
        if chr.state == ObjState::Terminated {
            return;
        }
        let counts_for_morale = chr.alive && !chr.is_item && chr.state == ObjState::Active;
        let team = chr.team;
        self.chars.set_state(r, ObjState::Deinitializing);

        if self.chars.get(r).is_some_and(|c| c.attached_to.is_some()) {
            let _ = self.detach_any(r);
        }
        if self.chars.get(r).is_some_and(|c| c.pack.is_packed) {
            self.pack_unlink(r);
        }
        let held: Vec<ChrRef> = self
            .chars
            .get(r)
            .map(|c| c.held_items().collect())
            .unwrap_or_default();
        for item in held {
            let _ = self.detach_any(item);
        }
        for item in self.pack_items(r) {
            self.pack_unlink(item);
            self.chars.request_terminate(item);
            self.terminate(item);
        }

        if counts_for_morale {
            self.teams.remove_morale(team);
        }
        if self.teams.leader(team) == Some(r) {
            self.teams.set_leader(team, None);
        }

        self.chars.set_state(r, ObjState::Destructing);
        self.chars.set_state(r, ObjState::Terminated);
        if let Some(chr) = self.chars.remove(r) {
            tracing::debug!(name = %chr.name, tick = self.update_wld, "character removed");
        }
    }
}
