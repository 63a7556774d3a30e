use anyhow::Context;
use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use std::path::PathBuf;
use std::time::Instant;

use egoboo_core::character::Team;
use egoboo_core::config::SimConfig;
use egoboo_core::instance::action::Action;
use egoboo_core::logging::LoggingPlugin;
use egoboo_core::mesh::MeshBuilder;
use egoboo_core::model::{FrameFx, ModelBuilder};
use egoboo_core::physics::latch::{Latch, LatchButtons};
use egoboo_core::profile::CharacterProfile;
use egoboo_core::simulation::{SimulationPlugin, SimulationResource};

const DEMO_TICKS: u32 = 200;

/// Headless demo: a hero walks across perlin terrain carrying a sword.
/// Pass a RON or JSON config path to override the defaults and watch it.
fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = match &config_path {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimConfig::default(),
    };
    let mesh = MeshBuilder::new(16, 16)
        .border_walls()
        .perlin_terrain(config.seed as u32, 40.0, 0.15)
        .water(-20.0)
        .build();

    let period = config.tick_period();
    let logging = LoggingPlugin {
        config: config.logging.clone(),
    };
    let mut plugin = SimulationPlugin::new(config, mesh);
    if let Some(path) = config_path {
        plugin = plugin.watching(path);
    }

    let mut app = App::new();
    app.add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_once()))
        .add_plugins(logging)
        .add_plugins(plugin);

    let sim_res = app.world().resource::<SimulationResource>().clone();
    let hero = {
        let mut sim = sim_res
            .0
            .write()
            .map_err(|_| anyhow::anyhow!("simulation lock poisoned"))?;

        let walker = ModelBuilder::new("walker", 16)
            .action(Action::DA, 0, 3)
            .action(Action::WA, 4, 7)
            .action(Action::WB, 8, 11)
            .action(Action::WC, 12, 15)
            .fx(9, FrameFx::FOOTFALL)
            .fx(13, FrameFx::FOOTFALL)
            .build();
        let sword = ModelBuilder::new("sword", 1).action(Action::DA, 0, 0).build();
        let walker = sim.add_model(walker);
        let sword = sim.add_model(sword);

        let hero = sim.add_profile(CharacterProfile {
            name: "Hero".to_string(),
            model: Some(walker),
            sound_footfall: Some(1),
            ..CharacterProfile::default()
        });
        let blade = sim.add_profile(CharacterProfile {
            model: Some(sword),
            ..CharacterProfile::item("Sword")
        });

        let hero = sim.spawn(hero, Vec3::new(512.0, 512.0, 0.0), 0, Team(1))?;
        let blade = sim.spawn(blade, Vec3::new(520.0, 512.0, 0.0), 0, Team(0))?;
        sim.tick();
        sim.attach(blade, hero, egoboo_core::constants::GRIP_LEFT)?;
        sim.set_latch(hero, Latch::new(Vec2::new(1.0, 0.3), LatchButtons::empty()));
        hero
    };

    // paced at the configured tick rate
    for tick in 0..DEMO_TICKS {
        let started = Instant::now();
        if tick == DEMO_TICKS / 2 {
            if let Ok(mut sim) = sim_res.0.write() {
                sim.set_latch(hero, Latch::new(Vec2::new(-0.5, 1.0), LatchButtons::JUMP));
            }
        }
        app.update();
        std::thread::sleep(period.saturating_sub(started.elapsed()));
    }

    let sim = sim_res
        .0
        .read()
        .map_err(|_| anyhow::anyhow!("simulation lock poisoned"))?;
    let pos = sim.chars.get(hero).map(|c| c.pos).unwrap_or_default();
    let hash: String = sim.state_hash().iter().map(|b| format!("{b:02x}")).collect();
    info!(ticks = sim.update_wld, x = pos.x, y = pos.y, z = pos.z, "demo finished");
    println!("{hash}");
    Ok(())
}
