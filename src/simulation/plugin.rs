use bevy::prelude::*;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use super::Simulation;
use crate::config::watch::ConfigWatcher;
use crate::config::SimConfig;
use crate::mesh::Mesh;

/// Runs a [`Simulation`] inside a bevy `App`, one tick per `Update`.
pub struct SimulationPlugin {
    pub config: SimConfig,
    pub mesh: Mesh,
    /// Config file to reload physics settings from when it changes
    pub watch: Option<PathBuf>,
}

impl SimulationPlugin {
    pub fn new(config: SimConfig, mesh: Mesh) -> Self {
        Self {
            config,
            mesh,
            watch: None,
        }
    }

    pub fn watching(mut self, path: impl Into<PathBuf>) -> Self {
        self.watch = Some(path.into());
        self
    }
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        let sim = Simulation::new(self.config.clone(), self.mesh.clone());
        app.insert_resource(SimulationResource(Arc::new(RwLock::new(sim))))
            .add_systems(Update, (config_reload_system, simulation_tick_system).chain());

        if let Some(path) = &self.watch {
            match ConfigWatcher::new(path) {
                Ok(watcher) => {
                    app.insert_resource(watcher);
                }
                Err(e) => tracing::error!("config hot-reload disabled: {e}"),
            }
        }
    }
}

#[derive(Resource, Clone)]
pub struct SimulationResource(pub Arc<RwLock<Simulation>>);

fn simulation_tick_system(sim_res: Res<SimulationResource>) {
    if let Ok(mut sim) = sim_res.0.write() {
        sim.tick();
    }
}

fn config_reload_system(watcher: Option<ResMut<ConfigWatcher>>, sim_res: Res<SimulationResource>) {
    let Some(mut watcher) = watcher else {
        return;
    };
    if let Some(config) = watcher.poll() {
        if let Ok(mut sim) = sim_res.0.write() {
            sim.apply_config(config);
            tracing::debug!(reloads = watcher.reload_count, "reloaded config applied");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::MeshBuilder;

    #[test]
    fn test_one_tick_per_update() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_plugins(SimulationPlugin::new(SimConfig::default(), MeshBuilder::new(4, 4).build()));
        for _ in 0..3 {
            app.update();
        }
        let sim = app.world().resource::<SimulationResource>().0.read().unwrap();
        assert_eq!(sim.update_wld, 3);
        assert!(app.world().get_resource::<ConfigWatcher>().is_none());
    }
}
