//! Config file watching.
//!
//! A [`ConfigWatcher`] forwards filesystem events through a channel; the
//! host polls it once per frame and applies any successfully parsed config.
//! A config that fails to parse or validate is reported and the running
//! settings stay in place.

use bevy::prelude::Resource;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::sync::Mutex;

use super::SimConfig;
use crate::error::{CoreError, CoreResult};

#[derive(Resource)]
pub struct ConfigWatcher {
    path: PathBuf,
    _watcher: RecommendedWatcher,
    receiver: Mutex<Receiver<notify::Result<Event>>>,
    pub reload_count: u32,
    pub last_error: Option<String>,
}

impl ConfigWatcher {
    /// Watch the directory containing `path`.
    pub fn new(path: &Path) -> CoreResult<Self> {
        let (tx, rx) = channel();
        let mut watcher = notify::recommended_watcher(tx)
            .map_err(|e| CoreError::InvalidConfig(format!("watcher: {e}")))?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| CoreError::InvalidConfig(format!("watch {}: {e}", dir.display())))?;

        tracing::info!(path = %path.display(), "config hot-reload enabled");
        Ok(Self {
            path: path.to_path_buf(),
            _watcher: watcher,
            receiver: Mutex::new(rx),
            reload_count: 0,
            last_error: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drain pending events. Returns the newest valid config if the file changed.
    pub fn poll(&mut self) -> Option<SimConfig> {
        let mut changed = false;
        {
            let Ok(receiver) = self.receiver.lock() else {
                return None;
            };
            while let Ok(result) = receiver.try_recv() {
                match result {
                    Ok(event) => changed |= is_config_modify_event(&event, &self.path),
                    Err(e) => tracing::warn!("file watcher error: {e}"),
                }
            }
        }
        if !changed {
            return None;
        }

        match SimConfig::load(&self.path) {
            Ok(config) => {
                self.reload_count += 1;
                self.last_error = None;
                tracing::info!(count = self.reload_count, "config reloaded");
                Some(config)
            }
            Err(e) => {
                tracing::error!("config reload failed: {e}");
                self.last_error = Some(e.to_string());
                None
            }
        }
    }
}

/// Whether a filesystem event modified or created the watched file.
pub fn is_config_modify_event(event: &Event, watched: &Path) -> bool {
    let Some(name) = watched.file_name() else {
        return false;
    };
    (event.kind.is_modify() || event.kind.is_create())
        && event.paths.iter().any(|p| p.file_name() == Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, ModifyKind};
    use notify::EventKind;

    fn event(kind: EventKind, path: &str) -> Event {
        Event {
            kind,
            paths: vec![PathBuf::from(path)],
            attrs: Default::default(),
        }
    }

    #[test]
    fn test_modify_event_matches_file_name() {
        let watched = Path::new("config/sim.ron");
        let modify = EventKind::Modify(ModifyKind::Data(DataChange::Any));
        assert!(is_config_modify_event(&event(modify, "/abs/config/sim.ron"), watched));
        assert!(!is_config_modify_event(&event(modify, "config/other.ron"), watched));
        assert!(is_config_modify_event(
            &event(EventKind::Create(CreateKind::File), "config/sim.ron"),
            watched
        ));
        assert!(!is_config_modify_event(&event(EventKind::Any, "config/sim.ron"), watched));
    }

    #[test]
    fn test_watcher_on_temp_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.ron");
        std::fs::write(&path, "(seed: 1)").unwrap();
        let mut watcher = ConfigWatcher::new(&path).unwrap();
        assert_eq!(watcher.path(), path.as_path());
        // nothing was written since the watch started
        assert!(watcher.poll().is_none());
        assert_eq!(watcher.reload_count, 0);
    }
}
