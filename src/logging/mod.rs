//! Structured logging
//!
//! - [`LogConfig`]: base verbosity plus per-subsystem overrides, carried in
//!   [`SimConfig`](crate::config::SimConfig)
//! - `RUST_LOG`, when set, replaces the configured filter entirely
//! - [`init_tracing`] installs the global subscriber once; later calls are no-ops
//! - [`TickSpan`] wraps one simulation tick

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Once;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber when added to an `App`.
#[derive(Default)]
pub struct LoggingPlugin {
    pub config: LogConfig,
}

impl Plugin for LoggingPlugin {
    fn build(&self, _app: &mut App) {
        init_tracing(&self.config);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<Verbosity> for LevelFilter {
    fn from(v: Verbosity) -> Self {
        match v {
            Verbosity::Off => LevelFilter::OFF,
            Verbosity::Error => LevelFilter::ERROR,
            Verbosity::Warn => LevelFilter::WARN,
            Verbosity::Info => LevelFilter::INFO,
            Verbosity::Debug => LevelFilter::DEBUG,
            Verbosity::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: Verbosity,
    /// Keyed by subsystem module name, e.g. `"physics"` or `"character"`
    pub subsystems: BTreeMap<String, Verbosity>,
    pub show_targets: bool,
    pub show_file_line: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        // the per-character step is far too chatty at info
        let subsystems = [("physics", Verbosity::Warn), ("instance", Verbosity::Warn)]
            .into_iter()
            .map(|(m, v)| (m.to_string(), v))
            .collect();
        Self {
            level: Verbosity::Info,
            subsystems,
            show_targets: true,
            show_file_line: false,
        }
    }
}

impl LogConfig {
    /// Filter directives: the base level, then `egoboo_core::<subsystem>=<level>`.
    pub fn directives(&self) -> Vec<Directive> {
        let base = Directive::from(LevelFilter::from(self.level));
        // names that do not form a valid target are skipped
        let overrides = self.subsystems.iter().filter_map(|(module, v)| {
            format!("egoboo_core::{module}={}", LevelFilter::from(*v))
                .parse::<Directive>()
                .ok()
        });
        std::iter::once(base).chain(overrides).collect()
    }

    fn env_filter(&self) -> EnvFilter {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return filter;
        }
        let mut directives = self.directives().into_iter();
        let base = directives.next().unwrap_or_else(|| LevelFilter::INFO.into());
        let filter = EnvFilter::builder().with_default_directive(base).parse_lossy("");
        directives.fold(filter, EnvFilter::add_directive)
    }
}

static TRACING_INIT: Once = Once::new();

pub fn init_tracing_default() {
    init_tracing(&LogConfig::default());
}

/// Install the global subscriber. Only the first call has any effect.
pub fn init_tracing(config: &LogConfig) {
    let filter = config.env_filter();
    let (targets, file_line) = (config.show_targets, config.show_file_line);
    TRACING_INIT.call_once(move || {
        let installed = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(targets)
            .with_file(file_line)
            .with_line_number(file_line)
            .compact()
            .try_init();
        // a host such as bevy's LogPlugin may own the subscriber already
        if installed.is_err() {
            tracing::debug!("global subscriber already set");
        }
    });
}

/// Entered for the length of one tick; everything logged inside carries
/// the tick number.
pub struct TickSpan {
    _span: tracing::span::EnteredSpan,
}

impl TickSpan {
    pub fn enter(tick: u64, characters: usize) -> Self {
        let span = tracing::debug_span!("tick", tick, characters);
        Self {
            _span: span.entered(),
        }
    }
}
