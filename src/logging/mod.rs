//! Structured logging
//!
//! `tracing` everywhere, `tracing-subscriber` with an `EnvFilter` built from
//! per-subsystem levels. Initialization is idempotent: the first call wins and
//! `RUST_LOG` overrides the configured filter.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Once;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        })
    }
}

/// Log levels and output flags, carried in the `logging` block of
/// [`GeneratorConfig`](crate::config::GeneratorConfig)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    pub level: LogLevel,
    /// Per-target overrides, e.g. `"tile_chain::exits": debug`
    pub targets: BTreeMap<String, LogLevel>,
    pub show_targets: bool,
    pub show_thread_ids: bool,
    pub show_file_line: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        let targets = [
            ("generator", LogLevel::Info),
            ("exits", LogLevel::Info),
            ("placement", LogLevel::Info),
            ("layout", LogLevel::Warn),
            ("plugin", LogLevel::Info),
        ]
        .into_iter()
        .map(|(module, level)| (format!("tile_chain::{module}"), level))
        .collect();
        Self {
            level: LogLevel::Info,
            targets,
            show_targets: true,
            show_thread_ids: false,
            show_file_line: false,
        }
    }
}

impl TracingConfig {
    /// `EnvFilter` directives: the global level, then one `target=level` per override
    pub fn directives(&self) -> String {
        std::iter::once(self.level.to_string())
            .chain(self.targets.iter().map(|(target, level)| format!("{target}={level}")))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn with_target(mut self, target: &str, level: LogLevel) -> Self {
        self.targets.insert(target.to_string(), level);
        self
    }
}

static TRACING_INIT: Once = Once::new();

pub fn init_tracing_default() {
    init_tracing(&TracingConfig::default());
}

/// First call wins; later calls are no-ops
pub fn init_tracing(config: &TracingConfig) {
    let directives = config.directives();
    let config = config.clone();
    TRACING_INIT.call_once(move || {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives));

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(config.show_targets)
            .with_thread_ids(config.show_thread_ids)
            .with_file(config.show_file_line)
            .with_line_number(config.show_file_line)
            .compact();

        // a global subscriber may already be installed by the host
        let _ = subscriber.try_init();
    });
}

/// Entered span that logs its elapsed time when dropped
pub struct TimingSpan {
    name: &'static str,
    started: Instant,
    _span: tracing::span::EnteredSpan,
}

impl TimingSpan {
    pub fn new(name: &'static str) -> Self {
        let span = tracing::debug_span!("operation", name = name);
        Self {
            name,
            started: Instant::now(),
            _span: span.entered(),
        }
    }
}

impl Drop for TimingSpan {
    fn drop(&mut self) {
        tracing::trace!(
            operation = self.name,
            elapsed_us = self.started.elapsed().as_micros() as u64,
            "operation finished"
        );
    }
}
