//! Structured logging for the fd-core CLI.
//!
//! Library code only emits `tracing` events; the binary installs a
//! subscriber once at startup:
//! - human-readable lines on stderr (default)
//! - JSON lines on stderr with `--log-format jsonl` or `FAULTDX_LOG_FORMAT=jsonl`
//!
//! stdout is reserved for command payloads.

pub mod config;

pub use config::{LogConfig, LogFormat, LogLevel};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Pipeline stage a log event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Simulate,
    Diagnose,
    Sensitivity,
    Render,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Load => "load",
            Stage::Simulate => "simulate",
            Stage::Diagnose => "diagnose",
            Stage::Sensitivity => "sensitivity",
            Stage::Render => "render",
        };
        write!(f, "{}", s)
    }
}

/// Event names used as `event` fields on stage boundaries.
pub mod event_names {
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const STAGE_STARTED: &str = "stage.started";
    pub const STAGE_FINISHED: &str = "stage.finished";
}

/// Install the global subscriber.
///
/// Returns `false` if a subscriber was already installed.
pub fn init_logging(config: &LogConfig) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.directive()));

    match config.format {
        LogFormat::Human => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(config.ansi);
            if config.timestamps {
                tracing_subscriber::registry().with(filter).with(layer).try_init().is_ok()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(layer.without_time())
                    .try_init()
                    .is_ok()
            }
        }
        LogFormat::Jsonl => {
            let layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(false);
            tracing_subscriber::registry().with(filter).with(layer).try_init().is_ok()
        }
    }
}

/// Unique id for one CLI invocation: `run-` plus 12 hex characters.
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("run-{}", &uuid[..12])
}

/// Span carrying the run id; every event inside inherits it.
pub fn run_span(run_id: &str, command: &str) -> tracing::Span {
    tracing::info_span!("run", run_id = %run_id, command = %command)
}
