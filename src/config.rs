//! Runtime configuration.
//!
//! The CLI surface takes no config file (spec names none), but the handful
//! of ambient knobs below are still centralized here, in the spirit of
//! `ProbeConfig`, rather than scattered as literals through the sync path.

use std::env;

/// Knobs that aren't part of the CLI surface but affect how a sync pass runs.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Safety bound on the first-parent walk performed for a single reference,
    /// guarding against an unbounded read when history has been rewritten
    /// with no shared ancestor (see the force-push design decision).
    pub max_walk_commits: usize,
    /// `PRAGMA busy_timeout` applied to the connection, in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_walk_commits: 100_000,
            busy_timeout_ms: 500,
        }
    }
}

impl RuntimeConfig {
    /// Build configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_walk_commits: env::var("REPO_INDEX_MAX_WALK_COMMITS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_walk_commits),
            busy_timeout_ms: env::var("REPO_INDEX_BUSY_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.busy_timeout_ms),
        }
    }
}

/// Install the `tracing` subscriber, honoring `RUST_LOG` (default `info`).
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
