//! Core configuration surface (ambient stack; spec §1 notes the
//! configuration-file loader itself is out of scope). The core never
//! reads a config file — callers parse whatever format they like and
//! hand this struct in.

use std::time::Duration;

/// Per-process knobs the core needs but does not source itself.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Startup `-g` flag (spec §6): eager pre-expansion of every known
    /// device's grammar instead of building on first reference.
    pub eager_grammar_expansion: bool,
    /// Deadline for a device's schema download before it is treated as a
    /// timeout failure (spec §5 Cancellation and timeouts).
    pub schema_download_deadline: Duration,
    /// Deadline for the `OpenSync` initial configuration pull.
    pub config_pull_deadline: Duration,
    /// YANG domain label assigned to passively-created device handles
    /// (spec §3 Lifecycles).
    pub default_domain: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            eager_grammar_expansion: false,
            schema_download_deadline: Duration::from_secs(30),
            config_pull_deadline: Duration::from_secs(60),
            default_domain: "default".to_string(),
        }
    }
}
