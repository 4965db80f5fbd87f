//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Background sweep scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the in-process cron scheduler runs. Disable when an external
    /// scheduler drives the sweep trigger endpoint instead.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}
