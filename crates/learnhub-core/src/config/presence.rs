//! Presence liveness configuration.

use serde::{Deserialize, Serialize};

/// Presence store and liveness sweep settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Cron expression (with seconds) for the liveness sweep.
    #[serde(default = "default_sweep_cron")]
    pub sweep_cron: String,
    /// A non-offline record untouched for longer than this is demoted.
    #[serde(default = "default_stale_after")]
    pub stale_after_seconds: u64,
    /// Default page size for the online list.
    #[serde(default = "default_online_limit")]
    pub online_list_limit: u32,
    /// Upper bound for the online list.
    #[serde(default = "default_online_limit_max")]
    pub online_list_limit_max: u32,
    /// Upper bound on ids accepted by a batch lookup.
    #[serde(default = "default_batch_max")]
    pub batch_lookup_max: usize,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            sweep_cron: default_sweep_cron(),
            stale_after_seconds: default_stale_after(),
            online_list_limit: default_online_limit(),
            online_list_limit_max: default_online_limit_max(),
            batch_lookup_max: default_batch_max(),
        }
    }
}

fn default_sweep_cron() -> String {
    "0 */2 * * * *".to_string()
}

fn default_stale_after() -> u64 {
    300
}

fn default_online_limit() -> u32 {
    50
}

fn default_online_limit_max() -> u32 {
    500
}

fn default_batch_max() -> usize {
    200
}
