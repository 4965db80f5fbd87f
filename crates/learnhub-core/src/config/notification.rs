//! Notification fan-out configuration.

use serde::{Deserialize, Serialize};

/// Notification delivery and deferred-queue settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Cron expression (with seconds) for the deferred-queue sweep.
    #[serde(default = "default_sweep_cron")]
    pub sweep_cron: String,
    /// Hours a deferred item survives before it is discarded unsent.
    #[serde(default = "default_queued_ttl")]
    pub queued_ttl_hours: u32,
    /// Maximum deferred items promoted per sweep pass.
    #[serde(default = "default_sweep_batch")]
    pub sweep_batch_size: u32,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            sweep_cron: default_sweep_cron(),
            queued_ttl_hours: default_queued_ttl(),
            sweep_batch_size: default_sweep_batch(),
        }
    }
}

fn default_sweep_cron() -> String {
    "0 */5 * * * *".to_string()
}

fn default_queued_ttl() -> u32 {
    24
}

fn default_sweep_batch() -> u32 {
    500
}
