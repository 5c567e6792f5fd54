use serde::{Deserialize, Serialize};

/// Configuration of one channel's driver loops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Seconds between scheduled report/mention runs.
    pub poll_interval_secs: u64,

    /// Upper bound for one external place lookup.
    pub lookup_timeout_secs: u64,

    /// Reply sent when a mention cannot be resolved to a region.
    pub not_understood_reply: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            lookup_timeout_secs: 10,
            not_understood_reply:
                "Dazu habe ich leider keine Region gefunden. Bitte nenne einen Stadt- oder \
                 Landkreis."
                    .to_string(),
        }
    }
}
