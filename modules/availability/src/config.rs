use serde::{Deserialize, Serialize};

use crate::domain::time::Granularity;

/// Configuration for the availability module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AvailabilityConfig {
    #[serde(default)]
    pub granularity: Granularity,
    /// Lets `DeleteOptions::force` remove reserved intervals.
    #[serde(default)]
    pub allow_reservation_override: bool,
    #[serde(default = "default_next_open_horizon_days")]
    pub next_open_horizon_days: u32,
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::default(),
            allow_reservation_override: false,
            next_open_horizon_days: default_next_open_horizon_days(),
        }
    }
}

fn default_next_open_horizon_days() -> u32 {
    90
}
