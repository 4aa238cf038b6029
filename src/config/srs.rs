//! SRS (sounding reference signal) configuration (spec §6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SrsConfig {
    pub bandwidth_config: u8,
    pub comb: u8, // transmission comb: 0 or 1
    pub cyclic_shift: u8,
    pub hopping_bandwidth: u8,
}

impl Default for SrsConfig {
    fn default() -> Self {
        Self {
            bandwidth_config: 0,
            comb: 0,
            cyclic_shift: 0,
            hopping_bandwidth: 0,
        }
    }
}
