//! Global receiver-chain flags (spec §6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReceiverFlags {
    pub qam256_enable: bool,
    pub llr8_enable: bool,
    pub cfr_threshold: f32,
    pub cfr_target_papr_db: f32,
    pub max_turbo_iterations: u32,
}

impl Default for ReceiverFlags {
    fn default() -> Self {
        Self {
            qam256_enable: false,
            llr8_enable: false,
            cfr_threshold: 1.0,
            cfr_target_papr_db: 8.0,
            max_turbo_iterations: 10,
        }
    }
}
