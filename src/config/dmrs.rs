//! DMRS generation parameters (spec §6 configuration input).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DmrsConfig {
    pub group_hopping_enable: bool,
    pub sequence_hopping_enable: bool,
    pub cyclic_shift: u8, // n_DMRS,1: 0..7
    pub delta_ss: u8,     // cell-specific Delta_ss: 0..29
}

impl Default for DmrsConfig {
    fn default() -> Self {
        Self {
            group_hopping_enable: false,
            sequence_hopping_enable: false,
            cyclic_shift: 0,
            delta_ss: 0,
        }
    }
}

/// Whether the DMRS pregeneration tables have been computed for a given
/// cell; the estimator consults this before use (spec §4.3 failure mode).
#[derive(Debug, Default)]
pub struct DmrsState {
    pub populated: bool,
}
