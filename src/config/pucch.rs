//! PUCCH cell-specific and per-user configuration (spec §4.4, §6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PucchFormat {
    Format1,
    Format1a,
    Format1b,
    Format2,
    Format2a,
    Format2b,
    Format3,
}

impl PucchFormat {
    /// Payload bits carried by this format (excluding presence-only
    /// Format 1, which carries no information bits).
    pub fn payload_bits(self) -> usize {
        match self {
            PucchFormat::Format1 => 0,
            PucchFormat::Format1a => 1,
            PucchFormat::Format1b => 2,
            PucchFormat::Format2 => 20,
            PucchFormat::Format2a => 21,
            PucchFormat::Format2b => 22,
            PucchFormat::Format3 => 48,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PucchCellConfig {
    pub delta_shift: u8, // Delta_shift_PUCCH: 1..3
    pub n_cs1: u8,       // N_cs_1: cyclic shifts used for mixed format1/2 RBs
    pub n1_pucch: u16,   // N1_PUCCH: format-1 resource boundary
}

impl Default for PucchCellConfig {
    fn default() -> Self {
        Self {
            delta_shift: 2,
            n_cs1: 0,
            n1_pucch: 0,
        }
    }
}

/// Per-user PUCCH resource selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PucchResourceConfig {
    pub format: PucchFormat,
    pub n_pucch: u32,
    pub cyclic_shift: u8,
    pub orthogonal_cover_index: u8,
    /// Channel-selection mode: up to 4 candidate resource indices.
    pub channel_selection_table: Option<[u32; 4]>,
}

/// Detection thresholds (spec §4.4). All default to values the module
/// documents; Format-3 validity default is an open question per spec §9
/// and must be supplied by the caller — there is no safe default.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PucchThresholds {
    pub dmrs_correlation_threshold: f32,
    pub format1_correlation_threshold: f32,
    pub data_validity_threshold: f32,
}

impl Default for PucchThresholds {
    fn default() -> Self {
        Self {
            dmrs_correlation_threshold: 0.0,
            format1_correlation_threshold: 0.15,
            data_validity_threshold: 0.0,
        }
    }
}
