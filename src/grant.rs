//! Grant descriptor and UCI configuration/value types (spec §3, §6).

use crate::config::pucch::{PucchFormat, PucchResourceConfig};
use crate::error::{PhyError, PhyResult};

/// Modulation order, indexed 0-28 for up to 64-QAM, 0-33 with 256-QAM
/// enabled (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modulation {
    Qpsk,
    Qam16,
    Qam64,
    Qam256,
}

impl Modulation {
    pub fn bits_per_symbol(self) -> usize {
        match self {
            Modulation::Qpsk => 2,
            Modulation::Qam16 => 4,
            Modulation::Qam64 => 6,
            Modulation::Qam256 => 8,
        }
    }

}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CqiType {
    Wideband,
    Subband { n_bits: u8 },
}

#[derive(Debug, Clone, Copy)]
pub struct UciOffsets {
    pub i_offset_ack: u8,
    pub i_offset_ri: u8,
    pub i_offset_cqi: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct UciConfig {
    pub sr_present: bool,
    pub ack_bits: u8,
    pub ri_bits: u8,
    pub cqi: Option<CqiType>,
    pub offsets: UciOffsets,
}

impl Default for UciConfig {
    fn default() -> Self {
        Self {
            sr_present: false,
            ack_bits: 0,
            ri_bits: 0,
            cqi: None,
            offsets: UciOffsets {
                i_offset_ack: 0,
                i_offset_ri: 0,
                i_offset_cqi: 0,
            },
        }
    }
}

/// Decoded control-information value with per-field validity (spec §3).
#[derive(Debug, Clone, Default)]
pub struct UciValue {
    pub ack_bits: Vec<u8>,
    pub ri: Option<u8>,
    pub cqi: Option<Vec<u8>>,
    pub sr: bool,
    pub ack_valid: bool,
    pub ri_valid: bool,
    pub cqi_valid: bool,
}

#[derive(Debug, Clone)]
pub struct PucchGrant {
    pub resource: PucchResourceConfig,
    pub uci: UciConfig,
}

#[derive(Debug, Clone)]
pub struct PuschGrant {
    pub rnti: u16,
    pub harq_process_id: u8,
    /// PRB bitmap, up to 100 entries, true where allocated.
    pub prb_set: Vec<bool>,
    pub modulation: Modulation,
    pub redundancy_version: u8, // 0..3
    pub new_data_indicator: bool,
    pub uci: UciConfig,
    /// Intra-subframe frequency hopping between the grant's two slots.
    /// The estimator has no functional path for this (spec §9) and
    /// surfaces `PhyError::Unsupported` when set.
    pub intra_subframe_hopping: bool,
}

impl PuschGrant {
    pub fn n_prb(&self) -> usize {
        self.prb_set.iter().filter(|&&b| b).count()
    }

    pub fn validate(&self, max_prb: usize, max_code_blocks: usize) -> PhyResult<()> {
        if self.prb_set.is_empty() || self.n_prb() == 0 {
            return Err(PhyError::InvalidGrant("PRB set is empty".into()));
        }
        if self.prb_set.len() > max_prb {
            return Err(PhyError::InvalidGrant(format!(
                "PRB set has {} entries, cell supports {} PRBs",
                self.prb_set.len(),
                max_prb
            )));
        }
        if self.redundancy_version > 3 {
            return Err(PhyError::InvalidGrant(format!(
                "redundancy version {} out of range",
                self.redundancy_version
            )));
        }
        let _ = max_code_blocks;
        Ok(())
    }
}

impl PucchFormat {
    pub fn is_detection_only(self) -> bool {
        matches!(self, PucchFormat::Format1)
    }
}
