//! Per-HARQ-process softbuffer lifecycle (spec §4.7, §4.8): owns one
//! [`SoftCombiner`] per code block of a HARQ process, tracks which
//! blocks have already passed their CRC (so a correctly decoded block
//! is not corrupted by combining a later retransmission's noise into
//! it), and is reset on a new-data-indicator toggle.

use crate::sch::ratematching::SoftCombiner;

#[derive(Debug, Clone)]
struct BlockState {
    combiner: SoftCombiner,
    crc_passed: bool,
    decoded_bits: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct HarqSoftbuffer {
    blocks: Vec<BlockState>,
    last_new_data_indicator: Option<bool>,
}

impl HarqSoftbuffer {
    pub fn new() -> Self {
        Self { blocks: Vec::new(), last_new_data_indicator: None }
    }

    /// Ensure the buffer is sized and reset for a new transmission
    /// attempt. When `new_data_indicator` toggles relative to the last
    /// call, every block's accumulator is cleared (a fresh transport
    /// block, not a retransmission); otherwise a block that has not yet
    /// passed CRC keeps its accumulated soft bits.
    pub fn prepare(&mut self, n_blocks: usize, k_with_tail: &[usize], new_data_indicator: bool) {
        let is_new = self.last_new_data_indicator != Some(new_data_indicator) || self.blocks.len() != n_blocks;
        self.last_new_data_indicator = Some(new_data_indicator);

        if is_new {
            self.blocks = k_with_tail
                .iter()
                .map(|&k| BlockState {
                    combiner: SoftCombiner::new(k),
                    crc_passed: false,
                    decoded_bits: Vec::new(),
                })
                .collect();
        }
    }

    /// Combine a newly received rate-matched LLR stream into block
    /// `idx`'s accumulator, unless that block has already been
    /// correctly decoded (its bits are kept and further combining is
    /// skipped).
    pub fn combine(&mut self, idx: usize, rv: u8, llrs: &[f32]) {
        if let Some(block) = self.blocks.get_mut(idx) {
            if !block.crc_passed {
                block.combiner.combine(rv, llrs);
            }
        }
    }

    pub fn constituent_llrs(&self, idx: usize, k_with_tail: usize) -> Option<(Vec<f32>, Vec<f32>, Vec<f32>)> {
        self.blocks.get(idx).map(|b| b.combiner.constituent_llrs(k_with_tail))
    }

    pub fn mark_result(&mut self, idx: usize, crc_passed: bool, decoded_bits: Vec<u8>) {
        if let Some(block) = self.blocks.get_mut(idx) {
            block.crc_passed = crc_passed;
            if crc_passed {
                block.decoded_bits = decoded_bits;
            }
        }
    }

    pub fn crc_passed(&self, idx: usize) -> bool {
        self.blocks.get(idx).map(|b| b.crc_passed).unwrap_or(false)
    }

    pub fn decoded_bits(&self, idx: usize) -> Option<&[u8]> {
        self.blocks.get(idx).map(|b| b.decoded_bits.as_slice())
    }

    pub fn all_passed(&self) -> bool {
        !self.blocks.is_empty() && self.blocks.iter().all(|b| b.crc_passed)
    }

    /// Clear every block's CRC-passed flag without discarding its
    /// accumulated soft bits, for the false-CRC-collision case where
    /// every code-block CRC24B passed but the reassembled transport
    /// block's CRC24A did not: the next retransmission must combine
    /// into every block again instead of skipping blocks it believes
    /// are already correct.
    pub fn clear_crc_flags(&mut self) {
        for block in &mut self.blocks {
            block.crc_passed = false;
            block.decoded_bits.clear();
        }
    }
}

impl Default for HarqSoftbuffer {
    fn default() -> Self {
        Self::new()
    }
}
