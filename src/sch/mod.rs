//! SCH turbo-decoding pipeline (spec §4.7): segmentation, turbo
//! coding, rate matching and HARQ soft-combining composed into a
//! per-transport-block encode/decode pair.

pub mod ratematching;
pub mod segmentation;
pub mod softbuffer;
pub mod tbs_table;
pub mod turbo;
pub mod worker;

use crate::error::{PhyError, PhyResult};
use ratematching::rate_match;
use segmentation::{reassemble, segment, SegmentationResult};
use softbuffer::HarqSoftbuffer;
use turbo::{decode as turbo_decode, encode as turbo_encode};

/// Encode a transport block through segmentation, turbo coding and rate
/// matching, returning one rate-matched bit stream per code block.
pub fn encode_transport_block(
    transport_block: &[u8],
    rv: u8,
    e_per_block: &[usize],
    max_code_blocks: usize,
) -> PhyResult<(SegmentationResult, Vec<Vec<u8>>)> {
    let seg = segment(transport_block, max_code_blocks)?;
    if e_per_block.len() != seg.blocks.len() {
        return Err(PhyError::InvalidGrant("E allocation count does not match code block count".into()));
    }
    let mut streams = Vec::with_capacity(seg.blocks.len());
    for (block, &e_len) in seg.blocks.iter().zip(e_per_block.iter()) {
        let cw = turbo_encode(&block.bits);
        streams.push(rate_match(&cw, rv, e_len));
    }
    Ok((seg, streams))
}

/// Outcome of one HARQ transmission attempt. A CRC collision (every
/// code block's CRC24B passed but the reassembled transport block's
/// CRC24A did not) is data, not an error (spec §7): it is reported so
/// the caller can act on it, not propagated as a hard failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportBlockOutcome {
    /// Not every code block has passed its CRC yet; keep combining
    /// future retransmissions.
    Pending,
    /// Every code block passed and the transport block's CRC24A
    /// checked out.
    Decoded(Vec<u8>),
    /// Every code block's CRC24B passed but CRC24A did not. The
    /// softbuffer's CRC flags have already been cleared so the next
    /// retransmission re-accumulates into every block.
    CrcCollision,
}

/// Decode one HARQ transmission attempt: combines the new LLRs into the
/// persistent softbuffer, turbo-decodes every not-yet-correct code
/// block, checks CRC, and (if every block now passes) reassembles the
/// transport block.
pub fn decode_transport_block(
    seg: &SegmentationResult,
    softbuffer: &mut HarqSoftbuffer,
    rv: u8,
    llrs_per_block: &[Vec<f32>],
    max_turbo_iterations: usize,
    new_data_indicator: bool,
) -> PhyResult<TransportBlockOutcome> {
    if llrs_per_block.len() != seg.blocks.len() {
        return Err(PhyError::InvalidGrant("LLR block count mismatch".into()));
    }

    let k_with_tail: Vec<usize> = seg.blocks.iter().map(|b| b.bits.len() + 3).collect();
    softbuffer.prepare(seg.blocks.len(), &k_with_tail, new_data_indicator);

    let mut decoded_blocks = vec![Vec::new(); seg.blocks.len()];
    for (idx, llrs) in llrs_per_block.iter().enumerate() {
        if softbuffer.crc_passed(idx) {
            decoded_blocks[idx] = softbuffer.decoded_bits(idx).unwrap_or(&[]).to_vec();
            continue;
        }
        softbuffer.combine(idx, rv, llrs);
        let k_tail = k_with_tail[idx];
        let k = seg.blocks[idx].bits.len();
        let (sys, par1, par2) = softbuffer.constituent_llrs(idx, k_tail).unwrap();

        let outcome = turbo_decode(&sys, &par1, &par2, k, max_turbo_iterations, |bits| {
            crate::numeric::crc::check_crc_bits(crate::numeric::crc::CRC24B, bits)
                || crate::numeric::crc::check_crc_bits(crate::numeric::crc::CRC24A, bits)
        });

        let crc_ok = if seg.blocks.len() > 1 {
            outcome.bits.len() >= 24 && crate::numeric::crc::check_crc_bits(crate::numeric::crc::CRC24B, &outcome.bits)
        } else {
            outcome.bits.len() >= 24 && crate::numeric::crc::check_crc_bits(crate::numeric::crc::CRC24A, &outcome.bits)
        };
        softbuffer.mark_result(idx, crc_ok, outcome.bits.clone());
        decoded_blocks[idx] = outcome.bits;
    }

    if softbuffer.all_passed() {
        match reassemble(seg, &decoded_blocks) {
            Ok((tb, _crc_ok)) => Ok(TransportBlockOutcome::Decoded(tb)),
            // Every block's own decoded_blocks entry came from a
            // crc_passed==true mark, so reassemble's per-block CRC24B
            // check cannot be what failed here; only CRC24A can.
            Err(_) => {
                softbuffer.clear_crc_flags();
                Ok(TransportBlockOutcome::CrcCollision)
            }
        }
    } else {
        Ok(TransportBlockOutcome::Pending)
    }
}

pub use segmentation::{permitted_k_sizes, CodeBlock};
pub use softbuffer::HarqSoftbuffer as Softbuffer;
pub use turbo::{DecodeOutcome, TurboCodeword};
