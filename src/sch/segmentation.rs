//! Code-block segmentation (spec §4.7; TS 36.212 §5.1.2).
//!
//! Splits a CRC-24A-protected transport block into one or more
//! CRC-24B-protected code blocks sized from the permitted turbo
//! code-block sizes, inserting filler bits at the front of the first
//! block when the transport block does not divide evenly.

use crate::error::{PhyError, PhyResult};
use crate::numeric::crc::{append_crc_bits, check_crc_bits, CRC24A, CRC24B};

/// Above this many payload bits a transport block must be segmented
/// into multiple code blocks (TS 36.212 §5.1.2, `Z`).
pub const MAX_CODE_BLOCK_BITS: usize = 6144;

/// The 188 turbo-code-permitted block sizes (TS 36.212 Table 5.1.3-3
/// row index set), generated from the standard's four linear ranges
/// rather than transcribed row by row.
pub fn permitted_k_sizes() -> Vec<usize> {
    let mut sizes = Vec::with_capacity(188);
    let mut k = 40;
    while k <= 512 {
        sizes.push(k);
        k += 8;
    }
    k = 528;
    while k <= 1024 {
        sizes.push(k);
        k += 16;
    }
    k = 1056;
    while k <= 2048 {
        sizes.push(k);
        k += 32;
    }
    k = 2112;
    while k <= MAX_CODE_BLOCK_BITS {
        sizes.push(k);
        k += 64;
    }
    sizes
}

fn smallest_permitted_at_least(sizes: &[usize], need: usize) -> Option<usize> {
    sizes.iter().copied().find(|&k| k >= need)
}

#[derive(Debug, Clone)]
pub struct CodeBlock {
    /// Payload bits including filler (value 0) at the front, if any,
    /// and the trailing CRC24B when the transport block was segmented
    /// into more than one block.
    pub bits: Vec<u8>,
    pub filler_len: usize,
}

#[derive(Debug, Clone)]
pub struct SegmentationResult {
    pub blocks: Vec<CodeBlock>,
    pub k_plus: usize,
}

/// Segment a transport block (payload bits, CRC24A not yet applied)
/// into code blocks.
pub fn segment(transport_block: &[u8], max_code_blocks: usize) -> PhyResult<SegmentationResult> {
    let with_tb_crc = append_crc_bits(CRC24A, transport_block);
    let b = with_tb_crc.len();
    let sizes = permitted_k_sizes();

    if b <= MAX_CODE_BLOCK_BITS {
        let k_plus = smallest_permitted_at_least(&sizes, b)
            .ok_or_else(|| PhyError::OutOfBudget { required: b, max: MAX_CODE_BLOCK_BITS })?;
        let filler_len = k_plus - b;
        let mut bits = vec![0u8; filler_len];
        bits.extend_from_slice(&with_tb_crc);
        return Ok(SegmentationResult {
            blocks: vec![CodeBlock { bits, filler_len }],
            k_plus,
        });
    }

    let c = b.div_ceil(MAX_CODE_BLOCK_BITS - 24);
    if c > max_code_blocks {
        return Err(PhyError::OutOfBudget { required: c, max: max_code_blocks });
    }
    let per_block_payload = b.div_ceil(c);
    let k_plus = smallest_permitted_at_least(&sizes, per_block_payload + 24)
        .ok_or_else(|| PhyError::OutOfBudget { required: per_block_payload + 24, max: MAX_CODE_BLOCK_BITS })?;

    let mut blocks = Vec::with_capacity(c);
    let total_needed = c * (k_plus - 24);
    let filler_len = total_needed.saturating_sub(b);
    let mut cursor = 0usize;
    for i in 0..c {
        let take = if i == 0 {
            (k_plus - 24).saturating_sub(filler_len)
        } else {
            k_plus - 24
        };
        let end = (cursor + take).min(with_tb_crc.len());
        let mut payload: Vec<u8> = if i == 0 {
            let mut v = vec![0u8; filler_len];
            v.extend_from_slice(&with_tb_crc[cursor..end]);
            v
        } else {
            with_tb_crc[cursor..end].to_vec()
        };
        cursor = end;
        payload = append_crc_bits(CRC24B, &payload);
        blocks.push(CodeBlock { bits: payload, filler_len: if i == 0 { filler_len } else { 0 } });
    }

    Ok(SegmentationResult { blocks, k_plus })
}

/// Reassemble a transport block from decoded code blocks, verifying
/// each block's CRC24B (when segmented) and the transport block's
/// CRC24A, stripping filler bits from the first block.
pub fn reassemble(result: &SegmentationResult, decoded_blocks: &[Vec<u8>]) -> PhyResult<(Vec<u8>, Vec<bool>)> {
    if decoded_blocks.len() != result.blocks.len() {
        return Err(PhyError::InvalidGrant("decoded block count mismatch".into()));
    }
    let multi = decoded_blocks.len() > 1;
    let mut crc_ok = Vec::with_capacity(decoded_blocks.len());
    let mut payload = Vec::new();
    for (i, block) in decoded_blocks.iter().enumerate() {
        let ok = if multi { check_crc_bits(CRC24B, block) } else { true };
        crc_ok.push(ok);
        let without_crc = if multi { &block[..block.len() - 24] } else { &block[..] };
        let filler = result.blocks[i].filler_len;
        payload.extend_from_slice(&without_crc[filler.min(without_crc.len())..]);
    }
    let tb_ok = check_crc_bits(CRC24A, &payload);
    if !tb_ok || crc_ok.iter().any(|&ok| !ok) {
        return Err(PhyError::InvalidGrant("code block or transport block CRC failed".into()));
    }
    let tb = payload[..payload.len() - 24].to_vec();
    Ok((tb, crc_ok))
}
