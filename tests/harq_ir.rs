//! HARQ incremental redundancy: a first transmission too short to even
//! cover every systematic bit cannot decode on its own (most systematic
//! positions carry no information at all, not just noisy information),
//! but a second transmission on a different redundancy version that
//! covers the remaining buffer lets the soft-combined accumulator
//! decode successfully.

use lte_ul_phy::sch::softbuffer::HarqSoftbuffer;
use lte_ul_phy::sch::{decode_transport_block, encode_transport_block, TransportBlockOutcome};

fn llrs_from_bits(bits: &[u8], magnitude: f32) -> Vec<f32> {
    bits.iter().map(|&b| if b == 0 { magnitude } else { -magnitude }).collect()
}

#[test]
fn second_redundancy_version_rescues_a_too_short_first_attempt() {
    let tb: Vec<u8> = (0..300).map(|i| ((i * 5) % 9 < 4) as u8).collect();

    // Learn the code-block's systematic length so the first attempt can
    // be sized to cover only a fraction of it.
    let seg = lte_ul_phy::sch::segmentation::segment(&tb, 8).unwrap();
    let k_with_tail = seg.blocks[0].bits.len() + 3;

    let e_short = k_with_tail / 4; // far short of even the systematic stream
    let (seg0, streams0) = encode_transport_block(&tb, 0, &[e_short], 8).unwrap();
    let weak_llrs = vec![llrs_from_bits(&streams0[0], 6.0)];

    let mut softbuffer = HarqSoftbuffer::new();
    let first_attempt = decode_transport_block(&seg0, &mut softbuffer, 0, &weak_llrs, 6, true).unwrap();
    assert_eq!(
        first_attempt,
        TransportBlockOutcome::Pending,
        "most systematic bits carry no information yet, decode must not succeed"
    );

    // A generously long second transmission on a different redundancy
    // version wraps the circular buffer far enough to cover every
    // remaining real bit at least once.
    let e_full = 3 * k_with_tail.div_ceil(32) * 32;
    let (seg1, streams1) = encode_transport_block(&tb, 1, &[e_full], 8).unwrap();
    let full_llrs = vec![llrs_from_bits(&streams1[0], 6.0)];

    let second_attempt = decode_transport_block(&seg1, &mut softbuffer, 1, &full_llrs, 6, false).unwrap();
    assert_eq!(second_attempt, TransportBlockOutcome::Decoded(tb));
}
