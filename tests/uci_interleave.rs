//! UCI multiplexing and channel interleaving properties: reserved ACK
//! and RI positions never collide with each other, and the column-
//! first/row-first interleaver round-trips arbitrary payloads.

use lte_ul_phy::grant::UciOffsets;
use lte_ul_phy::uci::{interleave, deinterleave};
use lte_ul_phy::uci::mux::plan;

#[test]
fn multiplex_plan_reserves_disjoint_ack_ri_cqi_positions() {
    let offsets = UciOffsets { i_offset_ack: 3, i_offset_ri: 2, i_offset_cqi: 1 };
    let dmrs = vec![false, false, true, false, false, false, false, false, false, false, true, false, false, false];
    let m_sc = 12;
    let n_symb = dmrs.len();

    let p = plan(&offsets, 2, 1, 11, 4, n_symb, 6144, m_sc, &dmrs);

    for pos in &p.ack_positions {
        assert!(!p.ri_positions.contains(pos));
        assert!(!p.cqi_positions.contains(pos));
    }
    for pos in &p.ri_positions {
        assert!(!p.cqi_positions.contains(pos));
    }
}

#[test]
fn channel_interleaver_round_trips_llr_vectors() {
    let data: Vec<f32> = (0..84).map(|i| i as f32 * 0.5 - 10.0).collect();
    let interleaved = interleave(&data, 12, 7);
    let recovered: Vec<f32> = deinterleave(&interleaved, 12, 7);
    assert_eq!(recovered, data);
}

#[test]
fn channel_interleaver_round_trips_bit_vectors() {
    let data: Vec<u8> = (0..48).map(|i| (i % 3 == 0) as u8).collect();
    let interleaved = interleave(&data, 12, 4);
    let recovered: Vec<u8> = deinterleave(&interleaved, 12, 4);
    assert_eq!(recovered, data);
}
