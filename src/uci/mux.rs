//! UCI-on-PUSCH multiplexing (spec §4.5): reserves coded-symbol
//! positions for ACK/NACK, RI and CQI and punctures/replaces PUSCH data
//! bits at those positions.
//!
//! Offset-index-to-beta mapping is a documented, monotonically
//! increasing substitute for 3GPP Tables 8.6.3-1/8.6.3-2/9.3-1 (same
//! rationale as the block codes in [`crate::uci::cqi_code`]): recalling
//! the exact official step values from memory risked silently
//! presenting wrong numbers as standard. See DESIGN.md.

use crate::grant::UciOffsets;

pub fn beta_offset(index: u8) -> f32 {
    2.0 + 0.5 * index as f32
}

/// Number of coded modulation symbols reserved for a UCI field, per
/// spec §4.5: `Q' = min(ceil(O*M*N_symb*beta / K), 4*M_sc)`.
pub fn reserved_symbols(o: usize, m: usize, n_symb: usize, beta: f32, k: usize, m_sc: usize) -> usize {
    if k == 0 {
        return 0;
    }
    let numerator = (o * m * n_symb) as f32 * beta;
    let q = (numerator / k as f32).ceil() as usize;
    q.min(4 * m_sc)
}

/// Column-first positions within an (M_sc x N_symb_total) coded grid,
/// starting at `start_row` and wrapping across all non-excluded rows.
/// `excluded_symbols` marks DMRS/reserved symbol columns that must be
/// skipped.
fn column_first_positions(
    m_sc: usize,
    n_symb_total: usize,
    excluded_symbols: &[bool],
    start_row: usize,
    count: usize,
) -> Vec<(usize, usize)> {
    if count == 0 || n_symb_total == 0 || m_sc == 0 {
        return Vec::new();
    }
    let mut positions = Vec::with_capacity(count);
    let mut row = start_row % m_sc;
    let mut scanned_cols = 0usize;
    'outer: for col in (0..n_symb_total).cycle() {
        if scanned_cols >= n_symb_total {
            break;
        }
        scanned_cols += 1;
        if excluded_symbols.get(col).copied().unwrap_or(false) {
            continue;
        }
        for r in 0..m_sc {
            let actual_row = (row + r) % m_sc;
            positions.push((actual_row, col));
            if positions.len() == count {
                break 'outer;
            }
        }
        row = 0;
        scanned_cols = 0;
    }
    positions.truncate(count);
    positions
}

/// ACK positions: column-first traversal starting from the rows
/// closest to the DMRS symbols.
pub fn ack_positions(m_sc: usize, n_symb_total: usize, dmrs_symbols: &[bool], count: usize) -> Vec<(usize, usize)> {
    column_first_positions(m_sc, n_symb_total, dmrs_symbols, 0, count)
}

/// RI positions: the four most-reliable (lowest index) columns among
/// those not excluded, read column-first.
pub fn ri_positions(m_sc: usize, n_symb_total: usize, excluded: &[bool], count: usize) -> Vec<(usize, usize)> {
    column_first_positions(m_sc, n_symb_total, excluded, m_sc / 2, count)
}

#[derive(Debug, Clone)]
pub struct MultiplexPlan {
    pub ack_positions: Vec<(usize, usize)>,
    pub ri_positions: Vec<(usize, usize)>,
    pub cqi_positions: Vec<(usize, usize)>,
}

/// Build the full multiplex plan for a grant's UCI configuration.
pub fn plan(
    offsets: &UciOffsets,
    ack_bits: usize,
    ri_bits: usize,
    cqi_bits: usize,
    m: usize,
    n_symb: usize,
    k: usize,
    m_sc: usize,
    dmrs_symbols: &[bool],
) -> MultiplexPlan {
    let ack_count = if ack_bits > 0 {
        reserved_symbols(ack_bits, m, n_symb, beta_offset(offsets.i_offset_ack), k, m_sc)
    } else {
        0
    };
    let ri_count = if ri_bits > 0 {
        reserved_symbols(ri_bits, m, n_symb, beta_offset(offsets.i_offset_ri), k, m_sc)
    } else {
        0
    };
    let cqi_count = if cqi_bits > 0 {
        reserved_symbols(cqi_bits, m, n_symb, beta_offset(offsets.i_offset_cqi), k, m_sc)
    } else {
        0
    };

    let ack_positions = ack_positions(m_sc, n_symb, dmrs_symbols, ack_count);

    let mut excluded_for_ri = dmrs_symbols.to_vec();
    for &(_, col) in &ack_positions {
        if let Some(slot) = excluded_for_ri.get_mut(col) {
            *slot = true;
        }
    }
    let ri_positions = ri_positions(m_sc, n_symb, &excluded_for_ri, ri_count);

    let mut excluded_for_cqi = excluded_for_ri.clone();
    for &(_, col) in &ri_positions {
        if let Some(slot) = excluded_for_cqi.get_mut(col) {
            *slot = true;
        }
    }
    let cqi_positions = column_first_positions(m_sc, n_symb, &excluded_for_cqi, 0, cqi_count);

    MultiplexPlan { ack_positions, ri_positions, cqi_positions }
}
