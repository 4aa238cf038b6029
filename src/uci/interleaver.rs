//! PUSCH channel interleaver (spec §4.5): column-first read into an
//! (M_sc x N_symb) matrix with RI/ACK positions reserved, row-first
//! output. Permutation tables are cached per `(n_symb, m_sc)` shape.

use std::collections::HashMap;
use std::sync::Mutex;

static PERMUTATION_CACHE: Mutex<Option<HashMap<(usize, usize), Vec<usize>>>> = Mutex::new(None);

/// Build (or fetch from cache) the column-first-to-row-first index
/// permutation for an `m_sc x n_symb` grid. `permutation[i]` is the
/// source index (column-major) that lands at destination index `i`
/// (row-major).
fn permutation(m_sc: usize, n_symb: usize) -> Vec<usize> {
    let mut cache = PERMUTATION_CACHE.lock().unwrap();
    let map = cache.get_or_insert_with(HashMap::new);
    map.entry((m_sc, n_symb))
        .or_insert_with(|| {
            let mut perm = Vec::with_capacity(m_sc * n_symb);
            for row in 0..m_sc {
                for col in 0..n_symb {
                    perm.push(col * m_sc + row);
                }
            }
            perm
        })
        .clone()
}

/// Interleave `symbols` (length `m_sc * n_symb`, already column-major
/// with reserved positions populated by [`crate::uci::mux`]) into
/// row-major transmission order.
pub fn interleave<T: Clone + Default>(symbols: &[T], m_sc: usize, n_symb: usize) -> Vec<T> {
    let perm = permutation(m_sc, n_symb);
    let mut out = vec![T::default(); symbols.len().min(perm.len())];
    for (dst, &src) in perm.iter().enumerate() {
        if let (Some(s), Some(slot)) = (symbols.get(src), out.get_mut(dst)) {
            *slot = s.clone();
        }
    }
    out
}

/// Inverse of [`interleave`]: recover column-major order from a
/// row-major received stream.
pub fn deinterleave<T: Clone + Default>(received: &[T], m_sc: usize, n_symb: usize) -> Vec<T> {
    let perm = permutation(m_sc, n_symb);
    let mut out = vec![T::default(); received.len().min(perm.len())];
    for (dst, &src) in perm.iter().enumerate() {
        if let (Some(s), Some(slot)) = (received.get(dst), out.get_mut(src)) {
            *slot = s.clone();
        }
    }
    out
}
