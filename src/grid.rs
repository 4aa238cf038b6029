//! Resource grid (spec §3): a logical (symbol, subcarrier) array,
//! created per subframe and destroyed when the subframe is retired.

use crate::numeric::Cpx;

#[derive(Debug, Clone)]
pub struct ResourceGrid {
    n_symbols: usize,
    n_subcarriers: usize,
    data: Vec<Cpx>,
}

impl ResourceGrid {
    pub fn new(n_symbols: usize, n_subcarriers: usize) -> Self {
        Self {
            n_symbols,
            n_subcarriers,
            data: vec![Cpx::new(0.0, 0.0); n_symbols * n_subcarriers],
        }
    }

    pub fn n_symbols(&self) -> usize {
        self.n_symbols
    }

    pub fn n_subcarriers(&self) -> usize {
        self.n_subcarriers
    }

    #[inline]
    fn index(&self, symbol: usize, subcarrier: usize) -> usize {
        debug_assert!(symbol < self.n_symbols);
        debug_assert!(subcarrier < self.n_subcarriers);
        symbol * self.n_subcarriers + subcarrier
    }

    pub fn get(&self, symbol: usize, subcarrier: usize) -> Cpx {
        self.data[self.index(symbol, subcarrier)]
    }

    pub fn set(&mut self, symbol: usize, subcarrier: usize, value: Cpx) {
        let idx = self.index(symbol, subcarrier);
        self.data[idx] = value;
    }

    /// Borrow one OFDM symbol's row of subcarriers.
    pub fn symbol_row(&self, symbol: usize) -> &[Cpx] {
        let start = symbol * self.n_subcarriers;
        &self.data[start..start + self.n_subcarriers]
    }

    pub fn symbol_row_mut(&mut self, symbol: usize) -> &mut [Cpx] {
        let start = symbol * self.n_subcarriers;
        &mut self.data[start..start + self.n_subcarriers]
    }

    /// Extract the subcarriers belonging to a PRB set (bitmap, up to
    /// 100 bits) for one symbol, in ascending PRB order.
    pub fn extract_prbs(&self, symbol: usize, prb_set: &[bool]) -> Vec<Cpx> {
        let row = self.symbol_row(symbol);
        let mut out = Vec::with_capacity(prb_set.iter().filter(|&&b| b).count() * 12);
        for (prb_idx, &used) in prb_set.iter().enumerate() {
            if used {
                let start = prb_idx * 12;
                out.extend_from_slice(&row[start..start + 12]);
            }
        }
        out
    }

    pub fn clear(&mut self) {
        for v in self.data.iter_mut() {
            *v = Cpx::new(0.0, 0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let mut grid = ResourceGrid::new(14, 300);
        grid.set(3, 17, Cpx::new(1.5, -2.5));
        assert_eq!(grid.get(3, 17), Cpx::new(1.5, -2.5));
    }

    #[test]
    fn extract_prbs_respects_the_bitmap() {
        let mut grid = ResourceGrid::new(1, 36);
        for sc in 0..36 {
            grid.set(0, sc, Cpx::new(sc as f32, 0.0));
        }
        let mut prb_set = vec![false; 3];
        prb_set[1] = true;
        let extracted = grid.extract_prbs(0, &prb_set);
        assert_eq!(extracted.len(), 12);
        assert_eq!(extracted[0], Cpx::new(12.0, 0.0));
    }
}
