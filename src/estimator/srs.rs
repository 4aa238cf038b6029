//! SRS (sounding) channel estimation (spec §4.3): magnitude and timing
//! only, no data equalization.

use crate::numeric::cpx::Cpx;

#[derive(Debug, Clone, Copy)]
pub struct SrsEstimate {
    pub channel_magnitude: f32,
    pub timing_offset_us: f32,
}

pub fn estimate_srs(rx: &[Cpx], known_root: &[Cpx]) -> SrsEstimate {
    let n = rx.len().min(known_root.len());
    let corr: Cpx = (0..n).map(|i| rx[i] * known_root[i].conj()).sum();
    let magnitude = if n > 0 { corr.norm() / n as f32 } else { 0.0 };

    let phases: Vec<f32> = (1..n)
        .map(|i| (rx[i] * known_root[i].conj() * (rx[i - 1] * known_root[i - 1].conj()).conj()).arg())
        .collect();
    let mean_slope = if phases.is_empty() {
        0.0
    } else {
        phases.iter().sum::<f32>() / phases.len() as f32
    };
    let subcarrier_spacing_hz = 15_000.0;
    let delay_s = -mean_slope / (2.0 * std::f32::consts::PI * subcarrier_spacing_hz);

    SrsEstimate {
        channel_magnitude: magnitude,
        timing_offset_us: (delay_s * 1e6 * 10.0).round() / 10.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matched_sequence_gives_unit_magnitude() {
        let seq: Vec<Cpx> = (0..16).map(|i| Cpx::new((i as f32).cos(), (i as f32).sin())).collect();
        let est = estimate_srs(&seq, &seq);
        assert!((est.channel_magnitude - 1.0).abs() < 1e-4);
    }
}
