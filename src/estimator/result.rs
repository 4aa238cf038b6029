//! Channel-estimate result (spec §3).

use crate::numeric::cpx::{floor_positive, Cpx};

#[derive(Debug, Clone)]
pub struct ChannelEstimate {
    /// Equalizer coefficients (channel estimate), one per (symbol,
    /// subcarrier) covered by the estimation.
    pub coefficients: Vec<Cpx>,
    pub noise_power: f32,
    pub snr_db: f32,
    pub epre_dbfs: f32,
    pub rsrp_dbfs: f32,
    pub cfo_hz: f32,
    pub timing_offset_us: f32,
}

impl ChannelEstimate {
    pub fn from_epre_rsrp(
        coefficients: Vec<Cpx>,
        epre_linear: f32,
        rsrp_linear: f32,
        noise_linear: f32,
        cfo_hz: f32,
        timing_offset_us: f32,
    ) -> Self {
        let noise_power = floor_positive(noise_linear);
        let snr_db = if noise_power.is_finite() && epre_linear > 0.0 {
            10.0 * (epre_linear / noise_power).log10()
        } else {
            f32::NAN
        };
        Self {
            coefficients,
            noise_power,
            snr_db,
            epre_dbfs: to_dbfs(epre_linear),
            rsrp_dbfs: to_dbfs(rsrp_linear.min(epre_linear)),
            cfo_hz,
            timing_offset_us: round_to_0p1(timing_offset_us),
        }
    }
}

fn to_dbfs(linear: f32) -> f32 {
    if linear > 0.0 {
        10.0 * linear.log10()
    } else {
        f32::NEG_INFINITY
    }
}

fn round_to_0p1(x: f32) -> f32 {
    (x * 10.0).round() / 10.0
}
