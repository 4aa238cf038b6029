//! Numeric kernels (spec §4.1): pure, deterministic, non-allocating
//! vector arithmetic, FFT, CRC, sequence generation and rate-matching
//! tables shared by every higher-level component.

pub mod cpx;
pub mod crc;
pub mod fft;
pub mod qpp;
pub mod ratematch;
pub mod sequence;

pub use cpx::Cpx;
