//! Uplink channel estimator (spec §4.3).

pub mod pucch;
pub mod pusch;
pub mod result;
pub mod srs;

pub use pucch::{estimate_pucch, PucchEstimate};
pub use pusch::estimate_pusch;
pub use result::ChannelEstimate;
pub use srs::{estimate_srs, SrsEstimate};
