//! UCI multiplexing and channel interleaving on PUSCH (spec §4.5).

pub mod cqi_code;
pub mod interleaver;
pub mod mux;

pub use cqi_code::LinearBlockCode;
pub use interleaver::{deinterleave, interleave};
pub use mux::{plan, reserved_symbols, MultiplexPlan};
