//! Error kinds surfaced by the receiver chain (spec §7).
//!
//! Per-subframe decode failures are not represented here: a failed CRC
//! check is a data field on the result (`crc_ok = false`), and a PUCCH
//! miss is `detected = false`. Only call-level problems — bad
//! configuration, missing setup, or a grant the chain cannot service —
//! are raised as `PhyError`.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PhyError {
    #[error("invalid cell configuration: {0}")]
    InvalidConfig(String),

    #[error("processing call made before cell or DMRS generator was configured")]
    NotConfigured,

    #[error("grant requires {required} code blocks, exceeding the compile-time maximum of {max}")]
    OutOfBudget { required: usize, max: usize },

    #[error("invalid grant: {0}")]
    InvalidGrant(String),

    #[error("unsupported configuration: {0}")]
    Unsupported(String),
}

pub type PhyResult<T> = Result<T, PhyError>;
