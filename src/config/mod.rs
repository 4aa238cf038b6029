//! Configuration input types (spec §6): cell descriptor, DMRS/SRS
//! generation parameters, PUCCH cell configuration and global flags.
//! All `serde`-derived so a host process (out of scope for this core)
//! can load them from JSON/TOML without the core depending on a
//! configuration-file crate.

pub mod cell;
pub mod dmrs;
pub mod flags;
pub mod pucch;
pub mod srs;

pub use cell::{CellConfig, CpKind, FrameStructure};
pub use dmrs::DmrsConfig;
pub use flags::ReceiverFlags;
pub use pucch::{PucchCellConfig, PucchFormat, PucchResourceConfig, PucchThresholds};
pub use srs::SrsConfig;
