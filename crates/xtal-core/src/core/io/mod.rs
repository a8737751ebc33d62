//! Readers and writers for coordinate, map and reflection files.

pub mod ccp4;
pub mod gz;
pub mod mtz;
pub mod pdb;
pub mod traits;
