//! Crystallographic symmetry: unit cells, symmetry operations, the space-group table and
//! the reciprocal-space asymmetric unit.

pub mod asu;
pub mod spacegroup;
pub mod symop;
pub mod unit_cell;
