//! Density grids on the unit cell and their Fourier transforms.

pub mod fourier;
pub mod real;

pub use fourier::{ReciprocalGrid, phase_in_angles, transform_map_to_f_phi};
pub use real::{Grid, GridError};
