//! # Core Module
//!
//! Fundamental building blocks of the library.
//!
//! - **Structural Records** ([`models`]) - Structures, models, chains, residues and atoms
//! - **Crystallographic Symmetry** ([`symmetry`]) - Unit cells, symmetry operations,
//!   space groups and the reciprocal asymmetric unit
//! - **Grids** ([`grid`]) - Real-space density grids, reciprocal grids and the Fourier
//!   transform between them
//! - **File I/O** ([`io`]) - CCP4 maps, MTZ reflection files, PDB coordinates and
//!   transparent gzip input

pub mod grid;
pub mod io;
pub mod models;
pub mod symmetry;
