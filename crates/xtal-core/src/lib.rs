//! # xtal Core Library
//!
//! Macromolecular model records, crystallographic grids and reflection files, and the
//! conversion of an electron-density map into map coefficients.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer layout:
//!
//! - **[`core`]: The Foundation.** Plain data models (`Structure`), crystallographic
//!   symmetry, real and reciprocal grids with the Fourier transform between them, and the
//!   readers/writers for CCP4 maps, MTZ reflection files and PDB coordinates.
//!
//! - **[`engine`]: Shared Machinery.** Configuration, error types and progress reporting
//!   used by the workflows.
//!
//! - **[`workflows`]: The Public API.** Complete procedures built from the two layers
//!   above, such as the map-to-structure-factor conversion behind the `map2sf` tool.

pub mod core;
pub mod engine;
pub mod workflows;
