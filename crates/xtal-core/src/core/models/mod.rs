//! # Core Models Module
//!
//! Data structures for a macromolecular model: a [`structure::Structure`] owns models,
//! chains, residues and atoms in per-kind arenas and keeps every container in insertion
//! order, so the original file ordering survives until re-serialization.
//!
//! ## Key Components
//!
//! - [`atom`] - Atom records (name, altloc, charge, element, position, occupancy, B)
//! - [`residue`] - Residue records and the standard-name classification
//! - [`chain`] - Chain records and their entity type
//! - [`model`] - Model records
//! - [`structure`] - The owning arena with upward and downward navigation
//! - [`builder`] - Sequential construction used by file readers
//! - [`element`] - Chemical elements
//! - [`ids`] - Stable identifiers for every record kind
//!
//! ## Usage
//!
//! ```ignore
//! use nalgebra::Point3;
//! use xtal::core::models::{atom::Atom, chain::Chain, element::Element};
//! use xtal::core::models::{residue::Residue, structure::Structure};
//!
//! let mut st = Structure::new();
//! let model = st.add_model("1");
//! let chain = st.add_chain(model, Chain::new("A")).unwrap();
//! let residue = st.add_residue(chain, Residue::new(1, "ALA")).unwrap();
//! st.add_atom(residue, Atom::new("CA", Element::C, Point3::origin()));
//! ```

pub mod atom;
pub mod builder;
pub mod chain;
pub mod element;
pub mod ids;
pub mod model;
pub mod residue;
pub mod structure;
