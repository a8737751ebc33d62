use super::atom::Atom;
use super::chain::Chain;
use super::ids::{AtomId, ChainId, ModelId, ResidueId};
use super::residue::Residue;
use super::structure::Structure;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BuildError {
    #[error("Cannot start a chain before a model")]
    NoModel,
    #[error("Cannot start a residue before a chain")]
    NoChain,
    #[error("Cannot add an atom before a residue")]
    NoResidue,
}

/// Sequential construction of a [`Structure`], in the order records appear in a file.
///
/// The builder remembers the model, chain and residue most recently started; each new
/// record is appended to the current parent.
#[derive(Debug, Default)]
pub struct StructureBuilder {
    structure: Structure,
    current_model: Option<ModelId>,
    current_chain: Option<ChainId>,
    current_residue: Option<ResidueId>,
}

impl StructureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Access to structure-level fields (cell, space group, metadata) during reading.
    pub fn structure_mut(&mut self) -> &mut Structure {
        &mut self.structure
    }

    pub fn start_model(&mut self, name: &str) -> ModelId {
        let id = self.structure.add_model(name);
        self.current_model = Some(id);
        self.current_chain = None;
        self.current_residue = None;
        id
    }

    pub fn start_chain(&mut self, chain: Chain) -> Result<ChainId, BuildError> {
        let model_id = self.current_model.ok_or(BuildError::NoModel)?;
        let id = self
            .structure
            .add_chain(model_id, chain)
            .ok_or(BuildError::NoModel)?;
        self.current_chain = Some(id);
        self.current_residue = None;
        Ok(id)
    }

    /// Closes the current chain; the next residue needs a new chain.
    pub fn end_chain(&mut self) {
        self.current_chain = None;
        self.current_residue = None;
    }

    pub fn start_residue(&mut self, residue: Residue) -> Result<ResidueId, BuildError> {
        let chain_id = self.current_chain.ok_or(BuildError::NoChain)?;
        let id = self
            .structure
            .add_residue(chain_id, residue)
            .ok_or(BuildError::NoChain)?;
        self.current_residue = Some(id);
        Ok(id)
    }

    pub fn add_atom(&mut self, atom: Atom) -> Result<AtomId, BuildError> {
        let residue_id = self.current_residue.ok_or(BuildError::NoResidue)?;
        self.structure
            .add_atom(residue_id, atom)
            .ok_or(BuildError::NoResidue)
    }

    pub fn has_model(&self) -> bool {
        self.current_model.is_some()
    }

    pub fn current_chain(&self) -> Option<&Chain> {
        self.current_chain.and_then(|id| self.structure.chain(id))
    }

    pub fn current_residue(&self) -> Option<&Residue> {
        self.current_residue.and_then(|id| self.structure.residue(id))
    }

    /// Number of residues already in the current chain.
    pub fn current_chain_len(&self) -> usize {
        self.current_chain().map_or(0, |c| c.residues().len())
    }

    pub fn build(self) -> Structure {
        self.structure
    }
}
