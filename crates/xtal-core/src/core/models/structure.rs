use super::atom::Atom;
use super::chain::Chain;
use super::ids::{AtomId, ChainId, ModelId, ResidueId};
use super::model::Model;
use super::residue::Residue;
use crate::core::symmetry::unit_cell::UnitCell;
use slotmap::SlotMap;
use std::collections::HashMap;

/// A macromolecular structure: models, chains, residues and atoms plus crystal metadata.
///
/// Every record lives in a per-kind slot map owned by the structure. Parents keep the
/// ordered list of their children's IDs and every child stores the ID of its parent, so
/// navigation works in both directions without shared ownership. Child lists preserve
/// insertion order.
#[derive(Debug, Clone, Default)]
pub struct Structure {
    /// Unit cell parameters.
    pub cell: UnitCell,
    /// Hermann–Mauguin space-group symbol as given by the source file.
    pub sg_hm: String,
    /// Minimal metadata keyed by mmCIF tags: `_entry.id`, `_exptl.method`, ...
    info: HashMap<String, String>,
    models: SlotMap<ModelId, Model>,
    model_order: Vec<ModelId>,
    chains: SlotMap<ChainId, Chain>,
    residues: SlotMap<ResidueId, Residue>,
    atoms: SlotMap<AtomId, Atom>,
}

impl Structure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the metadata value for `tag`, or `default` when the tag is absent.
    pub fn get_info<'a>(&'a self, tag: &str, default: &'a str) -> &'a str {
        self.info.get(tag).map_or(default, String::as_str)
    }

    pub fn info(&self, tag: &str) -> Option<&str> {
        self.info.get(tag).map(String::as_str)
    }

    /// Sets a metadata value, replacing any previous value for the same tag.
    pub fn set_info(&mut self, tag: &str, value: &str) {
        self.info.insert(tag.to_string(), value.to_string());
    }

    pub fn info_iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.info.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Appends a new, empty model.
    pub fn add_model(&mut self, name: &str) -> ModelId {
        let id = self.models.insert(Model::new(name));
        self.model_order.push(id);
        id
    }

    /// Appends a chain to a model.
    ///
    /// # Return
    ///
    /// Returns `None` if the model does not exist.
    pub fn add_chain(&mut self, model_id: ModelId, mut chain: Chain) -> Option<ChainId> {
        let model = self.models.get_mut(model_id)?;
        chain.model_id = model_id;
        chain.residues.clear();
        let id = self.chains.insert(chain);
        model.chains.push(id);
        Some(id)
    }

    /// Appends a residue to a chain.
    ///
    /// # Return
    ///
    /// Returns `None` if the chain does not exist.
    pub fn add_residue(&mut self, chain_id: ChainId, mut residue: Residue) -> Option<ResidueId> {
        let chain = self.chains.get_mut(chain_id)?;
        residue.chain_id = chain_id;
        residue.atoms.clear();
        let id = self.residues.insert(residue);
        chain.residues.push(id);
        Some(id)
    }

    /// Appends an atom to a residue.
    ///
    /// # Return
    ///
    /// Returns `None` if the residue does not exist.
    pub fn add_atom(&mut self, residue_id: ResidueId, mut atom: Atom) -> Option<AtomId> {
        let residue = self.residues.get_mut(residue_id)?;
        atom.residue_id = residue_id;
        let id = self.atoms.insert(atom);
        residue.atoms.push(id);
        Some(id)
    }

    pub fn model(&self, id: ModelId) -> Option<&Model> {
        self.models.get(id)
    }

    pub fn model_mut(&mut self, id: ModelId) -> Option<&mut Model> {
        self.models.get_mut(id)
    }

    pub fn chain(&self, id: ChainId) -> Option<&Chain> {
        self.chains.get(id)
    }

    pub fn chain_mut(&mut self, id: ChainId) -> Option<&mut Chain> {
        self.chains.get_mut(id)
    }

    pub fn residue(&self, id: ResidueId) -> Option<&Residue> {
        self.residues.get(id)
    }

    pub fn residue_mut(&mut self, id: ResidueId) -> Option<&mut Residue> {
        self.residues.get_mut(id)
    }

    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn atom_mut(&mut self, id: AtomId) -> Option<&mut Atom> {
        self.atoms.get_mut(id)
    }

    /// Models in insertion order.
    pub fn models(&self) -> impl Iterator<Item = (ModelId, &Model)> {
        self.model_order.iter().map(|&id| (id, &self.models[id]))
    }

    /// Chains of a model in insertion order; empty if the model does not exist.
    pub fn chains(&self, model_id: ModelId) -> impl Iterator<Item = (ChainId, &Chain)> {
        self.models
            .get(model_id)
            .map(|m| m.chains.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|&id| (id, &self.chains[id]))
    }

    /// Residues of a chain in insertion order; empty if the chain does not exist.
    pub fn residues(&self, chain_id: ChainId) -> impl Iterator<Item = (ResidueId, &Residue)> {
        self.chains
            .get(chain_id)
            .map(|c| c.residues.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|&id| (id, &self.residues[id]))
    }

    /// Atoms of a residue in insertion order; empty if the residue does not exist.
    pub fn atoms(&self, residue_id: ResidueId) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.residues
            .get(residue_id)
            .map(|r| r.atoms.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|&id| (id, &self.atoms[id]))
    }

    /// Every atom of a model, walking chains and residues in order.
    pub fn model_atoms(&self, model_id: ModelId) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.chains(model_id)
            .flat_map(move |(chain_id, _)| self.residues(chain_id))
            .flat_map(move |(residue_id, _)| self.atoms(residue_id))
    }

    pub fn model_of(&self, chain_id: ChainId) -> Option<ModelId> {
        self.chains.get(chain_id).map(|c| c.model_id)
    }

    pub fn chain_of(&self, residue_id: ResidueId) -> Option<ChainId> {
        self.residues.get(residue_id).map(|r| r.chain_id)
    }

    pub fn residue_of(&self, atom_id: AtomId) -> Option<ResidueId> {
        self.atoms.get(atom_id).map(|a| a.residue_id)
    }

    pub fn find_model_by_name(&self, name: &str) -> Option<ModelId> {
        self.models().find(|(_, m)| m.name == name).map(|(id, _)| id)
    }

    pub fn find_chain_by_name(&self, model_id: ModelId, name: &str) -> Option<ChainId> {
        self.chains(model_id)
            .find(|(_, c)| c.name == name)
            .map(|(id, _)| id)
    }

    pub fn model_count(&self) -> usize {
        self.model_order.len()
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::chain::EntityType;
    use crate::core::models::element::Element;
    use nalgebra::Point3;

    struct TestRefs {
        model: ModelId,
        chain_a: ChainId,
        gly: ResidueId,
        ala: ResidueId,
        gly_n: AtomId,
        gly_ca: AtomId,
        ala_ca: AtomId,
    }

    fn create_standard_test_structure() -> (Structure, TestRefs) {
        let mut st = Structure::new();
        let model = st.add_model("1");
        let chain_a = st
            .add_chain(model, Chain::new("A").with_entity_type(EntityType::Polymer))
            .unwrap();
        let gly = st.add_residue(chain_a, Residue::new(1, "GLY")).unwrap();
        let ala = st
            .add_residue(chain_a, Residue::new(2, "ALA").with_auth_seq_id(12))
            .unwrap();
        let gly_n = st
            .add_atom(gly, Atom::new("N", Element::N, Point3::new(0.0, 0.0, 0.0)))
            .unwrap();
        let gly_ca = st
            .add_atom(gly, Atom::new("CA", Element::C, Point3::new(1.5, 0.0, 0.0)))
            .unwrap();
        let ala_ca = st
            .add_atom(ala, Atom::new("CA", Element::C, Point3::new(3.8, 0.0, 0.0)))
            .unwrap();
        (
            st,
            TestRefs {
                model,
                chain_a,
                gly,
                ala,
                gly_n,
                gly_ca,
                ala_ca,
            },
        )
    }

    #[test]
    fn get_info_returns_default_for_missing_tag() {
        let mut st = Structure::new();
        assert_eq!(st.get_info("_entry.id", "n/a"), "n/a");
        assert_eq!(st.info("_entry.id"), None);
        st.set_info("_entry.id", "1ABC");
        assert_eq!(st.get_info("_entry.id", "n/a"), "1ABC");
        st.set_info("_entry.id", "2XYZ");
        assert_eq!(st.get_info("_entry.id", ""), "2XYZ");
        assert_eq!(st.info_iter().count(), 1);
    }

    #[test]
    fn children_are_kept_in_insertion_order() {
        let (st, refs) = create_standard_test_structure();
        let residue_names: Vec<_> = st
            .residues(refs.chain_a)
            .map(|(_, r)| r.name.as_str())
            .collect();
        assert_eq!(residue_names, ["GLY", "ALA"]);
        let atom_ids: Vec<_> = st.atoms(refs.gly).map(|(id, _)| id).collect();
        assert_eq!(atom_ids, [refs.gly_n, refs.gly_ca]);
        let all: Vec<_> = st.model_atoms(refs.model).map(|(id, _)| id).collect();
        assert_eq!(all, [refs.gly_n, refs.gly_ca, refs.ala_ca]);
    }

    #[test]
    fn parent_links_point_to_owning_records() {
        let (st, refs) = create_standard_test_structure();
        assert_eq!(st.residue_of(refs.ala_ca), Some(refs.ala));
        assert_eq!(st.chain_of(refs.ala), Some(refs.chain_a));
        assert_eq!(st.model_of(refs.chain_a), Some(refs.model));
        assert_eq!(st.atom(refs.gly_ca).unwrap().residue_id(), refs.gly);
        assert_eq!(st.residue(refs.gly).unwrap().chain_id(), refs.chain_a);
        assert_eq!(st.chain(refs.chain_a).unwrap().model_id(), refs.model);
    }

    #[test]
    fn adding_to_missing_parent_returns_none() {
        let (mut st, refs) = create_standard_test_structure();
        assert!(st.add_chain(ModelId::default(), Chain::new("Z")).is_none());
        assert!(st.add_residue(ChainId::default(), Residue::new(1, "GLY")).is_none());
        assert!(
            st.add_atom(ResidueId::default(), Atom::new("O", Element::O, Point3::origin()))
                .is_none()
        );
        assert_eq!(st.atom_count(), 3);
        assert_eq!(st.residues(refs.chain_a).count(), 2);
    }

    #[test]
    fn lookups_by_name_find_records() {
        let (mut st, refs) = create_standard_test_structure();
        let second = st.add_model("2");
        assert_eq!(st.model_count(), 2);
        assert_eq!(st.find_model_by_name("2"), Some(second));
        assert_eq!(st.find_model_by_name("1"), Some(refs.model));
        assert_eq!(st.find_chain_by_name(refs.model, "A"), Some(refs.chain_a));
        assert_eq!(st.find_chain_by_name(second, "A"), None);
        let names: Vec<_> = st.models().map(|(_, m)| m.name.clone()).collect();
        assert_eq!(names, ["1", "2"]);
    }

    #[test]
    fn seq_id_for_pdb_is_available_through_structure() {
        let (st, refs) = create_standard_test_structure();
        assert_eq!(st.residue(refs.gly).unwrap().seq_id_for_pdb(), 1);
        assert_eq!(st.residue(refs.ala).unwrap().seq_id_for_pdb(), 12);
    }
}
