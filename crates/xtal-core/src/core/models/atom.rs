use super::element::Element;
use super::ids::ResidueId;
use nalgebra::Point3;

/// Lowest and highest formal charge an atom record can carry.
pub const MIN_CHARGE: i8 = -8;
pub const MAX_CHARGE: i8 = 8;

/// A single atom of a macromolecular model.
///
/// The parent link is assigned by [`Structure`](super::structure::Structure) when the atom
/// is inserted into a residue; it is a plain identifier used for upward navigation only.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The name of the atom (e.g., "CA", "OG1").
    pub name: String,
    /// Alternate location indicator, `None` when the atom has a single conformation.
    pub altloc: Option<char>,
    charge: i8,
    /// Chemical element.
    pub element: Element,
    /// Cartesian coordinates in Angstroms.
    pub position: Point3<f64>,
    /// Occupancy in the range [0, 1].
    pub occupancy: f32,
    /// Isotropic atomic displacement parameter in square Angstroms.
    pub b_iso: f32,
    pub(crate) residue_id: ResidueId,
}

impl Atom {
    /// Creates a fully occupied, neutral atom with no alternate location and zero B.
    pub fn new(name: &str, element: Element, position: Point3<f64>) -> Self {
        Self {
            name: name.to_string(),
            altloc: None,
            charge: 0,
            element,
            position,
            occupancy: 1.0,
            b_iso: 0.0,
            residue_id: ResidueId::default(),
        }
    }

    pub fn charge(&self) -> i8 {
        self.charge
    }

    /// Sets the formal charge, clamped to [`MIN_CHARGE`]..=[`MAX_CHARGE`].
    pub fn set_charge(&mut self, charge: i32) {
        self.charge = charge.clamp(MIN_CHARGE as i32, MAX_CHARGE as i32) as i8;
    }

    pub fn with_charge(mut self, charge: i32) -> Self {
        self.set_charge(charge);
        self
    }

    /// The residue this atom belongs to. Null until the atom is added to a structure.
    pub fn residue_id(&self) -> ResidueId {
        self.residue_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::Key;

    #[test]
    fn new_atom_has_neutral_defaults() {
        let atom = Atom::new("CA", Element::C, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(atom.name, "CA");
        assert_eq!(atom.altloc, None);
        assert_eq!(atom.charge(), 0);
        assert_eq!(atom.occupancy, 1.0);
        assert_eq!(atom.b_iso, 0.0);
        assert_eq!(atom.position, Point3::new(1.0, 2.0, 3.0));
        assert!(atom.residue_id().is_null());
    }

    #[test]
    fn charge_is_clamped_to_allowed_range() {
        let mut atom = Atom::new("FE", Element::from_symbol("Fe"), Point3::origin());
        atom.set_charge(3);
        assert_eq!(atom.charge(), 3);
        atom.set_charge(12);
        assert_eq!(atom.charge(), MAX_CHARGE);
        atom.set_charge(-100);
        assert_eq!(atom.charge(), MIN_CHARGE);
    }
}
