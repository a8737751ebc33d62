use super::ids::{AtomId, ChainId};
use phf::{Set, phf_set};

/// Three-letter codes of the standard amino acids plus the ASX, GLX and UNK placeholders.
static STANDARD_AMINO_ACIDS: Set<&'static str> = phf_set! {
    "ALA", "ARG", "ASN", "ASP", "ASX", "CYS", "GLN", "GLU", "GLX", "GLY", "HIS", "ILE",
    "LEU", "LYS", "MET", "PHE", "PRO", "SER", "THR", "TRP", "TYR", "UNK", "VAL",
};

/// One-letter codes of the standard nucleotides.
const STANDARD_NUCLEOTIDES: &[u8] = b"ACGITU";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    /// Sequence number in the canonical (entity) numbering.
    pub seq_id: i32,
    /// Author-assigned sequence number, when the source file provides one.
    pub auth_seq_id: Option<i32>,
    /// PDB insertion code.
    pub ins_code: Option<char>,
    /// Residue name of at most three characters (e.g., "ALA", "DA", "HOH").
    pub name: String,
    pub(crate) atoms: Vec<AtomId>,
    pub(crate) chain_id: ChainId,
}

impl Residue {
    pub fn new(seq_id: i32, name: &str) -> Self {
        Self {
            seq_id,
            auth_seq_id: None,
            ins_code: None,
            name: name.to_string(),
            atoms: Vec::new(),
            chain_id: ChainId::default(),
        }
    }

    pub fn with_auth_seq_id(mut self, auth_seq_id: i32) -> Self {
        self.auth_seq_id = Some(auth_seq_id);
        self
    }

    pub fn with_ins_code(mut self, ins_code: char) -> Self {
        self.ins_code = Some(ins_code);
        self
    }

    /// Atoms of this residue in insertion order.
    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }

    /// The chain this residue belongs to. Null until the residue is added to a structure.
    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// The sequence number to print in PDB files: the author number when present.
    pub fn seq_id_for_pdb(&self) -> i32 {
        self.auth_seq_id.unwrap_or(self.seq_id)
    }

    /// Whether the name is a standard PDB residue name.
    ///
    /// Three-character names are checked against the standard amino acids (with ASX, GLX
    /// and UNK); one-character names against the nucleotides `A C G I T U`; two-character
    /// names must be `+` followed by one of those nucleotides.
    pub fn has_standard_pdb_name(&self) -> bool {
        match self.name.as_bytes() {
            [_, _, _] => STANDARD_AMINO_ACIDS.contains(self.name.as_str()),
            [base] => STANDARD_NUCLEOTIDES.contains(base),
            [b'+', base] => STANDARD_NUCLEOTIDES.contains(base),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AMINO_ACIDS: [&str; 23] = [
        "ALA", "ARG", "ASN", "ASP", "ASX", "CYS", "GLN", "GLU", "GLX", "GLY", "HIS", "ILE", "LEU",
        "LYS", "MET", "PHE", "PRO", "SER", "THR", "TRP", "TYR", "UNK", "VAL",
    ];

    fn named(name: &str) -> Residue {
        Residue::new(1, name)
    }

    #[test]
    fn new_residue_initializes_fields_correctly() {
        let residue = Residue::new(10, "GLY");
        assert_eq!(residue.seq_id, 10);
        assert_eq!(residue.name, "GLY");
        assert_eq!(residue.auth_seq_id, None);
        assert_eq!(residue.ins_code, None);
        assert!(residue.atoms().is_empty());
    }

    #[test]
    fn every_standard_amino_acid_is_recognized() {
        for name in AMINO_ACIDS {
            assert!(named(name).has_standard_pdb_name(), "{name} should be standard");
        }
    }

    #[test]
    fn other_three_letter_names_are_rejected() {
        for name in ["HOH", "MSE", "SEP", "ala", "DA ", "XYZ", "UNL"] {
            assert!(!named(name).has_standard_pdb_name(), "{name} should not be standard");
        }
    }

    #[test]
    fn one_letter_nucleotides_are_recognized() {
        for name in ["A", "C", "G", "I", "T", "U"] {
            assert!(named(name).has_standard_pdb_name());
        }
        for name in ["N", "X", "a", "+"] {
            assert!(!named(name).has_standard_pdb_name());
        }
    }

    #[test]
    fn plus_prefixed_modified_nucleotides_are_recognized() {
        for name in ["+A", "+C", "+G", "+I", "+T", "+U"] {
            assert!(named(name).has_standard_pdb_name());
        }
        for name in ["DA", "+N", "A+", "++", "+a"] {
            assert!(!named(name).has_standard_pdb_name());
        }
    }

    #[test]
    fn empty_and_long_names_are_rejected() {
        assert!(!named("").has_standard_pdb_name());
        assert!(!named("ALAA").has_standard_pdb_name());
    }

    #[test]
    fn seq_id_for_pdb_prefers_author_numbering() {
        let residue = Residue::new(5, "SER");
        assert_eq!(residue.seq_id_for_pdb(), 5);
        let residue = residue.with_auth_seq_id(105);
        assert_eq!(residue.seq_id_for_pdb(), 105);
        let residue = Residue::new(7, "THR").with_auth_seq_id(-3);
        assert_eq!(residue.seq_id_for_pdb(), -3);
    }
}
