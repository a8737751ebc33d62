use super::symop::{SymOp, SymmetryError};
use phf::{Map, phf_map};
use std::fmt;

/// Laue classes, the point groups of diffraction intensities including Friedel symmetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaueClass {
    L1bar,
    L2m,
    Lmmm,
    L4m,
    L4mmm,
    L3bar,
    /// -3m with the two-fold axes along a, b and a+b (point group 321).
    L3barm1,
    /// -3m with the two-fold axes along a-b (point group 312).
    L3bar1m,
    L6m,
    L6mmm,
    Lm3bar,
    Lm3barm,
}

impl fmt::Display for LaueClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LaueClass::L1bar => "-1",
            LaueClass::L2m => "2/m",
            LaueClass::Lmmm => "mmm",
            LaueClass::L4m => "4/m",
            LaueClass::L4mmm => "4/mmm",
            LaueClass::L3bar => "-3",
            LaueClass::L3barm1 => "-3m1",
            LaueClass::L3bar1m => "-31m",
            LaueClass::L6m => "6/m",
            LaueClass::L6mmm => "6/mmm",
            LaueClass::Lm3bar => "m-3",
            LaueClass::Lm3barm => "m-3m",
        })
    }
}

/// One entry of the space-group table.
///
/// The full list of operations is generated from a few generators and the lattice
/// centering, so the table stays small and every group is closed by construction.
#[derive(Debug, PartialEq, Eq)]
pub struct SpaceGroup {
    /// International Tables number.
    pub number: u16,
    /// Full Hermann–Mauguin symbol as written by CCP4 (e.g. `P 1 21 1`, `H 3`).
    pub hm: &'static str,
    /// Point group symbol in the form used by MTZ `SYMINF` records.
    pub point_group: &'static str,
    generators: &'static [&'static str],
}

const C_CENTERING: &[[i32; 3]] = &[[12, 12, 0]];
const I_CENTERING: &[[i32; 3]] = &[[12, 12, 12]];
const F_CENTERING: &[[i32; 3]] = &[[0, 12, 12], [12, 0, 12], [12, 12, 0]];
const R_CENTERING: &[[i32; 3]] = &[[16, 8, 8], [8, 16, 16]];

macro_rules! sg {
    ($number:expr, $hm:expr, $pg:expr, [$($gen:expr),* $(,)?]) => {
        SpaceGroup {
            number: $number,
            hm: $hm,
            point_group: $pg,
            generators: &[$($gen),*],
        }
    };
}

static SPACE_GROUPS: &[SpaceGroup] = &[
    sg!(1, "P 1", "1", []),
    sg!(2, "P -1", "-1", ["-x,-y,-z"]),
    sg!(3, "P 1 2 1", "2", ["-x,y,-z"]),
    sg!(4, "P 1 21 1", "2", ["-x,y+1/2,-z"]),
    sg!(5, "C 1 2 1", "2", ["-x,y,-z"]),
    sg!(6, "P 1 m 1", "m", ["x,-y,z"]),
    sg!(7, "P 1 c 1", "m", ["x,-y,z+1/2"]),
    sg!(8, "C 1 m 1", "m", ["x,-y,z"]),
    sg!(9, "C 1 c 1", "m", ["x,-y,z+1/2"]),
    sg!(10, "P 1 2/m 1", "2/m", ["-x,y,-z", "-x,-y,-z"]),
    sg!(11, "P 1 21/m 1", "2/m", ["-x,y+1/2,-z", "-x,-y,-z"]),
    sg!(12, "C 1 2/m 1", "2/m", ["-x,y,-z", "-x,-y,-z"]),
    sg!(13, "P 1 2/c 1", "2/m", ["-x,y,-z+1/2", "-x,-y,-z"]),
    sg!(14, "P 1 21/c 1", "2/m", ["-x,y+1/2,-z+1/2", "-x,-y,-z"]),
    sg!(15, "C 1 2/c 1", "2/m", ["-x,y,-z+1/2", "-x,-y,-z"]),
    sg!(16, "P 2 2 2", "222", ["-x,-y,z", "-x,y,-z"]),
    sg!(17, "P 2 2 21", "222", ["-x,-y,z+1/2", "-x,y,-z+1/2"]),
    sg!(18, "P 21 21 2", "222", ["-x,-y,z", "-x+1/2,y+1/2,-z"]),
    sg!(19, "P 21 21 21", "222", ["-x+1/2,-y,z+1/2", "-x,y+1/2,-z+1/2"]),
    sg!(20, "C 2 2 21", "222", ["-x,-y,z+1/2", "-x,y,-z+1/2"]),
    sg!(21, "C 2 2 2", "222", ["-x,-y,z", "-x,y,-z"]),
    sg!(22, "F 2 2 2", "222", ["-x,-y,z", "-x,y,-z"]),
    sg!(23, "I 2 2 2", "222", ["-x,-y,z", "-x,y,-z"]),
    sg!(24, "I 21 21 21", "222", ["-x+1/2,-y,z+1/2", "-x,y+1/2,-z+1/2"]),
    sg!(47, "P m m m", "mmm", ["-x,-y,z", "-x,y,-z", "-x,-y,-z"]),
    sg!(61, "P b c a", "mmm", ["-x+1/2,-y,z+1/2", "-x,y+1/2,-z+1/2", "-x,-y,-z"]),
    sg!(62, "P n m a", "mmm", ["-x+1/2,-y,z+1/2", "-x,y+1/2,-z", "-x,-y,-z"]),
    sg!(63, "C m c m", "mmm", ["-x,-y,z+1/2", "-x,y,-z+1/2", "-x,-y,-z"]),
    sg!(65, "C m m m", "mmm", ["-x,-y,z", "-x,y,-z", "-x,-y,-z"]),
    sg!(69, "F m m m", "mmm", ["-x,-y,z", "-x,y,-z", "-x,-y,-z"]),
    sg!(71, "I m m m", "mmm", ["-x,-y,z", "-x,y,-z", "-x,-y,-z"]),
    sg!(75, "P 4", "4", ["-y,x,z"]),
    sg!(76, "P 41", "4", ["-y,x,z+1/4"]),
    sg!(77, "P 42", "4", ["-y,x,z+1/2"]),
    sg!(78, "P 43", "4", ["-y,x,z+3/4"]),
    sg!(79, "I 4", "4", ["-y,x,z"]),
    sg!(80, "I 41", "4", ["-y,x+1/2,z+1/4"]),
    sg!(83, "P 4/m", "4/m", ["-y,x,z", "-x,-y,-z"]),
    sg!(87, "I 4/m", "4/m", ["-y,x,z", "-x,-y,-z"]),
    sg!(89, "P 4 2 2", "422", ["-y,x,z", "-x,y,-z"]),
    sg!(90, "P 4 21 2", "422", ["-y+1/2,x+1/2,z", "-x+1/2,y+1/2,-z"]),
    sg!(91, "P 41 2 2", "422", ["-y,x,z+1/4", "-x,y,-z"]),
    sg!(92, "P 41 21 2", "422", ["-y+1/2,x+1/2,z+1/4", "-x+1/2,y+1/2,-z+1/4"]),
    sg!(93, "P 42 2 2", "422", ["-y,x,z+1/2", "-x,y,-z"]),
    sg!(94, "P 42 21 2", "422", ["-y+1/2,x+1/2,z+1/2", "-x+1/2,y+1/2,-z+1/2"]),
    sg!(95, "P 43 2 2", "422", ["-y,x,z+3/4", "-x,y,-z"]),
    sg!(96, "P 43 21 2", "422", ["-y+1/2,x+1/2,z+3/4", "-x+1/2,y+1/2,-z+3/4"]),
    sg!(97, "I 4 2 2", "422", ["-y,x,z", "-x,y,-z"]),
    sg!(98, "I 41 2 2", "422", ["-y,x+1/2,z+1/4", "-x+1/2,y,-z+3/4"]),
    sg!(123, "P 4/m m m", "4/mmm", ["-y,x,z", "-x,y,-z", "-x,-y,-z"]),
    sg!(139, "I 4/m m m", "4/mmm", ["-y,x,z", "-x,y,-z", "-x,-y,-z"]),
    sg!(143, "P 3", "3", ["-y,x-y,z"]),
    sg!(144, "P 31", "3", ["-y,x-y,z+1/3"]),
    sg!(145, "P 32", "3", ["-y,x-y,z+2/3"]),
    sg!(146, "H 3", "3", ["-y,x-y,z"]),
    sg!(147, "P -3", "-3", ["-y,x-y,z", "-x,-y,-z"]),
    sg!(148, "H -3", "-3", ["-y,x-y,z", "-x,-y,-z"]),
    sg!(149, "P 3 1 2", "312", ["-y,x-y,z", "-y,-x,-z"]),
    sg!(150, "P 3 2 1", "321", ["-y,x-y,z", "y,x,-z"]),
    sg!(151, "P 31 1 2", "312", ["-y,x-y,z+1/3", "-y,-x,-z+2/3"]),
    sg!(152, "P 31 2 1", "321", ["-y,x-y,z+1/3", "y,x,-z"]),
    sg!(153, "P 32 1 2", "312", ["-y,x-y,z+2/3", "-y,-x,-z+1/3"]),
    sg!(154, "P 32 2 1", "321", ["-y,x-y,z+2/3", "y,x,-z"]),
    sg!(155, "H 3 2", "32", ["-y,x-y,z", "y,x,-z"]),
    sg!(162, "P -3 1 m", "-31m", ["-y,x-y,z", "-y,-x,-z", "-x,-y,-z"]),
    sg!(164, "P -3 m 1", "-3m1", ["-y,x-y,z", "y,x,-z", "-x,-y,-z"]),
    sg!(166, "H -3 m", "-3m", ["-y,x-y,z", "y,x,-z", "-x,-y,-z"]),
    sg!(168, "P 6", "6", ["x-y,x,z"]),
    sg!(169, "P 61", "6", ["x-y,x,z+1/6"]),
    sg!(170, "P 65", "6", ["x-y,x,z+5/6"]),
    sg!(171, "P 62", "6", ["x-y,x,z+1/3"]),
    sg!(172, "P 64", "6", ["x-y,x,z+2/3"]),
    sg!(173, "P 63", "6", ["x-y,x,z+1/2"]),
    sg!(175, "P 6/m", "6/m", ["x-y,x,z", "-x,-y,-z"]),
    sg!(177, "P 6 2 2", "622", ["x-y,x,z", "y,x,-z"]),
    sg!(178, "P 61 2 2", "622", ["x-y,x,z+1/6", "y,x,-z+1/3"]),
    sg!(179, "P 65 2 2", "622", ["x-y,x,z+5/6", "y,x,-z+2/3"]),
    sg!(180, "P 62 2 2", "622", ["x-y,x,z+1/3", "y,x,-z+2/3"]),
    sg!(181, "P 64 2 2", "622", ["x-y,x,z+2/3", "y,x,-z+1/3"]),
    sg!(182, "P 63 2 2", "622", ["x-y,x,z+1/2", "y,x,-z"]),
    sg!(191, "P 6/m m m", "6/mmm", ["x-y,x,z", "y,x,-z", "-x,-y,-z"]),
    sg!(195, "P 2 3", "23", ["-x,-y,z", "-x,y,-z", "z,x,y"]),
    sg!(196, "F 2 3", "23", ["-x,-y,z", "-x,y,-z", "z,x,y"]),
    sg!(197, "I 2 3", "23", ["-x,-y,z", "-x,y,-z", "z,x,y"]),
    sg!(198, "P 21 3", "23", ["-x+1/2,-y,z+1/2", "-x,y+1/2,-z+1/2", "z,x,y"]),
    sg!(199, "I 21 3", "23", ["-x+1/2,-y,z+1/2", "-x,y+1/2,-z+1/2", "z,x,y"]),
    sg!(200, "P m -3", "m-3", ["-x,-y,z", "-x,y,-z", "z,x,y", "-x,-y,-z"]),
    sg!(202, "F m -3", "m-3", ["-x,-y,z", "-x,y,-z", "z,x,y", "-x,-y,-z"]),
    sg!(204, "I m -3", "m-3", ["-x,-y,z", "-x,y,-z", "z,x,y", "-x,-y,-z"]),
    sg!(207, "P 4 3 2", "432", ["-x,-y,z", "-x,y,-z", "z,x,y", "y,x,-z"]),
    sg!(208, "P 42 3 2", "432", ["-x,-y,z", "-x,y,-z", "z,x,y", "y+1/2,x+1/2,-z+1/2"]),
    sg!(209, "F 4 3 2", "432", ["-x,-y,z", "-x,y,-z", "z,x,y", "y,x,-z"]),
    sg!(210, "F 41 3 2", "432", ["-x,-y+1/2,z+1/2", "-x+1/2,y+1/2,-z", "z,x,y", "y+3/4,x+1/4,-z+3/4"]),
    sg!(211, "I 4 3 2", "432", ["-x,-y,z", "-x,y,-z", "z,x,y", "y,x,-z"]),
    sg!(212, "P 43 3 2", "432", ["-x+1/2,-y,z+1/2", "-x,y+1/2,-z+1/2", "z,x,y", "y+1/4,x+3/4,-z+3/4"]),
    sg!(213, "P 41 3 2", "432", ["-x+1/2,-y,z+1/2", "-x,y+1/2,-z+1/2", "z,x,y", "y+3/4,x+1/4,-z+1/4"]),
    sg!(214, "I 41 3 2", "432", ["-x+1/2,-y,z+1/2", "-x,y+1/2,-z+1/2", "z,x,y", "y+3/4,x+1/4,-z+1/4"]),
    sg!(221, "P m -3 m", "m-3m", ["-x,-y,z", "-x,y,-z", "z,x,y", "y,x,-z", "-x,-y,-z"]),
    sg!(225, "F m -3 m", "m-3m", ["-x,-y,z", "-x,y,-z", "z,x,y", "y,x,-z", "-x,-y,-z"]),
    sg!(229, "I m -3 m", "m-3m", ["-x,-y,z", "-x,y,-z", "z,x,y", "y,x,-z", "-x,-y,-z"]),
];

/// Short and alternative symbols, keyed by the upper-case symbol without spaces.
static ALIASES: Map<&'static str, u16> = phf_map! {
    "P2" => 3, "P21" => 4, "C2" => 5, "A2" => 5, "I2" => 5,
    "R3" => 146, "R3:H" => 146, "H3" => 146,
    "R32" => 155, "R32:H" => 155, "H32" => 155,
    "PM" => 6, "PC" => 7, "CM" => 8, "CC" => 9,
    "P2/M" => 10, "P21/M" => 11, "C2/M" => 12, "P2/C" => 13, "P21/C" => 14, "C2/C" => 15,
    "R-3" => 148, "R-3:H" => 148, "H-3" => 148,
    "R-3M" => 166, "R-3M:H" => 166, "H-3M" => 166,
    "PMMM" => 47, "PBCA" => 61, "PNMA" => 62, "CMCM" => 63, "CMMM" => 65, "FMMM" => 69, "IMMM" => 71,
    "P222" => 16, "P2221" => 17, "P21212" => 18, "P212121" => 19,
    "C2221" => 20, "C222" => 21, "F222" => 22, "I222" => 23, "I212121" => 24,
};

impl SpaceGroup {
    /// Looks up a space group by its International Tables number.
    pub fn find_by_number(number: i32) -> Option<&'static SpaceGroup> {
        SPACE_GROUPS.iter().find(|sg| sg.number as i32 == number)
    }

    /// Looks up a space group by Hermann–Mauguin symbol, ignoring case and spaces.
    ///
    /// Full symbols (`P 1 21 1`) and common short forms (`P21`, `C2`, `R3`) are accepted.
    pub fn find_by_name(name: &str) -> Option<&'static SpaceGroup> {
        let key: String = name
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();
        if key.is_empty() {
            return None;
        }
        if let Some(&number) = ALIASES.get(key.as_str()) {
            return Self::find_by_number(number as i32);
        }
        SPACE_GROUPS.iter().find(|sg| {
            sg.hm
                .chars()
                .filter(|c| !c.is_whitespace())
                .eq(key.chars())
        })
    }

    /// Same as [`find_by_name`](Self::find_by_name) but with an error for unknown symbols.
    pub fn from_name(name: &str) -> Result<&'static SpaceGroup, SymmetryError> {
        Self::find_by_name(name).ok_or_else(|| SymmetryError::UnknownSpaceGroup(name.to_string()))
    }

    pub fn p1() -> &'static SpaceGroup {
        &SPACE_GROUPS[0]
    }

    pub fn all() -> &'static [SpaceGroup] {
        SPACE_GROUPS
    }

    /// Lattice centering letter (P, C, I, F or H).
    pub fn lattice(&self) -> char {
        self.hm.chars().next().unwrap_or('P')
    }

    fn centering_vectors(&self) -> &'static [[i32; 3]] {
        match self.lattice() {
            'C' => C_CENTERING,
            'I' => I_CENTERING,
            'F' => F_CENTERING,
            'H' | 'R' => R_CENTERING,
            _ => &[],
        }
    }

    /// True when the group contains an inversion, at the origin or elsewhere.
    pub fn is_centrosymmetric(&self) -> bool {
        let inversion = [[-1, 0, 0], [0, -1, 0], [0, 0, -1]];
        self.primitive_operations()
            .iter()
            .any(|op| op.rot == inversion)
    }

    pub fn laue_class(&self) -> LaueClass {
        match self.point_group {
            "1" | "-1" => LaueClass::L1bar,
            "2" | "m" | "2/m" => LaueClass::L2m,
            "222" | "mmm" => LaueClass::Lmmm,
            "4" | "4/m" => LaueClass::L4m,
            "422" | "4/mmm" => LaueClass::L4mmm,
            "3" | "-3" => LaueClass::L3bar,
            "321" | "32" | "-3m1" | "-3m" => LaueClass::L3barm1,
            "312" | "-31m" => LaueClass::L3bar1m,
            "6" | "6/m" => LaueClass::L6m,
            "622" | "6/mmm" => LaueClass::L6mmm,
            "23" | "m-3" => LaueClass::Lm3bar,
            _ => LaueClass::Lm3barm,
        }
    }

    /// Symmetry operations without the centering translations, identity first.
    pub fn primitive_operations(&self) -> Vec<SymOp> {
        let generators: Vec<SymOp> = self
            .generators
            .iter()
            .filter_map(|g| SymOp::parse(g).ok())
            .collect();
        let mut ops = vec![SymOp::identity()];
        let mut i = 0;
        while i < ops.len() {
            for g in &generators {
                let product = ops[i].combine(g);
                let known = ops
                    .iter()
                    .any(|op| op.rot == product.rot && self.same_modulo_centering(op, &product));
                if !known {
                    ops.push(product);
                }
            }
            i += 1;
        }
        ops
    }

    /// All symmetry operations of the group, including centering translations.
    pub fn operations(&self) -> Vec<SymOp> {
        let primitive = self.primitive_operations();
        let mut ops = primitive.clone();
        for shift in self.centering_vectors() {
            ops.extend(primitive.iter().map(|op| op.translated(*shift)));
        }
        ops
    }

    fn same_modulo_centering(&self, a: &SymOp, b: &SymOp) -> bool {
        if a.tran == b.tran {
            return true;
        }
        self.centering_vectors()
            .iter()
            .any(|c| a.translated(*c).tran == b.tran)
    }
}

impl fmt::Display for SpaceGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hm)
    }
}
