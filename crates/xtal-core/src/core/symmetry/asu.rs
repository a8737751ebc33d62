use super::spacegroup::{LaueClass, SpaceGroup};

/// Reciprocal-space asymmetric unit of a space group.
///
/// Friedel pairs are treated as equivalent, so the conditions depend only on the
/// Laue class. Exactly one member of each symmetry orbit of non-zero Miller
/// indices satisfies [`is_in`](Self::is_in).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReciprocalAsu {
    laue: LaueClass,
}

impl ReciprocalAsu {
    pub fn new(sg: &SpaceGroup) -> Self {
        Self {
            laue: sg.laue_class(),
        }
    }

    pub fn laue_class(&self) -> LaueClass {
        self.laue
    }

    pub fn is_in(&self, [h, k, l]: [i32; 3]) -> bool {
        match self.laue {
            LaueClass::L1bar => l > 0 || (l == 0 && (h > 0 || (h == 0 && k >= 0))),
            LaueClass::L2m => k >= 0 && (l > 0 || (l == 0 && h >= 0)),
            LaueClass::Lmmm => h >= 0 && k >= 0 && l >= 0,
            LaueClass::L4m | LaueClass::L6m => {
                l >= 0 && ((h >= 0 && k > 0) || (h == 0 && k == 0))
            }
            LaueClass::L4mmm | LaueClass::L6mmm => h >= k && k >= 0 && l >= 0,
            LaueClass::L3bar => (h >= 0 && k > 0) || (h == 0 && k == 0 && l >= 0),
            LaueClass::L3barm1 => h >= k && k >= 0 && (h > k || l >= 0),
            LaueClass::L3bar1m => h >= k && k >= 0 && (k > 0 || l >= 0),
            LaueClass::Lm3bar => h >= 0 && ((l >= h && k > h) || (l == h && k == h)),
            LaueClass::Lm3barm => k >= l && l >= h && h >= 0,
        }
    }
}
