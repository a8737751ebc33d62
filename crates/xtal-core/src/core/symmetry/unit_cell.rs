use nalgebra::{Matrix3, Point3, Vector3};

/// Unit cell parameters: edge lengths in Angstroms and angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitCell {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl Default for UnitCell {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 1.0,
            c: 1.0,
            alpha: 90.0,
            beta: 90.0,
            gamma: 90.0,
        }
    }
}

impl UnitCell {
    pub fn new(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        Self {
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
        }
    }

    pub fn from_array(p: [f64; 6]) -> Self {
        Self::new(p[0], p[1], p[2], p[3], p[4], p[5])
    }

    pub fn to_array(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.alpha, self.beta, self.gamma]
    }

    /// `false` for the placeholder 1 x 1 x 1 cell used when no crystal information exists.
    pub fn is_crystal(&self) -> bool {
        self.a != 1.0 || self.b != 1.0 || self.c != 1.0
    }

    fn cosines(&self) -> (f64, f64, f64) {
        (
            self.alpha.to_radians().cos(),
            self.beta.to_radians().cos(),
            self.gamma.to_radians().cos(),
        )
    }

    /// Cell volume in cubic Angstroms.
    pub fn volume(&self) -> f64 {
        let (ca, cb, cg) = self.cosines();
        let factor = 1.0 - ca * ca - cb * cb - cg * cg + 2.0 * ca * cb * cg;
        self.a * self.b * self.c * factor.max(0.0).sqrt()
    }

    /// Matrix turning fractional into Cartesian coordinates (PDB convention: `a` along X,
    /// `b` in the XY plane).
    pub fn orthogonalization_matrix(&self) -> Matrix3<f64> {
        let (ca, cb, cg) = self.cosines();
        let sg = self.gamma.to_radians().sin();
        let v = self.volume();
        Matrix3::new(
            self.a,
            self.b * cg,
            self.c * cb,
            0.0,
            self.b * sg,
            self.c * (ca - cb * cg) / sg,
            0.0,
            0.0,
            v / (self.a * self.b * sg),
        )
    }

    /// Inverse of [`orthogonalization_matrix`](Self::orthogonalization_matrix); `None` for a
    /// degenerate cell.
    pub fn fractionalization_matrix(&self) -> Option<Matrix3<f64>> {
        self.orthogonalization_matrix().try_inverse()
    }

    pub fn orthogonalize(&self, fractional: &Vector3<f64>) -> Point3<f64> {
        Point3::from(self.orthogonalization_matrix() * fractional)
    }

    pub fn fractionalize(&self, position: &Point3<f64>) -> Option<Vector3<f64>> {
        self.fractionalization_matrix().map(|m| m * position.coords)
    }

    /// Reciprocal cell parameters (a*, b*, c*, cos α*, cos β*, cos γ*).
    fn reciprocal(&self) -> [f64; 6] {
        let (ca, cb, cg) = self.cosines();
        let sa = self.alpha.to_radians().sin();
        let sb = self.beta.to_radians().sin();
        let sg = self.gamma.to_radians().sin();
        let v = self.volume();
        [
            self.b * self.c * sa / v,
            self.a * self.c * sb / v,
            self.a * self.b * sg / v,
            (cb * cg - ca) / (sb * sg),
            (ca * cg - cb) / (sa * sg),
            (ca * cb - cg) / (sa * sb),
        ]
    }

    /// 1/d² of reflection (h, k, l), in inverse square Angstroms.
    pub fn calculate_1_d2(&self, h: i32, k: i32, l: i32) -> f64 {
        let [ar, br, cr, car, cbr, cgr] = self.reciprocal();
        let (h, k, l) = (h as f64, k as f64, l as f64);
        h * h * ar * ar
            + k * k * br * br
            + l * l * cr * cr
            + 2.0 * k * l * br * cr * car
            + 2.0 * h * l * ar * cr * cbr
            + 2.0 * h * k * ar * br * cgr
    }

    /// Resolution d of reflection (h, k, l) in Angstroms.
    pub fn calculate_d(&self, h: i32, k: i32, l: i32) -> f64 {
        1.0 / self.calculate_1_d2(h, k, l).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn default_cell_is_not_a_crystal() {
        assert!(!UnitCell::default().is_crystal());
        assert!(UnitCell::new(10.0, 20.0, 30.0, 90.0, 90.0, 90.0).is_crystal());
    }

    #[test]
    fn orthorhombic_volume_and_resolution() {
        let cell = UnitCell::new(10.0, 20.0, 40.0, 90.0, 90.0, 90.0);
        assert!((cell.volume() - 8000.0).abs() < 1e-6);
        assert!((cell.calculate_1_d2(1, 0, 0) - 0.01).abs() < EPS);
        assert!((cell.calculate_1_d2(0, 2, 0) - 0.01).abs() < EPS);
        assert!((cell.calculate_1_d2(1, 1, 1) - (0.01 + 0.0025 + 0.000625)).abs() < EPS);
        assert!((cell.calculate_d(0, 0, 4) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn hexagonal_cell_resolution_matches_closed_form() {
        // 1/d² = 4/3 (h² + hk + k²)/a² + l²/c²
        let cell = UnitCell::new(50.0, 50.0, 80.0, 90.0, 90.0, 120.0);
        let expected = 4.0 / 3.0 * (4.0 + 2.0 + 1.0) / 2500.0 + 9.0 / 6400.0;
        assert!((cell.calculate_1_d2(2, 1, 3) - expected).abs() < 1e-12);
        let expected_vol = 50.0 * 50.0 * 80.0 * (3.0f64).sqrt() / 2.0;
        assert!((cell.volume() - expected_vol).abs() < 1e-6);
    }

    #[test]
    fn monoclinic_resolution_matches_closed_form() {
        // 1/d² = (h²/a² + k² sin²β/b² + l²/c² - 2hl cosβ/(ac)) / sin²β
        let cell = UnitCell::new(30.0, 40.0, 50.0, 90.0, 105.0, 90.0);
        let (h, k, l) = (2.0, 3.0, -1.0);
        let beta = 105.0f64.to_radians();
        let s2 = beta.sin().powi(2);
        let expected = (h * h / 900.0 + k * k * s2 / 1600.0 + l * l / 2500.0
            - 2.0 * h * l * beta.cos() / (30.0 * 50.0))
            / s2;
        assert!((cell.calculate_1_d2(2, 3, -1) - expected).abs() < 1e-12);
    }

    #[test]
    fn fractionalize_inverts_orthogonalize() {
        let cell = UnitCell::new(31.0, 42.0, 55.0, 80.0, 95.0, 110.0);
        let frac = Vector3::new(0.25, -0.5, 0.75);
        let cart = cell.orthogonalize(&frac);
        let back = cell.fractionalize(&cart).unwrap();
        assert!((back - frac).norm() < 1e-12);
        let a_axis = cell.orthogonalize(&Vector3::new(1.0, 0.0, 0.0));
        assert!((a_axis.coords - Vector3::new(31.0, 0.0, 0.0)).norm() < 1e-12);
    }
}
