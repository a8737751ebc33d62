use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Denominator of symmetry-operation translations: every translation is stored as an
/// integer number of 1/24ths of a cell edge.
pub const DEN: i32 = 24;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SymmetryError {
    #[error("Cannot parse symmetry operation '{triplet}': {reason}")]
    InvalidTriplet { triplet: String, reason: String },
    #[error("Unknown or unsupported space group: {0}")]
    UnknownSpaceGroup(String),
}

/// A crystallographic symmetry operation acting on fractional coordinates:
/// `x' = R x + t / DEN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymOp {
    pub rot: [[i32; 3]; 3],
    pub tran: [i32; 3],
}

impl SymOp {
    pub const fn identity() -> Self {
        Self {
            rot: [[1, 0, 0], [0, 1, 0], [0, 0, 1]],
            tran: [0, 0, 0],
        }
    }

    /// Parses a coordinate triplet such as `-x+1/2,y,-z+3/4` (case-insensitive).
    pub fn parse(triplet: &str) -> Result<Self, SymmetryError> {
        let fail = |reason: &str| SymmetryError::InvalidTriplet {
            triplet: triplet.to_string(),
            reason: reason.to_string(),
        };
        let parts: Vec<&str> = triplet.split(',').collect();
        if parts.len() != 3 {
            return Err(fail("expected three comma-separated expressions"));
        }
        let mut op = SymOp {
            rot: [[0; 3]; 3],
            tran: [0; 3],
        };
        for (row, expr) in parts.iter().enumerate() {
            let (coeffs, tran) = parse_expr(expr).map_err(|reason| fail(&reason))?;
            op.rot[row] = coeffs;
            op.tran[row] = tran;
        }
        Ok(op.wrapped())
    }

    /// Translations reduced to the range [0, DEN).
    pub fn wrapped(mut self) -> Self {
        for t in &mut self.tran {
            *t = t.rem_euclid(DEN);
        }
        self
    }

    /// The operation `self ∘ other` (apply `other` first), translations wrapped into the cell.
    pub fn combine(&self, other: &SymOp) -> SymOp {
        let mut out = SymOp {
            rot: [[0; 3]; 3],
            tran: self.tran,
        };
        for i in 0..3 {
            for j in 0..3 {
                out.rot[i][j] = (0..3).map(|k| self.rot[i][k] * other.rot[k][j]).sum();
                out.tran[i] += self.rot[i][j] * other.tran[j];
            }
        }
        out.wrapped()
    }

    /// The same rotation with an extra translation (e.g. a centering vector).
    pub fn translated(&self, shift: [i32; 3]) -> SymOp {
        SymOp {
            rot: self.rot,
            tran: [
                self.tran[0] + shift[0],
                self.tran[1] + shift[1],
                self.tran[2] + shift[2],
            ],
        }
        .wrapped()
    }

    pub fn is_identity(&self) -> bool {
        *self == SymOp::identity()
    }

    pub fn is_pure_translation(&self) -> bool {
        self.rot == SymOp::identity().rot
    }

    /// Applies the operation to fractional coordinates.
    pub fn apply_to_frac(&self, x: [f64; 3]) -> [f64; 3] {
        let mut out = [0.0; 3];
        for (i, o) in out.iter_mut().enumerate() {
            *o = (0..3).map(|j| self.rot[i][j] as f64 * x[j]).sum::<f64>()
                + self.tran[i] as f64 / DEN as f64;
        }
        out
    }

    /// The Miller index equivalent under this operation: `h' = h R`.
    pub fn apply_to_hkl(&self, hkl: [i32; 3]) -> [i32; 3] {
        let mut out = [0; 3];
        for (j, o) in out.iter_mut().enumerate() {
            *o = (0..3).map(|i| hkl[i] * self.rot[i][j]).sum();
        }
        out
    }

    /// Phase shift in radians picked up by a structure factor at `hkl`: `2π h·t`.
    pub fn phase_shift(&self, hkl: [i32; 3]) -> f64 {
        let ht: i32 = (0..3).map(|i| hkl[i] * self.tran[i]).sum();
        std::f64::consts::TAU * ht as f64 / DEN as f64
    }

    /// Triplet in the upper-case form used by MTZ `SYMM` records, e.g. `-X+1/2,Y,-Z`.
    pub fn triplet(&self) -> String {
        (0..3)
            .map(|row| self.row_expr(row))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn row_expr(&self, row: usize) -> String {
        let mut s = String::new();
        for (col, axis) in ['X', 'Y', 'Z'].iter().enumerate() {
            let c = self.rot[row][col];
            if c == 0 {
                continue;
            }
            if c < 0 {
                s.push('-');
            } else if !s.is_empty() {
                s.push('+');
            }
            if c.abs() != 1 {
                s.push_str(&c.abs().to_string());
                s.push('*');
            }
            s.push(*axis);
        }
        let t = self.tran[row];
        if t != 0 {
            let g = gcd(t.abs(), DEN);
            let sign = if t < 0 { '-' } else { '+' };
            if s.is_empty() && t > 0 {
                s.push_str(&format!("{}/{}", t / g, DEN / g));
            } else {
                s.push_str(&format!("{}{}/{}", sign, t.abs() / g, DEN / g));
            }
        }
        if s.is_empty() {
            s.push('0');
        }
        s
    }
}

impl Default for SymOp {
    fn default() -> Self {
        SymOp::identity()
    }
}

impl FromStr for SymOp {
    type Err = SymmetryError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SymOp::parse(s)
    }
}

impl fmt::Display for SymOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.triplet())
    }
}

fn gcd(a: i32, b: i32) -> i32 {
    if b == 0 { a.max(1) } else { gcd(b, a % b) }
}

/// Parses one row of a triplet, e.g. `-x+1/2` or `x-y`, into rotation coefficients and a
/// translation in 1/DEN units.
fn parse_expr(expr: &str) -> Result<([i32; 3], i32), String> {
    let chars: Vec<char> = expr.chars().filter(|c| !c.is_whitespace()).collect();
    if chars.is_empty() {
        return Err("empty expression".to_string());
    }
    let mut coeffs = [0; 3];
    let mut tran = 0;
    let mut i = 0;
    while i < chars.len() {
        let mut sign = 1;
        match chars[i] {
            '-' => {
                sign = -1;
                i += 1;
            }
            '+' => i += 1,
            _ => {}
        }
        if i >= chars.len() {
            return Err("dangling sign".to_string());
        }
        let (value, consumed) = parse_number(&chars[i..])?;
        i += consumed;
        let axis = chars.get(i).and_then(|c| match c.to_ascii_lowercase() {
            'x' => Some(0),
            'y' => Some(1),
            'z' => Some(2),
            _ => None,
        });
        match (axis, value) {
            (Some(axis), None) => {
                coeffs[axis] += sign;
                i += 1;
            }
            (Some(axis), Some((num, 1))) if chars.get(i.wrapping_sub(1)) == Some(&'*') => {
                coeffs[axis] += sign * num;
                i += 1;
            }
            (None, Some((num, den))) => {
                if den == 0 || (num * DEN) % den != 0 {
                    return Err(format!("translation {num}/{den} is not a multiple of 1/{DEN}"));
                }
                tran += sign * num * DEN / den;
            }
            _ => return Err(format!("unexpected character at position {i}")),
        }
    }
    Ok((coeffs, tran))
}

/// Parses an optional number (`3`, `1/2`, `0.5`, or a coefficient `2*`) at the start of
/// `chars`. Returns `(Some((numerator, denominator)), consumed)`.
fn parse_number(chars: &[char]) -> Result<(Option<(i32, i32)>, usize), String> {
    let mut i = 0;
    let mut num: i32 = 0;
    while i < chars.len() && chars[i].is_ascii_digit() {
        num = num * 10 + chars[i].to_digit(10).unwrap_or(0) as i32;
        i += 1;
    }
    if i == 0 {
        return Ok((None, 0));
    }
    let mut den = 1;
    match chars.get(i) {
        Some('/') => {
            i += 1;
            let start = i;
            den = 0;
            while i < chars.len() && chars[i].is_ascii_digit() {
                den = den * 10 + chars[i].to_digit(10).unwrap_or(0) as i32;
                i += 1;
            }
            if i == start {
                return Err("missing denominator".to_string());
            }
        }
        Some('.') => {
            i += 1;
            while i < chars.len() && chars[i].is_ascii_digit() {
                num = num * 10 + chars[i].to_digit(10).unwrap_or(0) as i32;
                den *= 10;
                i += 1;
            }
        }
        Some('*') => {
            i += 1;
        }
        _ => {}
    }
    Ok((Some((num, den)), i))
}
