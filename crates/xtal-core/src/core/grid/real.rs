use crate::core::symmetry::spacegroup::SpaceGroup;
use crate::core::symmetry::symop::{DEN, SymOp};
use crate::core::symmetry::unit_cell::UnitCell;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("Grid has no points")]
    Empty,
    #[error("Grid {}x{}x{} is incompatible with symmetry operation {op}", dims[0], dims[1], dims[2])]
    IncompatibleWithSymmetry { dims: [usize; 3], op: String },
    #[error("Expected {expected} grid values, got {actual}")]
    DataLength { expected: usize, actual: usize },
}

/// A symmetry operation expressed in grid-point units.
#[derive(Debug, Clone, Copy)]
struct GridOp {
    rot: [[i32; 3]; 3],
    tran: [i32; 3],
}

/// Values sampled on a regular grid spanning the whole unit cell.
///
/// Points are stored with `u` (along a) fastest and `w` (along c) slowest.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    pub nu: usize,
    pub nv: usize,
    pub nw: usize,
    pub cell: UnitCell,
    pub spacegroup: Option<&'static SpaceGroup>,
    pub data: Vec<T>,
}

impl<T: Copy> Grid<T> {
    pub fn new(nu: usize, nv: usize, nw: usize, value: T) -> Self {
        Self {
            nu,
            nv,
            nw,
            cell: UnitCell::default(),
            spacegroup: None,
            data: vec![value; nu * nv * nw],
        }
    }

    pub fn from_data(nu: usize, nv: usize, nw: usize, data: Vec<T>) -> Result<Self, GridError> {
        let expected = nu * nv * nw;
        if data.len() != expected {
            return Err(GridError::DataLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            nu,
            nv,
            nw,
            cell: UnitCell::default(),
            spacegroup: None,
            data,
        })
    }

    pub fn with_cell(mut self, cell: UnitCell) -> Self {
        self.cell = cell;
        self
    }

    pub fn with_spacegroup(mut self, sg: Option<&'static SpaceGroup>) -> Self {
        self.spacegroup = sg;
        self
    }

    pub fn dims(&self) -> [usize; 3] {
        [self.nu, self.nv, self.nw]
    }

    pub fn point_count(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Index of an in-range grid point.
    #[inline]
    pub fn index_q(&self, u: usize, v: usize, w: usize) -> usize {
        u + self.nu * (v + self.nv * w)
    }

    /// Index of any grid point, wrapped periodically into the cell.
    #[inline]
    pub fn index_n(&self, u: i32, v: i32, w: i32) -> usize {
        self.index_q(
            u.rem_euclid(self.nu as i32) as usize,
            v.rem_euclid(self.nv as i32) as usize,
            w.rem_euclid(self.nw as i32) as usize,
        )
    }

    pub fn get_value_q(&self, u: usize, v: usize, w: usize) -> T {
        self.data[self.index_q(u, v, w)]
    }

    pub fn get_value(&self, u: i32, v: i32, w: i32) -> T {
        self.data[self.index_n(u, v, w)]
    }

    pub fn set_value(&mut self, u: i32, v: i32, w: i32, value: T) {
        let idx = self.index_n(u, v, w);
        self.data[idx] = value;
    }

    pub fn fill(&mut self, value: T) {
        self.data.iter_mut().for_each(|x| *x = value);
    }

    /// Checks that every operation of the space group maps grid points onto grid points.
    pub fn check_symmetry_compatible(&self) -> Result<(), GridError> {
        self.grid_operations().map(|_| ())
    }

    fn grid_operations(&self) -> Result<Vec<GridOp>, GridError> {
        let Some(sg) = self.spacegroup else {
            return Ok(Vec::new());
        };
        let dims = self.dims();
        sg.operations()
            .iter()
            .filter(|op| !op.is_identity())
            .map(|op| to_grid_op(op, dims))
            .collect()
    }

    /// Copies values from defined voxels into symmetry-equivalent voxels for which
    /// `is_unset` returns true. Voxels with no defined equivalent are left untouched.
    pub fn symmetrize_nondefault<F>(&mut self, is_unset: F) -> Result<(), GridError>
    where
        F: Fn(&T) -> bool,
    {
        if self.is_empty() {
            return Err(GridError::Empty);
        }
        let ops = self.grid_operations()?;
        if ops.is_empty() {
            return Ok(());
        }
        let dims = self.dims().map(|n| n as i32);
        let mut visited = vec![false; self.data.len()];
        let mut orbit = Vec::with_capacity(ops.len() + 1);
        let mut filled = 0usize;
        for w in 0..self.nw {
            for v in 0..self.nv {
                for u in 0..self.nu {
                    let start = self.index_q(u, v, w);
                    if visited[start] {
                        continue;
                    }
                    let point = [u as i32, v as i32, w as i32];
                    orbit.clear();
                    orbit.push(start);
                    for op in &ops {
                        let image = op.apply(point, dims);
                        orbit.push(self.index_n(image[0], image[1], image[2]));
                    }
                    let source = orbit.iter().copied().find(|&i| !is_unset(&self.data[i]));
                    for &i in &orbit {
                        visited[i] = true;
                        if let Some(src) = source {
                            if is_unset(&self.data[i]) {
                                self.data[i] = self.data[src];
                                filled += 1;
                            }
                        }
                    }
                }
            }
        }
        debug!(filled, ops = ops.len() + 1, "Symmetrized grid");
        Ok(())
    }
}

impl Grid<f32> {
    pub fn has_nan(&self) -> bool {
        self.data.iter().any(|x| x.is_nan())
    }
}

fn to_grid_op(op: &SymOp, dims: [usize; 3]) -> Result<GridOp, GridError> {
    let incompatible = || GridError::IncompatibleWithSymmetry {
        dims,
        op: op.triplet(),
    };
    let mut tran = [0; 3];
    for i in 0..3 {
        let n = dims[i] as i32;
        if (op.tran[i] * n) % DEN != 0 {
            return Err(incompatible());
        }
        tran[i] = op.tran[i] * n / DEN;
        for j in 0..3 {
            if i != j && op.rot[i][j] != 0 && dims[i] != dims[j] {
                return Err(incompatible());
            }
        }
    }
    Ok(GridOp { rot: op.rot, tran })
}

impl GridOp {
    fn apply(&self, p: [i32; 3], dims: [i32; 3]) -> [i32; 3] {
        let mut out = [0; 3];
        for i in 0..3 {
            let r: i32 = (0..3).map(|j| self.rot[i][j] * p[j]).sum();
            out[i] = (r + self.tran[i]).rem_euclid(dims[i]);
        }
        out
    }
}
