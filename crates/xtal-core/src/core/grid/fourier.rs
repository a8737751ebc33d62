use super::real::{Grid, GridError};
use crate::core::symmetry::spacegroup::SpaceGroup;
use crate::core::symmetry::unit_cell::UnitCell;
use rustfft::FftPlanner;
use rustfft::num_complex::Complex32;
use tracing::{debug, instrument};

/// Structure factors (or any values) indexed by Miller indices on an FFT grid.
///
/// When `half_l` is set only `l` in `0..=full_nw/2` is stored; the remaining values
/// follow from Friedel symmetry, `F(-h,-k,-l) = conj(F(h,k,l))`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReciprocalGrid<T> {
    pub nu: usize,
    pub nv: usize,
    /// Number of stored layers along `l`.
    pub nw: usize,
    /// Grid size along `c*` before any truncation.
    pub full_nw: usize,
    pub half_l: bool,
    pub cell: UnitCell,
    pub spacegroup: Option<&'static SpaceGroup>,
    pub data: Vec<T>,
}

impl<T: Copy> ReciprocalGrid<T> {
    #[inline]
    fn index_q(&self, u: usize, v: usize, w: usize) -> usize {
        u + self.nu * (v + self.nv * w)
    }

    pub fn get_value_q(&self, u: usize, v: usize, w: usize) -> T {
        self.data[self.index_q(u, v, w)]
    }

    /// Miller indices of a stored grid point.
    pub fn to_hkl(&self, u: usize, v: usize, w: usize) -> [i32; 3] {
        let signed = |i: usize, n: usize| {
            if i * 2 >= n {
                i as i32 - n as i32
            } else {
                i as i32
            }
        };
        let l = if self.half_l {
            w as i32
        } else {
            signed(w, self.full_nw)
        };
        [signed(u, self.nu), signed(v, self.nv), l]
    }
}

impl ReciprocalGrid<Complex32> {
    /// Value at any Miller index; `h` and `k` wrap periodically, `l` is folded
    /// through Friedel symmetry when only half of the grid is stored.
    pub fn get_value(&self, h: i32, k: i32, l: i32) -> Complex32 {
        let wrap = |i: i32, n: usize| i.rem_euclid(n as i32) as usize;
        let lw = wrap(l, self.full_nw);
        if lw < self.nw {
            self.get_value_q(wrap(h, self.nu), wrap(k, self.nv), lw)
        } else {
            self.get_value_q(wrap(-h, self.nu), wrap(-k, self.nv), self.full_nw - lw)
                .conj()
        }
    }
}

/// Computes `F(hkl) = V/N · Σ ρ(x) exp(2πi h·x)` over all grid points.
#[instrument(skip_all, fields(nu = map.nu, nv = map.nv, nw = map.nw, half_l))]
pub fn transform_map_to_f_phi(
    map: &Grid<f32>,
    half_l: bool,
) -> Result<ReciprocalGrid<Complex32>, GridError> {
    if map.is_empty() {
        return Err(GridError::Empty);
    }
    let (nu, nv, nw) = (map.nu, map.nv, map.nw);
    let mut data: Vec<Complex32> = map.data.iter().map(|&x| Complex32::new(x, 0.0)).collect();
    let mut planner = FftPlanner::<f32>::new();

    planner.plan_fft_forward(nu).process(&mut data);
    fft_strided(&mut planner, &mut data, nv, nu, nu * nv);
    fft_strided(&mut planner, &mut data, nw, nu * nv, nu * nv * nw);

    let scale = (map.cell.volume() / map.point_count() as f64) as f32;
    let stored_nw = if half_l { nw / 2 + 1 } else { nw };
    data.truncate(nu * nv * stored_nw);
    for x in &mut data {
        *x = x.conj() * scale;
    }
    debug!(stored_nw, scale, "Fourier transform done");
    Ok(ReciprocalGrid {
        nu,
        nv,
        nw: stored_nw,
        full_nw: nw,
        half_l,
        cell: map.cell,
        spacegroup: map.spacegroup,
        data,
    })
}

/// Transforms every line of `len` points spaced by `stride`, in blocks of `block` values.
fn fft_strided(
    planner: &mut FftPlanner<f32>,
    data: &mut [Complex32],
    len: usize,
    stride: usize,
    block: usize,
) {
    if len < 2 {
        return;
    }
    let fft = planner.plan_fft_forward(len);
    let mut line = vec![Complex32::new(0.0, 0.0); len];
    for base in (0..data.len()).step_by(block) {
        for offset in 0..stride {
            let start = base + offset;
            for (i, x) in line.iter_mut().enumerate() {
                *x = data[start + i * stride];
            }
            fft.process(&mut line);
            for (i, x) in line.iter().enumerate() {
                data[start + i * stride] = *x;
            }
        }
    }
}

/// Phase of a complex value in degrees, in `[0, 360)`.
pub fn phase_in_angles(value: Complex32) -> f32 {
    let mut angle = (value.im as f64).atan2(value.re as f64).to_degrees();
    if angle < 0.0 {
        angle += 360.0;
    }
    let angle = angle as f32;
    if angle >= 360.0 { 0.0 } else { angle }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cubic_grid(n: usize) -> Grid<f32> {
        Grid::new(n, n, n, 0.0f32).with_cell(UnitCell::new(10.0, 10.0, 10.0, 90.0, 90.0, 90.0))
    }

    fn close(a: Complex32, b: Complex32) -> bool {
        (a - b).norm() < 1e-3
    }

    #[test]
    fn delta_at_origin_gives_flat_transform() {
        let mut grid = cubic_grid(4);
        grid.set_value(0, 0, 0, 1.0);
        let f = transform_map_to_f_phi(&grid, false).unwrap();
        let expected = Complex32::new(1000.0 / 64.0, 0.0);
        assert!(f.data.iter().all(|&x| close(x, expected)));
    }

    #[test]
    fn shifted_delta_has_positive_phase_convention() {
        let mut grid = cubic_grid(4);
        grid.set_value(1, 0, 0, 1.0);
        let f = transform_map_to_f_phi(&grid, true).unwrap();
        let value = f.get_value(1, 0, 0);
        assert!((value.norm() - 1000.0 / 64.0).abs() < 1e-3);
        assert!((phase_in_angles(value) - 90.0).abs() < 1e-3);
        assert!((phase_in_angles(f.get_value(-1, 0, 0)) - 270.0).abs() < 1e-3);
    }

    #[test]
    fn half_grid_matches_full_grid_through_friedel_symmetry() {
        let mut grid = Grid::new(4, 6, 5, 0.0f32)
            .with_cell(UnitCell::new(20.0, 30.0, 25.0, 90.0, 100.0, 90.0));
        for (i, x) in grid.data.iter_mut().enumerate() {
            *x = ((i * 7919) % 31) as f32 - 15.0;
        }
        let full = transform_map_to_f_phi(&grid, false).unwrap();
        let half = transform_map_to_f_phi(&grid, true).unwrap();
        assert_eq!(half.nw, 3);
        assert_eq!(half.full_nw, 5);
        assert_eq!(half.data.len(), 4 * 6 * 3);
        for h in -3..=3 {
            for k in -4..=4 {
                for l in -4..=6 {
                    assert!(
                        close(full.get_value(h, k, l), half.get_value(h, k, l)),
                        "({h},{k},{l})"
                    );
                }
            }
        }
    }

    #[test]
    fn to_hkl_maps_upper_half_to_negative_indices() {
        let mut grid = cubic_grid(4);
        grid.set_value(0, 0, 0, 1.0);
        let f = transform_map_to_f_phi(&grid, true).unwrap();
        assert_eq!(f.to_hkl(1, 3, 2), [1, -1, 2]);
        assert_eq!(f.to_hkl(2, 0, 0), [-2, 0, 0]);
    }

    #[test]
    fn empty_map_is_rejected() {
        let grid = cubic_grid(0);
        assert_eq!(transform_map_to_f_phi(&grid, true), Err(GridError::Empty));
    }

    #[test]
    fn phase_is_normalized_to_half_open_range() {
        assert_eq!(phase_in_angles(Complex32::new(1.0, 0.0)), 0.0);
        assert!((phase_in_angles(Complex32::new(0.0, 1.0)) - 90.0).abs() < 1e-4);
        assert!((phase_in_angles(Complex32::new(-1.0, 0.0)) - 180.0).abs() < 1e-4);
        assert!((phase_in_angles(Complex32::new(0.0, -2.0)) - 270.0).abs() < 1e-4);
        // Rounds to 360.0 in single precision.
        assert_eq!(phase_in_angles(Complex32::new(1.0, -1e-9)), 0.0);
    }
}
