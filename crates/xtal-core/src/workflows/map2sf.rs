use crate::core::grid::{ReciprocalGrid, phase_in_angles, transform_map_to_f_phi};
use crate::core::io::ccp4::Ccp4Map;
use crate::core::io::mtz::{Mtz, MtzError};
use crate::core::symmetry::asu::ReciprocalAsu;
use crate::core::symmetry::spacegroup::SpaceGroup;
use crate::engine::config::ConversionConfig;
use crate::engine::error::ConversionError;
use crate::engine::progress::{Progress, ProgressReporter};
use rustfft::num_complex::Complex32;
use std::path::Path;
use tracing::{debug, info, instrument};

/// What a conversion produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionSummary {
    pub grid_size: [usize; 3],
    pub reflections: usize,
    pub columns: Vec<String>,
}

fn is_mtz_path(path: &Path) -> bool {
    path.to_string_lossy().to_ascii_lowercase().ends_with(".mtz")
}

/// Converts a CCP4 map into amplitude and phase columns of an MTZ file.
///
/// The map must cover the asymmetric unit; values outside the stored region are
/// generated from space-group symmetry. Nothing is written unless every step succeeds.
#[instrument(skip_all, name = "map2sf_workflow", fields(map = %config.map_path.display()))]
pub fn run(
    config: &ConversionConfig,
    reporter: &ProgressReporter,
) -> Result<ConversionSummary, ConversionError> {
    reporter.report(Progress::PhaseStart { name: "Reading map" });
    reporter.message(format!("Reading {} ...", config.map_path.display()));
    let map_error = |source| ConversionError::Map {
        path: config.map_path.clone(),
        source,
    };
    let map = Ccp4Map::read_file(&config.map_path).map_err(map_error)?;
    let grid = map.setup_full(f32::NAN).map_err(map_error)?;
    if grid.has_nan() {
        return Err(ConversionError::Coverage);
    }
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart {
        name: "Fourier transform",
    });
    reporter.message(format!(
        "Fourier transform of grid {} x {} x {}...",
        grid.nu, grid.nv, grid.nw
    ));
    let hkl = transform_map_to_f_phi(&grid, true)?;
    reporter.report(Progress::PhaseFinish);

    if !is_mtz_path(&config.output_path) {
        return Err(ConversionError::UnsupportedOutput {
            path: config.output_path.clone(),
        });
    }

    reporter.report(Progress::PhaseStart {
        name: "Building MTZ",
    });
    let mtz = match &config.base_path {
        Some(base) => {
            reporter.message(format!("Reading {} ...", base.display()));
            let mtz_error = |source| ConversionError::Mtz {
                path: base.clone(),
                source,
            };
            let base_mtz = Mtz::read_file(base).map_err(mtz_error)?;
            add_to_base(base_mtz, &hkl, config, reporter).map_err(mtz_error)?
        }
        None => new_mtz(&hkl, config).map_err(|source| ConversionError::Mtz {
            path: config.output_path.clone(),
            source,
        })?,
    };
    reporter.report(Progress::PhaseFinish);

    reporter.message(format!("Writing {} ...", config.output_path.display()));
    mtz.write_file(&config.output_path)
        .map_err(|source| ConversionError::Mtz {
            path: config.output_path.clone(),
            source,
        })?;

    let summary = ConversionSummary {
        grid_size: grid.dims(),
        reflections: mtz.nreflections(),
        columns: mtz.columns.iter().map(|c| c.label.clone()).collect(),
    };
    info!(
        reflections = summary.reflections,
        columns = summary.columns.len(),
        "Map coefficients written"
    );
    Ok(summary)
}

/// Appends amplitude and phase columns to every reflection of an existing file.
fn add_to_base(
    mut mtz: Mtz,
    hkl: &ReciprocalGrid<Complex32>,
    config: &ConversionConfig,
    reporter: &ProgressReporter,
) -> Result<Mtz, MtzError> {
    let mut dataset_id = None;
    if let Some(name) = &config.section {
        dataset_id = mtz.dataset_with_name(name).map(|ds| ds.id);
        if dataset_id.is_none() {
            mtz.add_dataset(name);
        }
    }
    let copied: Vec<&str> = mtz.columns.iter().map(|c| c.label.as_str()).collect();
    reporter.message(format!("Copied columns: {}", copied.join(", ")));

    let f_idx = mtz.add_column(&config.f_label, config.f_type, dataset_id)?.idx;
    mtz.add_column(&config.phi_label, config.phi_type, dataset_id)?;
    mtz.expand_data_rows(2)?;
    let ncol = mtz.columns.len();
    for row in mtz.data.chunks_exact_mut(ncol) {
        let v = hkl.get_value(row[0] as i32, row[1] as i32, row[2] as i32);
        row[f_idx] = v.norm();
        row[f_idx + 1] = phase_in_angles(v);
    }
    debug!(rows = mtz.nreflections(), "Filled new columns");
    Ok(mtz)
}

/// Builds a new file with one reflection per reciprocal-ASU point of the grid.
fn new_mtz(hkl: &ReciprocalGrid<Complex32>, config: &ConversionConfig) -> Result<Mtz, MtzError> {
    let sg = hkl.spacegroup.unwrap_or_else(SpaceGroup::p1);
    let mut mtz = Mtz::new();
    mtz.cell = hkl.cell;
    mtz.set_spacegroup(sg);
    mtz.sort_order = [1, 2, 3, 0, 0];
    mtz.add_dataset("HKL_base");
    for label in ["H", "K", "L"] {
        mtz.add_column(label, 'H', None)?;
    }
    mtz.add_dataset(config.section.as_deref().unwrap_or("unknown"));
    mtz.add_column(&config.f_label, config.f_type, None)?;
    mtz.add_column(&config.phi_label, config.phi_type, None)?;

    let asu = ReciprocalAsu::new(sg);
    let max_1_d2 = config.d_min.map(|d| 1.0 / (d * d));
    let max_h = (hkl.nu as i32 - 1) / 2;
    let max_k = (hkl.nv as i32 - 1) / 2;
    let max_l = hkl.nw as i32 - 1;
    for h in -max_h..=max_h {
        for k in -max_k..=max_k {
            for l in 0..=max_l {
                if (h, k, l) == (0, 0, 0) || !asu.is_in([h, k, l]) {
                    continue;
                }
                if max_1_d2.is_some_and(|limit| mtz.cell.calculate_1_d2(h, k, l) >= limit) {
                    continue;
                }
                let v = hkl.get_value(h, k, l);
                mtz.data
                    .extend_from_slice(&[h as f32, k as f32, l as f32, v.norm(), phase_in_angles(v)]);
            }
        }
    }
    debug!(reflections = mtz.nreflections(), "Generated reflections");
    Ok(mtz)
}
