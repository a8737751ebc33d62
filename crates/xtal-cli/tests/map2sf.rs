use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::{TempDir, tempdir};
use xtal::core::grid::Grid;
use xtal::core::io::ccp4::Ccp4Map;
use xtal::core::io::mtz::Mtz;
use xtal::core::symmetry::spacegroup::SpaceGroup;
use xtal::core::symmetry::unit_cell::UnitCell;

fn p1_grid() -> Grid<f32> {
    let mut grid = Grid::new(6, 5, 8, 0.0f32)
        .with_cell(UnitCell::new(12.0, 10.0, 16.0, 90.0, 90.0, 90.0))
        .with_spacegroup(Some(SpaceGroup::p1()));
    for (i, x) in grid.data.iter_mut().enumerate() {
        *x = ((i * 37) % 23) as f32 * 0.1 - 1.0;
    }
    grid
}

fn write_map(dir: &TempDir, map: &Ccp4Map) -> PathBuf {
    let path = dir.path().join("p1.ccp4");
    map.write_file(&path).unwrap();
    path
}

fn map2sf(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_map2sf"))
        .args(args)
        .output()
        .unwrap()
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn successful_conversion_exits_zero_and_writes_mtz() {
    let dir = tempdir().unwrap();
    let map = write_map(&dir, &Ccp4Map::from_grid(&p1_grid()));
    let out = dir.path().join("out.mtz");

    let output = map2sf(&[arg(&map), arg(&out), "FWT", "PHWT"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(!String::from_utf8_lossy(&output.stderr).contains("ERROR"));
    let mtz = Mtz::read_file(&out).unwrap();
    assert!(mtz.column_with_label("FWT").is_some());
    assert!(mtz.column_with_label("PHWT").is_some());
}

#[test]
fn verbose_mode_prints_progress_lines() {
    let dir = tempdir().unwrap();
    let map = write_map(&dir, &Ccp4Map::from_grid(&p1_grid()));
    let out = dir.path().join("out.mtz");

    let output = map2sf(&["-v", arg(&map), arg(&out), "FWT", "PHWT"]);
    assert_eq!(output.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(&format!("Reading {} ...", map.display())), "{stderr}");
    assert!(stderr.contains("Fourier transform of grid 6 x 5 x 8..."), "{stderr}");
    assert!(stderr.contains(&format!("Writing {} ...", out.display())), "{stderr}");
}

#[test]
fn quiet_mode_prints_no_progress() {
    let dir = tempdir().unwrap();
    let map = write_map(&dir, &Ccp4Map::from_grid(&p1_grid()));
    let out = dir.path().join("out.mtz");

    let output = map2sf(&[arg(&map), arg(&out), "FWT", "PHWT"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(!String::from_utf8_lossy(&output.stderr).contains("Reading"));
}

#[test]
fn unsupported_output_exits_one_with_error_line() {
    let dir = tempdir().unwrap();
    let map = write_map(&dir, &Ccp4Map::from_grid(&p1_grid()));
    let out = dir.path().join("out.cif");

    let output = map2sf(&[arg(&map), arg(&out), "FWT", "PHWT"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.lines().any(|l| l == "ERROR: mmCIF support not implemented yet"),
        "{stderr}"
    );
    assert!(!out.exists());
}

#[test]
fn incomplete_map_exits_one_without_output() {
    let dir = tempdir().unwrap();
    let grid = p1_grid();
    let mut map = Ccp4Map::from_grid(&grid);
    map.header.extent = [6, 5, 4];
    map.data.truncate(6 * 5 * 4);
    let map = write_map(&dir, &map);
    let out = dir.path().join("out.mtz");

    let output = map2sf(&[arg(&map), arg(&out), "FWT", "PHWT"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: Map does not cover all the ASU"), "{stderr}");
    assert!(!out.exists());
}

#[test]
fn config_file_supplies_defaults_and_options_override_them() {
    let dir = tempdir().unwrap();
    let map = write_map(&dir, &Ccp4Map::from_grid(&p1_grid()));
    let config = dir.path().join("map2sf.toml");
    std::fs::write(&config, "section = \"from-file\"\nphitype = \"Q\"\n").unwrap();
    let out = dir.path().join("out.mtz");

    let output = map2sf(&[
        "--config",
        arg(&config),
        "--section=maps",
        arg(&map),
        arg(&out),
        "FWT",
        "PHWT",
    ]);
    assert_eq!(output.status.code(), Some(0));
    let mtz = Mtz::read_file(&out).unwrap();
    assert!(mtz.dataset_with_name("maps").is_some());
    assert!(mtz.dataset_with_name("from-file").is_none());
    assert_eq!(mtz.column_with_label("PHWT").unwrap().col_type, 'Q');
}

#[test]
fn unknown_config_key_is_reported() {
    let dir = tempdir().unwrap();
    let map = write_map(&dir, &Ccp4Map::from_grid(&p1_grid()));
    let config = dir.path().join("map2sf.toml");
    std::fs::write(&config, "resolution = 2.0\n").unwrap();
    let out = dir.path().join("out.mtz");

    let output = map2sf(&["--config", arg(&config), arg(&map), arg(&out), "FWT", "PHWT"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("ERROR: Failed to parse file"));
}
