use super::gz::MaybeGzipped;
use crate::core::grid::{Grid, GridError};
use crate::core::symmetry::spacegroup::SpaceGroup;
use crate::core::symmetry::unit_cell::UnitCell;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::io::{self, Read, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

const HEADER_SIZE: usize = 1024;
const MAP_TAG: &[u8; 4] = b"MAP ";
const LABEL_SIZE: usize = 80;
const MAX_LABELS: usize = 10;

#[derive(Debug, Error)]
pub enum Ccp4Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("File too small for a CCP4 header: {0} bytes")]
    TooShort(usize),
    #[error("Not a CCP4 map: missing 'MAP ' tag at byte 208")]
    MissingTag,
    #[error("Unsupported map mode {0}")]
    UnsupportedMode(i32),
    #[error("Invalid map header: {0}")]
    InvalidHeader(String),
    #[error("Map data truncated: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },
    #[error("Space group number {0} from the map header is not supported")]
    UnsupportedSpaceGroup(i32),
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Decoded fields of the 1024-byte CCP4/MRC header.
#[derive(Debug, Clone, PartialEq)]
pub struct Ccp4Header {
    /// Columns, rows and sections as stored in the file.
    pub extent: [usize; 3],
    pub mode: i32,
    /// First column, row and section index.
    pub start: [i32; 3],
    /// Grid sampling of the whole unit cell along X, Y and Z.
    pub sampling: [usize; 3],
    pub cell: UnitCell,
    /// Which axis (1 = X, 2 = Y, 3 = Z) corresponds to columns, rows and sections.
    pub axis_order: [usize; 3],
    pub dmin: f32,
    pub dmax: f32,
    pub dmean: f32,
    pub ispg: i32,
    pub nsymbt: usize,
    pub origin: [f32; 3],
    pub rms: f32,
    pub labels: Vec<String>,
    pub little_endian: bool,
}

/// A CCP4 map: header plus voxel values in file order (columns fastest).
#[derive(Debug, Clone, PartialEq)]
pub struct Ccp4Map {
    pub header: Ccp4Header,
    pub data: Vec<f32>,
}

impl Ccp4Map {
    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Self, Ccp4Error> {
        let bytes = MaybeGzipped::new(path).read_all()?;
        Self::from_bytes(&bytes)
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, Ccp4Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Ccp4Error> {
        if bytes.len() < HEADER_SIZE {
            return Err(Ccp4Error::TooShort(bytes.len()));
        }
        let raw = &bytes[..HEADER_SIZE];
        if &raw[208..212] != MAP_TAG {
            return Err(Ccp4Error::MissingTag);
        }
        let header = if detect_little_endian(raw)? {
            parse_header::<LittleEndian>(raw, true)?
        } else {
            parse_header::<BigEndian>(raw, false)?
        };
        let offset = HEADER_SIZE + header.nsymbt;
        let body = bytes.get(offset..).unwrap_or_default();
        let count = voxel_count(header.extent, "grid extent")?;
        let data = if header.little_endian {
            read_values::<LittleEndian>(body, header.mode, count)?
        } else {
            read_values::<BigEndian>(body, header.mode, count)?
        };
        debug!(
            extent = ?header.extent,
            mode = header.mode,
            ispg = header.ispg,
            "Read CCP4 map"
        );
        Ok(Self { header, data })
    }

    /// Space group from the ISPG header word; 0 (used for EM maps) is treated as P 1.
    pub fn spacegroup(&self) -> Result<&'static SpaceGroup, Ccp4Error> {
        if self.header.ispg == 0 {
            return Ok(SpaceGroup::p1());
        }
        SpaceGroup::find_by_number(self.header.ispg)
            .ok_or(Ccp4Error::UnsupportedSpaceGroup(self.header.ispg))
    }

    /// Places the map values on a grid covering the whole unit cell.
    ///
    /// Points the map does not cover are set to `fill` and then, when possible,
    /// filled from symmetry-equivalent points.
    pub fn setup_full(&self, fill: f32) -> Result<Grid<f32>, Ccp4Error> {
        let h = &self.header;
        let [nx, ny, nz] = h.sampling;
        voxel_count(h.sampling, "cell sampling")?;
        let sg = self.spacegroup()?;
        let mut grid = Grid::new(nx, ny, nz, fill)
            .with_cell(h.cell)
            .with_spacegroup(Some(sg));
        let [nc, nr, ns] = h.extent;
        let [ac, ar, as_] = h.axis_order.map(|a| a - 1);
        let mut covered = vec![false; grid.point_count()];
        let mut idx = 0;
        for s in 0..ns {
            for r in 0..nr {
                for c in 0..nc {
                    let mut xyz = [0i32; 3];
                    xyz[ac] = h.start[0] + c as i32;
                    xyz[ar] = h.start[1] + r as i32;
                    xyz[as_] = h.start[2] + s as i32;
                    let gi = grid.index_n(xyz[0], xyz[1], xyz[2]);
                    grid.data[gi] = self.data[idx];
                    covered[gi] = true;
                    idx += 1;
                }
            }
        }
        let uncovered = covered.iter().filter(|&&c| !c).count();
        if uncovered > 0 {
            debug!(uncovered, "Map does not fill the cell, applying symmetry");
            let is_fill = |x: &f32| x.to_bits() == fill.to_bits() || (fill.is_nan() && x.is_nan());
            grid.symmetrize_nondefault(is_fill)?;
        }
        Ok(grid)
    }

    /// A mode-2 map covering the whole cell of `grid`.
    pub fn from_grid(grid: &Grid<f32>) -> Self {
        let defined = grid.data.iter().filter(|x| !x.is_nan());
        let (mut dmin, mut dmax, mut sum, mut sum_sq, mut n) =
            (f32::INFINITY, f32::NEG_INFINITY, 0.0f64, 0.0f64, 0usize);
        for &x in defined {
            dmin = dmin.min(x);
            dmax = dmax.max(x);
            sum += x as f64;
            sum_sq += (x as f64) * (x as f64);
            n += 1;
        }
        let (dmean, rms) = if n > 0 {
            let mean = sum / n as f64;
            (mean as f32, (sum_sq / n as f64 - mean * mean).max(0.0).sqrt() as f32)
        } else {
            (0.0, 0.0)
        };
        let dims = grid.dims();
        let header = Ccp4Header {
            extent: dims,
            mode: 2,
            start: [0; 3],
            sampling: dims,
            cell: grid.cell,
            axis_order: [1, 2, 3],
            dmin: if n > 0 { dmin } else { 0.0 },
            dmax: if n > 0 { dmax } else { 0.0 },
            dmean,
            ispg: grid.spacegroup.map_or(1, |sg| sg.number as i32),
            nsymbt: 0,
            origin: [0.0; 3],
            rms,
            labels: Vec::new(),
            little_endian: true,
        };
        Self {
            header,
            data: grid.data.clone(),
        }
    }

    /// Writes the map as little-endian mode 2 without an extended header.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), Ccp4Error> {
        let h = &self.header;
        let mut buf = [0u8; HEADER_SIZE];
        let mut put_i32 = |word: usize, v: i32| LittleEndian::write_i32(&mut buf[word * 4..], v);
        for i in 0..3 {
            put_i32(i, h.extent[i] as i32);
            put_i32(4 + i, h.start[i]);
            put_i32(7 + i, h.sampling[i] as i32);
            put_i32(16 + i, h.axis_order[i] as i32);
        }
        put_i32(3, 2);
        put_i32(22, h.ispg);
        put_i32(23, 0);
        let labels: Vec<&String> = h.labels.iter().take(MAX_LABELS).collect();
        put_i32(55, labels.len() as i32);
        let floats = [
            (10, h.cell.a),
            (11, h.cell.b),
            (12, h.cell.c),
            (13, h.cell.alpha),
            (14, h.cell.beta),
            (15, h.cell.gamma),
        ];
        for (word, v) in floats {
            LittleEndian::write_f32(&mut buf[word * 4..], v as f32);
        }
        for (word, v) in [(19, h.dmin), (20, h.dmax), (21, h.dmean), (54, h.rms)] {
            LittleEndian::write_f32(&mut buf[word * 4..], v);
        }
        for i in 0..3 {
            LittleEndian::write_f32(&mut buf[(49 + i) * 4..], h.origin[i]);
        }
        buf[208..212].copy_from_slice(MAP_TAG);
        buf[212..216].copy_from_slice(&[0x44, 0x41, 0, 0]);
        for (i, label) in labels.iter().enumerate() {
            let start = 224 + i * LABEL_SIZE;
            let text = label.as_bytes();
            let n = text.len().min(LABEL_SIZE);
            buf[start..start + LABEL_SIZE].fill(b' ');
            buf[start..start + n].copy_from_slice(&text[..n]);
        }
        writer.write_all(&buf)?;
        let mut body = vec![0u8; self.data.len() * 4];
        LittleEndian::write_f32_into(&self.data, &mut body);
        writer.write_all(&body)?;
        Ok(())
    }

    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Ccp4Error> {
        let mut writer = io::BufWriter::new(std::fs::File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

fn detect_little_endian(raw: &[u8]) -> Result<bool, Ccp4Error> {
    match raw[212] & 0xF0 {
        0x40 => return Ok(true),
        0x10 => return Ok(false),
        _ => {}
    }
    let valid = |mode: i32| matches!(mode, 0 | 1 | 2 | 6);
    let le = LittleEndian::read_i32(&raw[12..16]);
    let be = BigEndian::read_i32(&raw[12..16]);
    warn!(machst = raw[212], "Unrecognized machine stamp, guessing byte order from mode");
    if valid(le) {
        Ok(true)
    } else if valid(be) {
        Ok(false)
    } else {
        Err(Ccp4Error::InvalidHeader(format!(
            "cannot determine byte order (machine stamp {:#04x})",
            raw[212]
        )))
    }
}

fn parse_header<B: ByteOrder>(raw: &[u8], little_endian: bool) -> Result<Ccp4Header, Ccp4Error> {
    let int = |word: usize| B::read_i32(&raw[word * 4..word * 4 + 4]);
    let float = |word: usize| B::read_f32(&raw[word * 4..word * 4 + 4]);

    let extent_raw = [int(0), int(1), int(2)];
    if extent_raw.iter().any(|&n| n <= 0) {
        return Err(Ccp4Error::InvalidHeader(format!(
            "non-positive grid extent {extent_raw:?}"
        )));
    }
    let mode = int(3);
    if !matches!(mode, 0 | 1 | 2 | 6) {
        return Err(Ccp4Error::UnsupportedMode(mode));
    }
    let sampling_raw = [int(7), int(8), int(9)];
    if sampling_raw.iter().any(|&n| n <= 0) {
        return Err(Ccp4Error::InvalidHeader(format!(
            "non-positive cell sampling {sampling_raw:?}"
        )));
    }
    let axis_raw = [int(16), int(17), int(18)];
    let mut sorted = axis_raw;
    sorted.sort_unstable();
    if sorted != [1, 2, 3] {
        return Err(Ccp4Error::InvalidHeader(format!(
            "invalid axis order {axis_raw:?}"
        )));
    }
    let nsymbt = int(23);
    if nsymbt < 0 {
        return Err(Ccp4Error::InvalidHeader(format!(
            "negative extended header size {nsymbt}"
        )));
    }
    let nlabl = (int(55).max(0) as usize).min(MAX_LABELS);
    let labels = (0..nlabl)
        .map(|i| {
            let start = 224 + i * LABEL_SIZE;
            String::from_utf8_lossy(&raw[start..start + LABEL_SIZE])
                .trim_end()
                .to_string()
        })
        .collect();

    let extent = extent_raw.map(|n| n as usize);
    let sampling = sampling_raw.map(|n| n as usize);
    voxel_count(extent, "grid extent")?;
    voxel_count(sampling, "cell sampling")?;

    Ok(Ccp4Header {
        extent,
        mode,
        start: [int(4), int(5), int(6)],
        sampling,
        cell: UnitCell::new(
            float(10) as f64,
            float(11) as f64,
            float(12) as f64,
            float(13) as f64,
            float(14) as f64,
            float(15) as f64,
        ),
        axis_order: axis_raw.map(|n| n as usize),
        dmin: float(19),
        dmax: float(20),
        dmean: float(21),
        ispg: int(22),
        nsymbt: nsymbt as usize,
        origin: [float(49), float(50), float(51)],
        rms: float(54),
        labels,
        little_endian,
    })
}

/// Number of voxels in a box whose f32 values are addressable in memory.
fn voxel_count(dims: [usize; 3], what: &str) -> Result<usize, Ccp4Error> {
    dims.iter()
        .try_fold(4usize, |bytes, &n| bytes.checked_mul(n))
        .map(|bytes| bytes / 4)
        .ok_or_else(|| Ccp4Error::InvalidHeader(format!("{what} {dims:?} is too large")))
}

fn read_values<B: ByteOrder>(body: &[u8], mode: i32, count: usize) -> Result<Vec<f32>, Ccp4Error> {
    let width = match mode {
        0 => 1,
        1 | 6 => 2,
        2 => 4,
        _ => return Err(Ccp4Error::UnsupportedMode(mode)),
    };
    let expected = count * width;
    if body.len() < expected {
        return Err(Ccp4Error::Truncated {
            expected,
            found: body.len(),
        });
    }
    let body = &body[..expected];
    let values = match mode {
        0 => body.iter().map(|&b| b as i8 as f32).collect(),
        1 => body.chunks_exact(2).map(|c| B::read_i16(c) as f32).collect(),
        6 => body.chunks_exact(2).map(|c| B::read_u16(c) as f32).collect(),
        _ => body.chunks_exact(4).map(B::read_f32).collect(),
    };
    Ok(values)
}
