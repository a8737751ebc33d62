use super::gz::MaybeGzipped;
use crate::core::symmetry::spacegroup::SpaceGroup;
use crate::core::symmetry::symop::SymOp;
use crate::core::symmetry::unit_cell::UnitCell;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

const RECORD_LEN: usize = 80;
/// Word (1-based) at which reflection data starts.
const DATA_WORD: usize = 21;
const LITTLE_ENDIAN_STAMP: [u8; 4] = [0x44, 0x41, 0x00, 0x00];
const BIG_ENDIAN_STAMP: [u8; 4] = [0x11, 0x11, 0x00, 0x00];

#[derive(Debug, Error)]
pub enum MtzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Not an MTZ file: missing 'MTZ ' tag")]
    NotMtz,
    #[error("MTZ file truncated: {0}")]
    Truncated(String),
    #[error("Invalid MTZ header record '{record}': {reason}")]
    InvalidHeader { record: String, reason: String },
    #[error("MTZ file has no datasets")]
    NoDataset,
    #[error("No dataset with id {0}")]
    UnknownDataset(i32),
    #[error("Data size mismatch: {columns} columns need a multiple of {columns} values, got {values}")]
    DataSize { columns: usize, values: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MtzDataset {
    pub id: i32,
    pub project_name: String,
    pub crystal_name: String,
    pub dataset_name: String,
    pub cell: UnitCell,
    pub wavelength: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MtzColumn {
    pub dataset_id: i32,
    /// One-letter MTZ column type, e.g. `H` for indices, `F` for amplitudes, `P` for phases.
    pub col_type: char,
    pub label: String,
    pub min_value: f32,
    pub max_value: f32,
    pub source: String,
    /// Position of the column within a reflection row.
    pub idx: usize,
}

/// `SYMINF` fields that are not implied by the `SYMM` records.
#[derive(Debug, Clone, PartialEq)]
pub struct SymInfo {
    /// Number of primitive operations.
    pub nsymp: i32,
    pub lattice: char,
    /// Point group as written in the record, e.g. `PG2/m`.
    pub point_group: String,
}

/// Reflection data in the CCP4 MTZ format.
///
/// Values are kept row-major: reflection `i`, column `j` is `data[i * ncol + j]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Mtz {
    pub title: String,
    pub cell: UnitCell,
    pub sort_order: [i32; 5],
    pub spacegroup: Option<&'static SpaceGroup>,
    pub spacegroup_number: i32,
    pub spacegroup_name: String,
    pub symops: Vec<SymOp>,
    /// `SYMINF` fields as read; written back unchanged until the space group is replaced.
    pub syminf: Option<SymInfo>,
    pub min_1_d2: f64,
    pub max_1_d2: f64,
    /// Value marking missing data; NaN unless the file says otherwise.
    pub valm: f32,
    pub datasets: Vec<MtzDataset>,
    pub columns: Vec<MtzColumn>,
    pub data: Vec<f32>,
    pub history: Vec<String>,
    /// Number of batches announced in the header.
    pub nbatches: i32,
    /// `BATCH` records from the main header.
    pub batch_records: Vec<String>,
    /// Everything from the `MTZBATS` record to the end of the file, kept verbatim.
    pub batch_tail: Vec<u8>,
    /// Byte order of the file this was read from; files are written back in the same order.
    pub little_endian: bool,
}

impl Default for Mtz {
    fn default() -> Self {
        Self {
            title: String::new(),
            cell: UnitCell::default(),
            sort_order: [0; 5],
            spacegroup: None,
            spacegroup_number: 0,
            spacegroup_name: String::new(),
            symops: Vec::new(),
            syminf: None,
            min_1_d2: 0.0,
            max_1_d2: 0.0,
            valm: f32::NAN,
            datasets: Vec::new(),
            columns: Vec::new(),
            data: Vec::new(),
            history: Vec::new(),
            nbatches: 0,
            batch_records: Vec::new(),
            batch_tail: Vec::new(),
            little_endian: true,
        }
    }
}

impl Mtz {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_spacegroup(&mut self, sg: &'static SpaceGroup) {
        self.spacegroup = Some(sg);
        self.spacegroup_number = sg.number as i32;
        self.spacegroup_name = sg.hm.to_string();
        self.symops = sg.operations();
        self.syminf = None;
    }

    pub fn nreflections(&self) -> usize {
        if self.columns.is_empty() {
            0
        } else {
            self.data.len() / self.columns.len()
        }
    }

    /// Appends a dataset with the next free id; project and crystal default to its name.
    pub fn add_dataset(&mut self, name: &str) -> &mut MtzDataset {
        let id = self.datasets.iter().map(|d| d.id + 1).max().unwrap_or(0);
        let cell = self.cell;
        self.datasets.push(MtzDataset {
            id,
            project_name: name.to_string(),
            crystal_name: name.to_string(),
            dataset_name: name.to_string(),
            cell,
            wavelength: 0.0,
        });
        let last = self.datasets.len() - 1;
        &mut self.datasets[last]
    }

    pub fn dataset(&self, id: i32) -> Option<&MtzDataset> {
        self.datasets.iter().find(|d| d.id == id)
    }

    pub fn dataset_with_name(&self, name: &str) -> Option<&MtzDataset> {
        self.datasets.iter().find(|d| d.dataset_name == name)
    }

    pub fn column_with_label(&self, label: &str) -> Option<&MtzColumn> {
        self.columns.iter().find(|c| c.label == label)
    }

    /// Values of one column, one per reflection.
    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = f32> + '_ {
        let ncol = self.columns.len().max(1);
        self.data.iter().skip(idx).step_by(ncol).copied()
    }

    /// Registers a new column at the end of each row, in the given dataset or the
    /// last one. Existing rows are not touched; see [`expand_data_rows`](Self::expand_data_rows).
    pub fn add_column(
        &mut self,
        label: &str,
        col_type: char,
        dataset_id: Option<i32>,
    ) -> Result<&mut MtzColumn, MtzError> {
        let dataset_id = match dataset_id {
            Some(id) => self.dataset(id).ok_or(MtzError::UnknownDataset(id))?.id,
            None => self.datasets.last().ok_or(MtzError::NoDataset)?.id,
        };
        let idx = self.columns.len();
        self.columns.push(MtzColumn {
            dataset_id,
            col_type,
            label: label.to_string(),
            min_value: 0.0,
            max_value: 0.0,
            source: String::new(),
            idx,
        });
        Ok(&mut self.columns[idx])
    }

    /// Widens every row by `added` values (NaN) after columns were appended.
    pub fn expand_data_rows(&mut self, added: usize) -> Result<(), MtzError> {
        let new_ncol = self.columns.len();
        let old_ncol = new_ncol.saturating_sub(added);
        if old_ncol == 0 {
            return Ok(());
        }
        if self.data.len() % old_ncol != 0 {
            return Err(MtzError::DataSize {
                columns: old_ncol,
                values: self.data.len(),
            });
        }
        let nrefl = self.data.len() / old_ncol;
        let mut data = Vec::with_capacity(nrefl * new_ncol);
        for row in self.data.chunks_exact(old_ncol) {
            data.extend_from_slice(row);
            data.extend(std::iter::repeat_n(f32::NAN, added));
        }
        self.data = data;
        Ok(())
    }

    /// Lowest and highest resolution in Angstroms, `(d_max, d_min)`.
    pub fn resolution_range(&self) -> (f64, f64) {
        let d = |x: f64| if x > 0.0 { 1.0 / x.sqrt() } else { f64::INFINITY };
        (d(self.min_1_d2), d(self.max_1_d2))
    }

    fn has_miller_indices(&self) -> bool {
        self.columns.len() >= 3 && self.columns[..3].iter().all(|c| c.col_type == 'H')
    }

    fn update_statistics(&mut self) {
        let ncol = self.columns.len();
        for (j, col) in self.columns.iter_mut().enumerate() {
            let (mut lo, mut hi) = (f32::INFINITY, f32::NEG_INFINITY);
            for x in self.data.iter().skip(j).step_by(ncol.max(1)) {
                if !x.is_nan() {
                    lo = lo.min(*x);
                    hi = hi.max(*x);
                }
            }
            if lo <= hi {
                col.min_value = lo;
                col.max_value = hi;
            } else {
                col.min_value = 0.0;
                col.max_value = 0.0;
            }
        }
        if self.has_miller_indices() && !self.data.is_empty() {
            let (mut lo, mut hi) = (f64::INFINITY, 0.0f64);
            for row in self.data.chunks_exact(ncol) {
                let inv_d2 = self
                    .cell
                    .calculate_1_d2(row[0] as i32, row[1] as i32, row[2] as i32);
                lo = lo.min(inv_d2);
                hi = hi.max(inv_d2);
            }
            self.min_1_d2 = lo;
            self.max_1_d2 = hi;
        }
    }

    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Self, MtzError> {
        let bytes = MaybeGzipped::new(path).read_all()?;
        Self::from_bytes(&bytes)
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, MtzError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MtzError> {
        if bytes.len() < DATA_WORD * 4 - 4 {
            return Err(MtzError::Truncated(format!("{} bytes", bytes.len())));
        }
        if &bytes[..4] != b"MTZ " {
            return Err(MtzError::NotMtz);
        }
        match bytes[8] >> 4 {
            4 => parse::<LittleEndian>(bytes, true),
            1 => parse::<BigEndian>(bytes, false),
            other => {
                warn!(stamp = other, "Unknown MTZ machine stamp, assuming little-endian");
                parse::<LittleEndian>(bytes, true)
            }
        }
    }

    /// Writes the file in the byte order it was read with (little-endian for new
    /// files), so that an opaque batch tail stays consistent with the stamp.
    /// Column ranges and resolution limits are recomputed from the data.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), MtzError> {
        if self.little_endian {
            self.write_with::<LittleEndian, W>(writer, LITTLE_ENDIAN_STAMP)
        } else {
            self.write_with::<BigEndian, W>(writer, BIG_ENDIAN_STAMP)
        }
    }

    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<(), MtzError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    fn write_with<B: ByteOrder, W: Write>(
        &self,
        writer: &mut W,
        stamp: [u8; 4],
    ) -> Result<(), MtzError> {
        let ncol = self.columns.len();
        if ncol > 0 && self.data.len() % ncol != 0 {
            return Err(MtzError::DataSize {
                columns: ncol,
                values: self.data.len(),
            });
        }
        let mut out = self.clone();
        out.update_statistics();
        let nrefl = out.nreflections();

        let mut head = [0u8; DATA_WORD * 4 - 4];
        head[..4].copy_from_slice(b"MTZ ");
        B::write_i32(&mut head[4..8], (DATA_WORD + ncol * nrefl) as i32);
        head[8..12].copy_from_slice(&stamp);
        writer.write_all(&head)?;

        let mut body = vec![0u8; out.data.len() * 4];
        B::write_f32_into(&out.data, &mut body);
        writer.write_all(&body)?;

        for record in out.header_records(nrefl) {
            writer.write_all(&pad_record(&record))?;
        }
        if !out.history.is_empty() {
            writer.write_all(&pad_record(&format!("MTZHIST {:3}", out.history.len())))?;
            for line in &out.history {
                writer.write_all(&pad_record(line))?;
            }
        }
        if out.batch_tail.is_empty() {
            writer.write_all(&pad_record("MTZENDOFHEADERS"))?;
        } else {
            writer.write_all(&out.batch_tail)?;
        }
        debug!(ncol, nrefl, "Wrote MTZ");
        Ok(())
    }

    fn header_records(&self, nrefl: usize) -> Vec<String> {
        let c = &self.cell;
        let mut records = vec![
            "VERS MTZ:V1.1".to_string(),
            format!("TITLE {}", self.title),
            format!("NCOL {:8} {:12} {:8}", self.columns.len(), nrefl, self.nbatches),
            format!(
                "CELL  {:9.4} {:9.4} {:9.4} {:9.4} {:9.4} {:9.4}",
                c.a, c.b, c.c, c.alpha, c.beta, c.gamma
            ),
            format!(
                "SORT  {:3} {:3} {:3} {:3} {:3}",
                self.sort_order[0],
                self.sort_order[1],
                self.sort_order[2],
                self.sort_order[3],
                self.sort_order[4]
            ),
        ];
        let (nsymp, lattice, point_group) = match (&self.syminf, self.spacegroup) {
            (Some(info), _) => (info.nsymp as usize, info.lattice, info.point_group.clone()),
            (None, Some(sg)) => (
                sg.primitive_operations().len(),
                sg.lattice(),
                format!("PG{}", sg.point_group),
            ),
            (None, None) => (self.symops.len(), 'P', "PG1".to_string()),
        };
        records.push(format!(
            "SYMINF {:3} {:2} {} {:5} {:>22} {:>5}",
            self.symops.len(),
            nsymp,
            lattice,
            self.spacegroup_number,
            format!("'{}'", self.spacegroup_name),
            point_group
        ));
        for op in &self.symops {
            records.push(format!("SYMM {}", op.triplet()));
        }
        records.push(format!("RESO {:<20.12} {:<20.12}", self.min_1_d2, self.max_1_d2));
        records.push(if self.valm.is_nan() {
            "VALM NAN".to_string()
        } else {
            format!("VALM {}", self.valm)
        });
        for col in &self.columns {
            records.push(format!(
                "COLUMN {:<30} {} {:17.4} {:17.4} {:4}",
                col.label, col.col_type, col.min_value, col.max_value, col.dataset_id
            ));
            if !col.source.is_empty() {
                records.push(format!(
                    "COLSRC {:<30} {:<36}  {:4}",
                    col.label, col.source, col.dataset_id
                ));
            }
        }
        records.push(format!("NDIF {:8}", self.datasets.len()));
        for ds in &self.datasets {
            let dc = &ds.cell;
            records.push(format!("PROJECT {:7} {}", ds.id, ds.project_name));
            records.push(format!("CRYSTAL {:7} {}", ds.id, ds.crystal_name));
            records.push(format!("DATASET {:7} {}", ds.id, ds.dataset_name));
            records.push(format!(
                "DCELL {:9} {:10.4} {:10.4} {:10.4} {:10.4} {:10.4} {:10.4}",
                ds.id, dc.a, dc.b, dc.c, dc.alpha, dc.beta, dc.gamma
            ));
            records.push(format!("DWAVEL {:8} {:10.5}", ds.id, ds.wavelength));
        }
        records.extend(self.batch_records.iter().cloned());
        records.push("END".to_string());
        records
    }
}

fn pad_record(text: &str) -> [u8; RECORD_LEN] {
    let mut rec = [b' '; RECORD_LEN];
    let bytes = text.as_bytes();
    let n = bytes.len().min(RECORD_LEN);
    rec[..n].copy_from_slice(&bytes[..n]);
    rec
}

fn invalid(record: &str, reason: &str) -> MtzError {
    MtzError::InvalidHeader {
        record: record.to_string(),
        reason: reason.to_string(),
    }
}

fn num<T: std::str::FromStr>(record: &str, token: Option<&str>) -> Result<T, MtzError> {
    token
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| invalid(record, "missing or malformed number"))
}

fn dataset_entry(mtz: &mut Mtz, id: i32) -> &mut MtzDataset {
    let pos = match mtz.datasets.iter().position(|d| d.id == id) {
        Some(pos) => pos,
        None => {
            mtz.datasets.push(MtzDataset {
                id,
                project_name: String::new(),
                crystal_name: String::new(),
                dataset_name: String::new(),
                cell: mtz.cell,
                wavelength: 0.0,
            });
            mtz.datasets.len() - 1
        }
    };
    &mut mtz.datasets[pos]
}

/// Splits `"ID NAME..."` into the id and the (possibly empty) name.
fn id_and_name<'a>(record: &str, rest: &'a str) -> Result<(i32, &'a str), MtzError> {
    let rest = rest.trim_start();
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let id = num(record, Some(&rest[..end]))?;
    Ok((id, rest[end..].trim()))
}

fn parse<B: ByteOrder>(bytes: &[u8], little_endian: bool) -> Result<Mtz, MtzError> {
    let header_word = B::read_i32(&bytes[4..8]);
    if header_word <= 0 {
        return Err(MtzError::Truncated(format!("bad header offset {header_word}")));
    }
    let mut pos = (header_word as usize - 1) * 4;
    if pos > bytes.len() {
        return Err(MtzError::Truncated(format!(
            "header at byte {pos} beyond end of file ({} bytes)",
            bytes.len()
        )));
    }

    let mut mtz = Mtz::new();
    mtz.little_endian = little_endian;
    let mut ncol = 0usize;
    let mut nrefl = 0usize;
    let mut seen_end = false;
    while pos + RECORD_LEN <= bytes.len() {
        let record = String::from_utf8_lossy(&bytes[pos..pos + RECORD_LEN])
            .trim_end()
            .to_string();
        pos += RECORD_LEN;
        let (key, rest) = match record.find(' ') {
            Some(i) => (&record[..i], &record[i + 1..]),
            None => (record.as_str(), ""),
        };
        let mut tokens = rest.split_whitespace();
        match key.to_ascii_uppercase().as_str() {
            "VERS" => {}
            "TITLE" => mtz.title = rest.trim().to_string(),
            "NCOL" => {
                ncol = num(&record, tokens.next())?;
                nrefl = num(&record, tokens.next())?;
                mtz.nbatches = tokens.next().and_then(|t| t.parse().ok()).unwrap_or(0);
            }
            "CELL" => {
                let mut p = [0.0; 6];
                for v in &mut p {
                    *v = num(&record, tokens.next())?;
                }
                mtz.cell = UnitCell::from_array(p);
            }
            "SORT" => {
                for v in &mut mtz.sort_order {
                    *v = num(&record, tokens.next())?;
                }
            }
            "SYMINF" => {
                let _nsym: i32 = num(&record, tokens.next())?;
                let nsymp = num(&record, tokens.next())?;
                let lattice = tokens
                    .next()
                    .and_then(|t| t.chars().next())
                    .ok_or_else(|| invalid(&record, "missing lattice type"))?;
                mtz.spacegroup_number = num(&record, tokens.next())?;
                let point_group = match (rest.find('\''), rest.rfind('\'')) {
                    (Some(a), Some(b)) if b > a => {
                        mtz.spacegroup_name = rest[a + 1..b].to_string();
                        rest[b + 1..].split_whitespace().next()
                    }
                    _ => {
                        mtz.spacegroup_name = tokens.next().unwrap_or_default().to_string();
                        tokens.next()
                    }
                };
                mtz.syminf = Some(SymInfo {
                    nsymp,
                    lattice,
                    point_group: point_group.unwrap_or("PG1").to_string(),
                });
                mtz.spacegroup = SpaceGroup::find_by_number(mtz.spacegroup_number)
                    .or_else(|| SpaceGroup::find_by_name(&mtz.spacegroup_name));
            }
            "SYMM" => {
                let op = SymOp::parse(rest.trim()).map_err(|e| invalid(&record, &e.to_string()))?;
                mtz.symops.push(op);
            }
            "RESO" => {
                mtz.min_1_d2 = num(&record, tokens.next())?;
                mtz.max_1_d2 = num(&record, tokens.next())?;
            }
            "VALM" => {
                mtz.valm = match tokens.next() {
                    Some("NAN") | None => f32::NAN,
                    Some(t) => t.parse().map_err(|_| invalid(&record, "bad VALM"))?,
                };
            }
            "COLUMN" => {
                let label = tokens
                    .next()
                    .ok_or_else(|| invalid(&record, "missing label"))?
                    .to_string();
                let col_type = tokens
                    .next()
                    .and_then(|t| t.chars().next())
                    .ok_or_else(|| invalid(&record, "missing type"))?;
                let min_value = num(&record, tokens.next())?;
                let max_value = num(&record, tokens.next())?;
                let dataset_id = tokens.next().and_then(|t| t.parse().ok()).unwrap_or(0);
                let idx = mtz.columns.len();
                mtz.columns.push(MtzColumn {
                    dataset_id,
                    col_type,
                    label,
                    min_value,
                    max_value,
                    source: String::new(),
                    idx,
                });
            }
            "COLSRC" => {
                let label = tokens.next().unwrap_or_default();
                let source = tokens.next().unwrap_or_default().to_string();
                if let Some(col) = mtz.columns.iter_mut().rev().find(|c| c.label == label) {
                    col.source = source;
                }
            }
            "NDIF" => {}
            "PROJECT" => {
                let (id, name) = id_and_name(&record, rest)?;
                dataset_entry(&mut mtz, id).project_name = name.to_string();
            }
            "CRYSTAL" => {
                let (id, name) = id_and_name(&record, rest)?;
                dataset_entry(&mut mtz, id).crystal_name = name.to_string();
            }
            "DATASET" => {
                let (id, name) = id_and_name(&record, rest)?;
                dataset_entry(&mut mtz, id).dataset_name = name.to_string();
            }
            "DCELL" => {
                let id = num(&record, tokens.next())?;
                let mut p = [0.0; 6];
                for v in &mut p {
                    *v = num(&record, tokens.next())?;
                }
                dataset_entry(&mut mtz, id).cell = UnitCell::from_array(p);
            }
            "DWAVEL" => {
                let id = num(&record, tokens.next())?;
                let wavelength = num(&record, tokens.next())?;
                dataset_entry(&mut mtz, id).wavelength = wavelength;
            }
            "BATCH" => mtz.batch_records.push(record.clone()),
            "END" => {
                seen_end = true;
                break;
            }
            other => debug!(record = other, "Skipping MTZ header record"),
        }
    }
    if !seen_end {
        return Err(MtzError::Truncated("no END record in header".to_string()));
    }

    while pos + RECORD_LEN <= bytes.len() {
        let record = String::from_utf8_lossy(&bytes[pos..pos + RECORD_LEN])
            .trim_end()
            .to_string();
        if record.starts_with("MTZBATS") {
            mtz.batch_tail = bytes[pos..].to_vec();
            break;
        }
        pos += RECORD_LEN;
        if record.starts_with("MTZENDOFHEADERS") {
            break;
        }
        if let Some(n) = record.strip_prefix("MTZHIST") {
            let n: usize = num(&record, n.split_whitespace().next())?;
            for _ in 0..n {
                if pos + RECORD_LEN > bytes.len() {
                    break;
                }
                let line = String::from_utf8_lossy(&bytes[pos..pos + RECORD_LEN]);
                mtz.history.push(line.trim_end().to_string());
                pos += RECORD_LEN;
            }
        }
    }

    if mtz.columns.len() != ncol {
        warn!(
            declared = ncol,
            found = mtz.columns.len(),
            "Column count in NCOL differs from COLUMN records"
        );
    }
    let start = (DATA_WORD - 1) * 4;
    let end = start + 4 * mtz.columns.len() * nrefl;
    if end > bytes.len() {
        return Err(MtzError::Truncated(format!(
            "{nrefl} reflections need {end} bytes, file has {}",
            bytes.len()
        )));
    }
    mtz.data = vec![0.0; mtz.columns.len() * nrefl];
    B::read_f32_into(&bytes[start..end], &mut mtz.data);
    debug!(ncol = mtz.columns.len(), nrefl, "Read MTZ");
    Ok(mtz)
}
