use crate::core::io::traits::StructureFile;
use crate::core::models::atom::Atom;
use crate::core::models::builder::{BuildError, StructureBuilder};
use crate::core::models::chain::{Chain, EntityType};
use crate::core::models::element::Element;
use crate::core::models::residue::Residue;
use crate::core::models::structure::Structure;
use crate::core::symmetry::unit_cell::UnitCell;
use nalgebra::Point3;
use std::io::{self, BufRead};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error("Inconsistent records: {0}")]
    Build(#[from] BuildError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Line is too short for {0} record")]
    LineTooShort(&'static str),
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

fn parse_float(line: &str, line_num: usize, start: usize, end: usize) -> Result<f64, PdbError> {
    let text = slice_and_trim(line, start, end);
    text.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: text.into(),
        },
    })
}

fn parse_float_or(line: &str, start: usize, end: usize, default: f64) -> f64 {
    slice_and_trim(line, start, end).parse().unwrap_or(default)
}

fn column_char(line: &str, idx: usize) -> Option<char> {
    line.get(idx..idx + 1)
        .and_then(|s| s.chars().next())
        .filter(|c| *c != ' ')
}

fn is_water(name: &str) -> bool {
    matches!(name, "HOH" | "WAT" | "DOD" | "H2O")
}

/// `DD-MMM-YY` to ISO 8601; years from 70 on belong to the 20th century.
fn pdb_date_to_iso(date: &str) -> Option<String> {
    const MONTHS: [&str; 12] = [
        "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
    ];
    let mut parts = date.split('-');
    let day: u32 = parts.next()?.parse().ok()?;
    let month_text = parts.next()?;
    let month = MONTHS.iter().position(|m| *m == month_text)?;
    let yy: u32 = parts.next()?.parse().ok()?;
    let century = if yy >= 70 { 1900 } else { 2000 };
    Some(format!("{:04}-{:02}-{:02}", century + yy, month + 1, day))
}

/// Element from columns 77-78, or guessed from the atom name field.
fn infer_element(line: &str, name: &str, polymer: bool) -> Element {
    let symbol = slice_and_trim(line, 76, 78);
    if !symbol.is_empty() {
        return Element::from_symbol(symbol);
    }
    if polymer {
        // Names like "1HG1" or "HG21" carry a one-letter element in polymers.
        return name
            .chars()
            .find(|c| c.is_ascii_alphabetic())
            .map(|c| Element::from_symbol(&c.to_string()))
            .unwrap_or(Element::X);
    }
    let field = line.get(12..14).unwrap_or("");
    let mut chars = field.chars();
    match chars.next() {
        Some(c) if c == ' ' || c.is_ascii_digit() => Element::from_symbol(chars.as_str()),
        Some(c) => {
            let two = Element::from_symbol(field);
            if two == Element::X {
                Element::from_symbol(c.encode_utf8(&mut [0; 4]))
            } else {
                two
            }
        }
        None => Element::X,
    }
}

/// Charge from columns 79-80, written as `2+` or `1-`.
fn parse_charge(line: &str) -> i32 {
    let text = slice_and_trim(line, 78, 80);
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    let magnitude = digits.parse::<i32>().unwrap_or(if text.is_empty() { 0 } else { 1 });
    if text.contains('-') { -magnitude } else { magnitude }
}

/// Sequential chain labels: A..Z, then AA, BA, ...
fn chain_label(index: usize) -> String {
    let mut label = String::new();
    let mut n = index;
    loop {
        label.push((b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    label
}

pub struct PdbFile;

#[derive(Default)]
struct ChainState {
    auth_name: Option<String>,
    entity_type: EntityType,
    label_count: usize,
    next_seq_id: i32,
    residue_key: Option<(i32, Option<char>, String)>,
}

impl StructureFile for PdbFile {
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead) -> Result<Structure, Self::Error> {
        let mut builder = StructureBuilder::new();
        let mut state = ChainState::default();

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let record_type = slice_and_trim(&line, 0, 6);

            match record_type {
                "HEADER" => {
                    let s = builder.structure_mut();
                    let keywords = slice_and_trim(&line, 10, 50);
                    if !keywords.is_empty() {
                        s.set_info("_struct_keywords.pdbx_keywords", keywords);
                    }
                    let date = slice_and_trim(&line, 50, 59);
                    if let Some(iso) = pdb_date_to_iso(date) {
                        s.set_info("_pdbx_database_status.recvd_initial_deposition_date", &iso);
                    }
                    let id = slice_and_trim(&line, 62, 66);
                    if !id.is_empty() {
                        s.set_info("_entry.id", id);
                    }
                }
                "EXPDTA" => {
                    let method = slice_and_trim(&line, 10, 80);
                    if !method.is_empty() {
                        builder.structure_mut().set_info("_exptl.method", method);
                    }
                }
                "CRYST1" => {
                    if line.len() < 54 {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::LineTooShort("CRYST1"),
                        });
                    }
                    let mut p = [0.0; 6];
                    let columns = [(6, 15), (15, 24), (24, 33), (33, 40), (40, 47), (47, 54)];
                    for (v, (start, end)) in p.iter_mut().zip(columns) {
                        *v = parse_float(&line, line_num, start, end)?;
                    }
                    let s = builder.structure_mut();
                    s.cell = UnitCell::from_array(p);
                    s.sg_hm = slice_and_trim(&line, 55, 66).to_string();
                }
                "MODEL" => {
                    let serial = slice_and_trim(&line, 10, 14);
                    let name = if serial.is_empty() { "1" } else { serial };
                    builder.start_model(name);
                    state = ChainState::default();
                }
                "ENDMDL" => {
                    builder.end_chain();
                    state.auth_name = None;
                }
                "TER" => {
                    builder.end_chain();
                    state.auth_name = None;
                }
                "END" => break,
                "ATOM" | "HETATM" => {
                    if line.len() < 54 {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::LineTooShort("ATOM/HETATM"),
                        });
                    }
                    if !builder.has_model() {
                        builder.start_model("1");
                    }
                    read_atom_record(&line, line_num, record_type == "ATOM", &mut builder, &mut state)?;
                }
                _ => {}
            }
        }

        let structure = builder.build();
        debug!(
            models = structure.model_count(),
            atoms = structure.atom_count(),
            "Read PDB"
        );
        Ok(structure)
    }
}

fn read_atom_record(
    line: &str,
    line_num: usize,
    is_atom: bool,
    builder: &mut StructureBuilder,
    state: &mut ChainState,
) -> Result<(), PdbError> {
    let name = slice_and_trim(line, 12, 16);
    let res_name = slice_and_trim(line, 17, 20);
    let auth_chain = slice_and_trim(line, 21, 22);
    let seq_text = slice_and_trim(line, 22, 26);
    let seq: i32 = seq_text.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidInt {
            columns: "23-26".into(),
            value: seq_text.into(),
        },
    })?;
    let ins_code = column_char(line, 26);
    let x = parse_float(line, line_num, 30, 38)?;
    let y = parse_float(line, line_num, 38, 46)?;
    let z = parse_float(line, line_num, 46, 54)?;

    let same_auth = state.auth_name.as_deref() == Some(auth_chain);
    let entity_type = if is_atom {
        EntityType::Polymer
    } else if is_water(res_name) {
        EntityType::Water
    } else if same_auth && state.entity_type == EntityType::Polymer {
        // Modified residues (e.g. MSE) written as HETATM inside a polymer chain.
        EntityType::Polymer
    } else {
        EntityType::NonPolymer
    };

    if !same_auth || entity_type != state.entity_type {
        let label = chain_label(state.label_count);
        state.label_count += 1;
        builder.start_chain(
            Chain::new(&label)
                .with_auth_name(auth_chain)
                .with_entity_type(entity_type),
        )?;
        state.auth_name = Some(auth_chain.to_string());
        state.entity_type = entity_type;
        state.next_seq_id = 1;
        state.residue_key = None;
    }

    let key = (seq, ins_code, res_name.to_string());
    if state.residue_key.as_ref() != Some(&key) {
        let mut residue = Residue::new(state.next_seq_id, res_name).with_auth_seq_id(seq);
        if let Some(code) = ins_code {
            residue = residue.with_ins_code(code);
        }
        builder.start_residue(residue)?;
        state.next_seq_id += 1;
        state.residue_key = Some(key);
    }

    let element = infer_element(line, name, entity_type == EntityType::Polymer);
    let mut atom = Atom::new(name, element, Point3::new(x, y, z)).with_charge(parse_charge(line));
    atom.altloc = column_char(line, 16);
    atom.occupancy = parse_float_or(line, 54, 60, 1.0) as f32;
    atom.b_iso = parse_float_or(line, 60, 66, 0.0) as f32;
    builder.add_atom(atom)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Write};
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
HEADER    HYDROLASE                               03-JAN-19   6ABC              
EXPDTA    X-RAY DIFFRACTION                                                     
CRYST1   40.000   50.000   60.000  90.00  95.00  90.00 P 1 21 1      2          
ATOM      1  N   MET A   1      11.104   6.134  -6.504  1.00 20.00           N  
ATOM      2  CA  MET A   1      11.639   6.071  -5.147  1.00 21.50           C  
ATOM      3  CA AGLY A   2A     12.000   7.000  -4.000  0.50 22.00           C  
ATOM      4  CA BGLY A   2A     12.100   7.100  -4.100  0.50 22.00           C  
HETATM    5 SE   MSE A   3      13.000   8.000  -3.000  1.00 30.00          SE  
TER       6      MSE A   3                                                      
HETATM    7 ZN    ZN A 101      20.000  20.000  20.000  1.00 40.00          ZN2+
HETATM    8  O   HOH A 201      21.000  21.000  21.000  1.00 50.00           O  
HETATM    9  O   HOH A 202      22.000  22.000  22.000  1.00 50.00           O  
ATOM     10  CA  ALA B   1       1.000   2.000   3.000  1.00 10.00           C  
END
";

    fn read(text: &str) -> Result<Structure, PdbError> {
        PdbFile::read_from(&mut BufReader::new(text.as_bytes()))
    }

    #[test]
    fn reads_header_metadata_and_cell() {
        let s = read(SAMPLE).unwrap();
        assert_eq!(s.get_info("_struct_keywords.pdbx_keywords", "?"), "HYDROLASE");
        assert_eq!(
            s.get_info("_pdbx_database_status.recvd_initial_deposition_date", "?"),
            "2019-01-03"
        );
        assert_eq!(s.get_info("_entry.id", "?"), "6ABC");
        assert_eq!(s.get_info("_exptl.method", "?"), "X-RAY DIFFRACTION");
        assert_eq!(s.get_info("_refine.ls_d_res_high", "?"), "?");
        assert_eq!(s.cell.b, 50.0);
        assert_eq!(s.cell.beta, 95.0);
        assert_eq!(s.sg_hm, "P 1 21 1");
    }

    #[test]
    fn splits_chains_by_entity_and_author_name() {
        let s = read(SAMPLE).unwrap();
        assert_eq!(s.model_count(), 1);
        let (model_id, model) = s.models().next().unwrap();
        assert_eq!(model.name, "1");
        let chains: Vec<_> = s.chains(model_id).map(|(_, c)| c.clone()).collect();
        let summary: Vec<_> = chains
            .iter()
            .map(|c| (c.name.as_str(), c.auth_name.as_str(), c.entity_type))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("A", "A", EntityType::Polymer),
                ("B", "A", EntityType::NonPolymer),
                ("C", "A", EntityType::Water),
                ("D", "B", EntityType::Polymer),
            ]
        );
    }

    #[test]
    fn residues_get_running_seq_ids_and_keep_author_numbers() {
        let s = read(SAMPLE).unwrap();
        let (model_id, _) = s.models().next().unwrap();
        let (chain_id, _) = s.chains(model_id).next().unwrap();
        let residues: Vec<_> = s.residues(chain_id).map(|(_, r)| r.clone()).collect();
        assert_eq!(residues.len(), 3);
        assert_eq!(residues[1].name, "GLY");
        assert_eq!(residues[1].seq_id, 2);
        assert_eq!(residues[1].ins_code, Some('A'));
        assert_eq!(residues[1].atoms().len(), 2);
        assert_eq!(residues[2].name, "MSE");
        assert!(residues.iter().take(2).all(|r| r.has_standard_pdb_name()));
        assert!(!residues[2].has_standard_pdb_name());

        let (water_chain, _) = s.chains(model_id).nth(2).unwrap();
        let waters: Vec<_> = s.residues(water_chain).map(|(_, r)| r.clone()).collect();
        assert_eq!(waters[1].seq_id, 2);
        assert_eq!(waters[1].seq_id_for_pdb(), 202);
    }

    #[test]
    fn atom_fields_are_read_from_fixed_columns() {
        let s = read(SAMPLE).unwrap();
        let (model_id, _) = s.models().next().unwrap();
        let atoms: Vec<Atom> = s.model_atoms(model_id).map(|(_, a)| a.clone()).collect();
        assert_eq!(atoms.len(), 9);
        assert_eq!(atoms[0].name, "N");
        assert_eq!(atoms[0].position, Point3::new(11.104, 6.134, -6.504));
        assert_eq!(atoms[2].altloc, Some('A'));
        assert_eq!(atoms[2].occupancy, 0.5);
        assert_eq!(atoms[2].b_iso, 22.0);
        assert_eq!(atoms[4].element, Element::SE);
        assert_eq!(atoms[5].element.symbol(), "Zn");
        assert_eq!(atoms[5].charge(), 2);
        assert_eq!(atoms[0].charge(), 0);
    }

    #[test]
    fn infers_elements_without_element_columns() {
        let line = "ATOM      1 HG21 THR A   1       0.000   0.000   0.000";
        assert_eq!(infer_element(line, "HG21", true), Element::H);
        let line = "HETATM    1 CL   CL  A   1       0.000   0.000   0.000";
        assert_eq!(infer_element(line, "CL", false).symbol(), "Cl");
        let line = "HETATM    1  C1  LIG A   1       0.000   0.000   0.000";
        assert_eq!(infer_element(line, "C1", false), Element::C);
    }

    #[test]
    fn non_ascii_atom_name_does_not_break_element_inference() {
        let line = "HETATM    1 éC  LIG A   1       0.000   0.000   0.000";
        assert_eq!(infer_element(line, "éC", false), Element::X);

        let s = read(line).unwrap();
        let (model_id, _) = s.models().next().unwrap();
        let atoms: Vec<Atom> = s.model_atoms(model_id).map(|(_, a)| a.clone()).collect();
        assert_eq!(atoms.len(), 1);
        assert_eq!(atoms[0].name, "éC");
        assert_eq!(atoms[0].element, Element::X);
    }

    #[test]
    fn multiple_models_each_get_their_chains() {
        let text = "\
MODEL        1
ATOM      1  CA  ALA A   1       1.000   2.000   3.000  1.00 10.00           C
ENDMDL
MODEL        2
ATOM      1  CA  ALA A   1       1.500   2.000   3.000  1.00 10.00           C
ENDMDL
";
        let s = read(text).unwrap();
        assert_eq!(s.model_count(), 2);
        let names: Vec<_> = s.models().map(|(_, m)| m.name.clone()).collect();
        assert_eq!(names, vec!["1", "2"]);
        let second = s.find_model_by_name("2").unwrap();
        assert_eq!(s.chains(second).next().unwrap().1.name, "A");
    }

    #[test]
    fn reports_bad_numbers_with_line() {
        let text = "ATOM      1  CA  ALA A   1       1.000   abc     3.000  1.00 10.00           C\n";
        match read(text) {
            Err(PdbError::Parse { line, kind }) => {
                assert_eq!(line, 1);
                assert!(matches!(kind, PdbParseErrorKind::InvalidFloat { .. }));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        let short = "ATOM      1  CA  ALA A   1       1.000\n";
        assert!(matches!(
            read(short),
            Err(PdbError::Parse {
                kind: PdbParseErrorKind::LineTooShort(_),
                ..
            })
        ));
    }

    #[test]
    fn helpers() {
        assert_eq!(chain_label(0), "A");
        assert_eq!(chain_label(25), "Z");
        assert_eq!(chain_label(26), "AA");
        assert_eq!(chain_label(27), "BA");
        assert_eq!(pdb_date_to_iso("15-MAR-95").as_deref(), Some("1995-03-15"));
        assert_eq!(pdb_date_to_iso("bad"), None);
        assert_eq!(parse_charge(&format!("{:78}1-", "")), -1);
        assert_eq!(parse_charge(&format!("{:78}2+", "")), 2);
        assert_eq!(parse_charge("ATOM"), 0);
    }

    #[test]
    fn reads_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let s = PdbFile::read_from_path(file.path()).unwrap();
        assert_eq!(s.atom_count(), 9);
    }
}
