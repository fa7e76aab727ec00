/*
MIT License with ATAT Attribution

Copyright (c) 2025 mcsqs-rs contributors

Interoperates with the mcsqs code from the ATAT toolkit
(Alloy Theoretic Automated Toolkit) by Axel van de Walle et al.
All rights reserved.
*/

//! Reader and writer for the ATAT structure file format
//!
//! This is the plain-text convention shared by `rndstr.in` and
//! `bestsqs.out`. A file consists of:
//!
//! 1. a coordinate system, either one line `a b c alpha beta gamma` or three
//!    lines of Cartesian axis vectors;
//! 2. three lines of (super)cell vectors, expressed in multiples of the
//!    coordinate-system axes;
//! 3. one line per site, `x y z Sp` or `x y z Sp1=occ1,Sp2=occ2`, with
//!    coordinates in multiples of the coordinate-system axes.
//!
//! The writer always emits the three-axis form with an identity cell block,
//! which is what mcsqs expects in `rndstr.in`; the reader accepts both forms
//! so it can also parse what mcsqs writes back out.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use nalgebra::{Matrix3, RowVector3};

use super::errors::{Result, StructureError};
use super::{Lattice, Site, Structure};
use crate::utils::format_float;

/// Serialize a structure to the ATAT text format.
pub fn to_atat_string(structure: &Structure) -> String {
    let mut out = String::new();
    for row in structure.lattice().rows() {
        out.push_str(&format!("{:.6} {:.6} {:.6}\n", row[0], row[1], row[2]));
    }
    out.push_str("1.000000 0.000000 0.000000\n");
    out.push_str("0.000000 1.000000 0.000000\n");
    out.push_str("0.000000 0.000000 1.000000\n");
    for site in structure.sites() {
        let species = site
            .species
            .iter()
            .map(|(name, occ)| {
                if site.species.len() == 1 && (occ - 1.0).abs() < 1e-6 {
                    name.clone()
                } else {
                    format!("{}={}", name, format_float(*occ))
                }
            })
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&format!(
            "{:.6} {:.6} {:.6} {}\n",
            site.coords[0], site.coords[1], site.coords[2], species
        ));
    }
    out
}

/// Parse a structure from the ATAT text format.
pub fn from_atat_string(text: &str) -> Result<Structure> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let mut cursor = 0;

    let axes = parse_coordinate_system(&lines, &mut cursor)?;
    let cell = parse_matrix_rows(&lines, &mut cursor, "cell vectors")?;

    let cell_matrix = Matrix3::from_rows(&[
        RowVector3::new(cell[0][0], cell[0][1], cell[0][2]),
        RowVector3::new(cell[1][0], cell[1][1], cell[1][2]),
        RowVector3::new(cell[2][0], cell[2][1], cell[2][2]),
    ]);
    let cell_inverse = cell_matrix.try_inverse().ok_or_else(|| {
        StructureError::InvalidLattice("cell vectors are singular".to_string())
    })?;

    // full lattice rows = cell * axes (row-vector convention)
    let full = cell_matrix * axes.matrix();
    let lattice = Lattice::from_rows([
        [full[(0, 0)], full[(0, 1)], full[(0, 2)]],
        [full[(1, 0)], full[(1, 1)], full[(1, 2)]],
        [full[(2, 0)], full[(2, 1)], full[(2, 2)]],
    ]);

    let mut sites = Vec::new();
    for line in &lines[cursor..] {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 4 {
            return Err(StructureError::ParseError(format!(
                "site line needs coordinates and a species: {:?}",
                line
            )));
        }
        let coords = [
            parse_number(tokens[0])?,
            parse_number(tokens[1])?,
            parse_number(tokens[2])?,
        ];
        // site coordinates are in axis units; convert to fractional
        // coordinates of the full lattice
        let frac = RowVector3::new(coords[0], coords[1], coords[2]) * cell_inverse;
        let coords = [
            frac[0].rem_euclid(1.0),
            frac[1].rem_euclid(1.0),
            frac[2].rem_euclid(1.0),
        ];
        let species = parse_species(&tokens[3..].join(""))?;
        sites.push(Site::new(coords, species)?);
    }

    Structure::new(lattice, sites)
}

/// Read a structure from an ATAT-format file.
pub fn read_structure<P: AsRef<Path>>(path: P) -> Result<Structure> {
    let text = fs::read_to_string(path)?;
    from_atat_string(&text)
}

/// Write a structure to an ATAT-format file.
pub fn write_structure<P: AsRef<Path>>(path: P, structure: &Structure) -> Result<()> {
    fs::write(path, to_atat_string(structure))?;
    Ok(())
}

fn parse_coordinate_system(lines: &[&str], cursor: &mut usize) -> Result<Lattice> {
    let first = lines.get(*cursor).ok_or_else(|| {
        StructureError::ParseError("empty structure file".to_string())
    })?;
    let tokens: Vec<&str> = first.split_whitespace().collect();
    match tokens.len() {
        6 => {
            *cursor += 1;
            let v: Vec<f64> = tokens
                .iter()
                .map(|t| parse_number(t))
                .collect::<Result<_>>()?;
            Lattice::from_parameters(v[0], v[1], v[2], v[3], v[4], v[5])
        }
        3 => {
            let rows = parse_matrix_rows(lines, cursor, "coordinate system")?;
            Ok(Lattice::from_rows(rows))
        }
        n => Err(StructureError::ParseError(format!(
            "coordinate system line must hold 3 or 6 numbers, found {}: {:?}",
            n, first
        ))),
    }
}

fn parse_matrix_rows(lines: &[&str], cursor: &mut usize, what: &str) -> Result<[[f64; 3]; 3]> {
    let mut rows = [[0.0; 3]; 3];
    for row in &mut rows {
        let line = lines.get(*cursor).ok_or_else(|| {
            StructureError::ParseError(format!("unexpected end of file reading {}", what))
        })?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 3 {
            return Err(StructureError::ParseError(format!(
                "expected 3 numbers for {}, got: {:?}",
                what, line
            )));
        }
        for (i, token) in tokens.iter().enumerate() {
            row[i] = parse_number(token)?;
        }
        *cursor += 1;
    }
    Ok(rows)
}

fn parse_species(spec: &str) -> Result<BTreeMap<String, f64>> {
    let mut species = BTreeMap::new();
    for part in spec.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match part.split_once('=') {
            Some((name, occ)) => {
                species.insert(name.trim().to_string(), parse_number(occ.trim())?);
            }
            None => {
                species.insert(part.to_string(), 1.0);
            }
        }
    }
    if species.is_empty() {
        return Err(StructureError::ParseError(format!(
            "no species in occupation spec: {:?}",
            spec
        )));
    }
    Ok(species)
}

fn parse_number(token: &str) -> Result<f64> {
    token
        .parse::<f64>()
        .map_err(|_| StructureError::ParseError(format!("not a number: {:?}", token)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn disordered() -> Structure {
        let lattice = Lattice::from_rows([[2.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 2.0]]);
        let mut species = BTreeMap::new();
        species.insert("Fe".to_string(), 0.5);
        species.insert("Ni".to_string(), 0.5);
        Structure::new(
            lattice,
            vec![
                Site::new([0.0, 0.0, 0.0], species).unwrap(),
                Site::ordered([0.5, 0.5, 0.5], "O"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_round_trip() {
        let structure = disordered();
        let text = to_atat_string(&structure);
        let back = from_atat_string(&text).unwrap();
        assert!(structure.matches(&back, 1e-5));
    }

    #[test]
    fn test_writer_layout() {
        let text = to_atat_string(&disordered());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "2.000000 0.000000 0.000000");
        assert_eq!(lines[3], "1.000000 0.000000 0.000000");
        assert_eq!(lines[6], "0.000000 0.000000 0.000000 Fe=0.5,Ni=0.5");
        assert_eq!(lines[7], "0.500000 0.500000 0.500000 O");
    }

    #[test]
    fn test_parse_six_parameter_header() {
        let text = "\
2.0 2.0 2.0 90.0 90.0 90.0
1 0 0
0 1 0
0 0 1
0.0 0.0 0.0 Fe=0.5,Ni=0.5
";
        let structure = from_atat_string(text).unwrap();
        assert_eq!(structure.num_sites(), 1);
        assert_relative_eq!(structure.lattice().volume(), 8.0, epsilon = 1e-10);
        assert_relative_eq!(structure.sites()[0].species["Fe"], 0.5);
    }

    #[test]
    fn test_parse_supercell_output() {
        // a 2x1x1 supercell of a cubic cell, the shape mcsqs writes out
        let text = "\
2.0 0.0 0.0
0.0 2.0 0.0
0.0 0.0 2.0
2 0 0
0 1 0
0 0 1
0.0 0.0 0.0 Fe
1.0 0.0 0.0 Ni
";
        let structure = from_atat_string(text).unwrap();
        assert_eq!(structure.num_sites(), 2);
        assert_relative_eq!(structure.lattice().volume(), 16.0, epsilon = 1e-10);
        let [a, _, _] = structure.lattice().abc();
        assert_relative_eq!(a, 4.0, epsilon = 1e-10);
        // the second atom sits halfway along the doubled axis
        assert_relative_eq!(structure.sites()[1].coords[0], 0.5, epsilon = 1e-10);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(from_atat_string("").is_err());
        assert!(from_atat_string("1 2\n").is_err());
        assert!(from_atat_string("1 0 0\n0 1 0\n0 0 1\n1 0 0\n0 1 0\n0 0 1\nnot a site\n").is_err());
    }
}
