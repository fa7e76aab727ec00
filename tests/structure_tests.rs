use std::collections::BTreeMap;

use approx::assert_relative_eq;
use mcsqs_rs::prepare::minimum_supercell_size;
use mcsqs_rs::structure::{atat_format, Lattice, Site, Structure};
use tempfile::tempdir;

fn lattice(a: f64) -> Lattice {
    Lattice::from_rows([[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]])
}

fn site(coords: [f64; 3], occupancies: &[(&str, f64)]) -> Site {
    let species: BTreeMap<String, f64> = occupancies
        .iter()
        .map(|(sp, occ)| (sp.to_string(), *occ))
        .collect();
    Site::new(coords, species).unwrap()
}

#[test]
fn test_atat_file_round_trip() {
    let structure = Structure::new(
        lattice(3.2),
        vec![
            site([0.0, 0.0, 0.0], &[("Fe", 0.5), ("Ni", 0.5)]),
            site([0.5, 0.5, 0.0], &[("Cr", 0.25), ("Ni", 0.75)]),
            Site::ordered([0.5, 0.5, 0.5], "O"),
        ],
    )
    .unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("rndstr.in");
    atat_format::write_structure(&path, &structure).unwrap();
    let back = atat_format::read_structure(&path).unwrap();

    assert!(structure.matches(&back, 1e-5));
    assert!(!back.is_ordered());
    assert_eq!(back.num_sites(), 3);
}

#[test]
fn test_minimum_supercell_from_denominators() {
    // 1/2 and 1/2 -> 2
    let s = Structure::new(
        lattice(2.0),
        vec![site([0.0, 0.0, 0.0], &[("Fe", 0.5), ("Ni", 0.5)])],
    )
    .unwrap();
    assert_eq!(minimum_supercell_size(&s), 2);

    // 5/8 and 3/8 -> 8
    let s = Structure::new(
        lattice(2.0),
        vec![site([0.0, 0.0, 0.0], &[("Fe", 0.625), ("Ni", 0.375)])],
    )
    .unwrap();
    assert_eq!(minimum_supercell_size(&s), 8);

    // mixed sites: the largest denominator anywhere wins
    let s = Structure::new(
        lattice(2.0),
        vec![
            site([0.0, 0.0, 0.0], &[("Fe", 0.5), ("Ni", 0.5)]),
            site([0.5, 0.5, 0.5], &[("Cr", 0.2), ("Mn", 0.8)]),
        ],
    )
    .unwrap();
    assert_eq!(minimum_supercell_size(&s), 5);
}

#[test]
fn test_minimum_supercell_denominator_cap() {
    // an irrational-ish occupancy is capped at denominator 100
    let s = Structure::new(
        lattice(2.0),
        vec![site(
            [0.0, 0.0, 0.0],
            &[("Fe", 0.514_159_265), ("Ni", 0.485_840_735)],
        )],
    )
    .unwrap();
    assert!(minimum_supercell_size(&s) <= 100);
}

#[test]
fn test_discretize_then_rescale_pipeline() {
    let original = Structure::new(
        lattice(2.0),
        vec![site([0.0, 0.0, 0.0], &[("Fe", 0.332), ("Ni", 0.668)])],
    )
    .unwrap();

    let transformed = original
        .discretize_occupancies(8)
        .unwrap()
        .scaled_to_volume(1.0)
        .unwrap();

    assert_relative_eq!(transformed.lattice().volume(), 1.0, epsilon = 1e-12);
    assert_relative_eq!(transformed.sites()[0].species["Fe"], 1.0 / 3.0);
    // the input is left alone
    assert_relative_eq!(original.lattice().volume(), 8.0);
    assert_relative_eq!(original.sites()[0].species["Fe"], 0.332);
}

#[test]
fn test_anonymized_formula_is_species_blind() {
    let fe_ni = Structure::new(
        lattice(2.0),
        vec![site([0.0, 0.0, 0.0], &[("Fe", 0.5), ("Ni", 0.5)])],
    )
    .unwrap();
    let cu_zn = Structure::new(
        lattice(2.0),
        vec![site([0.0, 0.0, 0.0], &[("Cu", 0.5), ("Zn", 0.5)])],
    )
    .unwrap();
    assert_eq!(
        fe_ni.composition().anonymized_formula(),
        cu_zn.composition().anonymized_formula()
    );
    assert_eq!(fe_ni.composition().anonymized_formula(), "AB");
}
