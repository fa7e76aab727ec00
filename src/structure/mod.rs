/*
MIT License with ATAT Attribution

Copyright (c) 2025 mcsqs-rs contributors

Interoperates with the mcsqs code from the ATAT toolkit
(Alloy Theoretic Automated Toolkit) by Axel van de Walle et al.
All rights reserved.
*/

//! Crystal structure representation
//!
//! A [`Structure`] is a [`Lattice`] plus a list of [`Site`]s with fractional
//! coordinates. Sites may be partially occupied by several species, which is
//! what makes a structure "disordered" and a candidate for an SQS search.
//!
//! Transformations (occupancy discretization, volume rescaling) return new
//! structures; the caller's structure is never mutated, so the structure
//! written to `rndstr.in` can never alias the one the caller keeps.

pub mod atat_format;
pub mod composition;
pub mod errors;
pub mod lattice;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use composition::Composition;
pub use errors::{Result, StructureError};
pub use lattice::Lattice;

/// Tolerance on summed site occupancies.
const OCCUPANCY_TOL: f64 = 1e-6;
/// Tolerance used by approximate structural equality.
const MATCH_TOL: f64 = 1e-8;

/// One crystallographic site: fractional coordinates plus a species →
/// occupancy map. A fully ordered site holds a single species with
/// occupancy 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub coords: [f64; 3],
    pub species: BTreeMap<String, f64>,
}

impl Site {
    /// Create a site from fractional coordinates and species occupancies.
    pub fn new(coords: [f64; 3], species: BTreeMap<String, f64>) -> Result<Self> {
        if species.is_empty() {
            return Err(StructureError::InvalidOccupancy(
                "site must hold at least one species".to_string(),
            ));
        }
        let total: f64 = species.values().sum();
        if total > 1.0 + OCCUPANCY_TOL {
            return Err(StructureError::InvalidOccupancy(format!(
                "site occupancies sum to {} (> 1)",
                total
            )));
        }
        if species.values().any(|occ| *occ <= 0.0) {
            return Err(StructureError::InvalidOccupancy(
                "site occupancies must be positive".to_string(),
            ));
        }
        Ok(Self { coords, species })
    }

    /// Convenience constructor for a fully occupied single-species site.
    pub fn ordered(coords: [f64; 3], species: &str) -> Self {
        let mut map = BTreeMap::new();
        map.insert(species.to_string(), 1.0);
        Self { coords, species: map }
    }

    /// A site is ordered when a single species fully occupies it.
    pub fn is_ordered(&self) -> bool {
        self.species.len() == 1
            && self
                .species
                .values()
                .all(|occ| (occ - 1.0).abs() < OCCUPANCY_TOL)
    }
}

/// A crystal structure, possibly with disordered (partially occupied) sites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    lattice: Lattice,
    sites: Vec<Site>,
}

impl Structure {
    /// Create a structure from a lattice and sites.
    pub fn new(lattice: Lattice, sites: Vec<Site>) -> Result<Self> {
        if sites.is_empty() {
            return Err(StructureError::InvalidStructure(
                "structure must contain at least one site".to_string(),
            ));
        }
        Ok(Self { lattice, sites })
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn num_sites(&self) -> usize {
        self.sites.len()
    }

    /// True when every site is fully occupied by a single species.
    pub fn is_ordered(&self) -> bool {
        self.sites.iter().all(Site::is_ordered)
    }

    /// Per-species amounts summed over all sites.
    pub fn composition(&self) -> Composition {
        let mut amounts: BTreeMap<String, f64> = BTreeMap::new();
        for site in &self.sites {
            for (species, occ) in &site.species {
                *amounts.entry(species.clone()).or_insert(0.0) += occ;
            }
        }
        Composition::new(amounts)
    }

    /// A new structure with every occupancy replaced by the nearest rational
    /// with denominator at most `max_denominator`.
    ///
    /// Occupancies that round to zero are rejected: dropping a species
    /// silently would change the composition behind the caller's back.
    pub fn discretize_occupancies(&self, max_denominator: u64) -> Result<Self> {
        let mut sites = Vec::with_capacity(self.sites.len());
        for site in &self.sites {
            let mut species = BTreeMap::new();
            for (name, occ) in &site.species {
                let ratio = crate::utils::limit_denominator(*occ, max_denominator);
                if ratio.numer <= 0 {
                    return Err(StructureError::InvalidOccupancy(format!(
                        "occupancy {} of {} rounds to zero with max denominator {}",
                        occ, name, max_denominator
                    )));
                }
                species.insert(name.clone(), ratio.value());
            }
            sites.push(Site::new(site.coords, species)?);
        }
        Ok(Self {
            lattice: self.lattice.clone(),
            sites,
        })
    }

    /// A new structure with the lattice isotropically rescaled to the given
    /// cell volume. Fractional coordinates are volume-invariant.
    pub fn scaled_to_volume(&self, volume: f64) -> Result<Self> {
        Ok(Self {
            lattice: self.lattice.scaled_to_volume(volume)?,
            sites: self.sites.clone(),
        })
    }

    /// Symmetry label of the structure, derived from the cell metrics.
    pub fn symmetry_label(&self) -> &'static str {
        self.lattice.lattice_system()
    }

    /// Approximate structural equality: same lattice, same site order, same
    /// species maps, everything within `tol`.
    pub fn matches(&self, other: &Structure, tol: f64) -> bool {
        if self.sites.len() != other.sites.len() {
            return false;
        }
        let a = self.lattice.rows();
        let b = other.lattice.rows();
        for i in 0..3 {
            for j in 0..3 {
                if (a[i][j] - b[i][j]).abs() > tol {
                    return false;
                }
            }
        }
        self.sites.iter().zip(&other.sites).all(|(s, o)| {
            s.coords
                .iter()
                .zip(&o.coords)
                .all(|(x, y)| (x - y).abs() <= tol)
                && s.species.len() == o.species.len()
                && s.species.iter().all(|(name, occ)| {
                    o.species
                        .get(name)
                        .is_some_and(|other_occ| (occ - other_occ).abs() <= tol)
                })
        })
    }

    /// `matches` with the default tolerance.
    pub fn approx_eq(&self, other: &Structure) -> bool {
        self.matches(other, MATCH_TOL)
    }
}
