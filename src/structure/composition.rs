/*
MIT License with ATAT Attribution

Copyright (c) 2025 mcsqs-rs contributors

Interoperates with the mcsqs code from the ATAT toolkit
(Alloy Theoretic Automated Toolkit) by Axel van de Walle et al.
All rights reserved.
*/

//! Composition analysis
//!
//! A composition is the per-species amount summed over every site of a
//! structure (fractional occupancies included). The pipeline only needs one
//! derived quantity from it: the anonymized formula used as the index key of
//! the task collection.

use std::collections::BTreeMap;

use crate::utils::{format_float, gcd, lcm, limit_denominator};

/// Tolerance for treating an amount as an exact rational.
const AMOUNT_TOL: f64 = 1e-6;
/// Denominator bound when reducing amounts to integer formula units.
const AMOUNT_DENOMINATOR_CAP: u64 = 100;

/// Per-species amounts of a structure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Composition {
    amounts: BTreeMap<String, f64>,
}

impl Composition {
    pub fn new(amounts: BTreeMap<String, f64>) -> Self {
        Self { amounts }
    }

    /// Species and amounts in alphabetical species order.
    pub fn amounts(&self) -> &BTreeMap<String, f64> {
        &self.amounts
    }

    /// Total number of atoms (possibly fractional for disordered input).
    pub fn num_atoms(&self) -> f64 {
        self.amounts.values().sum()
    }

    /// The anonymized reduced formula: species are sorted by increasing
    /// amount and renamed A, B, C, …, with amounts reduced to the smallest
    /// integers that preserve their ratios.
    ///
    /// `Fe0.5 Ni0.5` becomes `AB`; `Li1 Fe1 P1 O4` becomes `ABC D4` without
    /// the spaces, i.e. `ABCD4`.
    pub fn anonymized_formula(&self) -> String {
        let mut entries: Vec<(&str, f64)> = self
            .amounts
            .iter()
            .filter(|(_, amt)| **amt > AMOUNT_TOL)
            .map(|(sp, amt)| (sp.as_str(), *amt))
            .collect();
        if entries.is_empty() {
            return String::new();
        }
        entries.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });

        let reduced = reduce_amounts(entries.iter().map(|(_, amt)| *amt));

        let mut formula = String::new();
        for (i, (_, amount)) in entries.iter().enumerate() {
            // species identity is deliberately erased
            let letter = (b'A' + (i % 26) as u8) as char;
            formula.push(letter);
            let amount = match &reduced {
                Some(ints) => ints[i] as f64,
                None => *amount,
            };
            if (amount - 1.0).abs() > AMOUNT_TOL {
                formula.push_str(&format_float(amount));
            }
        }
        formula
    }
}

/// Reduce a list of positive amounts to the smallest integer multiples
/// preserving their ratios, or `None` when an amount is not close to a
/// bounded-denominator rational.
fn reduce_amounts(amounts: impl Iterator<Item = f64>) -> Option<Vec<u64>> {
    let mut numers = Vec::new();
    let mut denoms = Vec::new();
    for amount in amounts {
        let ratio = limit_denominator(amount, AMOUNT_DENOMINATOR_CAP);
        if (ratio.value() - amount).abs() > AMOUNT_TOL || ratio.numer <= 0 {
            return None;
        }
        numers.push(ratio.numer as u64);
        denoms.push(ratio.denom);
    }
    let common = denoms.iter().fold(1u64, |acc, d| lcm(acc, *d));
    let ints: Vec<u64> = numers
        .iter()
        .zip(&denoms)
        .map(|(n, d)| n * (common / d))
        .collect();
    let g = ints.iter().fold(0u64, |acc, n| gcd(acc, *n));
    Some(ints.iter().map(|n| n / g).collect())
}
