/*
MIT License with ATAT Attribution

Copyright (c) 2025 mcsqs-rs contributors

Interoperates with the mcsqs code from the ATAT toolkit
(Alloy Theoretic Automated Toolkit) by Axel van de Walle et al.
All rights reserved.
*/

//! Shared numeric utilities
//!
//! Small helpers used throughout the pipeline: bounded-denominator rational
//! approximation for occupancy discretization, and integer gcd/lcm used when
//! reducing composition amounts.

pub mod fraction;

pub use fraction::{gcd, lcm, limit_denominator, Ratio};

/// Format a float without a trailing `.0` when it is integral.
///
/// Used for shell-script durations and occupancy values, where `3m` and
/// `0.5` are wanted rather than `3.0m` and `0.50000`.
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value == value.trunc() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
