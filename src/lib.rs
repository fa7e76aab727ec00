/*
MIT License with ATAT Attribution

Copyright (c) 2025 mcsqs-rs contributors

Interoperates with the mcsqs code from the ATAT toolkit
(Alloy Theoretic Automated Toolkit) by Axel van de Walle et al.
All rights reserved.
*/

//! # mcsqs-rs
//!
//! A Rust pipeline for generating and cataloguing special quasirandom
//! structures (SQS) with the `mcsqs` code from the ATAT toolkit.
//!
//! mcsqs itself is an external binary with a plain-text file interface; this
//! crate prepares its inputs and run scripts, assimilates the files it leaves
//! behind into structured records, and persists those records in an embedded
//! document store. The pipeline has three stages:
//!
//! 1. [`prepare`] — discretize a disordered structure's occupancies, pick a
//!    supercell size and cluster cutoffs, write `rndstr.in`, and emit a shell
//!    script that runs several mcsqs instances under a wall-clock timeout.
//! 2. [`assimilate`] — read the output files from a finished run directory
//!    and build a [`assimilate::RunRecord`].
//! 3. [`db`] — deduplicate and upsert records with monotonically allocated
//!    task ids.

pub mod assimilate;
pub mod cli;
pub mod copy_outputs;
pub mod db;
pub mod prepare;
pub mod structure;
pub mod utils;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
