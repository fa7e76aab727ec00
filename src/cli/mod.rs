/*
MIT License with ATAT Attribution

Copyright (c) 2025 mcsqs-rs contributors

Interoperates with the mcsqs code from the ATAT toolkit
(Alloy Theoretic Automated Toolkit) by Axel van de Walle et al.
All rights reserved.
*/

//! Command Line Interface (CLI) module
//!
//! One subcommand per pipeline stage, so an external workflow engine can
//! drive the stages as separate steps: prepare a run directory, assimilate
//! it once mcsqs has finished, store or deduplicate the record, and relocate
//! the output files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::assimilate::McsqsDrone;
use crate::copy_outputs::copy_outputs;
use crate::db::SqsDb;
use crate::prepare::{ClusterSpec, McsqsJob, DEFAULT_MAX_DENOMINATOR};
use crate::structure::atat_format;

#[derive(Parser)]
#[command(
    name = "mcsqs-rs",
    version,
    about = "SQS generation pipeline built around the ATAT mcsqs code"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prepare an mcsqs run directory from a disordered structure file
    Prepare {
        /// Disordered structure in ATAT format
        input: PathBuf,

        /// Directory receiving rndstr.in, the run script and the side files
        #[arg(long, default_value = ".")]
        workdir: PathBuf,

        /// Total wall-clock budget in minutes
        #[arg(long, default_value_t = 5.0)]
        walltime: f64,

        /// Supercell size in atoms (default: smallest exact supercell)
        #[arg(long)]
        size: Option<u64>,

        /// Cluster cutoff as ORDER=RADIUS, repeatable (default: heuristic)
        #[arg(long = "cluster", value_name = "ORDER=RADIUS")]
        clusters: Vec<String>,

        /// Extra mcsqs setting as KEY=VALUE, forwarded verbatim, repeatable
        #[arg(long = "set", value_name = "KEY=VALUE")]
        settings: Vec<String>,

        /// Occupancy rounding bound; 0 disables discretization
        #[arg(long, default_value_t = DEFAULT_MAX_DENOMINATOR)]
        max_denominator: u64,

        /// Parallel mcsqs instances (default: NSLOTS or detected cores)
        #[arg(long)]
        ncores: Option<usize>,
    },

    /// Assimilate a finished run directory and print the record as JSON
    Assimilate {
        /// Run directory holding the mcsqs output files
        dir: PathBuf,
    },

    /// Assimilate a run directory and store the record in the task database
    Store {
        /// Run directory holding the mcsqs output files
        dir: PathBuf,

        /// JSON db file describing the task database
        #[arg(long)]
        db: PathBuf,

        /// Skip duplicates instead of updating them
        #[arg(long)]
        no_update_duplicates: bool,
    },

    /// Scan the task database for a structure equivalent to the input
    CheckDuplicate {
        /// Candidate structure in ATAT format
        input: PathBuf,

        /// JSON db file describing the task database
        #[arg(long)]
        db: PathBuf,

        /// Apply occupancy rounding with this bound before comparing
        #[arg(long)]
        max_denominator: Option<u64>,
    },

    /// Delete every task document and rebuild the default indexes
    Reset {
        /// JSON db file describing the task database
        #[arg(long)]
        db: PathBuf,
    },

    /// Copy the mcsqs output files into a results directory
    CopyOutputs {
        /// Finished run directory
        src: PathBuf,

        /// Destination directory (created when missing)
        dest: PathBuf,
    },
}

/// Parse arguments from the process environment and run the subcommand.
pub fn run() -> Result<()> {
    dispatch(Cli::parse())
}

fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Prepare {
            input,
            workdir,
            walltime,
            size,
            clusters,
            settings,
            max_denominator,
            ncores,
        } => {
            let structure = atat_format::read_structure(&input)
                .with_context(|| format!("reading structure from {}", input.display()))?;

            let mut job = McsqsJob::new(structure, walltime)
                .max_denominator((max_denominator > 0).then_some(max_denominator));
            if let Some(size) = size {
                job = job.size(size);
            }
            if !clusters.is_empty() {
                job = job.clusters(parse_clusters(&clusters)?);
            }
            if !settings.is_empty() {
                job = job.user_input_settings(parse_settings(&settings)?);
            }
            if let Some(ncores) = ncores {
                job = job.ncores(ncores);
            }

            let run = job.prepare(&workdir)?;
            println!(
                "prepared run in {}: size={}, ncores={}, clusters: {}",
                workdir.display(),
                run.size,
                run.ncores,
                run.clusters.command_fragment()
            );
        }

        Commands::Assimilate { dir } => {
            let record = McsqsDrone::new().assimilate(&dir)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }

        Commands::Store {
            dir,
            db,
            no_update_duplicates,
        } => {
            let record = McsqsDrone::new().assimilate(&dir)?;
            let db = SqsDb::from_db_file(&db)?;
            db.build_indexes(None, true)?;
            match db.insert_task(&record, !no_update_duplicates)? {
                Some(task_id) => println!("stored {} as task {}", record.anonymous_formula, task_id),
                None => println!("skipped duplicate {}", record.anonymous_formula),
            }
        }

        Commands::CheckDuplicate {
            input,
            db,
            max_denominator,
        } => {
            let candidate = atat_format::read_structure(&input)
                .with_context(|| format!("reading structure from {}", input.display()))?;
            let db = SqsDb::from_db_file(&db)?;
            let scan = db.duplicate_checker(&candidate, max_denominator)?;
            if scan.unreadable > 0 {
                eprintln!("warning: {} stored documents were unreadable", scan.unreadable);
            }
            println!(
                "{}",
                if scan.found {
                    "duplicate found"
                } else {
                    "no duplicate"
                }
            );
        }

        Commands::Reset { db } => {
            let db = SqsDb::from_db_file(&db)?;
            db.reset()?;
            println!("task collection reset");
        }

        Commands::CopyOutputs { src, dest } => {
            let copied = copy_outputs(&src, &dest)?;
            println!("copied {} files to {}", copied.len(), dest.display());
        }
    }
    Ok(())
}

fn parse_clusters(specs: &[String]) -> Result<ClusterSpec> {
    let mut cutoffs = BTreeMap::new();
    for spec in specs {
        let (order, radius) = split_pair(spec)?;
        let order: u8 = order
            .parse()
            .with_context(|| format!("cluster order in {:?}", spec))?;
        let radius: f64 = radius
            .parse()
            .with_context(|| format!("cluster radius in {:?}", spec))?;
        cutoffs.insert(order, radius);
    }
    Ok(ClusterSpec::new(cutoffs)?)
}

fn parse_settings(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    let mut settings = BTreeMap::new();
    for pair in pairs {
        let (key, value) = split_pair(pair)?;
        settings.insert(key.to_string(), value.to_string());
    }
    Ok(settings)
}

fn split_pair(pair: &str) -> Result<(&str, &str)> {
    match pair.split_once('=') {
        Some((key, value)) if !key.is_empty() && !value.is_empty() => Ok((key, value)),
        _ => bail!("expected KEY=VALUE, got {:?}", pair),
    }
}
