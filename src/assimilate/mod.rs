/*
MIT License with ATAT Attribution

Copyright (c) 2025 mcsqs-rs contributors

Interoperates with the mcsqs code from the ATAT toolkit
(Alloy Theoretic Automated Toolkit) by Axel van de Walle et al.
All rights reserved.
*/

//! Result assimilation
//!
//! After a run finishes, the working directory holds the fixed set of files
//! mcsqs leaves behind. [`McsqsDrone::assimilate`] turns them into a single
//! [`RunRecord`]: the best structure found, the objective function, the
//! scaling matrix relating the supercell to the input cell, and the echoed
//! run arguments.
//!
//! Only `rndstr.in`, `bestsqs.out` and `bestcorr.out` are mandatory. The
//! version file, cluster listing and argument side file degrade to explicit
//! sentinels or `None` when absent, so a record can still be built from a
//! partially successful run.

pub mod errors;

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::prepare::{ClusterSpec, RunArgs, INPUT_ARGS_FILE, RNDSTR_FILE};
use crate::structure::{atat_format, Structure};

pub use errors::{AssimilateError, Result};

/// Best structure found across all instances.
pub const BESTSQS_FILE: &str = "bestsqs.out";
/// Objective-function log; the last line is authoritative.
pub const BESTCORR_FILE: &str = "bestcorr.out";
/// Cluster listing written by the cluster-generation step.
pub const CLUSTERS_FILE: &str = "clusters.out";
/// Version side file written by the run script.
pub const VERSION_FILE: &str = "mcsqs_version.txt";

/// Sentinel stored when no version file was found.
pub const UNKNOWN_VERSION: &str = "Unknown mcsqs version";
/// Sentinel stored when no integer lattice mapping exists.
pub const SCALING_MATRIX_SENTINEL: &str = "Could not determine scaling matrix?";

/// Lines per cluster entry in `clusters.out`.
const CLUSTER_RECORD_LINES: usize = 7;
/// Header lines in `clusters.out`.
const CLUSTER_HEADER_LINES: usize = 2;
/// Tolerance for rounding the lattice mapping to integers.
const SCALING_MATRIX_TOL: f64 = 1e-3;

/// The objective function reported by mcsqs: a measurement when the log tail
/// parses as a number, otherwise the unparsed label (mcsqs writes strings
/// like `Perfect_match` there).
///
/// Serialized untagged, so stored documents hold a bare number or string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObjectiveFunction {
    Measured(f64),
    Unparsed(String),
}

/// The integer matrix relating the output supercell to the input lattice,
/// or a human-readable sentinel when no mapping was found. A missing mapping
/// must not abort assimilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalingMatrix {
    Found([[i64; 3]; 3]),
    Indeterminate(String),
}

impl ScalingMatrix {
    pub fn indeterminate() -> Self {
        Self::Indeterminate(SCALING_MATRIX_SENTINEL.to_string())
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// The mcsqs version string captured for provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum McsqsVersion {
    Known(String),
    Unknown,
}

impl From<String> for McsqsVersion {
    fn from(s: String) -> Self {
        if s == UNKNOWN_VERSION {
            Self::Unknown
        } else {
            Self::Known(s)
        }
    }
}

impl From<McsqsVersion> for String {
    fn from(version: McsqsVersion) -> Self {
        match version {
            McsqsVersion::Known(s) => s,
            McsqsVersion::Unknown => UNKNOWN_VERSION.to_string(),
        }
    }
}

/// The assimilated result of one mcsqs run. Immutable once built, except for
/// `task_id`, which persistence assigns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub anonymous_formula: String,
    pub disordered: Structure,
    pub bestsqs: Structure,
    pub clusters: Option<ClusterSpec>,
    pub num_clusters: Option<f64>,
    pub user_input_settings: Option<BTreeMap<String, String>>,
    pub objective_function: ObjectiveFunction,
    pub walltime: Option<f64>,
    pub mcsqs_rs_version: String,
    pub mcsqs_version: McsqsVersion,
    pub spacegroup: String,
    pub scaling_matrix: ScalingMatrix,
    /// Output atom count over input site count.
    pub size: f64,
    pub last_updated: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<u64>,
}

/// Reads a finished run directory into a [`RunRecord`].
#[derive(Debug, Default)]
pub struct McsqsDrone;

impl McsqsDrone {
    pub fn new() -> Self {
        Self
    }

    /// Assimilate the mcsqs output files under `path`.
    pub fn assimilate<P: AsRef<Path>>(&self, path: P) -> Result<RunRecord> {
        let dir = path.as_ref();
        info!("Assimilating mcsqs run directory {}", dir.display());

        let input_structure =
            atat_format::from_atat_string(&read_required(dir.join(RNDSTR_FILE))?)?;
        let output_structure =
            atat_format::from_atat_string(&read_required(dir.join(BESTSQS_FILE))?)?;

        let bestcorr_path = dir.join(BESTCORR_FILE);
        let objective_function = parse_objective(&read_required(bestcorr_path.clone())?, &bestcorr_path)?;

        let scaling_matrix = match input_structure
            .lattice()
            .scaling_matrix_to(output_structure.lattice(), SCALING_MATRIX_TOL)
        {
            Some(m) => ScalingMatrix::Found(m),
            None => {
                warn!(
                    "no integer mapping from input to output lattice in {}",
                    dir.display()
                );
                ScalingMatrix::indeterminate()
            }
        };

        let mcsqs_version = read_version(dir);
        let num_clusters = count_clusters(dir);
        let args = read_run_args(dir);

        let size = output_structure.num_sites() as f64 / input_structure.num_sites() as f64;
        let spacegroup = output_structure.symmetry_label().to_string();
        let anonymous_formula = input_structure.composition().anonymized_formula();

        Ok(RunRecord {
            anonymous_formula,
            disordered: input_structure,
            bestsqs: output_structure,
            clusters: args.clusters,
            num_clusters,
            user_input_settings: args.user_input_settings,
            objective_function,
            walltime: args.walltime,
            mcsqs_rs_version: crate::VERSION.to_string(),
            mcsqs_version,
            spacegroup,
            scaling_matrix,
            size,
            last_updated: Utc::now().to_rfc3339(),
            task_id: None,
        })
    }
}

fn read_required(path: PathBuf) -> Result<String> {
    match fs::read_to_string(&path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(AssimilateError::MissingFile(path))
        }
        Err(e) => Err(e.into()),
    }
}

/// Extract the objective function: the value after the final `=` on the
/// last non-empty line.
fn parse_objective(text: &str, path: &Path) -> Result<ObjectiveFunction> {
    let last = text
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| AssimilateError::InvalidObjectiveLog {
            path: path.to_path_buf(),
            reason: "log is empty".to_string(),
        })?;
    let (_, tail) = last
        .rsplit_once('=')
        .ok_or_else(|| AssimilateError::InvalidObjectiveLog {
            path: path.to_path_buf(),
            reason: format!("no `=` on final line: {:?}", last),
        })?;
    let tail = tail.trim();
    Ok(match tail.parse::<f64>() {
        Ok(value) => ObjectiveFunction::Measured(value),
        Err(_) => ObjectiveFunction::Unparsed(tail.to_string()),
    })
}

/// First line of the version side file, or the unknown sentinel.
fn read_version(dir: &Path) -> McsqsVersion {
    match fs::read_to_string(dir.join(VERSION_FILE)) {
        Ok(text) => {
            let line = text.lines().next().unwrap_or("").trim();
            if line.is_empty() {
                McsqsVersion::Unknown
            } else {
                McsqsVersion::Known(line.to_string())
            }
        }
        Err(e) => {
            warn!("no usable {} ({}); recording unknown version", VERSION_FILE, e);
            McsqsVersion::Unknown
        }
    }
}

/// Cluster count from the fixed-stride cluster listing; `None` when the file
/// is absent.
fn count_clusters(dir: &Path) -> Option<f64> {
    match fs::read_to_string(dir.join(CLUSTERS_FILE)) {
        Ok(text) => {
            let lines = text.lines().count();
            Some((lines.saturating_sub(CLUSTER_HEADER_LINES)) as f64 / CLUSTER_RECORD_LINES as f64)
        }
        Err(e) => {
            warn!("no usable {} ({}); cluster count unknown", CLUSTERS_FILE, e);
            None
        }
    }
}

/// Echoed run arguments, defaulting field-by-field to `None` when the side
/// file is missing or malformed.
fn read_run_args(dir: &Path) -> RunArgs {
    let path = dir.join(INPUT_ARGS_FILE);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) => {
            warn!("no usable {} ({}); echoed args unavailable", INPUT_ARGS_FILE, e);
            return RunArgs::default();
        }
    };
    match serde_json::from_str(&text) {
        Ok(args) => args,
        Err(e) => {
            warn!(
                "malformed {} ({}); echoed args unavailable",
                path.display(),
                e
            );
            RunArgs::default()
        }
    }
}
