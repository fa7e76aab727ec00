/*
MIT License with ATAT Attribution

Copyright (c) 2025 mcsqs-rs contributors

Interoperates with the mcsqs code from the ATAT toolkit
(Alloy Theoretic Automated Toolkit) by Axel van de Walle et al.
All rights reserved.
*/

//! Run preparation
//!
//! Turns a disordered structure into everything an mcsqs run needs on disk:
//! `rndstr.in`, the echoed-arguments side file, and a POSIX shell script that
//! launches several independent mcsqs instances under a wall-clock timeout.
//!
//! mcsqs is a Monte Carlo search with no termination criterion, so the
//! timeout is load-bearing: whatever best structure exists when the clock
//! runs out is the result. Two minutes of the requested walltime are
//! reserved for the assimilation and database steps that follow the run.

pub mod errors;

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::thread;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::structure::{atat_format, Structure};
use crate::utils::{format_float, limit_denominator};

pub use errors::{PrepareError, Result};

/// Minimum usable walltime in minutes.
pub const MIN_WALLTIME_MINUTES: f64 = 3.0;
/// Minutes deducted from the walltime for the post-run pipeline stages.
pub const PIPELINE_RESERVE_MINUTES: f64 = 2.0;
/// Cap on occupancy denominators when sizing the supercell.
pub const SUPERCELL_DENOMINATOR_CAP: u64 = 100;
/// Default bound for occupancy discretization.
pub const DEFAULT_MAX_DENOMINATOR: u64 = 8;

/// Structure input file consumed by mcsqs.
pub const RNDSTR_FILE: &str = "rndstr.in";
/// Side file echoing the resolved run arguments for the assimilation stage.
pub const INPUT_ARGS_FILE: &str = "mcsqs_input_args.json";
/// Generated run script.
pub const RUN_SCRIPT_FILE: &str = "run_mcsqs.sh";

/// Cluster orders (pair through sextuplet) and their radius cutoffs.
///
/// mcsqs matches correlation functions of clusters of 2-6 atoms; each entry
/// maps a cluster order to the radius (Å) within which clusters of that
/// order are enumerated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterSpec(BTreeMap<u8, f64>);

impl ClusterSpec {
    /// Validate and wrap an order → radius map.
    pub fn new(cutoffs: BTreeMap<u8, f64>) -> Result<Self> {
        for (order, radius) in &cutoffs {
            if !(2..=6).contains(order) {
                return Err(PrepareError::UnsupportedClusterOrder(*order));
            }
            if *radius <= 0.0 || !radius.is_finite() {
                return Err(PrepareError::InvalidClusterRadius(*order, *radius));
            }
        }
        Ok(Self(cutoffs))
    }

    /// Default cutoffs derived from the shortest lattice vector: pairs and
    /// triplets within 1.501×, quadruplets within 1.001×.
    ///
    /// A heuristic, not an optimum; it aims for roughly a dozen clusters,
    /// which is where mcsqs tends to converge quickly.
    pub fn from_shortest_vector(length: f64) -> Self {
        let mut cutoffs = BTreeMap::new();
        cutoffs.insert(2, length * 1.501);
        cutoffs.insert(3, length * 1.501);
        cutoffs.insert(4, length * 1.001);
        Self(cutoffs)
    }

    pub fn cutoffs(&self) -> &BTreeMap<u8, f64> {
        &self.0
    }

    /// The `-2=r2 -3=r3 …` fragment of the cluster-generation command line.
    pub fn command_fragment(&self) -> String {
        self.0
            .iter()
            .map(|(order, radius)| format!("-{}={}", order, format_float(*radius)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Run arguments echoed to a side file at preparation time and read back by
/// the assimilation stage. `walltime` is the total budget in core-minutes
/// across all parallel instances.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunArgs {
    pub clusters: Option<ClusterSpec>,
    pub user_input_settings: Option<BTreeMap<String, String>>,
    pub walltime: Option<f64>,
}

/// Configuration for one mcsqs run.
#[derive(Debug, Clone)]
pub struct McsqsJob {
    structure: Structure,
    walltime_minutes: f64,
    size: Option<u64>,
    clusters: Option<ClusterSpec>,
    user_input_settings: BTreeMap<String, String>,
    max_denominator: Option<u64>,
    ncores: Option<usize>,
}

/// Everything `prepare` resolved: the run script plus the parameters that
/// went into it.
#[derive(Debug, Clone)]
pub struct PreparedRun {
    /// The shell script launching the parallel mcsqs instances.
    pub script: String,
    /// The structure as written to `rndstr.in` (discretized, unit volume).
    pub structure: Structure,
    /// Supercell size in atoms.
    pub size: u64,
    /// Resolved cluster cutoffs.
    pub clusters: ClusterSpec,
    /// Number of parallel mcsqs instances.
    pub ncores: usize,
    /// Total budget in core-minutes, as echoed to the side file.
    pub core_minutes: f64,
}

impl McsqsJob {
    /// Create a job for a disordered structure with a total wall-clock
    /// budget in minutes. Remaining knobs default as mcsqs users expect:
    /// occupancies rounded to eighths, smallest exact supercell, heuristic
    /// clusters, one instance per detected core.
    pub fn new(structure: Structure, walltime_minutes: f64) -> Self {
        Self {
            structure,
            walltime_minutes,
            size: None,
            clusters: None,
            user_input_settings: BTreeMap::new(),
            max_denominator: Some(DEFAULT_MAX_DENOMINATOR),
            ncores: None,
        }
    }

    /// Explicit supercell size (number of atoms in the output cell).
    pub fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Explicit cluster cutoffs instead of the shortest-vector heuristic.
    pub fn clusters(mut self, clusters: ClusterSpec) -> Self {
        self.clusters = Some(clusters);
        self
    }

    /// Extra `key=value` settings passed verbatim to the mcsqs command line
    /// (Monte Carlo temperature and friends). Not validated.
    pub fn user_input_settings(mut self, settings: BTreeMap<String, String>) -> Self {
        self.user_input_settings = settings;
        self
    }

    /// Occupancy rounding bound; `None` disables discretization entirely
    /// (mcsqs may reject the resulting occupancies).
    pub fn max_denominator(mut self, max_denominator: Option<u64>) -> Self {
        self.max_denominator = max_denominator;
        self
    }

    /// Number of parallel instances; defaults to `NSLOTS` or the detected
    /// core count.
    pub fn ncores(mut self, ncores: usize) -> Self {
        self.ncores = Some(ncores);
        self
    }

    /// Validate the job, write `rndstr.in`, the run script and the echoed
    /// arguments into `workdir`, and return the resolved run.
    pub fn prepare<P: AsRef<Path>>(&self, workdir: P) -> Result<PreparedRun> {
        let workdir = workdir.as_ref();

        if self.walltime_minutes < MIN_WALLTIME_MINUTES {
            return Err(PrepareError::WalltimeTooShort(
                self.walltime_minutes,
                MIN_WALLTIME_MINUTES,
            ));
        }
        if self.structure.is_ordered() {
            return Err(PrepareError::OrderedStructure);
        }

        let structure = match self.max_denominator {
            Some(max_denominator) => self.structure.discretize_occupancies(max_denominator)?,
            None => self.structure.clone(),
        };

        let size = match self.size {
            Some(size) => size,
            None => minimum_supercell_size(&structure),
        };

        // mcsqs works with a unit-volume cell; real dimensions are restored
        // by the caller from the scaling matrix
        let structure = structure.scaled_to_volume(1.0)?;

        let clusters = match &self.clusters {
            Some(clusters) => clusters.clone(),
            None => ClusterSpec::from_shortest_vector(structure.lattice().shortest_vector()),
        };

        let ncores = match self.ncores {
            Some(ncores) => ncores.max(1),
            None => detect_ncores(),
        };
        let core_minutes = ncores as f64 * (self.walltime_minutes - PIPELINE_RESERVE_MINUTES);

        atat_format::write_structure(workdir.join(RNDSTR_FILE), &structure)?;

        let args = RunArgs {
            clusters: Some(clusters.clone()),
            user_input_settings: if self.user_input_settings.is_empty() {
                None
            } else {
                Some(self.user_input_settings.clone())
            },
            walltime: Some(core_minutes),
        };
        fs::write(
            workdir.join(INPUT_ARGS_FILE),
            serde_json::to_string_pretty(&args)?,
        )?;

        let script = self.render_script(size, &clusters, ncores);
        fs::write(workdir.join(RUN_SCRIPT_FILE), &script)?;

        info!(
            "Prepared mcsqs run in {}: size={}, ncores={}, walltime={}m",
            workdir.display(),
            size,
            ncores,
            self.walltime_minutes
        );

        Ok(PreparedRun {
            script,
            structure,
            size,
            clusters,
            ncores,
            core_minutes,
        })
    }

    fn render_script(&self, size: u64, clusters: &ClusterSpec, ncores: usize) -> String {
        let per_instance = self.walltime_minutes - PIPELINE_RESERVE_MINUTES;
        let settings = self
            .user_input_settings
            .iter()
            .map(|(k, v)| format!(" {}={}", k, v))
            .collect::<String>();

        format!(
            "#!/bin/bash\n\
             # generate the cluster definitions (clusters.out)\n\
             mcsqs {clusters}\n\
             \n\
             # mcsqs is not parallelized and, being an open-ended Monte Carlo\n\
             # search, may never terminate on its own; run independent\n\
             # instances and cut each one off at the timeout\n\
             for (( id=0 ; id<{ncores} ; id++ ))\n\
             do\n\
             \x20   timeout {minutes}m mcsqs -n {size}{settings} -ip=$id &\n\
             done\n\
             wait\n\
             \n\
             # pick the best structure across instances\n\
             mcsqs -best\n\
             \n\
             # record the mcsqs version for provenance\n\
             mcsqs -v | head -n 1 > mcsqs_version.txt\n",
            clusters = clusters.command_fragment(),
            ncores = ncores,
            minutes = format_float(per_instance),
            size = size,
            settings = settings,
        )
    }
}

/// The smallest supercell able to realize every occupancy exactly: the
/// maximum reduced denominator over all site-species occupancies, with
/// denominators bounded at [`SUPERCELL_DENOMINATOR_CAP`].
pub fn minimum_supercell_size(structure: &Structure) -> u64 {
    let mut denominators: BTreeMap<&str, u64> = BTreeMap::new();
    for site in structure.sites() {
        for (species, occ) in &site.species {
            let denom = limit_denominator(*occ, SUPERCELL_DENOMINATOR_CAP).denom;
            denominators
                .entry(species.as_str())
                .and_modify(|d| *d = (*d).max(denom))
                .or_insert(denom);
        }
    }
    denominators.values().copied().max().unwrap_or(1)
}

/// Number of parallel mcsqs instances: the `NSLOTS` environment variable
/// (set by common batch schedulers) when present, else the host's available
/// parallelism.
pub fn detect_ncores() -> usize {
    if let Ok(slots) = env::var("NSLOTS") {
        if let Ok(n) = slots.trim().parse::<usize>() {
            debug!("using NSLOTS={} for mcsqs parallelism", n);
            return n.max(1);
        }
    }
    thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}
