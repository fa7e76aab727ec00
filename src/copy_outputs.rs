/*
MIT License with ATAT Attribution

Copyright (c) 2025 mcsqs-rs contributors

Interoperates with the mcsqs code from the ATAT toolkit
(Alloy Theoretic Automated Toolkit) by Axel van de Walle et al.
All rights reserved.
*/

//! Output-file relocation
//!
//! Moves the fixed set of files an mcsqs run produces from a scratch
//! directory into a results directory, overwriting stale copies. Files a
//! run did not produce (e.g. `sqscell.out` without `-rc`) are logged and
//! skipped rather than treated as failures.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};

/// Every file an mcsqs run may leave behind that is worth keeping.
pub const OUTPUT_FILES: [&str; 8] = [
    "bestsqs.out",
    "clusters.out",
    "rndstr.in",
    "bestcorr.out",
    "rndstrgrp.out",
    "sqscell.out",
    "mcsqs_version.txt",
    "mcsqs_input_args.json",
];

/// Copy the known output files from `src` into `dest` (created when
/// missing). Returns the paths copied.
pub fn copy_outputs<P: AsRef<Path>, Q: AsRef<Path>>(src: P, dest: Q) -> io::Result<Vec<PathBuf>> {
    let (src, dest) = (src.as_ref(), dest.as_ref());
    fs::create_dir_all(dest)?;

    let mut copied = Vec::new();
    for name in OUTPUT_FILES {
        let from = src.join(name);
        if !from.is_file() {
            debug!("{} not present in {}; skipping", name, src.display());
            continue;
        }
        let to = dest.join(name);
        fs::copy(&from, &to)?;
        copied.push(to);
    }
    info!(
        "Copied {} output files from {} to {}",
        copied.len(),
        src.display(),
        dest.display()
    );
    Ok(copied)
}
