/*
MIT License with ATAT Attribution

Copyright (c) 2025 mcsqs-rs contributors

Interoperates with the mcsqs code from the ATAT toolkit
(Alloy Theoretic Automated Toolkit) by Axel van de Walle et al.
All rights reserved.
*/

//! Error types for result assimilation

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while assimilating an mcsqs run directory
#[derive(Error, Debug)]
pub enum AssimilateError {
    #[error("required output file {0} is missing")]
    MissingFile(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("objective-function log {path} is malformed: {reason}")]
    InvalidObjectiveLog { path: PathBuf, reason: String },

    #[error(transparent)]
    Structure(#[from] crate::structure::StructureError),
}

/// Result type for assimilation operations
pub type Result<T> = std::result::Result<T, AssimilateError>;
