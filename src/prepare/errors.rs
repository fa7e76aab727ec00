/*
MIT License with ATAT Attribution

Copyright (c) 2025 mcsqs-rs contributors

Interoperates with the mcsqs code from the ATAT toolkit
(Alloy Theoretic Automated Toolkit) by Axel van de Walle et al.
All rights reserved.
*/

//! Error types for run preparation

use thiserror::Error;

/// Errors raised while preparing an mcsqs run
#[derive(Error, Debug)]
pub enum PrepareError {
    #[error("input structure is fully ordered; an SQS search needs disorder")]
    OrderedStructure,

    #[error("walltime of {0} minutes is too short; at least {1} minutes are required")]
    WalltimeTooShort(f64, f64),

    #[error("mcsqs only supports clusters of 2-6 atoms, got {0}")]
    UnsupportedClusterOrder(u8),

    #[error("cluster radius for order {0} must be positive, got {1}")]
    InvalidClusterRadius(u8, f64),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Structure(#[from] crate::structure::StructureError),
}

/// Result type for preparation operations
pub type Result<T> = std::result::Result<T, PrepareError>;
