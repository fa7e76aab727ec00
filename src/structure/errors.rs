/*
MIT License with ATAT Attribution

Copyright (c) 2025 mcsqs-rs contributors

Interoperates with the mcsqs code from the ATAT toolkit
(Alloy Theoretic Automated Toolkit) by Axel van de Walle et al.
All rights reserved.
*/

//! Error types for the structure module

use thiserror::Error;

/// Errors raised by structure construction, transformation and file I/O
#[derive(Error, Debug)]
pub enum StructureError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid lattice: {0}")]
    InvalidLattice(String),

    #[error("Invalid occupancy: {0}")]
    InvalidOccupancy(String),

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),
}

/// Result type for structure operations
pub type Result<T> = std::result::Result<T, StructureError>;
