/*
MIT License with ATAT Attribution

Copyright (c) 2025 mcsqs-rs contributors

Interoperates with the mcsqs code from the ATAT toolkit
(Alloy Theoretic Automated Toolkit) by Axel van de Walle et al.
All rights reserved.
*/

//! Error types for the task database

use thiserror::Error;

/// Errors raised by the task database and its backing store
#[derive(Error, Debug)]
pub enum DbError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt stored document: {0}")]
    CorruptDocument(String),

    #[error(transparent)]
    Structure(#[from] crate::structure::StructureError),
}

/// Result type for database operations
pub type Result<T> = std::result::Result<T, DbError>;
