/*
MIT License with ATAT Attribution

Copyright (c) 2025 mcsqs-rs contributors

Interoperates with the mcsqs code from the ATAT toolkit
(Alloy Theoretic Automated Toolkit) by Axel van de Walle et al.
All rights reserved.
*/

//! Task database configuration
//!
//! Loaded from a JSON db file (`sqsdb.json` by convention). The shape keeps
//! the full document-database surface — host, port, credentials, database
//! and collection names — so configs written for a served deployment load
//! unchanged; the embedded store only consumes `collection` and `path`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::Result;

/// Connection and naming configuration for the task database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqsDbConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub collection: String,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Backing file for the embedded store; `None` selects a path derived
    /// from the db file location.
    pub path: Option<PathBuf>,
}

impl Default for SqsDbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 27017,
            database: "SQS".to_string(),
            collection: "tasks".to_string(),
            user: None,
            password: None,
            path: None,
        }
    }
}

impl SqsDbConfig {
    /// Load the configuration from a JSON db file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
