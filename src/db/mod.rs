/*
MIT License with ATAT Attribution

Copyright (c) 2025 mcsqs-rs contributors

Interoperates with the mcsqs code from the ATAT toolkit
(Alloy Theoretic Automated Toolkit) by Axel van de Walle et al.
All rights reserved.
*/

//! Task database
//!
//! Persists assimilated [`RunRecord`]s as documents with a monotonically
//! allocated integer `task_id`. Two distinct duplicate notions exist and are
//! deliberately kept separate:
//!
//! - the insert-time lookup compares the exact stored representation of the
//!   `disordered` field (value equality of the serialized structure);
//! - [`SqsDb::duplicate_checker`] is a pre-submission scan that re-applies
//!   the preparation transformations to a candidate structure and compares
//!   structurally, document by document.
//!
//! Upserts are keyed on a `dir_name` field holding the task-id value, a
//! legacy schema carried over from the original deployment: the first upsert
//! materializes `dir_name` from the filter, so duplicate updates find their
//! document again.

pub mod config;
pub mod errors;
pub mod store;

use std::path::Path;

use chrono::Utc;
use log::{info, warn};
use serde_json::{json, Value};

use crate::assimilate::RunRecord;
use crate::structure::Structure;

pub use config::SqsDbConfig;
pub use errors::{DbError, Result};
pub use store::{DocStore, Document, IndexSpec};

/// Fields indexed by default.
pub const DEFAULT_INDEXES: &[&str] = &["anonymous_formula"];
/// Name of the task-id counter document.
pub const TASK_COUNTER: &str = "taskid";
/// Upsert filter field (legacy schema: holds the task-id value).
const UPSERT_KEY: &str = "dir_name";

/// Outcome of a pre-submission duplicate scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateScan {
    /// A stored structure matched the candidate.
    pub found: bool,
    /// Stored documents that could not be parsed back into a structure.
    /// These never abort the scan, but they are surfaced rather than
    /// silently treated as non-matches.
    pub unreadable: usize,
}

/// The SQS task database.
#[derive(Debug)]
pub struct SqsDb {
    store: DocStore,
    config: SqsDbConfig,
}

impl SqsDb {
    /// A database on an in-memory store (used by tests and dry runs).
    pub fn in_memory() -> Self {
        Self {
            store: DocStore::in_memory(),
            config: SqsDbConfig::default(),
        }
    }

    /// Open the database described by a configuration.
    pub fn open(config: SqsDbConfig) -> Result<Self> {
        let store = match &config.path {
            Some(path) => DocStore::open(path)?,
            None => DocStore::in_memory(),
        };
        Ok(Self { store, config })
    }

    /// Open the database described by a JSON db file. When the config names
    /// no backing path, a sibling `<db file>.data.json` is used.
    pub fn from_db_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = SqsDbConfig::from_file(path)?;
        if config.path.is_none() {
            let mut data = path.as_os_str().to_os_string();
            data.push(".data.json");
            config.path = Some(data.into());
        }
        Self::open(config)
    }

    pub fn config(&self) -> &SqsDbConfig {
        &self.config
    }

    pub fn store(&self) -> &DocStore {
        &self.store
    }

    /// Number of stored task documents.
    pub fn task_count(&self) -> usize {
        self.store.len()
    }

    /// Insert a task document, deduplicating on the stored representation of
    /// the disordered structure.
    ///
    /// Returns the assigned task id, or `None` when the record was skipped
    /// as a duplicate with updates disabled.
    pub fn insert_task(&self, record: &RunRecord, update_duplicates: bool) -> Result<Option<u64>> {
        let mut doc = match serde_json::to_value(record)? {
            Value::Object(map) => map,
            _ => unreachable!("a RunRecord always serializes to an object"),
        };
        let disordered = doc
            .get("disordered")
            .cloned()
            .ok_or_else(|| DbError::CorruptDocument("record lacks disordered field".into()))?;

        let existing = self.store.find_one("disordered", &disordered);

        let task_id = match &existing {
            None => match record.task_id {
                Some(id) => id,
                None => self.store.next_counter(TASK_COUNTER)? as u64,
            },
            Some(found) if update_duplicates => found
                .get("task_id")
                .and_then(Value::as_u64)
                .ok_or_else(|| {
                    DbError::CorruptDocument("stored duplicate lacks a task_id".into())
                })?,
            Some(_) => {
                info!("Skipping duplicate {}", record.anonymous_formula);
                return Ok(None);
            }
        };

        if existing.is_none() {
            info!(
                "Inserting {} with taskid = {}",
                record.anonymous_formula, task_id
            );
        } else {
            info!(
                "Updating {} with taskid = {}",
                record.anonymous_formula, task_id
            );
        }

        doc.insert("task_id".to_string(), json!(task_id));
        doc.insert(
            "last_updated".to_string(),
            json!(Utc::now().to_rfc3339()),
        );
        self.store.update_one(UPSERT_KEY, &json!(task_id), &doc, true)?;
        Ok(Some(task_id))
    }

    /// Scan the whole collection for a structure matching the candidate,
    /// after applying the same discretization and unit-volume rescale the
    /// preparation stage applies.
    ///
    /// An O(collection) sanity check meant for use before submitting a run;
    /// the authoritative dedup happens inside [`SqsDb::insert_task`].
    pub fn duplicate_checker(
        &self,
        candidate: &Structure,
        max_denominator: Option<u64>,
    ) -> Result<DuplicateScan> {
        let probe = match max_denominator {
            Some(d) => candidate.discretize_occupancies(d)?,
            None => candidate.clone(),
        };
        let probe = probe.scaled_to_volume(1.0)?;

        let mut unreadable = 0;
        for document in self.store.find_all() {
            let Some(value) = document.get("disordered") else {
                unreadable += 1;
                warn!("stored document has no disordered field; skipping");
                continue;
            };
            match serde_json::from_value::<Structure>(value.clone()) {
                Ok(stored) => {
                    if stored.approx_eq(&probe) {
                        return Ok(DuplicateScan {
                            found: true,
                            unreadable,
                        });
                    }
                }
                Err(e) => {
                    unreadable += 1;
                    warn!("unreadable stored structure ({}); skipping", e);
                }
            }
        }
        Ok(DuplicateScan {
            found: false,
            unreadable,
        })
    }

    /// Create the configured indexes (default: the anonymized formula).
    pub fn build_indexes(&self, indexes: Option<&[&str]>, background: bool) -> Result<()> {
        for field in indexes.unwrap_or(DEFAULT_INDEXES) {
            self.store.create_index(field, background)?;
        }
        Ok(())
    }

    /// Delete every task document, then rebuild the default indexes.
    pub fn reset(&self) -> Result<()> {
        let removed = self.store.delete_all()?;
        info!("Reset task collection ({} documents removed)", removed);
        self.build_indexes(None, true)
    }
}
