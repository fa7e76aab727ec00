/*
MIT License with ATAT Attribution

Copyright (c) 2025 mcsqs-rs contributors

Interoperates with the mcsqs code from the ATAT toolkit
(Alloy Theoretic Automated Toolkit) by Axel van de Walle et al.
All rights reserved.
*/

//! Embedded JSON document store
//!
//! A minimal document collection with the handful of operations the task
//! database needs: equality-filtered lookup, `$set`-style upsert, bulk
//! delete, named atomic counters, and an index registry. Documents are
//! arbitrary JSON objects.
//!
//! All state sits behind one mutex, so every operation — in particular the
//! counter increment-and-fetch — is a single atomic read-modify-write, and
//! concurrent inserts can never be handed the same identifier. When opened
//! with a backing path, the full state is rewritten to disk after each
//! mutation; the scale of an SQS catalogue makes that entirely adequate.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::Result;

/// A stored document: a JSON object.
pub type Document = Map<String, Value>;

/// A registered index. The store keeps lookups as scans; the registry
/// mirrors the database-surface contract (build, reset, list) only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub field: String,
    pub background: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
    documents: Vec<Document>,
    counters: BTreeMap<String, i64>,
    indexes: Vec<IndexSpec>,
}

/// The document store. `Send + Sync`; clone-free shared use via `Arc`.
#[derive(Debug)]
pub struct DocStore {
    state: Mutex<StoreState>,
    path: Option<PathBuf>,
}

impl DocStore {
    /// A store that lives only in memory.
    pub fn in_memory() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            path: None,
        }
    }

    /// Open a file-backed store, loading existing state when the file is
    /// present.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => StoreState::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            state: Mutex::new(state),
            path: Some(path),
        })
    }

    /// First document whose `field` equals `value`.
    pub fn find_one(&self, field: &str, value: &Value) -> Option<Document> {
        self.lock()
            .documents
            .iter()
            .find(|doc| doc.get(field) == Some(value))
            .cloned()
    }

    /// Snapshot of every stored document.
    pub fn find_all(&self) -> Vec<Document> {
        self.lock().documents.clone()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.lock().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `$set`-style update of the first document whose `filter_field` equals
    /// `filter_value`. With `upsert`, a miss inserts a new document carrying
    /// the filter equality (`filter_field: filter_value`) merged with `set`,
    /// matching document-database upsert semantics.
    ///
    /// Returns true when a document was updated or inserted.
    pub fn update_one(
        &self,
        filter_field: &str,
        filter_value: &Value,
        set: &Document,
        upsert: bool,
    ) -> Result<bool> {
        let mut state = self.lock();
        let position = state
            .documents
            .iter()
            .position(|doc| doc.get(filter_field) == Some(filter_value));
        match position {
            Some(i) => {
                for (k, v) in set {
                    state.documents[i].insert(k.clone(), v.clone());
                }
            }
            None if upsert => {
                let mut doc = Document::new();
                doc.insert(filter_field.to_string(), filter_value.clone());
                for (k, v) in set {
                    doc.insert(k.clone(), v.clone());
                }
                state.documents.push(doc);
            }
            None => return Ok(false),
        }
        self.persist(&state)?;
        Ok(true)
    }

    /// Delete every document, returning how many were removed.
    pub fn delete_all(&self) -> Result<usize> {
        let mut state = self.lock();
        let removed = state.documents.len();
        state.documents.clear();
        self.persist(&state)?;
        Ok(removed)
    }

    /// Atomic increment-and-fetch of a named counter, starting from 1 on
    /// first use.
    pub fn next_counter(&self, name: &str) -> Result<i64> {
        let mut state = self.lock();
        let counter = state.counters.entry(name.to_string()).or_insert(0);
        *counter += 1;
        let value = *counter;
        self.persist(&state)?;
        Ok(value)
    }

    /// Register an index on `field`. Idempotent.
    pub fn create_index(&self, field: &str, background: bool) -> Result<()> {
        let mut state = self.lock();
        if !state.indexes.iter().any(|i| i.field == field) {
            state.indexes.push(IndexSpec {
                field: field.to_string(),
                background,
            });
            self.persist(&state)?;
        }
        Ok(())
    }

    /// The registered indexes.
    pub fn indexes(&self) -> Vec<IndexSpec> {
        self.lock().indexes.clone()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // a poisoned lock only means another thread panicked mid-operation;
        // the state itself is always structurally valid
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self, state: &StoreState) -> Result<()> {
        if let Some(path) = &self.path {
            fs::write(path, serde_json::to_string_pretty(state)?)?;
        }
        Ok(())
    }
}
