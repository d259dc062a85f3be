//! In-memory catalog of canonical departments.
//!
//! Loaded once at startup, possibly mutated while reconciling teams,
//! and persisted at the end of the run only when something changed.

use crate::domain::model::CatalogEntry;
use crate::utils::error::{Result, SyncError};
use std::collections::{HashMap, HashSet};

#[derive(Debug)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    changed: bool,
}

impl Catalog {
    /// Canonical names must be unique, compared case-insensitively.
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self> {
        let mut seen = HashSet::new();
        for entry in &entries {
            let key = entry.department_name.trim().to_uppercase();
            if key.is_empty() {
                continue;
            }
            if !seen.insert(key) {
                return Err(SyncError::DuplicateDepartment {
                    name: entry.department_name.clone(),
                });
            }
        }
        Ok(Self {
            entries,
            changed: false,
        })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> &CatalogEntry {
        &self.entries[index]
    }

    pub fn set_team_id(&mut self, index: usize, team_id: String) {
        self.entries[index].team_id = Some(team_id);
        self.changed = true;
    }

    /// Whether any entry was assigned a team id this run.
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Canonical department name -> remote team id, for entries that
    /// already hold one. Built once before the membership phase and
    /// read-only afterwards.
    pub fn team_map(&self) -> HashMap<String, String> {
        self.entries
            .iter()
            .filter_map(|e| {
                e.team_id
                    .as_ref()
                    .map(|id| (e.department_name.clone(), id.clone()))
            })
            .collect()
    }
}
