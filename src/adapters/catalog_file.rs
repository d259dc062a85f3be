//! TOML-backed catalog persistence.
//!
//! The file holds a `[[departments]]` table per canonical department:
//!
//! ```toml
//! [[departments]]
//! DepartmentName = "Engineering"
//! SubList = ["Eng", "ENG-1"]
//! TeamID = "42"
//! ```
//!
//! The engine only calls `save` when a team id was assigned during the
//! run, so a hand-edited file that is already converged is left alone.

use crate::domain::model::CatalogEntry;
use crate::domain::ports::CatalogStore;
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    departments: Vec<CatalogEntry>,
}

#[derive(Debug, Clone)]
pub struct TomlCatalogStore {
    path: PathBuf,
}

impl TomlCatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogStore for TomlCatalogStore {
    fn load(&self) -> Result<Vec<CatalogEntry>> {
        let raw = fs::read_to_string(&self.path)?;
        let file: CatalogFile = toml::from_str(&raw)?;
        Ok(file.departments)
    }

    fn save(&self, entries: &[CatalogEntry]) -> Result<()> {
        let file = CatalogFile {
            departments: entries.to_vec(),
        };
        let raw = toml::to_string_pretty(&file)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}
