//! Directory users read from a tabular export with columns
//! `CN, Email, SAMAccountName, Department`. LDAP extraction itself
//! lives outside this crate; anything that can produce such an export
//! (or another `DirectorySource` implementation) plugs in here.

use crate::domain::model::DirectoryUser;
use crate::domain::ports::DirectorySource;
use crate::utils::error::Result;
use std::fs::File;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    path: PathBuf,
}

impl CsvDirectorySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DirectorySource for CsvDirectorySource {
    fn fetch_users(&self) -> Result<Vec<DirectoryUser>> {
        let file = File::open(&self.path)?;
        let mut reader = csv::Reader::from_reader(file);
        let mut users = Vec::new();
        for record in reader.deserialize() {
            let user: DirectoryUser = record?;
            users.push(user);
        }
        Ok(users)
    }
}
