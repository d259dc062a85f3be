pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{CsvDirectorySource, ItopClient, ReportWriter, TomlCatalogStore};
pub use config::CliConfig;
pub use core::engine::SyncEngine;
pub use core::matcher::classify;
pub use utils::error::{Result, SyncError};
