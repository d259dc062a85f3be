// Adapters layer: concrete implementations for external systems
// (remote API transport, catalog file, directory export, reports).

pub mod catalog_file;
pub mod directory_csv;
pub mod itop;
pub mod reports;

pub use catalog_file::TomlCatalogStore;
pub use directory_csv::CsvDirectorySource;
pub use itop::ItopClient;
pub use reports::ReportWriter;
