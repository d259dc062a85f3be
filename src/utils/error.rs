use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Catalog file error: {0}")]
    CatalogDecode(#[from] toml::de::Error),

    #[error("Catalog file error: {0}")]
    CatalogEncode(#[from] toml::ser::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Duplicate department name in catalog: {name}")]
    DuplicateDepartment { name: String },

    #[error("Remote API returned HTTP {status} for {operation}")]
    HttpStatus { operation: String, status: u16 },

    #[error("Remote API error on {operation}: {message} (code {code})")]
    Api {
        operation: String,
        code: i64,
        message: String,
    },

    #[error("Malformed {operation} response: {detail}")]
    MalformedResponse { operation: String, detail: String },

    #[error("Failed to create team {name}: {source}")]
    TeamCreate {
        name: String,
        #[source]
        source: Box<SyncError>,
    },
}

pub type Result<T> = std::result::Result<T, SyncError>;
