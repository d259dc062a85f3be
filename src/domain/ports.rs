use crate::domain::model::{CatalogEntry, DirectoryUser};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Opaque capability for the remote JSON API: send one operation with
/// its parameters, get raw response bytes back. The transport carries a
/// fixed timeout and performs no retries; callers decode the bytes into
/// typed schemas.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    async fn request(&self, operation: &str, params: serde_json::Value) -> Result<Vec<u8>>;
}

/// Persistence boundary for the department catalog. `save` is only
/// invoked when a team id was assigned during the run, so a catalog
/// that is already converged is never rewritten.
pub trait CatalogStore: Send + Sync {
    fn load(&self) -> Result<Vec<CatalogEntry>>;
    fn save(&self, entries: &[CatalogEntry]) -> Result<()>;
}

/// Produces the directory users to reconcile. The shipped adapter reads
/// a tabular export; an LDAP query would be another implementation.
pub trait DirectorySource: Send + Sync {
    fn fetch_users(&self) -> Result<Vec<DirectoryUser>>;
}
