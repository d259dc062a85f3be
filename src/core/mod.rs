pub mod catalog;
pub mod engine;
pub mod matcher;
pub mod membership;
pub mod team;

pub use crate::domain::model::{
    CatalogEntry, ClassifiedUser, DirectoryUser, MembershipOutcome, MembershipStatus, RemoteTeam,
    RunSummary,
};
pub use crate::domain::ports::{CatalogStore, DirectorySource, RemoteClient};
pub use crate::utils::error::Result;
