use serde::{Deserialize, Serialize};
use std::fmt;

/// A user as exported from the organizational directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryUser {
    #[serde(rename = "CN")]
    pub cn: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "SAMAccountName")]
    pub account_name: String,
    #[serde(rename = "Department")]
    pub department: String,
}

/// One canonical department in the catalog file.
///
/// `team_id` is empty until the team reconciler assigns one. Once a
/// team id has been confirmed to exist remotely it is authoritative and
/// is only replaced after the remote system reports it gone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "DepartmentName")]
    pub department_name: String,
    #[serde(rename = "SubList", default)]
    pub sub_list: Vec<String>,
    #[serde(rename = "TeamID", default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
}

/// Output of the matcher for a single directory user.
///
/// `matched` is set only when `confidence` met the threshold;
/// `best_guess` and `confidence` are always carried so unmatched users
/// can be reported for manual review instead of silently dropped.
#[derive(Debug, Clone)]
pub struct ClassifiedUser {
    pub user: DirectoryUser,
    pub matched: Option<String>,
    pub best_guess: String,
    pub confidence: f64,
}

impl ClassifiedUser {
    pub fn is_matched(&self) -> bool {
        self.matched.is_some()
    }
}

/// A team as listed by the remote system.
#[derive(Debug, Clone)]
pub struct RemoteTeam {
    pub id: String,
    pub name: String,
}

/// Result of reconciling one user's team membership.
#[derive(Debug, Clone)]
pub struct MembershipOutcome {
    pub user: DirectoryUser,
    pub team_id: Option<String>,
    pub status: MembershipStatus,
}

impl MembershipOutcome {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipStatus {
    /// User was added and the update response echoed them back.
    Success,
    /// User was already in the team; no update was issued.
    AlreadyMember,
    /// The catalog holds no team id for the user's department.
    NoTeamMapping { department: String },
    /// Directory login did not resolve to a remote person.
    UserNotFound,
    /// A remote call failed (transport or malformed response).
    RemoteCallFailed { cause: String },
    /// The update got an HTTP-level success but the remote system did
    /// not confirm the new member in its echoed list.
    UpdateNotConfirmed { message: String },
}

impl MembershipStatus {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            MembershipStatus::Success | MembershipStatus::AlreadyMember
        )
    }
}

impl fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MembershipStatus::Success => write!(f, "Successfully added to team"),
            MembershipStatus::AlreadyMember => write!(f, "Already in team"),
            MembershipStatus::NoTeamMapping { department } => {
                write!(f, "No TeamID mapping for department: {}", department)
            }
            MembershipStatus::UserNotFound => write!(f, "User not found in remote system (by login)"),
            MembershipStatus::RemoteCallFailed { cause } => {
                write!(f, "Failed to add to team: {}", cause)
            }
            MembershipStatus::UpdateNotConfirmed { message } => {
                if message.is_empty() {
                    write!(f, "Failed to add to team: user not present in members list after update")
                } else {
                    write!(f, "Failed to add to team: {}", message)
                }
            }
        }
    }
}

/// Per-run counters reported by the engine.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub total_users: usize,
    pub matched: usize,
    pub needs_review: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub catalog_changed: bool,
}

impl RunSummary {
    /// An empty failure report means full convergence for this run.
    pub fn converged(&self) -> bool {
        self.failed == 0
    }
}
