//! Team reconciliation: make sure every catalog department has a
//! remote team, reusing persisted team ids as a cache.
//!
//! One-time-per-run convergence step. Safe to re-run: entries whose
//! team id is still present remotely, or whose name already exists
//! remotely, are short-circuited without mutation. Team creation
//! failures are hard failures for the whole run because the membership
//! phase has no fallback team to target.

use crate::core::catalog::Catalog;
use crate::domain::model::RemoteTeam;
use crate::domain::ports::RemoteClient;
use crate::domain::remote::{ApiEnvelope, TeamFields};
use crate::utils::error::{Result, SyncError};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub struct TeamReconciler<R: RemoteClient> {
    client: Arc<R>,
    org_id: String,
}

impl<R: RemoteClient> TeamReconciler<R> {
    pub fn new(client: Arc<R>, org_id: String) -> Self {
        Self { client, org_id }
    }

    /// List the teams currently known to the remote system.
    pub async fn fetch_remote_teams(&self) -> Result<Vec<RemoteTeam>> {
        let params = json!({
            "class": "Team",
            "key": "SELECT Team",
            "output_fields": "id,name",
        });
        let bytes = self.client.request("core/get", params).await?;
        let envelope: ApiEnvelope<TeamFields> = ApiEnvelope::parse("core/get", &bytes)?;
        envelope.ensure_ok("core/get")?;
        Ok(envelope
            .into_fields()
            .into_iter()
            .map(|f| RemoteTeam {
                id: f.id.0,
                name: f.name,
            })
            .collect())
    }

    /// Converge the catalog against the remote team list. Returns
    /// whether any entry changed during this run.
    pub async fn reconcile(&self, catalog: &mut Catalog) -> Result<bool> {
        let remote = self.fetch_remote_teams().await?;
        tracing::debug!("Remote system lists {} teams", remote.len());

        let mut by_name: HashMap<String, String> = HashMap::new();
        let mut known_ids: HashSet<String> = HashSet::new();
        for team in remote {
            let name = team.name.trim();
            if !name.is_empty() {
                by_name.entry(name.to_uppercase()).or_insert(team.id.clone());
            }
            known_ids.insert(team.id);
        }

        let mut changed = false;
        for index in 0..catalog.len() {
            let name = catalog.entry(index).department_name.trim().to_string();
            if name.is_empty() {
                continue;
            }

            // 1. A persisted team id that still exists remotely is
            //    authoritative; never overwrite it.
            if let Some(team_id) = catalog.entry(index).team_id.clone() {
                if known_ids.contains(&team_id) {
                    continue;
                }
                tracing::info!(
                    "TeamID {} for '{}' no longer present remotely, re-resolving",
                    team_id,
                    name
                );
            }

            // 2. Adopt an existing team by exact (case-insensitive) name.
            if let Some(team_id) = by_name.get(&name.to_uppercase()) {
                if catalog.entry(index).team_id.as_deref() != Some(team_id.as_str()) {
                    tracing::info!("Found team '{}' remotely with ID {}", name, team_id);
                    catalog.set_team_id(index, team_id.clone());
                    changed = true;
                }
                continue;
            }

            // 3. Create the missing team.
            let team_id = self
                .create_team(&name)
                .await
                .map_err(|e| SyncError::TeamCreate {
                    name: name.clone(),
                    source: Box::new(e),
                })?;
            tracing::info!("Created team '{}' with ID {}", name, team_id);
            known_ids.insert(team_id.clone());
            by_name.insert(name.to_uppercase(), team_id.clone());
            catalog.set_team_id(index, team_id);
            changed = true;
        }

        Ok(changed)
    }

    async fn create_team(&self, name: &str) -> Result<String> {
        let params = json!({
            "class": "Team",
            "comment": format!("Creating department {}", name),
            "output_fields": "id,name",
            "fields": {
                "name": name,
                "org_id": self.org_id,
                "status": "active",
            },
        });
        let bytes = self.client.request("core/create", params).await?;
        let envelope: ApiEnvelope<TeamFields> = ApiEnvelope::parse("core/create", &bytes)?;
        envelope.ensure_ok("core/create")?;
        envelope
            .into_fields()
            .into_iter()
            .next()
            .map(|f| f.id.0)
            .ok_or_else(|| SyncError::MalformedResponse {
                operation: "core/create".to_string(),
                detail: "no object returned for created team".to_string(),
            })
    }
}
