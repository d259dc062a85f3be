//! Run orchestration, phase by phase: classify, reconcile teams,
//! persist the catalog, reconcile memberships, write reports.

use crate::adapters::reports::ReportWriter;
use crate::core::catalog::Catalog;
use crate::core::matcher::classify;
use crate::core::membership::MembershipReconciler;
use crate::core::team::TeamReconciler;
use crate::domain::model::{ClassifiedUser, RunSummary};
use crate::domain::ports::{CatalogStore, DirectorySource, RemoteClient};
use crate::utils::error::Result;
use std::sync::Arc;

pub struct SyncEngine<D, C, R>
where
    D: DirectorySource,
    C: CatalogStore,
    R: RemoteClient + 'static,
{
    directory: D,
    catalog_store: C,
    client: Arc<R>,
    reports: ReportWriter,
    org_id: String,
    threshold: f64,
    workers: usize,
}

impl<D, C, R> SyncEngine<D, C, R>
where
    D: DirectorySource,
    C: CatalogStore,
    R: RemoteClient + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        directory: D,
        catalog_store: C,
        client: Arc<R>,
        reports: ReportWriter,
        org_id: String,
        threshold: f64,
        workers: usize,
    ) -> Self {
        Self {
            directory,
            catalog_store,
            client,
            reports,
            org_id,
            threshold,
            workers,
        }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let mut catalog = Catalog::new(self.catalog_store.load()?)?;
        tracing::info!("Loaded catalog with {} departments", catalog.len());

        let users = self.directory.fetch_users()?;
        tracing::info!("Fetched {} directory users", users.len());
        let total_users = users.len();

        let classified: Vec<ClassifiedUser> = users
            .into_iter()
            .map(|u| classify(u, catalog.entries(), self.threshold))
            .collect();
        let (matched, review): (Vec<_>, Vec<_>) =
            classified.into_iter().partition(ClassifiedUser::is_matched);
        tracing::info!(
            "Classified users: {} matched, {} need review",
            matched.len(),
            review.len()
        );

        self.reports.write_matched_users(&matched)?;
        self.reports.write_review_report(&review)?;

        let team_reconciler = TeamReconciler::new(Arc::clone(&self.client), self.org_id.clone());
        let changed = team_reconciler.reconcile(&mut catalog).await?;
        if changed {
            self.catalog_store.save(catalog.entries())?;
            tracing::info!("Catalog changed, persisted updated team ids");
        } else {
            tracing::debug!("Catalog unchanged, skipping save");
        }

        let membership = MembershipReconciler::new(Arc::clone(&self.client), self.workers);
        let outcomes = membership.reconcile(matched.clone(), catalog.team_map()).await;

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        let failed = outcomes.len() - succeeded;
        self.reports.write_outcome_reports(&outcomes)?;

        Ok(RunSummary {
            total_users,
            matched: matched.len(),
            needs_review: review.len(),
            succeeded,
            failed,
            catalog_changed: changed,
        })
    }
}
