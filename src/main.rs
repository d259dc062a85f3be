use anyhow::Context;
use clap::Parser;
use dept_team_sync::utils::{logger, validation::Validate};
use dept_team_sync::{
    CliConfig, CsvDirectorySource, ItopClient, ReportWriter, SyncEngine, TomlCatalogStore,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting dept-team-sync");
    if config.verbose {
        tracing::debug!("Config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let client = Arc::new(
        ItopClient::new(
            config.api_url.clone(),
            config.api_user.clone(),
            config.api_password.clone(),
            config.api_version.clone(),
            config.timeout_seconds,
            config.insecure_tls,
        )
        .context("failed to build remote API client")?,
    );
    let directory = CsvDirectorySource::new(&config.users_file);
    let catalog_store = TomlCatalogStore::new(&config.catalog_file);
    let reports = ReportWriter::new(&config.output_path)
        .with_context(|| format!("failed to create output directory {}", config.output_path))?;
    let failure_report = reports.path_of(dept_team_sync::adapters::reports::FAILURE_REPORT_FILE);

    let engine = SyncEngine::new(
        directory,
        catalog_store,
        client,
        reports,
        config.org_id.clone(),
        config.threshold,
        config.workers,
    );

    match engine.run().await {
        Ok(summary) => {
            tracing::info!(
                "✅ Sync finished: {} users, {} matched, {} need review, {} synced, {} failed",
                summary.total_users,
                summary.matched,
                summary.needs_review,
                summary.succeeded,
                summary.failed
            );
            if !summary.converged() || summary.needs_review > 0 {
                // The failure/review reports are the alerting signal for
                // whatever notification channel sits downstream.
                tracing::warn!(
                    "⚠️  Run did not fully converge, see reports under {} (failures: {})",
                    config.output_path,
                    failure_report.display()
                );
            }
            println!(
                "✅ Sync completed: {}/{} memberships reconciled",
                summary.succeeded, summary.matched
            );
        }
        Err(e) => {
            tracing::error!("❌ Sync failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
