//! User reconciliation command.
//!
//! Terminal entry point into the shared reconciliation service - the same
//! implementation behind the two admin HTTP endpoints, with environment
//! access standing in for their token checks.

use clementine_server::clerk::ClerkClient;
use clementine_server::config::ServerConfig;
use clementine_server::db::{self, PgUserStore};
use clementine_server::services::sync::UserSyncService;

/// Run one reconciliation pass and report the outcome.
///
/// Fetches a single page of provider users (up to 500); larger installations
/// need repeated runs and are warned about in the summary.
///
/// # Errors
///
/// Returns an error if configuration, the database pool, or the provider
/// listing fails.
pub async fn sync_users() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;
    let pool = db::create_pool(&config.database_url).await?;
    let clerk = ClerkClient::new(&config.clerk)?;

    let service = UserSyncService::new(clerk, PgUserStore::new(pool.clone()));
    let report = service.reconcile().await?;

    tracing::info!(
        synced = report.synced,
        skipped = report.skipped,
        errors = report.errors.len(),
        "sync complete"
    );

    for failure in &report.errors {
        tracing::warn!(user_id = %failure.user_id, error = %failure.error, "user failed to sync");
    }

    if report.total() >= 500 {
        tracing::warn!("provider returned a full page; users beyond the first 500 were not synced");
    }

    pool.close().await;

    Ok(())
}
