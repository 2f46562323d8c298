pub mod daemon;
pub mod doctor;
pub mod onboard;
pub mod once;
pub mod status;

use std::sync::Arc;

use groupwarden_client::MealieClient;
use groupwarden_config::AppConfig;
use groupwarden_reconciler::{Reconciler, ReconcilerOptions};

/// Build a reconciler wired to the configured Mealie server.
pub(crate) fn build_reconciler(
    config: &AppConfig,
) -> Result<Reconciler<MealieClient>, Box<dyn std::error::Error>> {
    config.require_api_key()?;
    let client = MealieClient::from_config(config)?;
    Ok(Reconciler::new(
        Arc::new(client),
        ReconcilerOptions::from(&config.reconcile),
    ))
}
