//! Collaborator factory
//!
//! Builds the record source, table sink and checkpoint store for a validated
//! configuration.

use crate::adapters::checkpoint::{GcsStorage, LocalFileStorage};
use crate::adapters::gcp::{BigQueryClient, TokenProvider};
use crate::adapters::odoo::OdooClient;
use crate::adapters::traits::{CheckpointStorage, RecordSource, TableSink};
use crate::config::FerryConfig;
use crate::core::state::CheckpointStore;
use crate::domain::{FerryError, Result};
use reqwest::{Client, ClientBuilder};
use std::sync::Arc;
use std::time::Duration;

/// Everything a sync run talks to
pub struct Collaborators {
    pub source: Arc<dyn RecordSource>,
    pub sink: Arc<dyn TableSink>,
    pub checkpoints: CheckpointStore,
}

/// Create the collaborators for a configuration
///
/// The Google token provider is shared between BigQuery and the Cloud
/// Storage checkpoint backend.
///
/// # Errors
///
/// Returns a configuration error if a client cannot be built, e.g. a missing
/// Odoo password or a local run without an access token.
pub fn create_collaborators(config: &FerryConfig) -> Result<Collaborators> {
    let source: Arc<dyn RecordSource> = Arc::new(OdooClient::new(&config.odoo)?);

    let http = google_http_client(config.bigquery.timeout_seconds)?;
    let auth = Arc::new(TokenProvider::from_config(
        &config.bigquery,
        config.application.environment,
        http.clone(),
    )?);

    let table = config.table_id().map_err(FerryError::Configuration)?;
    tracing::info!(table = %table, "Creating BigQuery client");
    let sink: Arc<dyn TableSink> = Arc::new(BigQueryClient::new(
        &config.bigquery,
        table.project(),
        http.clone(),
        Arc::clone(&auth),
    ));

    let storage = create_checkpoint_storage(config, http, auth)?;
    tracing::info!(location = %storage.location(), "Using checkpoint storage");

    Ok(Collaborators {
        source,
        sink,
        checkpoints: CheckpointStore::new(storage),
    })
}

/// Create the checkpoint storage backend
///
/// Cloud runs with a configured bucket use GCS; everything else a local file
/// named after the model.
pub fn create_checkpoint_storage(
    config: &FerryConfig,
    http: Client,
    auth: Arc<TokenProvider>,
) -> Result<Arc<dyn CheckpointStorage>> {
    let model = config.model_name().map_err(FerryError::Configuration)?;
    let file_name = config.checkpoint.resolved_file_name(&model);

    match config.checkpoint.bucket.as_deref() {
        Some(bucket) if config.uses_gcs_checkpoint() => Ok(Arc::new(GcsStorage::new(
            &config.checkpoint.storage_api_base_url,
            bucket,
            file_name,
            http,
            auth,
            config.bigquery.retry.clone(),
        ))),
        _ => Ok(Arc::new(LocalFileStorage::new(file_name))),
    }
}

fn google_http_client(timeout_seconds: u64) -> Result<Client> {
    ClientBuilder::new()
        .timeout(Duration::from_secs(timeout_seconds))
        .connect_timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| FerryError::Configuration(format!("Failed to build HTTP client: {e}")))
}
