//! Google Cloud adapters
//!
//! BigQuery table sink and the bearer-token provider shared with the
//! Cloud Storage checkpoint backend.

pub mod auth;
pub mod bigquery;
pub mod models;

pub use auth::TokenProvider;
pub use bigquery::BigQueryClient;
