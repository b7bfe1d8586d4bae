//! External system integrations for Ferry.
//!
//! This module provides adapters for the systems a sync run talks to:
//!
//! - [`odoo`] - Odoo JSON-RPC record source
//! - [`gcp`] - BigQuery table sink and Google access tokens
//! - [`checkpoint`] - Local file and Cloud Storage checkpoint backends
//! - [`factory`] - Builds all of the above from configuration
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies and
//! enable testing with mock implementations. The sync engine only sees the
//! traits in [`traits`].
//!
//! # Odoo Adapter
//!
//! ```rust,no_run
//! use ferry::adapters::odoo::OdooClient;
//! use ferry::adapters::traits::RecordSource;
//! use ferry::config::{secret_string, OdooConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = OdooConfig {
//!     url: "https://erp.example.com".to_string(),
//!     database: "production".to_string(),
//!     username: "bigquery-sync@example.com".to_string(),
//!     password: Some(secret_string("secret".to_string())),
//!     model: "sale.order".to_string(),
//!     ..Default::default()
//! };
//!
//! let client = OdooClient::new(&config)?;
//! client.authenticate().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Retries
//!
//! HTTP adapters wrap every call in [`retry::retry_request`], which retries
//! connection failures, timeouts and 5xx answers with exponential backoff.

pub mod checkpoint;
pub mod factory;
pub mod gcp;
pub mod odoo;
pub mod retry;
pub mod traits;
