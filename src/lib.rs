// Ferry - Odoo to BigQuery sync tool
// Copyright (c) 2025 Ferry Contributors
// Licensed under the MIT License

//! # Ferry - Odoo to BigQuery sync
//!
//! Ferry is a batch ETL tool that copies records of one Odoo model into a
//! BigQuery table, once per invocation.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Extracting** records from Odoo over JSON-RPC, in `create_date, id` order
//! - **Deduplicating** against ids already present in the destination table
//! - **Sanitizing** Odoo values into warehouse-safe scalars
//! - **Loading** rows into BigQuery with per-record insert ids
//! - **Checkpointing** progress locally or in Cloud Storage
//! - **Deleting** synced records from Odoo, optionally, only once they are
//!   confirmed in BigQuery
//!
//! ## Architecture
//!
//! Ferry follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (sync loop, window, dedup, sanitizer, checkpoint)
//! - [`adapters`] - External integrations (Odoo, BigQuery, Cloud Storage)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ferry::adapters::factory::create_collaborators;
//! use ferry::config::load_config;
//! use ferry::core::sync::{SyncCoordinator, SyncSettings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("ferry.toml", false)?;
//!     let collaborators = create_collaborators(&config)?;
//!
//!     let coordinator = SyncCoordinator::new(
//!         collaborators.source,
//!         collaborators.sink,
//!         collaborators.checkpoints,
//!         SyncSettings::from_config(&config)?,
//!     );
//!
//!     let summary = coordinator.execute_sync().await?;
//!     println!("Inserted {} records ({})", summary.inserted, summary.outcome);
//!     Ok(())
//! }
//! ```
//!
//! ## Sync Window
//!
//! Each run syncs records whose `create_date` falls in a half-open window
//! ending at the run's start time. The start is `now - lookback_days -
//! buffer_minutes` (unbounded when `lookback_days = -1`), raised to the
//! checkpoint in incremental mode:
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use ferry::config::SyncMode;
//! use ferry::core::state::Checkpoint;
//! use ferry::core::sync::{SyncWindow, WindowSettings};
//!
//! let settings = WindowSettings {
//!     lookback_days: 1,
//!     buffer_minutes: 2,
//!     mode: SyncMode::Incremental,
//! };
//! let now = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
//! let window = SyncWindow::resolve(&settings, &Checkpoint::default(), now);
//!
//! assert_eq!(window.start, Some(Utc.with_ymd_and_hms(2024, 12, 31, 23, 58, 0).unwrap()));
//! assert_eq!(window.end, now);
//! ```
//!
//! ## Error Handling
//!
//! Ferry uses the [`domain::FerryError`] type for all errors. Per-record
//! insert and delete failures are not errors: they are counted in the
//! [`core::sync::SyncSummary`] and logged with the record id.
//!
//! ## Logging
//!
//! Ferry uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!(model = "sale.order", "Starting sync");
//! warn!(record_id = 42, "Insert failed");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
