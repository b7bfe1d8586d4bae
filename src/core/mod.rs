//! Core business logic for Ferry.
//!
//! This module contains the sync engine: everything between the collaborator
//! traits in [`crate::adapters::traits`] and the CLI.
//!
//! # Modules
//!
//! - [`sync`] - Window, fetching, dedup, batch processing and coordination
//! - [`state`] - Checkpoint model and persistence
//! - [`transform`] - Record sanitization and schema remediation
//!
//! # Sync Workflow
//!
//! 1. **Load State**: Read the checkpoint (zero value when missing or corrupt)
//! 2. **Table Check**: Stop with a `CREATE TABLE` statement if the table is missing
//! 3. **Window**: Derive `[start, now)` from lookback and checkpoint
//! 4. **Dedup Index**: Load the ids already in the table for the window
//! 5. **Batch Loop**: Fetch, skip known ids, sanitize, insert, optionally delete
//! 6. **Checkpoint**: Advance after every committed batch
//! 7. **Report**: Emit the sync summary
//!
//! # Example
//!
//! ```rust,no_run
//! use ferry::adapters::factory::create_collaborators;
//! use ferry::config::load_config;
//! use ferry::core::sync::{SyncCoordinator, SyncSettings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("ferry.toml", false)?;
//! let collaborators = create_collaborators(&config)?;
//!
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//! let coordinator = SyncCoordinator::new(
//!     collaborators.source,
//!     collaborators.sink,
//!     collaborators.checkpoints,
//!     SyncSettings::from_config(&config)?,
//! )
//! .with_shutdown(shutdown_rx);
//!
//! let summary = coordinator.execute_sync().await?;
//! println!("Inserted: {}", summary.inserted);
//! println!("Skipped: {}", summary.skipped);
//! # Ok(())
//! # }
//! ```

pub mod state;
pub mod sync;
pub mod transform;
