//! Checkpoint storage backends
//!
//! - [`LocalFileStorage`] - JSON file next to the process
//! - [`GcsStorage`] - Cloud Storage object, used in cloud mode when a bucket
//!   is configured

pub mod gcs;
pub mod local;

pub use gcs::GcsStorage;
pub use local::LocalFileStorage;
