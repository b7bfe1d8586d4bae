// Checkpoint model and persistence

pub mod checkpoint;
pub mod manager;

pub use checkpoint::{Checkpoint, CheckpointBuilder, SyncStatus};
pub use manager::CheckpointStore;
