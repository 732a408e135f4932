//! Checkpoint persistence keyed by thread id.
//!
//! The compiled graph saves its final state through a [`Checkpointer`] when the
//! invoke config names a thread. [`MemorySaver`] keeps checkpoints in process;
//! [`SqliteSaver`] writes them to a SQLite file so a session survives restarts.
//! Two threads never see each other's checkpoints.

mod checkpoint;
mod checkpointer;
mod config;
mod memory_saver;
mod serializer;
mod sqlite_saver;

pub use checkpoint::{Checkpoint, CheckpointListItem, CheckpointMetadata, CheckpointSource};
pub use checkpointer::{CheckpointError, Checkpointer};
pub use config::RunnableConfig;
pub use memory_saver::MemorySaver;
pub use serializer::{JsonSerializer, Serializer};
pub use sqlite_saver::SqliteSaver;
