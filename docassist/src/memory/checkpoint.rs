//! Checkpoint and metadata types.

use std::time::SystemTime;

/// Where a checkpoint came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CheckpointSource {
    /// Saved from the input of an invoke.
    #[default]
    Input,
    /// Saved from inside the run loop.
    Loop,
    /// Saved at the end of a run (the final state).
    Update,
}

impl CheckpointSource {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            CheckpointSource::Input => "Input",
            CheckpointSource::Loop => "Loop",
            CheckpointSource::Update => "Update",
        }
    }

    pub(crate) fn parse(s: &str) -> Self {
        match s {
            "Input" => CheckpointSource::Input,
            "Loop" => CheckpointSource::Loop,
            _ => CheckpointSource::Update,
        }
    }
}

/// Metadata stored alongside each checkpoint.
#[derive(Debug, Clone, Default)]
pub struct CheckpointMetadata {
    pub source: CheckpointSource,
    /// Number of node steps run before the checkpoint was taken.
    pub step: i64,
    pub created_at: Option<SystemTime>,
}

/// One saved state snapshot.
#[derive(Debug, Clone)]
pub struct Checkpoint<S> {
    /// Unique id (uuid v4).
    pub id: String,
    /// RFC 3339 timestamp.
    pub ts: String,
    /// The saved state.
    pub channel_values: S,
    pub metadata: CheckpointMetadata,
}

impl<S> Checkpoint<S> {
    /// Snapshot of `state` with a fresh id and the current time.
    pub fn from_state(state: S, source: CheckpointSource, step: i64) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), state, source, step)
    }

    /// Snapshot with a caller-chosen id.
    pub fn with_id(id: String, state: S, source: CheckpointSource, step: i64) -> Self {
        Self {
            id,
            ts: chrono::Utc::now().to_rfc3339(),
            channel_values: state,
            metadata: CheckpointMetadata {
                source,
                step,
                created_at: Some(SystemTime::now()),
            },
        }
    }
}

/// Entry returned by `Checkpointer::list`: id plus metadata, without the state.
#[derive(Debug, Clone)]
pub struct CheckpointListItem {
    pub checkpoint_id: String,
    pub metadata: CheckpointMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: from_state generates distinct uuid ids and stamps metadata.
    #[test]
    fn from_state_assigns_unique_ids_and_metadata() {
        let a: Checkpoint<i32> = Checkpoint::from_state(1, CheckpointSource::Input, 0);
        let b: Checkpoint<i32> = Checkpoint::from_state(2, CheckpointSource::Update, 3);
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 36);
        assert_eq!(b.metadata.step, 3);
        assert_eq!(b.metadata.source, CheckpointSource::Update);
        assert!(b.metadata.created_at.is_some());
        assert!(chrono::DateTime::parse_from_rfc3339(&b.ts).is_ok());
    }

    /// **Scenario**: Source names survive a string round trip; unknown maps to Update.
    #[test]
    fn source_string_mapping() {
        for s in [
            CheckpointSource::Input,
            CheckpointSource::Loop,
            CheckpointSource::Update,
        ] {
            assert_eq!(CheckpointSource::parse(s.as_str()), s);
        }
        assert_eq!(CheckpointSource::parse("Fork"), CheckpointSource::Update);
    }
}
