//! Merge rules for node output.
//!
//! Each node returns a full state value; the compiled graph folds it into the
//! running state through a [`StateUpdater`]. The default replaces everything.

mod updater;

pub use updater::{boxed_updater, BoxedStateUpdater, FieldBasedUpdater, ReplaceUpdater, StateUpdater};
