//! Timeline Module
//!
//! The ordered, append-only record of one capture session plus its metadata,
//! the persisted JSON format it is saved in, and the recordings directory.

pub mod format;
pub mod library;
pub mod store;

pub use format::{default_file_name, deserialize, serialize};
pub use library::{list_recordings, most_recent, RecordingEntry};
pub use store::{Timeline, TimelineSummary};
