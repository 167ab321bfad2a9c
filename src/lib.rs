//! # Input Replay
//!
//! Records global keyboard and mouse input into a timestamped timeline and
//! replays it later with the original relative timing, scaled by a speed
//! multiplier and repeated any number of times.
//!
//! ## Quick Start
//!
//! ```no_run
//! use input_replay::replay::{CancellationToken, DryRunInjector, ReplayConfig, ReplayScheduler, TracingObserver};
//! use input_replay::time::SystemClock;
//! use input_replay::Timeline;
//! use std::sync::Arc;
//!
//! let timeline = Timeline::load("recordings/demo.json".as_ref())?;
//!
//! let scheduler = ReplayScheduler::new(
//!     Arc::new(SystemClock::new()),
//!     ReplayConfig::default().with_speed(2.0),
//! );
//! let report = scheduler.run(
//!     &timeline,
//!     &mut DryRunInjector::new(),
//!     &mut TracingObserver,
//!     &CancellationToken::new(),
//! )?;
//! println!("{:?}: {} events", report.status, report.dispatched);
//! # Ok::<(), input_replay::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`time`]: Monotonic clock abstraction (real and manual)
//! - [`capture`]: Event model, move filter, hotkeys and the capture session
//! - [`timeline`]: Append-only timeline, JSON format, recordings directory
//! - [`replay`]: Timed replay scheduler, dispatcher and observers
//! - [`app`]: CLI and configuration management
//! - `platform`: `rdev` capture and injection (feature `native`)
//!
//! ## Event Pipeline
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │ InputSource │───▶│  normalize  │───▶│ MoveFilter  │───▶│  Timeline   │
//! │  (OS hook)  │    │  + hotkeys  │    │             │    │   (JSON)    │
//! └─────────────┘    └─────────────┘    └─────────────┘    └─────────────┘
//!                                                                 │
//!                                                                 ▼
//!                    ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//!                    │  Injector   │◀───│ Dispatcher  │◀───│  Scheduler  │
//!                    │  (OS/dry)   │    │             │    │             │
//!                    └─────────────┘    └─────────────┘    └─────────────┘
//! ```
//!
//! ## Permissions
//!
//! Native capture and injection need Accessibility permission on macOS and an
//! X11 session on Linux.

pub mod app;
pub mod capture;
#[cfg(feature = "native")]
pub mod platform;
pub mod replay;
pub mod time;
pub mod timeline;

use std::path::PathBuf;

// Re-export commonly used types
pub use capture::types::{Event, EventKind, KeySymbol, Modifier, ModifierSet, MouseButton};
pub use capture::{CaptureSession, SessionState};
pub use replay::{ReplayConfig, ReplayReport, ReplayScheduler, ReplayStatus};
pub use time::{Clock, ManualClock, SystemClock};
pub use timeline::Timeline;

/// Result type alias for input replay
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for input replay
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Malformed timeline: {reason}")]
    MalformedTimeline { reason: String },

    #[error("Event at {attempted}s is earlier than the last recorded event at {previous}s")]
    OutOfOrder { previous: f64, attempted: f64 },

    #[error("Injection failed: {0}")]
    Injection(String),

    #[error("Event capture error: {0}")]
    Capture(String),

    #[error("Invalid session state: {0}")]
    SessionState(String),

    #[error("Invalid replay settings: {0}")]
    InvalidReplay(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error on {}: {source}", .path.display())]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error means a file was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::FileIo { source, .. } | Error::Io(source) => {
                source.kind() == std::io::ErrorKind::NotFound
            }
            _ => false,
        }
    }
}
