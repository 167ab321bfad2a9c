//! Replay module
//!
//! Timed re-emission of a recorded timeline through an [`InputInjector`],
//! with speed scaling, repetitions, cooperative cancellation and throttled
//! progress reporting.

pub mod cancel;
pub mod dispatch;
pub mod injector;
pub mod observer;
pub mod scheduler;

pub use cancel::CancellationToken;
pub use dispatch::Dispatcher;
pub use injector::{DryRunInjector, InputInjector};
pub use observer::{
    NoopObserver, ProgressThrottle, ReplayObserver, ReplayProgress, ReplayWarning, TracingObserver,
};
pub use scheduler::{
    clamp_speed, countdown, wait_cancellable, ReplayConfig, ReplayReport, ReplayScheduler,
    ReplayStatus, MAX_SPEED, MIN_SPEED,
};
