//! Monotonic timing module
//!
//! Capture stamps and replay deadlines are both measured against a [`Clock`]:
//! - Monotonic (never goes backward)
//! - Sampled once per session/repetition origin, differences taken afterwards
//! - Replaceable by [`ManualClock`] so timing logic is testable without sleeping

pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock};
