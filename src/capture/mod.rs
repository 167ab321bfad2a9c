//! Event capture module
//!
//! Turns raw OS input notifications into recorded [`Event`]s: normalization,
//! mouse-move filtering, hotkey handling and the session state machine.
//! The OS hook itself lives behind the [`InputSource`] trait.

pub mod filter;
pub mod hotkey;
pub mod raw;
pub mod session;
pub mod types;

pub use filter::MoveFilter;
pub use hotkey::{Hotkey, HotkeyBindings, HotkeyMatcher, HotkeyTrigger};
pub use raw::{normalize, NativeKey, RawInputEvent};
pub use session::{CaptureSession, InputSource, RawEventSink, SessionState, Subscription};
pub use types::*;
