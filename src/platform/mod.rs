//! Native input backend (feature `native`)
//!
//! Global capture and synthesis through `rdev`. Requires accessibility
//! permission on macOS and an X11 session on Linux.

pub mod injector;
pub mod keymap;
pub mod listener;

pub use injector::RdevInjector;
pub use listener::RdevSource;
