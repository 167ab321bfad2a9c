//! Significance filter for pointer motion
//!
//! Mouse-move notifications arrive at hundreds of Hz. A move is only kept if
//! it is both far enough and late enough relative to the last *emitted* move;
//! clicks, keys and scrolls always pass.

use super::types::{Event, EventKind};

/// Default minimum pointer travel between emitted moves (pixels).
pub const DEFAULT_MIN_DISTANCE_PX: f64 = 5.0;

/// Default minimum time between emitted moves (seconds).
pub const DEFAULT_MIN_INTERVAL_SECS: f64 = 0.010;

/// Thresholds for suppressing near-duplicate mouse moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveFilter {
    pub min_distance_px: f64,
    pub min_interval_secs: f64,
}

impl Default for MoveFilter {
    fn default() -> Self {
        Self {
            min_distance_px: DEFAULT_MIN_DISTANCE_PX,
            min_interval_secs: DEFAULT_MIN_INTERVAL_SECS,
        }
    }
}

impl MoveFilter {
    pub fn new(min_distance_px: f64, min_interval_secs: f64) -> Self {
        Self {
            min_distance_px,
            min_interval_secs,
        }
    }

    /// Filter that keeps every event.
    pub fn disabled() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Decide whether `event` should be recorded.
    ///
    /// Non-move events are always significant. A move is suppressed when its
    /// distance from `last_emitted_move` is below `min_distance_px` or when
    /// less than `min_interval_secs` has passed since it.
    pub fn is_significant(&self, event: &Event, last_emitted_move: Option<&Event>) -> bool {
        let (x, y) = match event.kind {
            EventKind::MouseMove { x, y } => (x, y),
            _ => return true,
        };

        let Some(last) = last_emitted_move else {
            return true;
        };
        let (lx, ly) = match last.kind {
            EventKind::MouseMove { x, y } => (x, y),
            // Caller handed us something that is not a move; nothing to compare.
            _ => return true,
        };

        let dx = f64::from(x) - f64::from(lx);
        let dy = f64::from(y) - f64::from(ly);
        let distance = (dx * dx + dy * dy).sqrt();
        let dt = event.timestamp - last.timestamp;

        distance >= self.min_distance_px && dt >= self.min_interval_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::types::{KeySymbol, ModifierSet, MouseButton};

    #[test]
    fn test_first_move_always_significant() {
        let filter = MoveFilter::default();
        assert!(filter.is_significant(&Event::mouse_move(0.0, 0, 0), None));
    }

    #[test]
    fn test_close_and_fast_move_suppressed() {
        let filter = MoveFilter::default();
        let last = Event::mouse_move(1.000, 100, 100);
        let next = Event::mouse_move(1.005, 102, 101);
        assert!(!filter.is_significant(&next, Some(&last)));
    }

    #[test]
    fn test_far_but_fast_move_suppressed() {
        let filter = MoveFilter::default();
        let last = Event::mouse_move(1.000, 100, 100);
        let next = Event::mouse_move(1.004, 200, 200);
        assert!(!filter.is_significant(&next, Some(&last)));
    }

    #[test]
    fn test_close_but_slow_move_suppressed() {
        let filter = MoveFilter::default();
        let last = Event::mouse_move(1.0, 100, 100);
        let next = Event::mouse_move(2.0, 103, 103);
        assert!(!filter.is_significant(&next, Some(&last)));
    }

    #[test]
    fn test_far_and_slow_move_kept() {
        let filter = MoveFilter::default();
        let last = Event::mouse_move(1.0, 100, 100);
        let next = Event::mouse_move(1.02, 110, 100);
        assert!(filter.is_significant(&next, Some(&last)));
    }

    #[test]
    fn test_threshold_boundaries_are_inclusive() {
        let filter = MoveFilter::new(5.0, 0.010);
        let last = Event::mouse_move(0.0, 0, 0);
        // Exactly 5px (3-4-5 triangle) and exactly 10ms.
        let next = Event::mouse_move(0.010, 3, 4);
        assert!(filter.is_significant(&next, Some(&last)));
    }

    #[test]
    fn test_non_move_events_always_significant() {
        let filter = MoveFilter::default();
        let last = Event::mouse_move(1.0, 100, 100);
        let click = Event::mouse_click(1.001, 100, 100, MouseButton::Left, true);
        let key = Event::key_press(1.001, KeySymbol::Char('a'), ModifierSet::new());
        let scroll = Event::mouse_scroll(1.001, 100, 100, 0, 1);
        assert!(filter.is_significant(&click, Some(&last)));
        assert!(filter.is_significant(&key, Some(&last)));
        assert!(filter.is_significant(&scroll, Some(&last)));
    }

    #[test]
    fn test_disabled_filter_keeps_duplicates() {
        let filter = MoveFilter::disabled();
        let last = Event::mouse_move(1.0, 100, 100);
        let same = Event::mouse_move(1.0, 100, 100);
        assert!(filter.is_significant(&same, Some(&last)));
    }
}
