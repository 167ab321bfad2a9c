//! Monotonic clock abstraction
//!
//! Both the capture session and the replay scheduler only ever need two things
//! from time: "how long since some fixed origin" and "suspend for this long".
//! [`SystemClock`] answers both from `std::time::Instant`; [`ManualClock`]
//! answers them from a counter that only moves when told to, which keeps the
//! replay timing tests exact.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of monotonic time and suspension.
pub trait Clock: Send + Sync {
    /// Monotonic time elapsed since an arbitrary, fixed origin.
    fn now(&self) -> Duration;

    /// Suspend the calling thread for `duration`.
    fn sleep(&self, duration: Duration);

    /// Seconds elapsed between `origin` (a previous `now()`) and the present.
    #[inline]
    fn secs_since(&self, origin: Duration) -> f64 {
        self.now().saturating_sub(origin).as_secs_f64()
    }
}

/// Wall clock backed by `Instant`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

type SleepHook = Box<dyn Fn(Duration) + Send + Sync>;

struct ManualState {
    now: Duration,
    sleeps: Vec<Duration>,
}

/// Deterministic clock for tests.
///
/// `sleep()` returns immediately after advancing the clock by exactly the
/// requested amount. An optional hook observes the time after every sleep,
/// which lets a test act "in the middle of" a wait.
#[derive(Clone)]
pub struct ManualClock {
    state: Arc<Mutex<ManualState>>,
    hook: Arc<Mutex<Option<SleepHook>>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState {
                now: Duration::ZERO,
                sleeps: Vec::new(),
            })),
            hook: Arc::new(Mutex::new(None)),
        }
    }

    /// Move time forward without recording a sleep.
    pub fn advance(&self, by: Duration) {
        self.state.lock().now += by;
    }

    /// Install a callback invoked with the new `now()` after every sleep.
    pub fn on_sleep(&self, hook: impl Fn(Duration) + Send + Sync + 'static) {
        *self.hook.lock() = Some(Box::new(hook));
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state.lock().sleeps.clone()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ManualClock")
            .field("now", &state.now)
            .field("sleeps", &state.sleeps.len())
            .finish()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.state.lock().now
    }

    fn sleep(&self, duration: Duration) {
        let now = {
            let mut state = self.state.lock();
            state.now += duration;
            state.sleeps.push(duration);
            state.now
        };
        // Hook runs without the state lock so it may call back into the clock.
        if let Some(hook) = self.hook.lock().as_ref() {
            hook(now);
        }
    }
}
