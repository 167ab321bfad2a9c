//! Replay Scheduler Integration Tests
//!
//! Timing, repetition, cancellation, progress and failure-recovery behavior
//! of the scheduler, driven by a manual clock so every dispatch time is exact.

use input_replay::capture::types::{Event, KeySymbol, Modifier, ModifierSet, MouseButton};
use input_replay::replay::{
    CancellationToken, InputInjector, NoopObserver, ReplayConfig, ReplayObserver, ReplayProgress,
    ReplayReport, ReplayScheduler, ReplayStatus, ReplayWarning,
};
use input_replay::time::{Clock, ManualClock, SystemClock};
use input_replay::Timeline;
use std::sync::Arc;
use std::time::{Duration, Instant};

// ============================================================================
// Helpers
// ============================================================================

/// Injector that stamps every call with the clock's current time.
struct RecordingInjector<C: Clock> {
    clock: C,
    moves: Vec<(Duration, i32, i32)>,
    calls: usize,
    fail_at_x: Option<i32>,
}

impl<C: Clock> RecordingInjector<C> {
    fn new(clock: C) -> Self {
        Self {
            clock,
            moves: Vec::new(),
            calls: 0,
            fail_at_x: None,
        }
    }

    fn times(&self) -> Vec<Duration> {
        self.moves.iter().map(|(t, _, _)| *t).collect()
    }
}

impl<C: Clock> InputInjector for RecordingInjector<C> {
    fn press_key(&mut self, _key: &KeySymbol) -> input_replay::Result<()> {
        self.calls += 1;
        Ok(())
    }

    fn release_key(&mut self, _key: &KeySymbol) -> input_replay::Result<()> {
        self.calls += 1;
        Ok(())
    }

    fn move_mouse(&mut self, x: i32, y: i32) -> input_replay::Result<()> {
        self.calls += 1;
        if self.fail_at_x == Some(x) {
            return Err(input_replay::Error::Injection(format!("cannot move to {x}")));
        }
        self.moves.push((self.clock.now(), x, y));
        Ok(())
    }

    fn click_mouse(&mut self, _x: i32, _y: i32, _b: MouseButton, _p: bool) -> input_replay::Result<()> {
        self.calls += 1;
        Ok(())
    }

    fn scroll_mouse(&mut self, _x: i32, _y: i32, _dx: i32, _dy: i32) -> input_replay::Result<()> {
        self.calls += 1;
        Ok(())
    }
}

#[derive(Default)]
struct CollectingObserver {
    repetitions: Vec<(u32, u32)>,
    progress: Vec<ReplayProgress>,
    warnings: Vec<ReplayWarning>,
    finished: Option<ReplayReport>,
}

impl ReplayObserver for CollectingObserver {
    fn on_repetition_start(&mut self, repetition: u32, total: u32) {
        self.repetitions.push((repetition, total));
    }

    fn on_progress(&mut self, progress: ReplayProgress) {
        self.progress.push(progress);
    }

    fn on_warning(&mut self, warning: &ReplayWarning) {
        self.warnings.push(warning.clone());
    }

    fn on_finished(&mut self, report: &ReplayReport) {
        self.finished = Some(report.clone());
    }
}

fn three_event_timeline() -> Timeline {
    Timeline::from_events(
        "2025-08-09T16:30:52",
        [
            Event::mouse_move(0.0, 0, 0),
            Event::mouse_move(0.5, 10, 10),
            Event::mouse_move(1.0, 20, 20),
        ],
    )
    .unwrap()
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn scheduler(clock: &ManualClock, config: ReplayConfig) -> ReplayScheduler {
    ReplayScheduler::new(Arc::new(clock.clone()), config)
}

// ============================================================================
// Timing
// ============================================================================

#[test]
fn test_speed_one_dispatches_at_recorded_offsets() {
    let clock = ManualClock::new();
    let mut injector = RecordingInjector::new(clock.clone());

    let report = scheduler(&clock, ReplayConfig::default())
        .run(&three_event_timeline(), &mut injector, &mut NoopObserver, &CancellationToken::new())
        .unwrap();

    assert_eq!(report.status, ReplayStatus::Completed);
    assert_eq!(report.dispatched, 3);
    assert_eq!(report.failed, 0);
    assert_eq!(injector.times(), vec![ms(0), ms(500), ms(1000)]);
    assert_eq!(report.elapsed, ms(1000));
}

#[test]
fn test_speed_two_halves_offsets() {
    let clock = ManualClock::new();
    let mut injector = RecordingInjector::new(clock.clone());

    scheduler(&clock, ReplayConfig::default().with_speed(2.0))
        .run(&three_event_timeline(), &mut injector, &mut NoopObserver, &CancellationToken::new())
        .unwrap();

    assert_eq!(injector.times(), vec![ms(0), ms(250), ms(500)]);
}

#[test]
fn test_half_speed_doubles_offsets() {
    let clock = ManualClock::new();
    let mut injector = RecordingInjector::new(clock.clone());

    scheduler(&clock, ReplayConfig::default().with_speed(0.5))
        .run(&three_event_timeline(), &mut injector, &mut NoopObserver, &CancellationToken::new())
        .unwrap();

    assert_eq!(injector.times(), vec![ms(0), ms(1000), ms(2000)]);
}

#[test]
fn test_waits_are_sliced() {
    let clock = ManualClock::new();
    let mut injector = RecordingInjector::new(clock.clone());

    scheduler(&clock, ReplayConfig::default())
        .run(&three_event_timeline(), &mut injector, &mut NoopObserver, &CancellationToken::new())
        .unwrap();

    let sleeps = clock.sleeps();
    assert_eq!(sleeps.len(), 20);
    assert!(sleeps.iter().all(|s| *s <= ms(50)));
}

// ============================================================================
// Repetitions
// ============================================================================

#[test]
fn test_three_repetitions_restart_origin() {
    let clock = ManualClock::new();
    let mut injector = RecordingInjector::new(clock.clone());
    let mut observer = CollectingObserver::default();

    let report = scheduler(&clock, ReplayConfig::default().with_repetitions(3))
        .run(&three_event_timeline(), &mut injector, &mut observer, &CancellationToken::new())
        .unwrap();

    assert_eq!(report.status, ReplayStatus::Completed);
    assert_eq!(report.dispatched, 9);
    assert_eq!(report.repetitions_completed, 3);
    assert_eq!(
        injector.times(),
        vec![
            ms(0),
            ms(500),
            ms(1000),
            ms(1000),
            ms(1500),
            ms(2000),
            ms(2000),
            ms(2500),
            ms(3000)
        ]
    );
    assert_eq!(observer.repetitions, vec![(1, 3), (2, 3), (3, 3)]);
}

#[test]
fn test_repetition_timing_is_independent_of_drift() {
    let clock = ManualClock::new();

    // The first injection of every repetition takes 300ms.
    struct Laggy {
        clock: ManualClock,
        at: Vec<Duration>,
    }
    impl InputInjector for Laggy {
        fn press_key(&mut self, _: &KeySymbol) -> input_replay::Result<()> {
            Ok(())
        }
        fn release_key(&mut self, _: &KeySymbol) -> input_replay::Result<()> {
            Ok(())
        }
        fn move_mouse(&mut self, x: i32, _y: i32) -> input_replay::Result<()> {
            self.at.push(self.clock.now());
            if x == 0 {
                self.clock.advance(ms(300));
            }
            Ok(())
        }
        fn click_mouse(&mut self, _: i32, _: i32, _: MouseButton, _: bool) -> input_replay::Result<()> {
            Ok(())
        }
        fn scroll_mouse(&mut self, _: i32, _: i32, _: i32, _: i32) -> input_replay::Result<()> {
            Ok(())
        }
    }

    let mut injector = Laggy {
        clock: clock.clone(),
        at: Vec::new(),
    };
    scheduler(&clock, ReplayConfig::default().with_repetitions(2))
        .run(&three_event_timeline(), &mut injector, &mut NoopObserver, &CancellationToken::new())
        .unwrap();

    // Second repetition starts at 1000ms and is laid out relative to that.
    assert_eq!(
        injector.at,
        vec![ms(0), ms(500), ms(1000), ms(1000), ms(1500), ms(2000)]
    );
}

// ============================================================================
// Cancellation
// ============================================================================

#[test]
fn test_cancel_mid_wait_dispatches_exactly_one() {
    let clock = ManualClock::new();
    let token = CancellationToken::new();
    let hook_token = token.clone();
    clock.on_sleep(move |now| {
        if now >= ms(200) {
            hook_token.cancel();
        }
    });

    let mut injector = RecordingInjector::new(clock.clone());
    let mut observer = CollectingObserver::default();
    let report = scheduler(&clock, ReplayConfig::default().with_repetitions(3))
        .run(&three_event_timeline(), &mut injector, &mut observer, &token)
        .unwrap();

    assert_eq!(report.status, ReplayStatus::Cancelled);
    assert_eq!(report.dispatched, 1);
    assert_eq!(report.repetitions_completed, 0);
    assert_eq!(injector.moves.len(), 1);
    // Observed within one slice of the request.
    assert_eq!(clock.now(), ms(200));
    assert_eq!(observer.finished.unwrap().status, ReplayStatus::Cancelled);
}

#[test]
fn test_cancel_during_final_wait() {
    let clock = ManualClock::new();
    let token = CancellationToken::new();
    let hook_token = token.clone();
    clock.on_sleep(move |now| {
        if now >= ms(1000) {
            hook_token.cancel();
        }
    });

    let mut injector = RecordingInjector::new(clock.clone());
    let report = scheduler(&clock, ReplayConfig::default().with_repetitions(3))
        .run(&three_event_timeline(), &mut injector, &mut NoopObserver, &token)
        .unwrap();

    assert_eq!(report.status, ReplayStatus::Cancelled);
    assert_eq!(report.dispatched, 2);
    assert_eq!(report.repetitions_completed, 0);
}

#[test]
fn test_cancel_from_another_thread_on_real_clock() {
    let timeline = Timeline::from_events(
        "2025-08-09T16:30:52",
        [Event::mouse_move(0.0, 0, 0), Event::mouse_move(5.0, 1, 1)],
    )
    .unwrap();
    let token = CancellationToken::new();
    let remote = token.clone();
    let canceller = std::thread::spawn(move || {
        std::thread::sleep(ms(100));
        remote.cancel();
    });

    let clock = SystemClock::new();
    let mut injector = RecordingInjector::new(clock);
    let started = Instant::now();
    let report = ReplayScheduler::new(Arc::new(clock), ReplayConfig::default())
        .run(&timeline, &mut injector, &mut NoopObserver, &token)
        .unwrap();
    canceller.join().unwrap();

    assert_eq!(report.status, ReplayStatus::Cancelled);
    assert_eq!(report.dispatched, 1);
    assert!(started.elapsed() < Duration::from_secs(2));
}

// ============================================================================
// Edge cases and recovery
// ============================================================================

#[test]
fn test_empty_timeline_completes_immediately() {
    let clock = ManualClock::new();
    let mut injector = RecordingInjector::new(clock.clone());
    let mut observer = CollectingObserver::default();

    let report = scheduler(&clock, ReplayConfig::default().with_repetitions(5))
        .run(
            &Timeline::new("2025-08-09T16:30:52"),
            &mut injector,
            &mut observer,
            &CancellationToken::new(),
        )
        .unwrap();

    assert_eq!(report.status, ReplayStatus::Completed);
    assert_eq!(report.dispatched, 0);
    assert_eq!(report.elapsed, Duration::ZERO);
    assert_eq!(injector.calls, 0);
    assert!(clock.sleeps().is_empty());
    assert!(observer.progress.is_empty());
    assert!(observer.finished.is_some());
}

#[test]
fn test_injection_failure_is_a_warning() {
    let clock = ManualClock::new();
    let mut injector = RecordingInjector::new(clock.clone());
    injector.fail_at_x = Some(10);
    let mut observer = CollectingObserver::default();

    let report = scheduler(&clock, ReplayConfig::default())
        .run(&three_event_timeline(), &mut injector, &mut observer, &CancellationToken::new())
        .unwrap();

    assert_eq!(report.status, ReplayStatus::Completed);
    assert_eq!(report.dispatched, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(observer.warnings.len(), 1);
    assert_eq!(observer.warnings[0].index, 1);
    assert_eq!(observer.warnings[0].event_type, "mouse_move");
    assert!(observer.warnings[0].message.contains("cannot move"));
    // The event after the failure keeps its schedule.
    assert_eq!(injector.times(), vec![ms(0), ms(1000)]);
}

#[test]
fn test_held_keys_released_on_exit_and_not_counted() {
    let clock = ManualClock::new();
    let timeline = Timeline::from_events(
        "2025-08-09T16:30:52",
        [Event::key_press(0.0, KeySymbol::Char('a'), ModifierSet::new())],
    )
    .unwrap();

    let mut injector = RecordingInjector::new(clock.clone());
    let report = scheduler(&clock, ReplayConfig::default())
        .run(&timeline, &mut injector, &mut NoopObserver, &CancellationToken::new())
        .unwrap();
    assert_eq!(report.dispatched, 1);
    assert_eq!(injector.calls, 2, "press plus cleanup release");

    let mut injector = RecordingInjector::new(clock.clone());
    let config = ReplayConfig {
        release_held_on_exit: false,
        ..Default::default()
    };
    scheduler(&clock, config)
        .run(&timeline, &mut injector, &mut NoopObserver, &CancellationToken::new())
        .unwrap();
    assert_eq!(injector.calls, 1);
}

/// Tracks which keys are down, failing the first release of one key.
#[derive(Default)]
struct KeyboardInjector {
    down: Vec<String>,
    fail_first_release_of: Option<String>,
}

impl InputInjector for KeyboardInjector {
    fn press_key(&mut self, key: &KeySymbol) -> input_replay::Result<()> {
        self.down.push(key.to_string());
        Ok(())
    }

    fn release_key(&mut self, key: &KeySymbol) -> input_replay::Result<()> {
        let name = key.to_string();
        if self.fail_first_release_of.as_deref() == Some(name.as_str()) {
            self.fail_first_release_of = None;
            return Err(input_replay::Error::Injection(format!("cannot release {name}")));
        }
        self.down.retain(|k| *k != name);
        Ok(())
    }

    fn move_mouse(&mut self, _x: i32, _y: i32) -> input_replay::Result<()> {
        Ok(())
    }

    fn click_mouse(&mut self, _x: i32, _y: i32, _b: MouseButton, _p: bool) -> input_replay::Result<()> {
        Ok(())
    }

    fn scroll_mouse(&mut self, _x: i32, _y: i32, _dx: i32, _dy: i32) -> input_replay::Result<()> {
        Ok(())
    }
}

#[test]
fn test_failed_modifier_release_is_retried_on_exit() {
    let clock = ManualClock::new();
    let mods: ModifierSet = [Modifier::Ctrl, Modifier::Shift].into();
    let timeline = Timeline::from_events(
        "2025-08-09T16:30:52",
        [
            Event::key_press(0.0, KeySymbol::Char('c'), mods.clone()),
            Event::key_release(0.1, KeySymbol::Char('c'), mods),
        ],
    )
    .unwrap();

    let mut injector = KeyboardInjector {
        fail_first_release_of: Some("shift".into()),
        ..Default::default()
    };
    let mut observer = CollectingObserver::default();
    let report = scheduler(&clock, ReplayConfig::default())
        .run(&timeline, &mut injector, &mut observer, &CancellationToken::new())
        .unwrap();

    assert_eq!(report.status, ReplayStatus::Completed);
    assert_eq!(report.dispatched, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(observer.warnings.len(), 1);
    assert!(injector.down.is_empty(), "still down: {:?}", injector.down);
}

// ============================================================================
// Progress
// ============================================================================

#[test]
fn test_progress_is_throttled_but_bounds_always_notify() {
    let clock = ManualClock::new();
    let events = (0..=100).map(|i| Event::mouse_move(i as f64 / 100.0, i, i));
    let timeline = Timeline::from_events("2025-08-09T16:30:52", events).unwrap();

    let mut injector = RecordingInjector::new(clock.clone());
    let mut observer = CollectingObserver::default();
    scheduler(&clock, ReplayConfig::default().with_repetitions(2))
        .run(&timeline, &mut injector, &mut observer, &CancellationToken::new())
        .unwrap();

    assert_eq!(injector.moves.len(), 202);
    // ~10 per second of replay, well under one per event.
    assert!(observer.progress.len() >= 20 && observer.progress.len() <= 26);

    for repetition in 1..=2 {
        let of_rep: Vec<_> = observer
            .progress
            .iter()
            .filter(|p| p.repetition == repetition)
            .collect();
        assert_eq!(of_rep.first().unwrap().index, 1);
        assert_eq!(of_rep.last().unwrap().index, 101);
        assert!(of_rep.iter().all(|p| p.total_events == 101 && p.total_repetitions == 2));
    }
}

// ============================================================================
// Wall clock
// ============================================================================

#[test]
fn test_wall_clock_timing_within_tolerance() {
    let clock = SystemClock::new();
    let mut injector = RecordingInjector::new(clock);
    let origin = clock.now();

    ReplayScheduler::new(Arc::new(clock), ReplayConfig::default().with_speed(2.0))
        .run(&three_event_timeline(), &mut injector, &mut NoopObserver, &CancellationToken::new())
        .unwrap();

    let expected = [0u64, 250, 500];
    for (at, want) in injector.times().iter().zip(expected) {
        let offset = at.saturating_sub(origin).as_secs_f64() * 1000.0;
        assert!(
            (offset - want as f64).abs() < 60.0,
            "dispatched at {offset:.1}ms, expected ~{want}ms"
        );
    }
}

#[test]
fn test_invalid_settings_are_errors() {
    let clock = ManualClock::new();
    let mut injector = RecordingInjector::new(clock.clone());
    let result = scheduler(&clock, ReplayConfig::default().with_repetitions(0)).run(
        &three_event_timeline(),
        &mut injector,
        &mut NoopObserver,
        &CancellationToken::new(),
    );
    assert!(matches!(result, Err(input_replay::Error::InvalidReplay(_))));
}
