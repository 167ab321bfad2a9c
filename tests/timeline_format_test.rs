//! Timeline Format Integration Tests
//!
//! Persisted JSON compatibility: files written by earlier recorders,
//! malformed inputs that must be rejected, and save/load through the
//! filesystem.

use input_replay::capture::types::{Event, EventKind, KeySymbol, Modifier, ModifierSet, MouseButton, NamedKey};
use input_replay::timeline::{self, list_recordings, most_recent, Timeline};
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

const LEGACY_RECORDING: &str = r#"{
  "recording_info": {
    "start_time": "2025-08-09T16:30:52.123456",
    "duration": 2.5,
    "total_actions": 6,
    "output_file": "recordings/recording_20250809_163052.json"
  },
  "actions": [
    { "type": "mouse_move", "timestamp": 0.0, "x": 640.0, "y": 360.0 },
    { "type": "mouse_click", "timestamp": 0.412, "x": 640, "y": 360, "button": "left", "pressed": true, "modifiers": [] },
    { "type": "mouse_click", "timestamp": 0.498, "x": 640, "y": 360, "button": "left", "pressed": false },
    { "type": "key_press", "timestamp": 1.2, "key": "Key.shift", "modifiers": ["shift"] },
    { "type": "key_press", "timestamp": 1.3, "key": "H", "modifiers": ["shift"] },
    { "type": "mouse_scroll", "timestamp": 2.5, "x": 640, "y": 360, "dx": 0, "dy": -3 }
  ]
}"#;

fn sample() -> Timeline {
    let mut timeline = Timeline::from_events(
        "2025-08-09T16:30:52.000+02:00",
        [
            Event::mouse_move(0.0, 10, 10),
            Event::key_press(0.1, KeySymbol::Named(NamedKey::Enter), ModifierSet::new()),
            Event::key_release(0.1, KeySymbol::Named(NamedKey::Enter), ModifierSet::new()),
            Event::mouse_click(0.2, 10, 10, MouseButton::Middle, true),
            Event::mouse_scroll(0.3, 10, 10, 2, 0),
            Event::key_press(
                1.0 / 3.0,
                KeySymbol::Char('x'),
                [Modifier::Cmd, Modifier::Shift].into(),
            ),
        ],
    )
    .unwrap();
    timeline.set_end_time("2025-08-09T16:30:53.000+02:00");
    timeline
}

fn expect_malformed(json: &str) -> String {
    match timeline::deserialize(json.as_bytes()) {
        Err(input_replay::Error::MalformedTimeline { reason }) => reason,
        other => panic!("expected MalformedTimeline, got {other:?}"),
    }
}

// ============================================================================
// Round trip
// ============================================================================

#[test]
fn test_round_trip_preserves_everything() {
    let original = sample();
    let bytes = timeline::serialize(&original).unwrap();
    let decoded = timeline::deserialize(&bytes).unwrap();
    assert_eq!(decoded, original);
    assert_eq!(decoded.duration(), decoded.events().last().unwrap().timestamp);
}

// ============================================================================
// Compatibility
// ============================================================================

#[test]
fn test_legacy_recording_loads() {
    let timeline = timeline::deserialize(LEGACY_RECORDING.as_bytes()).unwrap();
    assert_eq!(timeline.len(), 6);
    assert_eq!(timeline.duration(), 2.5);
    assert_eq!(timeline.start_time(), "2025-08-09T16:30:52.123456");
    assert!(timeline.end_time().is_none());

    assert_eq!(timeline.events()[0].kind, EventKind::MouseMove { x: 640, y: 360 });
    match &timeline.events()[3].kind {
        EventKind::Key { key, modifiers, .. } => {
            assert_eq!(*key, KeySymbol::Named(NamedKey::Shift));
            assert!(modifiers.contains(Modifier::Shift));
        }
        other => panic!("unexpected {other:?}"),
    }
    match &timeline.events()[4].kind {
        EventKind::Key { key, .. } => assert_eq!(*key, KeySymbol::Char('H')),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_stale_metadata_is_recomputed() {
    let json = r#"{
      "recording_info": { "start_time": "2025-08-09T16:30:52", "duration": 99.0, "total_actions": 42 },
      "actions": [ { "type": "mouse_move", "timestamp": 0.5, "x": 1, "y": 2 } ]
    }"#;
    let timeline = timeline::deserialize(json.as_bytes()).unwrap();
    assert_eq!(timeline.total_actions(), 1);
    assert_eq!(timeline.duration(), 0.5);
}

#[test]
fn test_unknown_key_names_survive() {
    let json = r#"{
      "recording_info": { "start_time": "2025-08-09T16:30:52", "duration": 0.0, "total_actions": 1 },
      "actions": [ { "type": "key_press", "timestamp": 0.0, "key": "<65>", "modifiers": [] } ]
    }"#;
    let timeline = timeline::deserialize(json.as_bytes()).unwrap();
    let bytes = timeline::serialize(&timeline).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.contains("\"key\": \"<65>\""));
}

// ============================================================================
// Rejections
// ============================================================================

#[test]
fn test_missing_actions_key() {
    let reason = expect_malformed(
        r#"{ "recording_info": { "start_time": "2025-08-09T16:30:52", "duration": 0, "total_actions": 0 } }"#,
    );
    assert!(reason.contains("actions"));
}

#[test]
fn test_non_monotonic_timestamps() {
    let reason = expect_malformed(
        r#"{
          "recording_info": { "start_time": "2025-08-09T16:30:52", "duration": 1.0, "total_actions": 2 },
          "actions": [
            { "type": "mouse_move", "timestamp": 1.0, "x": 0, "y": 0 },
            { "type": "mouse_move", "timestamp": 0.5, "x": 1, "y": 1 }
          ]
        }"#,
    );
    assert!(reason.contains("action 1"));
}

#[test]
fn test_unknown_event_type() {
    expect_malformed(
        r#"{
          "recording_info": { "start_time": "2025-08-09T16:30:52", "duration": 0.0, "total_actions": 1 },
          "actions": [ { "type": "touch", "timestamp": 0.0, "x": 0, "y": 0 } ]
        }"#,
    );
}

#[test]
fn test_missing_variant_field() {
    expect_malformed(
        r#"{
          "recording_info": { "start_time": "2025-08-09T16:30:52", "duration": 0.0, "total_actions": 1 },
          "actions": [ { "type": "mouse_click", "timestamp": 0.0, "x": 0, "y": 0, "button": "left" } ]
        }"#,
    );
}

// ============================================================================
// Files
// ============================================================================

#[test]
fn test_save_load_and_list() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("recordings");
    let path = dir.join(timeline::default_file_name());

    let original = sample();
    original.save(&path).unwrap();
    assert!(!path.with_extension("json.tmp").exists());

    let loaded = Timeline::load(&path).unwrap();
    assert_eq!(loaded, original);

    let entries = list_recordings(&dir).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].summary.as_ref().unwrap().total_actions, 6);
    assert_eq!(most_recent(&dir).unwrap(), Some(path));
}

#[test]
fn test_load_missing_file_reports_path() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("missing.json");
    let err = Timeline::load(&path).unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("missing.json"));
}

#[test]
fn test_load_malformed_file_names_path() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.json");
    std::fs::write(&path, r#"{ "recording_info": {} }"#).unwrap();
    match Timeline::load(&path) {
        Err(input_replay::Error::MalformedTimeline { reason }) => {
            assert!(reason.contains("broken.json"))
        }
        other => panic!("expected MalformedTimeline, got {other:?}"),
    }
}
