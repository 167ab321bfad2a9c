//! Persisted Timeline Format
//!
//! JSON document with two top-level keys:
//!
//! ```text
//! {
//!   "recording_info": { "start_time": "...", "duration": 1.0, "total_actions": 3 },
//!   "actions": [ { "type": "mouse_move", "timestamp": 0.0, "x": 10, "y": 20 }, ... ]
//! }
//! ```
//!
//! Decoding is strict about structure (missing fields, unknown `type` tags,
//! negative or decreasing timestamps are all [`crate::Error::MalformedTimeline`])
//! and lenient about metadata the events already determine.

use super::store::Timeline;
use crate::capture::types::{Event, EventKind, KeyAction, KeySymbol, ModifierSet, MouseButton};
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Tolerance when comparing a stored `duration` with the last timestamp.
const DURATION_EPSILON: f64 = 1e-6;

#[derive(Debug, Serialize, Deserialize)]
struct WireTimeline {
    recording_info: WireInfo,
    actions: Vec<WireAction>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireInfo {
    start_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_time: Option<String>,
    duration: f64,
    total_actions: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireAction {
    KeyPress {
        timestamp: f64,
        key: KeySymbol,
        #[serde(default)]
        modifiers: ModifierSet,
    },
    KeyRelease {
        timestamp: f64,
        key: KeySymbol,
        #[serde(default)]
        modifiers: ModifierSet,
    },
    MouseMove {
        timestamp: f64,
        #[serde(deserialize_with = "pixel")]
        x: i32,
        #[serde(deserialize_with = "pixel")]
        y: i32,
    },
    MouseClick {
        timestamp: f64,
        #[serde(deserialize_with = "pixel")]
        x: i32,
        #[serde(deserialize_with = "pixel")]
        y: i32,
        button: MouseButton,
        pressed: bool,
    },
    MouseScroll {
        timestamp: f64,
        #[serde(deserialize_with = "pixel")]
        x: i32,
        #[serde(deserialize_with = "pixel")]
        y: i32,
        #[serde(deserialize_with = "pixel")]
        dx: i32,
        #[serde(deserialize_with = "pixel")]
        dy: i32,
    },
}

/// Accept integral or fractional numbers for coordinates; some hooks report
/// sub-pixel positions.
fn pixel<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    let value = f64::deserialize(deserializer)?;
    let rounded = value.round();
    if !rounded.is_finite() || rounded < i32::MIN as f64 || rounded > i32::MAX as f64 {
        return Err(serde::de::Error::custom(format!(
            "coordinate {value} out of range"
        )));
    }
    Ok(rounded as i32)
}

impl From<&Event> for WireAction {
    fn from(event: &Event) -> Self {
        let timestamp = event.timestamp;
        match &event.kind {
            EventKind::Key {
                action: KeyAction::Press,
                key,
                modifiers,
            } => WireAction::KeyPress {
                timestamp,
                key: key.clone(),
                modifiers: modifiers.clone(),
            },
            EventKind::Key {
                action: KeyAction::Release,
                key,
                modifiers,
            } => WireAction::KeyRelease {
                timestamp,
                key: key.clone(),
                modifiers: modifiers.clone(),
            },
            EventKind::MouseMove { x, y } => WireAction::MouseMove {
                timestamp,
                x: *x,
                y: *y,
            },
            EventKind::MouseClick {
                x,
                y,
                button,
                pressed,
            } => WireAction::MouseClick {
                timestamp,
                x: *x,
                y: *y,
                button: *button,
                pressed: *pressed,
            },
            EventKind::MouseScroll { x, y, dx, dy } => WireAction::MouseScroll {
                timestamp,
                x: *x,
                y: *y,
                dx: *dx,
                dy: *dy,
            },
        }
    }
}

impl From<WireAction> for Event {
    fn from(action: WireAction) -> Self {
        match action {
            WireAction::KeyPress {
                timestamp,
                key,
                modifiers,
            } => Event::key_press(timestamp, key, modifiers),
            WireAction::KeyRelease {
                timestamp,
                key,
                modifiers,
            } => Event::key_release(timestamp, key, modifiers),
            WireAction::MouseMove { timestamp, x, y } => Event::mouse_move(timestamp, x, y),
            WireAction::MouseClick {
                timestamp,
                x,
                y,
                button,
                pressed,
            } => Event::mouse_click(timestamp, x, y, button, pressed),
            WireAction::MouseScroll {
                timestamp,
                x,
                y,
                dx,
                dy,
            } => Event::mouse_scroll(timestamp, x, y, dx, dy),
        }
    }
}

fn malformed(reason: impl Into<String>) -> crate::Error {
    crate::Error::MalformedTimeline {
        reason: reason.into(),
    }
}

/// Accept RFC 3339 timestamps and naive `YYYY-MM-DDTHH:MM:SS[.f]` ones.
fn is_iso8601(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
}

/// Encode a timeline as pretty-printed JSON.
pub fn serialize(timeline: &Timeline) -> crate::Result<Vec<u8>> {
    let wire = WireTimeline {
        recording_info: WireInfo {
            start_time: timeline.start_time().to_string(),
            end_time: timeline.end_time().map(str::to_string),
            duration: timeline.duration(),
            total_actions: timeline.total_actions(),
        },
        actions: timeline.iter().map(WireAction::from).collect(),
    };
    Ok(serde_json::to_vec_pretty(&wire)?)
}

/// Decode a timeline, validating every invariant.
pub fn deserialize(bytes: &[u8]) -> crate::Result<Timeline> {
    let wire: WireTimeline = serde_json::from_slice(bytes).map_err(|e| malformed(e.to_string()))?;
    let info = wire.recording_info;

    if !is_iso8601(&info.start_time) {
        return Err(malformed(format!(
            "start_time '{}' is not an ISO-8601 timestamp",
            info.start_time
        )));
    }
    if let Some(end) = &info.end_time {
        if !is_iso8601(end) {
            return Err(malformed(format!("end_time '{end}' is not an ISO-8601 timestamp")));
        }
    }

    let mut timeline = Timeline::new(info.start_time);
    if let Some(end) = info.end_time {
        timeline.set_end_time(end);
    }

    for (index, action) in wire.actions.into_iter().enumerate() {
        let event = Event::from(action);
        if event.timestamp < 0.0 {
            return Err(malformed(format!(
                "action {index} has negative timestamp {}",
                event.timestamp
            )));
        }
        timeline.append(event).map_err(|e| match e {
            crate::Error::OutOfOrder { previous, attempted } => malformed(format!(
                "action {index} at {attempted}s precedes the previous action at {previous}s"
            )),
            other => other,
        })?;
    }

    if info.total_actions != timeline.total_actions() {
        warn!(
            stored = info.total_actions,
            actual = timeline.total_actions(),
            "total_actions does not match the actions array; using the actual count"
        );
    }
    if (info.duration - timeline.duration()).abs() > DURATION_EPSILON {
        warn!(
            stored = info.duration,
            actual = timeline.duration(),
            "duration does not match the last action timestamp; using the last timestamp"
        );
    }

    Ok(timeline)
}

fn file_error(path: &Path, source: std::io::Error) -> crate::Error {
    crate::Error::FileIo {
        path: path.to_path_buf(),
        source,
    }
}

fn temp_path(final_path: &Path) -> PathBuf {
    let mut name = final_path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

/// `recording_YYYYMMDD_HHMMSS.json` for the current local time.
pub fn default_file_name() -> String {
    chrono::Local::now()
        .format("recording_%Y%m%d_%H%M%S.json")
        .to_string()
}

impl Timeline {
    /// Save to `path`, writing a sibling `.tmp` file first and renaming it
    /// into place so a crash never leaves a truncated recording.
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let bytes = serialize(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| file_error(parent, e))?;
        }
        let tmp = temp_path(path);
        std::fs::write(&tmp, bytes).map_err(|e| file_error(&tmp, e))?;
        std::fs::rename(&tmp, path).map_err(|e| file_error(path, e))?;
        debug!(path = %path.display(), events = self.len(), "Saved timeline");
        Ok(())
    }

    /// Load and validate a timeline from `path`.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| file_error(path, e))?;
        let timeline = deserialize(&bytes).map_err(|e| match e {
            crate::Error::MalformedTimeline { reason } => crate::Error::MalformedTimeline {
                reason: format!("{}: {reason}", path.display()),
            },
            other => other,
        })?;
        debug!(path = %path.display(), events = timeline.len(), "Loaded timeline");
        Ok(timeline)
    }
}
