//! Timeline Data Structure
//!
//! An ordered sequence of events plus recording metadata. Events are only
//! ever appended, and every append is checked against the last timestamp so
//! the "sorted by timestamp" invariant holds no matter who the caller is.

use crate::capture::types::Event;
use chrono::{Local, SecondsFormat};
use std::collections::BTreeMap;
use std::fmt;

/// Current local time as an ISO-8601 string with millisecond precision.
pub fn iso_now() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Millis, false)
}

/// A complete recording of input events.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    start_time: String,
    end_time: Option<String>,
    events: Vec<Event>,
}

impl Timeline {
    /// Create an empty timeline that started at `start_time` (ISO-8601).
    pub fn new(start_time: impl Into<String>) -> Self {
        Self {
            start_time: start_time.into(),
            end_time: None,
            events: Vec::new(),
        }
    }

    /// Create an empty timeline stamped with the current local time.
    pub fn starting_now() -> Self {
        Self::new(iso_now())
    }

    /// Build a timeline from already ordered events.
    pub fn from_events(
        start_time: impl Into<String>,
        events: impl IntoIterator<Item = Event>,
    ) -> crate::Result<Self> {
        let mut timeline = Self::new(start_time);
        for event in events {
            timeline.append(event)?;
        }
        Ok(timeline)
    }

    /// Append an event.
    ///
    /// Fails with [`crate::Error::OutOfOrder`] if the timestamp is earlier than
    /// the last appended one (or negative / not finite for the first event).
    pub fn append(&mut self, event: Event) -> crate::Result<()> {
        let previous = self.duration();
        if !event.timestamp.is_finite() || event.timestamp < previous {
            return Err(crate::Error::OutOfOrder {
                previous,
                attempted: event.timestamp,
            });
        }
        self.events.push(event);
        Ok(())
    }

    /// Record when capture ended.
    pub fn set_end_time(&mut self, end_time: impl Into<String>) {
        self.end_time = Some(end_time.into());
    }

    pub fn start_time(&self) -> &str {
        &self.start_time
    }

    pub fn end_time(&self) -> Option<&str> {
        self.end_time.as_deref()
    }

    /// Timestamp of the last event, or 0 for an empty timeline.
    pub fn duration(&self) -> f64 {
        self.events.last().map(|e| e.timestamp).unwrap_or(0.0)
    }

    pub fn total_actions(&self) -> usize {
        self.events.len()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    /// Metadata and per-type breakdown.
    pub fn summary(&self) -> TimelineSummary {
        let mut counts = BTreeMap::new();
        for event in &self.events {
            *counts.entry(event.type_tag()).or_insert(0) += 1;
        }
        TimelineSummary {
            start_time: self.start_time.clone(),
            end_time: self.end_time.clone(),
            duration: self.duration(),
            total_actions: self.total_actions(),
            counts,
        }
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Human-oriented description of a timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineSummary {
    pub start_time: String,
    pub end_time: Option<String>,
    pub duration: f64,
    pub total_actions: usize,
    /// Event count per persisted type tag
    pub counts: BTreeMap<&'static str, usize>,
}

impl fmt::Display for TimelineSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Start time:    {}", self.start_time)?;
        writeln!(f, "End time:      {}", self.end_time.as_deref().unwrap_or("unknown"))?;
        writeln!(f, "Duration:      {:.3}s", self.duration)?;
        writeln!(f, "Total actions: {}", self.total_actions)?;
        if !self.counts.is_empty() {
            writeln!(f, "Action breakdown:")?;
            for (tag, count) in &self.counts {
                writeln!(f, "  {tag}: {count}")?;
            }
        }
        Ok(())
    }
}
