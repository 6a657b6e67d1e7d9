//! At-most-once reminders polled against the checklist.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::checklist::{ChecklistEvent, EventKind};

const MAX_WINDOW_SECS: u64 = 24 * 60 * 60;

/// How far ahead and behind an event a poll will still fire it.
///
/// An event fires when `-grace < event.time - now <= lead`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertWindow {
    pub lead: Duration,
    pub grace: Duration,
}

impl Default for AlertWindow {
    fn default() -> Self {
        Self {
            lead: Duration::seconds(120),
            grace: Duration::seconds(60),
        }
    }
}

impl AlertWindow {
    pub fn from_secs(lead: u64, grace: u64) -> Self {
        let secs = |s: u64| Duration::seconds(s.min(MAX_WINDOW_SECS) as i64);
        Self {
            lead: secs(lead),
            grace: secs(grace),
        }
    }

    pub fn contains(&self, delta: Duration) -> bool {
        delta > -self.grace && delta <= self.lead
    }
}

/// Keys of events already alerted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifiedSet(HashSet<String>);

impl NotifiedSet {
    pub fn key(event: &ChecklistEvent) -> String {
        format!("{}-{}", event.time.timestamp_millis(), event.title)
    }

    pub fn contains(&self, event: &ChecklistEvent) -> bool {
        self.0.contains(&Self::key(event))
    }

    /// Returns false if the event was already present.
    pub fn insert(&mut self, event: &ChecklistEvent) -> bool {
        self.0.insert(Self::key(event))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// A fired reminder, as handed to delivery sinks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub title: String,
    pub description: String,
    pub is_now: bool,
    pub event_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EventKind>,
}

impl Reminder {
    pub fn for_event(event: &ChecklistEvent, is_now: bool) -> Self {
        Self {
            title: event.title.clone(),
            description: event.description.clone(),
            is_now,
            event_time: event.time,
            kind: Some(event.kind),
        }
    }

    /// Sent once when alerts are switched on.
    pub fn alerts_enabled(now: DateTime<Utc>) -> Self {
        Self {
            title: "Alerts Enabled!".into(),
            description: "You'll be notified when each cooking step is due.".into(),
            is_now: false,
            event_time: now,
            kind: None,
        }
    }

    pub fn headline(&self) -> String {
        if self.is_now {
            format!("NOW: {}", self.title)
        } else {
            format!("Coming up: {}", self.title)
        }
    }

    pub fn priority(&self) -> &'static str {
        if self.is_now {
            "urgent"
        } else {
            "high"
        }
    }
}

/// Polls the checklist and fires each event at most once.
///
/// Disabling suppresses firing but keeps the notified set, so re-enabling
/// only considers events that are still pending.
#[derive(Debug, Clone)]
pub struct NotificationScheduler {
    window: AlertWindow,
    notified: NotifiedSet,
    enabled: bool,
}

impl Default for NotificationScheduler {
    fn default() -> Self {
        Self::new(AlertWindow::default())
    }
}

impl NotificationScheduler {
    pub fn new(window: AlertWindow) -> Self {
        Self {
            window,
            notified: NotifiedSet::default(),
            enabled: true,
        }
    }

    pub fn window(&self) -> AlertWindow {
        self.window
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn notified(&self) -> &NotifiedSet {
        &self.notified
    }

    pub fn is_alerted(&self, event: &ChecklistEvent) -> bool {
        self.notified.contains(event)
    }

    /// Forget every alerted event. Only used when the deadline moves.
    pub fn reset(&mut self) {
        self.notified.clear();
    }

    /// Fire every pending event inside the window at `now`.
    pub fn poll(&mut self, events: &[ChecklistEvent], now: DateTime<Utc>) -> Vec<Reminder> {
        if !self.enabled {
            return Vec::new();
        }
        let mut fired = Vec::new();
        for event in events {
            let delta = event.time - now;
            if !self.window.contains(delta) || self.notified.contains(event) {
                continue;
            }
            self.notified.insert(event);
            let is_now = delta <= Duration::zero();
            tracing::info!(title = %event.title, is_now, "reminder due");
            fired.push(Reminder::for_event(event, is_now));
        }
        fired
    }
}
