use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every state change in a meal session produces an Event.
/// The CLI prints them; sinks never see them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A new deadline was set and the plan rebuilt.
    DeadlineChanged {
        previous: DateTime<Utc>,
        deadline: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    AlertsToggled {
        enabled: bool,
        at: DateTime<Utc>,
    },
    /// A checklist event entered the alert window.
    ReminderFired {
        title: String,
        is_now: bool,
        event_time: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    /// The first checklist event has been reached.
    PlanStarted {
        first_event: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    /// The serve time has passed.
    Served {
        deadline: DateTime<Utc>,
        at: DateTime<Utc>,
    },
}
