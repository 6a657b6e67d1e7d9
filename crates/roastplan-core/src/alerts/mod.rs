//! Reminders: deciding what fires when, and handing it to delivery sinks.

mod delivery;
mod dry_run;
mod scheduler;

pub use delivery::{
    Dispatcher, DesktopNotifier, PushRelay, ReminderSink, TerminalAlarm, DEFAULT_PUSH_SERVER,
    DEFAULT_PUSH_TOPIC,
};
pub use dry_run::{dry_run, DryRunStep};
pub use scheduler::{AlertWindow, NotificationScheduler, NotifiedSet, Reminder};
