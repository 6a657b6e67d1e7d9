//! Replay the checklist against a simulated clock.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::scheduler::{AlertWindow, NotificationScheduler, Reminder};
use crate::checklist::ChecklistEvent;

/// Reminders fired by one simulated poll.
#[derive(Debug, Clone, Serialize)]
pub struct DryRunStep {
    pub at: DateTime<Utc>,
    pub reminders: Vec<Reminder>,
}

/// Poll a fresh scheduler once at each distinct event time, in order.
///
/// `on_fire` sees every reminder as it fires, so a caller can hand it to
/// the real sinks. The live scheduler's state is never touched.
pub fn dry_run<F>(events: &[ChecklistEvent], window: AlertWindow, mut on_fire: F) -> Vec<DryRunStep>
where
    F: FnMut(&Reminder),
{
    let mut scheduler = NotificationScheduler::new(window);
    let mut steps: Vec<DryRunStep> = Vec::new();

    for event in events {
        if steps.last().is_some_and(|s| s.at == event.time) {
            continue;
        }
        let reminders = scheduler.poll(events, event.time);
        reminders.iter().for_each(&mut on_fire);
        steps.push(DryRunStep {
            at: event.time,
            reminders,
        });
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checklist::EventKind;
    use chrono::{Duration, TimeZone};

    fn ev(min: i64, title: &str) -> ChecklistEvent {
        ChecklistEvent {
            time: Utc.with_ymd_and_hms(2026, 12, 25, 14, 0, 0).unwrap() + Duration::minutes(min),
            kind: EventKind::Prep,
            title: title.into(),
            description: String::new(),
            recipe_id: None,
        }
    }

    #[test]
    fn every_event_fires_exactly_once() {
        let events = vec![ev(0, "a"), ev(0, "b"), ev(1, "c"), ev(10, "d")];
        let mut seen = Vec::new();
        let steps = dry_run(&events, AlertWindow::default(), |r| seen.push(r.title.clone()));

        assert_eq!(steps.len(), 3);
        assert_eq!(seen, vec!["a", "b", "c", "d"]);
        // c is within the lead window of the first poll
        assert!(!steps[0].reminders[2].is_now);
        assert!(steps[1].reminders.is_empty());
        assert!(steps[2].reminders[0].is_now);
    }
}
