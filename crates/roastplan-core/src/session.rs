//! A meal session: the current plan plus the reminder state that goes
//! with it.
//!
//! ## Deadline changes
//!
//! The plan is held behind an `Arc` and replaced whole. A poll works on the
//! snapshot it cloned at the start, so it sees either the old plan or the
//! new one, never a mix. Moving the deadline also clears the notified set,
//! since every old event time is void.
//!
//! ```ignore
//! let mut session = MealSession::new(table, deadline, AlertWindow::default());
//! // In a loop:
//! for reminder in session.poll(clock.now()) {
//!     dispatcher.dispatch(&reminder);
//! }
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::alerts::{AlertWindow, NotificationScheduler, Reminder};
use crate::events::Event;
use crate::plan::Plan;
use crate::recipe::RecipeTable;

#[derive(Debug)]
pub struct MealSession {
    plan: Arc<Plan>,
    scheduler: NotificationScheduler,
    started: bool,
    served: bool,
    events: Vec<Event>,
}

impl MealSession {
    pub fn new(table: Arc<RecipeTable>, deadline: DateTime<Utc>, window: AlertWindow) -> Self {
        Self {
            plan: Arc::new(Plan::build(table, deadline)),
            scheduler: NotificationScheduler::new(window),
            started: false,
            served: false,
            events: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// The current plan snapshot.
    pub fn plan(&self) -> Arc<Plan> {
        Arc::clone(&self.plan)
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.plan.deadline()
    }

    pub fn alerts_enabled(&self) -> bool {
        self.scheduler.is_enabled()
    }

    pub fn scheduler(&self) -> &NotificationScheduler {
        &self.scheduler
    }

    /// Take every event recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Rebuild the plan for `deadline` and swap it in.
    pub fn set_deadline(&mut self, deadline: DateTime<Utc>, now: DateTime<Utc>) {
        let previous = self.plan.deadline();
        if previous == deadline {
            return;
        }
        let next = Arc::new(Plan::build(self.plan.shared_table(), deadline));
        self.plan = next;
        self.scheduler.reset();
        self.started = false;
        self.served = false;
        tracing::info!(%previous, %deadline, "deadline changed");
        self.events.push(Event::DeadlineChanged {
            previous,
            deadline,
            at: now,
        });
    }

    /// Switch alerts on or off. Switching on returns a confirmation
    /// reminder for the sinks.
    pub fn set_alerts_enabled(&mut self, enabled: bool, now: DateTime<Utc>) -> Option<Reminder> {
        if self.scheduler.is_enabled() == enabled {
            return None;
        }
        self.scheduler.set_enabled(enabled);
        self.events.push(Event::AlertsToggled { enabled, at: now });
        enabled.then(|| Reminder::alerts_enabled(now))
    }

    /// Check the current plan at `now` and return every reminder that fires.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Vec<Reminder> {
        let plan = self.plan();

        if !self.started && plan.has_started(now) {
            self.started = true;
            if let Some(first_event) = plan.first_event_at() {
                self.events.push(Event::PlanStarted {
                    first_event,
                    at: now,
                });
            }
        }
        if !self.served && now >= plan.deadline() {
            self.served = true;
            self.events.push(Event::Served {
                deadline: plan.deadline(),
                at: now,
            });
        }

        let fired = self.scheduler.poll(plan.checklist(), now);
        self.events.extend(fired.iter().map(|r| Event::ReminderFired {
            title: r.title.clone(),
            is_now: r.is_now,
            event_time: r.event_time,
            at: now,
        }));
        fired
    }
}
