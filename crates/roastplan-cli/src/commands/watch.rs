//! Live reminder loop.

use std::path::Path;

use chrono::{DateTime, Utc};
use roastplan_core::format::{format_clock, format_countdown};
use roastplan_core::{
    Clock, Config, Dispatcher, Event, LiveClock, MealSession, Reminder, SystemClock,
};

use super::common::{dispatcher, load_table, Announcer};

pub fn run(
    config: Config,
    serve_at: Option<String>,
    once: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = start(&config, serve_at.as_deref(), SystemClock.now())?;

    if once {
        // one pass; the push relay is awaited before returning
        let announcer = Announcer::from_config(&config)?;
        print_banner(&session, announcer.sink_count());
        tick(&mut session, SystemClock.now(), &mut None, |r| announcer.announce(r));
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(watch(config, serve_at, session));
    Ok(())
}

fn start(
    config: &Config,
    serve_at: Option<&str>,
    now: DateTime<Utc>,
) -> Result<MealSession, Box<dyn std::error::Error>> {
    let table = load_table(config)?;
    let mut session = MealSession::new(table, config.deadline(serve_at)?, config.alert_window());
    if !config.alerts.enabled {
        session.set_alerts_enabled(false, now);
        println!("alerts are off; run `roastplan-cli alerts enable` to hear them");
    }
    Ok(session)
}

fn print_banner(session: &MealSession, sinks: usize) {
    println!(
        "watching {} for {} ({} sinks)",
        session.plan().table().title,
        format_clock(session.deadline()),
        sinks
    );
}

async fn watch(mut config: Config, serve_at: Option<String>, mut session: MealSession) {
    let mut sinks = dispatcher(&config);
    let mut clock = LiveClock::new(SystemClock, config.cadence());
    clock.observe();
    print_banner(&session, sinks.sink_names().len());

    let mut last_next: Option<DateTime<Utc>> = None;
    loop {
        let now = clock.now();
        tick(&mut session, now, &mut last_next, |r| {
            sinks.dispatch(r);
        });

        if now > session.deadline() + session.scheduler().window().grace {
            break;
        }

        let interval = clock.tick_interval(session.plan().first_event_at());
        tokio::time::sleep(interval.min(config.poll_interval())).await;

        if let Some(next_config) = reload(&config) {
            follow_config(
                &mut session,
                &mut sinks,
                &mut clock,
                &next_config,
                serve_at.as_deref(),
            );
            config = next_config;
        }
    }
}

/// Fire due reminders, report session events, and print the next event
/// when it changes.
fn tick(
    session: &mut MealSession,
    now: DateTime<Utc>,
    last_next: &mut Option<DateTime<Utc>>,
    deliver: impl Fn(&Reminder),
) {
    for reminder in session.poll(now) {
        println!("{}  {}", format_clock(now), reminder.headline());
        deliver(&reminder);
    }
    for event in session.drain_events() {
        report(&event);
    }

    let plan = session.plan();
    let next = plan.next_event(now);
    if next.map(|e| e.time) != *last_next {
        *last_next = next.map(|e| e.time);
        if let Some(event) = next {
            println!(
                "next: {} in {}",
                event.title,
                format_countdown((event.time - now).num_seconds())
            );
        }
    }
}

/// Re-read config from disk; `None` when unchanged, unreadable or invalid.
fn reload(current: &Config) -> Option<Config> {
    match Config::path() {
        Ok(path) => reload_from(&path, current),
        Err(e) => {
            tracing::warn!(error = %e, "config reload failed");
            None
        }
    }
}

fn reload_from(path: &Path, current: &Config) -> Option<Config> {
    let next = Config::load_from(path).and_then(|next| next.validate().map(|()| next));
    match next {
        Ok(next) if next.entries() != current.entries() => Some(next),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, "config reload rejected, keeping current settings");
            None
        }
    }
}

/// Apply a changed config to a running session.
fn follow_config(
    session: &mut MealSession,
    sinks: &mut Dispatcher,
    clock: &mut LiveClock<SystemClock>,
    config: &Config,
    serve_at: Option<&str>,
) {
    let now = clock.now();
    if serve_at.is_none() {
        match config.deadline(None) {
            Ok(deadline) => session.set_deadline(deadline, now),
            Err(e) => tracing::warn!(error = %e, "keeping current serve time"),
        }
    }
    *sinks = dispatcher(config);
    *clock = LiveClock::new(SystemClock, config.cadence());
    if let Some(confirmation) = session.set_alerts_enabled(config.alerts.enabled, now) {
        sinks.dispatch(&confirmation);
    }
    for event in session.drain_events() {
        report(&event);
    }
}

fn report(event: &Event) {
    tracing::debug!(?event, "session event");
    match event {
        Event::DeadlineChanged { deadline, .. } => {
            println!("serve time moved to {}", format_clock(*deadline));
        }
        Event::AlertsToggled { enabled, .. } => {
            println!("alerts {}", if *enabled { "on" } else { "off" });
        }
        Event::PlanStarted { .. } => println!("cooking has started"),
        Event::Served { .. } => println!("time to serve"),
        Event::ReminderFired { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Duration;
    use roastplan_core::RecipeTable;

    fn quiet_config() -> Config {
        let mut config = Config::default();
        config.desktop.enabled = false;
        config.alarm.enabled = false;
        config
    }

    #[test]
    fn reload_skips_invalid_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let current = quiet_config();
        current.save_to(&path).unwrap();
        assert!(reload_from(&path, &current).is_none());

        std::fs::write(&path, "[event]\nserve_at = \"3pm\"\n").unwrap();
        assert!(reload_from(&path, &current).is_none());

        std::fs::write(&path, "[event]\nserve_at = \"18:30\"\n").unwrap();
        let next = reload_from(&path, &current).unwrap();
        assert_eq!(next.event.serve_at, "18:30");
    }

    #[test]
    fn unusable_serve_time_keeps_running_deadline() {
        let mut config = quiet_config();
        config.event.serve_at = "3pm".into();
        let deadline = Utc::now() + Duration::hours(3);
        let mut session = MealSession::new(
            Arc::new(RecipeTable::builtin()),
            deadline,
            config.alert_window(),
        );
        let mut sinks = Dispatcher::new();
        let mut clock = LiveClock::new(SystemClock, config.cadence());

        follow_config(&mut session, &mut sinks, &mut clock, &config, None);
        assert_eq!(session.deadline(), deadline);
    }
}
