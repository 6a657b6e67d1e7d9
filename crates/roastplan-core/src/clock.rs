//! Time sources and the live clock's tick cadence.
//!
//! The clock never affects resolved times. It only decides how often views
//! are refreshed: every second once the plan is under way (or while someone
//! is watching closely), once a minute otherwise.

use std::sync::Mutex;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Source of "now".
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Used by tests and dry runs.
#[derive(Debug)]
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(Mutex::new(at))
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Fine,
    Coarse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CadenceSettings {
    pub fine: StdDuration,
    pub coarse: StdDuration,
    /// How long observation mode keeps the fine cadence.
    pub observe: StdDuration,
}

impl Default for CadenceSettings {
    fn default() -> Self {
        Self {
            fine: StdDuration::from_secs(1),
            coarse: StdDuration::from_secs(60),
            observe: StdDuration::from_secs(5 * 60),
        }
    }
}

/// A clock plus the cadence rule.
#[derive(Debug)]
pub struct LiveClock<C: Clock = SystemClock> {
    clock: C,
    settings: CadenceSettings,
    observe_until: Option<DateTime<Utc>>,
}

impl<C: Clock> LiveClock<C> {
    pub fn new(clock: C, settings: CadenceSettings) -> Self {
        Self {
            clock,
            settings,
            observe_until: None,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Enter observation mode for the configured duration.
    pub fn observe(&mut self) {
        let span = Duration::from_std(self.settings.observe).unwrap_or_else(|_| Duration::minutes(5));
        self.observe_until = Some(self.now() + span);
    }

    pub fn stop_observing(&mut self) {
        self.observe_until = None;
    }

    pub fn is_observing(&self) -> bool {
        self.observe_until.is_some_and(|until| self.now() < until)
    }

    /// Fine once `first_event` has been reached or while observing.
    pub fn cadence(&self, first_event: Option<DateTime<Utc>>) -> Cadence {
        let started = first_event.is_some_and(|t| self.now() >= t);
        if started || self.is_observing() {
            Cadence::Fine
        } else {
            Cadence::Coarse
        }
    }

    pub fn interval(&self, cadence: Cadence) -> StdDuration {
        match cadence {
            Cadence::Fine => self.settings.fine,
            Cadence::Coarse => self.settings.coarse,
        }
    }

    pub fn tick_interval(&self, first_event: Option<DateTime<Utc>>) -> StdDuration {
        self.interval(self.cadence(first_event))
    }
}

impl Default for LiveClock<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock, CadenceSettings::default())
    }
}

/// Parse a serve time written as `HH:MM`.
pub fn parse_serve_time(value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|e| ConfigError::InvalidValue {
        key: "event.serve_at".into(),
        message: format!("'{value}' is not HH:MM ({e})"),
    })
}

/// The instant `time` falls on `date` in `tz`.
///
/// Ambiguous local times take the earlier instant; times skipped by a
/// DST jump give `None`.
pub fn deadline_at<Tz: TimeZone>(tz: &Tz, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// `time` today in the local time zone.
pub fn deadline_today(time: NaiveTime) -> Option<DateTime<Utc>> {
    let today = chrono::Local::now().date_naive();
    deadline_at(&chrono::Local, today, time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 12, 25, h, m, 0).unwrap()
    }

    #[test]
    fn manual_clock_moves_on_request() {
        let clock = ManualClock::new(at(12, 0));
        clock.advance(Duration::minutes(5));
        assert_eq!(clock.now(), at(12, 5));
        clock.set(at(9, 0));
        assert_eq!(clock.now(), at(9, 0));
    }

    #[test]
    fn cadence_turns_fine_once_started() {
        let live = LiveClock::new(ManualClock::new(at(11, 0)), CadenceSettings::default());
        assert_eq!(live.cadence(Some(at(11, 3))), Cadence::Coarse);
        assert_eq!(live.tick_interval(Some(at(11, 3))), StdDuration::from_secs(60));
        assert_eq!(live.cadence(None), Cadence::Coarse);

        live.clock().set(at(11, 3));
        assert_eq!(live.cadence(Some(at(11, 3))), Cadence::Fine);
        assert_eq!(live.tick_interval(Some(at(11, 3))), StdDuration::from_secs(1));
    }

    #[test]
    fn observation_is_short_lived() {
        let mut live = LiveClock::new(ManualClock::new(at(10, 0)), CadenceSettings::default());
        live.observe();
        assert_eq!(live.cadence(Some(at(11, 0))), Cadence::Fine);

        live.clock().advance(Duration::minutes(5));
        assert!(!live.is_observing());
        assert_eq!(live.cadence(Some(at(11, 0))), Cadence::Coarse);

        live.observe();
        live.stop_observing();
        assert!(!live.is_observing());
    }

    #[test]
    fn serve_time_parsing() {
        assert_eq!(
            parse_serve_time("15:00").unwrap(),
            NaiveTime::from_hms_opt(15, 0, 0).unwrap()
        );
        assert_eq!(
            parse_serve_time(" 09:30 ").unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
        assert!(matches!(
            parse_serve_time("3pm"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn deadline_converts_from_local_offset() {
        let tz = FixedOffset::east_opt(3600).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 12, 25).unwrap();
        let got = deadline_at(&tz, date, NaiveTime::from_hms_opt(15, 0, 0).unwrap());
        assert_eq!(got, Some(at(14, 0)));
    }
}
