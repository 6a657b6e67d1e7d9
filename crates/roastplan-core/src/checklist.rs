//! Flattened, time-ordered action list for the whole meal.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::recipe::RecipeTable;
use crate::schedule::{PreheatTier, Resolution};

pub const SERVE_TITLE: &str = "SERVE!";
const REST_DESCRIPTION: &str = "Wrap in foil + tea towels";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Prep,
    Cook,
    Rest,
    Preheat,
    Serve,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prep => "prep",
            Self::Cook => "cook",
            Self::Rest => "rest",
            Self::Preheat => "preheat",
            Self::Serve => "serve",
        }
    }
}

/// One action the cook has to take at `time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistEvent {
    pub time: DateTime<Utc>,
    pub kind: EventKind,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<String>,
}

impl ChecklistEvent {
    fn new(
        time: DateTime<Utc>,
        kind: EventKind,
        title: impl Into<String>,
        description: impl Into<String>,
        recipe_id: Option<&str>,
    ) -> Self {
        Self {
            time,
            kind,
            title: title.into(),
            description: description.into(),
            recipe_id: recipe_id.map(str::to_string),
        }
    }
}

/// Merge every resolved instant into one list sorted by time.
///
/// Contribution order is: each recipe in table order (prep, cook, rest),
/// preheat tiers (low, high), step-downs and reheats, then serve. The sort
/// is stable, so events sharing an instant keep that order.
pub fn flatten(table: &RecipeTable, resolution: &Resolution) -> Vec<ChecklistEvent> {
    let mut events = Vec::with_capacity(table.recipes.len() * 3 + 4);

    for recipe in &table.recipes {
        let Some(s) = resolution.get(&recipe.id) else {
            continue;
        };
        let id = Some(recipe.id.as_str());
        events.push(ChecklistEvent::new(
            s.prep_start,
            EventKind::Prep,
            format!("Prep: {}", recipe.name),
            recipe.first_instruction(),
            id,
        ));
        events.push(ChecklistEvent::new(
            s.cook_start,
            EventKind::Cook,
            format!(
                "Cook: {} → {}",
                recipe.name,
                table.equipment_name(&recipe.equipment)
            ),
            recipe.setting.as_str(),
            id,
        ));
        if recipe.rests() {
            events.push(ChecklistEvent::new(
                s.cook_end,
                EventKind::Rest,
                format!("Rest: {}", recipe.name),
                REST_DESCRIPTION,
                id,
            ));
        }
    }

    for (tier, at) in resolution.preheats.iter() {
        let copy = match tier {
            PreheatTier::Low => &table.tiers.low,
            PreheatTier::High => &table.tiers.high,
        };
        events.push(ChecklistEvent::new(
            at,
            EventKind::Preheat,
            copy.title.as_str(),
            copy.description.as_str(),
            None,
        ));
    }

    for recipe in &table.recipes {
        let id = Some(recipe.id.as_str());
        if let (Some(step), Some(s)) = (&recipe.step_down, resolution.get(&recipe.id)) {
            events.push(ChecklistEvent::new(
                s.cook_end,
                EventKind::Preheat,
                step.title.as_str(),
                step.description.as_str(),
                id,
            ));
        }
        if let Some(reheat) = &recipe.reheat {
            events.push(ChecklistEvent::new(
                resolution.deadline - Duration::minutes(i64::from(reheat.lead_minutes)),
                EventKind::Cook,
                reheat.title.as_str(),
                reheat.description.as_str(),
                id,
            ));
        }
    }

    events.push(ChecklistEvent::new(
        resolution.deadline,
        EventKind::Serve,
        SERVE_TITLE,
        table.serve_message.as_str(),
        None,
    ));

    events.sort_by_key(|e| e.time);
    events
}

/// The first event strictly after `now`.
pub fn next_event(events: &[ChecklistEvent], now: DateTime<Utc>) -> Option<&ChecklistEvent> {
    events.iter().find(|e| e.time > now)
}

/// Whole seconds from `now` until the next event.
pub fn seconds_until_next(events: &[ChecklistEvent], now: DateTime<Utc>) -> Option<i64> {
    next_event(events, now).map(|e| (e.time - now).num_seconds())
}

/// Minutes until the first event, rounded to nearest; negative once the
/// plan has begun.
pub fn minutes_until_start(events: &[ChecklistEvent], now: DateTime<Utc>) -> Option<i64> {
    events
        .first()
        .map(|e| ((e.time - now).num_seconds() + 30).div_euclid(60))
}

/// Whether the first event has been reached.
pub fn has_started(events: &[ChecklistEvent], now: DateTime<Utc>) -> bool {
    events.first().is_some_and(|e| now >= e.time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{Constraint, DeviceClass, Equipment, Recipe, Reheat, StepDown};
    use crate::schedule::resolve;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 12, 25, h, m, 0).unwrap()
    }

    fn table() -> RecipeTable {
        let mut t = RecipeTable::default();
        t.equipment = vec![
            Equipment::new("oven-top", "Oven Top", DeviceClass::Oven),
            Equipment::new("hob-1", "Ring 1", DeviceClass::Hob),
        ];
        t.recipes = vec![
            Recipe::new("beef", "Beef", "oven-top", 55)
                .with_prep(10)
                .with_rest(30)
                .with_setting("230°C")
                .with_constraint(Constraint::SyncWithMainMeats)
                .with_instructions(["Season the beef", "Into the oven"]),
            Recipe::new("yorkies", "Yorkshires", "oven-top", 25)
                .with_constraint(Constraint::SyncWithMainMeats)
                .with_step_down(StepDown {
                    title: "Reduce Oven to 180°C".into(),
                    description: "Yorkshires out".into(),
                })
                .with_reheat(Reheat {
                    equipment: "oven-top".into(),
                    lead_minutes: 10,
                    duration: 5,
                    setting: "200°C".into(),
                    title: "Rewarm Yorkshires".into(),
                    description: "5 mins at 200°C".into(),
                }),
            Recipe::new("peas", "Peas", "hob-1", 5).with_setting("Boil"),
        ];
        t
    }

    #[test]
    fn flatten_emits_every_kind_in_time_order() {
        let t = table();
        let events = flatten(&t, &resolve(&t, at(15, 0)));

        let got: Vec<_> = events
            .iter()
            .map(|e| (e.time, e.kind, e.title.as_str()))
            .collect();
        assert_eq!(
            got,
            vec![
                (at(13, 20), EventKind::Preheat, "Crank oven (high)"),
                (at(13, 25), EventKind::Prep, "Prep: Beef"),
                (at(13, 35), EventKind::Cook, "Cook: Beef → Oven Top"),
                (at(13, 35), EventKind::Prep, "Prep: Yorkshires"),
                (at(13, 35), EventKind::Cook, "Cook: Yorkshires → Oven Top"),
                (at(14, 0), EventKind::Preheat, "Reduce Oven to 180°C"),
                (at(14, 30), EventKind::Rest, "Rest: Beef"),
                (at(14, 50), EventKind::Cook, "Rewarm Yorkshires"),
                (at(14, 55), EventKind::Prep, "Prep: Peas"),
                (at(14, 55), EventKind::Cook, "Cook: Peas → Ring 1"),
                (at(15, 0), EventKind::Serve, SERVE_TITLE),
            ]
        );
        assert_eq!(events[1].description, "Season the beef");
        assert_eq!(events[2].description, "230°C");
        assert_eq!(events[6].description, REST_DESCRIPTION);
        assert_eq!(events[10].description, "Dinner is ready!");
        assert_eq!(events[10].recipe_id, None);
        assert_eq!(events[7].recipe_id.as_deref(), Some("yorkies"));
    }

    #[test]
    fn flatten_is_idempotent() {
        let t = table();
        let res = resolve(&t, at(15, 0));
        let a = serde_json::to_string(&flatten(&t, &res)).unwrap();
        let b = serde_json::to_string(&flatten(&t, &res)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_table_still_serves() {
        let t = RecipeTable::default();
        let events = flatten(&t, &resolve(&t, at(15, 0)));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Serve);
    }

    #[test]
    fn next_event_is_strictly_after_now() {
        let t = table();
        let events = flatten(&t, &resolve(&t, at(15, 0)));

        let next = next_event(&events, at(13, 35)).unwrap();
        assert_eq!(next.time, at(14, 0));
        assert_eq!(seconds_until_next(&events, at(13, 59)), Some(60));
        assert!(next_event(&events, at(15, 0)).is_none());

        assert_eq!(minutes_until_start(&events, at(13, 0)), Some(20));
        assert!(!has_started(&events, at(13, 19)));
        assert!(has_started(&events, at(13, 20)));
    }
}
