//! Instruction-line timing by keyword matching.
//!
//! Each line lands in one bucket: resting and late "remove/take out" lines
//! happen when cooking ends, lines mentioning the device, a temperature or a
//! cooking verb happen when cooking starts, and everything else is prep,
//! spread evenly over the prep window in line order.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::ResolvedSchedule;
use crate::recipe::Recipe;

/// A "remove"/"take out" line only means the end of cooking from this
/// line index on; earlier ones are about unpacking ingredients.
/// Tunable heuristic, not a contract.
pub const REMOVE_STEP_MIN_INDEX: usize = 3;

const REST_KEYWORDS: &[&str] = &["rest", "transfer to board", "wrap", "resting"];
const REMOVE_KEYWORDS: &[&str] = &["remove", "take out"];
const COOK_KEYWORDS: &[&str] = &[
    "oven",
    "pressure",
    "tendercrisp",
    "air crisp",
    "°c",
    "ring ",
    "boil",
    "simmer",
    "drawer",
];

/// Which bucket an instruction line falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepClass {
    /// Resting or a late "remove" line: at cook end.
    CookEnd,
    /// Mentions the device, a temperature or a cooking verb: at cook start.
    CookStart,
    /// Hands-on preparation.
    Prep,
}

/// Classify one instruction line.
///
/// `device_name` is the display name of the recipe's equipment; mentioning
/// it counts as a cooking line.
pub fn classify_step(line: &str, index: usize, device_name: &str) -> StepClass {
    let lower = line.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if has(REST_KEYWORDS) {
        return StepClass::CookEnd;
    }
    if index >= REMOVE_STEP_MIN_INDEX && has(REMOVE_KEYWORDS) {
        return StepClass::CookEnd;
    }
    let device = device_name.trim().to_lowercase();
    if has(COOK_KEYWORDS) || (!device.is_empty() && lower.contains(&device)) {
        return StepClass::CookStart;
    }
    StepClass::Prep
}

/// An instruction line with its classified time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedStep {
    pub index: usize,
    pub text: String,
    pub class: StepClass,
    pub at: DateTime<Utc>,
}

/// Annotate every instruction of `recipe` with a time from `schedule`.
pub fn annotate_steps(
    recipe: &Recipe,
    device_name: &str,
    schedule: &ResolvedSchedule,
) -> Vec<AnnotatedStep> {
    let classes: Vec<StepClass> = recipe
        .instructions
        .iter()
        .enumerate()
        .map(|(i, line)| classify_step(line, i, device_name))
        .collect();
    let prep_total = classes.iter().filter(|c| **c == StepClass::Prep).count() as i64;
    let prep_secs = recipe.prep_duration().num_seconds();

    let mut prep_seen = 0i64;
    recipe
        .instructions
        .iter()
        .zip(classes)
        .enumerate()
        .map(|(index, (text, class))| {
            let at = match class {
                StepClass::CookEnd => schedule.cook_end,
                StepClass::CookStart => schedule.cook_start,
                StepClass::Prep => {
                    let offset = Duration::seconds(prep_seen * prep_secs / prep_total);
                    prep_seen += 1;
                    schedule.prep_start + offset
                }
            };
            AnnotatedStep {
                index,
                text: text.clone(),
                class,
                at,
            }
        })
        .collect()
}
