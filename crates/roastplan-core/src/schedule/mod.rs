//! Absolute timings for every recipe, resolved against one deadline.
//!
//! - [`resolve`] turns a [`RecipeTable`](crate::recipe::RecipeTable) and a
//!   deadline into a [`Resolution`]: one [`ResolvedSchedule`] per recipe plus
//!   the earliest preheat instant per oven tier.
//! - [`steps`] annotates individual instruction lines with a time. It is a
//!   display aid and never feeds back into resolution.

mod resolver;
pub mod steps;

pub use resolver::{resolve, COOK_FIRST_BUFFER_MIN, PREHEAT_LEAD_MIN};
pub use steps::{annotate_steps, classify_step, AnnotatedStep, StepClass, REMOVE_STEP_MIN_INDEX};

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::recipe::Recipe;

/// Resolved timestamps for one recipe.
///
/// `prep_start <= cook_start <= cook_end <= rest_end`, and the gaps equal
/// the recipe's prep, cook and rest minutes exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSchedule {
    pub prep_start: DateTime<Utc>,
    pub cook_start: DateTime<Utc>,
    pub cook_end: DateTime<Utc>,
    pub rest_end: Option<DateTime<Utc>>,
}

impl ResolvedSchedule {
    /// Work backwards from the instant the recipe leaves the heat.
    pub fn ending_at(recipe: &Recipe, cook_end: DateTime<Utc>) -> Self {
        Self::starting_at(recipe, cook_end - recipe.cook_duration())
    }

    /// Work outwards from the instant the recipe goes on the heat.
    pub fn starting_at(recipe: &Recipe, cook_start: DateTime<Utc>) -> Self {
        let cook_end = cook_start + recipe.cook_duration();
        Self {
            prep_start: cook_start - recipe.prep_duration(),
            cook_start,
            cook_end,
            rest_end: recipe.rests().then(|| cook_end + recipe.rest_duration()),
        }
    }

    /// Last instant this recipe needs attention.
    pub fn finished_at(&self) -> DateTime<Utc> {
        self.rest_end.unwrap_or(self.cook_end)
    }
}

/// Oven dial settings that get a single preheat prompt each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreheatTier {
    /// Slow roast that runs before the main cohort.
    Low,
    /// The main cohort going in together.
    High,
}

impl PreheatTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::High => "high",
        }
    }
}

/// Earliest required preheat instant per tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preheats(BTreeMap<PreheatTier, DateTime<Utc>>);

impl Preheats {
    /// Keep `at` if it is earlier than what the tier already holds.
    pub fn record(&mut self, tier: PreheatTier, at: DateTime<Utc>) {
        self.0
            .entry(tier)
            .and_modify(|existing| {
                if at < *existing {
                    *existing = at;
                }
            })
            .or_insert(at);
    }

    pub fn get(&self, tier: PreheatTier) -> Option<DateTime<Utc>> {
        self.0.get(&tier).copied()
    }

    /// Tiers in dial order (low before high).
    pub fn iter(&self) -> impl Iterator<Item = (PreheatTier, DateTime<Utc>)> + '_ {
        self.0.iter().map(|(tier, at)| (*tier, *at))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Output of one resolver run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub deadline: DateTime<Utc>,
    /// Keyed by recipe id, in table order.
    pub schedules: IndexMap<String, ResolvedSchedule>,
    pub preheats: Preheats,
}

impl Resolution {
    pub fn get(&self, recipe_id: &str) -> Option<&ResolvedSchedule> {
        self.schedules.get(recipe_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 12, 25, h, m, 0).unwrap()
    }

    #[test]
    fn ending_at_works_backwards() {
        let r = Recipe::new("beef", "Beef", "oven-top", 55)
            .with_prep(30)
            .with_rest(30);
        let s = ResolvedSchedule::ending_at(&r, at(14, 30));
        assert_eq!(s.cook_start, at(13, 35));
        assert_eq!(s.prep_start, at(13, 5));
        assert_eq!(s.rest_end, Some(at(15, 0)));
        assert_eq!(s.finished_at(), at(15, 0));
    }

    #[test]
    fn no_rest_means_no_rest_end() {
        let r = Recipe::new("peas", "Peas", "hob-1", 4);
        let s = ResolvedSchedule::starting_at(&r, at(14, 56));
        assert_eq!(s.cook_end, at(15, 0));
        assert_eq!(s.rest_end, None);
        assert_eq!(s.prep_start, s.cook_start);
    }

    #[test]
    fn preheats_keep_earliest() {
        let mut p = Preheats::default();
        p.record(PreheatTier::High, at(13, 30));
        p.record(PreheatTier::High, at(13, 20));
        p.record(PreheatTier::High, at(13, 40));
        p.record(PreheatTier::Low, at(10, 0));
        assert_eq!(p.get(PreheatTier::High), Some(at(13, 20)));
        let tiers: Vec<_> = p.iter().map(|(t, _)| t).collect();
        assert_eq!(tiers, vec![PreheatTier::Low, PreheatTier::High]);
    }
}
