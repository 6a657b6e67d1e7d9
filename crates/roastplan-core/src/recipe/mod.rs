//! Recipe and equipment records.
//!
//! A recipe is immutable input: timing fields in whole minutes, the device it
//! occupies, and one constraint tag that decides how the resolver anchors it
//! against the deadline.

mod table;

pub use table::{RecipeTable, TableIssue, TierCopy, TierCopySet, REST_BUCKET};

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Device class of a piece of equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    /// Shares one dial between shelves; drives preheat tiers.
    Oven,
    /// Stovetop ring; cooks right up to the deadline.
    Hob,
    #[default]
    Other,
}

/// Equipment metadata. Presentation fields are carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub class: DeviceClass,
}

impl Equipment {
    pub fn new(id: impl Into<String>, name: impl Into<String>, class: DeviceClass) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: String::new(),
            class,
        }
    }
}

/// How a recipe is anchored against the deadline.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constraint {
    /// Finishes `rest_time` before the deadline (hob: at the deadline).
    #[default]
    Independent,
    /// Finishes at the same instant as `target`.
    SyncWith { target: String },
    /// Starts together with the cohort anchor.
    SyncWithMainMeats,
    /// Must be out of the way before the main cooking starts.
    CookFirst {
        #[serde(default)]
        needs_lower_temp: bool,
    },
}

/// Oven temperature change announced when a recipe comes out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDown {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// A short warm-up slot shortly before serving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reheat {
    pub equipment: String,
    /// Minutes before the deadline the slot begins.
    pub lead_minutes: u32,
    /// Length of the slot in minutes.
    pub duration: u32,
    #[serde(default)]
    pub setting: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// One dish in the recipe table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subtitle: String,
    /// Minutes on the equipment.
    pub cook_time: u32,
    /// Minutes of hands-on preparation before cooking.
    #[serde(default)]
    pub prep_time: u32,
    /// Minutes resting off-heat after cooking; zero means no rest phase.
    #[serde(default)]
    pub rest_time: u32,
    /// Minutes to finish ahead of the rest window so the equipment frees up.
    #[serde(default)]
    pub finish_early_by: u32,
    pub equipment: String,
    /// Equipment setting shown with the cook event.
    #[serde(default)]
    pub setting: String,
    #[serde(default)]
    pub constraint: Constraint,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub step_down: Option<StepDown>,
    #[serde(default)]
    pub reheat: Option<Reheat>,
}

impl Recipe {
    /// Create an independent recipe with no prep, rest or instructions.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        equipment: impl Into<String>,
        cook_time: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            subtitle: String::new(),
            cook_time,
            prep_time: 0,
            rest_time: 0,
            finish_early_by: 0,
            equipment: equipment.into(),
            setting: String::new(),
            constraint: Constraint::Independent,
            instructions: Vec::new(),
            step_down: None,
            reheat: None,
        }
    }

    pub fn with_prep(mut self, minutes: u32) -> Self {
        self.prep_time = minutes;
        self
    }

    pub fn with_rest(mut self, minutes: u32) -> Self {
        self.rest_time = minutes;
        self
    }

    pub fn with_finish_early_by(mut self, minutes: u32) -> Self {
        self.finish_early_by = minutes;
        self
    }

    pub fn with_setting(mut self, setting: impl Into<String>) -> Self {
        self.setting = setting.into();
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = constraint;
        self
    }

    pub fn with_instructions<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instructions = lines.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_step_down(mut self, step_down: StepDown) -> Self {
        self.step_down = Some(step_down);
        self
    }

    pub fn with_reheat(mut self, reheat: Reheat) -> Self {
        self.reheat = Some(reheat);
        self
    }

    pub fn cook_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.cook_time))
    }

    pub fn prep_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.prep_time))
    }

    pub fn rest_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.rest_time))
    }

    pub fn finish_early_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.finish_early_by))
    }

    pub fn rests(&self) -> bool {
        self.rest_time > 0
    }

    /// Prep + cook + rest, the span this recipe needs before the deadline.
    pub fn total_minutes(&self) -> u32 {
        self.prep_time + self.cook_time + self.rest_time
    }

    pub fn is_cook_first(&self) -> bool {
        matches!(self.constraint, Constraint::CookFirst { .. })
    }

    pub fn needs_lower_temp(&self) -> bool {
        matches!(
            self.constraint,
            Constraint::CookFirst {
                needs_lower_temp: true
            }
        )
    }

    pub fn in_cohort(&self) -> bool {
        self.constraint == Constraint::SyncWithMainMeats
    }

    pub fn sync_target(&self) -> Option<&str> {
        match &self.constraint {
            Constraint::SyncWith { target } => Some(target),
            _ => None,
        }
    }

    /// First instruction line, used as the prep event description.
    pub fn first_instruction(&self) -> &str {
        self.instructions.first().map(String::as_str).unwrap_or("")
    }
}
