//! A complete, immutable plan for one deadline.
//!
//! Everything the views and the scheduler read is computed once here. A new
//! deadline means a new `Plan`; nothing inside one is ever updated.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::checklist::{self, ChecklistEvent};
use crate::error::Result;
use crate::recipe::RecipeTable;
use crate::schedule::{annotate_steps, resolve, AnnotatedStep, Resolution, ResolvedSchedule};
use crate::storage::Config;
use crate::timeline::{ActiveBlock, DeviceLane, Occupancy, TimelineBounds};

#[derive(Debug, Clone)]
pub struct Plan {
    table: Arc<RecipeTable>,
    resolution: Resolution,
    occupancy: Occupancy,
    checklist: Vec<ChecklistEvent>,
}

/// One recipe with its times and annotated instructions.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetail {
    pub id: String,
    pub name: String,
    pub subtitle: String,
    pub equipment: String,
    pub setting: String,
    pub schedule: ResolvedSchedule,
    pub steps: Vec<AnnotatedStep>,
}

impl Plan {
    pub fn build(table: Arc<RecipeTable>, deadline: DateTime<Utc>) -> Self {
        let resolution = resolve(&table, deadline);
        let occupancy = Occupancy::build(&table, &resolution);
        let checklist = checklist::flatten(&table, &resolution);
        tracing::debug!(
            %deadline,
            blocks = occupancy.blocks().count(),
            events = checklist.len(),
            "plan built"
        );
        Self {
            table,
            resolution,
            occupancy,
            checklist,
        }
    }

    /// Load the configured recipe table and build today's plan.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be read or the serve time is
    /// unusable.
    pub fn from_config(config: &Config, serve_at: Option<&str>) -> Result<Self> {
        let table = RecipeTable::load_or_builtin(config.recipes_path())?;
        let deadline = config.deadline(serve_at)?;
        Ok(Self::build(Arc::new(table), deadline))
    }

    pub fn table(&self) -> &RecipeTable {
        &self.table
    }

    pub fn shared_table(&self) -> Arc<RecipeTable> {
        Arc::clone(&self.table)
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.resolution.deadline
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn schedule(&self, recipe_id: &str) -> Option<&ResolvedSchedule> {
        self.resolution.get(recipe_id)
    }

    pub fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    pub fn checklist(&self) -> &[ChecklistEvent] {
        &self.checklist
    }

    pub fn lanes(&self) -> Vec<DeviceLane> {
        self.occupancy.lanes(&self.table)
    }

    pub fn cooking_now(&self, now: DateTime<Utc>) -> Vec<ActiveBlock> {
        self.occupancy.cooking_now(&self.table, now)
    }

    pub fn bounds(&self) -> TimelineBounds {
        self.occupancy.bounds(self.deadline())
    }

    pub fn next_event(&self, now: DateTime<Utc>) -> Option<&ChecklistEvent> {
        checklist::next_event(&self.checklist, now)
    }

    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        checklist::has_started(&self.checklist, now)
    }

    pub fn first_event_at(&self) -> Option<DateTime<Utc>> {
        self.checklist.first().map(|e| e.time)
    }

    pub fn recipe_detail(&self, recipe_id: &str) -> Option<RecipeDetail> {
        let recipe = self.table.recipe(recipe_id)?;
        let schedule = *self.resolution.get(recipe_id)?;
        let equipment = self.table.equipment_name(&recipe.equipment).to_string();
        let steps = annotate_steps(recipe, &equipment, &schedule);
        Some(RecipeDetail {
            id: recipe.id.clone(),
            name: recipe.name.clone(),
            subtitle: recipe.subtitle.clone(),
            equipment,
            setting: recipe.setting.clone(),
            schedule,
            steps,
        })
    }
}
