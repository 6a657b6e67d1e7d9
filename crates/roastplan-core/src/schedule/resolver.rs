//! Deadline-relative resolution.
//!
//! Every recipe is placed by its constraint tag:
//!
//! ```text
//! independent          cook_end = deadline - rest - finish_early_by   (hob: deadline)
//! cook_first           cook_end = longest item's prep start - 10m
//! cook_first + low     cook_end = cohort start - 10m
//! sync_with_main_meats cook_start = cohort start
//! sync_with target     cook_end = target's resolved cook_end
//! ```
//!
//! `sync_with` is the only constraint that reads another recipe's resolved
//! times, so recipes are visited in topological order over those edges. A
//! missing target or a cycle falls back to the independent rule.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;

use super::{PreheatTier, Preheats, Resolution, ResolvedSchedule};
use crate::recipe::{Constraint, DeviceClass, Recipe, RecipeTable};

/// Gap between a cook-first recipe leaving the oven and what follows it.
pub const COOK_FIRST_BUFFER_MIN: i64 = 10;

/// Minutes an oven needs to come up to temperature.
pub const PREHEAT_LEAD_MIN: i64 = 15;

/// Resolve every recipe in `table` against `deadline`.
pub fn resolve(table: &RecipeTable, deadline: DateTime<Utc>) -> Resolution {
    Resolver::new(table, deadline).run()
}

struct Resolver<'a> {
    table: &'a RecipeTable,
    deadline: DateTime<Utc>,
    /// Shared start of the `sync_with_main_meats` cohort.
    cohort_start: Option<DateTime<Utc>>,
    /// Prep start of the longest non-cook-first recipe.
    longest_prep_start: DateTime<Utc>,
}

impl<'a> Resolver<'a> {
    fn new(table: &'a RecipeTable, deadline: DateTime<Utc>) -> Self {
        let cohort_start = table.cohort_anchor().map(|anchor| {
            let anchor_end = deadline - anchor.rest_duration();
            anchor_end - anchor.cook_duration()
        });
        let longest_prep_start = table
            .longest_main_item()
            .map(|r| deadline - Duration::minutes(i64::from(r.total_minutes())))
            .unwrap_or(deadline);

        Self {
            table,
            deadline,
            cohort_start,
            longest_prep_start,
        }
    }

    fn run(self) -> Resolution {
        let recipes = &self.table.recipes;
        let mut resolved: Vec<Option<ResolvedSchedule>> = vec![None; recipes.len()];

        for index in self.visit_order() {
            let schedule = match index {
                Visit::Ordered(i) => self.place(&recipes[i], &resolved),
                Visit::Cyclic(i) => {
                    tracing::warn!(
                        recipe = %recipes[i].id,
                        "sync_with cycle, using independent timing"
                    );
                    self.place_independent(&recipes[i])
                }
            };
            let i = index.position();
            resolved[i] = Some(schedule);
        }

        let mut schedules = IndexMap::with_capacity(recipes.len());
        let mut preheats = Preheats::default();

        for (recipe, schedule) in recipes.iter().zip(resolved) {
            let Some(schedule) = schedule else { continue };
            if let Some(tier) = self.preheat_tier(recipe) {
                preheats.record(
                    tier,
                    schedule.cook_start - Duration::minutes(PREHEAT_LEAD_MIN),
                );
            }
            schedules.entry(recipe.id.clone()).or_insert(schedule);
        }

        tracing::debug!(
            deadline = %self.deadline,
            recipes = schedules.len(),
            "schedule resolved"
        );

        Resolution {
            deadline: self.deadline,
            schedules,
            preheats,
        }
    }

    /// Kahn's algorithm over `sync_with` edges, ties broken by table order.
    ///
    /// When the queue runs dry, the recipes still waiting either sit on a
    /// cycle or point into one. Cycle members are released as
    /// [`Visit::Cyclic`] and the queue resumes, so recipes downstream of a
    /// cycle still follow their target.
    fn visit_order(&self) -> Vec<Visit> {
        let recipes = &self.table.recipes;
        let n = recipes.len();
        let mut first_index: HashMap<&str, usize> = HashMap::new();
        for (i, r) in recipes.iter().enumerate() {
            first_index.entry(r.id.as_str()).or_insert(i);
        }

        let mut targets: Vec<Option<usize>> = vec![None; n];
        let mut pending = vec![0usize; n];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (i, r) in recipes.iter().enumerate() {
            if let Some(&target) = r.sync_target().and_then(|t| first_index.get(t)) {
                targets[i] = Some(target);
                pending[i] += 1;
                dependents[target].push(i);
            }
        }

        let mut queue: VecDeque<usize> = (0..n).filter(|&i| pending[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        let mut visited = vec![false; n];

        loop {
            while let Some(i) = queue.pop_front() {
                if visited[i] {
                    continue;
                }
                visited[i] = true;
                order.push(Visit::Ordered(i));
                release(i, &dependents, &mut pending, &visited, &mut queue);
            }

            let cyclic: Vec<usize> = (0..n)
                .filter(|&i| !visited[i] && on_cycle(i, &targets))
                .collect();
            if cyclic.is_empty() {
                break;
            }
            for &i in &cyclic {
                visited[i] = true;
                order.push(Visit::Cyclic(i));
            }
            for &i in &cyclic {
                release(i, &dependents, &mut pending, &visited, &mut queue);
            }
        }

        order
    }

    fn place(&self, recipe: &Recipe, resolved: &[Option<ResolvedSchedule>]) -> ResolvedSchedule {
        match &recipe.constraint {
            Constraint::SyncWith { target } => {
                let target_end = self
                    .table
                    .recipes
                    .iter()
                    .position(|r| &r.id == target)
                    .and_then(|i| resolved[i])
                    .map(|s| s.cook_end);
                match target_end {
                    Some(cook_end) => ResolvedSchedule::ending_at(recipe, cook_end),
                    None => {
                        tracing::debug!(
                            recipe = %recipe.id,
                            %target,
                            "sync target missing, using independent timing"
                        );
                        self.place_independent(recipe)
                    }
                }
            }
            Constraint::CookFirst {
                needs_lower_temp: true,
            } => match self.cohort_start {
                Some(start) => ResolvedSchedule::ending_at(recipe, start - Self::buffer()),
                None => self.place_independent(recipe),
            },
            Constraint::SyncWithMainMeats => match self.cohort_start {
                Some(start) => ResolvedSchedule::starting_at(recipe, start),
                None => self.place_independent(recipe),
            },
            Constraint::CookFirst { .. } | Constraint::Independent => {
                self.place_independent(recipe)
            }
        }
    }

    /// The rule for recipes that reference nothing else.
    fn place_independent(&self, recipe: &Recipe) -> ResolvedSchedule {
        let cook_end = if recipe.is_cook_first() {
            self.longest_prep_start - Self::buffer()
        } else if self.table.device_class(&recipe.equipment) == DeviceClass::Hob {
            self.deadline
        } else {
            self.deadline - recipe.rest_duration() - recipe.finish_early_duration()
        };
        ResolvedSchedule::ending_at(recipe, cook_end)
    }

    fn preheat_tier(&self, recipe: &Recipe) -> Option<PreheatTier> {
        if self.table.device_class(&recipe.equipment) != DeviceClass::Oven {
            return None;
        }
        if recipe.needs_lower_temp() {
            Some(PreheatTier::Low)
        } else if recipe.in_cohort() {
            Some(PreheatTier::High)
        } else {
            None
        }
    }

    fn buffer() -> Duration {
        Duration::minutes(COOK_FIRST_BUFFER_MIN)
    }
}

#[derive(Debug, Clone, Copy)]
enum Visit {
    Ordered(usize),
    Cyclic(usize),
}

impl Visit {
    fn position(self) -> usize {
        match self {
            Self::Ordered(i) | Self::Cyclic(i) => i,
        }
    }
}

fn release(
    i: usize,
    dependents: &[Vec<usize>],
    pending: &mut [usize],
    visited: &[bool],
    queue: &mut VecDeque<usize>,
) {
    for &d in &dependents[i] {
        if visited[d] {
            continue;
        }
        pending[d] -= 1;
        if pending[d] == 0 {
            queue.push_back(d);
        }
    }
}

/// Whether following `sync_with` targets from `start` leads back to it.
fn on_cycle(start: usize, targets: &[Option<usize>]) -> bool {
    let mut current = targets[start];
    for _ in 0..targets.len() {
        match current {
            Some(i) if i == start => return true,
            Some(i) => current = targets[i],
            None => return false,
        }
    }
    false
}
