//! The recipe table: every dish, every device, and the copy used for
//! preheat prompts.
//!
//! Tables are TOML documents. A built-in table is compiled in and used when
//! no path is configured.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{DeviceClass, Equipment, Recipe};
use crate::error::TableError;

/// Bucket id for the virtual "off-heat, foil-wrapped" device.
pub const REST_BUCKET: &str = "rest";

const BUILTIN_TABLE: &str = include_str!("default_dinner.toml");

/// Title and description for one preheat tier prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCopy {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCopySet {
    #[serde(default = "default_low_copy")]
    pub low: TierCopy,
    #[serde(default = "default_high_copy")]
    pub high: TierCopy,
}

fn default_low_copy() -> TierCopy {
    TierCopy {
        title: "Preheat oven (low)".into(),
        description: "Low temperature for the slow roast".into(),
    }
}

fn default_high_copy() -> TierCopy {
    TierCopy {
        title: "Crank oven (high)".into(),
        description: "High temperature for the main roasts going in together".into(),
    }
}

fn default_serve_message() -> String {
    "Dinner is ready!".into()
}

impl Default for TierCopySet {
    fn default() -> Self {
        Self {
            low: default_low_copy(),
            high: default_high_copy(),
        }
    }
}

/// Ordered recipes plus equipment metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeTable {
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_serve_message")]
    pub serve_message: String,
    /// Recipe whose start time every cohort member shares.
    #[serde(default)]
    pub anchor: Option<String>,
    #[serde(default)]
    pub tiers: TierCopySet,
    #[serde(default)]
    pub equipment: Vec<Equipment>,
    #[serde(default)]
    pub recipes: Vec<Recipe>,
}

impl Default for RecipeTable {
    fn default() -> Self {
        Self {
            title: String::new(),
            serve_message: default_serve_message(),
            anchor: None,
            tiers: TierCopySet::default(),
            equipment: Vec::new(),
            recipes: Vec::new(),
        }
    }
}

/// A non-fatal problem found in a table. Resolution still completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableIssue {
    DuplicateRecipe(String),
    UnknownEquipment { recipe: String, equipment: String },
    DanglingSync { recipe: String, target: String },
    AnchorNotFound(String),
    AnchorOutsideCohort(String),
}

impl fmt::Display for TableIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateRecipe(id) => write!(f, "recipe id '{id}' appears more than once"),
            Self::UnknownEquipment { recipe, equipment } => {
                write!(f, "recipe '{recipe}' uses unknown equipment '{equipment}'")
            }
            Self::DanglingSync { recipe, target } => write!(
                f,
                "recipe '{recipe}' syncs with missing recipe '{target}', using its own timing"
            ),
            Self::AnchorNotFound(id) => write!(f, "cohort anchor '{id}' is not in the table"),
            Self::AnchorOutsideCohort(id) => {
                write!(f, "cohort anchor '{id}' is not marked sync_with_main_meats")
            }
        }
    }
}

impl RecipeTable {
    /// The compiled-in roast dinner table.
    pub fn builtin() -> Self {
        Self::from_toml_str(BUILTIN_TABLE).unwrap_or_default()
    }

    pub fn from_toml_str(content: &str) -> Result<Self, TableError> {
        Ok(toml::from_str(content)?)
    }

    /// Read a table document from disk.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a valid table.
    pub fn load(path: &Path) -> Result<Self, TableError> {
        let content = std::fs::read_to_string(path).map_err(|source| TableError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load `path` when given, else the built-in table. Issues are logged.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, TableError> {
        let table = match path {
            Some(p) => Self::load(p)?,
            None => Self::builtin(),
        };
        for issue in table.issues() {
            tracing::warn!(%issue, "recipe table issue");
        }
        Ok(table)
    }

    pub fn recipe(&self, id: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    pub fn equipment(&self, id: &str) -> Option<&Equipment> {
        self.equipment.iter().find(|e| e.id == id)
    }

    /// Device class of `id`; unknown equipment is treated as `Other`.
    pub fn device_class(&self, id: &str) -> DeviceClass {
        self.equipment(id).map(|e| e.class).unwrap_or_default()
    }

    /// Display name of `id`, falling back to the id itself.
    pub fn equipment_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.equipment(id).map(|e| e.name.as_str()).unwrap_or(id)
    }

    /// The recipe every cohort member starts with.
    ///
    /// The named anchor wins when it exists; otherwise the first cohort
    /// member in table order.
    pub fn cohort_anchor(&self) -> Option<&Recipe> {
        self.anchor
            .as_deref()
            .and_then(|id| self.recipe(id))
            .or_else(|| self.recipes.iter().find(|r| r.in_cohort()))
    }

    /// The non-cook-first recipe with the largest prep + cook + rest.
    /// Ties go to the earlier recipe.
    pub fn longest_main_item(&self) -> Option<&Recipe> {
        self.recipes
            .iter()
            .filter(|r| !r.is_cook_first())
            .fold(None, |longest: Option<&Recipe>, r| match longest {
                Some(l) if l.total_minutes() >= r.total_minutes() => Some(l),
                _ => Some(r),
            })
    }

    /// Collect every non-fatal problem in table order.
    pub fn issues(&self) -> Vec<TableIssue> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();

        for recipe in &self.recipes {
            if !seen.insert(recipe.id.as_str()) {
                issues.push(TableIssue::DuplicateRecipe(recipe.id.clone()));
            }
            if self.equipment(&recipe.equipment).is_none() {
                issues.push(TableIssue::UnknownEquipment {
                    recipe: recipe.id.clone(),
                    equipment: recipe.equipment.clone(),
                });
            }
            if let Some(reheat) = &recipe.reheat {
                if self.equipment(&reheat.equipment).is_none() {
                    issues.push(TableIssue::UnknownEquipment {
                        recipe: recipe.id.clone(),
                        equipment: reheat.equipment.clone(),
                    });
                }
            }
            if let Some(target) = recipe.sync_target() {
                if self.recipe(target).is_none() {
                    issues.push(TableIssue::DanglingSync {
                        recipe: recipe.id.clone(),
                        target: target.to_string(),
                    });
                }
            }
        }

        if let Some(anchor) = &self.anchor {
            match self.recipe(anchor) {
                None => issues.push(TableIssue::AnchorNotFound(anchor.clone())),
                Some(r) if !r.in_cohort() => {
                    issues.push(TableIssue::AnchorOutsideCohort(anchor.clone()))
                }
                Some(_) => {}
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::Constraint;

    #[test]
    fn builtin_table_parses_cleanly() {
        let table = RecipeTable::from_toml_str(BUILTIN_TABLE).unwrap();
        assert!(!table.recipes.is_empty());
        assert!(!table.equipment.is_empty());
        assert_eq!(table.issues(), Vec::new());
        assert_eq!(table.anchor.as_deref(), Some("beef"));
    }

    #[test]
    fn builtin_table_device_classes() {
        let table = RecipeTable::builtin();
        assert_eq!(table.device_class("oven-top"), DeviceClass::Oven);
        assert_eq!(table.device_class("hob-1"), DeviceClass::Hob);
        assert_eq!(table.device_class("drawer-1"), DeviceClass::Other);
        assert_eq!(table.device_class("no-such-device"), DeviceClass::Other);
        assert_eq!(table.equipment_name("no-such-device"), "no-such-device");
    }

    #[test]
    fn cohort_anchor_falls_back_to_first_member() {
        let mut table = RecipeTable::default();
        table.recipes.push(Recipe::new("a", "A", "oven", 10));
        table.recipes.push(
            Recipe::new("b", "B", "oven", 20).with_constraint(Constraint::SyncWithMainMeats),
        );
        table.recipes.push(
            Recipe::new("c", "C", "oven", 30).with_constraint(Constraint::SyncWithMainMeats),
        );
        assert_eq!(table.cohort_anchor().map(|r| r.id.as_str()), Some("b"));

        table.anchor = Some("c".into());
        assert_eq!(table.cohort_anchor().map(|r| r.id.as_str()), Some("c"));

        table.anchor = Some("missing".into());
        assert_eq!(table.cohort_anchor().map(|r| r.id.as_str()), Some("b"));
        assert!(table
            .issues()
            .contains(&TableIssue::AnchorNotFound("missing".into())));
    }

    #[test]
    fn longest_main_item_skips_cook_first_and_keeps_first_on_tie() {
        let mut table = RecipeTable::default();
        table.recipes.push(
            Recipe::new("slow", "Slow", "oven", 300).with_constraint(Constraint::CookFirst {
                needs_lower_temp: false,
            }),
        );
        table
            .recipes
            .push(Recipe::new("x", "X", "oven", 50).with_prep(10));
        table
            .recipes
            .push(Recipe::new("y", "Y", "oven", 40).with_prep(20));
        assert_eq!(table.longest_main_item().map(|r| r.id.as_str()), Some("x"));
    }

    #[test]
    fn issues_report_dangling_and_duplicates() {
        let mut table = RecipeTable::default();
        table
            .equipment
            .push(Equipment::new("oven", "Oven", DeviceClass::Oven));
        table.recipes.push(Recipe::new("a", "A", "oven", 10));
        table.recipes.push(Recipe::new("a", "A again", "grill", 10));
        table.recipes.push(
            Recipe::new("b", "B", "oven", 10).with_constraint(Constraint::SyncWith {
                target: "gone".into(),
            }),
        );

        let issues = table.issues();
        assert_eq!(issues.len(), 3);
        assert_eq!(issues[0], TableIssue::DuplicateRecipe("a".into()));
        assert!(matches!(&issues[1], TableIssue::UnknownEquipment { equipment, .. } if equipment == "grill"));
        assert!(matches!(&issues[2], TableIssue::DanglingSync { target, .. } if target == "gone"));
        assert!(issues[2].to_string().contains("gone"));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.toml");
        std::fs::write(
            &path,
            r#"
            title = "Sunday Lunch"

            [[equipment]]
            id = "hob-1"
            name = "Ring 1"
            class = "hob"

            [[recipes]]
            id = "peas"
            name = "Peas"
            cook_time = 4
            equipment = "hob-1"
            "#,
        )
        .unwrap();

        let table = RecipeTable::load(&path).unwrap();
        assert_eq!(table.title, "Sunday Lunch");
        assert_eq!(table.serve_message, "Dinner is ready!");
        assert_eq!(table.recipes.len(), 1);
        assert_eq!(table.tiers, TierCopySet::default());

        let missing = RecipeTable::load(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(TableError::Read { .. })));
    }
}
