//! Recipe table CLI commands.

use std::path::PathBuf;

use clap::Subcommand;
use roastplan_core::format::{format_clock, format_duration};
use roastplan_core::{Config, RecipeTable};

use super::common::{load_plan, load_table, print_json, CmdResult, PlanArgs};

#[derive(Subcommand)]
pub enum RecipeAction {
    /// List recipes in table order
    List {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// One recipe with its times and timed instructions
    Show {
        /// Recipe id
        id: String,
        #[command(flatten)]
        args: PlanArgs,
    },
    /// Load a recipe table file and report any problems
    Check {
        /// Path to a TOML table; defaults to the configured one
        path: Option<PathBuf>,
    },
}

pub fn run(action: RecipeAction) -> CmdResult {
    match action {
        RecipeAction::List { json } => {
            let config = Config::load()?;
            let table = load_table(&config)?;
            if json {
                return print_json(&table.recipes);
            }
            for recipe in &table.recipes {
                let rest = if recipe.rests() {
                    format_duration(recipe.rest_time.into())
                } else {
                    "-".to_string()
                };
                println!(
                    "{:<16} {:<28} {:<14} cook {:>6}  rest {:>6}",
                    recipe.id,
                    recipe.name,
                    table.equipment_name(&recipe.equipment),
                    format_duration(recipe.cook_time.into()),
                    rest,
                );
            }
            Ok(())
        }
        RecipeAction::Show { id, args } => {
            let (_, plan) = load_plan(&args)?;
            let detail = plan
                .recipe_detail(&id)
                .ok_or_else(|| format!("unknown recipe: {id}"))?;
            if args.json {
                return print_json(&detail);
            }

            println!("{}", detail.name);
            if !detail.subtitle.is_empty() {
                println!("{}", detail.subtitle);
            }
            let setting = if detail.setting.is_empty() {
                String::new()
            } else {
                format!(" at {}", detail.setting)
            };
            println!("{}{}", detail.equipment, setting);
            println!();
            let s = &detail.schedule;
            println!("prep  {}", format_clock(s.prep_start));
            println!("cook  {}", format_clock(s.cook_start));
            println!("done  {}", format_clock(s.cook_end));
            if let Some(rest_end) = s.rest_end {
                println!("rest  until {}", format_clock(rest_end));
            }
            if !detail.steps.is_empty() {
                println!();
                for step in &detail.steps {
                    println!("{}  {}. {}", format_clock(step.at), step.index + 1, step.text);
                }
            }
            Ok(())
        }
        RecipeAction::Check { path } => {
            let table = match path {
                Some(path) => RecipeTable::load(&path)?,
                None => {
                    let config = Config::load()?;
                    RecipeTable::load_or_builtin(config.recipes_path())?
                }
            };
            let issues = table.issues();
            if issues.is_empty() {
                println!(
                    "{}: {} recipes on {} devices, no issues",
                    table.title,
                    table.recipes.len(),
                    table.equipment.len()
                );
                return Ok(());
            }
            for issue in &issues {
                println!("{issue}");
            }
            Err(format!("{} issue(s) found", issues.len()).into())
        }
    }
}
