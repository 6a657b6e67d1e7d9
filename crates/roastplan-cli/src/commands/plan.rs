use chrono::{DateTime, Utc};
use clap::Subcommand;
use roastplan_core::checklist::minutes_until_start;
use roastplan_core::clock::{deadline_today, parse_serve_time};
use roastplan_core::format::{format_clock, format_countdown, format_duration};
use roastplan_core::timeline::BlockStatus;
use roastplan_core::Plan;
use serde_json::json;

use super::common::{load_plan, print_json, CmdResult, PlanArgs};

#[derive(Subcommand)]
pub enum PlanAction {
    /// Resolved times for every recipe, plus oven preheats
    Show {
        #[command(flatten)]
        args: PlanArgs,
    },
    /// Every timed action in order
    Checklist {
        #[command(flatten)]
        args: PlanArgs,
    },
    /// Per-device occupancy with overlap lanes
    Timeline {
        #[command(flatten)]
        args: PlanArgs,
    },
    /// What is cooking and what comes next
    Now {
        #[command(flatten)]
        args: PlanArgs,
        /// Pretend the wall clock reads this time today (HH:MM)
        #[arg(long)]
        at: Option<String>,
    },
}

pub fn run(action: PlanAction) -> CmdResult {
    match action {
        PlanAction::Show { args } => {
            let (_, plan) = load_plan(&args)?;
            show(&plan, args.json)
        }
        PlanAction::Checklist { args } => {
            let (_, plan) = load_plan(&args)?;
            checklist(&plan, args.json)
        }
        PlanAction::Timeline { args } => {
            let (_, plan) = load_plan(&args)?;
            timeline(&plan, args.json)
        }
        PlanAction::Now { args, at } => {
            let (_, plan) = load_plan(&args)?;
            let now = match at {
                Some(value) => deadline_today(parse_serve_time(&value)?)
                    .ok_or_else(|| format!("{value} does not exist today in local time"))?,
                None => Utc::now(),
            };
            status(&plan, now, args.json)
        }
    }
}

fn show(plan: &Plan, as_json: bool) -> CmdResult {
    let table = plan.table();
    if as_json {
        return print_json(&json!({
            "title": table.title,
            "deadline": plan.deadline(),
            "schedules": plan.resolution().schedules,
            "preheats": plan.resolution().preheats,
        }));
    }

    println!("{}: serve at {}", table.title, format_clock(plan.deadline()));
    println!();
    println!(
        "{:<28} {:<14} {:>5} {:>5} {:>5} {:>5}",
        "RECIPE", "DEVICE", "PREP", "COOK", "DONE", "REST"
    );
    for recipe in &table.recipes {
        let Some(s) = plan.schedule(&recipe.id) else {
            continue;
        };
        println!(
            "{:<28} {:<14} {:>5} {:>5} {:>5} {:>5}",
            recipe.name,
            table.equipment_name(&recipe.equipment),
            format_clock(s.prep_start),
            format_clock(s.cook_start),
            format_clock(s.cook_end),
            s.rest_end.map(format_clock).unwrap_or_else(|| "-".into()),
        );
    }

    let preheats = &plan.resolution().preheats;
    if !preheats.is_empty() {
        println!();
        for (tier, at) in preheats.iter() {
            println!("preheat ({}) at {}", tier.as_str(), format_clock(at));
        }
    }
    Ok(())
}

fn checklist(plan: &Plan, as_json: bool) -> CmdResult {
    if as_json {
        return print_json(plan.checklist());
    }
    for event in plan.checklist() {
        println!(
            "{}  {:<8} {}",
            format_clock(event.time),
            event.kind.as_str(),
            event.title
        );
        if !event.description.is_empty() {
            println!("{:15}{}", "", event.description);
        }
    }
    Ok(())
}

fn timeline(plan: &Plan, as_json: bool) -> CmdResult {
    let lanes = plan.lanes();
    let bounds = plan.bounds();
    if as_json {
        return print_json(&json!({ "bounds": bounds, "devices": lanes }));
    }

    println!(
        "{} to {}",
        format_clock(bounds.earliest),
        format_clock(bounds.latest)
    );
    for device in &lanes {
        println!();
        println!("{}", device.name);
        for placed in &device.blocks {
            let lane = if placed.lane.lane_count > 1 {
                format!("[{}/{}]", placed.lane.lane_index + 1, placed.lane.lane_count)
            } else {
                String::new()
            };
            println!(
                "  {}-{} {:<5} {}",
                format_clock(placed.block.start),
                format_clock(placed.block.end),
                lane,
                placed.block.name
            );
        }
    }
    Ok(())
}

fn status(plan: &Plan, now: DateTime<Utc>, as_json: bool) -> CmdResult {
    let active = plan.cooking_now(now);
    let next = plan.next_event(now);
    if as_json {
        return print_json(&json!({
            "now": now,
            "started": plan.has_started(now),
            "next": next,
            "cooking": active,
        }));
    }

    if !plan.has_started(now) {
        if let Some(minutes) = minutes_until_start(plan.checklist(), now) {
            println!("starts in {}", format_duration(minutes));
        }
    }
    match next {
        Some(event) => println!(
            "next: {} at {} (in {})",
            event.title,
            format_clock(event.time),
            format_countdown((event.time - now).num_seconds())
        ),
        None => println!("nothing left to do"),
    }

    if active.is_empty() {
        return Ok(());
    }
    println!();
    for item in &active {
        let left = match item.block.status(now) {
            BlockStatus::Active { minutes_left } => format_duration(minutes_left),
            _ => format_countdown(item.remaining_secs),
        };
        println!("  {:<14} {:<28} {} left", item.device_name, item.block.name, left);
    }
    Ok(())
}
