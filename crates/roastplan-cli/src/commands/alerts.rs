use chrono::Utc;
use clap::Subcommand;
use roastplan_core::alerts::dry_run;
use roastplan_core::format::format_clock;
use roastplan_core::{Config, Reminder};
use serde_json::json;

use super::common::{dispatcher, load_plan, print_json, Announcer, CmdResult, PlanArgs};
use super::watch;

#[derive(Subcommand)]
pub enum AlertsAction {
    /// Turn reminders on and send a confirmation through every sink
    Enable,
    /// Turn reminders off
    Disable,
    /// Show whether reminders are on, the window and the active sinks
    Status {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Follow the plan live and fire reminders as they come due
    Watch {
        /// Serve time for this run only (HH:MM, local)
        #[arg(long)]
        serve_at: Option<String>,
        /// Poll once and exit
        #[arg(long)]
        once: bool,
    },
    /// Walk through every checklist event and show which reminders fire
    DryRun {
        #[command(flatten)]
        args: PlanArgs,
        /// Also hand each reminder to the configured sinks
        #[arg(long)]
        deliver: bool,
    },
}

pub fn run(action: AlertsAction) -> CmdResult {
    match action {
        AlertsAction::Enable => {
            let mut config = Config::load()?;
            if config.alerts.enabled {
                println!("alerts already enabled");
                return Ok(());
            }
            config.set("alerts.enabled", "true")?;
            let confirmation = Reminder::alerts_enabled(Utc::now());
            Announcer::from_config(&config)?.announce(&confirmation);
            println!("alerts enabled");
        }
        AlertsAction::Disable => {
            let mut config = Config::load()?;
            config.set("alerts.enabled", "false")?;
            println!("alerts disabled");
        }
        AlertsAction::Status { json } => {
            let config = Config::load()?;
            let sinks = dispatcher(&config);
            let window = config.alert_window();
            if json {
                return print_json(&json!({
                    "enabled": config.alerts.enabled,
                    "lead_secs": window.lead.num_seconds(),
                    "grace_secs": window.grace.num_seconds(),
                    "poll_interval_secs": config.poll_interval().as_secs(),
                    "sinks": sinks.sink_names(),
                }));
            }
            let state = if config.alerts.enabled { "on" } else { "off" };
            println!("alerts:  {state}");
            println!(
                "window:  {}s before to {}s after",
                window.lead.num_seconds(),
                window.grace.num_seconds()
            );
            println!("polling: every {}s", config.poll_interval().as_secs());
            if sinks.is_empty() {
                println!("sinks:   none");
            } else {
                println!("sinks:   {}", sinks.sink_names().join(", "));
            }
            if config.push.enabled {
                println!("push:    {} topic {}", config.push.server, config.push.topic);
            }
        }
        AlertsAction::Watch { serve_at, once } => {
            let config = Config::load()?;
            watch::run(config, serve_at, once)?;
        }
        AlertsAction::DryRun { args, deliver } => {
            let (config, plan) = load_plan(&args)?;
            let announcer = if deliver {
                Some(Announcer::from_config(&config)?)
            } else {
                None
            };
            let steps = dry_run(plan.checklist(), config.alert_window(), |reminder| {
                if let Some(announcer) = &announcer {
                    announcer.announce(reminder);
                }
            });
            if args.json {
                return print_json(&steps);
            }
            for step in &steps {
                for reminder in &step.reminders {
                    println!("{}  {}", format_clock(step.at), reminder.headline());
                }
            }
        }
    }
    Ok(())
}
