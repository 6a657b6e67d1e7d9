//! Loading shared by every command: config, recipe table, deadline, sinks.

use std::sync::Arc;

use clap::Args;
use roastplan_core::alerts::{DesktopNotifier, PushRelay, TerminalAlarm};
use roastplan_core::{Config, Dispatcher, Plan, RecipeTable, Reminder};
use serde::Serialize;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Options every plan-reading command accepts.
#[derive(Args, Debug, Clone, Default)]
pub struct PlanArgs {
    /// Serve time for this run only (HH:MM, local)
    #[arg(long)]
    pub serve_at: Option<String>,
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

pub fn load_table(config: &Config) -> Result<Arc<RecipeTable>, Box<dyn std::error::Error>> {
    Ok(Arc::new(RecipeTable::load_or_builtin(config.recipes_path())?))
}

pub fn load_plan(args: &PlanArgs) -> Result<(Config, Plan), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let plan = Plan::from_config(&config, args.serve_at.as_deref())?;
    tracing::debug!(
        deadline = %plan.deadline(),
        recipes = plan.table().recipes.len(),
        "plan loaded"
    );
    Ok((config, plan))
}

/// Local sinks enabled in config.
pub fn local_dispatcher(config: &Config) -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    if config.alarm.enabled {
        dispatcher.push(TerminalAlarm);
    }
    if config.desktop.enabled {
        dispatcher.push(DesktopNotifier);
    }
    dispatcher
}

/// The push relay, when enabled and well-formed.
pub fn push_relay(config: &Config) -> Option<PushRelay> {
    if !config.push.enabled {
        return None;
    }
    match PushRelay::new(&config.push.server, config.push.topic.clone()) {
        Ok(relay) => Some(relay),
        Err(e) => {
            tracing::warn!(error = %e, "push relay disabled");
            None
        }
    }
}

/// Every sink enabled in config; push delivery needs a running runtime.
pub fn dispatcher(config: &Config) -> Dispatcher {
    let mut dispatcher = local_dispatcher(config);
    if let Some(relay) = push_relay(config) {
        dispatcher.push(relay);
    }
    dispatcher
}

/// Delivery for one-shot commands: local sinks fire directly and the
/// push relay is awaited before returning.
pub struct Announcer {
    local: Dispatcher,
    relay: Option<PushRelay>,
    runtime: Option<tokio::runtime::Runtime>,
}

impl Announcer {
    pub fn from_config(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        let relay = push_relay(config);
        let runtime = match relay {
            Some(_) => Some(
                tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()?,
            ),
            None => None,
        };
        Ok(Self {
            local: local_dispatcher(config),
            relay,
            runtime,
        })
    }

    pub fn sink_count(&self) -> usize {
        self.local.sink_names().len() + usize::from(self.relay.is_some())
    }

    pub fn announce(&self, reminder: &Reminder) {
        self.local.dispatch(reminder);
        if let (Some(relay), Some(runtime)) = (&self.relay, &self.runtime) {
            if let Err(e) = runtime.block_on(relay.send(reminder)) {
                tracing::warn!(error = %e, "push relay failed");
            }
        }
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
