//! # Roastplan Core Library
//!
//! This library plans a multi-station cooking schedule for one meal served
//! at a fixed time, and drives reminders as the cook works through it. It
//! follows a CLI-first philosophy: every operation is a plain function or
//! method here, and the `roastplan-cli` binary is a thin layer on top.
//!
//! ## Architecture
//!
//! - **Recipe table**: static TOML input of recipes and equipment, with a
//!   built-in roast dinner
//! - **Resolver**: turns each recipe's constraint into absolute prep, cook
//!   and rest times relative to the deadline, plus oven preheat times
//! - **Timeline**: per-device occupancy with overlap lanes
//! - **Checklist**: every timed action merged into one ordered list
//! - **Alerts**: an at-most-once reminder scheduler and delivery sinks
//!   (terminal bell, desktop notification, push relay)
//!
//! ## Key Components
//!
//! - [`Plan`]: immutable snapshot for one deadline
//! - [`MealSession`]: current plan plus reminder state
//! - [`NotificationScheduler`]: reminder window and notified set
//! - [`Config`]: application configuration management

pub mod alerts;
pub mod checklist;
pub mod clock;
pub mod error;
pub mod events;
pub mod format;
pub mod plan;
pub mod recipe;
pub mod schedule;
pub mod session;
pub mod storage;
pub mod timeline;

pub use alerts::{AlertWindow, Dispatcher, NotificationScheduler, Reminder, ReminderSink};
pub use checklist::{ChecklistEvent, EventKind};
pub use clock::{Clock, LiveClock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, DeliveryError, TableError};
pub use events::Event;
pub use plan::{Plan, RecipeDetail};
pub use recipe::{Constraint, DeviceClass, Equipment, Recipe, RecipeTable};
pub use schedule::{resolve, PreheatTier, Resolution, ResolvedSchedule};
pub use session::MealSession;
pub use storage::Config;
pub use timeline::{assign_lanes, EquipmentBlock, LaneAssignment, Occupancy};
