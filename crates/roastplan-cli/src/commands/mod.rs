pub mod alerts;
pub mod common;
pub mod config;
pub mod plan;
pub mod recipe;
mod watch;
