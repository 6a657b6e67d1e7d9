//! Delivery collaborators for fired reminders.
//!
//! Sinks never report back to the scheduler. A failure is logged where it
//! happens and the reminder still counts as handled.

use std::io::Write;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::JoinHandle;

use reqwest::Client;
use serde_json::json;
use url::Url;

use super::scheduler::Reminder;
use crate::error::DeliveryError;

pub const DEFAULT_PUSH_SERVER: &str = "https://ntfy.sh";
pub const DEFAULT_PUSH_TOPIC: &str = "roastplan-dinner";

/// Something a fired reminder can be handed to.
pub trait ReminderSink: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Deliver one reminder. Must not block on the network.
    fn deliver(&self, reminder: &Reminder) -> Result<(), DeliveryError>;
}

/// Fans a reminder out to every configured sink.
#[derive(Default)]
pub struct Dispatcher {
    sinks: Vec<Box<dyn ReminderSink>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: impl ReminderSink + 'static) -> Self {
        self.push(sink);
        self
    }

    pub fn push(&mut self, sink: impl ReminderSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Hand `reminder` to every sink. Returns how many accepted it.
    pub fn dispatch(&self, reminder: &Reminder) -> usize {
        let mut accepted = 0;
        for sink in &self.sinks {
            match sink.deliver(reminder) {
                Ok(()) => accepted += 1,
                Err(e) => tracing::warn!(
                    sink = sink.name(),
                    title = %reminder.title,
                    error = %e,
                    "reminder delivery failed"
                ),
            }
        }
        accepted
    }
}

/// Rings the terminal bell on stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalAlarm;

impl ReminderSink for TerminalAlarm {
    fn name(&self) -> &str {
        "alarm"
    }

    fn deliver(&self, reminder: &Reminder) -> Result<(), DeliveryError> {
        let mut err = std::io::stderr().lock();
        // twice for "now" reminders
        let bells: &[u8] = if reminder.is_now { b"\x07\x07" } else { b"\x07" };
        err.write_all(bells)?;
        err.flush()?;
        Ok(())
    }
}

/// Shows an OS notification through the platform's command-line helper.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl DesktopNotifier {
    fn command(reminder: &Reminder) -> Command {
        let headline = reminder.headline();
        if cfg!(target_os = "macos") {
            let script = format!(
                "display notification {} with title {}",
                applescript_quote(&reminder.description),
                applescript_quote(&headline)
            );
            let mut cmd = Command::new("osascript");
            cmd.arg("-e").arg(script);
            cmd
        } else {
            let mut cmd = Command::new("notify-send");
            if reminder.is_now {
                cmd.arg("--urgency=critical");
            }
            cmd.arg(headline).arg(&reminder.description);
            cmd
        }
    }
}

fn applescript_quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

impl ReminderSink for DesktopNotifier {
    fn name(&self) -> &str {
        "desktop"
    }

    fn deliver(&self, reminder: &Reminder) -> Result<(), DeliveryError> {
        launch(Self::command(reminder)).map(drop)
    }
}

/// Start `cmd` with null stdio and wait on it from a background thread so
/// the child is reaped once it exits.
fn launch(mut cmd: Command) -> Result<JoinHandle<std::io::Result<ExitStatus>>, DeliveryError> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    let spawn_failed = |source| DeliveryError::Spawn {
        program: program.clone(),
        source,
    };
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(spawn_failed)?;
    std::thread::Builder::new()
        .name("notify-reap".into())
        .spawn(move || {
            let status = child.wait();
            if let Err(e) = &status {
                tracing::debug!(error = %e, "notification helper wait failed");
            }
            status
        })
        .map_err(spawn_failed)
}

/// Publishes reminders to an ntfy-compatible push relay under one topic.
#[derive(Debug, Clone)]
pub struct PushRelay {
    client: Client,
    endpoint: Url,
    topic: String,
}

impl PushRelay {
    pub fn new(server: &str, topic: impl Into<String>) -> Result<Self, DeliveryError> {
        let topic = topic.into();
        if topic.trim().is_empty() {
            return Err(DeliveryError::Unavailable("push topic".into()));
        }
        Ok(Self {
            client: Client::new(),
            endpoint: Url::parse(server)?,
            topic,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    fn payload(&self, reminder: &Reminder) -> serde_json::Value {
        let (priority, tags) = if reminder.is_now {
            (5, ["warning", "fork_and_knife"])
        } else {
            (4, ["bell", "fork_and_knife"])
        };
        json!({
            "topic": self.topic,
            "title": reminder.headline(),
            "message": reminder.description,
            "priority": priority,
            "tags": tags,
        })
    }

    /// Publish one reminder and wait for the relay's answer.
    pub async fn send(&self, reminder: &Reminder) -> Result<(), DeliveryError> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(&self.payload(reminder))
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            tracing::debug!(topic = %self.topic, title = %reminder.title, "push sent");
            Ok(())
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(DeliveryError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

impl ReminderSink for PushRelay {
    fn name(&self) -> &str {
        "push"
    }

    /// Spawns the request on the current runtime and returns immediately.
    fn deliver(&self, reminder: &Reminder) -> Result<(), DeliveryError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|_| DeliveryError::Unavailable("async runtime".into()))?;
        let relay = self.clone();
        let reminder = reminder.clone();
        handle.spawn(async move {
            if let Err(e) = relay.send(&reminder).await {
                tracing::warn!(topic = %relay.topic, error = %e, "push relay failed");
            }
        });
        Ok(())
    }
}
