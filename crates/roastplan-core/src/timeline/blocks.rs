//! Equipment blocks: one interval of a recipe occupying a device.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::lanes::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Cook,
    Rest,
}

/// A recipe (or one of its reheat slots) occupying a bucket over
/// `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentBlock {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub recipe_id: String,
    pub name: String,
    pub kind: BlockKind,
    #[serde(default)]
    pub setting: String,
}

/// Where a block stands relative to `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum BlockStatus {
    Upcoming { minutes_until: i64 },
    Active { minutes_left: i64 },
    Done,
}

impl EquipmentBlock {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && now < self.end
    }

    /// Time left until the block ends, never negative.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.end - now).max(Duration::zero())
    }

    pub fn status(&self, now: DateTime<Utc>) -> BlockStatus {
        if now < self.start {
            BlockStatus::Upcoming {
                minutes_until: ceil_minutes(self.start - now),
            }
        } else if now < self.end {
            BlockStatus::Active {
                minutes_left: ceil_minutes(self.end - now),
            }
        } else {
            BlockStatus::Done
        }
    }
}

impl Span for EquipmentBlock {
    fn start(&self) -> DateTime<Utc> {
        self.start
    }

    fn end(&self) -> DateTime<Utc> {
        self.end
    }

    fn tiebreak(&self) -> &str {
        &self.name
    }
}

fn ceil_minutes(d: Duration) -> i64 {
    let secs = d.num_seconds();
    (secs + 59).div_euclid(60)
}
