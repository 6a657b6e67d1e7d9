//! Equipment timeline.
//!
//! Resolved schedules become blocks on the device they occupy. Overlapping
//! blocks on one device are spread across lanes so a view can draw them
//! side by side.

mod blocks;
mod lanes;
mod occupancy;

pub use blocks::{BlockKind, BlockStatus, EquipmentBlock};
pub use lanes::{assign_lanes, spans_overlap, LaneAssignment, Span};
pub use occupancy::{ActiveBlock, DeviceLane, Occupancy, PlacedBlock, TimelineBounds};
