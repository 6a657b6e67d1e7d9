//! Per-device buckets of equipment blocks and the views derived from them.

use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::blocks::{BlockKind, EquipmentBlock};
use super::lanes::{assign_lanes, LaneAssignment};
use crate::recipe::{DeviceClass, RecipeTable, REST_BUCKET};
use crate::schedule::Resolution;

const BOUNDS_LEAD_MIN: i64 = 30;
const BOUNDS_TAIL_MIN: i64 = 15;

/// Cook blocks bucketed by equipment id, rest blocks in [`REST_BUCKET`].
///
/// Buckets follow the table's equipment order; the rest bucket is always
/// present and comes last unless the table lists it explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupancy {
    buckets: IndexMap<String, Vec<EquipmentBlock>>,
}

/// A block together with its lane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedBlock {
    #[serde(flatten)]
    pub block: EquipmentBlock,
    #[serde(flatten)]
    pub lane: LaneAssignment,
}

/// One device column, ready for layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceLane {
    pub equipment_id: String,
    pub name: String,
    pub icon: String,
    pub class: DeviceClass,
    pub blocks: Vec<PlacedBlock>,
}

/// A block in progress at some instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveBlock {
    pub equipment_id: String,
    pub device_name: String,
    pub device_icon: String,
    #[serde(flatten)]
    pub block: EquipmentBlock,
    pub remaining_secs: i64,
}

/// Display range covering every block and the deadline, with padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineBounds {
    pub earliest: DateTime<Utc>,
    pub latest: DateTime<Utc>,
}

impl Occupancy {
    pub fn build(table: &RecipeTable, resolution: &Resolution) -> Self {
        let mut buckets: IndexMap<String, Vec<EquipmentBlock>> = table
            .equipment
            .iter()
            .map(|e| (e.id.clone(), Vec::new()))
            .collect();
        buckets.entry(REST_BUCKET.to_string()).or_default();

        for recipe in &table.recipes {
            let Some(schedule) = resolution.get(&recipe.id) else {
                continue;
            };
            buckets
                .entry(recipe.equipment.clone())
                .or_default()
                .push(EquipmentBlock {
                    start: schedule.cook_start,
                    end: schedule.cook_end,
                    recipe_id: recipe.id.clone(),
                    name: recipe.name.clone(),
                    kind: BlockKind::Cook,
                    setting: recipe.setting.clone(),
                });
            if let Some(rest_end) = schedule.rest_end {
                buckets
                    .entry(REST_BUCKET.to_string())
                    .or_default()
                    .push(EquipmentBlock {
                        start: schedule.cook_end,
                        end: rest_end,
                        recipe_id: recipe.id.clone(),
                        name: recipe.name.clone(),
                        kind: BlockKind::Rest,
                        setting: String::new(),
                    });
            }
        }

        for recipe in &table.recipes {
            let Some(reheat) = &recipe.reheat else {
                continue;
            };
            let start = resolution.deadline - Duration::minutes(i64::from(reheat.lead_minutes));
            buckets
                .entry(reheat.equipment.clone())
                .or_default()
                .push(EquipmentBlock {
                    start,
                    end: start + Duration::minutes(i64::from(reheat.duration)),
                    recipe_id: recipe.id.clone(),
                    name: reheat.title.clone(),
                    kind: BlockKind::Cook,
                    setting: reheat.setting.clone(),
                });
        }

        Self { buckets }
    }

    pub fn bucket(&self, equipment_id: &str) -> &[EquipmentBlock] {
        self.buckets
            .get(equipment_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[EquipmentBlock])> {
        self.buckets.iter().map(|(id, b)| (id.as_str(), b.as_slice()))
    }

    pub fn blocks(&self) -> impl Iterator<Item = &EquipmentBlock> {
        self.buckets.values().flatten()
    }

    /// Every bucket with lanes assigned.
    pub fn lanes(&self, table: &RecipeTable) -> Vec<DeviceLane> {
        self.iter()
            .map(|(id, blocks)| {
                let (name, icon, class) = device_meta(table, id);
                let placed = blocks
                    .iter()
                    .cloned()
                    .zip(assign_lanes(blocks))
                    .map(|(block, lane)| PlacedBlock { block, lane })
                    .collect();
                DeviceLane {
                    equipment_id: id.to_string(),
                    name,
                    icon,
                    class,
                    blocks: placed,
                }
            })
            .collect()
    }

    /// Blocks with `start <= now < end`, least time remaining first.
    pub fn cooking_now(&self, table: &RecipeTable, now: DateTime<Utc>) -> Vec<ActiveBlock> {
        let mut active: Vec<ActiveBlock> = self
            .iter()
            .flat_map(|(id, blocks)| {
                blocks
                    .iter()
                    .filter(move |b| b.is_active(now))
                    .map(move |b| (id, b))
            })
            .map(|(id, block)| {
                let (device_name, device_icon, _) = device_meta(table, id);
                ActiveBlock {
                    equipment_id: id.to_string(),
                    device_name,
                    device_icon,
                    remaining_secs: block.remaining(now).num_seconds(),
                    block: block.clone(),
                }
            })
            .collect();
        active.sort_by_key(|a| a.remaining_secs);
        active
    }

    pub fn bounds(&self, deadline: DateTime<Utc>) -> TimelineBounds {
        let earliest = self.blocks().map(|b| b.start).fold(deadline, DateTime::min);
        let latest = self.blocks().map(|b| b.end).fold(deadline, DateTime::max);
        TimelineBounds {
            earliest: earliest - Duration::minutes(BOUNDS_LEAD_MIN),
            latest: latest + Duration::minutes(BOUNDS_TAIL_MIN),
        }
    }
}

fn device_meta(table: &RecipeTable, id: &str) -> (String, String, DeviceClass) {
    match table.equipment(id) {
        Some(e) => (e.name.clone(), e.icon.clone(), e.class),
        None if id == REST_BUCKET => ("Resting".into(), String::new(), DeviceClass::Other),
        None => (id.to_string(), String::new(), DeviceClass::Other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{Constraint, Equipment, Recipe, Reheat};
    use crate::schedule::resolve;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 12, 25, h, m, 0).unwrap()
    }

    fn table() -> RecipeTable {
        let mut t = RecipeTable::default();
        t.equipment = vec![
            Equipment::new("oven-top", "Oven Top", DeviceClass::Oven),
            Equipment::new("hob-1", "Ring 1", DeviceClass::Hob),
        ];
        t.recipes = vec![
            Recipe::new("beef", "Beef", "oven-top", 55)
                .with_rest(30)
                .with_constraint(Constraint::SyncWithMainMeats),
            Recipe::new("stuffing", "Stuffing", "oven-top", 25)
                .with_reheat(Reheat {
                    equipment: "oven-top".into(),
                    lead_minutes: 10,
                    duration: 5,
                    setting: "200°C".into(),
                    title: "Rewarm stuffing".into(),
                    description: String::new(),
                }),
            Recipe::new("peas", "Peas", "hob-1", 4),
            Recipe::new("ribs", "Ribs", "smoker", 60),
        ];
        t
    }

    #[test]
    fn builds_buckets_in_table_order_with_rest_last() {
        let t = table();
        let occ = Occupancy::build(&t, &resolve(&t, at(15, 0)));
        let ids: Vec<_> = occ.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["oven-top", "hob-1", "rest", "smoker"]);

        let oven = occ.bucket("oven-top");
        assert_eq!(oven.len(), 3);
        assert_eq!(oven[2].name, "Rewarm stuffing");
        assert_eq!((oven[2].start, oven[2].end), (at(14, 50), at(14, 55)));

        let rest = occ.bucket("rest");
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].kind, BlockKind::Rest);
        assert_eq!((rest[0].start, rest[0].end), (at(14, 30), at(15, 0)));
        assert!(occ.bucket("nowhere").is_empty());
    }

    #[test]
    fn lanes_separate_concurrent_oven_blocks() {
        let t = table();
        let occ = Occupancy::build(&t, &resolve(&t, at(15, 0)));
        let lanes = occ.lanes(&t);
        let oven = &lanes[0];
        assert_eq!(oven.name, "Oven Top");
        // beef 13:35-14:30, stuffing 14:35-15:00, rewarm 14:50-14:55
        let got: Vec<_> = oven
            .blocks
            .iter()
            .map(|p| (p.block.name.as_str(), p.lane.lane_index, p.lane.lane_count))
            .collect();
        assert_eq!(
            got,
            vec![("Beef", 0, 1), ("Stuffing", 0, 2), ("Rewarm stuffing", 1, 2)]
        );
        assert_eq!(lanes[2].name, "Resting");
    }

    #[test]
    fn cooking_now_sorts_by_remaining() {
        let t = table();
        let occ = Occupancy::build(&t, &resolve(&t, at(15, 0)));
        let now = at(14, 52);
        let active = occ.cooking_now(&t, now);
        let names: Vec<_> = active.iter().map(|a| a.block.name.as_str()).collect();
        // equal remaining keeps bucket order
        assert_eq!(names, vec!["Rewarm stuffing", "Stuffing", "Beef", "Ribs"]);
        assert_eq!(active[0].remaining_secs, 180);
        assert_eq!(active[1].remaining_secs, 480);
        assert_eq!(active[2].equipment_id, "rest");
        assert_eq!(active[2].device_name, "Resting");
    }

    #[test]
    fn bounds_pad_blocks_and_deadline() {
        let t = table();
        let occ = Occupancy::build(&t, &resolve(&t, at(15, 0)));
        let b = occ.bounds(at(15, 0));
        assert_eq!(b.earliest, at(13, 5));
        assert_eq!(b.latest, at(15, 15));
    }
}
