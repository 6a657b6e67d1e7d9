//! Lane assignment for concurrent blocks on one device.
//!
//! Blocks that overlap, directly or through a chain of overlaps, form one
//! group and share a lane count. Inside a group, members are placed
//! first-fit in `(start, tiebreak)` order.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Anything with a half-open `[start, end)` time range.
pub trait Span {
    fn start(&self) -> DateTime<Utc>;
    fn end(&self) -> DateTime<Utc>;
    /// Orders members that start at the same instant.
    fn tiebreak(&self) -> &str;
}

/// Half-open overlap; touching endpoints do not overlap.
pub fn spans_overlap<A: Span + ?Sized, B: Span + ?Sized>(a: &A, b: &B) -> bool {
    a.start() < b.end() && b.start() < a.end()
}

/// Position of one block within its overlap group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneAssignment {
    pub lane_index: usize,
    pub lane_count: usize,
}

impl LaneAssignment {
    pub const SOLO: Self = Self {
        lane_index: 0,
        lane_count: 1,
    };
}

/// Assign a lane to each item. The result is in input order.
pub fn assign_lanes<T: Span>(items: &[T]) -> Vec<LaneAssignment> {
    let n = items.len();
    let mut parent: Vec<usize> = (0..n).collect();
    for i in 0..n {
        for j in (i + 1)..n {
            if spans_overlap(&items[i], &items[j]) {
                union(&mut parent, i, j);
            }
        }
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        items[a]
            .start()
            .cmp(&items[b].start())
            .then_with(|| items[a].tiebreak().cmp(items[b].tiebreak()))
            .then(a.cmp(&b))
    });

    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for &i in &order {
        let root = find(&mut parent, i);
        groups.entry(root).or_default().push(i);
    }

    let mut out = vec![LaneAssignment::SOLO; n];
    for members in groups.values() {
        let mut lanes: Vec<Vec<usize>> = Vec::new();
        for &i in members {
            let free = lanes
                .iter()
                .position(|lane| lane.iter().all(|&j| !spans_overlap(&items[i], &items[j])));
            let lane = match free {
                Some(lane) => lane,
                None => {
                    lanes.push(Vec::new());
                    lanes.len() - 1
                }
            };
            lanes[lane].push(i);
            out[i].lane_index = lane;
        }
        for &i in members {
            out[i].lane_count = lanes.len();
        }
    }
    out
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let (ra, rb) = (find(parent, a), find(parent, b));
    if ra != rb {
        parent[ra.max(rb)] = ra.min(rb);
    }
}
