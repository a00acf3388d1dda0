use std::collections::HashSet;
use std::time::{Duration, Instant};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::models::conflict::{Conflict, ConflictType, ScanOptions, TimeRange};
use crate::models::schedule::ScheduledItem;
use crate::services::schedule_utils;

const CONFLICT_ID_PREFIX: &str = "conflict_";
const CONFLICT_ID_DIGEST_BYTES: usize = 12;

/// Stable identity for a collision, independent of the order it was discovered in.
pub fn conflict_id(conflict_type: ConflictType, entity_id: &str, session_ids: &[String]) -> String {
    let mut sorted: Vec<&str> = session_ids.iter().map(String::as_str).collect();
    sorted.sort_unstable();

    let mut hasher = Sha256::new();
    hasher.update(conflict_type.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(entity_id.as_bytes());
    hasher.update(b"|");
    hasher.update(sorted.join(",").as_bytes());
    let digest = hasher.finalize();

    format!(
        "{CONFLICT_ID_PREFIX}{}",
        URL_SAFE_NO_PAD.encode(&digest[..CONFLICT_ID_DIGEST_BYTES])
    )
}

/// Cooperative limit on the pairwise work of one scan.
///
/// Checked at the top of every outer detector loop; once exhausted the
/// detectors return what they have found so far.
#[derive(Debug, Clone)]
pub struct ScanBudget {
    max_comparisons: Option<u64>,
    deadline: Option<Instant>,
    comparisons: u64,
    exhausted: bool,
}

impl ScanBudget {
    pub fn unlimited() -> Self {
        Self::new(None, None)
    }

    pub fn new(max_comparisons: Option<u64>, time_limit: Option<Duration>) -> Self {
        Self {
            max_comparisons,
            deadline: time_limit.map(|limit| Instant::now() + limit),
            comparisons: 0,
            exhausted: false,
        }
    }

    pub fn from_options(options: &ScanOptions) -> Self {
        Self::new(
            options.max_comparisons,
            options.time_limit_ms.map(Duration::from_millis),
        )
    }

    pub fn comparisons(&self) -> u64 {
        self.comparisons
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn should_stop(&mut self) -> bool {
        if self.exhausted {
            return true;
        }
        let over_count = self
            .max_comparisons
            .is_some_and(|limit| self.comparisons >= limit);
        let over_time = self
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline);
        if over_count || over_time {
            self.exhausted = true;
        }
        self.exhausted
    }

    fn record(&mut self, comparisons: u64) {
        self.comparisons = self.comparisons.saturating_add(comparisons);
    }
}

impl Default for ScanBudget {
    fn default() -> Self {
        Self::unlimited()
    }
}

fn for_each_overlapping_pair<'a, F>(items: &'a [ScheduledItem], budget: &mut ScanBudget, mut visit: F)
where
    F: FnMut(&'a ScheduledItem, &'a ScheduledItem, TimeRange),
{
    for (index, a) in items.iter().enumerate() {
        let rest = &items[index + 1..];
        if rest.is_empty() {
            break;
        }
        if budget.should_stop() {
            return;
        }
        budget.record(rest.len() as u64);
        for b in rest {
            if let Some(range) = schedule_utils::item_overlap_range(a, b) {
                visit(a, b, range);
            }
        }
    }
}

fn build_conflict(
    conflict_type: ConflictType,
    entity_id: &str,
    a: &ScheduledItem,
    b: &ScheduledItem,
    time_range: TimeRange,
    message: String,
) -> Conflict {
    let session_ids = vec![a.id.clone(), b.id.clone()];
    Conflict {
        id: conflict_id(conflict_type, entity_id, &session_ids),
        conflict_type,
        severity: conflict_type.severity(),
        session_ids,
        entity_id: entity_id.to_string(),
        entity_type: conflict_type.entity_type(),
        message,
        date: a.date,
        time_range,
        resolved: false,
    }
}

fn describe_window(item: &ScheduledItem, range: &TimeRange) -> String {
    format!("on {} ({}-{})", item.date, range.start, range.end)
}

/// One conflict per presenter shared by an overlapping pair.
///
/// Being primary in either item makes it a presenter conflict; only a
/// presenter who is a co-presenter in both items yields a co-presenter conflict.
pub fn detect_presenter_conflicts(items: &[ScheduledItem], budget: &mut ScanBudget) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for_each_overlapping_pair(items, budget, |a, b, range| {
        let mut seen: HashSet<&str> = HashSet::new();
        for presenter_id in &a.presenter_ids {
            let presenter_id = presenter_id.as_str();
            if !seen.insert(presenter_id) || !b.has_presenter(presenter_id) {
                continue;
            }

            let is_primary = a.primary_presenter() == Some(presenter_id)
                || b.primary_presenter() == Some(presenter_id);
            let name = a.presenter_name(presenter_id);
            let (conflict_type, message) = if is_primary {
                (
                    ConflictType::PresenterDoubleBooked,
                    format!(
                        "{name} is presenting \"{}\" and \"{}\" at the same time {}",
                        a.title,
                        b.title,
                        describe_window(a, &range)
                    ),
                )
            } else {
                (
                    ConflictType::CoPresenterDoubleBooked,
                    format!(
                        "Co-presenter {name} is booked for \"{}\" and \"{}\" at the same time {}",
                        a.title,
                        b.title,
                        describe_window(a, &range)
                    ),
                )
            };

            conflicts.push(build_conflict(conflict_type, presenter_id, a, b, range, message));
        }
    });

    debug!(target: "app::conflict", count = conflicts.len(), "presenter detector finished");
    conflicts
}

pub fn detect_room_conflicts(items: &[ScheduledItem], budget: &mut ScanBudget) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for_each_overlapping_pair(items, budget, |a, b, range| {
        if a.room_id != b.room_id {
            return;
        }
        let message = format!(
            "{} hosts \"{}\" and \"{}\" at the same time {}",
            a.room_name,
            a.title,
            b.title,
            describe_window(a, &range)
        );
        conflicts.push(build_conflict(
            ConflictType::RoomDoubleBooked,
            &a.room_id,
            a,
            b,
            range,
            message,
        ));
    });

    debug!(target: "app::conflict", count = conflicts.len(), "room detector finished");
    conflicts
}

/// Same track in two different rooms at once. Same track in the same room is left
/// to the room detector.
pub fn detect_track_conflicts(items: &[ScheduledItem], budget: &mut ScanBudget) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for_each_overlapping_pair(items, budget, |a, b, range| {
        let (Some(track_a), Some(track_b)) = (a.track_id.as_deref(), b.track_id.as_deref()) else {
            return;
        };
        if track_a != track_b || a.room_id == b.room_id {
            return;
        }
        let track_label = a
            .track_name
            .as_deref()
            .or(b.track_name.as_deref())
            .unwrap_or(track_a);
        let message = format!(
            "Track {track_label} runs in {} and {} at the same time {}",
            a.room_name,
            b.room_name,
            describe_window(a, &range)
        );
        conflicts.push(build_conflict(
            ConflictType::TrackMultipleRooms,
            track_a,
            a,
            b,
            range,
            message,
        ));
    });

    debug!(target: "app::conflict", count = conflicts.len(), "track detector finished");
    conflicts
}
