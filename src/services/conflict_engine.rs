use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::{info, warn};

use crate::models::conflict::{
    Conflict, ConflictScanResult, ConflictSeverity, ConflictSummary, ConflictType, ScanOptions,
};
use crate::models::schedule::ScheduledItem;
use crate::services::conflict_detector::{
    detect_presenter_conflicts, detect_room_conflicts, detect_track_conflicts, ScanBudget,
};

/// Runs the enabled detectors over one edition's items.
///
/// Budgets in `options` are honored; a truncated scan comes back with
/// `incomplete` set instead of failing.
pub fn scan(items: &[ScheduledItem], options: &ScanOptions) -> ConflictScanResult {
    let mut budget = ScanBudget::from_options(options);
    scan_with_budget(items, options, &mut budget)
}

pub fn scan_with_budget(
    items: &[ScheduledItem],
    options: &ScanOptions,
    budget: &mut ScanBudget,
) -> ConflictScanResult {
    let mut conflicts = Vec::new();

    if options.check_presenters {
        conflicts.extend(detect_presenter_conflicts(items, budget));
    }
    if options.check_rooms {
        conflicts.extend(detect_room_conflicts(items, budget));
    }
    if options.check_tracks {
        conflicts.extend(detect_track_conflicts(items, budget));
    }

    let incomplete = budget.is_exhausted();
    if incomplete {
        warn!(
            target: "app::conflict",
            items = items.len(),
            comparisons = budget.comparisons(),
            "scan budget exhausted; result is incomplete"
        );
    }

    let result = build_result(conflicts, incomplete);
    info!(
        target: "app::conflict",
        items = items.len(),
        total = result.total_conflicts,
        blocking = result.has_blocking_conflicts,
        "conflict scan finished"
    );
    result
}

pub fn build_result(conflicts: Vec<Conflict>, incomplete: bool) -> ConflictScanResult {
    let mut conflicts_by_type: BTreeMap<ConflictType, Vec<Conflict>> = ConflictType::ALL
        .iter()
        .map(|conflict_type| (*conflict_type, Vec::new()))
        .collect();
    let mut affected_sessions = BTreeSet::new();
    let mut affected_presenters = BTreeSet::new();

    for conflict in &conflicts {
        conflicts_by_type
            .entry(conflict.conflict_type)
            .or_default()
            .push(conflict.clone());
        affected_sessions.extend(conflict.session_ids.iter().cloned());
        if conflict.conflict_type.is_presenter_type() {
            affected_presenters.insert(conflict.entity_id.clone());
        }
    }

    ConflictScanResult {
        has_conflicts: !conflicts.is_empty(),
        has_blocking_conflicts: conflicts.iter().any(Conflict::is_blocking),
        total_conflicts: conflicts.len(),
        conflicts,
        conflicts_by_type,
        affected_sessions,
        affected_presenters,
        forced_conflicts: Vec::new(),
        incomplete,
    }
}

/// What-if check: would placing `candidate` introduce a collision?
///
/// Any existing item with the candidate's id is replaced, so moving a session
/// re-validates it against everything else. Only conflicts involving the
/// candidate are returned.
pub fn check_placement(
    current_items: &[ScheduledItem],
    candidate: &ScheduledItem,
) -> ConflictScanResult {
    check_placement_with_options(current_items, candidate, &ScanOptions::default())
}

pub fn check_placement_with_options(
    current_items: &[ScheduledItem],
    candidate: &ScheduledItem,
    options: &ScanOptions,
) -> ConflictScanResult {
    let mut all_items: Vec<ScheduledItem> = current_items
        .iter()
        .filter(|item| item.id != candidate.id)
        .cloned()
        .collect();
    all_items.push(candidate.clone());

    let full = scan(&all_items, options);
    let involving: Vec<Conflict> = full
        .conflicts
        .into_iter()
        .filter(|conflict| conflict.involves_session(&candidate.id))
        .collect();

    build_result(involving, full.incomplete)
}

/// Errors block publishing, warnings never do. An incomplete scan cannot
/// vouch for the schedule either.
pub fn can_publish(result: &ConflictScanResult) -> bool {
    !result.has_blocking_conflicts && !result.incomplete
}

pub fn conflicts_for_session<'a>(
    session_id: &str,
    result: &'a ConflictScanResult,
) -> Vec<&'a Conflict> {
    result
        .conflicts
        .iter()
        .filter(|conflict| conflict.involves_session(session_id))
        .collect()
}

pub fn conflicts_for_presenter<'a>(
    presenter_id: &str,
    result: &'a ConflictScanResult,
) -> Vec<&'a Conflict> {
    result
        .conflicts
        .iter()
        .filter(|conflict| {
            conflict.conflict_type.is_presenter_type() && conflict.entity_id == presenter_id
        })
        .collect()
}

/// Hides conflicts an organizer has accepted.
///
/// Matching conflicts move to `forced_conflicts` with `resolved` set and the
/// aggregate is rebuilt from what remains.
pub fn exclude_forced(result: ConflictScanResult, forced_ids: &HashSet<String>) -> ConflictScanResult {
    if forced_ids.is_empty() {
        return result;
    }

    let incomplete = result.incomplete;
    let mut forced = result.forced_conflicts;
    let mut remaining = Vec::with_capacity(result.conflicts.len());
    for mut conflict in result.conflicts {
        if forced_ids.contains(&conflict.id) {
            conflict.resolved = true;
            forced.push(conflict);
        } else {
            remaining.push(conflict);
        }
    }

    let mut rebuilt = build_result(remaining, incomplete);
    rebuilt.forced_conflicts = forced;
    rebuilt
}

pub fn summarize(result: &ConflictScanResult) -> ConflictSummary {
    let by_type = ConflictType::ALL
        .iter()
        .map(|conflict_type| {
            let count = result
                .conflicts_by_type
                .get(conflict_type)
                .map_or(0, Vec::len);
            (*conflict_type, count)
        })
        .collect();
    let blocking = result
        .conflicts
        .iter()
        .filter(|conflict| conflict.severity == ConflictSeverity::Error)
        .count();

    let warnings = result
        .conflicts
        .iter()
        .filter(|conflict| conflict.severity == ConflictSeverity::Warning)
        .count();

    ConflictSummary {
        total: result.total_conflicts,
        blocking,
        warnings,
        forced: result.forced_conflicts.len(),
        by_type,
        affected_sessions: result.affected_sessions.len(),
        affected_presenters: result.affected_presenters.len(),
        can_publish: can_publish(result),
        incomplete: result.incomplete,
    }
}
