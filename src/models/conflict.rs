use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::schedule::ClockTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    PresenterDoubleBooked,
    CoPresenterDoubleBooked,
    RoomDoubleBooked,
    TrackMultipleRooms,
}

impl ConflictType {
    pub const ALL: [ConflictType; 4] = [
        ConflictType::PresenterDoubleBooked,
        ConflictType::CoPresenterDoubleBooked,
        ConflictType::RoomDoubleBooked,
        ConflictType::TrackMultipleRooms,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConflictType::PresenterDoubleBooked => "presenter_double_booked",
            ConflictType::CoPresenterDoubleBooked => "co_presenter_double_booked",
            ConflictType::RoomDoubleBooked => "room_double_booked",
            ConflictType::TrackMultipleRooms => "track_multiple_rooms",
        }
    }

    pub fn severity(self) -> ConflictSeverity {
        match self {
            ConflictType::PresenterDoubleBooked
            | ConflictType::CoPresenterDoubleBooked
            | ConflictType::RoomDoubleBooked => ConflictSeverity::Error,
            ConflictType::TrackMultipleRooms => ConflictSeverity::Warning,
        }
    }

    pub fn entity_type(self) -> EntityType {
        match self {
            ConflictType::PresenterDoubleBooked | ConflictType::CoPresenterDoubleBooked => {
                EntityType::Presenter
            }
            ConflictType::RoomDoubleBooked => EntityType::Room,
            ConflictType::TrackMultipleRooms => EntityType::Track,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConflictType::PresenterDoubleBooked => "Presenter double-booked",
            ConflictType::CoPresenterDoubleBooked => "Co-presenter double-booked",
            ConflictType::RoomDoubleBooked => "Room double-booked",
            ConflictType::TrackMultipleRooms => "Track in multiple rooms",
        }
    }

    pub fn is_presenter_type(self) -> bool {
        self.entity_type() == EntityType::Presenter
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    Error,
    Warning,
}

impl ConflictSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictSeverity::Error => "error",
            ConflictSeverity::Warning => "warning",
        }
    }

    /// Only errors keep a schedule from being published.
    pub fn is_blocking(self) -> bool {
        matches!(self, ConflictSeverity::Error)
    }

    pub fn color(self) -> &'static str {
        match self {
            ConflictSeverity::Error => "red",
            ConflictSeverity::Warning => "orange",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Presenter,
    Room,
    Track,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: ClockTime,
    pub end: ClockTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub id: String,
    #[serde(rename = "type")]
    pub conflict_type: ConflictType,
    pub severity: ConflictSeverity,
    pub session_ids: Vec<String>,
    pub entity_id: String,
    pub entity_type: EntityType,
    pub message: String,
    pub date: NaiveDate,
    pub time_range: TimeRange,
    #[serde(default)]
    pub resolved: bool,
}

impl Conflict {
    pub fn involves_session(&self, session_id: &str) -> bool {
        self.session_ids.iter().any(|id| id == session_id)
    }

    pub fn is_blocking(&self) -> bool {
        self.severity.is_blocking()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanOptions {
    pub check_presenters: bool,
    pub check_rooms: bool,
    pub check_tracks: bool,
    /// Hide conflicts that have a forced-conflict record in the edition's store.
    pub ignore_forced: bool,
    pub max_comparisons: Option<u64>,
    pub time_limit_ms: Option<u64>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            check_presenters: true,
            check_rooms: true,
            check_tracks: true,
            ignore_forced: false,
            max_comparisons: None,
            time_limit_ms: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConflictScanResult {
    pub has_conflicts: bool,
    pub has_blocking_conflicts: bool,
    pub total_conflicts: usize,
    pub conflicts: Vec<Conflict>,
    pub conflicts_by_type: BTreeMap<ConflictType, Vec<Conflict>>,
    pub affected_sessions: BTreeSet<String>,
    pub affected_presenters: BTreeSet<String>,
    #[serde(default)]
    pub forced_conflicts: Vec<Conflict>,
    /// Set when a scan budget cut a detector short.
    #[serde(default)]
    pub incomplete: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConflictSummary {
    pub total: usize,
    pub blocking: usize,
    pub warnings: usize,
    pub forced: usize,
    pub by_type: BTreeMap<ConflictType, usize>,
    pub affected_sessions: usize,
    pub affected_presenters: usize,
    pub can_publish: bool,
    pub incomplete: bool,
}
