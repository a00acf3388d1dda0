use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::records::{
    PlacementCandidate, RoomRecord, SessionRecord, SlotRecord, SpeakerRecord, TalkRecord,
    TrackRecord,
};
use crate::models::schedule::{ClockTime, ScheduledItem};
use crate::services::schedule_utils;

pub const PLACEHOLDER_PRESENTER_NAME: &str = "Unknown presenter";

/// Read side of the record store for one edition.
#[async_trait::async_trait]
pub trait ScheduleSource: Send + Sync {
    async fn load_sessions(&self, edition_id: &str) -> AppResult<Vec<SessionRecord>>;

    async fn load_slots(&self, edition_id: &str) -> AppResult<Vec<SlotRecord>>;

    async fn load_rooms(&self, edition_id: &str) -> AppResult<Vec<RoomRecord>>;

    async fn load_tracks(&self, edition_id: &str) -> AppResult<Vec<TrackRecord>>;

    async fn load_talks(&self, edition_id: &str) -> AppResult<Vec<TalkRecord>>;

    async fn load_speakers(&self, edition_id: &str) -> AppResult<Vec<SpeakerRecord>>;
}

/// All records of one edition, read at (roughly) the same moment.
#[derive(Debug, Clone, Default)]
pub struct ScheduleSnapshot {
    pub sessions: Vec<SessionRecord>,
    pub slots: Vec<SlotRecord>,
    pub rooms: Vec<RoomRecord>,
    pub tracks: Vec<TrackRecord>,
    pub talks: Vec<TalkRecord>,
    pub speakers: Vec<SpeakerRecord>,
}

#[derive(Debug, Clone, PartialEq)]
enum Unresolved {
    NoSlot,
    MissingSlot(String),
    NoRoom { slot_id: String },
    MissingRoom(String),
    InvalidDate(String),
    InvalidTime(String),
    EmptyRange { start: ClockTime, end: ClockTime },
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unresolved::NoSlot => f.write_str("session is not placed in a slot"),
            Unresolved::MissingSlot(id) => write!(f, "slot {id} does not exist"),
            Unresolved::NoRoom { slot_id } => write!(f, "slot {slot_id} has no room"),
            Unresolved::MissingRoom(id) => write!(f, "room {id} does not exist"),
            Unresolved::InvalidDate(raw) => write!(f, "invalid slot date {raw:?}"),
            Unresolved::InvalidTime(raw) => write!(f, "invalid slot time {raw:?}"),
            Unresolved::EmptyRange { start, end } => {
                write!(f, "slot ends at {end} which is not after its start {start}")
            }
        }
    }
}

struct SnapshotIndex<'a> {
    slots: HashMap<&'a str, &'a SlotRecord>,
    rooms: HashMap<&'a str, &'a RoomRecord>,
    tracks: HashMap<&'a str, &'a TrackRecord>,
    talks: HashMap<&'a str, &'a TalkRecord>,
    speakers: HashMap<&'a str, &'a SpeakerRecord>,
}

impl<'a> SnapshotIndex<'a> {
    fn new(snapshot: &'a ScheduleSnapshot) -> Self {
        Self {
            slots: snapshot.slots.iter().map(|r| (r.id.as_str(), r)).collect(),
            rooms: snapshot.rooms.iter().map(|r| (r.id.as_str(), r)).collect(),
            tracks: snapshot.tracks.iter().map(|r| (r.id.as_str(), r)).collect(),
            talks: snapshot.talks.iter().map(|r| (r.id.as_str(), r)).collect(),
            speakers: snapshot.speakers.iter().map(|r| (r.id.as_str(), r)).collect(),
        }
    }

    fn resolve(
        &self,
        session_id: &str,
        title: &str,
        slot_id: Option<&str>,
        talk_id: Option<&str>,
        track_id: Option<&str>,
    ) -> Result<ScheduledItem, Unresolved> {
        let slot_id = slot_id.ok_or(Unresolved::NoSlot)?;
        let slot = self
            .slots
            .get(slot_id)
            .ok_or_else(|| Unresolved::MissingSlot(slot_id.to_string()))?;
        let room_id = slot.room_id.as_deref().ok_or_else(|| Unresolved::NoRoom {
            slot_id: slot.id.clone(),
        })?;
        let room = self
            .rooms
            .get(room_id)
            .ok_or_else(|| Unresolved::MissingRoom(room_id.to_string()))?;

        let date = schedule_utils::parse_date(&slot.date)
            .map_err(|_| Unresolved::InvalidDate(slot.date.clone()))?;
        let start_time = schedule_utils::parse_clock_time(&slot.start_time)
            .map_err(|_| Unresolved::InvalidTime(slot.start_time.clone()))?;
        let end_time = schedule_utils::parse_clock_time(&slot.end_time)
            .map_err(|_| Unresolved::InvalidTime(slot.end_time.clone()))?;
        if end_time <= start_time {
            return Err(Unresolved::EmptyRange {
                start: start_time,
                end: end_time,
            });
        }

        let track_name = track_id.and_then(|id| self.tracks.get(id)).map(|t| t.name.clone());
        if let (Some(id), None) = (track_id, &track_name) {
            debug!(target: "app::assembly", session_id, track_id = id, "track record missing; keeping id only");
        }

        let (presenter_ids, presenter_names) = self.presenters(session_id, talk_id);

        Ok(ScheduledItem {
            id: session_id.to_string(),
            title: title.to_string(),
            placement_id: slot.id.clone(),
            room_id: room.id.clone(),
            room_name: room.name.clone(),
            track_id: track_id.map(str::to_string),
            track_name,
            date,
            start_time,
            end_time,
            presenter_ids,
            presenter_names,
        })
    }

    fn presenters(&self, session_id: &str, talk_id: Option<&str>) -> (Vec<String>, Vec<String>) {
        let Some(talk_id) = talk_id else {
            return (Vec::new(), Vec::new());
        };
        let Some(talk) = self.talks.get(talk_id) else {
            warn!(target: "app::assembly", session_id, talk_id, "linked talk missing; no presenters");
            return (Vec::new(), Vec::new());
        };

        let names = talk
            .speaker_ids
            .iter()
            .map(|speaker_id| match self.speakers.get(speaker_id.as_str()) {
                Some(speaker) => speaker.display_name.clone(),
                None => {
                    warn!(
                        target: "app::assembly",
                        session_id,
                        speaker_id = %speaker_id,
                        "speaker record missing; using placeholder name"
                    );
                    PLACEHOLDER_PRESENTER_NAME.to_string()
                }
            })
            .collect();

        (talk.speaker_ids.clone(), names)
    }
}

impl ScheduleSnapshot {
    /// Joins sessions with their slot, room, track and presenters.
    ///
    /// Sessions that cannot be placed are dropped and logged; they never
    /// surface as conflicts and never fail the scan.
    pub fn assemble_items(&self) -> Vec<ScheduledItem> {
        let index = SnapshotIndex::new(self);
        let mut dropped = 0usize;

        let items: Vec<ScheduledItem> = self
            .sessions
            .iter()
            .filter_map(|session| {
                match index.resolve(
                    &session.id,
                    &session.title,
                    session.slot_id.as_deref(),
                    session.talk_id.as_deref(),
                    session.track_id.as_deref(),
                ) {
                    Ok(item) => Some(item),
                    Err(Unresolved::NoSlot) => {
                        debug!(target: "app::assembly", session_id = %session.id, "session not placed yet");
                        None
                    }
                    Err(reason) => {
                        dropped += 1;
                        warn!(
                            target: "app::assembly",
                            session_id = %session.id,
                            %reason,
                            "dropping unresolvable session from scan"
                        );
                        None
                    }
                }
            })
            .collect();

        info!(
            target: "app::assembly",
            sessions = self.sessions.len(),
            scheduled = items.len(),
            dropped,
            "assembled scheduled items"
        );
        items
    }

    /// Builds the hypothetical item for a placement that has not been committed.
    pub fn resolve_candidate(&self, candidate: &PlacementCandidate) -> AppResult<ScheduledItem> {
        let existing = self
            .sessions
            .iter()
            .find(|session| session.id == candidate.session_id);

        let title = candidate
            .title
            .as_deref()
            .or(existing.map(|session| session.title.as_str()))
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .ok_or_else(|| {
                AppError::validation_with_details(
                    "a new session needs a title",
                    json!({"sessionId": candidate.session_id}),
                )
            })?;
        let talk_id = candidate
            .talk_id
            .as_deref()
            .or(existing.and_then(|session| session.talk_id.as_deref()));
        let track_id = candidate
            .track_id
            .as_deref()
            .or(existing.and_then(|session| session.track_id.as_deref()));

        SnapshotIndex::new(self)
            .resolve(
                &candidate.session_id,
                title,
                Some(candidate.slot_id.as_str()),
                talk_id,
                track_id,
            )
            .map_err(|reason| {
                AppError::validation_with_details(
                    "placement cannot be resolved",
                    json!({
                        "sessionId": candidate.session_id,
                        "slotId": candidate.slot_id,
                        "reason": reason.to_string(),
                    }),
                )
            })
    }
}

#[derive(Clone)]
pub struct ScheduleAssembler {
    source: Arc<dyn ScheduleSource>,
}

impl ScheduleAssembler {
    pub fn new(source: Arc<dyn ScheduleSource>) -> Self {
        Self { source }
    }

    /// Reads every collection of the edition concurrently. Any read failure is
    /// returned as-is rather than turning into an empty schedule.
    pub async fn load_snapshot(&self, edition_id: &str) -> AppResult<ScheduleSnapshot> {
        let source = self.source.as_ref();
        let (sessions, slots, rooms, tracks, talks, speakers) = tokio::try_join!(
            source.load_sessions(edition_id),
            source.load_slots(edition_id),
            source.load_rooms(edition_id),
            source.load_tracks(edition_id),
            source.load_talks(edition_id),
            source.load_speakers(edition_id),
        )?;

        debug!(
            target: "app::assembly",
            edition_id,
            sessions = sessions.len(),
            slots = slots.len(),
            rooms = rooms.len(),
            "loaded schedule snapshot"
        );

        Ok(ScheduleSnapshot {
            sessions,
            slots,
            rooms,
            tracks,
            talks,
            speakers,
        })
    }

    pub async fn assemble(&self, edition_id: &str) -> AppResult<Vec<ScheduledItem>> {
        Ok(self.load_snapshot(edition_id).await?.assemble_items())
    }
}
