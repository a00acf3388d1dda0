use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use confsched_app_lib::error::{AppError, AppResult};
use confsched_app_lib::models::conflict::{ConflictType, ScanOptions};
use confsched_app_lib::models::records::{
    RoomRecord, SessionRecord, SlotRecord, SpeakerRecord, TalkRecord, TrackRecord,
};
use confsched_app_lib::services::conflict_engine;
use confsched_app_lib::services::schedule_assembly::{
    ScheduleAssembler, ScheduleSnapshot, ScheduleSource, PLACEHOLDER_PRESENTER_NAME,
};

const EDITION: &str = "devconf-2024";

trait EditionScoped {
    fn edition(&self) -> &str;
}

macro_rules! edition_scoped {
    ($($record:ty),*) => {
        $(impl EditionScoped for $record {
            fn edition(&self) -> &str {
                &self.edition_id
            }
        })*
    };
}

edition_scoped!(SessionRecord, SlotRecord, RoomRecord, TrackRecord, TalkRecord, SpeakerRecord);

struct InMemorySource {
    snapshot: ScheduleSnapshot,
    fail_speakers: bool,
    reads: AtomicUsize,
}

impl InMemorySource {
    fn new(snapshot: ScheduleSnapshot) -> Self {
        Self {
            snapshot,
            fail_speakers: false,
            reads: AtomicUsize::new(0),
        }
    }

    fn filtered<T: EditionScoped + Clone>(&self, records: &[T], edition_id: &str) -> Vec<T> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        records
            .iter()
            .filter(|record| record.edition() == edition_id)
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl ScheduleSource for InMemorySource {
    async fn load_sessions(&self, edition_id: &str) -> AppResult<Vec<SessionRecord>> {
        Ok(self.filtered(&self.snapshot.sessions, edition_id))
    }

    async fn load_slots(&self, edition_id: &str) -> AppResult<Vec<SlotRecord>> {
        Ok(self.filtered(&self.snapshot.slots, edition_id))
    }

    async fn load_rooms(&self, edition_id: &str) -> AppResult<Vec<RoomRecord>> {
        Ok(self.filtered(&self.snapshot.rooms, edition_id))
    }

    async fn load_tracks(&self, edition_id: &str) -> AppResult<Vec<TrackRecord>> {
        Ok(self.filtered(&self.snapshot.tracks, edition_id))
    }

    async fn load_talks(&self, edition_id: &str) -> AppResult<Vec<TalkRecord>> {
        Ok(self.filtered(&self.snapshot.talks, edition_id))
    }

    async fn load_speakers(&self, edition_id: &str) -> AppResult<Vec<SpeakerRecord>> {
        if self.fail_speakers {
            return Err(AppError::database("speaker table unavailable"));
        }
        Ok(self.filtered(&self.snapshot.speakers, edition_id))
    }
}

fn session(id: &str, slot: Option<&str>, talk: Option<&str>, track: Option<&str>) -> SessionRecord {
    SessionRecord {
        id: id.into(),
        edition_id: EDITION.into(),
        title: format!("Session {id}"),
        slot_id: slot.map(Into::into),
        talk_id: talk.map(Into::into),
        track_id: track.map(Into::into),
    }
}

fn slot(id: &str, date: &str, start: &str, end: &str, room: Option<&str>) -> SlotRecord {
    SlotRecord {
        id: id.into(),
        edition_id: EDITION.into(),
        date: date.into(),
        start_time: start.into(),
        end_time: end.into(),
        room_id: room.map(Into::into),
    }
}

fn snapshot() -> ScheduleSnapshot {
    ScheduleSnapshot {
        sessions: vec![
            session("ok-1", Some("slot-1"), Some("talk-1"), Some("track-rust")),
            session("ok-2", Some("slot-2"), Some("talk-2"), Some("track-rust")),
            session("no-slot", None, None, None),
            session("dangling-slot", Some("slot-missing"), None, None),
            session("no-room", Some("slot-roomless"), None, None),
            session("bad-date", Some("slot-bad-date"), None, None),
            session("bad-time", Some("slot-bad-time"), None, None),
            session("empty-range", Some("slot-empty"), None, None),
            session("ghost-track", Some("slot-3"), None, Some("track-gone")),
        ],
        slots: vec![
            slot("slot-1", "2024-10-03", "09:00", "10:00", Some("hall")),
            slot("slot-2", "2024-10-03", "09:30", "10:30", Some("annex")),
            slot("slot-3", "2024-10-03", "13:00", "14:00", Some("hall")),
            slot("slot-roomless", "2024-10-03", "09:00", "10:00", None),
            slot("slot-bad-date", "03/10/2024", "09:00", "10:00", Some("hall")),
            slot("slot-bad-time", "2024-10-03", "9:00", "10:00", Some("hall")),
            slot("slot-empty", "2024-10-03", "11:00", "11:00", Some("hall")),
        ],
        rooms: vec![
            RoomRecord {
                id: "hall".into(),
                edition_id: EDITION.into(),
                name: "Main Hall".into(),
            },
            RoomRecord {
                id: "annex".into(),
                edition_id: EDITION.into(),
                name: "Annex".into(),
            },
        ],
        tracks: vec![TrackRecord {
            id: "track-rust".into(),
            edition_id: EDITION.into(),
            name: "Rust".into(),
        }],
        talks: vec![
            TalkRecord {
                id: "talk-1".into(),
                edition_id: EDITION.into(),
                title: "Ownership in practice".into(),
                speaker_ids: vec!["sp-ana".into()],
            },
            TalkRecord {
                id: "talk-2".into(),
                edition_id: EDITION.into(),
                title: "Async all the way".into(),
                speaker_ids: vec!["sp-bo".into(), "sp-ana".into(), "sp-deleted".into()],
            },
        ],
        speakers: vec![
            SpeakerRecord {
                id: "sp-ana".into(),
                edition_id: EDITION.into(),
                display_name: "Ana".into(),
            },
            SpeakerRecord {
                id: "sp-bo".into(),
                edition_id: EDITION.into(),
                display_name: "Bo".into(),
            },
        ],
    }
}

#[tokio::test]
async fn unresolvable_sessions_are_dropped_not_failed() -> AppResult<()> {
    let source = Arc::new(InMemorySource::new(snapshot()));
    let assembler = ScheduleAssembler::new(source.clone());

    let items = assembler.assemble(EDITION).await?;

    let ids: Vec<&str> = items.iter().map(|item| item.id.as_str()).collect();
    assert_eq!(ids, vec!["ok-1", "ok-2", "ghost-track"]);
    assert_eq!(source.reads.load(Ordering::SeqCst), 6);

    let ghost = items.iter().find(|item| item.id == "ghost-track").expect("kept");
    assert_eq!(ghost.track_id.as_deref(), Some("track-gone"));
    assert_eq!(ghost.track_name, None);
    assert!(ghost.presenter_ids.is_empty());

    let second = items.iter().find(|item| item.id == "ok-2").expect("kept");
    assert_eq!(second.primary_presenter(), Some("sp-bo"));
    assert_eq!(
        second.presenter_names,
        vec![
            "Bo".to_string(),
            "Ana".to_string(),
            PLACEHOLDER_PRESENTER_NAME.to_string()
        ]
    );
    Ok(())
}

#[tokio::test]
async fn assembled_items_feed_the_engine() -> AppResult<()> {
    let assembler = ScheduleAssembler::new(Arc::new(InMemorySource::new(snapshot())));
    let items = assembler.assemble(EDITION).await?;

    let result = conflict_engine::scan(&items, &ScanOptions::default());

    // Ana is primary in ok-1 and co-presenter in ok-2; the Rust track is split.
    assert_eq!(result.total_conflicts, 2);
    assert_eq!(result.conflicts_by_type[&ConflictType::PresenterDoubleBooked].len(), 1);
    assert_eq!(result.conflicts_by_type[&ConflictType::TrackMultipleRooms].len(), 1);
    assert!(result.conflicts[0].message.contains("Ana"));
    Ok(())
}

#[tokio::test]
async fn other_editions_are_invisible() -> AppResult<()> {
    let assembler = ScheduleAssembler::new(Arc::new(InMemorySource::new(snapshot())));

    let items = assembler.assemble("another-edition").await?;

    assert!(items.is_empty());
    Ok(())
}

#[tokio::test]
async fn read_failures_propagate_instead_of_returning_empty() {
    let mut source = InMemorySource::new(snapshot());
    source.fail_speakers = true;
    let assembler = ScheduleAssembler::new(Arc::new(source));

    let err = assembler
        .assemble(EDITION)
        .await
        .expect_err("speaker read fails");

    assert!(matches!(err, AppError::Database { .. }));
}
