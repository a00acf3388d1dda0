use std::collections::HashMap;

use rusqlite::{named_params, Connection, Row};

use crate::error::{AppError, AppResult};
use crate::models::records::{
    RoomRecord, SessionRecord, SlotRecord, SpeakerRecord, TalkRecord, TrackRecord,
};

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<SessionRecord> {
    Ok(SessionRecord {
        id: row.get("id")?,
        edition_id: row.get("edition_id")?,
        title: row.get("title")?,
        slot_id: row.get("slot_id")?,
        talk_id: row.get("talk_id")?,
        track_id: row.get("track_id")?,
    })
}

fn slot_from_row(row: &Row<'_>) -> rusqlite::Result<SlotRecord> {
    Ok(SlotRecord {
        id: row.get("id")?,
        edition_id: row.get("edition_id")?,
        date: row.get("date")?,
        start_time: row.get("start_time")?,
        end_time: row.get("end_time")?,
        room_id: row.get("room_id")?,
    })
}

fn room_from_row(row: &Row<'_>) -> rusqlite::Result<RoomRecord> {
    Ok(RoomRecord {
        id: row.get("id")?,
        edition_id: row.get("edition_id")?,
        name: row.get("name")?,
    })
}

fn track_from_row(row: &Row<'_>) -> rusqlite::Result<TrackRecord> {
    Ok(TrackRecord {
        id: row.get("id")?,
        edition_id: row.get("edition_id")?,
        name: row.get("name")?,
    })
}

fn speaker_from_row(row: &Row<'_>) -> rusqlite::Result<SpeakerRecord> {
    Ok(SpeakerRecord {
        id: row.get("id")?,
        edition_id: row.get("edition_id")?,
        display_name: row.get("display_name")?,
    })
}

/// Queries over the schedule tables. Writes exist for seeding and tests; the
/// CRUD surface with its validation lives elsewhere.
pub struct ScheduleRepository;

impl ScheduleRepository {
    pub fn insert_room(conn: &Connection, record: &RoomRecord) -> AppResult<()> {
        conn.execute(
            "INSERT INTO rooms (id, edition_id, name) VALUES (:id, :edition_id, :name)",
            named_params! {
                ":id": &record.id,
                ":edition_id": &record.edition_id,
                ":name": &record.name,
            },
        )?;
        Ok(())
    }

    pub fn insert_track(conn: &Connection, record: &TrackRecord) -> AppResult<()> {
        conn.execute(
            "INSERT INTO tracks (id, edition_id, name) VALUES (:id, :edition_id, :name)",
            named_params! {
                ":id": &record.id,
                ":edition_id": &record.edition_id,
                ":name": &record.name,
            },
        )?;
        Ok(())
    }

    pub fn insert_speaker(conn: &Connection, record: &SpeakerRecord) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO speakers (id, edition_id, display_name)
                VALUES (:id, :edition_id, :display_name)
            "#,
            named_params! {
                ":id": &record.id,
                ":edition_id": &record.edition_id,
                ":display_name": &record.display_name,
            },
        )?;
        Ok(())
    }

    pub fn insert_talk(conn: &Connection, record: &TalkRecord) -> AppResult<()> {
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO talks (id, edition_id, title) VALUES (:id, :edition_id, :title)",
            named_params! {
                ":id": &record.id,
                ":edition_id": &record.edition_id,
                ":title": &record.title,
            },
        )?;
        for (position, speaker_id) in record.speaker_ids.iter().enumerate() {
            tx.execute(
                r#"
                    INSERT INTO talk_speakers (talk_id, speaker_id, position)
                    VALUES (:talk_id, :speaker_id, :position)
                "#,
                named_params! {
                    ":talk_id": &record.id,
                    ":speaker_id": speaker_id,
                    ":position": position as i64,
                },
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn insert_slot(conn: &Connection, record: &SlotRecord) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO slots (id, edition_id, date, start_time, end_time, room_id)
                VALUES (:id, :edition_id, :date, :start_time, :end_time, :room_id)
            "#,
            named_params! {
                ":id": &record.id,
                ":edition_id": &record.edition_id,
                ":date": &record.date,
                ":start_time": &record.start_time,
                ":end_time": &record.end_time,
                ":room_id": &record.room_id,
            },
        )?;
        Ok(())
    }

    pub fn insert_session(conn: &Connection, record: &SessionRecord) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO schedule_sessions (id, edition_id, title, slot_id, talk_id, track_id)
                VALUES (:id, :edition_id, :title, :slot_id, :talk_id, :track_id)
            "#,
            named_params! {
                ":id": &record.id,
                ":edition_id": &record.edition_id,
                ":title": &record.title,
                ":slot_id": &record.slot_id,
                ":talk_id": &record.talk_id,
                ":track_id": &record.track_id,
            },
        )?;
        Ok(())
    }

    pub fn assign_slot(conn: &Connection, session_id: &str, slot_id: Option<&str>) -> AppResult<()> {
        let affected = conn.execute(
            "UPDATE schedule_sessions SET slot_id = ?1 WHERE id = ?2",
            (slot_id, session_id),
        )?;
        if affected == 0 {
            return Err(AppError::not_found());
        }
        Ok(())
    }

    pub fn list_sessions(conn: &Connection, edition_id: &str) -> AppResult<Vec<SessionRecord>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT id, edition_id, title, slot_id, talk_id, track_id
            FROM schedule_sessions
            WHERE edition_id = ?1
            ORDER BY id
        "#,
        )?;
        let rows = stmt
            .query_map([edition_id], session_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn list_slots(conn: &Connection, edition_id: &str) -> AppResult<Vec<SlotRecord>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT id, edition_id, date, start_time, end_time, room_id
            FROM slots
            WHERE edition_id = ?1
            ORDER BY date, start_time, id
        "#,
        )?;
        let rows = stmt
            .query_map([edition_id], slot_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn list_rooms(conn: &Connection, edition_id: &str) -> AppResult<Vec<RoomRecord>> {
        let mut stmt =
            conn.prepare("SELECT id, edition_id, name FROM rooms WHERE edition_id = ?1 ORDER BY id")?;
        let rows = stmt
            .query_map([edition_id], room_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn list_tracks(conn: &Connection, edition_id: &str) -> AppResult<Vec<TrackRecord>> {
        let mut stmt =
            conn.prepare("SELECT id, edition_id, name FROM tracks WHERE edition_id = ?1 ORDER BY id")?;
        let rows = stmt
            .query_map([edition_id], track_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn list_speakers(conn: &Connection, edition_id: &str) -> AppResult<Vec<SpeakerRecord>> {
        let mut stmt = conn.prepare(
            "SELECT id, edition_id, display_name FROM speakers WHERE edition_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map([edition_id], speaker_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Talks with their speakers in presentation order.
    pub fn list_talks(conn: &Connection, edition_id: &str) -> AppResult<Vec<TalkRecord>> {
        let mut stmt = conn.prepare(
            "SELECT id, edition_id, title FROM talks WHERE edition_id = ?1 ORDER BY id",
        )?;
        let mut talks = stmt
            .query_map([edition_id], |row| {
                Ok(TalkRecord {
                    id: row.get("id")?,
                    edition_id: row.get("edition_id")?,
                    title: row.get("title")?,
                    speaker_ids: Vec::new(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut speaker_stmt = conn.prepare(
            r#"
            SELECT ts.talk_id, ts.speaker_id
            FROM talk_speakers ts
            JOIN talks t ON t.id = ts.talk_id
            WHERE t.edition_id = ?1
            ORDER BY ts.talk_id, ts.position
        "#,
        )?;
        let links = speaker_stmt
            .query_map([edition_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut by_talk: HashMap<String, Vec<String>> = HashMap::new();
        for (talk_id, speaker_id) in links {
            by_talk.entry(talk_id).or_default().push(speaker_id);
        }
        for talk in &mut talks {
            if let Some(speakers) = by_talk.remove(&talk.id) {
                talk.speaker_ids = speakers;
            }
        }

        Ok(talks)
    }
}
