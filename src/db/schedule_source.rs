use rusqlite::Connection;

use crate::db::repositories::schedule_repository::ScheduleRepository;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::records::{
    RoomRecord, SessionRecord, SlotRecord, SpeakerRecord, TalkRecord, TrackRecord,
};
use crate::services::schedule_assembly::ScheduleSource;

/// [`ScheduleSource`] over the local SQLite store.
///
/// Every read opens its own connection on the blocking pool so the six
/// collections of a snapshot can be fetched side by side.
#[derive(Clone, Debug)]
pub struct SqliteScheduleSource {
    db: DbPool,
}

impl SqliteScheduleSource {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    async fn read<T, F>(&self, edition_id: &str, query: F) -> AppResult<Vec<T>>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &str) -> AppResult<Vec<T>> + Send + 'static,
    {
        let db = self.db.clone();
        let edition_id = edition_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            query(&conn, &edition_id)
        })
        .await?
    }
}

#[async_trait::async_trait]
impl ScheduleSource for SqliteScheduleSource {
    async fn load_sessions(&self, edition_id: &str) -> AppResult<Vec<SessionRecord>> {
        self.read(edition_id, ScheduleRepository::list_sessions).await
    }

    async fn load_slots(&self, edition_id: &str) -> AppResult<Vec<SlotRecord>> {
        self.read(edition_id, ScheduleRepository::list_slots).await
    }

    async fn load_rooms(&self, edition_id: &str) -> AppResult<Vec<RoomRecord>> {
        self.read(edition_id, ScheduleRepository::list_rooms).await
    }

    async fn load_tracks(&self, edition_id: &str) -> AppResult<Vec<TrackRecord>> {
        self.read(edition_id, ScheduleRepository::list_tracks).await
    }

    async fn load_talks(&self, edition_id: &str) -> AppResult<Vec<TalkRecord>> {
        self.read(edition_id, ScheduleRepository::list_talks).await
    }

    async fn load_speakers(&self, edition_id: &str) -> AppResult<Vec<SpeakerRecord>> {
        self.read(edition_id, ScheduleRepository::list_speakers).await
    }
}
