use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::repositories::forced_conflict_repository::{
    ForcedConflictRepository, ForcedConflictRow,
};
use crate::db::schedule_source::SqliteScheduleSource;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::conflict::{Conflict, ConflictScanResult, ConflictSummary, ScanOptions};
use crate::models::forced_conflict::{ForceConflictInput, ForcedConflictRecord};
use crate::models::records::PlacementCandidate;
use crate::models::settings::EngineConfig;
use crate::services::conflict_engine;
use crate::services::schedule_assembly::{ScheduleAssembler, ScheduleSource};

/// Edition-level entry point: loads the schedule, runs the engine and applies
/// the organizer's forced-conflict decisions.
#[derive(Clone)]
pub struct ConflictService {
    assembler: ScheduleAssembler,
    db: DbPool,
    config: EngineConfig,
}

impl ConflictService {
    pub fn new(db: DbPool, config: EngineConfig) -> Self {
        let source: Arc<dyn ScheduleSource> = Arc::new(SqliteScheduleSource::new(db.clone()));
        Self::with_source(db, source, config)
    }

    /// Reads schedule records from `source`; forced conflicts still live in `db`.
    pub fn with_source(db: DbPool, source: Arc<dyn ScheduleSource>, config: EngineConfig) -> Self {
        Self {
            assembler: ScheduleAssembler::new(source),
            db,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn scan_edition(
        &self,
        edition_id: &str,
        options: Option<ScanOptions>,
    ) -> AppResult<ConflictScanResult> {
        let edition_id = normalize_id(edition_id, "editionId")?;
        let options = self.config.resolve_options(options);
        let items = self.assembler.assemble(&edition_id).await?;

        let result = conflict_engine::scan(&items, &options);
        if !options.ignore_forced {
            return Ok(result);
        }

        let forced_ids = self.forced_ids(&edition_id).await?;
        let filtered = conflict_engine::exclude_forced(result, &forced_ids);
        debug!(
            target: "app::conflict",
            edition_id = %edition_id,
            forced = filtered.forced_conflicts.len(),
            remaining = filtered.total_conflicts,
            "forced conflicts hidden from scan"
        );
        Ok(filtered)
    }

    pub async fn validate_placement(
        &self,
        edition_id: &str,
        mut candidate: PlacementCandidate,
    ) -> AppResult<ConflictScanResult> {
        let edition_id = normalize_id(edition_id, "editionId")?;
        candidate.session_id = normalize_id(&candidate.session_id, "sessionId")?;
        candidate.slot_id = normalize_id(&candidate.slot_id, "slotId")?;

        let snapshot = self.assembler.load_snapshot(&edition_id).await?;
        let current = snapshot.assemble_items();
        let item = snapshot.resolve_candidate(&candidate)?;

        let options = self.config.scan_options();
        let mut result = conflict_engine::check_placement_with_options(&current, &item, &options);
        if options.ignore_forced {
            let forced_ids = self.forced_ids(&edition_id).await?;
            result = conflict_engine::exclude_forced(result, &forced_ids);
        }

        info!(
            target: "app::conflict",
            edition_id = %edition_id,
            session_id = %item.id,
            slot_id = %item.placement_id,
            conflicts = result.total_conflicts,
            "placement validated"
        );
        Ok(result)
    }

    pub async fn conflict_summary(&self, edition_id: &str) -> AppResult<ConflictSummary> {
        let result = self.scan_edition(edition_id, None).await?;
        Ok(conflict_engine::summarize(&result))
    }

    pub async fn can_publish_edition(&self, edition_id: &str) -> AppResult<bool> {
        let result = self.scan_edition(edition_id, None).await?;
        Ok(conflict_engine::can_publish(&result))
    }

    pub async fn conflicts_for_session(
        &self,
        edition_id: &str,
        session_id: &str,
    ) -> AppResult<Vec<Conflict>> {
        let result = self.scan_edition(edition_id, None).await?;
        Ok(conflict_engine::conflicts_for_session(session_id, &result)
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn conflicts_for_presenter(
        &self,
        edition_id: &str,
        presenter_id: &str,
    ) -> AppResult<Vec<Conflict>> {
        let result = self.scan_edition(edition_id, None).await?;
        Ok(conflict_engine::conflicts_for_presenter(presenter_id, &result)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Records that an organizer accepts `conflict_id`. Forcing the same id
    /// twice in one edition is a conflict error.
    pub async fn force_conflict(&self, input: ForceConflictInput) -> AppResult<ForcedConflictRecord> {
        let edition_id = normalize_id(&input.edition_id, "editionId")?;
        let conflict_id = normalize_id(&input.conflict_id, "conflictId")?;
        let forced_by = normalize_id(&input.forced_by, "forcedBy")?;
        let reason = input
            .reason
            .map(|reason| reason.trim().to_string())
            .filter(|reason| !reason.is_empty());

        let record = ForcedConflictRecord {
            id: Uuid::new_v4().to_string(),
            edition_id,
            conflict_id,
            forced_by,
            forced_at: Utc::now().to_rfc3339(),
            reason,
        };

        let db = self.db.clone();
        let row = ForcedConflictRow::from_record(&record);
        tokio::task::spawn_blocking(move || {
            db.with_connection(|conn| ForcedConflictRepository::insert(conn, &row))
        })
        .await??;

        info!(
            target: "app::conflict",
            edition_id = %record.edition_id,
            conflict_id = %record.conflict_id,
            forced_by = %record.forced_by,
            "conflict forced"
        );
        Ok(record)
    }

    pub async fn unforce_conflict(&self, edition_id: &str, conflict_id: &str) -> AppResult<()> {
        let edition_id = normalize_id(edition_id, "editionId")?;
        let conflict_id = normalize_id(conflict_id, "conflictId")?;

        let db = self.db.clone();
        let (edition, conflict) = (edition_id.clone(), conflict_id.clone());
        tokio::task::spawn_blocking(move || {
            db.with_connection(|conn| ForcedConflictRepository::delete(conn, &edition, &conflict))
        })
        .await??;

        info!(
            target: "app::conflict",
            edition_id = %edition_id,
            conflict_id = %conflict_id,
            "forced conflict withdrawn"
        );
        Ok(())
    }

    pub async fn list_forced(&self, edition_id: &str) -> AppResult<Vec<ForcedConflictRecord>> {
        let edition_id = normalize_id(edition_id, "editionId")?;
        let db = self.db.clone();
        let rows = tokio::task::spawn_blocking(move || {
            db.with_connection(|conn| ForcedConflictRepository::list_by_edition(conn, &edition_id))
        })
        .await??;

        Ok(rows.into_iter().map(ForcedConflictRow::into_record).collect())
    }

    async fn forced_ids(&self, edition_id: &str) -> AppResult<HashSet<String>> {
        Ok(self
            .list_forced(edition_id)
            .await?
            .into_iter()
            .map(|record| record.conflict_id)
            .collect())
    }
}

fn normalize_id(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}
