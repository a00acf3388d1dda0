use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::forced_conflict::ForcedConflictRecord;

#[derive(Debug, Clone)]
pub struct ForcedConflictRow {
    pub id: String,
    pub edition_id: String,
    pub conflict_id: String,
    pub forced_by: String,
    pub forced_at: String,
    pub reason: Option<String>,
}

impl ForcedConflictRow {
    pub fn from_record(record: &ForcedConflictRecord) -> Self {
        Self {
            id: record.id.clone(),
            edition_id: record.edition_id.clone(),
            conflict_id: record.conflict_id.clone(),
            forced_by: record.forced_by.clone(),
            forced_at: record.forced_at.clone(),
            reason: record.reason.clone(),
        }
    }

    pub fn into_record(self) -> ForcedConflictRecord {
        ForcedConflictRecord {
            id: self.id,
            edition_id: self.edition_id,
            conflict_id: self.conflict_id,
            forced_by: self.forced_by,
            forced_at: self.forced_at,
            reason: self.reason,
        }
    }
}

impl TryFrom<&Row<'_>> for ForcedConflictRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            edition_id: row.get("edition_id")?,
            conflict_id: row.get("conflict_id")?,
            forced_by: row.get("forced_by")?,
            forced_at: row.get("forced_at")?,
            reason: row.get("reason")?,
        })
    }
}

pub struct ForcedConflictRepository;

impl ForcedConflictRepository {
    /// Fails with a conflict error when the edition already forced this conflict id.
    pub fn insert(conn: &Connection, row: &ForcedConflictRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO forced_conflicts (
                    id,
                    edition_id,
                    conflict_id,
                    forced_by,
                    forced_at,
                    reason
                ) VALUES (
                    :id,
                    :edition_id,
                    :conflict_id,
                    :forced_by,
                    :forced_at,
                    :reason
                )
            "#,
            named_params! {
                ":id": &row.id,
                ":edition_id": &row.edition_id,
                ":conflict_id": &row.conflict_id,
                ":forced_by": &row.forced_by,
                ":forced_at": &row.forced_at,
                ":reason": &row.reason,
            },
        )?;

        Ok(())
    }

    pub fn delete(conn: &Connection, edition_id: &str, conflict_id: &str) -> AppResult<()> {
        let affected = conn.execute(
            "DELETE FROM forced_conflicts WHERE edition_id = ?1 AND conflict_id = ?2",
            [edition_id, conflict_id],
        )?;
        if affected == 0 {
            return Err(AppError::not_found());
        }
        Ok(())
    }

    pub fn find(
        conn: &Connection,
        edition_id: &str,
        conflict_id: &str,
    ) -> AppResult<Option<ForcedConflictRow>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT id, edition_id, conflict_id, forced_by, forced_at, reason
            FROM forced_conflicts
            WHERE edition_id = ?1 AND conflict_id = ?2
        "#,
        )?;

        let row = stmt
            .query_row([edition_id, conflict_id], |row| ForcedConflictRow::try_from(row))
            .optional()?;

        Ok(row)
    }

    pub fn list_by_edition(conn: &Connection, edition_id: &str) -> AppResult<Vec<ForcedConflictRow>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT id, edition_id, conflict_id, forced_by, forced_at, reason
            FROM forced_conflicts
            WHERE edition_id = ?1
            ORDER BY forced_at, id
        "#,
        )?;

        let rows = stmt
            .query_map([edition_id], |row| ForcedConflictRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}
