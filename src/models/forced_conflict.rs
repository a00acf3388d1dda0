use serde::{Deserialize, Serialize};

/// An organizer's decision to accept a conflict instead of fixing it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ForcedConflictRecord {
    pub id: String,
    pub edition_id: String,
    pub conflict_id: String,
    pub forced_by: String,
    pub forced_at: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ForceConflictInput {
    pub edition_id: String,
    pub conflict_id: String,
    pub forced_by: String,
    #[serde(default)]
    pub reason: Option<String>,
}
