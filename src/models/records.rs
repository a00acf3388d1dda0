//! Raw schedule records as they come out of storage.
//!
//! Fields are loosely typed on purpose: dates and times are kept as the
//! stored strings and references may dangle. The assembly step turns them
//! into strict [`ScheduledItem`](crate::models::schedule::ScheduledItem)s.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub edition_id: String,
    pub title: String,
    #[serde(default)]
    pub slot_id: Option<String>,
    #[serde(default)]
    pub talk_id: Option<String>,
    #[serde(default)]
    pub track_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlotRecord {
    pub id: String,
    pub edition_id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub room_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomRecord {
    pub id: String,
    pub edition_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackRecord {
    pub id: String,
    pub edition_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TalkRecord {
    pub id: String,
    pub edition_id: String,
    pub title: String,
    /// Ordered; the first speaker is the primary presenter.
    #[serde(default)]
    pub speaker_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerRecord {
    pub id: String,
    pub edition_id: String,
    pub display_name: String,
}

/// A placement an editor wants to check before committing it.
///
/// `session_id` may name an existing session (a move) or a new one, in which
/// case `title` is required. `talk_id` and `track_id` override the stored
/// values when present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlacementCandidate {
    pub session_id: String,
    pub slot_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub talk_id: Option<String>,
    #[serde(default)]
    pub track_id: Option<String>,
}
