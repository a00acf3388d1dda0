use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const MINUTES_PER_DAY: u16 = 24 * 60;

/// Wall-clock time of day with minute precision.
///
/// Parsed from zero-padded 24h `HH:MM` and kept as minutes since midnight, so
/// ordering is numeric. `24:00` is accepted as the end of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(0);
    pub const END_OF_DAY: ClockTime = ClockTime(MINUTES_PER_DAY);

    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        if minute >= 60 {
            return None;
        }
        let total = hour.checked_mul(60)?.checked_add(minute)?;
        if total > MINUTES_PER_DAY {
            return None;
        }
        Some(Self(total))
    }

    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes <= MINUTES_PER_DAY).then_some(Self(minutes))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    pub fn hour(self) -> u16 {
        self.0 / 60
    }

    pub fn minute(self) -> u16 {
        self.0 % 60
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseClockTimeError(String);

impl fmt::Display for ParseClockTimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected HH:MM (24h), got {:?}", self.0)
    }
}

impl std::error::Error for ParseClockTimeError {}

impl FromStr for ClockTime {
    type Err = ParseClockTimeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseClockTimeError(value.to_string());
        let (hours, minutes) = value.trim().split_once(':').ok_or_else(invalid)?;
        if hours.len() != 2 || minutes.len() != 2 {
            return Err(invalid());
        }
        if !hours.bytes().chain(minutes.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let hour: u16 = hours.parse().map_err(|_| invalid())?;
        let minute: u16 = minutes.parse().map_err(|_| invalid())?;
        ClockTime::from_hm(hour, minute).ok_or_else(invalid)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenterRole {
    Primary,
    CoPresenter,
}

/// A talk, workshop or break once it has been placed into a slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledItem {
    pub id: String,
    pub title: String,
    pub placement_id: String,
    pub room_id: String,
    pub room_name: String,
    #[serde(default)]
    pub track_id: Option<String>,
    #[serde(default)]
    pub track_name: Option<String>,
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    /// First entry is the primary presenter, the rest are co-presenters.
    #[serde(default)]
    pub presenter_ids: Vec<String>,
    /// Parallel to `presenter_ids`.
    #[serde(default)]
    pub presenter_names: Vec<String>,
}

impl ScheduledItem {
    pub fn primary_presenter(&self) -> Option<&str> {
        self.presenter_ids.first().map(String::as_str)
    }

    pub fn presenter_role(&self, presenter_id: &str) -> Option<PresenterRole> {
        let index = self
            .presenter_ids
            .iter()
            .position(|id| id == presenter_id)?;
        Some(if index == 0 {
            PresenterRole::Primary
        } else {
            PresenterRole::CoPresenter
        })
    }

    pub fn has_presenter(&self, presenter_id: &str) -> bool {
        self.presenter_ids.iter().any(|id| id == presenter_id)
    }

    /// Display name for a presenter, falling back to the id when the name list is short.
    pub fn presenter_name<'a>(&'a self, presenter_id: &'a str) -> &'a str {
        self.presenter_ids
            .iter()
            .position(|id| id == presenter_id)
            .and_then(|index| self.presenter_names.get(index))
            .map(String::as_str)
            .unwrap_or(presenter_id)
    }
}
