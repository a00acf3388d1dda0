use serde::{Deserialize, Serialize};

use crate::models::conflict::ScanOptions;

/// Engine defaults, loaded once per service from env and an optional YAML file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub check_presenters: bool,
    pub check_rooms: bool,
    pub check_tracks: bool,
    pub ignore_forced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_comparisons: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_time_limit_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            check_presenters: true,
            check_rooms: true,
            check_tracks: true,
            ignore_forced: false,
            max_comparisons: None,
            scan_time_limit_ms: None,
        }
    }
}

impl EngineConfig {
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            check_presenters: self.check_presenters,
            check_rooms: self.check_rooms,
            check_tracks: self.check_tracks,
            ignore_forced: self.ignore_forced,
            max_comparisons: self.max_comparisons,
            time_limit_ms: self.scan_time_limit_ms,
        }
    }

    /// Explicit options win; unset budgets fall back to the configured ones.
    pub fn resolve_options(&self, options: Option<ScanOptions>) -> ScanOptions {
        match options {
            Some(mut options) => {
                options.max_comparisons = options.max_comparisons.or(self.max_comparisons);
                options.time_limit_ms = options.time_limit_ms.or(self.scan_time_limit_ms);
                options
            }
            None => self.scan_options(),
        }
    }
}
