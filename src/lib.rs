//! Schedule conflict detection for conference editions.
//!
//! The engine in [`services::conflict_engine`] is pure and synchronous; the
//! [`services::conflict_service::ConflictService`] facade adds record
//! loading, configuration and forced-conflict bookkeeping on top of SQLite.

pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use error::{AppError, AppResult};
pub use models::conflict::{
    Conflict, ConflictScanResult, ConflictSeverity, ConflictSummary, ConflictType, EntityType,
    ScanOptions, TimeRange,
};
pub use models::schedule::{ClockTime, PresenterRole, ScheduledItem};
pub use services::conflict_engine::{
    can_publish, check_placement, conflicts_for_presenter, conflicts_for_session, scan,
};
pub use services::conflict_service::ConflictService;
