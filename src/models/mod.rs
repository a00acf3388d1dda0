pub mod conflict;
pub mod forced_conflict;
pub mod records;
pub mod schedule;
pub mod settings;
