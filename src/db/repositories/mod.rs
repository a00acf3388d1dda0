pub mod forced_conflict_repository;
pub mod schedule_repository;
