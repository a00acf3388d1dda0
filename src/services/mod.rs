pub mod conflict_detector;
pub mod conflict_engine;
pub mod conflict_service;
pub mod schedule_assembly;
pub mod schedule_utils;
pub mod settings_service;
