pub mod commands;
pub mod conflicts;
pub mod context_builder;
pub mod reminders;
pub mod schedule_parser;
pub mod scheduler;
pub mod summary;
