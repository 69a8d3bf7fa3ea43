// src/ingest/providers/mod.rs
pub mod schedule;
pub mod streamed;

pub use schedule::ScheduleProvider;
pub use streamed::StreamedProvider;
