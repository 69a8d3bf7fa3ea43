// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod config;
pub mod ingest;
pub mod keyer;
pub mod matcher;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod retention;
pub mod runlog;
pub mod similarity;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::config::AppConfig;
pub use crate::matcher::{fuse_sources, FuseAuthority};
pub use crate::merge::merge_into_collection;
pub use crate::pipeline::{run_cycle, CycleReport};
pub use crate::record::{EventRecord, TeamInfo};
pub use crate::similarity::event_similarity;
