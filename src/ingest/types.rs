// src/ingest/types.rs
use anyhow::Result;

use crate::record::EventRecord;

/// One upstream feed. Implementations hand back minimally-validated records
/// (real team names, at least one link); everything else is the engine's job.
#[async_trait::async_trait]
pub trait SourceProvider {
    async fn fetch_latest(&self) -> Result<Vec<EventRecord>>;
    fn name(&self) -> &'static str;
}
