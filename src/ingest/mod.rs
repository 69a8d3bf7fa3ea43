// src/ingest/mod.rs
//! Source providers and the trait the pipeline drives them through.

pub mod providers;
pub mod types;

/// Desktop browser identity; some schedule hosts refuse default client UAs.
pub(crate) const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
