//! Ingest workflow
//!
//! Takes an uploaded export archive from bytes to a published snapshot,
//! then hands the filtered records to the record enricher as a background
//! [`EnrichmentJob`]:
//!
//! 1. Read the four tables on a blocking thread
//! 2. Apply the time window to posts and comments
//! 3. Publish the unenriched snapshot
//! 4. Spawn enrichment; progress is published into the record store

mod job;
mod pipeline;

pub use job::EnrichmentJob;
pub use pipeline::IngestPipeline;
