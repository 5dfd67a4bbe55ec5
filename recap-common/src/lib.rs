//! # Recap Common Library
//!
//! Shared code for the recap services including:
//! - Error and result types
//! - TOML configuration and config file resolution
//! - Event types (RecapEvent enum) and the broadcast EventBus
//! - Export timestamp parsing and the inclusive time window
//! - Shared models (community metadata, chart buckets)
//! - SSE stream helpers

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod sse;
pub mod time;

pub use error::{Error, Result};
pub use models::{Bucket, CommunityMetadata};
pub use time::TimeWindow;
