//! Data model for export records, votes and the published snapshot

pub mod record;
pub mod snapshot;

pub use record::{
    community_from_permalink, CommunityItem, CsvRow, Record, RecordKind, RecordMetrics,
    Timestamped, VoteDirection, VoteEntry,
};
pub use snapshot::{FilteredExport, Snapshot};
