//! Enrichment services
//!
//! Network-facing components that augment ingested records with live
//! data from the remote source. All outbound traffic goes through the
//! relay proxy via [`ProxyFetcher`].

pub mod community_enricher;
pub mod fetch_queue;
pub mod pacing;
pub mod proxy_client;
pub mod record_enricher;
pub mod response_decoder;
pub mod session;
pub mod source_urls;

pub use community_enricher::{CommunityBatch, CommunityEnricher, CommunityUpdateFn};
pub use fetch_queue::SerialFetchQueue;
pub use pacing::Pacing;
pub use proxy_client::{FetchError, HttpProxyClient, ProxyFetcher};
pub use record_enricher::{FetchOutcome, RecordEnricher};
pub use response_decoder::{decode_community_metadata, decode_record_metrics, DecodedMetrics};
pub use session::{Admission, EnrichmentSession, PendingGuard};
pub use source_urls::SourceUrls;
