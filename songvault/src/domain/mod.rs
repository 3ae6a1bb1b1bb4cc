//! Domain layer for songvault.
//!
//! Value objects and typed metadata shared by the ingestion pipeline and the API.

pub mod metadata;
pub mod source_url;

pub use metadata::{ExtractedInfo, RawMetadata, TrackMetadata, UNKNOWN_ARTIST, UNKNOWN_TITLE};
pub use source_url::{SourceUrl, is_valid_source_url};
