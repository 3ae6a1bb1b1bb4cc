//! Delivery of stored tracks: raw byte streams and base64 envelopes.

mod disposition;
mod encoded;
mod range;
mod stream;

pub use disposition::{inline_disposition, sanitize_title};
pub use encoded::EncodedTrack;
pub use range::{ByteRange, RangeRequest, parse_range_header};
pub use stream::{AUDIO_CACHE_CONTROL, AudioPayload, AudioStream};
