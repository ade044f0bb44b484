//! Wraps the black-box `extractor` subprocess that pulls a single frame
//! out of a media source, and the plain HTTP download used to fetch a
//! livestream segment before local decode (§4.D).

pub mod download;
pub mod error;
pub mod frame_extractor;

pub use download::download_segment;
pub use error::{ExtractorError, ExtractorResult};
pub use frame_extractor::FrameExtractor;
