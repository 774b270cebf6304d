//! DASH side of the transcoder: parsing an MPD into a typed model and
//! expanding its `SegmentTemplate`s into concrete segment lists.

pub mod mpd;
pub mod parser;
pub mod segment;
pub mod template;
pub mod url;

pub use mpd::Manifest;
pub use parser::parse;
pub use segment::{RepresentationSegments, ResolvedSegment, SegmentEnumerator};
pub use url::BaseUrl;
