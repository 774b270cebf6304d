use std::{borrow::Cow, fmt::Write};

use super::HLS_VERSION;
use crate::dash::segment::ResolvedSegment;

/// `EXT-X-PLAYLIST-TYPE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistType {
    Vod,
    Event,
}

impl PlaylistType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vod => "VOD",
            Self::Event => "EVENT",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MediaPlaylist<'a> {
    pub initialization: &'a str,
    pub segments: &'a [ResolvedSegment],
    pub playlist_type: PlaylistType,
    /// Seconds added to the computed target duration.
    pub target_duration_padding: u64,
}

impl MediaPlaylist<'_> {
    /// Longest segment rounded up to whole seconds, never below 1.
    pub fn target_duration(&self) -> u64 {
        let longest = self
            .segments
            .iter()
            .map(|s| s.duration.ceil() as u64)
            .max()
            .unwrap_or_default()
            .max(1);
        longest + self.target_duration_padding
    }

    pub fn render(&self) -> String {
        let mut output = String::with_capacity(128 + self.segments.len() * 64);
        output.push_str("#EXTM3U\n");
        let _ = writeln!(output, "#EXT-X-VERSION:{HLS_VERSION}");
        let _ = writeln!(output, "#EXT-X-TARGETDURATION:{}", self.target_duration());
        output.push_str("#EXT-X-MEDIA-SEQUENCE:0\n");
        let _ = writeln!(output, "#EXT-X-PLAYLIST-TYPE:{}", self.playlist_type.as_str());
        let _ = writeln!(output, "#EXT-X-MAP:URI=\"{}\"", escape_uri(self.initialization));

        for segment in self.segments {
            let _ = writeln!(output, "#EXTINF:{:.3},", segment.duration);
            output.push_str(&escape_uri(&segment.uri));
            output.push('\n');
        }

        output.push_str("#EXT-X-ENDLIST");
        output
    }
}

/// Literal spaces break most playlist parsers, nothing else is escaped.
pub(crate) fn escape_uri(uri: &str) -> Cow<'_, str> {
    if uri.contains(' ') {
        Cow::Owned(uri.replace(' ', "%20"))
    } else {
        Cow::Borrowed(uri)
    }
}
