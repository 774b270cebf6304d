use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// Segment count used for constant-duration templates when the manifest has
/// no `mediaPresentationDuration` to derive one from.
pub const DEFAULT_SEGMENT_COUNT: u64 = 500;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Knobs of a transcode run.
///
/// Deserializable so front ends can load it from a config file; every field is
/// optional there and falls back to [`TranscodeOptions::default`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TranscodeOptions {
    /// How many segments to emit for a `SegmentTemplate@duration` when the
    /// presentation duration is unknown. This is only an approximation of the
    /// real content length.
    pub default_segment_count: u64,

    /// Seconds added to `#EXT-X-TARGETDURATION` of every media playlist.
    pub target_duration_padding: u64,

    /// Timeout of the manifest request, in seconds when deserialized.
    #[serde(deserialize_with = "deserialize_seconds")]
    pub request_timeout: Duration,
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        Self {
            default_segment_count: DEFAULT_SEGMENT_COUNT,
            target_duration_padding: 0,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl TranscodeOptions {
    pub fn default_segment_count(mut self, count: u64) -> Self {
        self.default_segment_count = count;
        self
    }

    pub fn target_duration_padding(mut self, seconds: u64) -> Self {
        self.target_duration_padding = seconds;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

fn deserialize_seconds<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_secs)
}
