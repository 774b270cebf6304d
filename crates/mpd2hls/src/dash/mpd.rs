//! Typed view of the parts of an MPD the transcoder consumes.
//!
//! Every level owns its children. `BaseURL` values are kept as written; they
//! are resolved against their ancestors by [`super::url::BaseUrl::resolve`].

use std::time::Duration;

/// `MPD@type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresentationType {
    #[default]
    Static,
    Dynamic,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Manifest {
    pub presentation_type: PresentationType,
    /// `MPD@mediaPresentationDuration`
    pub media_presentation_duration: Option<Duration>,
    pub base_urls: Vec<String>,
    pub periods: Vec<Period>,
}

impl Manifest {
    pub fn is_static(&self) -> bool {
        self.presentation_type == PresentationType::Static
    }

    pub fn representation_count(&self) -> usize {
        self.periods
            .iter()
            .flat_map(|p| p.adaptation_sets.iter())
            .map(|a| a.representations.len())
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Period {
    pub id: Option<String>,
    pub base_urls: Vec<String>,
    pub adaptation_sets: Vec<AdaptationSet>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AdaptationSet {
    pub id: Option<String>,
    pub content_type: Option<String>,
    pub mime_type: Option<String>,
    pub lang: Option<String>,
    pub codecs: Option<String>,
    pub segment_template: Option<SegmentTemplate>,
    pub base_urls: Vec<String>,
    pub representations: Vec<Representation>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Representation {
    pub id: Option<String>,
    /// Bits per second, 0 when absent.
    pub bandwidth: u64,
    pub width: Option<u64>,
    pub height: Option<u64>,
    /// Kept verbatim: the attribute may hold a single rate or a range.
    pub audio_sampling_rate: Option<String>,
    pub mime_type: Option<String>,
    pub codecs: Option<String>,
    pub segment_template: Option<SegmentTemplate>,
    pub base_urls: Vec<String>,
}

impl Representation {
    /// `WxH`, only when both dimensions are declared.
    pub fn resolution(&self) -> Option<String> {
        self.width
            .zip(self.height)
            .map(|(width, height)| format!("{width}x{height}"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentTemplate {
    pub initialization: Option<String>,
    pub media: Option<String>,
    /// Ticks per second, never 0.
    pub timescale: u64,
    pub start_number: u64,
    /// Constant segment duration in ticks.
    pub duration: Option<u64>,
    pub segment_timeline: Option<SegmentTimeline>,
}

impl Default for SegmentTemplate {
    fn default() -> Self {
        Self {
            initialization: None,
            media: None,
            timescale: 1,
            start_number: 1,
            duration: None,
            segment_timeline: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SegmentTimeline {
    pub segments: Vec<TimelineSegment>,
}

/// One `S` element: a run of `repeat_count + 1` segments of equal duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineSegment {
    /// `S@t`, moves the timeline clock before the run starts.
    pub time: Option<u64>,
    /// `S@d`
    pub duration: u64,
    /// `S@r`. Negative values repeat until the next `S@t` or the end of the
    /// presentation.
    pub repeat_count: i64,
}
