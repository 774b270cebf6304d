use std::time::Duration;

use super::{
    mpd::{Representation, SegmentTemplate, TimelineSegment},
    template::Template,
    url::BaseUrl,
};
use crate::error::EnumerationError;

/// Upper bound on the segments of one representation. Anything above it is
/// a malformed repeat count or duration rather than real content.
pub const MAX_SEGMENTS: u64 = 1_000_000;

/// A media segment ready to be written into a playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSegment {
    /// Seconds
    pub duration: f64,
    /// Absolute uri, or a path for manifests loaded from disk.
    pub uri: String,
}

/// Everything a media playlist needs about one representation.
#[derive(Debug, Clone, PartialEq)]
pub struct RepresentationSegments {
    pub initialization: String,
    pub segments: Vec<ResolvedSegment>,
}

/// Position of one segment on the representation's timeline, before any uri
/// is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SegmentSlot {
    /// `$Time$`, ticks at the start of the segment.
    time: u64,
    /// `$Number$`
    number: u64,
    /// Ticks
    duration: u64,
}

/// Expands `SegmentTemplate`s into concrete segment lists.
#[derive(Debug, Clone, Copy)]
pub struct SegmentEnumerator {
    /// `MPD@mediaPresentationDuration`
    pub presentation_duration: Option<Duration>,
    /// Segment count for `SegmentTemplate@duration` when the presentation
    /// duration is unknown.
    pub default_segment_count: u64,
}

impl SegmentEnumerator {
    /// Computes the initialization uri and every media segment of
    /// `representation`.
    ///
    /// `template` is the representation's own `SegmentTemplate`, or the one
    /// inherited from its adaptation set.
    pub fn enumerate(
        &self,
        representation: &Representation,
        template: Option<&SegmentTemplate>,
        base_url: &BaseUrl,
    ) -> Result<RepresentationSegments, EnumerationError> {
        let id = representation
            .id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(EnumerationError::MissingId)?;
        let template = template.ok_or(EnumerationError::MissingTemplate)?;
        let media = template
            .media
            .as_deref()
            .ok_or(EnumerationError::MissingMedia)?;
        let initialization = template
            .initialization
            .as_deref()
            .ok_or(EnumerationError::MissingInitialization)?;

        let mut params = Template::new();
        params.insert(Template::REPRESENTATION_ID, id.to_string());
        params.insert(Template::BANDWIDTH, representation.bandwidth.to_string());
        let initialization = params.resolve(initialization);
        let media = params.resolve(media);

        let slots = self.slots(template)?;
        let timescale = template.timescale as f64;

        let segments = slots
            .into_iter()
            .map(|slot| {
                let mut params = Template::new();
                params.insert(Template::NUMBER, slot.number.to_string());
                params.insert(Template::TIME, slot.time.to_string());
                let uri = params.resolve(&media);

                ResolvedSegment {
                    duration: slot.duration as f64 / timescale,
                    uri: base_url.join(&uri).to_string(),
                }
            })
            .collect();

        Ok(RepresentationSegments {
            initialization: base_url.join(&initialization).to_string(),
            segments,
        })
    }

    fn slots(&self, template: &SegmentTemplate) -> Result<Vec<SegmentSlot>, EnumerationError> {
        if let Some(timeline) = template
            .segment_timeline
            .as_ref()
            .filter(|t| !t.segments.is_empty())
        {
            let end = self
                .presentation_duration
                .map(|d| (d.as_secs_f64() * template.timescale as f64).ceil() as u64);
            return expand_timeline(&timeline.segments, template.start_number, end);
        }

        match template.duration.filter(|d| *d > 0) {
            Some(duration) => {
                let count = match self.presentation_duration {
                    Some(presentation) => segment_count(presentation, duration, template.timescale),
                    None => {
                        tracing::warn!(
                            "No presentation duration declared, assuming {} segments",
                            self.default_segment_count
                        );
                        self.default_segment_count
                    }
                };
                if count > MAX_SEGMENTS {
                    return Err(EnumerationError::TooManySegments(count));
                }

                Ok((0..count)
                    .map(|i| SegmentSlot {
                        time: i.saturating_mul(duration),
                        number: template.start_number.saturating_add(i),
                        duration,
                    })
                    .collect())
            }
            None => Err(EnumerationError::NoSegmentInformation),
        }
    }
}

/// `ceil(presentation / (duration / timescale))`, at least 1.
///
/// Computed on whole microseconds so that durations such as `PT0.3S` do not
/// round up to an extra segment.
fn segment_count(presentation: Duration, duration: u64, timescale: u64) -> u64 {
    let micros = (presentation.as_secs_f64() * 1_000_000.0).round() as u128;
    let numerator = micros * timescale as u128;
    let denominator = duration as u128 * 1_000_000;
    numerator.div_ceil(denominator).max(1) as u64
}

/// Folds `S` elements into segment slots.
///
/// The clock starts at 0 and jumps to `S@t` when present; every occurrence
/// advances it by `S@d`. `end` is the presentation end in ticks, used to
/// bound a negative `S@r` on the last run.
fn expand_timeline(
    segments: &[TimelineSegment],
    start_number: u64,
    end: Option<u64>,
) -> Result<Vec<SegmentSlot>, EnumerationError> {
    let (slots, _) = segments.iter().enumerate().try_fold(
        (Vec::new(), 0u64),
        |(mut slots, clock), (index, segment)| {
            let mut clock = segment.time.unwrap_or(clock);
            let next_time = segments.get(index + 1).and_then(|s| s.time);
            let occurrences = occurrences(segment, clock, next_time.or(end));

            let total = (slots.len() as u64).saturating_add(occurrences);
            if total > MAX_SEGMENTS {
                return Err(EnumerationError::TooManySegments(total));
            }

            for _ in 0..occurrences {
                slots.push(SegmentSlot {
                    time: clock,
                    number: start_number.saturating_add(slots.len() as u64),
                    duration: segment.duration,
                });
                clock = clock.saturating_add(segment.duration);
            }
            Ok((slots, clock))
        },
    )?;
    Ok(slots)
}

fn occurrences(segment: &TimelineSegment, clock: u64, bound: Option<u64>) -> u64 {
    if segment.repeat_count >= 0 {
        return segment.repeat_count as u64 + 1;
    }

    match bound {
        Some(bound) if bound > clock && segment.duration > 0 => {
            (bound - clock).div_ceil(segment.duration)
        }
        _ => {
            tracing::warn!(
                "S@r={} has nothing to repeat up to, emitting the segment once",
                segment.repeat_count
            );
            1
        }
    }
}
