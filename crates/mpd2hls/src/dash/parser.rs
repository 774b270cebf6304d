use std::{str::FromStr, time::Duration};

use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};

use super::mpd::{
    AdaptationSet, Manifest, Period, PresentationType, Representation, SegmentTemplate,
    SegmentTimeline, TimelineSegment,
};
use crate::error::ParseError;

/// Parses MPD text into a [`Manifest`].
///
/// Elements and attributes the transcoder does not use are ignored. Numeric
/// attributes that are present must be valid numbers.
pub fn parse(xml: &str) -> Result<Manifest, ParseError> {
    let root = read_tree(xml)?;
    if root.name != "MPD" {
        return Err(ParseError::UnexpectedRoot(root.name));
    }
    parse_manifest(&root)
}

/// Generic XML element, the intermediate step between quick-xml events and
/// the typed model.
#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, ParseError> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| ParseError::Xml(e.to_string()))?;
            let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|e| ParseError::Xml(e.to_string()))?
                .into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            attributes,
            ..Default::default()
        })
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn string(&self, name: &str) -> Option<String> {
        self.attr(name).map(ToString::to_string)
    }

    fn number<T: FromStr>(
        &self,
        attribute: &'static str,
        context: &str,
    ) -> Result<Option<T>, ParseError> {
        self.attr(attribute)
            .map(|value| {
                value
                    .trim()
                    .parse::<T>()
                    .map_err(|_| ParseError::InvalidAttribute {
                        attribute,
                        value: value.to_string(),
                        context: context.to_string(),
                    })
            })
            .transpose()
    }

    /// `@audioSamplingRate` is either a single rate or a `min-max` range.
    fn sampling_rate(&self, context: &str) -> Result<Option<String>, ParseError> {
        let Some(value) = self.attr("audioSamplingRate") else {
            return Ok(None);
        };
        let valid = value
            .trim()
            .split('-')
            .enumerate()
            .all(|(index, part)| index < 2 && part.trim().parse::<u64>().is_ok());
        if !valid {
            return Err(ParseError::InvalidAttribute {
                attribute: "audioSamplingRate",
                value: value.to_string(),
                context: context.to_string(),
            });
        }
        Ok(Some(value.trim().to_string()))
    }

    fn base_urls(&self) -> Vec<String> {
        self.children("BaseURL")
            .map(|b| b.text.trim().to_string())
            .collect()
    }
}

fn read_tree(xml: &str) -> Result<Element, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                return Err(ParseError::Xml(format!(
                    "{e} at position {}",
                    reader.error_position()
                )))
            }
        };

        match event {
            Event::Start(start) => stack.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(end) => {
                let element = stack.pop().ok_or_else(|| {
                    ParseError::Xml(format!(
                        "unexpected closing tag </{}>",
                        String::from_utf8_lossy(end.local_name().as_ref())
                    ))
                })?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                if let Some(parent) = stack.last_mut() {
                    let text = text.unescape().map_err(|e| ParseError::Xml(e.to_string()))?;
                    parent.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(parent) = stack.last_mut() {
                    parent.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            // declarations, comments, processing instructions and doctypes
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::Xml(format!("unclosed element <{}>", open.name)));
    }
    root.ok_or_else(|| ParseError::Xml("document has no root element".to_string()))
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => {
            return Err(ParseError::Xml(format!(
                "second root element <{}>",
                element.name
            )))
        }
        None => *root = Some(element),
    }
    Ok(())
}

fn parse_manifest(mpd: &Element) -> Result<Manifest, ParseError> {
    let presentation_type = match mpd.attr("type").map(str::trim) {
        None | Some("static") => PresentationType::Static,
        Some("dynamic") => PresentationType::Dynamic,
        Some(other) => {
            return Err(ParseError::InvalidAttribute {
                attribute: "type",
                value: other.to_string(),
                context: "MPD".to_string(),
            })
        }
    };

    let media_presentation_duration = mpd
        .attr("mediaPresentationDuration")
        .map(|value| {
            parse_duration(value).ok_or_else(|| ParseError::InvalidAttribute {
                attribute: "mediaPresentationDuration",
                value: value.to_string(),
                context: "MPD".to_string(),
            })
        })
        .transpose()?;

    let periods = mpd
        .children("Period")
        .enumerate()
        .map(|(index, period)| parse_period(index, period))
        .collect::<Result<_, _>>()?;

    Ok(Manifest {
        presentation_type,
        media_presentation_duration,
        base_urls: mpd.base_urls(),
        periods,
    })
}

fn parse_duration(value: &str) -> Option<Duration> {
    iso8601_duration::Duration::parse(value.trim()).ok()?.to_std()
}

fn parse_period(index: usize, period: &Element) -> Result<Period, ParseError> {
    let id = period.string("id");
    let context = match &id {
        Some(id) => format!("Period {id:?}"),
        None => format!("Period #{index}"),
    };

    let adaptation_sets = period
        .children("AdaptationSet")
        .enumerate()
        .map(|(index, adaptation_set)| parse_adaptation_set(index, adaptation_set, &context))
        .collect::<Result<_, _>>()?;

    Ok(Period {
        id,
        base_urls: period.base_urls(),
        adaptation_sets,
    })
}

fn parse_adaptation_set(
    index: usize,
    adaptation_set: &Element,
    parent: &str,
) -> Result<AdaptationSet, ParseError> {
    let id = adaptation_set.string("id");
    let context = match &id {
        Some(id) => format!("AdaptationSet {id:?} in {parent}"),
        None => format!("AdaptationSet #{index} in {parent}"),
    };

    let segment_template = adaptation_set
        .child("SegmentTemplate")
        .map(|template| parse_segment_template(template, &context))
        .transpose()?;

    let representations = adaptation_set
        .children("Representation")
        .enumerate()
        .map(|(index, representation)| parse_representation(index, representation, &context))
        .collect::<Result<_, _>>()?;

    Ok(AdaptationSet {
        id,
        content_type: adaptation_set.string("contentType"),
        mime_type: adaptation_set.string("mimeType"),
        lang: adaptation_set.string("lang"),
        codecs: adaptation_set.string("codecs"),
        segment_template,
        base_urls: adaptation_set.base_urls(),
        representations,
    })
}

fn parse_representation(
    index: usize,
    representation: &Element,
    parent: &str,
) -> Result<Representation, ParseError> {
    let id = representation.string("id");
    let context = match &id {
        Some(id) => format!("Representation {id:?} in {parent}"),
        None => format!("Representation #{index} in {parent}"),
    };

    let segment_template = representation
        .child("SegmentTemplate")
        .map(|template| parse_segment_template(template, &context))
        .transpose()?;

    Ok(Representation {
        bandwidth: representation.number("bandwidth", &context)?.unwrap_or(0),
        width: representation.number("width", &context)?,
        height: representation.number("height", &context)?,
        audio_sampling_rate: representation.sampling_rate(&context)?,
        mime_type: representation.string("mimeType"),
        codecs: representation.string("codecs"),
        segment_template,
        base_urls: representation.base_urls(),
        id,
    })
}

fn parse_segment_template(template: &Element, owner: &str) -> Result<SegmentTemplate, ParseError> {
    let context = format!("SegmentTemplate of {owner}");

    let timescale = template.number("timescale", &context)?.unwrap_or(1);
    if timescale == 0 {
        return Err(ParseError::InvalidAttribute {
            attribute: "timescale",
            value: "0".to_string(),
            context,
        });
    }

    let segment_timeline = template
        .child("SegmentTimeline")
        .map(|timeline| parse_segment_timeline(timeline, &context))
        .transpose()?;

    Ok(SegmentTemplate {
        initialization: template.string("initialization"),
        media: template.string("media"),
        timescale,
        start_number: template.number("startNumber", &context)?.unwrap_or(1),
        duration: template.number("duration", &context)?,
        segment_timeline,
    })
}

fn parse_segment_timeline(timeline: &Element, owner: &str) -> Result<SegmentTimeline, ParseError> {
    let segments = timeline
        .children("S")
        .enumerate()
        .map(|(index, s)| {
            let context = format!("S #{index} in {owner}");
            Ok(TimelineSegment {
                time: s.number("t", &context)?,
                duration: s
                    .number("d", &context)?
                    .ok_or_else(|| ParseError::MissingAttribute {
                        attribute: "d",
                        context: context.clone(),
                    })?,
                repeat_count: s.number("r", &context)?.unwrap_or(0),
            })
        })
        .collect::<Result<_, ParseError>>()?;

    Ok(SegmentTimeline { segments })
}
