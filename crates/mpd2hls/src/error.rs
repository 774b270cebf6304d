use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("HTTP error: {status}")]
    HttpError {
        status: reqwest::StatusCode,
        /// Leading part of the response body, if it could be read.
        body: Option<String>,
    },

    #[error("Invalid manifest url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error(transparent)]
    RequestError(#[from] reqwest::Error),

    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    MpdParsing(#[from] ParseError),

    #[error("All {} representations were skipped", .0.len())]
    AllRepresentationsSkipped(Vec<SkippedRepresentation>),

    #[error("Invalid output folder: {0}")]
    InvalidOutputFolder(String),
}

/// Coarse classification of a [`TranscodeError`], for callers that report
/// failures without matching on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Fetch,
    Io,
    Parse,
    Enumeration,
    Config,
}

impl TranscodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::HttpError { .. } | Self::InvalidUrl(_) | Self::RequestError(_) => ErrorKind::Fetch,
            Self::IOError(_) => ErrorKind::Io,
            Self::MpdParsing(_) => ErrorKind::Parse,
            Self::AllRepresentationsSkipped(_) => ErrorKind::Enumeration,
            Self::InvalidOutputFolder(_) => ErrorKind::Config,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::RequestError(e) if e.is_timeout())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Malformed XML: {0}")]
    Xml(String),

    #[error("Unexpected root element <{0}>, expected <MPD>")]
    UnexpectedRoot(String),

    #[error("Missing attribute `{attribute}` on {context}")]
    MissingAttribute {
        attribute: &'static str,
        context: String,
    },

    #[error("Invalid value {value:?} for attribute `{attribute}` on {context}")]
    InvalidAttribute {
        attribute: &'static str,
        value: String,
        /// Element path such as `Representation "v1"` or `S in AdaptationSet "0"`.
        context: String,
    },
}

/// Reasons a single representation can not be turned into a media playlist.
///
/// None of these abort a run; the representation is skipped instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnumerationError {
    #[error("no SegmentTemplate on the representation or its adaptation set")]
    MissingTemplate,

    #[error("SegmentTemplate has no media pattern")]
    MissingMedia,

    #[error("SegmentTemplate has no initialization pattern")]
    MissingInitialization,

    #[error("neither a SegmentTimeline nor a segment duration is present")]
    NoSegmentInformation,

    #[error("{0} segments exceed the limit of one media playlist")]
    TooManySegments(u64),

    #[error("representation has no id")]
    MissingId,

    #[error("representation id is already used by another representation")]
    DuplicateId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRepresentation {
    /// Index of the owning period.
    pub period: usize,
    pub id: String,
    pub reason: EnumerationError,
}

impl fmt::Display for SkippedRepresentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "period {} representation {:?}: {}",
            self.period, self.id, self.reason
        )
    }
}

pub type TranscodeResult<T> = Result<T, TranscodeError>;
