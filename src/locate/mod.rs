pub mod player_response;

use core::fmt;
use std::ops::Deref;
use std::str::FromStr;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use player_response::PlayerResponse;

#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum LocateError {
    #[error("Could not find caption metadata in the video page.")]
    #[diagnostic(help("The page layout may have changed; the locator needs updating."))]
    MetadataNotFound,

    #[error("Caption metadata in the video page is malformed: {0}")]
    MalformedMetadata(String),

    #[error("This video has no captions.")]
    NoCaptionsAvailable,

    #[error("This video has no {kind} captions in language '{language}'.")]
    #[diagnostic(help("Run `ytsub tracks <URL>` to see available caption tracks."))]
    TrackNotFound { kind: Kind, language: String },
}

/// Whether a caption track was generated by speech recognition or written by a human.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    #[default]
    Auto,
    Manual,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Auto => f.write_str("auto"),
            Kind::Manual => f.write_str("manual"),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown caption kind '{0}', expected 'auto' or 'manual'.")]
pub struct ParseKindError(String);

impl FromStr for Kind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Kind::Auto),
            "manual" => Ok(Kind::Manual),
            _ => Err(ParseKindError(s.to_string())),
        }
    }
}

/// One selectable caption track found in the page metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CaptionTrack {
    pub kind: Kind,
    pub language_code: String,
    /// Absolute URL of the timed-text payload.
    pub source_url: String,
    /// Human-readable name of the track, if the page has one.
    pub name: Option<String>,
}

/// Common trait of objects that know where a video page keeps its caption
/// tracks. Each object can serialize and deserialize its own settings so
/// the extraction can be adjusted from the configuration file when the
/// page format drifts.
#[typetag::serde(tag = "locator")]
pub trait Locate: Send {
    /// List all caption tracks described in the given HTML page.
    fn tracks(&self, html: &str) -> Result<Vec<CaptionTrack>, LocateError>;

    /// Give us textual representation of itself, including interesting settings.
    fn describe(&self) -> String;

    /// Text marking where the player data starts in the page. Other
    /// extractors reading the same data begin their search there.
    fn anchor(&self) -> Option<&str> {
        None
    }
}

/// Newtype over `Box<dyn Locate>` so it can have `Debug` and `Default`.
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location(Box<dyn Locate>);

impl Deref for Location {
    type Target = Box<dyn Locate>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl Default for Location {
    fn default() -> Self {
        Location(Box::new(PlayerResponse::default()))
    }
}

/// Pick the first track of requested `kind` and `language`. There is no
/// fallback to another kind or language.
pub fn select(
    tracks: &[CaptionTrack],
    kind: Kind,
    language: &str,
) -> Result<CaptionTrack, LocateError> {
    if tracks.is_empty() {
        return Err(LocateError::NoCaptionsAvailable);
    }

    tracks
        .iter()
        .find(|t| t.kind == kind && t.language_code == language)
        .cloned()
        .ok_or_else(|| LocateError::TrackNotFound {
            kind,
            language: language.to_string(),
        })
}
