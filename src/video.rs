use std::fmt;
use std::str::FromStr;

use miette::Diagnostic;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use url::Url;

/// Canonical origin of the video platform.
pub const ORIGIN: &str = "https://www.youtube.com";

static VIDEO_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap());

#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum ResolveError {
    #[error("'{0}' is not a valid URL.")]
    InvalidUrl(String),

    #[error("Host '{0}' is not supported.")]
    #[diagnostic(help("Use a youtube.com or youtu.be link."))]
    UnsupportedHost(String),

    #[error("'{0}' is not a valid video identifier.")]
    #[diagnostic(help("Video identifiers are exactly 11 characters of A-Z, a-z, 0-9, '_' or '-'."))]
    InvalidVideoId(String),
}

/// Identifier of a single video, always 11 characters of `[A-Za-z0-9_-]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoReference(String);

impl VideoReference {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Address of the video's watch page.
    pub fn watch_url(&self) -> String {
        format!("{ORIGIN}/watch?v={}", self.0)
    }
}

impl fmt::Display for VideoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a bare identifier, without any URL around it.
impl FromStr for VideoReference {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if VIDEO_ID.is_match(s) {
            Ok(VideoReference(s.to_string()))
        } else {
            Err(ResolveError::InvalidVideoId(s.to_string()))
        }
    }
}

/// Turn a video URL into the identifier of the video.
///
/// Supported shapes are `youtu.be/<id>`, `youtube.com/live/<id>` and
/// `youtube.com/watch?v=<id>` (with any other query parameters around).
pub fn resolve_video_reference(url: &str) -> Result<VideoReference, ResolveError> {
    let url = Url::parse(url.trim()).map_err(|_| ResolveError::InvalidUrl(url.to_string()))?;

    let host = url.host_str().unwrap_or_default();

    let candidate = match host {
        "youtu.be" => url.path().split('/').nth(1).map(str::to_string),
        "youtube.com" | "www.youtube.com" => match url.path().split_once("/live/") {
            Some((_, rest)) => rest.split('?').next().map(str::to_string),
            None => url
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned()),
        },
        _ => return Err(ResolveError::UnsupportedHost(host.to_string())),
    };

    candidate.unwrap_or_default().parse()
}
