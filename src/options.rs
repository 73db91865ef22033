use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::convert::Format;
use crate::locate::{Kind, Location};

/// Configuration options of ytsub.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Directory to save subtitle files into.
    pub output_dir: Option<PathBuf>,
    /// Language code of the caption track.
    pub language: String,
    /// Default kind of caption track.
    pub kind: Kind,
    /// Default output format.
    pub format: Format,
    /// Show progress spinner while downloading.
    pub show_progress_bar: bool,
    /// Timeout of each HTTP request, in seconds.
    pub timeout_secs: Option<u64>,
    /// How to find caption tracks in a video page.
    pub locate: Location,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            output_dir: None,
            language: "en".to_string(),
            kind: Kind::default(),
            format: Format::default(),
            show_progress_bar: false,
            timeout_secs: None,
            locate: Location::default(),
        }
    }
}

impl Options {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
