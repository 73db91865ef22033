pub mod convert;
pub mod job;
pub mod locate;
pub mod metadata;
pub mod options;
pub mod source;
pub mod timedtext;
pub mod video;

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use isahc::HttpClient;
use miette::Diagnostic;
use thiserror::Error;
use tokio::fs::read_to_string;

pub use convert::{convert, Format};
pub use locate::{CaptionTrack, Kind};
pub use options::Options;
pub use video::{resolve_video_reference, VideoReference};

use crate::locate::LocateError;
use crate::metadata::TitleError;
use crate::source::{fetch_page, fetch_track, Fetch, FetchError};

/// A subtitle session: HTTP client together with configuration.
#[derive(Debug)]
pub struct Subtitler<F = HttpClient> {
    /// Used for downloading pages and caption tracks.
    fetcher: F,
    /// Configuration options of the session.
    options: Options,
}

#[derive(Debug, Error, Diagnostic)]
pub enum YtsubError {
    #[error("Could not create HTTP client.")]
    HttpClient(#[from] isahc::Error),

    #[error("Could not load configuration file: {0}")]
    Options(String),
}

#[derive(Debug, Error, Diagnostic)]
pub enum SubtitlesError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Locate(#[from] LocateError),

    #[error("HTTP error.")]
    Http(#[from] FetchError),
}

impl Subtitler {
    /// Create new session, reading configuration from `config` or from the
    /// default location.
    pub async fn new(config: &Option<PathBuf>) -> Result<Subtitler, YtsubError> {
        let options = load_options(config).await?;
        let fetcher = source::http_client(options.timeout())?;

        Ok(Subtitler { fetcher, options })
    }
}

impl<F: Fetch> Subtitler<F> {
    /// Create session which downloads through `fetcher`.
    pub fn with_fetcher(fetcher: F, options: Options) -> Subtitler<F> {
        Subtitler { fetcher, options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    /// List all caption tracks of `video`.
    pub async fn tracks(&self, video: &VideoReference) -> Result<Vec<CaptionTrack>, SubtitlesError> {
        let page = fetch_page(&self.fetcher, video).await?;

        Ok(self.options.locate.tracks(&page.body)?)
    }

    /// Find caption track of `kind` in the configured language.
    pub fn locate_track(&self, html: &str, kind: Kind) -> Result<CaptionTrack, LocateError> {
        let tracks = self.options.locate.tracks(html)?;
        let track = locate::select(&tracks, kind, &self.options.language)?;

        log::debug!("Selected {kind} track {}", track.source_url);

        Ok(track)
    }

    /// Download raw timed-text payload of `video`'s caption track of `kind`.
    pub async fn fetch_subtitles(
        &self,
        video: &VideoReference,
        kind: Kind,
    ) -> Result<String, SubtitlesError> {
        let page = fetch_page(&self.fetcher, video).await?;
        let track = self.locate_track(&page.body, kind)?;

        Ok(fetch_track(&self.fetcher, &track).await?)
    }

    /// Download title of `video`.
    pub async fn fetch_title(&self, video: &VideoReference) -> Result<String, TitleError> {
        let page = fetch_page(&self.fetcher, video).await?;

        metadata::title(&page.body, self.options.locate.anchor())
    }
}

/// Read options from `config`, or from the default configuration file if
/// it exists.
pub async fn load_options(config: &Option<PathBuf>) -> Result<Options, YtsubError> {
    match config {
        Some(path) => {
            let s = read_to_string(path)
                .await
                .map_err(|e| YtsubError::Options(format!("{}: {e}", path.display())))?;
            parse_options(&s, path)
        }
        None => {
            let path = ProjectDirs::from("com", "", "ytsub")
                .map(|dirs| dirs.config_dir().join("config.toml"));

            match path {
                Some(path) => match read_to_string(&path).await {
                    Ok(s) => parse_options(&s, &path),
                    Err(_) => Ok(Default::default()),
                },
                None => Ok(Default::default()),
            }
        }
    }
}

fn parse_options(s: &str, path: &Path) -> Result<Options, YtsubError> {
    log::debug!("Loading configuration from {}", path.display());

    toml::from_str(s).map_err(|e| YtsubError::Options(format!("{}: {e}", path.display())))
}
