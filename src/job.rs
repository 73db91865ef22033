use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressFinish, ProgressStyle};
use miette::Diagnostic;
use mime::Mime;
use thiserror::Error;

use crate::convert::{self, ConvertError, Format};
use crate::locate::{Kind, LocateError};
use crate::metadata::{fallback_file_name, file_name, title};
use crate::source::{fetch_page, fetch_track, Fetch, FetchError};
use crate::timedtext;
use crate::video::VideoReference;
use crate::Subtitler;

#[derive(Debug, Diagnostic, Error)]
pub enum JobError {
    #[error("HTTP error.")]
    Http(#[from] FetchError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Locate(#[from] LocateError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Convert(#[from] ConvertError),

    #[error("Could not save subtitles.")]
    Save(#[from] std::io::Error),
}

/// Converted subtitles, ready to be saved.
#[derive(Clone, Debug, PartialEq)]
pub struct SubtitleFile {
    /// Suggested file name.
    pub name: String,
    pub mime: Mime,
    pub content: String,
}

impl SubtitleFile {
    /// Write the file into `dir`, creating the directory if needed.
    pub async fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf, JobError> {
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.as_ref().join(&self.name);
        tokio::fs::write(&path, &self.content).await?;

        log::info!("Saved {} ({})", path.display(), self.mime);

        Ok(path)
    }
}

/// Download captions of `kind` for `video` and convert them into `format`.
///
/// The video page is downloaded once and used both for finding the caption
/// track and for the file name. When the title cannot be found, a name
/// derived from the video identifier is used instead.
pub async fn go<F: Fetch>(
    subtitler: &Subtitler<F>,
    video: &VideoReference,
    kind: Kind,
    format: Format,
) -> Result<SubtitleFile, JobError> {
    let pb = progress_bar(subtitler.options.show_progress_bar);

    pb.set_message(format!("Downloading page of {video}"));
    let page = fetch_page(&subtitler.fetcher, video).await?;

    let track = subtitler.locate_track(&page.body, kind)?;

    pb.set_message(format!("Downloading {kind} captions"));
    let raw = fetch_track(&subtitler.fetcher, &track).await;
    pb.finish_and_clear();

    let cues = timedtext::parse(&raw?).map_err(ConvertError::from)?;
    log::debug!("Parsed {} cues", cues.len());

    let content = convert::serialize(&cues, format)?;

    let name = match title(&page.body, subtitler.options.locate.anchor()) {
        Ok(title) => file_name(&title, format),
        Err(e) => {
            log::warn!("{e} Using file name derived from video identifier.");
            fallback_file_name(&page.video, format)
        }
    };

    Ok(SubtitleFile {
        name,
        mime: format.mime(),
        content,
    })
}

fn progress_bar(visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner().with_finish(ProgressFinish::AndClear);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
