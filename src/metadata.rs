use miette::Diagnostic;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::convert::Format;
use crate::source::FetchError;
use crate::video::VideoReference;

static TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""title"\s*:\s*("(?:[^"\\]|\\.)+")"#).unwrap());

/// Characters that are not allowed in file names on common systems.
static UNSAFE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());

#[derive(Debug, Error, Diagnostic)]
pub enum TitleError {
    #[error("Could not find video title.")]
    TitleNotFound,

    #[error("Could not download video page.")]
    Http(#[from] FetchError),
}

/// Extract title of the video from its watch page.
///
/// Search starts at `anchor`, where the player data begins, since titles
/// before it belong to other parts of the page. Without an anchor, or when
/// the page does not contain it, the whole page is searched.
pub fn title(html: &str, anchor: Option<&str>) -> Result<String, TitleError> {
    let from = anchor.and_then(|a| html.find(a)).unwrap_or(0);

    TITLE
        .captures(&html[from..])
        .and_then(|c| serde_json::from_str::<String>(&c[1]).ok())
        .filter(|t| !t.trim().is_empty())
        .ok_or(TitleError::TitleNotFound)
}

/// Name of the saved subtitle file for a video with `title`.
pub fn file_name(title: &str, format: Format) -> String {
    format!("{}.{}", UNSAFE.replace_all(title.trim(), "_"), format.extension())
}

/// Name of the saved subtitle file when the title of the video is not known.
pub fn fallback_file_name(video: &VideoReference, format: Format) -> String {
    format!("subtitles_{video}.{}", format.extension())
}
