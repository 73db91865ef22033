use crate::locate::CaptionTrack;
use crate::video::VideoReference;

use super::{fetch_text, Fetch, FetchError};

/// Watch page of a video, as downloaded.
#[derive(Clone, Debug)]
pub struct Page {
    /// Video the page belongs to.
    pub video: VideoReference,
    /// Raw HTML of the page.
    pub body: String,
}

/// Download the watch page of `video`.
pub async fn fetch_page<F: Fetch>(fetcher: &F, video: &VideoReference) -> Result<Page, FetchError> {
    let body = fetch_text(fetcher, &video.watch_url()).await?;

    Ok(Page {
        video: video.clone(),
        body,
    })
}

/// Download the raw timed-text payload of a caption track.
pub async fn fetch_track<F: Fetch>(fetcher: &F, track: &CaptionTrack) -> Result<String, FetchError> {
    fetch_text(fetcher, &track.source_url).await
}
