pub mod page;

use std::future::Future;
use std::time::Duration;

use isahc::config::RedirectPolicy;
use isahc::prelude::*;
use isahc::HttpClient;
use miette::Diagnostic;
use thiserror::Error;

pub use page::{fetch_page, fetch_track, Page};

#[derive(Debug, Error, Diagnostic)]
pub enum FetchError {
    #[error("Could not download {url}.")]
    Network {
        url: String,
        #[source]
        source: isahc::Error,
    },

    #[error("Could not read response body from {url}.")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server returned status {status} for {url}.")]
    Status { url: String, status: u16 },
}

/// Raw result of an HTTP request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fetched {
    pub status: u16,
    pub body: String,
}

impl Fetched {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Capability to download a document. The whole pipeline goes through this
/// trait, so it can be run against canned responses.
pub trait Fetch {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Fetched, FetchError>>;
}

impl Fetch for HttpClient {
    async fn fetch(&self, url: &str) -> Result<Fetched, FetchError> {
        let mut response = self
            .get_async(url)
            .await
            .map_err(|source| FetchError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })?;

        Ok(Fetched { status, body })
    }
}

/// Fetch `url` and return its body, treating any non-2xx status as an error.
pub async fn fetch_text<F: Fetch>(fetcher: &F, url: &str) -> Result<String, FetchError> {
    log::debug!("Fetching {url}");

    let fetched = fetcher.fetch(url).await?;

    if fetched.is_success() {
        Ok(fetched.body)
    } else {
        Err(FetchError::Status {
            url: url.to_string(),
            status: fetched.status,
        })
    }
}

/// Language the platform is asked to answer in.
pub const ACCEPT_LANGUAGE: &str = "en";

/// Create HTTP client used for talking to the video platform.
pub fn http_client(timeout: Option<Duration>) -> Result<HttpClient, isahc::Error> {
    let builder = HttpClient::builder()
        .redirect_policy(RedirectPolicy::Follow)
        .default_header("accept-language", ACCEPT_LANGUAGE);

    match timeout {
        Some(t) => builder.timeout(t).build(),
        None => builder.build(),
    }
}
