//! The page host: resolves the "active tab" and runs the body extractor
//! inside its main frame.
//!
//! A browser would inject a script into a live page. Here the page is either
//! fetched over HTTP or read from a saved HTML file, then parsed and handed to
//! [`extract_email_body`](crate::extractor::extract_email_body).

use crate::extractor::{extract_from_html, Extraction};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// The frame the extractor is injected into.
pub const MAIN_FRAME_ID: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabLocation {
    Remote(Url),
    File(PathBuf),
    /// A location no script can be injected into (`chrome://`, `about:`, ...).
    Restricted(String),
}

impl std::fmt::Display for TabLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TabLocation::Remote(url) => write!(f, "{}", url),
            TabLocation::File(path) => write!(f, "{}", path.display()),
            TabLocation::Restricted(raw) => write!(f, "{}", raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub id: u32,
    pub location: TabLocation,
}

/// What the extractor returned in a single frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameResult {
    pub frame_id: u32,
    pub result: Option<String>,
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("cannot access contents of {0}")]
    RestrictedPage(String),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load {url}: {source}")]
    Fetch {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    HttpStatus {
        url: Url,
        status: reqwest::StatusCode,
    },
}

/// Tab lookup and script injection, the two host capabilities the popup needs.
#[async_trait]
pub trait Browser: Send + Sync {
    async fn active_tab(&self) -> Option<Tab>;

    /// Run the body extractor in the tab, returning one result per frame.
    async fn execute_extractor(&self, tab: &Tab) -> Result<Vec<FrameResult>, HostError>;
}

/// Resolve a command-line target into a tab location.
///
/// `http(s)://` and `file://` URLs are accepted as such, anything else that
/// parses as a URL is restricted, and everything left is a local path.
pub fn parse_location(target: &str) -> TabLocation {
    match Url::parse(target) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => TabLocation::Remote(url),
        Ok(url) if url.scheme() == "file" => match url.to_file_path() {
            Ok(path) => TabLocation::File(path),
            Err(()) => TabLocation::Restricted(target.to_string()),
        },
        // Single-letter schemes are Windows drive letters, not URLs
        Ok(url) if url.scheme().len() > 1 => TabLocation::Restricted(target.to_string()),
        _ => TabLocation::File(PathBuf::from(target)),
    }
}

/// A host with at most one tab: the page named on the command line.
pub struct PageHost {
    target: Option<String>,
    selection: Option<String>,
    client: reqwest::Client,
}

impl PageHost {
    pub fn new(
        target: Option<String>,
        selection: Option<String>,
        timeout: Option<Duration>,
    ) -> Self {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("phishscan/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().unwrap_or_else(|_| reqwest::Client::new());

        Self {
            target,
            selection,
            client,
        }
    }

    async fn load_page(&self, location: &TabLocation) -> Result<String, HostError> {
        match location {
            TabLocation::Restricted(raw) => Err(HostError::RestrictedPage(raw.clone())),
            TabLocation::File(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| HostError::Read {
                        path: path.clone(),
                        source,
                    })
            }
            TabLocation::Remote(url) => {
                let response = self
                    .client
                    .get(url.clone())
                    .send()
                    .await
                    .map_err(|source| HostError::Fetch {
                        url: url.clone(),
                        source,
                    })?;

                if !response.status().is_success() {
                    return Err(HostError::HttpStatus {
                        url: url.clone(),
                        status: response.status(),
                    });
                }

                response.text().await.map_err(|source| HostError::Fetch {
                    url: url.clone(),
                    source,
                })
            }
        }
    }
}

#[async_trait]
impl Browser for PageHost {
    async fn active_tab(&self) -> Option<Tab> {
        let target = self.target.as_deref()?.trim();
        if target.is_empty() {
            return None;
        }
        Some(Tab {
            id: 1,
            location: parse_location(target),
        })
    }

    async fn execute_extractor(&self, tab: &Tab) -> Result<Vec<FrameResult>, HostError> {
        let html = self.load_page(&tab.location).await?;

        // Only the main frame is targeted, so there is exactly one result
        let Extraction { source, text } = extract_from_html(&html, self.selection.as_deref());
        tracing::debug!(
            tab = tab.id,
            source = source.label(),
            chars = text.chars().count(),
            "extractor finished"
        );

        Ok(vec![FrameResult {
            frame_id: MAIN_FRAME_ID,
            result: Some(text),
        }])
    }
}
