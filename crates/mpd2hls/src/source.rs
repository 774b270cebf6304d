use std::{fmt, path::PathBuf, str::FromStr};

use reqwest::header::ACCEPT;
use url::Url;

use crate::{
    dash::url::{is_http_url, BaseUrl},
    error::{TranscodeError, TranscodeResult},
    util::http::HttpClient,
};

/// How much of an error response body is kept for diagnostics.
const ERROR_BODY_LIMIT: usize = 512;

/// Where a manifest is loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    Remote(Url),
    Local(PathBuf),
}

/// Manifest text together with the base its relative urls resolve against.
#[derive(Debug, Clone)]
pub struct LoadedManifest {
    pub text: String,
    /// Directory of the manifest. For remote manifests this is taken from the
    /// final url after redirects.
    pub root_base: BaseUrl,
}

impl ManifestSource {
    /// `http://` and `https://` sources are fetched, everything else is read
    /// from disk.
    pub fn parse(source: &str) -> TranscodeResult<Self> {
        if is_http_url(source) {
            Ok(Self::Remote(Url::parse(source)?))
        } else {
            Ok(Self::Local(PathBuf::from(source)))
        }
    }

    pub fn root_base(&self) -> BaseUrl {
        match self {
            Self::Remote(url) => BaseUrl::from_manifest_url(url),
            Self::Local(path) => BaseUrl::from_manifest_path(path),
        }
    }

    /// Loads the manifest once. Nothing is retried or cached.
    pub async fn load(&self, client: &HttpClient) -> TranscodeResult<LoadedManifest> {
        match self {
            Self::Remote(url) => {
                tracing::info!("Fetching MPD from {url}");
                let response = client
                    .get(url.clone())
                    .header(ACCEPT, "application/dash+xml,video/vnd.mpeg.dash.mpd")
                    .send()
                    .await?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.ok().map(truncate_body);
                    if let Some(body) = &body {
                        tracing::warn!("Error body: {body}");
                    }
                    return Err(TranscodeError::HttpError { status, body });
                }

                let root_base = BaseUrl::from_manifest_url(response.url());
                let text = response.text().await?;
                Ok(LoadedManifest { text, root_base })
            }
            Self::Local(path) => {
                tracing::info!("Reading MPD from {}", path.display());
                let text = tokio::fs::read_to_string(path).await?;
                Ok(LoadedManifest {
                    text,
                    root_base: self.root_base(),
                })
            }
        }
    }
}

impl FromStr for ManifestSource {
    type Err = TranscodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ManifestSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{url}"),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

fn truncate_body(mut body: String) -> String {
    if let Some((index, _)) = body.char_indices().nth(ERROR_BODY_LIMIT) {
        body.truncate(index);
    }
    body
}
