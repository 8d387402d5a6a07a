//! Authenticated thumbnail retrieval. Failures are logged and degrade to a
//! text-only notification, never abort delivery.

use std::time::Duration;

use bytes::Bytes;
use herald_session::Session;
use tracing::warn;
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches thumbnail resources from the library server's HTTP endpoint.
#[derive(Clone, Debug)]
pub struct MediaFetcher {
    client: reqwest::Client,
    base_url: Url,
    session: Session,
}

impl MediaFetcher {
    /// Creates a fetcher resolving resource paths against the given base URL
    /// and attaching the session's bearer token when one is present.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: Url, session: Session) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    /// Fetches a server-relative resource. Any failure returns `None`.
    pub async fn fetch(&self, resource_path: &str) -> Option<Bytes> {
        let url = match self.base_url.join(resource_path) {
            Ok(url) => url,
            Err(e) => {
                warn!("invalid thumbnail path {resource_path}: {e}");
                return None;
            }
        };

        let mut request = self.client.get(url);
        if let Some(token) = self.session.current_token().await {
            request = request.bearer_auth(token);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => match response.bytes().await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!("failed to read thumbnail body: {e}");
                    None
                }
            },
            Ok(response) => {
                warn!("thumbnail fetch returned HTTP {}", response.status());
                None
            }
            Err(e) => {
                warn!("thumbnail fetch failed: {e}");
                None
            }
        }
    }
}
