//! Fetching catalog documents and dataset descriptors.
//!
//! The crawler only needs "give me the bytes at this URL", expressed by the [`Fetcher`]
//! trait. [`HttpFetcher`] is the production implementation on top of `reqwest`; tests
//! drive the crawler with in-memory fetchers instead.
//!
//! [`dap`] holds the optional OPeNDAP inspection used to estimate dataset sizes.

use std::future::Future;

use thiserror::Error;
use tracing::debug;
use url::Url;

pub mod dap;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Unsupported URL scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("No document at {0}")]
    NotFound(String),
}

/// Basic-auth credentials threaded through to every request
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: Option<String>,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: Option<String>) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// The transport capability: fetch the body at a URL
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// `reqwest`-backed fetcher supporting http and https
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    credential: Option<Credential>,
}

impl HttpFetcher {
    /// Build a fetcher
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Client` if the TLS backend cannot be initialized.
    pub fn new(
        credential: Option<Credential>,
        accept_invalid_certs: bool,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("thredds-crawler/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client, credential })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(FetchError::UnsupportedScheme(other.to_string())),
        }

        debug!(url = %url, "GET");
        let mut request = self.client.get(url.clone());
        if let Some(credential) = &self.credential {
            request = request.basic_auth(&credential.username, credential.password.as_ref());
        }

        let request_error = |source| FetchError::Request {
            url: url.to_string(),
            source,
        };
        let response = request.send().await.map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.bytes().await.map_err(request_error)?;
        Ok(body.to_vec())
    }
}
