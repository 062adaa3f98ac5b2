//! Remote store HTTP client
//!
//! Builds the storage URLs and attaches the optional bearer token. Every URL
//! has the shape
//!
//! ```text
//! {base}/api/{app}/data/backups/{remoteName}/{segment}/{segment}...
//! ```
//!
//! where the remote name and every path segment are percent-escaped on
//! their own, so a `/` inside a name can never create an extra level.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use backupbox_core::config::RemoteConfig;
//! use backupbox_remote::client::RemoteClient;
//!
//! # fn example() -> Result<(), backupbox_remote::RemoteError> {
//! let client = RemoteClient::new(&RemoteConfig::default())?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use backupbox_core::config::RemoteConfig;
use backupbox_core::domain::RemoteName;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, Method, RequestBuilder};
use tracing::debug;
use url::Url;

use crate::RemoteError;

/// Timeout applied to every request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Everything but `A-Z a-z 0-9 - _ . ! ~ * ' ( )` is escaped in a segment
const SEGMENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// HTTP client for the remote object store
#[derive(Debug, Clone)]
pub struct RemoteClient {
    /// The underlying HTTP client
    client: Client,
    /// Server base URL, without the `/api` suffix
    base_url: Url,
    /// Application namespace
    app_id: String,
    /// Optional bearer token
    access_token: Option<String>,
}

impl RemoteClient {
    /// Creates a client from the `remote` configuration section
    ///
    /// # Errors
    /// Returns `RemoteError::InvalidUrl` if `base_url` is not an absolute
    /// http(s) URL.
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let mut client = Self::with_base_url(&config.base_url, &config.app_id)?;
        if let Some(token) = &config.access_token {
            client = client.with_access_token(token.clone());
        }
        Ok(client)
    }

    /// Creates a client for a custom base URL (useful for testing)
    ///
    /// # Errors
    /// Returns `RemoteError::InvalidUrl` if `base_url` cannot carry a path.
    pub fn with_base_url(
        base_url: impl AsRef<str>,
        app_id: impl Into<String>,
    ) -> Result<Self, RemoteError> {
        let raw = base_url.as_ref();
        let base_url = Url::parse(raw).map_err(|e| RemoteError::InvalidUrl(format!("{raw}: {e}")))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(RemoteError::InvalidUrl(raw.to_string()));
        }

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url,
            app_id: app_id.into(),
            access_token: None,
        })
    }

    /// Sets the bearer token sent with every request
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// URL of `segments` inside the remote folder `remote_name`
    pub fn folder_url<'a, I>(&self, remote_name: &RemoteName, segments: I) -> Url
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut path = self.base_url.path().trim_end_matches('/').to_string();
        for segment in ["api", self.app_id.as_str(), "data", "backups", remote_name.as_str()] {
            push_segment(&mut path, segment);
        }
        for segment in segments {
            push_segment(&mut path, segment);
        }

        let mut url = self.base_url.clone();
        url.set_path(&path);
        url
    }

    /// Creates a request builder with the authorization header, if any
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, %url, "Remote request");
        let builder = self.client.request(method, url);
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

fn push_segment(path: &mut String, segment: &str) {
    path.push('/');
    path.extend(utf8_percent_encode(segment, SEGMENT_ENCODE_SET));
}
