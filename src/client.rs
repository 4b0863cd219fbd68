//! HTTP client for record lookups and document downloads.
//!
//! A [`Client`] owns a validated [`Credential`], one pooled `reqwest` client
//! with a cookie jar shared by lookup and document requests, and the
//! [`TokenSource`] used for filename tokens. Cloning is cheap and clones share
//! all three, so batch workers hold clones of one client.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::cookie::Jar;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::{ClientConfig, FileConfig};
use crate::credential::Credential;
use crate::error::UnpaywallError;
use crate::filename::{candidate_stem, create_exclusive};
use crate::record::LookupRecord;
use crate::token::TokenSource;
use crate::user_agent;

/// Lookup and download client for the Unpaywall v2 API.
///
/// # Example
///
/// ```no_run
/// use unpaywall_core::Client;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::new("you@example.org")?;
/// let record = client.lookup("10.1038/nature12373").await?;
/// println!("open access: {}", record.is_oa);
///
/// let path = client.download_one("10.1038/nature12373", Path::new("./papers")).await?;
/// println!("saved to {}", path.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    credential: Credential,
    http: reqwest::Client,
    api_base_url: String,
    tokens: TokenSource,
}

impl Client {
    /// Creates a client with default transport settings.
    ///
    /// # Errors
    ///
    /// Returns [`UnpaywallError::InvalidCredential`] when `email` is not a
    /// valid address, and [`UnpaywallError::ClientBuild`] when the HTTP
    /// transport cannot be constructed.
    pub fn new(email: impl Into<String>) -> Result<Self, UnpaywallError> {
        Self::with_config(email, &ClientConfig::default())
    }

    /// Creates a client with explicit transport settings.
    ///
    /// # Errors
    ///
    /// Same as [`Client::with_cookie_jar`].
    pub fn with_config(
        email: impl Into<String>,
        config: &ClientConfig,
    ) -> Result<Self, UnpaywallError> {
        Self::with_cookie_jar(email, config, Arc::new(Jar::default()))
    }

    /// Creates a client from a loaded config file, using its `email` and
    /// `[client]` table.
    ///
    /// # Errors
    ///
    /// Returns [`UnpaywallError::MissingCredential`] when no email is set,
    /// otherwise the errors of [`Client::with_config`].
    pub fn from_file_config(file: &FileConfig) -> Result<Self, UnpaywallError> {
        let email = file
            .email
            .clone()
            .ok_or(UnpaywallError::MissingCredential)?;
        Self::with_config(email, &file.client)
    }

    /// Creates a client that stores cookies in a caller-owned jar.
    ///
    /// # Errors
    ///
    /// Same as [`Client::new`], plus [`UnpaywallError::InvalidConfig`] when
    /// `config` fails [`ClientConfig::validate`].
    #[instrument(level = "debug", skip(email, config, cookie_jar), fields(api_base_url = %config.api_base_url))]
    pub fn with_cookie_jar(
        email: impl Into<String>,
        config: &ClientConfig,
        cookie_jar: Arc<Jar>,
    ) -> Result<Self, UnpaywallError> {
        let credential = Credential::parse(email)?;
        config
            .validate()
            .map_err(|source| UnpaywallError::InvalidConfig { source })?;

        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(user_agent::default_user_agent);
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.read_timeout_secs))
            .gzip(true)
            .user_agent(user_agent)
            .cookie_provider(cookie_jar)
            .build()
            .map_err(|source| UnpaywallError::ClientBuild { source })?;

        let tokens = config
            .token_seed
            .map_or_else(TokenSource::from_entropy, TokenSource::from_seed);

        debug!(credential = %credential.redacted(), "client ready");

        Ok(Self {
            inner: Arc::new(ClientInner {
                credential,
                http,
                api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
                tokens,
            }),
        })
    }

    /// Returns the validated credential.
    #[must_use]
    pub fn credential(&self) -> &Credential {
        &self.inner.credential
    }

    /// Looks up the record for one identifier.
    ///
    /// # Errors
    ///
    /// Returns [`UnpaywallError::Network`] or [`UnpaywallError::Timeout`] for
    /// transport failures, [`UnpaywallError::HttpStatus`] for a non-success
    /// status and [`UnpaywallError::Decode`] when the body is not a record.
    #[instrument(skip(self))]
    pub async fn lookup(&self, identifier: &str) -> Result<LookupRecord, UnpaywallError> {
        let encoded = urlencoding::encode(identifier);
        let url = format!(
            "{}/{encoded}?email={}",
            self.inner.api_base_url,
            urlencoding::encode(self.inner.credential.as_str())
        );
        // Used in errors and logs in place of `url`.
        let display_url = format!(
            "{}/{encoded}?email={}",
            self.inner.api_base_url,
            self.inner.credential.redacted()
        );

        debug!(url = %display_url, "looking up record");
        let response = self.send_get(&url, &display_url).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| map_send_error(&display_url, e))?;

        let record: LookupRecord = serde_json::from_slice(&body)
            .map_err(|source| UnpaywallError::decode(identifier, source))?;
        debug!(is_oa = record.is_oa, has_pdf = record.pdf_url().is_some(), "record decoded");
        Ok(record)
    }

    /// Sends a GET for a document URL and returns the successful response.
    ///
    /// # Errors
    ///
    /// Returns [`UnpaywallError::InvalidUrl`] when `url` does not parse, and
    /// the transport and status errors of [`Client::lookup`].
    #[instrument(skip(self))]
    pub async fn fetch_document(&self, url: &str) -> Result<reqwest::Response, UnpaywallError> {
        let parsed = Url::parse(url).map_err(|_| UnpaywallError::invalid_url(url))?;
        self.send_get(parsed.as_str(), url).await
    }

    /// Looks up `identifier` and saves its best PDF under `target_dir`.
    ///
    /// The file is named after the record title (or a random token) and never
    /// replaces an existing file. `target_dir` must already exist.
    ///
    /// # Errors
    ///
    /// Returns [`UnpaywallError::NoOpenAccessCopy`] without a second request
    /// when the record has no PDF URL, the errors of [`Client::lookup`] and
    /// [`Client::fetch_document`], and [`UnpaywallError::Io`] or
    /// [`UnpaywallError::FilenameExhausted`] for filesystem failures.
    #[must_use = "download result contains the path to the saved document"]
    #[instrument(skip(self, target_dir), fields(target_dir = %target_dir.display()))]
    pub async fn download_one(
        &self,
        identifier: &str,
        target_dir: &Path,
    ) -> Result<PathBuf, UnpaywallError> {
        let record = self.lookup(identifier).await?;
        let Some(pdf_url) = record.pdf_url() else {
            info!("no open-access PDF location");
            return Err(UnpaywallError::no_open_access_copy(identifier));
        };

        let response = self.fetch_document(pdf_url).await?;

        let stem = candidate_stem(record.title(), &self.inner.tokens);
        let (file, path) = create_exclusive(target_dir, &stem, &self.inner.tokens).await?;

        match stream_to_file(file, response, pdf_url, &path).await {
            Ok(bytes) => {
                info!(path = %path.display(), bytes, "download complete");
                Ok(path)
            }
            Err(error) => {
                debug!(path = %path.display(), "cleaning up partial file after error");
                if let Err(cleanup) = tokio::fs::remove_file(&path).await {
                    warn!(path = %path.display(), error = %cleanup, "failed to remove partial file");
                }
                Err(error)
            }
        }
    }

    async fn send_get(
        &self,
        url: &str,
        display_url: &str,
    ) -> Result<reqwest::Response, UnpaywallError> {
        let response = self
            .inner
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| map_send_error(display_url, e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), url = %display_url, "unsuccessful response");
            return Err(UnpaywallError::http_status(display_url, status));
        }
        Ok(response)
    }
}

fn map_send_error(display_url: &str, error: reqwest::Error) -> UnpaywallError {
    if error.is_timeout() {
        UnpaywallError::timeout(display_url)
    } else {
        UnpaywallError::network(display_url, error)
    }
}

/// Streams the response body into `file`, returning bytes written.
async fn stream_to_file(
    file: File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, UnpaywallError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| map_send_error(url, e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| UnpaywallError::io(file_path, e))?;
        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| UnpaywallError::io(file_path, e))?;

    Ok(bytes_written)
}
