//! Core client: configuration, request helpers and error mapping.

use std::sync::Arc;

use gphotos_protocol::constants::{BASE_URL, PATH_UPLOADS};
use gphotos_protocol::{ApiErrorResponse, ProtocolError, UploadMethod};
use gphotos_upload::{DEFAULT_RETRY_LIMIT, UploadEngine, UploadError};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::debug;

use crate::auth::{AuthError, AuthProvider};
use crate::paging::PageEvent;
use crate::transport::ReqwestTransport;

/// Errors from the photo library client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Photo library API client.
pub struct Client {
    pub(crate) http: reqwest::Client,
    auth: Arc<dyn AuthProvider>,
    base_url: String,
    upload_url: Option<String>,
    upload_method: UploadMethod,
    retry_limit: u32,
    engine: UploadEngine,
    pub(crate) pages: broadcast::Sender<PageEvent>,
}

impl Client {
    /// Creates a client against the public service address.
    pub fn new(auth: Arc<dyn AuthProvider>) -> Result<Self, Error> {
        let http = reqwest::Client::builder().build()?;
        let (pages, _) = broadcast::channel(64);
        let engine = build_engine(
            &http,
            &auth,
            &default_upload_url(BASE_URL),
            DEFAULT_RETRY_LIMIT,
        );
        Ok(Self {
            http,
            auth,
            base_url: BASE_URL.to_string(),
            upload_url: None,
            upload_method: UploadMethod::default(),
            retry_limit: DEFAULT_RETRY_LIMIT,
            engine,
            pages,
        })
    }

    /// Points the client at another service root. A trailing `/` is added
    /// when missing.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let mut url = url.into();
        if !url.ends_with('/') {
            url.push('/');
        }
        self.base_url = url;
        self.rebuild_engine();
        self
    }

    /// Overrides the upload endpoint (defaults to `<base>/uploads`).
    pub fn with_upload_url(mut self, url: impl Into<String>) -> Self {
        self.upload_url = Some(url.into());
        self.rebuild_engine();
        self
    }

    pub fn with_upload_method(mut self, method: UploadMethod) -> Self {
        self.upload_method = method;
        self
    }

    pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = retry_limit;
        self.rebuild_engine();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn upload_method(&self) -> UploadMethod {
        self.upload_method
    }

    /// Upload engine sharing this client's connection pool and credentials.
    /// Subscribe to it for per-chunk progress.
    pub fn uploader(&self) -> &UploadEngine {
        &self.engine
    }

    /// Receives an event each time a listing continues onto another page.
    pub fn subscribe_pages(&self) -> broadcast::Receiver<PageEvent> {
        self.pages.subscribe()
    }

    fn rebuild_engine(&mut self) {
        let upload_url = self
            .upload_url
            .clone()
            .unwrap_or_else(|| default_upload_url(&self.base_url));
        self.engine = build_engine(&self.http, &self.auth, &upload_url, self.retry_limit);
    }

    // -----------------------------------------------------------------------
    // Request helpers
    // -----------------------------------------------------------------------

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Performs an authenticated GET and decodes the JSON response.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path);
        debug!(%url, ?params, "GET");
        let body = self.send(self.http.get(&url).query(params)).await?;
        decode(&body)
    }

    /// Performs an authenticated POST with a JSON body and decodes the
    /// JSON response.
    pub(crate) async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self.post_raw(path, body).await?;
        decode(&body)
    }

    /// POST whose response body carries nothing of interest.
    pub(crate) async fn post_unit<B>(&self, path: &str, body: &B) -> Result<(), Error>
    where
        B: Serialize + ?Sized,
    {
        self.post_raw(path, body).await.map(|_| ())
    }

    async fn post_raw<B>(&self, path: &str, body: &B) -> Result<Vec<u8>, Error>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        debug!(%url, "POST");
        self.send(self.http.post(&url).json(body)).await
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<Vec<u8>, Error> {
        let token = self.auth.access_token().await?;
        let resp = req.bearer_auth(token).send().await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message: api_message(&body),
            });
        }

        Ok(resp.bytes().await?.to_vec())
    }
}

fn default_upload_url(base_url: &str) -> String {
    format!("{base_url}{PATH_UPLOADS}")
}

fn build_engine(
    http: &reqwest::Client,
    auth: &Arc<dyn AuthProvider>,
    upload_url: &str,
    retry_limit: u32,
) -> UploadEngine {
    let transport = ReqwestTransport::new(http.clone(), Arc::clone(auth));
    UploadEngine::new(Arc::new(transport), upload_url).with_retry_limit(retry_limit)
}

/// Percent-encodes an id or token for use as a path segment.
pub(crate) fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, NON_ALPHANUMERIC).to_string()
}

/// Decodes a JSON body; an empty body reads as `{}`.
fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_slice(b"{}")?);
    }
    Ok(serde_json::from_slice(body)?)
}

/// Prefers the message from the service's error envelope over the raw body.
fn api_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorResponse>(body)
        .ok()
        .map(|e| e.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.trim().to_string())
}
