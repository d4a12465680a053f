//! `reqwest` implementation of the upload transport.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use gphotos_upload::{Headers, HttpResponse, HttpTransport, UploadError};
use reqwest::header::CONTENT_TYPE;
use tracing::trace;

use crate::auth::AuthProvider;

/// Sends raw upload requests with the caller's bearer token.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
    auth: Arc<dyn AuthProvider>,
}

impl ReqwestTransport {
    pub fn new(http: reqwest::Client, auth: Arc<dyn AuthProvider>) -> Self {
        Self { http, auth }
    }

    async fn post(
        &self,
        url: &str,
        body: Vec<u8>,
        headers: Headers,
    ) -> Result<HttpResponse, UploadError> {
        let token = self
            .auth
            .access_token()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        let mut req = self
            .http
            .post(url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/octet-stream");
        for (name, value) in headers {
            req = req.header(name, value);
        }

        let resp = req.body(body).send().await.map_err(transport_error)?;
        let status = resp.status().as_u16();
        let headers: HashMap<String, String> = resp
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = resp.bytes().await.map_err(transport_error)?.to_vec();

        trace!(url, status, bytes = body.len(), "upload response");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn transport_error(e: reqwest::Error) -> UploadError {
    UploadError::Transport(e.to_string())
}

impl HttpTransport for ReqwestTransport {
    fn send<'a>(
        &'a self,
        url: &'a str,
        body: Vec<u8>,
        headers: Headers,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, UploadError>> + Send + 'a>> {
        Box::pin(self.post(url, body, headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;
    use crate::mock_server::{MockResponse, MockServer};

    #[tokio::test]
    async fn sends_headers_and_body() {
        let server = MockServer::bind().await;
        let url = format!("{}/uploads", server.url());
        let server = server.serve(vec![
            MockResponse::text(200, "upload-token").header("X-Goog-Upload-Status", "final"),
        ]);

        let auth = Arc::new(StaticToken::new("tok").unwrap());
        let transport = ReqwestTransport::new(reqwest::Client::new(), auth);
        let resp = transport
            .send(
                &url,
                b"bytes".to_vec(),
                vec![("X-Goog-Upload-Protocol", "raw".to_string())],
            )
            .await
            .unwrap();

        assert_eq!(resp.status, 200);
        assert_eq!(resp.text(), "upload-token");
        assert_eq!(resp.header("X-Goog-Upload-Status"), Some("final"));

        let reqs = server.requests();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].method, "POST");
        assert_eq!(reqs[0].target, "/uploads");
        assert_eq!(reqs[0].header("authorization"), Some("Bearer tok"));
        assert_eq!(reqs[0].header("content-type"), Some("application/octet-stream"));
        assert_eq!(reqs[0].header("x-goog-upload-protocol"), Some("raw"));
        assert_eq!(reqs[0].body, b"bytes");
    }

    #[tokio::test]
    async fn error_status_is_not_a_transport_error() {
        let server = MockServer::bind().await;
        let url = server.url().to_string();
        let _server = server.serve(vec![MockResponse::text(503, "busy")]);

        let auth = Arc::new(StaticToken::new("tok").unwrap());
        let transport = ReqwestTransport::new(reqwest::Client::new(), auth);
        let resp = transport.send(&url, Vec::new(), Vec::new()).await.unwrap();

        assert_eq!(resp.status, 503);
        assert!(!resp.is_success());
    }

    #[tokio::test]
    async fn connection_refused_is_transport_error() {
        let server = MockServer::bind().await;
        let url = server.url().to_string();
        drop(server);

        let auth = Arc::new(StaticToken::new("tok").unwrap());
        let transport = ReqwestTransport::new(reqwest::Client::new(), auth);
        let err = transport.send(&url, Vec::new(), Vec::new()).await.unwrap_err();
        assert!(matches!(err, UploadError::Transport(_)));
    }
}
