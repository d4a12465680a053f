//! HTTP boundary used by the upload engine.
//!
//! `HttpTransport` is implemented by the client crate on top of `reqwest`.
//! Keeping it a trait keeps the upload state machine testable with mocks.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use crate::error::UploadError;

/// Request headers as `(name, value)` pairs, in send order.
pub type Headers = Vec<(&'static str, String)>;

/// Status, headers and body of a completed request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are stored lowercased.
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Adds a header (builder style).
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Sets the body (builder style).
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Body decoded as UTF-8, lossy.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Issues a POST with a raw byte body and returns the full response.
///
/// Non-success statuses are returned as `Ok`; only failures to get a
/// response at all are `Err`. Implementations attach authentication.
pub trait HttpTransport: Send + Sync {
    fn send<'a>(
        &'a self,
        url: &'a str,
        body: Vec<u8>,
        headers: Headers,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, UploadError>> + Send + 'a>>;
}

#[cfg(test)]
pub(crate) mod mock {
    use std::sync::Mutex;

    use super::*;

    /// A request captured by [`MockTransport`].
    #[derive(Debug, Clone)]
    pub struct Recorded {
        pub url: String,
        pub body: Vec<u8>,
        pub headers: Headers,
    }

    impl Recorded {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }
    }

    /// Mock transport that replays queued responses and records requests.
    ///
    /// An empty queue answers with a transport error.
    pub struct MockTransport {
        responses: Mutex<Vec<Result<HttpResponse, String>>>,
        requests: Mutex<Vec<Recorded>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self {
                responses: Mutex::new(Vec::new()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn push(&self, resp: HttpResponse) {
            self.responses.lock().unwrap().push(Ok(resp));
        }

        pub fn push_error(&self, msg: &str) {
            self.responses.lock().unwrap().push(Err(msg.to_string()));
        }

        pub fn requests(&self) -> Vec<Recorded> {
            self.requests.lock().unwrap().clone()
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl HttpTransport for MockTransport {
        fn send<'a>(
            &'a self,
            url: &'a str,
            body: Vec<u8>,
            headers: Headers,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, UploadError>> + Send + 'a>> {
            self.requests.lock().unwrap().push(Recorded {
                url: url.to_string(),
                body,
                headers,
            });

            Box::pin(async move {
                let mut responses = self.responses.lock().unwrap();
                if responses.is_empty() {
                    Err(UploadError::Transport("no mock response available".into()))
                } else {
                    responses.remove(0).map_err(UploadError::Transport)
                }
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let resp = HttpResponse::new(200).with_header("X-Goog-Upload-URL", "https://up/s");
        assert_eq!(resp.header("x-goog-upload-url"), Some("https://up/s"));
        assert_eq!(resp.header("X-GOOG-UPLOAD-URL"), Some("https://up/s"));
        assert!(resp.header("X-Goog-Upload-Status").is_none());
    }

    #[test]
    fn success_range() {
        assert!(HttpResponse::new(200).is_success());
        assert!(HttpResponse::new(204).is_success());
        assert!(!HttpResponse::new(308).is_success());
        assert!(!HttpResponse::new(503).is_success());
    }
}
