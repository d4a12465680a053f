//! Resumable media upload engine.
//!
//! Turns a local photo or video into an upload token using one of three
//! wire protocols:
//!
//! 1. **Simple**: one raw request with the whole file
//! 2. **ResumableSingle**: `start` handshake, then one `upload, finalize`
//! 3. **ResumableMultipart**: `start` handshake, then service-sized chunks
//!    with bounded retry and a diagnostic `query` between attempts
//!
//! The engine talks to the network through [`HttpTransport`], which the
//! client crate implements on top of `reqwest`.

pub mod batch;
pub mod engine;
pub mod error;
pub mod transport;

// Re-export primary types for convenience.
pub use batch::{FileUploadResult, upload_many};
pub use engine::{DEFAULT_RETRY_LIMIT, UploadEngine};
pub use error::UploadError;
pub use transport::{Headers, HttpResponse, HttpTransport};
