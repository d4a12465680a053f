//! Photo library REST client.
//!
//! Wraps the album, media item and sharing endpoints behind an async
//! [`Client`], and plugs a `reqwest` transport into the upload engine so a
//! single client can both upload bytes and create media items from them.

pub mod albums;
pub mod auth;
pub mod client;
pub mod media_items;
pub mod paging;
pub mod transport;
pub mod uploads;

#[cfg(test)]
pub(crate) mod mock_server;

// Re-export primary types for convenience.
pub use auth::{AuthError, AuthProvider, StaticToken};
pub use client::{Client, Error};
pub use paging::{ListOptions, PageEvent};
pub use transport::ReqwestTransport;
pub use uploads::UploadReport;
