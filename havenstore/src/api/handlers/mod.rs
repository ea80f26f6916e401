//! HTTP request handlers.
//!
//! - [`uploads`]: upload-handle issuance and direct multipart uploads
//! - [`objects`]: stored-object serving and public-asset probing
//!
//! Handlers return [`crate::errors::Error`], which converts to the
//! appropriate status code with a JSON error body. Authorization is out of
//! scope for this service: session and role checks belong to the marketplace
//! application in front of it.

pub mod objects;
pub mod uploads;
