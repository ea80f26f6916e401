//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for upload and object endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! - **Uploads** (`/api/uploads`, `/api/upload/direct`): upload handle
//!   issuance and the direct-upload endpoint the handles point at
//! - **Objects** (`<base_url>/*`, `/public-objects/*`): stored object
//!   retrieval and public-asset probing
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`; the
//! rendered docs are served at `/docs`.

pub mod handlers;
pub mod models;
