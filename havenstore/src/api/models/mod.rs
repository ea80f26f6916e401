//! API request and response data models.
//!
//! These models define the public API contract and are kept separate from the
//! storage-core types so the HTTP surface can evolve independently. All models
//! carry `utoipa` annotations for the generated OpenAPI docs.

pub mod uploads;
